//! Gig listing and contact submission over an injected [`DocumentStore`].
//!
//! Both operations report store failures as typed errors. Whether a failure
//! is hidden from the caller (listing) or surfaced (submission) is decided at
//! the HTTP layer in [`api`](crate::api).

use serde::Serialize;

use crate::normalize::normalize;
use crate::schema::{Gig, Message};
use crate::store::{DocumentStore, Filter, StoreError, to_document};

/// Collection holding gig documents. Read-only from the API.
pub const GIG_KIND: &str = "gig";
/// Collection receiving contact messages. Write-only from the API.
pub const MESSAGE_KIND: &str = "message";
/// Gigs returned when the caller does not pass `limit`.
pub const DEFAULT_LIMIT: usize = 20;

/// Acknowledgement of a stored contact message.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct Receipt {
    pub status: &'static str,
    pub id: String,
}

/// Up to `limit` gigs in store order.
///
/// `Ok(vec![])` means the store holds no gigs; a missing or failing store is
/// an `Err`.
pub fn list_gigs(store: Option<&dyn DocumentStore>, limit: usize) -> Result<Vec<Gig>, StoreError> {
    let store = store.ok_or(StoreError::Unavailable)?;
    let docs = store.get_documents(GIG_KIND, &Filter::all(), limit)?;
    Ok(docs.iter().map(normalize).collect())
}

/// Persists a validated contact message.
pub fn submit_contact(store: Option<&dyn DocumentStore>, message: &Message) -> Result<Receipt, StoreError> {
    let store = store.ok_or(StoreError::Unavailable)?;
    let id = store.create_document(MESSAGE_KIND, to_document(message)?)?;
    Ok(Receipt { status: "ok", id })
}
