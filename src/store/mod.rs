//! Schema-flexible document storage.
//!
//! Records are addressed by collection ("kind") and carry loosely-typed
//! [`Value`]s: a gig inserted by hand may have a date stored as text, as a
//! native timestamp, or not at all. Turning those into typed API values is
//! the job of [`normalize`](crate::normalize), not of the store.

use std::collections::BTreeMap;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::Serialize;
use serde_json::Number;
use thiserror::Error;
use tracing::{info, warn};

use crate::config::Config;

mod memory;
#[cfg(feature = "sqlite")]
mod sqlite;

pub use memory::MemoryStore;
#[cfg(feature = "sqlite")]
pub use sqlite::SqliteStore;

/// `true` when a persistent backend is compiled into this build.
pub const BACKEND_AVAILABLE: bool = cfg!(feature = "sqlite");

/// One stored record: field name → value.
pub type Document = BTreeMap<String, Value>;

/// A dynamically typed stored value.
#[derive(Clone, Debug, PartialEq)]
pub enum Value {
    Null,
    Bool(bool),
    Int(i64),
    Float(f64),
    Text(String),
    Timestamp(DateTime<Utc>),
    Array(Vec<Value>),
    Document(Document),
}

impl Value {
    /// Truthiness in the scripting-language sense: null, `false`, zero, and
    /// empty text/arrays/documents are false; everything else is true.
    pub fn is_truthy(&self) -> bool {
        match self {
            Self::Null => false,
            Self::Bool(b) => *b,
            Self::Int(i) => *i != 0,
            Self::Float(f) => *f != 0.0,
            Self::Text(s) => !s.is_empty(),
            Self::Timestamp(_) => true,
            Self::Array(a) => !a.is_empty(),
            Self::Document(d) => !d.is_empty(),
        }
    }

    /// JSON interchange form. Timestamps become `{"$date": "<rfc3339>"}`.
    pub fn to_json(&self) -> serde_json::Value {
        use serde_json::Value as J;
        match self {
            Self::Null => J::Null,
            Self::Bool(b) => J::Bool(*b),
            Self::Int(i) => J::Number((*i).into()),
            Self::Float(f) => Number::from_f64(*f).map_or(J::Null, J::Number),
            Self::Text(s) => J::String(s.clone()),
            Self::Timestamp(t) => serde_json::json!({ "$date": t.to_rfc3339() }),
            Self::Array(a) => J::Array(a.iter().map(Value::to_json).collect()),
            Self::Document(d) => J::Object(d.iter().map(|(k, v)| (k.clone(), v.to_json())).collect()),
        }
    }
}

impl From<serde_json::Value> for Value {
    fn from(json: serde_json::Value) -> Self {
        use serde_json::Value as J;
        match json {
            J::Null => Self::Null,
            J::Bool(b) => Self::Bool(b),
            J::Number(n) => match n.as_i64() {
                Some(i) => Self::Int(i),
                None => n.as_f64().map_or(Self::Null, Self::Float),
            },
            J::String(s) => Self::Text(s),
            J::Array(a) => Self::Array(a.into_iter().map(Value::from).collect()),
            J::Object(o) => {
                if let Some(t) = extended_date(&o) {
                    return Self::Timestamp(t);
                }
                Self::Document(o.into_iter().map(|(k, v)| (k, Value::from(v))).collect())
            }
        }
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self { Self::Text(s.to_owned()) }
}

impl From<DateTime<Utc>> for Value {
    fn from(t: DateTime<Utc>) -> Self { Self::Timestamp(t) }
}

/// Recognizes `{"$date": "<rfc3339>"}` and nothing else.
fn extended_date(obj: &serde_json::Map<String, serde_json::Value>) -> Option<DateTime<Utc>> {
    if obj.len() != 1 {
        return None;
    }
    let raw = obj.get("$date")?.as_str()?;
    DateTime::parse_from_rfc3339(raw).ok().map(|t| t.with_timezone(&Utc))
}

/// Serializes any serde value into a top-level [`Document`].
pub fn to_document<T: Serialize>(value: &T) -> Result<Document, StoreError> {
    match Value::from(serde_json::to_value(value)?) {
        Value::Document(doc) => Ok(doc),
        _ => Err(StoreError::NotADocument),
    }
}

/// Parses stored JSON text into a [`Document`].
pub fn document_from_json(raw: &str) -> Result<Document, StoreError> {
    match Value::from(serde_json::from_str::<serde_json::Value>(raw)?) {
        Value::Document(doc) => Ok(doc),
        _ => Err(StoreError::NotADocument),
    }
}

/// Equality match on top-level fields. The empty filter matches everything.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Filter(Document);

impl Filter {
    pub fn all() -> Self {
        Self::default()
    }

    pub fn eq(mut self, field: &str, value: impl Into<Value>) -> Self {
        self.0.insert(field.to_owned(), value.into());
        self
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn matches(&self, doc: &Document) -> bool {
        self.0.iter().all(|(k, v)| doc.get(k) == Some(v))
    }
}

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("Database not available. Check DATABASE_URL and DATABASE_NAME environment variables.")]
    Unavailable,

    #[error("payload is not a document")]
    NotADocument,

    #[error("{0}")]
    Backend(String),

    #[error(transparent)]
    Json(#[from] serde_json::Error),

    #[cfg(feature = "sqlite")]
    #[error(transparent)]
    Sqlite(#[from] rusqlite::Error),
}

/// The document database the API reads gigs from and writes messages to.
///
/// Implementations must be safe to share across concurrent requests; calls
/// are synchronous and either complete or fail immediately.
pub trait DocumentStore: Send + Sync {
    /// Logical database name, for diagnostics.
    fn name(&self) -> &str;

    /// Inserts `payload` into collection `kind` and returns its generated id.
    fn create_document(&self, kind: &str, payload: Document) -> Result<String, StoreError>;

    /// Up to `limit` documents of `kind` matching `filter`, in insertion order.
    fn get_documents(&self, kind: &str, filter: &Filter, limit: usize) -> Result<Vec<Document>, StoreError>;

    /// Names of the collections that hold at least one document, or
    /// `Ok(None)` when the backend cannot enumerate them.
    fn list_collection_names(&self) -> Result<Option<Vec<String>>, StoreError> {
        Ok(None)
    }
}

/// Adds `_id`, `created_at` and `updated_at` to a payload about to be stored.
pub(crate) fn stamp(mut payload: Document) -> (String, Document) {
    let id = uuid::Uuid::new_v4().simple().to_string();
    let now = Utc::now();
    payload.insert("_id".to_owned(), Value::Text(id.clone()));
    payload.insert("created_at".to_owned(), Value::Timestamp(now));
    payload.insert("updated_at".to_owned(), Value::Timestamp(now));
    (id, payload)
}

/// Opens the configured store, once, at startup.
///
/// Returns `None` when the database is not configured or cannot be opened;
/// the API then degrades instead of refusing to start.
pub fn connect(config: &Config) -> Option<Arc<dyn DocumentStore>> {
    let (Some(url), Some(name)) = (config.database_url.as_deref(), config.database_name.as_deref()) else {
        info!("DATABASE_URL/DATABASE_NAME not set, running without a database");
        return None;
    };

    #[cfg(feature = "sqlite")]
    {
        match SqliteStore::open(url, name) {
            Ok(store) => {
                info!(database = name, "document store ready");
                Some(Arc::new(store))
            }
            Err(e) => {
                warn!(database = name, "failed to open document store: {e}");
                None
            }
        }
    }

    #[cfg(not(feature = "sqlite"))]
    {
        warn!(database = name, url_len = url.len(), "no store backend compiled in");
        None
    }
}
