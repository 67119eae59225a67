//! # maffa-api
//!
//! Backend for the MAFFA DJ/producer website: upcoming gigs and the contact
//! form, over a schema-flexible document store.
//!
//! ## Degradation contract
//!
//! Gigs are entered into the database by hand, so stored documents are
//! loosely typed. Every document is [normalized](normalize) field by field
//! into a fully populated [`Gig`]; a malformed record never fails a request.
//! If the database is missing or failing, the gig listing is an empty list
//! with `200 OK`. A contact message that cannot be stored is the one failure
//! the caller sees: `500` with the underlying error text.
//!
//! ## Layout
//!
//! - [`api`]: routes and handlers
//! - [`service`]: list gigs, submit contact, over an injected [`DocumentStore`]
//! - [`normalize`]: stored document → [`Gig`] coercion table
//! - [`store`]: the [`DocumentStore`] trait, in-memory and SQLite backends
//! - [`diagnostics`]: the `/test` report
//! - the HTTP core: [`Router`], [`Server`], [`Request`], [`Response`]
//!
//! ## Quick start
//!
//! ```rust,no_run
//! use std::sync::Arc;
//!
//! use maffa_api::api::{AppState, create_router};
//! use maffa_api::store::MemoryStore;
//! use maffa_api::{Config, Server};
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let config = Config::from_env()?;
//!     let store = Arc::new(MemoryStore::new("maffa"));
//!     let app = create_router(AppState { store: Some(store), config: config.clone() });
//!     Server::bind(config.addr()).serve(app).await?;
//!     Ok(())
//! }
//! ```

mod error;
mod handler;
mod method;
mod request;
mod response;
mod router;
mod server;
mod status;

pub mod api;
pub mod config;
pub mod diagnostics;
pub mod health;
pub mod middleware;
pub mod normalize;
pub mod schema;
pub mod service;
pub mod store;

pub use config::Config;
pub use error::Error;
pub use handler::Handler;
pub use method::Method;
pub use request::Request;
pub use response::{IntoResponse, Json, Response, ResponseBuilder};
pub use router::Router;
pub use schema::{Gig, Message};
pub use server::{MAX_BODY_BYTES, Server};
pub use status::Status;
pub use store::DocumentStore;
