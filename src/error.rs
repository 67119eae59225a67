//! Unified error type for the HTTP layer.

use thiserror::Error;

/// The error type returned by the server's fallible operations.
///
/// Application-level errors (404, 422, 500 from a failed write) are expressed
/// as HTTP [`Response`](crate::Response) values, not as `Error`s. This type
/// surfaces infrastructure failures: binding to a port or reading the local
/// address of a listener.
#[derive(Debug, Error)]
pub enum Error {
    #[error("io: {0}")]
    Io(#[from] std::io::Error),
}
