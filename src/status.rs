//! HTTP status codes as a typed enum.
//!
//! Use [`Status`] anywhere a status code is accepted: `Response::status()`,
//! `Response::builder().status()`, or as a bare handler return value.
//!
//! ```rust
//! use maffa_api::{Response, Status};
//!
//! // status-only, no body
//! Response::status(Status::NotFound);
//!
//! Response::builder()
//!     .status(Status::UnprocessableContent)
//!     .json(br#"{"detail":[]}"#.to_vec());
//! ```

/// The status codes this service answers with.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum Status {
    // ── 2xx Success ───────────────────────────────────────────────────────────
    Ok,                   // 200

    // ── 4xx Client errors ─────────────────────────────────────────────────────
    BadRequest,           // 400
    NotFound,             // 404
    MethodNotAllowed,     // 405
    PayloadTooLarge,      // 413
    UnprocessableContent, // 422

    // ── 5xx Server errors ─────────────────────────────────────────────────────
    InternalServerError,  // 500
}

impl From<Status> for u16 {
    fn from(s: Status) -> u16 {
        match s {
            Status::Ok                   => 200,
            Status::BadRequest           => 400,
            Status::NotFound             => 404,
            Status::MethodNotAllowed     => 405,
            Status::PayloadTooLarge      => 413,
            Status::UnprocessableContent => 422,
            Status::InternalServerError  => 500,
        }
    }
}

impl From<Status> for http::StatusCode {
    fn from(s: Status) -> http::StatusCode {
        // Every variant above is a registered code, so this never falls back.
        http::StatusCode::from_u16(u16::from(s)).unwrap_or(http::StatusCode::INTERNAL_SERVER_ERROR)
    }
}
