//! HTTP endpoints.
//!
//! | Method | Path           | Failure behavior                         |
//! |--------|----------------|------------------------------------------|
//! | GET    | `/`            | none                                     |
//! | GET    | `/api/gigs`    | store errors degrade to `[]`, still 200  |
//! | POST   | `/api/contact` | store errors surface as 500 with detail  |
//! | GET    | `/test`        | every problem becomes report text        |

use std::sync::Arc;

use serde_json::json;
use tracing::{error, warn};

use crate::config::Config;
use crate::diagnostics::{self, Report};
use crate::health;
use crate::middleware::cors::Cors;
use crate::schema::{FieldError, Gig, Message, ValidationError};
use crate::service::{self, DEFAULT_LIMIT};
use crate::store::{DocumentStore, StoreError};
use crate::{IntoResponse, Json, Request, Response, Router, Status};

/// Shared by every request; built once at startup.
pub struct AppState {
    /// `None` when no database is configured or it failed to open.
    pub store: Option<Arc<dyn DocumentStore>>,
    pub config: Config,
}

/// The full application: routes plus fully open CORS.
pub fn create_router(state: AppState) -> Router {
    let state = Arc::new(state);
    let gigs = Arc::clone(&state);
    let contact = Arc::clone(&state);
    let diag = state;

    Router::new()
        .get("/", health::liveness)
        .get("/api/gigs", move |req: Request| list_gigs(Arc::clone(&gigs), req))
        .post("/api/contact", move |req: Request| submit_contact(Arc::clone(&contact), req))
        .get("/test", move |req: Request| test_database(Arc::clone(&diag), req))
        .layer_cors(Cors::permissive())
}

async fn list_gigs(state: Arc<AppState>, req: Request) -> Response {
    let limit = match parse_limit(req.query("limit")) {
        Ok(limit) => limit,
        Err(e) => return unprocessable(e),
    };

    let store = state.store.clone();
    match blocking(move || service::list_gigs(store.as_deref(), limit)).await {
        Ok(gigs) => Json(gigs).into_response(),
        Err(e) => {
            warn!(limit, "serving empty gig list: {e}");
            Json(Vec::<Gig>::new()).into_response()
        }
    }
}

async fn submit_contact(state: Arc<AppState>, req: Request) -> Response {
    let message = match Message::from_json(req.body()) {
        Ok(message) => message,
        Err(e) => return unprocessable(e),
    };

    let store = state.store.clone();
    match blocking(move || service::submit_contact(store.as_deref(), &message)).await {
        Ok(receipt) => Json(receipt).into_response(),
        Err(e) => {
            error!("failed to store contact message: {e}");
            Json(json!({"detail": e.to_string()})).with_status(Status::InternalServerError)
        }
    }
}

async fn test_database(state: Arc<AppState>, _req: Request) -> Json<Report> {
    let probe = Arc::clone(&state);
    let report = tokio::task::spawn_blocking(move || {
        diagnostics::test_database(probe.store.as_deref(), &probe.config)
    })
    .await;
    match report {
        Ok(report) => Json(report),
        Err(e) => Json(Report::failed(&e.to_string(), &state.config)),
    }
}

/// `limit` query parameter: an integer ≥ 1, default [`DEFAULT_LIMIT`].
fn parse_limit(raw: Option<&str>) -> Result<usize, ValidationError> {
    let Some(raw) = raw else { return Ok(DEFAULT_LIMIT) };
    match raw.trim().parse::<usize>() {
        Ok(limit) if limit >= 1 => Ok(limit),
        _ => Err(ValidationError(vec![FieldError::new(
            &["query", "limit"],
            "Input should be a positive integer",
        )])),
    }
}

fn unprocessable(e: ValidationError) -> Response {
    Json(json!({"detail": e.0})).with_status(Status::UnprocessableContent)
}

/// Runs a synchronous store call off the async workers.
async fn blocking<T, F>(f: F) -> Result<T, StoreError>
where
    T: Send + 'static,
    F: FnOnce() -> Result<T, StoreError> + Send + 'static,
{
    tokio::task::spawn_blocking(f)
        .await
        .unwrap_or_else(|e| Err(StoreError::Backend(format!("store task failed: {e}"))))
}
