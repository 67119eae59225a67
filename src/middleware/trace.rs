//! Per-request tracing.

use std::time::Instant;

use tracing::{Instrument, info, info_span, warn};

use crate::request::Request;
use crate::response::Response;
use crate::router::Router;

/// Runs `req` through `router` inside a span carrying method and path, and
/// logs status and latency once the response is ready.
pub(crate) async fn traced(router: &Router, req: Request) -> Response {
    let span = info_span!("request", method = %req.method(), path = %req.path());
    async move {
        let started = Instant::now();
        let res = router.handle(req).await;
        let status = u16::from(res.status_code());
        let latency_ms = started.elapsed().as_secs_f64() * 1000.0;
        if status >= 500 {
            warn!(status, latency_ms, "request failed");
        } else {
            info!(status, latency_ms, "request completed");
        }
        res
    }
    .instrument(span)
    .await
}
