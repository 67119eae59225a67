//! Cross-origin resource sharing.
//!
//! The site's frontend is served from a different origin, so the API is fully
//! open: any origin, any method, any request header, credentials allowed.
//! Because credentials are allowed, the caller's `Origin` is echoed back
//! rather than answered with a literal `*`.

use crate::method::Method;
use crate::request::Request;
use crate::response::Response;
use crate::status::Status;

const ALLOW_ORIGIN: &str = "access-control-allow-origin";
const ALLOW_CREDENTIALS: &str = "access-control-allow-credentials";
const ALLOW_METHODS: &str = "access-control-allow-methods";
const ALLOW_HEADERS: &str = "access-control-allow-headers";
const MAX_AGE: &str = "access-control-max-age";
const REQUEST_METHOD: &str = "access-control-request-method";
const REQUEST_HEADERS: &str = "access-control-request-headers";

/// CORS policy applied by [`Router::layer_cors`](crate::Router::layer_cors).
#[derive(Clone, Debug)]
pub struct Cors {
    allow_credentials: bool,
    max_age_secs: u32,
}

impl Cors {
    /// All origins, methods and headers; credentials allowed; preflights
    /// cached for ten minutes.
    pub fn permissive() -> Self {
        Self { allow_credentials: true, max_age_secs: 600 }
    }

    /// Answers a preflight request, or returns `None` for anything else.
    ///
    /// A preflight is an `OPTIONS` request carrying both `Origin` and
    /// `Access-Control-Request-Method`.
    pub(crate) fn preflight(&self, req: &Request) -> Option<Response> {
        if req.method() != Method::Options {
            return None;
        }
        let origin = req.header("origin")?;
        req.header(REQUEST_METHOD)?;

        let methods = ["DELETE", "GET", "HEAD", "OPTIONS", "PATCH", "POST", "PUT"].join(", ");
        let mut builder = Response::builder()
            .status(Status::Ok)
            .header(ALLOW_ORIGIN, origin)
            .header(ALLOW_METHODS, &methods)
            .header(MAX_AGE, &self.max_age_secs.to_string())
            .header("vary", "Origin");
        if let Some(requested) = req.header(REQUEST_HEADERS) {
            builder = builder.header(ALLOW_HEADERS, requested);
        }
        if self.allow_credentials {
            builder = builder.header(ALLOW_CREDENTIALS, "true");
        }
        Some(builder.text("OK"))
    }

    /// Adds the allow headers to a response for a cross-origin request.
    /// Same-origin requests (no `Origin` header) are left untouched.
    pub(crate) fn decorate(&self, origin: Option<&str>, res: &mut Response) {
        let Some(origin) = origin else { return };
        res.set_header(ALLOW_ORIGIN, origin);
        if self.allow_credentials {
            res.set_header(ALLOW_CREDENTIALS, "true");
        }
        res.set_header("vary", "Origin");
    }
}
