//! Radix-tree request router.
//!
//! One tree per HTTP method. O(path-length) lookup. You register a path, you
//! get a handler; the only cross-cutting layer is CORS.

use std::collections::HashMap;
use std::sync::Arc;

use matchit::Router as MatchitRouter;
use serde_json::json;

use crate::handler::{BoxedHandler, Handler};
use crate::method::Method;
use crate::middleware::cors::Cors;
use crate::request::Request;
use crate::response::{Json, Response};
use crate::status::Status;

/// The application router.
///
/// Build it once at startup; pass it to [`Server::serve`](crate::Server::serve).
/// Each registration returns `self` so calls chain naturally.
pub struct Router {
    routes: HashMap<Method, MatchitRouter<BoxedHandler>>,
    cors: Option<Cors>,
}

/// Outcome of matching a method + path pair against the routing table.
pub(crate) enum Lookup {
    Found(BoxedHandler, HashMap<String, String>),
    /// The path exists under a different method.
    MethodNotAllowed,
    NotFound,
}

impl Router {
    pub fn new() -> Self {
        Self { routes: HashMap::new(), cors: None }
    }

    /// Register a handler for a method + path pair. Returns `self` for chaining.
    ///
    /// Path parameters use `{name}` syntax; `req.param("name")` retrieves them.
    ///
    /// # Panics
    ///
    /// Panics if `path` is malformed or conflicts with an existing route.
    /// Routes are fixed at startup, so this is a programming error.
    pub fn on(mut self, method: Method, path: &str, handler: impl Handler) -> Self {
        self.routes
            .entry(method)
            .or_default()
            .insert(path, handler.into_boxed_handler())
            .unwrap_or_else(|e| panic!("invalid route `{path}`: {e}"));
        self
    }

    pub fn get(self, path: &str, handler: impl Handler) -> Self {
        self.on(Method::Get, path, handler)
    }

    pub fn post(self, path: &str, handler: impl Handler) -> Self {
        self.on(Method::Post, path, handler)
    }

    /// Answer CORS preflights and decorate every response per `cors`.
    pub fn layer_cors(mut self, cors: Cors) -> Self {
        self.cors = Some(cors);
        self
    }

    pub(crate) fn lookup(&self, method: Method, path: &str) -> Lookup {
        if let Some(matched) = self.routes.get(&method).and_then(|tree| tree.at(path).ok()) {
            let handler = Arc::clone(matched.value);
            let params = matched.params.iter()
                .map(|(k, v)| (k.to_owned(), v.to_owned()))
                .collect();
            return Lookup::Found(handler, params);
        }

        let elsewhere = self.routes.iter()
            .any(|(m, tree)| *m != method && tree.at(path).is_ok());
        if elsewhere { Lookup::MethodNotAllowed } else { Lookup::NotFound }
    }

    /// Routes one request through CORS and the matching handler.
    pub async fn handle(&self, mut req: Request) -> Response {
        if let Some(res) = self.cors.as_ref().and_then(|c| c.preflight(&req)) {
            return res;
        }
        let origin = req.header("origin").map(str::to_owned);

        let mut res = match self.lookup(req.method, &req.path) {
            Lookup::Found(handler, params) => {
                req.params = params;
                handler.call(req).await
            }
            Lookup::MethodNotAllowed => {
                Json(json!({"detail": "Method Not Allowed"})).with_status(Status::MethodNotAllowed)
            }
            Lookup::NotFound => Json(json!({"detail": "Not Found"})).with_status(Status::NotFound),
        };

        if let Some(cors) = &self.cors {
            cors.decorate(origin.as_deref(), &mut res);
        }
        res
    }
}

impl Default for Router {
    fn default() -> Self { Self::new() }
}
