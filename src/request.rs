//! Incoming HTTP request type.

use std::collections::HashMap;

use bytes::Bytes;
use http::HeaderMap;
use serde::de::DeserializeOwned;

use crate::method::Method;

/// An incoming HTTP request with its body fully collected.
pub struct Request {
    pub(crate) method: Method,
    pub(crate) path: String,
    pub(crate) query: Vec<(String, String)>,
    pub(crate) headers: HeaderMap,
    pub(crate) body: Bytes,
    pub(crate) params: HashMap<String, String>,
}

impl Request {
    pub(crate) fn new(
        method: Method,
        path: String,
        query: Option<&str>,
        headers: HeaderMap,
        body: Bytes,
        params: HashMap<String, String>,
    ) -> Self {
        // `application/x-www-form-urlencoded`: `+` is a space, `%XX` a byte.
        let query = query
            .map(|raw| form_urlencoded::parse(raw.as_bytes()).into_owned().collect())
            .unwrap_or_default();
        Self { method, path, query, headers, body, params }
    }

    pub fn method(&self) -> Method { self.method }
    pub fn path(&self) -> &str { &self.path }
    pub fn headers(&self) -> &HeaderMap { &self.headers }
    pub fn body(&self) -> &[u8] { &self.body }

    /// Case-insensitive header lookup. Non-UTF-8 values are treated as absent.
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers.get(name).and_then(|v| v.to_str().ok())
    }

    /// Returns a named path parameter.
    ///
    /// For a route `/users/{id}`, `req.param("id")` on `/users/42` returns `Some("42")`.
    pub fn param(&self, key: &str) -> Option<&str> {
        self.params.get(key).map(String::as_str)
    }

    /// Returns the first decoded query-string value for `key`.
    ///
    /// `/api/gigs?limit=2` → `req.query("limit") == Some("2")`.
    pub fn query(&self, key: &str) -> Option<&str> {
        self.query.iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }

    /// Deserializes the body as JSON.
    pub fn json<T: DeserializeOwned>(&self) -> Result<T, serde_json::Error> {
        serde_json::from_slice(&self.body)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn request(query: Option<&str>) -> Request {
        Request::new(
            Method::Get,
            "/api/gigs".to_owned(),
            query,
            HeaderMap::new(),
            Bytes::new(),
            HashMap::new(),
        )
    }

    #[test]
    fn query_values_are_decoded() {
        let req = request(Some("limit=2&city=New+York&q=a%26b&flag"));
        assert_eq!(req.query("limit"), Some("2"));
        assert_eq!(req.query("city"), Some("New York"));
        assert_eq!(req.query("q"), Some("a&b"));
        assert_eq!(req.query("flag"), Some(""));
        assert_eq!(req.query("missing"), None);
    }

    #[test]
    fn first_occurrence_wins() {
        let req = request(Some("limit=3&limit=9"));
        assert_eq!(req.query("limit"), Some("3"));
    }

    #[test]
    fn malformed_escape_is_kept() {
        let req = request(Some("q=100%&r=%zz"));
        assert_eq!(req.query("q"), Some("100%"));
        assert_eq!(req.query("r"), Some("%zz"));
    }

    #[test]
    fn no_query_string() {
        assert_eq!(request(None).query("limit"), None);
    }
}
