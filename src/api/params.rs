//! Form parameters
//!
//! Graphite parameters may arrive in the query string, in a urlencoded
//! POST body, or both, and `target` may repeat. Values are kept as ordered
//! pairs: body pairs first, then query-string pairs.

use axum::http::Method;

/// Ordered, possibly repeated request parameters
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct FormParams {
    pairs: Vec<(String, String)>,
}

impl FormParams {
    pub fn new(pairs: Vec<(String, String)>) -> Self {
        Self { pairs }
    }

    /// Combine query-string pairs with an optional form body
    ///
    /// The body only counts for methods that carry one; for GET the form
    /// extractor re-reads the query string, which would duplicate values.
    pub fn from_request(
        method: &Method,
        query: Vec<(String, String)>,
        body: Option<Vec<(String, String)>>,
    ) -> Self {
        let mut pairs = match body {
            Some(body) if method != Method::GET && method != Method::HEAD => body,
            _ => Vec::new(),
        };
        pairs.extend(query);
        Self { pairs }
    }

    /// First value for `key`
    pub fn get(&self, key: &str) -> Option<&str> {
        self.pairs
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }

    /// First non-empty value among `keys`, in order
    pub fn first_non_empty(&self, keys: &[&str]) -> Option<&str> {
        keys.iter()
            .filter_map(|key| self.get(key))
            .find(|v| !v.is_empty())
    }

    /// Every value for `key`, in order
    pub fn all(&self, key: &str) -> Vec<&str> {
        self.pairs
            .iter()
            .filter(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
            .collect()
    }
}
