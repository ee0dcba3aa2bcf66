//! Request and document caches.
//!
//! # Responsibilities
//! - Remember which route resolved a `METHOD path` key
//! - Remember fully resolved static documents by request path
//! - Drop entries selectively by route pattern, or wholesale
//!
//! # Design Decisions
//! - Two independent maps; a write to one never blocks the other
//! - Entries never expire by time, only by invalidation
//! - Invalidation reuses the route pattern compiler, so a cache entry is
//!   dropped by exactly the paths a route with that pattern would match
//! - Negative results (the not-found fallback) are cached like any other

use std::sync::Arc;

use axum::http::Method;
use dashmap::DashMap;

use crate::routing::pattern::{Pattern, RouteError};
use crate::routing::route::Route;

/// Regex prefix matching the method part of a request cache key.
const METHOD_PREFIX: &str = "[A-Z]+ ";

/// A compiled invalidation rule, usable against both caches.
#[derive(Debug, Clone)]
pub struct Invalidation {
    requests: Pattern,
    documents: Pattern,
}

impl Invalidation {
    /// Compile an invalidation rule from a route pattern (placeholders allowed).
    pub fn new(pattern: &str) -> Result<Self, RouteError> {
        Ok(Self {
            requests: Pattern::compile_prefixed(METHOD_PREFIX, pattern)?,
            documents: Pattern::compile(pattern)?,
        })
    }

    /// Returns true if a request cache key (`METHOD path`) is covered.
    pub fn covers_request(&self, key: &str) -> bool {
        self.requests.is_match(key)
    }

    /// Returns true if a document cache key (request path) is covered.
    pub fn covers_document(&self, path: &str) -> bool {
        self.documents.is_match(path)
    }
}

/// Build the request cache key for a method and normalized path.
pub fn request_key(method: &Method, path: &str) -> String {
    format!("{} {}", method, path)
}

/// Maps `METHOD path` to the route that resolved it.
#[derive(Debug, Default)]
pub struct RequestCache {
    entries: DashMap<String, Arc<Route>>,
}

impl RequestCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, key: &str) -> Option<Arc<Route>> {
        self.entries.get(key).map(|r| r.value().clone())
    }

    pub fn insert(&self, key: String, route: Arc<Route>) {
        self.entries.insert(key, route);
    }

    /// Remove every entry covered by `rule`. Returns the number removed.
    pub fn invalidate(&self, rule: &Invalidation) -> usize {
        let before = self.entries.len();
        self.entries.retain(|key, _| !rule.covers_request(key));
        before.saturating_sub(self.entries.len())
    }

    pub fn clear(&self) {
        self.entries.clear();
    }

    pub fn contains(&self, key: &str) -> bool {
        self.entries.contains_key(key)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Maps a request path to its fully resolved static document.
#[derive(Debug, Default)]
pub struct DocumentCache {
    entries: DashMap<String, String>,
}

impl DocumentCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, path: &str) -> Option<String> {
        self.entries.get(path).map(|r| r.value().clone())
    }

    pub fn insert(&self, path: String, document: String) {
        self.entries.insert(path, document);
    }

    /// Remove every entry covered by `rule`. Returns the number removed.
    pub fn invalidate(&self, rule: &Invalidation) -> usize {
        let before = self.entries.len();
        self.entries.retain(|path, _| !rule.covers_document(path));
        before.saturating_sub(self.entries.len())
    }

    pub fn clear(&self) {
        self.entries.clear();
    }

    pub fn contains(&self, path: &str) -> bool {
        self.entries.contains_key(path)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
