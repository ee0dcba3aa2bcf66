//! Route table.
//!
//! # Responsibilities
//! - Hold compiled routes in two ordered tiers (primary, late)
//! - Hold the not-found and server-error fallbacks
//! - Scan tiers for the first route accepting a method + path
//!
//! # Design Decisions
//! - Within a tier, first registered wins; no reordering by specificity
//! - The late tier is only consulted when nothing in the primary tier matches
//! - Tiers are behind `RwLock` so removal can run alongside dispatch
//! - Fallbacks live in `ArcSwap` so they can be replaced without a lock

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, RwLock};

use arc_swap::ArcSwap;
use axum::http::Method;

use crate::routing::route::{BoxHandler, Route, RouteKind};

/// Which ordered sequence a route is registered into.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Tier {
    Primary,
    Late,
}

/// Ordered routes plus fallbacks.
pub struct RouteTable {
    primary: RwLock<Vec<Arc<Route>>>,
    late: RwLock<Vec<Arc<Route>>>,
    not_found: ArcSwap<Route>,
    server_error: ArcSwap<Route>,
    /// Number of full scans performed.
    scans: AtomicU64,
}

impl RouteTable {
    /// Create an empty table with the given fallback handlers.
    pub fn new(not_found: BoxHandler, server_error: BoxHandler) -> Self {
        Self {
            primary: RwLock::new(Vec::new()),
            late: RwLock::new(Vec::new()),
            not_found: ArcSwap::from_pointee(Route::fallback(RouteKind::NotFound, not_found)),
            server_error: ArcSwap::from_pointee(Route::fallback(
                RouteKind::ServerError,
                server_error,
            )),
            scans: AtomicU64::new(0),
        }
    }

    fn tier(&self, tier: Tier) -> &RwLock<Vec<Arc<Route>>> {
        match tier {
            Tier::Primary => &self.primary,
            Tier::Late => &self.late,
        }
    }

    /// Append a route to the end of a tier.
    pub fn push(&self, tier: Tier, route: Route) {
        self.tier(tier)
            .write()
            .expect("route table lock poisoned")
            .push(Arc::new(route));
    }

    /// Find the first route accepting `method` on `path`, primary tier first.
    pub fn find(&self, method: &Method, path: &str) -> Option<Arc<Route>> {
        self.scans.fetch_add(1, Ordering::Relaxed);

        [Tier::Primary, Tier::Late].into_iter().find_map(|tier| {
            self.tier(tier)
                .read()
                .expect("route table lock poisoned")
                .iter()
                .find(|route| route.matches(method, path))
                .cloned()
        })
    }

    /// Remove every primary route whose pattern matches `path`.
    ///
    /// The late tier is left untouched. Returns the number of routes removed.
    pub fn remove_matching(&self, path: &str) -> usize {
        let mut primary = self.primary.write().expect("route table lock poisoned");
        let before = primary.len();
        primary.retain(|route| !route.matches_path(path));
        before - primary.len()
    }

    pub fn not_found(&self) -> Arc<Route> {
        self.not_found.load_full()
    }

    pub fn server_error(&self) -> Arc<Route> {
        self.server_error.load_full()
    }

    pub fn set_not_found(&self, handler: BoxHandler) {
        self.not_found
            .store(Arc::new(Route::fallback(RouteKind::NotFound, handler)));
    }

    pub fn set_server_error(&self, handler: BoxHandler) {
        self.server_error
            .store(Arc::new(Route::fallback(RouteKind::ServerError, handler)));
    }

    /// Number of routes registered in a tier.
    pub fn len(&self, tier: Tier) -> usize {
        self.tier(tier).read().expect("route table lock poisoned").len()
    }

    /// Number of table scans performed since creation.
    pub fn scans(&self) -> u64 {
        self.scans.load(Ordering::Relaxed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::routing::context::RequestContext;

    fn noop() -> BoxHandler {
        Arc::new(|_: &mut RequestContext<'_>| {})
    }

    fn table() -> RouteTable {
        RouteTable::new(noop(), noop())
    }

    fn add(table: &RouteTable, tier: Tier, method: Method, route: &str) {
        table.push(tier, Route::new(method, route, noop()).unwrap());
    }

    #[test]
    fn test_first_registered_wins() {
        let t = table();
        add(&t, Tier::Primary, Method::GET, "/user/@id");
        add(&t, Tier::Primary, Method::GET, "/user/admin");

        let found = t.find(&Method::GET, "/user/admin").unwrap();
        assert_eq!(found.pattern().unwrap().as_str(), "/user/@id");
    }

    #[test]
    fn test_late_tier_only_after_primary() {
        let t = table();
        add(&t, Tier::Late, Method::GET, "/@@any");
        add(&t, Tier::Primary, Method::GET, "/docs");

        let found = t.find(&Method::GET, "/docs").unwrap();
        assert_eq!(found.pattern().unwrap().as_str(), "/docs");

        let found = t.find(&Method::GET, "/other/page").unwrap();
        assert_eq!(found.pattern().unwrap().as_str(), "/@@any");

        assert!(t.find(&Method::POST, "/docs").is_none());
        assert_eq!(t.scans(), 3);
    }

    #[test]
    fn test_remove_matching_primary_only() {
        let t = table();
        add(&t, Tier::Primary, Method::GET, "/a");
        add(&t, Tier::Primary, Method::POST, "/a");
        add(&t, Tier::Primary, Method::GET, "/b");
        add(&t, Tier::Late, Method::GET, "/a");

        assert_eq!(t.remove_matching("/a"), 2);
        assert_eq!(t.len(Tier::Primary), 1);
        assert_eq!(t.len(Tier::Late), 1);
        assert!(t.find(&Method::GET, "/a").is_some());
        assert!(t.find(&Method::POST, "/a").is_none());
    }

    #[test]
    fn test_replace_fallback() {
        let t = table();
        let before = t.not_found();
        t.set_not_found(noop());
        let after = t.not_found();
        assert!(!Arc::ptr_eq(&before, &after));
        assert_eq!(after.kind(), RouteKind::NotFound);
        assert_eq!(t.server_error().kind(), RouteKind::ServerError);
    }
}
