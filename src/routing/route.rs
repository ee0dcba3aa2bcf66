//! Routes and the handler capability.

use std::fmt;
use std::sync::Arc;

use axum::http::Method;

use crate::routing::context::RequestContext;
use crate::routing::pattern::{Pattern, RouteError};

/// A unit of request handling code.
///
/// Plain closures implement this through the blanket impl below; stateful
/// handlers implement it directly. Wrapping one handler in another (an auth
/// gate, say) is ordinary composition.
pub trait Handler: Send + Sync {
    /// Handle a request. Completion is implied by returning.
    fn handle(&self, ctx: &mut RequestContext<'_>);
}

impl<F> Handler for F
where
    F: Fn(&mut RequestContext<'_>) + Send + Sync,
{
    fn handle(&self, ctx: &mut RequestContext<'_>) {
        self(ctx)
    }
}

/// Shared, type-erased handler.
pub type BoxHandler = Arc<dyn Handler>;

/// What a route stands for when it is resolved.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RouteKind {
    /// A registered method + pattern route.
    Normal,
    /// The not-found fallback; forces 404 before its handler runs.
    NotFound,
    /// The server-error fallback; forces 500 before its handler runs.
    ServerError,
}

/// A compiled route bound to its handler.
pub struct Route {
    kind: RouteKind,
    method: Option<Method>,
    pattern: Option<Pattern>,
    handler: BoxHandler,
}

impl Route {
    /// Compile a normal route.
    pub fn new(method: Method, route: &str, handler: BoxHandler) -> Result<Self, RouteError> {
        Ok(Self {
            kind: RouteKind::Normal,
            method: Some(method),
            pattern: Some(Pattern::compile(route)?),
            handler,
        })
    }

    /// Create one of the two fallback routes. Fallbacks have no method or pattern.
    pub fn fallback(kind: RouteKind, handler: BoxHandler) -> Self {
        Self {
            kind,
            method: None,
            pattern: None,
            handler,
        }
    }

    pub fn kind(&self) -> RouteKind {
        self.kind
    }

    pub fn method(&self) -> Option<&Method> {
        self.method.as_ref()
    }

    pub fn pattern(&self) -> Option<&Pattern> {
        self.pattern.as_ref()
    }

    /// Returns true if this route accepts `method` on `path`.
    pub fn matches(&self, method: &Method, path: &str) -> bool {
        match (&self.method, &self.pattern) {
            (Some(m), Some(p)) => m == method && p.is_match(path),
            _ => false,
        }
    }

    /// Returns true if the route pattern matches `path`, ignoring the method.
    pub fn matches_path(&self, path: &str) -> bool {
        self.pattern.as_ref().is_some_and(|p| p.is_match(path))
    }

    pub(crate) fn handler(&self) -> &dyn Handler {
        self.handler.as_ref()
    }
}

impl fmt::Debug for Route {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Route")
            .field("kind", &self.kind)
            .field("method", &self.method)
            .field("pattern", &self.pattern.as_ref().map(Pattern::as_str))
            .finish_non_exhaustive()
    }
}
