//! Route registration and dispatch.
//!
//! # Responsibilities
//! - Register routes (primary and late tiers) and fallback handlers
//! - Resolve a method + normalized path: cache first, then table scan,
//!   then the not-found fallback
//! - Extract parameters, run the handler, post-process markup, log
//! - Remove routes and invalidate cached resolutions by pattern
//!
//! # Design Decisions
//! - Every resolution is cached, not-found included. A route registered
//!   after a path was answered 404 stays invisible for that path until the
//!   cache entry is invalidated (`invalidate` or `empty_cache`).
//! - A directory mount from `dir("/assets")` also matches `/assetsfoo` and
//!   serves `foo` from the mounted root; the separator after the prefix is
//!   optional.
//! - Caching is an optimization only; `NOCACHE=1` bypasses it entirely
//! - Handler failures never escape `serve`; they end in a fallback response

use std::fmt::Display;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Instant;

use arc_swap::ArcSwapOption;
use axum::body::Bytes;
use axum::http::{Method, Request, StatusCode};
use percent_encoding::percent_decode_str;
use tracing::Dispatch;

use crate::config::RouterConfig;
use crate::http::response::ResponseWriter;
use crate::markup::directive::Preprocessor;
use crate::markup::static_files::{StaticDir, StaticFile};
use crate::observability::logging::AtomicLogLevel;
use crate::observability::{metrics, LogLevel};
use crate::routing::cache::{request_key, DocumentCache, Invalidation, RequestCache};
use crate::routing::context::RequestContext;
use crate::routing::path;
use crate::routing::pattern::{self, Params, RouteError};
use crate::routing::route::{Handler, Route, RouteKind};
use crate::routing::table::{RouteTable, Tier};

/// The route a method + path resolved to.
#[derive(Debug, Clone)]
pub struct Resolved {
    pub route: Arc<Route>,
    /// True if the request cache answered without scanning the table.
    pub cached: bool,
}

/// Request router with its caches and markup preprocessor.
pub struct Router {
    table: RouteTable,
    pub(crate) requests: RequestCache,
    pub(crate) documents: DocumentCache,
    pub(crate) preprocessor: Preprocessor,
    config: RouterConfig,
    log_level: AtomicLogLevel,
    sink: ArcSwapOption<Dispatch>,
}

impl Default for Router {
    fn default() -> Self {
        Self::new()
    }
}

impl Router {
    /// Create a router configured from the process environment.
    pub fn new() -> Self {
        Self::with_config(RouterConfig::from_env())
    }

    /// Create a router with explicit settings.
    pub fn with_config(config: RouterConfig) -> Self {
        let router = Self {
            table: RouteTable::new(
                Arc::new(default_not_found),
                Arc::new(default_server_error),
            ),
            requests: RequestCache::new(),
            documents: DocumentCache::new(),
            preprocessor: Preprocessor::new(),
            log_level: AtomicLogLevel::new(config.log_level),
            config,
            sink: ArcSwapOption::empty(),
        };

        router.log_settings("Router initialized");
        router
    }

    /// Replace the markup preprocessor.
    pub fn with_preprocessor(mut self, preprocessor: Preprocessor) -> Self {
        self.preprocessor = preprocessor;
        self
    }

    pub fn config(&self) -> &RouterConfig {
        &self.config
    }

    pub fn table(&self) -> &RouteTable {
        &self.table
    }

    pub fn request_cache(&self) -> &RequestCache {
        &self.requests
    }

    pub fn document_cache(&self) -> &DocumentCache {
        &self.documents
    }

    // ---- registration ----

    fn create_route(
        &self,
        tier: Tier,
        method: Method,
        route: &str,
        handler: impl Handler + 'static,
    ) -> Result<(), RouteError> {
        if self.log_level() >= LogLevel::Debug {
            self.log(|| tracing::debug!(method = %method, route, late = tier == Tier::Late, "Creating route"));
        }

        let compiled = Route::new(method, route, Arc::new(handler))?;
        self.table.push(tier, compiled);
        Ok(())
    }

    /// Register a route in the primary tier.
    pub fn route(&self, method: Method, route: &str, handler: impl Handler + 'static) -> Result<(), RouteError> {
        self.create_route(Tier::Primary, method, route, handler)
    }

    /// Register a route that is only considered after every primary route.
    pub fn late_route(&self, method: Method, route: &str, handler: impl Handler + 'static) -> Result<(), RouteError> {
        self.create_route(Tier::Late, method, route, handler)
    }

    pub fn get(&self, route: &str, handler: impl Handler + 'static) -> Result<(), RouteError> {
        self.route(Method::GET, route, handler)
    }

    pub fn post(&self, route: &str, handler: impl Handler + 'static) -> Result<(), RouteError> {
        self.route(Method::POST, route, handler)
    }

    pub fn put(&self, route: &str, handler: impl Handler + 'static) -> Result<(), RouteError> {
        self.route(Method::PUT, route, handler)
    }

    pub fn delete(&self, route: &str, handler: impl Handler + 'static) -> Result<(), RouteError> {
        self.route(Method::DELETE, route, handler)
    }

    pub fn head(&self, route: &str, handler: impl Handler + 'static) -> Result<(), RouteError> {
        self.route(Method::HEAD, route, handler)
    }

    pub fn patch(&self, route: &str, handler: impl Handler + 'static) -> Result<(), RouteError> {
        self.route(Method::PATCH, route, handler)
    }

    /// Replace the not-found handler. The 404 status is set before it runs.
    pub fn set_not_found(&self, handler: impl Handler + 'static) {
        self.table.set_not_found(Arc::new(handler));
    }

    /// Replace the server-error handler. The 500 status is set before it runs.
    pub fn set_server_error(&self, handler: impl Handler + 'static) {
        self.table.set_server_error(Arc::new(handler));
    }

    /// Route string covering a directory mount, for use with [`Router::static_dir`].
    pub fn dir(&self, prefix: &str) -> String {
        pattern::dir(prefix)
    }

    /// Handler serving files below `dir`.
    pub fn static_dir(&self, dir: impl Into<PathBuf>) -> StaticDir {
        StaticDir::new(dir)
    }

    /// Handler serving a single file.
    pub fn static_file(&self, file: impl Into<PathBuf>) -> StaticFile {
        StaticFile::new(file)
    }

    // ---- caches ----

    /// Remove every primary route matching the literal `path`, and the
    /// cached resolutions of that path for any method.
    pub fn remove_route(&self, path: &str) -> Result<usize, RouteError> {
        let removed = self.table.remove_matching(path);
        if removed > 0 {
            self.invalidate(path)?;
        }
        Ok(removed)
    }

    /// Drop request and document cache entries matched by a route pattern.
    pub fn invalidate(&self, pattern: &str) -> Result<(), RouteError> {
        let rule = Invalidation::new(pattern)?;
        let requests = self.requests.invalidate(&rule);
        let documents = self.documents.invalidate(&rule);

        if self.log_level() >= LogLevel::Debug {
            self.log(|| tracing::debug!(pattern, requests, documents, "Cache invalidated"));
        }
        Ok(())
    }

    /// Empty both caches.
    pub fn empty_cache(&self) {
        self.requests.clear();
        self.documents.clear();
    }

    // ---- logging ----

    pub fn set_log_level(&self, level: LogLevel) {
        self.log_level.set(level);
    }

    pub fn log_level(&self) -> LogLevel {
        self.log_level.get()
    }

    /// Send router events to `dispatch` instead of the global subscriber.
    ///
    /// The router settings are logged to the new sink once it is installed.
    pub fn set_log_sink(&self, dispatch: Dispatch) {
        self.sink.store(Some(Arc::new(dispatch)));
        self.log_settings("Log sink installed");
    }

    fn log_settings(&self, message: &str) {
        self.log(|| {
            tracing::info!(
                no_cache = self.config.no_cache,
                markup_disabled = self.config.markup_disabled,
                "{}",
                message
            )
        });
    }

    pub(crate) fn log(&self, event: impl FnOnce()) {
        match self.sink.load_full() {
            Some(dispatch) => tracing::dispatcher::with_default(&dispatch, event),
            None => event(),
        }
    }

    // ---- dispatch ----

    /// Resolve a method and normalized path to a route.
    pub fn resolve(&self, method: &Method, path: &str) -> Resolved {
        let key = request_key(method, path);

        if !self.config.no_cache {
            if let Some(route) = self.requests.get(&key) {
                metrics::record_route_cache(true);
                return Resolved { route, cached: true };
            }
            metrics::record_route_cache(false);
        }

        let route = self
            .table
            .find(method, path)
            .unwrap_or_else(|| self.table.not_found());

        if !self.config.no_cache {
            self.requests.insert(key, route.clone());
        }
        Resolved { route, cached: false }
    }

    /// Dispatch a request and return the buffered response.
    pub fn serve(&self, request: Request<Bytes>) -> ResponseWriter {
        let start = Instant::now();
        let decoded = percent_decode_str(request.uri().path()).decode_utf8_lossy();
        let path = path::clean(&decoded);

        let resolved = self.resolve(request.method(), &path);
        let mut writer = ResponseWriter::new();
        self.call_route(&resolved.route, &path, &mut writer, &request);

        metrics::record_request(request.method().as_str(), writer.status().as_u16(), start);
        writer
    }

    pub(crate) fn call_route(
        &self,
        route: &Route,
        path: &str,
        writer: &mut ResponseWriter,
        request: &Request<Bytes>,
    ) {
        let params = match route.pattern() {
            Some(p) if !p.param_names().is_empty() => p.captures(path).unwrap_or_default(),
            _ => Params::new(),
        };

        let mut ctx = RequestContext::new(self, writer, request, path, params);
        match route.kind() {
            RouteKind::NotFound => ctx.status(StatusCode::NOT_FOUND),
            RouteKind::ServerError => ctx.status(StatusCode::INTERNAL_SERVER_ERROR),
            RouteKind::Normal => {}
        }

        route.handler().handle(&mut ctx);

        if let Some(markup) = ctx.take_markup() {
            self.serve_markup(&mut ctx, &markup, &self.config.markup_root);
        }

        let status = writer.status();
        if status == StatusCode::INTERNAL_SERVER_ERROR {
            self.log(|| tracing::error!(method = %request.method(), path, status = status.as_u16(), "Request"));
        } else if self.log_level() >= LogLevel::Info {
            self.log(|| tracing::info!(method = %request.method(), path, status = status.as_u16(), "Request"));
        }
    }

    /// Run the not-found fallback for `path` and cache it as the resolution.
    pub(crate) fn not_found(&self, request: &Request<Bytes>, path: &str, writer: &mut ResponseWriter) {
        let route = self.table.not_found();
        if !self.config.no_cache {
            self.requests.insert(request_key(request.method(), path), route.clone());
        }
        self.call_route(&route, path, writer, request);
    }

    /// Run the server-error fallback for `path`. Nothing is cached.
    pub(crate) fn internal_error(
        &self,
        err: &dyn Display,
        request: &Request<Bytes>,
        path: &str,
        writer: &mut ResponseWriter,
    ) {
        self.log(|| tracing::error!(error = %err, path, "Internal server error"));
        let route = self.table.server_error();
        self.call_route(&route, path, writer, request);
    }
}

fn default_not_found(ctx: &mut RequestContext<'_>) {
    ctx.writer().default_content_type("text/plain; charset=utf-8");
    ctx.write("404 file not found");
}

fn default_server_error(ctx: &mut RequestContext<'_>) {
    ctx.writer().default_content_type("text/plain; charset=utf-8");
    ctx.write("500 internal server error");
}

