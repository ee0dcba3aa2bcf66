//! Pattern-based HTTP request router with a markup preprocessor.
//!
//! Routes are registered as `@name` / `@@name` pattern strings and resolved
//! in registration order, with a late tier and not-found / server-error
//! fallbacks. Resolutions are cached per `METHOD path` and invalidated by
//! the same pattern language. Served HTML can pull in other files with
//! `<!-- include "..." -->` and toggle text on environment variables with
//! `<!-- if $NAME { ... } -->`.

pub mod config;
pub mod http;
pub mod lifecycle;
pub mod markup;
pub mod observability;
pub mod routing;

pub use config::{RouterConfig, ServerConfig};
pub use http::HttpServer;
pub use lifecycle::Shutdown;
pub use markup::{MarkupError, Preprocessor};
pub use observability::LogLevel;
pub use routing::{Handler, Params, RequestContext, RouteError, Router};
