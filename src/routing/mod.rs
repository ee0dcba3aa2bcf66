//! Routing subsystem.
//!
//! # Data Flow
//! ```text
//! Incoming Request (method, path)
//!     → path.rs (normalize: '.', '..', '//')
//!     → cache.rs (request cache: "METHOD path" → route)
//!     → table.rs (primary tier, then late tier, then not-found)
//!     → pattern.rs (re-apply matcher, zip captures with names)
//!     → context.rs (handler runs with params + response writer)
//!
//! Route Compilation (at registration):
//!     "/user/@id"  → pattern.rs → ^/user/([^/]+)$ + ["id"]
//!     "/files/@@p" → pattern.rs → ^/files/(.+)$   + ["p"]
//! ```
//!
//! # Design Decisions
//! - First match wins within a tier (registration order, not specificity)
//! - Regex based so route strings may carry raw regex between placeholders
//! - One pattern compiler for routing and invalidation
//! - Not-found resolutions are cached too

pub mod cache;
pub mod context;
pub mod path;
pub mod pattern;
pub mod route;
pub mod router;
pub mod table;

pub use context::{ContextError, RequestContext};
pub use pattern::{Params, Pattern, RouteError};
pub use route::{BoxHandler, Handler, Route, RouteKind};
pub use router::{Resolved, Router};
pub use table::Tier;
