//! Markup subsystem.
//!
//! # Data Flow
//! ```text
//! Handler markup buffer (dynamic)          Static .html file
//!     │                                        │
//!     │                                   document cache ──hit──▶ response
//!     │                                        │ miss
//!     ▼                                        ▼
//! directive.rs (include / if) ◀────────── read file
//!     │
//!     ▼
//! response  (static results stored in the document cache)
//! ```
//!
//! # Design Decisions
//! - Dynamic markup is never cached; its content depends on request state
//! - Missing files map to the not-found fallback, other read failures to
//!   the server-error fallback
//! - Static includes resolve from the static root, not the request path

pub mod directive;
pub mod render;
pub mod static_files;
pub mod watcher;

pub use directive::{Environment, MarkupError, Preprocessor, ProcessEnv};
pub use static_files::{StaticDir, StaticFile};
pub use watcher::ContentWatcher;
