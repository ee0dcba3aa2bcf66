//! Observability subsystem.
//!
//! # Data Flow
//! ```text
//! Router dispatch produces:
//!     → logging.rs (request lines, route creation, handler failures)
//!     → metrics.rs (request counters, latency, cache hit ratios)
//!
//! Consumers:
//!     → tracing subscriber (stderr, or a per-router sink)
//!     → Metrics endpoint (Prometheus scrape)
//! ```
//!
//! # Design Decisions
//! - Router verbosity is independent from the subscriber filter
//! - 500 responses are always logged, whatever the verbosity
//! - Metrics are cheap (atomic increments)

pub mod logging;
pub mod metrics;

pub use logging::LogLevel;
