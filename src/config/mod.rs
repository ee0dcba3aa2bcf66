//! Configuration management subsystem.
//!
//! # Data Flow
//! ```text
//! environment (NOCACHE, NOHTML)
//!     → router.rs (RouterConfig, read once at router construction)
//!
//! tube.toml (server binary only)
//!     → loader.rs (parse & deserialize)
//!     → validation.rs (semantic checks)
//!     → ServerConfig (validated, immutable)
//! ```
//!
//! # Design Decisions
//! - Router switches come from the environment, never from a file
//! - All file fields have defaults to allow minimal configs
//! - Validation separates syntactic (serde) from semantic checks

pub mod loader;
pub mod router;
pub mod schema;
pub mod validation;

pub use loader::{load_config, ConfigError};
pub use router::RouterConfig;
pub use schema::{ListenerConfig, ServerConfig, StaticDirConfig, StaticFileConfig};
