//! Process-wide router switches.
//!
//! Read once when the router is built and never re-read afterwards.
//!
//! | Variable    | Effect                                   |
//! |-------------|------------------------------------------|
//! | `NOCACHE=1` | request and document caches are bypassed |
//! | `NOHTML=1`  | markup preprocessing is disabled         |

use std::path::PathBuf;

use crate::observability::LogLevel;

pub const NOCACHE_VAR: &str = "NOCACHE";
pub const NOHTML_VAR: &str = "NOHTML";

/// Router construction settings.
#[derive(Debug, Clone)]
pub struct RouterConfig {
    /// Bypass both caches on lookup.
    pub no_cache: bool,
    /// Serve static `.html` files raw, without preprocessing.
    pub markup_disabled: bool,
    /// Initial verbosity.
    pub log_level: LogLevel,
    /// Base directory for includes in handler-produced markup.
    pub markup_root: PathBuf,
}

impl Default for RouterConfig {
    fn default() -> Self {
        Self {
            no_cache: false,
            markup_disabled: false,
            log_level: LogLevel::Errors,
            markup_root: PathBuf::from("."),
        }
    }
}

impl RouterConfig {
    /// Defaults, with the switches taken from the process environment.
    pub fn from_env() -> Self {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Defaults, with the switches taken from `lookup`.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let enabled = |name: &str| lookup(name).as_deref() == Some("1");
        Self {
            no_cache: enabled(NOCACHE_VAR),
            markup_disabled: enabled(NOHTML_VAR),
            ..Self::default()
        }
    }
}
