//! Structured logging.
//!
//! # Responsibilities
//! - Initialize the global tracing subscriber for the binary
//! - Define router verbosity levels
//!
//! # Design Decisions
//! - Uses tracing crate for structured logging
//! - `RUST_LOG` overrides the configured filter when set

use std::sync::atomic::{AtomicU8, Ordering};

use serde::{Deserialize, Serialize};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// Router verbosity.
///
/// Ordered so that `level >= LogLevel::Info` reads naturally.
#[repr(u8)]
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    /// Only server errors.
    #[default]
    Errors = 0,
    /// One line per dispatched request.
    Info = 1,
    /// Route creation and request decoding failures as well.
    Debug = 2,
}

impl From<u8> for LogLevel {
    fn from(val: u8) -> Self {
        match val {
            0 => LogLevel::Errors,
            1 => LogLevel::Info,
            _ => LogLevel::Debug,
        }
    }
}

/// A log level that can be changed while requests are in flight.
#[derive(Debug, Default)]
pub struct AtomicLogLevel(AtomicU8);

impl AtomicLogLevel {
    pub fn new(level: LogLevel) -> Self {
        Self(AtomicU8::new(level as u8))
    }

    pub fn get(&self) -> LogLevel {
        LogLevel::from(self.0.load(Ordering::Relaxed))
    }

    pub fn set(&self, level: LogLevel) {
        self.0.store(level as u8, Ordering::Relaxed);
    }
}

/// Install the global subscriber.
///
/// `default_filter` is used when `RUST_LOG` is not set.
pub fn init(default_filter: &str) {
    let _ = tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| default_filter.into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .try_init();
}
