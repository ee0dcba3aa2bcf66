//! Configuration validation.
//!
//! # Responsibilities
//! - Semantic validation (serde handles syntactic)
//! - Check that addresses parse and mounts are absolute
//! - Check that static mounts and file routes compile as route patterns
//!
//! # Design Decisions
//! - Returns all validation errors, not just first
//! - Validation is pure function: ServerConfig → Result<(), Vec<ValidationError>>
//! - Directories are not required to exist yet; they are read per request

use std::net::SocketAddr;

use crate::config::schema::ServerConfig;
use crate::routing::pattern::{self, Pattern};

/// A single semantic problem in a configuration.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ValidationError {
    #[error("invalid {field} address {value:?}")]
    InvalidAddress { field: &'static str, value: String },

    #[error("request timeout must be greater than zero")]
    ZeroTimeout,

    #[error("mount {0:?} must start with '/'")]
    RelativeMount(String),

    #[error("route {route:?} does not compile: {reason}")]
    InvalidRoute { route: String, reason: String },
}

/// Validate a parsed configuration.
pub fn validate_config(config: &ServerConfig) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();

    if config.listener.bind_address.parse::<SocketAddr>().is_err() {
        errors.push(ValidationError::InvalidAddress {
            field: "listener",
            value: config.listener.bind_address.clone(),
        });
    }

    if config.listener.request_timeout_secs == 0 {
        errors.push(ValidationError::ZeroTimeout);
    }

    if config.metrics.enabled && config.metrics.address.parse::<SocketAddr>().is_err() {
        errors.push(ValidationError::InvalidAddress {
            field: "metrics",
            value: config.metrics.address.clone(),
        });
    }

    for mount in &config.static_dirs {
        if !mount.mount.starts_with('/') {
            errors.push(ValidationError::RelativeMount(mount.mount.clone()));
        }
        check_route(&pattern::dir(&mount.mount), &mut errors);
    }

    for file in &config.static_files {
        check_route(&file.route, &mut errors);
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

fn check_route(route: &str, errors: &mut Vec<ValidationError>) {
    if let Err(e) = Pattern::compile(route) {
        errors.push(ValidationError::InvalidRoute {
            route: route.to_string(),
            reason: e.to_string(),
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::schema::{StaticDirConfig, StaticFileConfig};

    #[test]
    fn test_default_config_is_valid() {
        assert!(validate_config(&ServerConfig::default()).is_ok());
    }

    #[test]
    fn test_collects_all_errors() {
        let mut config = ServerConfig::default();
        config.listener.bind_address = "not an address".into();
        config.listener.request_timeout_secs = 0;
        config.static_dirs.push(StaticDirConfig {
            mount: "assets".into(),
            dir: "public".into(),
            late: false,
        });
        config.static_files.push(StaticFileConfig {
            route: "/broken(".into(),
            file: "x.html".into(),
        });

        let errors = validate_config(&config).unwrap_err();
        assert_eq!(errors.len(), 4);
        assert!(errors.contains(&ValidationError::ZeroTimeout));
        assert!(errors.contains(&ValidationError::RelativeMount("assets".into())));
    }
}
