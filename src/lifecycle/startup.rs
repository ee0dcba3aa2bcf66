//! Startup wiring.
//!
//! Turns a validated [`ServerConfig`] into a ready [`Router`]: static file
//! routes first, then directory mounts in declaration order.

use std::path::PathBuf;

use axum::http::Method;

use crate::config::{RouterConfig, ServerConfig};
use crate::routing::{RouteError, Router};

/// Build a router from the server configuration.
///
/// Router switches (`NOCACHE`, `NOHTML`) still come from the environment.
pub fn build_router(config: &ServerConfig) -> Result<Router, RouteError> {
    let router = Router::with_config(RouterConfig {
        log_level: config.logging.level,
        ..RouterConfig::from_env()
    });

    for file in &config.static_files {
        router.get(&file.route, router.static_file(&file.file))?;
    }

    for mount in &config.static_dirs {
        let route = router.dir(&mount.mount);
        let handler = router.static_dir(&mount.dir);
        if mount.late {
            router.late_route(Method::GET, &route, handler)?;
        } else {
            router.get(&route, handler)?;
        }
        tracing::info!(mount = %mount.mount, dir = ?mount.dir, late = mount.late, "Static directory mounted");
    }

    Ok(router)
}

/// Directories whose contents feed the document cache.
pub fn content_roots(config: &ServerConfig) -> Vec<PathBuf> {
    let dirs = config.static_dirs.iter().map(|m| m.dir.clone());
    let files = config
        .static_files
        .iter()
        .filter_map(|f| f.file.parent().map(|p| p.to_path_buf()));

    let mut roots: Vec<PathBuf> = dirs.chain(files).collect();
    roots.sort();
    roots.dedup();
    roots
}
