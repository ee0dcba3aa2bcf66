//! Static content watcher.
//!
//! Served documents are cached by request path, while an include can be
//! shared by any number of them. A change anywhere below a watched root
//! therefore empties both caches instead of guessing which entries it touched.

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use notify::{Config, Event, RecommendedWatcher, RecursiveMode, Watcher};

use crate::routing::Router;

/// Watches static roots and empties the router caches when they change.
pub struct ContentWatcher {
    roots: Vec<PathBuf>,
    router: Arc<Router>,
}

impl ContentWatcher {
    pub fn new(router: Arc<Router>) -> Self {
        Self {
            roots: Vec::new(),
            router,
        }
    }

    /// Add a directory to watch, recursively.
    pub fn watch(mut self, root: impl AsRef<Path>) -> Self {
        self.roots.push(root.as_ref().to_path_buf());
        self
    }

    /// Start watching. Dropping the returned watcher stops it.
    pub fn run(self) -> Result<RecommendedWatcher, notify::Error> {
        let router = self.router.clone();

        let mut watcher = RecommendedWatcher::new(
            move |res: notify::Result<Event>| match res {
                Ok(event) => {
                    if event.kind.is_modify() || event.kind.is_create() || event.kind.is_remove() {
                        router.log(|| {
                            tracing::info!(paths = ?event.paths, "Content change detected, emptying caches")
                        });
                        router.empty_cache();
                    }
                }
                Err(e) => router.log(|| tracing::error!("Watch error: {:?}", e)),
            },
            Config::default().with_poll_interval(Duration::from_secs(2)),
        )?;

        for root in &self.roots {
            watcher.watch(root, RecursiveMode::Recursive)?;
            self.router.log(|| tracing::info!(path = ?root, "Content watcher started"));
        }
        Ok(watcher)
    }
}
