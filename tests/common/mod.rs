//! Shared utilities for integration tests.

#![allow(dead_code)]

use std::collections::HashMap;
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

use axum::body::Bytes;
use axum::http::{Method, Request};
use tempfile::TempDir;

use tube::http::ResponseWriter;
use tube::markup::Preprocessor;
use tube::{Router, RouterConfig};

/// A router with default settings and an empty conditional environment.
pub fn router() -> Router {
    router_with(RouterConfig::default(), &[])
}

/// A router with explicit settings and conditional environment.
pub fn router_with(config: RouterConfig, env: &[(&str, &str)]) -> Router {
    let env: HashMap<String, String> = env
        .iter()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect();
    Router::with_config(config).with_preprocessor(Preprocessor::with_env(env))
}

pub fn request(method: Method, path: &str) -> Request<Bytes> {
    Request::builder()
        .method(method)
        .uri(path)
        .body(Bytes::new())
        .unwrap()
}

pub fn get(router: &Router, path: &str) -> ResponseWriter {
    router.serve(request(Method::GET, path))
}

/// A throwaway directory tree of documents.
pub struct Site {
    dir: TempDir,
}

impl Site {
    pub fn new() -> Self {
        Self {
            dir: tempfile::tempdir().unwrap(),
        }
    }

    /// Write `contents` to `relative`, creating parent directories.
    pub fn file(self, relative: &str, contents: impl AsRef<[u8]>) -> Self {
        let path = self.dir.path().join(relative);
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).unwrap();
        }
        fs::write(path, contents).unwrap();
        self
    }

    pub fn dir(self, relative: &str) -> Self {
        fs::create_dir_all(self.dir.path().join(relative)).unwrap();
        self
    }

    pub fn path(&self) -> &Path {
        self.dir.path()
    }

    pub fn join(&self, relative: &str) -> PathBuf {
        self.dir.path().join(relative)
    }

    pub fn rewrite(&self, relative: &str, contents: &str) {
        fs::write(self.join(relative), contents).unwrap();
    }
}

/// In-memory log output for a per-router sink.
#[derive(Clone, Default)]
pub struct LogBuffer(Arc<Mutex<Vec<u8>>>);

impl LogBuffer {
    pub fn contents(&self) -> String {
        String::from_utf8_lossy(&self.0.lock().unwrap()).into_owned()
    }

    pub fn dispatch(&self) -> tracing::Dispatch {
        let buffer = self.clone();
        let subscriber = tracing_subscriber::fmt()
            .with_ansi(false)
            .with_max_level(tracing::Level::DEBUG)
            .with_writer(move || buffer.clone())
            .finish();
        tracing::Dispatch::new(subscriber)
    }
}

impl Write for LogBuffer {
    fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
        self.0.lock().unwrap().extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> std::io::Result<()> {
        Ok(())
    }
}
