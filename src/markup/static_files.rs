//! Static file handlers.
//!
//! # Responsibilities
//! - Serve a directory mount (`StaticDir`) or a single file (`StaticFile`)
//! - Hand `.html` files to the markup preprocessor unless disabled
//! - Serve everything else raw, with a content type from the extension
//!
//! # Design Decisions
//! - Directory listings are never produced; a directory without an
//!   `index.html` is not found
//! - Extension-less paths are remapped to `index.html` when one exists
//! - Paths are already normalized by the dispatcher, so `..` cannot climb
//!   out of the root

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use crate::routing::context::RequestContext;
use crate::routing::path;
use crate::routing::route::Handler;

const INDEX: &str = "index.html";

/// Handler serving files below a root directory.
///
/// Mount it on a [`Router::dir`](crate::routing::Router::dir) pattern so the
/// `path` parameter carries the file path relative to the mount.
#[derive(Debug, Clone)]
pub struct StaticDir {
    root: PathBuf,
}

impl StaticDir {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    fn locate(&self, relative: &str) -> PathBuf {
        self.root.join(relative.trim_start_matches('/'))
    }
}

impl Handler for StaticDir {
    fn handle(&self, ctx: &mut RequestContext<'_>) {
        let router = ctx.router();
        let markup = !router.config().markup_disabled;

        let mut relative = if ctx.params().contains_key("path") {
            path::clean(&format!("/{}", ctx.param("path")))
        } else {
            ctx.path().to_string()
        };

        if markup
            && path::extension(&relative).is_empty()
            && self.locate(&relative).join(INDEX).is_file()
        {
            relative = path::clean(&format!("{}/{}", relative, INDEX));
        }

        let file = self.locate(&relative);
        if markup && relative.ends_with(".html") {
            router.serve_static_markup(ctx, &self.root, &file);
        } else {
            serve_file(ctx, &file);
        }
    }
}

/// Handler serving one file, whatever the request path.
#[derive(Debug, Clone)]
pub struct StaticFile {
    file: PathBuf,
}

impl StaticFile {
    pub fn new(file: impl Into<PathBuf>) -> Self {
        Self { file: file.into() }
    }
}

impl Handler for StaticFile {
    fn handle(&self, ctx: &mut RequestContext<'_>) {
        let router = ctx.router();
        let is_markup = self.file.extension().is_some_and(|ext| ext == "html");

        if is_markup && !router.config().markup_disabled {
            let dir = self.file.parent().unwrap_or(Path::new("."));
            router.serve_static_markup(ctx, dir, &self.file);
        } else if !self.file.exists() {
            ctx.error(format!(
                "static file mapped to nonexistent file {}",
                self.file.display()
            ));
        } else {
            serve_file(ctx, &self.file);
        }
    }
}

/// Write a file's bytes, resolving directories to their `index.html`.
fn serve_file(ctx: &mut RequestContext<'_>, file: &Path) {
    let target = match fs::metadata(file) {
        Ok(meta) if meta.is_dir() => {
            let index = file.join(INDEX);
            if !index.is_file() {
                return ctx.not_found();
            }
            index
        }
        Ok(_) => file.to_path_buf(),
        Err(_) => return ctx.not_found(),
    };

    match fs::read(&target) {
        Ok(bytes) => {
            ctx.writer().default_content_type(content_type(&target));
            ctx.write(bytes);
        }
        Err(e) if e.kind() == io::ErrorKind::NotFound => ctx.not_found(),
        Err(e) => ctx.error(format!("unreadable static file {}: {}", target.display(), e)),
    }
}

/// Guess a content type from the file extension.
pub fn content_type(file: &Path) -> &'static str {
    match file.extension().and_then(|ext| ext.to_str()) {
        Some("html") | Some("htm") => "text/html; charset=utf-8",
        Some("css") => "text/css; charset=utf-8",
        Some("js") | Some("mjs") => "application/javascript; charset=utf-8",
        Some("json") => "application/json; charset=utf-8",
        Some("txt") => "text/plain; charset=utf-8",
        Some("md") => "text/markdown; charset=utf-8",
        Some("xml") => "application/xml",
        Some("png") => "image/png",
        Some("jpg") | Some("jpeg") => "image/jpeg",
        Some("gif") => "image/gif",
        Some("svg") => "image/svg+xml",
        Some("webp") => "image/webp",
        Some("ico") => "image/x-icon",
        Some("woff") => "font/woff",
        Some("woff2") => "font/woff2",
        Some("ttf") => "font/ttf",
        Some("wasm") => "application/wasm",
        Some("pdf") => "application/pdf",
        _ => "application/octet-stream",
    }
}
