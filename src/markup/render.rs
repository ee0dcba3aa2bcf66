//! Writing preprocessed markup into a response.

use std::path::Path;

use crate::markup::directive::{read_document, MarkupError};
use crate::observability::metrics;
use crate::routing::context::RequestContext;
use crate::routing::router::Router;

const HTML_CONTENT_TYPE: &str = "text/html; charset=utf-8";

impl Router {
    /// Preprocess handler-produced markup and write it. Never cached.
    pub(crate) fn serve_markup(&self, ctx: &mut RequestContext<'_>, text: &str, base: &Path) {
        match self.preprocessor.resolve(text, base) {
            Ok(document) => write_document(ctx, &document),
            Err(e) => fail(ctx, e),
        }
    }

    /// Serve a static markup file, going through the document cache.
    ///
    /// The cache is keyed by the request path; includes resolve from `root`.
    pub(crate) fn serve_static_markup(&self, ctx: &mut RequestContext<'_>, root: &Path, file: &Path) {
        let key = ctx.path().to_string();

        if !self.config().no_cache {
            let cached = self.documents.get(&key);
            metrics::record_document_cache(cached.is_some());
            if let Some(document) = cached {
                write_document(ctx, &document);
                return;
            }
        }

        let text = match read_document(file) {
            Ok(text) => text,
            Err(source) => {
                return fail(
                    ctx,
                    MarkupError::UnreadableDocument {
                        path: file.to_path_buf(),
                        source,
                    },
                )
            }
        };

        match self.preprocessor.resolve(&text, root) {
            Ok(document) => {
                write_document(ctx, &document);
                if !self.config().no_cache {
                    self.documents.insert(key, document);
                }
            }
            Err(e) => fail(ctx, e),
        }
    }
}

fn write_document(ctx: &mut RequestContext<'_>, document: &str) {
    ctx.writer().default_content_type(HTML_CONTENT_TYPE);
    ctx.write(document);
}

fn fail(ctx: &mut RequestContext<'_>, err: MarkupError) {
    if err.is_not_found() {
        ctx.not_found();
    } else {
        ctx.error(err);
    }
}
