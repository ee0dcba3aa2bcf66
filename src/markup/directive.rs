//! Markup directive preprocessor.
//!
//! Two directives are understood inside HTML comments:
//!
//! ```text
//! <!-- include "partials/nav.html" -->
//! <!-- if $NAME { text } -->
//! <!-- if !$NAME { text } -->
//! ```
//!
//! Includes are resolved depth first, relative to the directory of the file
//! that contains them. A conditional keeps `text` when the environment
//! variable is set to a non-empty value (inverted by `!`), and otherwise
//! collapses to nothing. Conditionals are evaluated after every include of
//! the same text has been substituted.

use std::collections::HashMap;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::{Arc, LazyLock};

use regex::{Captures, Regex};

/// Deepest include chain followed before giving up.
pub const MAX_INCLUDE_DEPTH: usize = 32;

static INCLUDE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"<!--\s*include\s+"(.+?)"\s*-->"#).expect("include directive regex is valid")
});

static CONDITIONAL: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?s)<!--\s*if\s+(!)?\$([^\s{}]+)\s*\{\s*(.*?)\s*\}\s*-->")
        .expect("conditional directive regex is valid")
});

/// Error type for markup resolution.
#[derive(Debug, thiserror::Error)]
pub enum MarkupError {
    /// An included file could not be read.
    #[error("unreadable include {}: {source}", path.display())]
    UnreadableInclude {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    /// The top-level static document could not be read.
    #[error("unreadable document {}: {source}", path.display())]
    UnreadableDocument {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    /// Includes nested deeper than the preprocessor allows.
    #[error("include chain deeper than {limit} at {}", path.display())]
    IncludeDepthExceeded { path: PathBuf, limit: usize },
}

impl MarkupError {
    /// Returns true if the failure is a file that does not exist.
    pub fn is_not_found(&self) -> bool {
        match self {
            MarkupError::UnreadableInclude { source, .. }
            | MarkupError::UnreadableDocument { source, .. } => {
                source.kind() == io::ErrorKind::NotFound
            }
            MarkupError::IncludeDepthExceeded { .. } => false,
        }
    }
}

/// Source of the variables conditionals test.
pub trait Environment: Send + Sync {
    fn var(&self, name: &str) -> Option<String>;
}

/// The process environment.
#[derive(Debug, Default, Clone, Copy)]
pub struct ProcessEnv;

impl Environment for ProcessEnv {
    fn var(&self, name: &str) -> Option<String> {
        std::env::var(name).ok()
    }
}

impl Environment for HashMap<String, String> {
    fn var(&self, name: &str) -> Option<String> {
        self.get(name).cloned()
    }
}

/// Read a markup file as text.
pub fn read_document(path: &Path) -> io::Result<String> {
    fs::read_to_string(path)
}

/// Resolves include and conditional directives.
#[derive(Clone)]
pub struct Preprocessor {
    env: Arc<dyn Environment>,
    max_depth: usize,
}

impl Default for Preprocessor {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for Preprocessor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Preprocessor")
            .field("max_depth", &self.max_depth)
            .finish_non_exhaustive()
    }
}

impl Preprocessor {
    /// Preprocessor reading conditionals from the process environment.
    pub fn new() -> Self {
        Self::with_env(ProcessEnv)
    }

    /// Preprocessor reading conditionals from `env`.
    pub fn with_env(env: impl Environment + 'static) -> Self {
        Self {
            env: Arc::new(env),
            max_depth: MAX_INCLUDE_DEPTH,
        }
    }

    /// Override the include depth limit.
    pub fn max_depth(mut self, depth: usize) -> Self {
        self.max_depth = depth;
        self
    }

    /// Resolve all directives in `text`; includes are relative to `base`.
    pub fn resolve(&self, text: &str, base: &Path) -> Result<String, MarkupError> {
        self.resolve_at(text, base, 0)
    }

    fn resolve_at(&self, text: &str, base: &Path, depth: usize) -> Result<String, MarkupError> {
        let text = self.resolve_includes(text, base, depth)?;
        Ok(self.resolve_conditionals(&text))
    }

    fn resolve_includes(&self, text: &str, base: &Path, depth: usize) -> Result<String, MarkupError> {
        let mut current = text.to_string();
        let mut passes = 0;

        while INCLUDE.is_match(&current) {
            passes += 1;
            if passes > self.max_depth {
                return Err(MarkupError::IncludeDepthExceeded {
                    path: base.to_path_buf(),
                    limit: self.max_depth,
                });
            }

            let mut out = String::with_capacity(current.len());
            let mut last = 0;
            for caps in INCLUDE.captures_iter(&current) {
                let Some(tag) = caps.get(0) else { continue };
                out.push_str(&current[last..tag.start()]);
                out.push_str(&self.include(&caps[1], base, depth)?);
                last = tag.end();
            }
            out.push_str(&current[last..]);
            current = out;
        }

        Ok(current)
    }

    fn include(&self, target: &str, base: &Path, depth: usize) -> Result<String, MarkupError> {
        // leading '/' still means "relative to base"
        let file = base.join(target.trim_start_matches('/'));

        if depth >= self.max_depth {
            return Err(MarkupError::IncludeDepthExceeded {
                path: file,
                limit: self.max_depth,
            });
        }

        let body = read_document(&file).map_err(|source| MarkupError::UnreadableInclude {
            path: file.clone(),
            source,
        })?;

        let next_base = file.parent().unwrap_or(base);
        self.resolve_at(&body, next_base, depth + 1)
    }

    fn resolve_conditionals(&self, text: &str) -> String {
        CONDITIONAL
            .replace_all(text, |caps: &Captures<'_>| {
                let invert = caps.get(1).is_some();
                let set = self.env.var(&caps[2]).is_some_and(|v| !v.is_empty());
                if set != invert {
                    caps[3].to_string()
                } else {
                    String::new()
                }
            })
            .into_owned()
    }
}
