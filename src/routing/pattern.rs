//! Route pattern compilation.
//!
//! A route string is a regular expression over the normalized request path,
//! extended with two placeholders:
//!
//! - `@name`  captures exactly one path segment (`[^/]+`)
//! - `@@name` captures one or more segments, `/` included (`.+`)
//!
//! A placeholder name runs until the next `/`, `)` or the end of the string.
//! Compiled patterns are anchored at both ends, so `/user/@id` never matches
//! `/user/42/extra`.
//!
//! The same compiler is used for route registration and for cache
//! invalidation, which keeps both sides of the cache on one matching
//! language.

use std::collections::HashMap;

use regex::Regex;

use crate::routing::path::trim_trailing_slash;

/// URL parameters extracted from a matched path, by placeholder name.
pub type Params = HashMap<String, String>;

/// Regex fragment for a single segment placeholder.
const SEGMENT: &str = "([^/]+)";
/// Regex fragment for a multi segment placeholder.
const WILDCARD: &str = "(.+)";

/// Error type for route compilation.
#[derive(Debug, thiserror::Error)]
pub enum RouteError {
    /// The translated pattern is not a valid regular expression.
    #[error("invalid route pattern {pattern:?}: {source}")]
    InvalidPattern {
        pattern: String,
        #[source]
        source: regex::Error,
    },

    /// The pattern carries capture groups that are not placeholders.
    #[error("route pattern {pattern:?} declares {params} parameters but has {groups} capture groups")]
    GroupMismatch {
        pattern: String,
        params: usize,
        groups: usize,
    },
}

/// A compiled, anchored route pattern.
#[derive(Debug, Clone)]
pub struct Pattern {
    source: String,
    regex: Regex,
    params: Vec<String>,
}

impl Pattern {
    /// Compile a route string into an anchored matcher plus its parameter names.
    pub fn compile(route: &str) -> Result<Self, RouteError> {
        Self::compile_prefixed("", route)
    }

    /// Compile a route string behind a raw regex `prefix`.
    ///
    /// The prefix is placed after the start anchor and is not subject to
    /// trailing slash trimming or placeholder expansion.
    pub fn compile_prefixed(prefix: &str, route: &str) -> Result<Self, RouteError> {
        let (translated, params) = translate(route);
        let expr = format!("^{}{}", prefix, &translated[1..]);

        let regex = Regex::new(&expr).map_err(|source| RouteError::InvalidPattern {
            pattern: route.to_string(),
            source,
        })?;

        // group 0 is the whole match
        let groups = regex.captures_len() - 1;
        if groups != params.len() {
            return Err(RouteError::GroupMismatch {
                pattern: route.to_string(),
                params: params.len(),
                groups,
            });
        }

        Ok(Self {
            source: route.to_string(),
            regex,
            params,
        })
    }

    /// Returns true if the pattern matches the entire path.
    pub fn is_match(&self, path: &str) -> bool {
        self.regex.is_match(path)
    }

    /// Extract parameters from `path`, or `None` if it does not match.
    ///
    /// Optional groups that did not participate are reported as empty strings.
    pub fn captures(&self, path: &str) -> Option<Params> {
        if self.params.is_empty() {
            return self.is_match(path).then(Params::new);
        }

        let caps = self.regex.captures(path)?;
        let params = self
            .params
            .iter()
            .enumerate()
            .map(|(i, name)| {
                let value = caps.get(i + 1).map(|m| m.as_str()).unwrap_or_default();
                (name.clone(), value.to_string())
            })
            .collect();
        Some(params)
    }

    /// Parameter names in declaration order.
    pub fn param_names(&self) -> &[String] {
        &self.params
    }

    /// The route string this pattern was compiled from.
    pub fn as_str(&self) -> &str {
        &self.source
    }

    /// The anchored regular expression the route string translated into.
    pub fn regex_str(&self) -> &str {
        self.regex.as_str()
    }
}

/// Translate a route string into an anchored regex source and parameter list.
pub fn translate(route: &str) -> (String, Vec<String>) {
    let route = trim_trailing_slash(route);

    let mut expr = String::with_capacity(route.len() + 16);
    let mut params = Vec::new();
    expr.push('^');

    let mut rest = route;
    while let Some(at) = rest.find('@') {
        expr.push_str(&rest[..at]);

        let after = &rest[at..];
        let sigils = after.len() - after.trim_start_matches('@').len();
        let tail = &after[sigils..];
        let name_len = tail.find(['/', ')']).unwrap_or(tail.len());

        if name_len == 0 {
            // a bare '@' is literal text
            expr.push_str(&after[..sigils]);
        } else {
            // wildcard form first so '@@name' is never read as '@name'
            expr.push_str(if sigils >= 2 { WILDCARD } else { SEGMENT });
            params.push(tail[..name_len].to_string());
        }

        rest = &tail[name_len..];
    }
    expr.push_str(rest);
    expr.push('$');

    (expr, params)
}

/// Build a route string matching a directory mount and everything below it.
///
/// The optional `/` stays outside the `path` parameter, so `/assets` yields
/// an empty `path` and `/assets/css/site.css` yields `css/site.css`.
///
/// Because the `/` is optional, `/assetsfoo` matches too, with `path = "foo"`,
/// so a mount at `/assets` also serves `<root>/foo` on that URL.
pub fn dir(prefix: &str) -> String {
    format!("{}(?:/?@@path)?", trim_trailing_slash(prefix))
}
