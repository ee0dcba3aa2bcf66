//! URL path normalization.
//!
//! Lexical cleanup only: the filesystem is never consulted.
//!
//! # Rules
//! - Runs of `/` collapse into one
//! - `.` elements are dropped
//! - `..` removes the element before it; at the root it is dropped
//! - Trailing `/` is removed except for the root itself
//! - An empty relative result becomes `.`

/// Return the shortest path equivalent to `path`.
pub fn clean(path: &str) -> String {
    if path.is_empty() {
        return ".".to_string();
    }

    let rooted = path.starts_with('/');
    let mut parts: Vec<&str> = Vec::new();

    for segment in path.split('/') {
        match segment {
            "" | "." => {}
            ".." => match parts.last() {
                Some(&last) if last != ".." => {
                    parts.pop();
                }
                // ".." above the root goes nowhere
                _ if rooted => {}
                _ => parts.push(".."),
            },
            other => parts.push(other),
        }
    }

    let joined = parts.join("/");
    match (rooted, joined.is_empty()) {
        (true, _) => format!("/{}", joined),
        (false, true) => ".".to_string(),
        (false, false) => joined,
    }
}

/// Strip a single trailing `/` unless the path is exactly `/`.
pub fn trim_trailing_slash(path: &str) -> &str {
    if path != "/" {
        if let Some(stripped) = path.strip_suffix('/') {
            return stripped;
        }
    }
    path
}

/// Return the extension of the last path element, including the dot.
pub fn extension(path: &str) -> &str {
    let name = path.rsplit('/').next().unwrap_or(path);
    match name.rfind('.') {
        Some(idx) => &name[idx..],
        None => "",
    }
}
