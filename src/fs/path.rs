//! Slash-delimited path handling.

/// Splits `path` into its lookup segments.
///
/// A leading slash (or an entirely empty path) contributes no segment and a
/// single trailing slash is ignored, so `"/a/b"`, `"a/b"` and `"/a/b/"` all
/// yield `["a", "b"]` while `"/"` and `""` yield no segment at all.
pub fn components(path: &str) -> Vec<&str> {
    let mut parts: Vec<&str> = path.split('/').collect();
    if parts.first() == Some(&"") {
        parts.remove(0);
    }
    if parts.last() == Some(&"") {
        parts.pop();
    }
    parts
}

/// Splits `path` into the parent directory path (kept with its trailing
/// slash) and the final component.
///
/// The path is normalized to start with a slash first, so `"hi"` splits
/// into `("/", "hi")`.
pub fn split_parent(path: &str) -> (String, String) {
    let mut full = String::from(path);
    if !full.starts_with('/') {
        full.insert(0, '/');
    }
    while full.len() > 1 && full.ends_with('/') {
        full.pop();
    }
    let split = full.rfind('/').unwrap();
    let name = full[split + 1..].to_owned();
    full.truncate(split + 1);
    (full, name)
}
