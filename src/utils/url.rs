//! Request URL to filesystem path mapping.

use std::path::{Component, Path, PathBuf};

use percent_encoding::percent_decode_str;

/// Strip the query string and fragment from a request target.
pub fn path_only(url: &str) -> &str {
    let end = url.find(['?', '#']).unwrap_or(url.len());
    &url[..end]
}

/// Percent-decode a URL path.
///
/// Returns `None` when the decoded bytes are not valid UTF-8.
pub fn decode(path: &str) -> Option<String> {
    percent_decode_str(path)
        .decode_utf8()
        .ok()
        .map(std::borrow::Cow::into_owned)
}

/// Map a decoded URL path onto `root`.
///
/// Leading slashes are dropped and `.` segments ignored. Returns `None` for
/// paths that would escape `root` (`..`, absolute or prefixed components).
pub fn join_under(root: &Path, url_path: &str) -> Option<PathBuf> {
    let relative = Path::new(url_path.trim_start_matches('/'));
    let mut joined = root.to_path_buf();
    for component in relative.components() {
        match component {
            Component::Normal(part) => joined.push(part),
            Component::CurDir => {}
            Component::ParentDir | Component::RootDir | Component::Prefix(_) => return None,
        }
    }
    Some(joined)
}
