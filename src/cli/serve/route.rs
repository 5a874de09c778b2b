//! Request path classification.
//!
//! Pure mapping from a request target to what should answer it; nothing
//! here builds or reads file contents.

use std::io::{self, ErrorKind};
use std::path::{Path, PathBuf};

use crate::compiler::{ARTIFACT_NAME, RUNTIME_SCRIPT};
use crate::utils::url;

/// Name that maps to the embedded entry page.
pub const INDEX_NAME: &str = "index.html";

/// Where a request goes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Route {
    /// Directory requested without a trailing slash; holds the location.
    Redirect(String),
    /// Embedded entry page.
    Index,
    /// Toolchain runtime support script.
    RuntimeScript,
    /// Fresh build of the artifact.
    Artifact,
    /// File under the working directory (may not exist).
    Static(PathBuf),
    /// Undecodable or escaping path.
    NotFound,
}

/// Classify `target` against `root`.
///
/// A failed stat other than "not found" is returned as `Err`.
pub fn resolve(target: &str, root: &Path) -> io::Result<Route> {
    let raw = url::path_only(target);
    let Some(path) = url::decode(raw) else {
        return Ok(Route::NotFound);
    };
    let Some(mut local) = url::join_under(root, &path) else {
        return Ok(Route::NotFound);
    };

    let trailing_slash = path.ends_with('/');
    match std::fs::metadata(&local) {
        Ok(meta) if meta.is_dir() && !trailing_slash => {
            return Ok(Route::Redirect(format!("{raw}/")));
        }
        Ok(_) => {}
        Err(e) if e.kind() == ErrorKind::NotFound => {}
        Err(e) => return Err(e),
    }

    if trailing_slash {
        local.push(INDEX_NAME);
    }

    let route = match local.file_name().and_then(|n| n.to_str()) {
        Some(INDEX_NAME) => Route::Index,
        Some(RUNTIME_SCRIPT) => Route::RuntimeScript,
        Some(ARTIFACT_NAME) => Route::Artifact,
        _ => Route::Static(local),
    };
    Ok(route)
}
