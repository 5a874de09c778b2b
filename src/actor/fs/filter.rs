use std::path::{Path, PathBuf};

use notify::EventKind;
use notify::event::{MetadataKind, ModifyKind};

/// Whether `kind` is a write to file content.
///
/// Creation, removal and renames do not count; neither does access or a
/// permission change. Backends that cannot tell what changed report
/// `Modify(Any)`, and polling backends may only see the mtime move.
pub(super) fn is_write(kind: &EventKind) -> bool {
    matches!(
        kind,
        EventKind::Modify(
            ModifyKind::Data(_) | ModifyKind::Any | ModifyKind::Metadata(MetadataKind::WriteTime)
        )
    )
}

/// Drops editor noise and ignored directories.
///
/// Ignore names match whole path components below the watch root.
#[derive(Debug, Clone)]
pub(super) struct PathFilter {
    /// The root as configured and canonicalized; backends report either.
    roots: Vec<PathBuf>,
    ignore: Vec<String>,
}

impl PathFilter {
    pub(super) fn new(root: &Path, ignore: Vec<String>) -> Self {
        let mut roots = vec![root.to_path_buf()];
        if let Ok(canonical) = root.canonicalize()
            && canonical != root
        {
            roots.push(canonical);
        }
        Self { roots, ignore }
    }

    pub(super) fn accepts(&self, path: &Path) -> bool {
        if is_temp_file(path) {
            return false;
        }
        let relative = self
            .roots
            .iter()
            .find_map(|root| path.strip_prefix(root).ok())
            .unwrap_or(path);
        !relative.components().any(|c| {
            let c = c.as_os_str();
            self.ignore.iter().any(|name| c == name.as_str())
        })
    }
}

/// Check if path is a temp/backup file (editor artifacts).
fn is_temp_file(path: &Path) -> bool {
    let name = path.file_name().and_then(|n| n.to_str()).unwrap_or("");
    let ext = path.extension().and_then(|e| e.to_str()).unwrap_or("");

    matches!(ext, "bak" | "backup" | "swp" | "swo" | "swx" | "tmp")
        || name.ends_with('~')
        || name.starts_with('.')
        || name.starts_with('#')
}
