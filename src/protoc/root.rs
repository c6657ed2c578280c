//! Import root inference
//!
//! Imports inside `.proto` files are relative to a project-specific root,
//! commonly a `proto/` or `protos/` directory rather than the clone root.

use std::path::{Path, PathBuf};

/// Conventional import root directory names, in priority order
pub const PROTO_ROOT_CANDIDATES: &[&str] = &["proto", "protos"];

/// Determine the best `--proto_path` root for a fetched schema tree.
///
/// Returns the first conventional subdirectory that exists directly under
/// `base`, or `base` itself.
pub fn infer_proto_root(base: &Path) -> PathBuf {
    for candidate in PROTO_ROOT_CANDIDATES {
        let dir = base.join(candidate);
        if dir.is_dir() {
            tracing::debug!("Found proto root subdirectory: {}", dir.display());
            return dir;
        }
    }
    base.to_path_buf()
}

/// Path of `file` relative to the import root.
///
/// Files outside `root` but inside `tree_root` are expressed relative to
/// `tree_root`; the flag tells the caller that happened. `None` when the
/// file lies outside both.
pub fn import_relative<'a>(
    file: &'a Path,
    root: &Path,
    tree_root: &Path,
) -> Option<(&'a Path, bool)> {
    file.strip_prefix(root)
        .map(|rel| (rel, false))
        .or_else(|_| file.strip_prefix(tree_root).map(|rel| (rel, true)))
        .ok()
}
