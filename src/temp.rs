//! Scoped working directory for a single bundling run.
//!
//! The directory is created under an absolute temp base (never under the
//! current working directory, e.g. when TMPDIR=tmp) and removed when the
//! [`WorkDir`] is dropped, on success, on error and on unwinding panics.
//! Removal is best effort: a failure is logged as a warning and never
//! replaces the result of the run.

use std::env;
use std::path::{Path, PathBuf};

use tempfile::TempDir;

use crate::error::{BundlerError, Result};

const WORK_DIR_PREFIX: &str = "protobuf-bundler-";

/// Returns a directory path suitable for creating temporary directories.
/// Never returns a relative path.
pub fn temp_dir_base() -> PathBuf {
    let t = env::temp_dir();
    if t.is_absolute() {
        t
    } else {
        #[cfg(windows)]
        {
            env::var("TEMP")
                .or_else(|_| env::var("TMP"))
                .map(PathBuf::from)
                .unwrap_or_else(|_| PathBuf::from("C:\\Windows\\Temp"))
        }
        #[cfg(not(windows))]
        {
            PathBuf::from("/tmp")
        }
    }
}

/// Uniquely named, process-exclusive temporary directory
pub struct WorkDir {
    dir: Option<TempDir>,
    path: PathBuf,
}

impl WorkDir {
    /// Create a fresh working directory under `base`
    pub fn create_in(base: &Path) -> Result<Self> {
        let dir = tempfile::Builder::new()
            .prefix(WORK_DIR_PREFIX)
            .tempdir_in(base)
            .map_err(|e| BundlerError::WorkDirFailed {
                reason: format!("{}: {e}", base.display()),
            })?;
        let path = dir.path().to_path_buf();
        tracing::debug!("Using temp dir: {}", path.display());
        Ok(Self {
            dir: Some(dir),
            path,
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Where the fetched schema tree is materialized
    pub fn schema_dir(&self) -> PathBuf {
        self.path.join("proto")
    }

    /// Scratch area for the fetch step (git checkout before subfolder copy)
    pub fn scratch_dir(&self) -> PathBuf {
        self.path.join("clone")
    }

    /// Remove the directory now. Errors are logged, not returned.
    pub fn cleanup(mut self) {
        self.remove();
    }

    fn remove(&mut self) {
        let Some(dir) = self.dir.take() else {
            return;
        };
        match dir.close() {
            Ok(()) => tracing::debug!("Cleaned up temp dir: {}", self.path.display()),
            Err(e) => tracing::warn!("Failed to clean temp dir {}: {e}", self.path.display()),
        }
    }
}

impl Drop for WorkDir {
    fn drop(&mut self) {
        self.remove();
    }
}
