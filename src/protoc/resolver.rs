//! Plugin binary resolution
//!
//! A plugin may be installed as a direct npm dependency, as a transitive one
//! under pnpm's isolated layout, or globally. Candidates are tried in a fixed
//! order and the first existing file wins, so a per-project pinned plugin is
//! preferred over a stray global install:
//!
//! 1. `node_modules/.bin/<bin>`
//! 2. `node_modules/<package>/dist/bin/<bin>`
//! 3. `node_modules/.pnpm/node_modules/<package>/dist/bin/<bin>`
//! 4. the host search path
//! 5. `node_modules/.bin/<bin>` again, in case it appeared meanwhile

use std::ffi::OsString;
use std::path::{Path, PathBuf};

use crate::error::{BundlerError, Result};

/// Locates plugin executables relative to a project root
#[derive(Debug, Clone)]
pub struct BinaryResolver {
    project_root: PathBuf,
    search_path: Option<OsString>,
}

impl BinaryResolver {
    pub fn new(project_root: impl Into<PathBuf>) -> Self {
        Self {
            project_root: project_root.into(),
            search_path: None,
        }
    }

    /// Search these directories instead of the process `PATH`
    pub fn with_search_path(mut self, search_path: impl Into<OsString>) -> Self {
        self.search_path = Some(search_path.into());
        self
    }

    /// Resolve `bin` shipped by npm package `package` to an absolute path
    pub fn resolve(&self, bin: &str, package: &str) -> Result<PathBuf> {
        let node_modules = self.project_root.join("node_modules");
        let local_shim = || existing(node_modules.join(".bin").join(bin));
        let package_bin = || existing(package_bin_path(&node_modules, package, bin));
        let nested_package_bin = || {
            existing(package_bin_path(
                &node_modules.join(".pnpm").join("node_modules"),
                package,
                bin,
            ))
        };
        let on_search_path = || self.which(bin);

        let candidates: [&dyn Fn() -> Option<PathBuf>; 5] = [
            &local_shim,
            &package_bin,
            &nested_package_bin,
            &on_search_path,
            &local_shim,
        ];

        match candidates.iter().find_map(|candidate| candidate()) {
            Some(path) => {
                tracing::debug!("Resolved plugin binary: {bin} -> {}", path.display());
                Ok(path)
            }
            None => Err(BundlerError::PluginNotFound {
                name: bin.to_string(),
                package: package.to_string(),
            }),
        }
    }

    fn which(&self, bin: &str) -> Option<PathBuf> {
        let found = match &self.search_path {
            Some(paths) => which::which_in(bin, Some(paths), &self.project_root),
            None => which::which(bin),
        };
        found.ok().map(absolute)
    }
}

/// Where a package's own installer places its compiled binary
fn package_bin_path(node_modules: &Path, package: &str, bin: &str) -> PathBuf {
    node_modules.join(package).join("dist").join("bin").join(bin)
}

fn existing(path: PathBuf) -> Option<PathBuf> {
    path.is_file().then(|| absolute(path))
}

fn absolute(path: PathBuf) -> PathBuf {
    dunce::canonicalize(&path).unwrap_or(path)
}
