//! Fetching schema files from a remote repository
//!
//! The [`Fetcher`] trait materializes a [`RepoSpec`] into a local directory,
//! degit style: only the requested subfolder's working tree is kept, without
//! any `.git` metadata. [`fetch_protos`] then discovers the schema files and
//! rejects trees that contain none.

use std::fs;
use std::path::{Path, PathBuf};

use crate::common::fs::{CopyOptions, copy_dir_recursive, walk_files};
use crate::error::{BundlerError, Result};
use crate::git;
use crate::source::RepoSpec;

/// Materializes a repository spec into a local directory
pub trait Fetcher {
    /// Fetch `spec` into `dest`. `scratch` is a not yet existing directory
    /// the fetcher may use for intermediate state.
    fn fetch(&self, spec: &RepoSpec, dest: &Path, scratch: &Path) -> Result<()>;
}

/// Fetcher backed by libgit2
///
/// Clones into the scratch directory, checks out the requested ref and
/// copies the subfolder into the destination. Without a ref the clone is
/// shallow. A ref may name an older commit or tag, so it gets the full
/// history.
#[derive(Debug, Default, Clone, Copy)]
pub struct GitFetcher;

impl Fetcher for GitFetcher {
    fn fetch(&self, spec: &RepoSpec, dest: &Path, scratch: &Path) -> Result<()> {
        tracing::debug!("Cloning {} into {}", spec.url, scratch.display());
        let repo = git::clone(&spec.url, scratch, spec.git_ref.is_none())?;

        let sha = git::resolve_ref(&repo, spec.git_ref.as_deref())?;
        git::checkout_commit(&repo, &sha)?;
        tracing::debug!(
            "Checked out {} at {sha}",
            spec.git_ref.as_deref().unwrap_or("HEAD")
        );

        let source = match &spec.subfolder {
            Some(sub) => scratch.join(sub),
            None => scratch.to_path_buf(),
        };
        if !source.is_dir() {
            return Err(BundlerError::SubfolderNotFound {
                repo: spec.to_string(),
                path: spec.subfolder.clone().unwrap_or_default(),
            });
        }

        copy_dir_recursive(&source, dest, &CopyOptions::exclude_git())
            .map_err(|e| BundlerError::write_failed(dest, e))?;

        drop(repo);
        if let Err(e) = fs::remove_dir_all(scratch) {
            tracing::warn!("Failed to remove clone {}: {e}", scratch.display());
        }
        Ok(())
    }
}

/// Every `.proto` file under `dir`, sorted by path
pub fn discover_proto_files(dir: &Path) -> Result<Vec<PathBuf>> {
    Ok(walk_files(dir)?
        .into_iter()
        .filter(|path| path.extension().is_some_and(|ext| ext == "proto"))
        .collect())
}

/// Fetch `spec` into `dest` and return the schema files found there.
///
/// Finding no schema files is an input error.
pub fn fetch_protos(
    fetcher: &dyn Fetcher,
    spec: &RepoSpec,
    dest: &Path,
    scratch: &Path,
) -> Result<Vec<PathBuf>> {
    tracing::info!("Fetching protos from {spec} -> {}", dest.display());
    fetcher.fetch(spec, dest, scratch)?;

    let protos = discover_proto_files(dest)?;
    if protos.is_empty() {
        return Err(BundlerError::NoProtoFiles {
            repo: spec.to_string(),
            dir: dest.display().to_string(),
        });
    }

    tracing::info!("Found {} .proto file(s)", protos.len());
    Ok(protos)
}
