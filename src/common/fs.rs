//! Common file system operations with unified error handling

use std::fs;
use std::path::{Path, PathBuf};

use walkdir::WalkDir;

use crate::error::{BundlerError, Result};

#[derive(Default, Clone)]
pub struct CopyOptions {
    pub exclude: Vec<String>,
}

impl CopyOptions {
    pub fn exclude_git() -> Self {
        Self {
            exclude: vec![".git".to_string()],
        }
    }
}

/// Copy a directory recursively with options.
///
/// Symlinks are followed when they resolve inside `src`, so the copy holds
/// plain files and directories. Dangling links, links leaving `src` and
/// links that would loop back into a directory being copied are skipped.
pub fn copy_dir_recursive<P1, P2>(src: P1, dst: P2, options: &CopyOptions) -> std::io::Result<()>
where
    P1: AsRef<Path>,
    P2: AsRef<Path>,
{
    let root = dunce::canonicalize(src.as_ref())?;
    let mut visiting = vec![root.clone()];
    copy_tree(&root, dst.as_ref(), options, &mut visiting)
}

/// `visiting` holds the canonical directories on the current descent path,
/// `src` last.
fn copy_tree(
    src: &Path,
    dst: &Path,
    options: &CopyOptions,
    visiting: &mut Vec<PathBuf>,
) -> std::io::Result<()> {
    fs::create_dir_all(dst)?;

    for entry in fs::read_dir(src)? {
        let entry = entry?;
        let entry_path = entry.path();
        let file_name = entry.file_name();

        if options
            .exclude
            .iter()
            .any(|excluded| file_name.to_str() == Some(excluded.as_str()))
        {
            continue;
        }

        let dst_path = dst.join(&file_name);
        let file_type = entry.file_type()?;

        if file_type.is_symlink() {
            let Some(target) = link_target(visiting, &entry_path) else {
                continue;
            };
            if target.is_dir() {
                visiting.push(target.clone());
                let copied = copy_tree(&target, &dst_path, options, visiting);
                visiting.pop();
                copied?;
            } else {
                fs::copy(&target, &dst_path)?;
            }
        } else if file_type.is_dir() {
            visiting.push(entry_path.clone());
            let copied = copy_tree(&entry_path, &dst_path, options, visiting);
            visiting.pop();
            copied?;
        } else {
            fs::copy(&entry_path, &dst_path)?;
        }
    }

    Ok(())
}

/// Where `link` leads, if it stays inside the copied tree and does not
/// re-enter a directory being copied
fn link_target(visiting: &[PathBuf], link: &Path) -> Option<PathBuf> {
    let root = visiting.first()?;
    let target = match dunce::canonicalize(link) {
        Ok(target) => target,
        Err(e) => {
            tracing::warn!("Skipping dangling link {}: {e}", link.display());
            return None;
        }
    };
    if !target.starts_with(root) {
        tracing::warn!(
            "Skipping link {} pointing outside {}",
            link.display(),
            root.display()
        );
        return None;
    }
    if target.is_dir() && visiting.iter().any(|dir| dir.starts_with(&target)) {
        tracing::warn!("Skipping link {} to a directory being copied", link.display());
        return None;
    }
    Some(target)
}

/// Copy a single file, creating the destination's parent directories
pub fn copy_file_with_parents(src: &Path, dst: &Path) -> Result<()> {
    if let Some(parent) = dst.parent() {
        fs::create_dir_all(parent).map_err(|e| BundlerError::write_failed(parent, e))?;
    }
    fs::copy(src, dst).map_err(|e| BundlerError::write_failed(dst, e))?;
    Ok(())
}

/// Every regular file under `dir`, sorted by path.
///
/// A missing directory yields an empty list.
pub fn walk_files(dir: &Path) -> Result<Vec<PathBuf>> {
    if !dir.exists() {
        return Ok(Vec::new());
    }

    let mut files = Vec::new();
    for entry in WalkDir::new(dir).sort_by_file_name() {
        let entry = entry?;
        if entry.file_type().is_file() {
            files.push(entry.into_path());
        }
    }
    Ok(files)
}
