//! Git operations for fetching schema repositories
//!
//! This module handles:
//! - Cloning repositories (HTTPS, SSH and file:// URLs)
//! - Resolving refs (branches, tags, SHAs) and checking them out
//!
//! Authentication is delegated entirely to git's native system:
//! - SSH keys from ~/.ssh/
//! - Git credential helpers
//! - Environment variables (`GIT_SSH_COMMAND`, etc.)

use std::borrow::Cow;
use std::path::Path;

use git2::{FetchOptions, RemoteCallbacks, Repository, build::RepoBuilder};

use crate::error::{BundlerError, Result};

mod auth;
mod error;
mod refs;

pub use refs::{checkout_commit, resolve_ref};

/// Normalize SSH URLs from SCP-style (git@host:path) to ssh:// format for libgit2.
fn normalize_ssh_url(url: &str) -> Cow<'_, str> {
    let Some(rest) = url.strip_prefix("git@") else {
        return Cow::Borrowed(url);
    };
    match rest.split_once(':') {
        Some((host, path)) => {
            let path = path.strip_prefix('/').unwrap_or(path);
            Cow::Owned(format!("ssh://git@{host}/{path}"))
        }
        None => Cow::Borrowed(url),
    }
}

/// Normalize file:// URLs so libgit2 can resolve them on Unix.
fn normalize_file_url(url: &str) -> Cow<'_, str> {
    let Some(after) = url.strip_prefix("file://") else {
        return Cow::Borrowed(url);
    };
    if after.contains('\\') {
        return Cow::Owned(format!("file:///{}", after.replace('\\', "/").trim_start_matches('/')));
    }
    if !after.is_empty() && !after.starts_with('/') {
        return Cow::Owned(format!("file:///{after}"));
    }
    Cow::Borrowed(url)
}

fn is_local_url(url: &str) -> bool {
    url.starts_with("file://") || Path::new(url).is_absolute()
}

/// History depth for a clone of `url`, `None` meaning full history.
///
/// A shallow clone only holds branch tips and the tags pointing at them, so
/// older commits and tags need the full history. Local repositories do not
/// support shallow fetches.
fn clone_depth(url: &str, shallow: bool) -> Option<i32> {
    (shallow && !is_local_url(url)).then_some(1)
}

/// Clone a git repository to a target directory
///
/// With `shallow` set, remote URLs are cloned at depth 1.
pub fn clone(url: &str, target: &Path, shallow: bool) -> Result<Repository> {
    let mut callbacks = RemoteCallbacks::new();
    auth::setup_auth_callbacks(&mut callbacks);
    callbacks.sideband_progress(|data| {
        tracing::debug!("remote: {}", String::from_utf8_lossy(data).trim_end());
        true
    });

    let mut fetch_options = FetchOptions::new();
    fetch_options.remote_callbacks(callbacks);
    if let Some(depth) = clone_depth(url, shallow) {
        fetch_options.depth(depth);
    }

    let mut builder = RepoBuilder::new();
    builder.fetch_options(fetch_options);

    let url_to_clone = normalize_ssh_url(url);
    let url_to_clone = normalize_file_url(&url_to_clone);
    builder
        .clone(url_to_clone.as_ref(), target)
        .map_err(|e| BundlerError::GitCloneFailed {
            url: url.to_string(),
            reason: error::interpret_git_error(&e),
        })
}
