//! Ref resolution and checkout
//!
//! A cloned schema repository is moved to a detached HEAD at the commit the
//! requested ref points to.

use git2::{Commit, Oid, Repository, build::CheckoutBuilder};

use crate::error::{BundlerError, Result};

/// Resolve a git ref (branch, tag, or SHA) to a full SHA
///
/// If no ref is provided, defaults to HEAD.
pub fn resolve_ref(repo: &Repository, git_ref: Option<&str>) -> Result<String> {
    let commit = match git_ref {
        Some(r) => resolve_reference(repo, r)?,
        None => repo
            .head()
            .and_then(|head| head.peel_to_commit())
            .map_err(|e| BundlerError::GitRefResolveFailed {
                git_ref: "HEAD".to_string(),
                reason: e.message().to_string(),
            })?,
    };

    Ok(commit.id().to_string())
}

/// Resolve a reference name to a commit
fn resolve_reference<'a>(repo: &'a Repository, refname: &str) -> Result<Commit<'a>> {
    let ref_candidates = [
        refname.to_string(),
        format!("refs/heads/{refname}"),
        format!("refs/tags/{refname}"),
        format!("refs/remotes/origin/{refname}"),
    ];

    let by_name = ref_candidates.iter().find_map(|candidate| {
        repo.find_reference(candidate)
            .and_then(|reference| reference.peel_to_commit())
            .ok()
    });
    if let Some(commit) = by_name {
        return Ok(commit);
    }

    let by_sha = Oid::from_str(refname)
        .and_then(|oid| repo.find_commit(oid))
        .or_else(|_| repo.revparse_single(refname).and_then(|obj| obj.peel_to_commit()));

    by_sha.map_err(|_| BundlerError::GitRefResolveFailed {
        git_ref: refname.to_string(),
        reason: "Could not resolve reference".to_string(),
    })
}

/// Checkout a specific commit in the repository
pub fn checkout_commit(repo: &Repository, sha: &str) -> Result<()> {
    let checkout_failed = |e: git2::Error| BundlerError::GitCheckoutFailed {
        sha: sha.to_string(),
        reason: e.message().to_string(),
    };

    let oid = Oid::from_str(sha).map_err(checkout_failed)?;
    let commit = repo.find_commit(oid).map_err(checkout_failed)?;
    repo.set_head_detached(commit.id()).map_err(checkout_failed)?;

    let mut checkout_builder = CheckoutBuilder::new();
    checkout_builder.force();
    repo.checkout_head(Some(&mut checkout_builder))
        .map_err(checkout_failed)?;

    Ok(())
}
