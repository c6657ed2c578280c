//! Schema repository source handling
//!
//! Accepted formats:
//! - GitHub short-form: `owner/repo`, `github:owner/repo`
//! - Other hosts: `gitlab:owner/repo`, `bitbucket:owner/repo`
//! - With subfolder: `owner/repo/libraries/opp`
//! - With ref: `owner/repo#v1.0.0`, `owner/repo/sub#feature/branch`
//! - Git URLs: `https://host/owner/repo.git`, `git@host:owner/repo.git`, `file:///path/repo`
//! - Git URLs with ref and subfolder: `file:///path/repo#main:schemas`

pub mod repo_spec;

pub use repo_spec::RepoSpec;
