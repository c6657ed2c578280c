//! Repository spec parsing
//!
//! Turns the `--repo` string into a clone URL, an optional ref and an
//! optional subfolder.

use std::fmt;
use std::path::{Component, Path};

use crate::error::{BundlerError, Result};

/// Hosts accepted as shorthand prefixes, `github` being the default
const HOSTS: &[(&str, &str)] = &[
    ("github:", "github.com"),
    ("gitlab:", "gitlab.com"),
    ("bitbucket:", "bitbucket.org"),
];

/// Remote repository location of the schema files
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RepoSpec {
    /// The spec as given on the command line
    pub input: String,

    /// Clone URL (HTTPS, SSH or file)
    pub url: String,

    /// Path within repository to extract
    pub subfolder: Option<String>,

    /// Git ref (branch, tag, or SHA); HEAD when absent
    pub git_ref: Option<String>,
}

impl RepoSpec {
    /// Parse a repo spec from a string
    pub fn parse(input: &str) -> Result<Self> {
        let input = input.trim();
        if input.is_empty() {
            return Err(invalid(input, "repository spec is empty"));
        }

        let (main_part, fragment) = split_fragment(input);
        let (git_ref, fragment_path) = match fragment {
            Some(frag) => parse_fragment(frag),
            None => (None, None),
        };

        let (url, main_path) = if is_full_url(main_part) {
            (main_part.to_string(), None)
        } else {
            parse_shorthand(input, main_part)?
        };

        let subfolder = match (main_path, fragment_path) {
            (Some(_), Some(_)) => {
                return Err(invalid(input, "subfolder given both in path and fragment"));
            }
            (Some(p), None) | (None, Some(p)) => normalize_subfolder(input, &p)?,
            (None, None) => None,
        };

        Ok(Self {
            input: input.to_string(),
            url,
            subfolder,
            git_ref,
        })
    }
}

impl fmt::Display for RepoSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.input)
    }
}

fn invalid(input: &str, reason: &str) -> BundlerError {
    BundlerError::InvalidRepoSpec {
        input: input.to_string(),
        reason: reason.to_string(),
    }
}

/// Split `main#fragment` at the first `#`
fn split_fragment(input: &str) -> (&str, Option<&str>) {
    match input.find('#') {
        Some(pos) => (&input[..pos], Some(&input[pos + 1..])),
        None => (input, None),
    }
}

/// Parse `ref[:path]` from a fragment; empty parts become `None`
fn parse_fragment(frag: &str) -> (Option<String>, Option<String>) {
    let (git_ref, path) = match frag.find(':') {
        Some(pos) => (&frag[..pos], Some(&frag[pos + 1..])),
        None => (frag, None),
    };
    let git_ref = (!git_ref.is_empty()).then(|| git_ref.to_string());
    let path = path.filter(|p| !p.is_empty()).map(str::to_string);
    (git_ref, path)
}

fn is_full_url(input: &str) -> bool {
    input.starts_with("https://")
        || input.starts_with("http://")
        || input.starts_with("ssh://")
        || input.starts_with("git@")
        || input.starts_with("file://")
}

/// Parse `[host:]owner/repo[/subfolder...]` into a clone URL and subfolder
fn parse_shorthand(input: &str, main_part: &str) -> Result<(String, Option<String>)> {
    let (host, rest) = HOSTS
        .iter()
        .find_map(|(prefix, host)| main_part.strip_prefix(prefix).map(|rest| (*host, rest)))
        .unwrap_or(("github.com", main_part));

    if rest.contains("://") || rest.contains(':') {
        return Err(invalid(input, "unknown source format"));
    }

    let mut segments = rest.split('/');
    let owner = segments.next().unwrap_or_default();
    let repo = segments.next().unwrap_or_default();
    let repo = repo.strip_suffix(".git").unwrap_or(repo);
    if owner.is_empty() || repo.is_empty() {
        return Err(invalid(input, "expected owner/repo"));
    }

    let subfolder: Vec<&str> = segments.filter(|s| !s.is_empty()).collect();
    let subfolder = (!subfolder.is_empty()).then(|| subfolder.join("/"));

    Ok((format!("https://{host}/{owner}/{repo}.git"), subfolder))
}

/// Strip surrounding slashes and reject paths escaping the repository
fn normalize_subfolder(input: &str, path: &str) -> Result<Option<String>> {
    let trimmed = path.trim_matches('/');
    if trimmed.is_empty() {
        return Ok(None);
    }
    let escapes = Path::new(trimmed)
        .components()
        .any(|c| !matches!(c, Component::Normal(_) | Component::CurDir));
    if escapes {
        return Err(invalid(input, "subfolder must stay inside the repository"));
    }
    Ok(Some(trimmed.to_string()))
}
