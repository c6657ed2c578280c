//! Error types and handling for protobuf-bundler
//!
//! Uses `thiserror` for error definitions and `miette` for pretty diagnostics.
//!
//! Variants are grouped by where the failure comes from:
//! - input: bad metadata, bad repository spec, no schemas found
//! - fetch: cloning and checking out the schema repository
//! - environment: missing plugin binary or compiler
//! - external tool: the schema compiler exiting non-zero
//! - assembly and file system errors
//!
//! Temporary directory cleanup failures have no variant: they are
//! logged as warnings and never change the outcome of a run.

use std::path::Path;

use miette::Diagnostic;
use thiserror::Error;


/// Main error type for protobuf-bundler operations
#[derive(Error, Diagnostic, Debug)]
pub enum BundlerError {
    // Input errors
    #[error("Invalid --package-data JSON: {reason}")]
    #[diagnostic(
        code(bundler::input::invalid_metadata),
        help("Pass a JSON object, e.g. --package-data '{{\"license\": \"MIT\"}}'")
    )]
    InvalidMetadata { reason: String },

    #[error("Invalid repository spec '{input}': {reason}")]
    #[diagnostic(
        code(bundler::input::invalid_repo_spec),
        help("Valid formats: owner/repo[/subfolder][#ref], github:owner/repo, https://host/owner/repo.git#ref:subfolder")
    )]
    InvalidRepoSpec { input: String, reason: String },

    #[error("No .proto files found after cloning {repo} into {dir}")]
    #[diagnostic(
        code(bundler::input::no_proto_files),
        help("Check the subfolder and ref in the repository spec")
    )]
    NoProtoFiles { repo: String, dir: String },

    #[error("Subfolder '{path}' not found in {repo}")]
    #[diagnostic(code(bundler::input::subfolder_not_found))]
    SubfolderNotFound { repo: String, path: String },

    // Fetch errors
    #[error("Failed to clone repository: {url}: {reason}")]
    #[diagnostic(
        code(bundler::git::clone_failed),
        help("Check that URL is correct and you have access to repository")
    )]
    GitCloneFailed { url: String, reason: String },

    #[error("Failed to resolve git ref '{git_ref}': {reason}")]
    #[diagnostic(code(bundler::git::ref_resolve_failed))]
    GitRefResolveFailed { git_ref: String, reason: String },

    #[error("Failed to checkout commit '{sha}': {reason}")]
    #[diagnostic(code(bundler::git::checkout_failed))]
    GitCheckoutFailed { sha: String, reason: String },

    // Environment errors
    #[error("Plugin binary \"{name}\" not found")]
    #[diagnostic(
        code(bundler::plugin::not_found),
        help("Install {package} or ensure {name} is on PATH")
    )]
    PluginNotFound { name: String, package: String },

    #[error("Failed to start {program}: {reason}")]
    #[diagnostic(
        code(bundler::protoc::spawn_failed),
        help("Install protoc or point --protoc (or PROTOC) at the compiler binary")
    )]
    CompilerSpawnFailed { program: String, reason: String },

    // External tool failures
    #[error("protoc failed (exit {code}): {stderr}")]
    #[diagnostic(code(bundler::protoc::failed))]
    CompilerFailed { code: String, stderr: String },

    // Assembly errors
    #[error("Failed to render template '{template}': {reason}")]
    #[diagnostic(code(bundler::package::template_failed))]
    TemplateFailed { template: String, reason: String },

    // File system errors
    #[error("Failed to create working directory: {reason}")]
    #[diagnostic(code(bundler::fs::work_dir_failed))]
    WorkDirFailed { reason: String },

    #[error("Failed to read file: {path}: {reason}")]
    #[diagnostic(code(bundler::fs::read_failed))]
    FileReadFailed { path: String, reason: String },

    #[error("Failed to write file: {path}: {reason}")]
    #[diagnostic(code(bundler::fs::write_failed))]
    FileWriteFailed { path: String, reason: String },

    #[error("IO error: {message}")]
    #[diagnostic(code(bundler::fs::io_error))]
    IoError { message: String },
}

impl BundlerError {
    /// Read failure for `path`
    pub fn read_failed(path: &Path, err: impl std::fmt::Display) -> Self {
        BundlerError::FileReadFailed {
            path: path.display().to_string(),
            reason: err.to_string(),
        }
    }

    /// Write failure for `path`
    pub fn write_failed(path: &Path, err: impl std::fmt::Display) -> Self {
        BundlerError::FileWriteFailed {
            path: path.display().to_string(),
            reason: err.to_string(),
        }
    }
}

impl From<std::io::Error> for BundlerError {
    fn from(err: std::io::Error) -> Self {
        BundlerError::IoError {
            message: err.to_string(),
        }
    }
}

impl From<serde_json::Error> for BundlerError {
    fn from(err: serde_json::Error) -> Self {
        BundlerError::InvalidMetadata {
            reason: err.to_string(),
        }
    }
}

impl From<walkdir::Error> for BundlerError {
    fn from(err: walkdir::Error) -> Self {
        match err.path() {
            Some(path) => BundlerError::read_failed(path, &err),
            None => BundlerError::IoError {
                message: err.to_string(),
            },
        }
    }
}

/// Result type alias using miette for error handling
pub type Result<T> = miette::Result<T, BundlerError>;
