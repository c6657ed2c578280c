//! A single bundling request

use std::path::PathBuf;

use serde_json::{Map, Value};

use crate::error::{BundlerError, Result};
use crate::source::RepoSpec;
use crate::target::Target;

/// Everything one pipeline run needs from the caller
#[derive(Debug, Clone)]
pub struct BundleRequest {
    pub repo: RepoSpec,
    pub target: Target,
    /// Package destination, created if missing
    pub output: PathBuf,
    pub package_name: String,
    pub package_version: String,
    /// Extra manifest data, merged into the package manifest
    pub package_data: Map<String, Value>,
}

/// Parse `--package-data`, which must be a JSON object
pub fn parse_package_data(raw: &str) -> Result<Map<String, Value>> {
    match serde_json::from_str::<Value>(raw)? {
        Value::Object(map) => Ok(map),
        other => Err(BundlerError::InvalidMetadata {
            reason: format!("expected a JSON object, found {}", kind(&other)),
        }),
    }
}

fn kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}
