//! Embedded mustache templates for package manifests

use serde::Serialize;

use crate::error::{BundlerError, Result};
use crate::target::Target;

/// A template file and where its rendering lands in the package
pub struct PackageTemplate {
    /// Path of the rendered file, relative to the package root
    pub output: &'static str,
    pub source: &'static str,
}

const SOLANA: &[PackageTemplate] = &[
    PackageTemplate {
        output: "Cargo.toml",
        source: include_str!("../../templates/solana/Cargo.toml.mustache"),
    },
    PackageTemplate {
        output: "src/lib.rs",
        source: include_str!("../../templates/solana/lib.rs.mustache"),
    },
    PackageTemplate {
        output: "README.md",
        source: include_str!("../../templates/solana/README.md.mustache"),
    },
];

const SOLIDITY: &[PackageTemplate] = &[
    PackageTemplate {
        output: "package.json",
        source: include_str!("../../templates/solidity/package.json.mustache"),
    },
    PackageTemplate {
        output: "README.md",
        source: include_str!("../../templates/solidity/README.md.mustache"),
    },
];

/// Templates rendered for `target`
pub fn templates_for(target: Target) -> &'static [PackageTemplate] {
    match target {
        Target::Solana => SOLANA,
        Target::Solidity => SOLIDITY,
    }
}

/// Render `template` with `context`
pub fn render<T: Serialize>(template: &PackageTemplate, context: &T) -> Result<String> {
    let failed = |e: mustache::Error| BundlerError::TemplateFailed {
        template: template.output.to_string(),
        reason: e.to_string(),
    };
    mustache::compile_str(template.source)
        .map_err(failed)?
        .render_to_string(context)
        .map_err(failed)
}

/// Quote `value` as a string literal valid in both JSON and TOML.
///
/// JSON leaves DEL unescaped, TOML basic strings reject it.
pub fn quote(value: &str) -> String {
    serde_json::Value::String(value.to_string())
        .to_string()
        .replace('\u{7f}', "\\u007F")
}
