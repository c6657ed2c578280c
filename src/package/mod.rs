//! Package assembly
//!
//! Turns the files a compiler run produced into a publishable package for
//! the target ecosystem:
//!
//! - `solana`: a Rust crate with the generated sources under `src/`
//! - `solidity`: an npm package with the generated contracts under `contracts/`
//!
//! Manifests are rendered from the embedded templates in [`templates`].

pub mod merge;
pub mod templates;

use std::collections::HashSet;
use std::fs;
use std::path::{Component, Path};

use serde::Serialize;
use serde_json::{Map, Value};

use crate::common::fs::copy_file_with_parents;
use crate::error::{BundlerError, Result};
use crate::protoc::GeneratedFiles;
use crate::target::Target;

use self::merge::deep_merge;
use self::templates::{quote, render, templates_for};

/// Identity and provenance of the package being assembled
#[derive(Debug, Clone, Copy)]
pub struct PackageContext<'a> {
    pub name: &'a str,
    pub version: &'a str,
    /// Repository the schemas came from, as given on the command line
    pub repo: &'a str,
    pub schema_digest: &'a str,
    /// Caller supplied package data
    pub metadata: &'a Map<String, Value>,
}

/// Writes a package for `target` into `dest`
pub trait Assembler {
    fn assemble(
        &self,
        target: Target,
        generated: &GeneratedFiles,
        ctx: &PackageContext<'_>,
        dest: &Path,
    ) -> Result<()>;
}

/// Renders the embedded manifest templates
#[derive(Debug, Default, Clone, Copy)]
pub struct TemplateAssembler;

/// Package data keys rendered as plain strings into a crate's `[package]`
const SOLANA_STRING_FIELDS: &[&str] = &[
    "edition",
    "description",
    "license",
    "repository",
    "homepage",
];

const DEFAULT_EDITION: &str = "2021";

const RESERVED_MODULE_NAMES: &[&str] = &["crate", "self", "Self", "super"];

const RUST_KEYWORDS: &[&str] = &[
    "abstract", "as", "async", "await", "become", "box", "break", "const", "continue", "do",
    "dyn", "else", "enum", "extern", "false", "final", "fn", "for", "gen", "if", "impl", "in",
    "let", "loop", "macro", "match", "mod", "move", "mut", "override", "priv", "pub", "ref",
    "return", "static", "struct", "trait", "true", "try", "type", "typeof", "unsafe", "unsized",
    "use", "virtual", "where", "while", "yield",
];

#[derive(Serialize)]
struct RenderContext<'a> {
    name: &'a str,
    version: &'a str,
    repo: &'a str,
    schema_digest: &'a str,
    generator: String,
    name_quoted: String,
    version_quoted: String,
    repo_quoted: String,
    digest_quoted: String,
    description_quoted: String,
    package_fields: Vec<Field>,
    dependencies: Vec<Field>,
    modules: Vec<Module>,
    files: Vec<FileEntry>,
}

/// A rendered `key = value` manifest line
#[derive(Debug, PartialEq, Eq, Serialize)]
struct Field {
    key: String,
    value: String,
}

#[derive(Debug, PartialEq, Eq, Serialize)]
struct Module {
    name: String,
    path: String,
    nested: bool,
}

#[derive(Serialize)]
struct FileEntry {
    path: String,
}

impl Assembler for TemplateAssembler {
    fn assemble(
        &self,
        target: Target,
        generated: &GeneratedFiles,
        ctx: &PackageContext<'_>,
        dest: &Path,
    ) -> Result<()> {
        let code_dir = dest.join(code_dir_name(target));
        for (absolute, relative) in generated.relative() {
            copy_file_with_parents(absolute, &code_dir.join(relative))?;
        }
        tracing::debug!(
            "Copied {} generated file(s) to {}",
            generated.files.len(),
            code_dir.display()
        );

        let render_ctx = render_context(target, generated, ctx)?;
        let provides_lib = generated.files.contains(&generated.dir.join("lib.rs"));

        for template in templates_for(target) {
            if target == Target::Solana && template.output == "src/lib.rs" && provides_lib {
                tracing::debug!("Generator wrote its own lib.rs; not rendering one");
                continue;
            }

            let mut contents = render(template, &render_ctx)?;
            if template.output == "package.json" {
                contents = merge_package_json(template.output, &contents, ctx.metadata)?;
            }
            write_file(&dest.join(template.output), &contents)?;
        }

        tracing::info!("Assembled {} package in {}", target, dest.display());
        Ok(())
    }
}

fn code_dir_name(target: Target) -> &'static str {
    match target {
        Target::Solana => "src",
        Target::Solidity => "contracts",
    }
}

fn render_context<'a>(
    target: Target,
    generated: &GeneratedFiles,
    ctx: &PackageContext<'a>,
) -> Result<RenderContext<'a>> {
    let description = match ctx.metadata.get("description").and_then(Value::as_str) {
        Some(description) => description.to_string(),
        None => format!("{} bindings generated from {}", target_title(target), ctx.repo),
    };

    let (package_fields, dependencies) = match target {
        Target::Solana => solana_fields(ctx.metadata, &description)?,
        Target::Solidity => (Vec::new(), Vec::new()),
    };
    let modules = match target {
        Target::Solana => rust_modules(generated),
        Target::Solidity => Vec::new(),
    };
    let files = generated
        .relative()
        .map(|(_, relative)| FileEntry {
            path: slash_path(relative),
        })
        .collect();

    Ok(RenderContext {
        name: ctx.name,
        version: ctx.version,
        repo: ctx.repo,
        schema_digest: ctx.schema_digest,
        generator: format!("{} {}", env!("CARGO_PKG_NAME"), env!("CARGO_PKG_VERSION")),
        name_quoted: quote(ctx.name),
        version_quoted: quote(ctx.version),
        repo_quoted: quote(ctx.repo),
        digest_quoted: quote(ctx.schema_digest),
        description_quoted: quote(&description),
        package_fields,
        dependencies,
        modules,
        files,
    })
}

fn target_title(target: Target) -> &'static str {
    match target {
        Target::Solana => "Solana",
        Target::Solidity => "Solidity",
    }
}

/// `[package]` lines and `[dependencies]` entries for a crate manifest
fn solana_fields(
    metadata: &Map<String, Value>,
    description: &str,
) -> Result<(Vec<Field>, Vec<Field>)> {
    let mut fields = Vec::new();
    for key in SOLANA_STRING_FIELDS {
        let value = match (metadata.get(*key), *key) {
            (Some(Value::String(s)), _) => s.as_str(),
            (Some(other), _) => {
                return Err(invalid_field(key, "a string", other));
            }
            (None, "edition") => DEFAULT_EDITION,
            (None, "description") => description,
            (None, _) => continue,
        };
        fields.push(Field {
            key: (*key).to_string(),
            value: quote(value),
        });
    }

    if let Some(authors) = metadata.get("authors") {
        let valid = authors
            .as_array()
            .is_some_and(|list| list.iter().all(Value::is_string));
        if !valid {
            return Err(invalid_field("authors", "an array of strings", authors));
        }
        fields.push(Field {
            key: "authors".to_string(),
            value: authors.to_string(),
        });
    }

    let mut dependencies = Vec::new();
    if let Some(deps) = metadata.get("dependencies") {
        let Some(deps) = deps.as_object() else {
            return Err(invalid_field("dependencies", "an object", deps));
        };
        for (name, spec) in deps {
            let value = toml_value(spec).ok_or_else(|| BundlerError::InvalidMetadata {
                reason: format!("dependency '{name}' cannot be written to Cargo.toml"),
            })?;
            dependencies.push(Field {
                key: toml_key(name),
                value,
            });
        }
    }

    for key in metadata.keys() {
        let known = SOLANA_STRING_FIELDS.contains(&key.as_str())
            || key == "authors"
            || key == "dependencies";
        if !known {
            tracing::debug!("Ignoring package data key for solana: {key}");
        }
    }

    Ok((fields, dependencies))
}

fn invalid_field(key: &str, expected: &str, found: &Value) -> BundlerError {
    BundlerError::InvalidMetadata {
        reason: format!("'{key}' must be {expected}, found {found}"),
    }
}

/// TOML rendering of a JSON value; `None` for `null`
fn toml_value(value: &Value) -> Option<String> {
    match value {
        Value::Null => None,
        Value::Bool(b) => Some(b.to_string()),
        Value::Number(n) => Some(n.to_string()),
        Value::String(s) => Some(quote(s)),
        Value::Array(items) => {
            let items = items.iter().map(toml_value).collect::<Option<Vec<_>>>()?;
            Some(format!("[{}]", items.join(", ")))
        }
        Value::Object(map) => {
            let entries = map
                .iter()
                .map(|(k, v)| toml_value(v).map(|v| format!("{} = {v}", toml_key(k))))
                .collect::<Option<Vec<_>>>()?;
            if entries.is_empty() {
                Some("{}".to_string())
            } else {
                Some(format!("{{ {} }}", entries.join(", ")))
            }
        }
    }
}

fn toml_key(key: &str) -> String {
    let bare = !key.is_empty()
        && key
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_');
    if bare { key.to_string() } else { quote(key) }
}

/// One `pub mod` per generated Rust file, sorted by module name.
///
/// A stem already taken by another file falls back to a name built from the
/// whole relative path, then to that name with a numeric suffix.
fn rust_modules(generated: &GeneratedFiles) -> Vec<Module> {
    let mut taken = HashSet::new();
    let mut modules = Vec::new();

    for (_, relative) in generated.relative() {
        if relative.extension().and_then(|e| e.to_str()) != Some("rs") {
            continue;
        }
        let nested = relative.components().count() > 1;
        let Some(stem) = relative.file_stem().and_then(|s| s.to_str()) else {
            continue;
        };
        if !nested && (stem == "lib" || stem == "mod") {
            continue;
        }

        let mut name = module_name(stem);
        if !taken.insert(name.clone()) {
            let joined = relative
                .with_extension("")
                .components()
                .filter_map(|c| match c {
                    Component::Normal(part) => part.to_str(),
                    _ => None,
                })
                .collect::<Vec<_>>()
                .join("_");
            name = module_name(&joined);
            let mut suffix = 2;
            while !taken.insert(name.clone()) {
                name = module_name(&format!("{joined}_{suffix}"));
                suffix += 1;
            }
        }

        modules.push(Module {
            name,
            path: slash_path(relative),
            nested,
        });
    }

    modules.sort_by(|a, b| a.name.cmp(&b.name));
    modules
}

/// A valid Rust module identifier for a file stem
fn module_name(stem: &str) -> String {
    let mut name: String = stem
        .chars()
        .map(|c| if c.is_ascii_alphanumeric() || c == '_' { c } else { '_' })
        .collect();
    if name.is_empty() || name.starts_with(|c: char| c.is_ascii_digit()) {
        name.insert(0, '_');
    }

    if RESERVED_MODULE_NAMES.contains(&name.as_str()) {
        name.push('_');
    } else if RUST_KEYWORDS.contains(&name.as_str()) {
        name.insert_str(0, "r#");
    }
    name
}

fn slash_path(path: &Path) -> String {
    path.to_string_lossy().replace('\\', "/")
}

/// Deep merge caller package data over a rendered `package.json`
fn merge_package_json(
    template: &str,
    rendered: &str,
    metadata: &Map<String, Value>,
) -> Result<String> {
    let mut manifest: Value =
        serde_json::from_str(rendered).map_err(|e| BundlerError::TemplateFailed {
            template: template.to_string(),
            reason: e.to_string(),
        })?;
    deep_merge(&mut manifest, &Value::Object(metadata.clone()));

    let mut out = serde_json::to_string_pretty(&manifest).map_err(|e| {
        BundlerError::TemplateFailed {
            template: template.to_string(),
            reason: e.to_string(),
        }
    })?;
    out.push('\n');
    Ok(out)
}

fn write_file(path: &Path, contents: &str) -> Result<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).map_err(|e| BundlerError::write_failed(parent, e))?;
    }
    fs::write(path, contents).map_err(|e| BundlerError::write_failed(path, e))
}
