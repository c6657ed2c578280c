//! Bundling pipeline
//!
//! One run owns one [`WorkDir`] and goes through four steps:
//!
//! 1. Fetch: materialize the repository and discover its `.proto` files
//! 2. Compile: run protoc with the target's plugin
//! 3. Assemble: write the package into the output directory
//! 4. Provenance: copy the schemas into `<output>/proto/`
//!
//! The working directory is removed whatever the outcome. The output
//! directory is only created once compilation has succeeded and is never
//! cleared, so files from earlier runs that are not regenerated remain.

use std::fs;
use std::path::{Path, PathBuf};

use crate::common::fs::copy_file_with_parents;
use crate::error::{BundlerError, Result};
use crate::fetch::{Fetcher, GitFetcher, fetch_protos};
use crate::hash::hash_files;
use crate::package::{Assembler, PackageContext, TemplateAssembler};
use crate::protoc::{CompilerInvoker, import_relative, infer_proto_root};
use crate::request::BundleRequest;
use crate::temp::{WorkDir, temp_dir_base};

/// Subdirectory of the output holding the schema sources
pub const PROVENANCE_DIR: &str = "proto";

/// The pipeline and its collaborators
pub struct Pipeline {
    fetcher: Box<dyn Fetcher>,
    invoker: CompilerInvoker,
    assembler: Box<dyn Assembler>,
    temp_base: PathBuf,
}

impl Pipeline {
    /// Git fetcher, template assembler and the system temp directory
    pub fn new(invoker: CompilerInvoker) -> Self {
        Self {
            fetcher: Box::new(GitFetcher),
            invoker,
            assembler: Box::new(TemplateAssembler),
            temp_base: temp_dir_base(),
        }
    }

    #[must_use]
    pub fn with_fetcher(mut self, fetcher: impl Fetcher + 'static) -> Self {
        self.fetcher = Box::new(fetcher);
        self
    }

    #[must_use]
    pub fn with_assembler(mut self, assembler: impl Assembler + 'static) -> Self {
        self.assembler = Box::new(assembler);
        self
    }

    /// Create working directories under `base` instead of the system temp directory
    #[must_use]
    pub fn with_temp_base(mut self, base: impl Into<PathBuf>) -> Self {
        self.temp_base = base.into();
        self
    }

    /// Run every step for `request`.
    ///
    /// On success the output directory holds the package and its schemas.
    /// The working directory is gone when this returns, and also when a
    /// step panics.
    pub fn run(&self, request: &BundleRequest) -> Result<()> {
        let work = WorkDir::create_in(&self.temp_base)?;
        let result = self.run_in(request, &work);
        work.cleanup();
        result
    }

    fn run_in(&self, request: &BundleRequest, work: &WorkDir) -> Result<()> {
        let schema_dir = work.schema_dir();
        let protos = fetch_protos(
            self.fetcher.as_ref(),
            &request.repo,
            &schema_dir,
            &work.scratch_dir(),
        )?;

        let generated = self
            .invoker
            .invoke(request.target, &protos, &schema_dir, work.path())?;

        let schemas = import_paths(&protos, &schema_dir)?;
        let schema_digest = hash_files(&schemas)?;
        tracing::info!("Schema digest: {schema_digest}");

        fs::create_dir_all(&request.output)
            .map_err(|e| BundlerError::write_failed(&request.output, e))?;

        let repo = request.repo.to_string();
        let ctx = PackageContext {
            name: &request.package_name,
            version: &request.package_version,
            repo: &repo,
            schema_digest: &schema_digest,
            metadata: &request.package_data,
        };
        self.assembler
            .assemble(request.target, &generated, &ctx, &request.output)?;

        copy_schemas(&schemas, &request.output.join(PROVENANCE_DIR))?;

        tracing::info!("Bundle complete -> {}", request.output.display());
        Ok(())
    }
}

/// `(import path, absolute path)` for every schema file.
///
/// Import paths are relative to the inferred root, or to the fetched tree
/// root for files outside it.
fn import_paths<'a>(
    protos: &'a [PathBuf],
    schema_dir: &Path,
) -> Result<Vec<(PathBuf, &'a Path)>> {
    let root = infer_proto_root(schema_dir);
    protos
        .iter()
        .map(|file| {
            let (relative, _) = import_relative(file, &root, schema_dir).ok_or_else(|| {
                BundlerError::IoError {
                    message: format!(
                        "{} is outside the schema tree {}",
                        file.display(),
                        schema_dir.display()
                    ),
                }
            })?;
            Ok((relative.to_path_buf(), file.as_path()))
        })
        .collect()
}

fn copy_schemas(schemas: &[(PathBuf, &Path)], dest: &Path) -> Result<()> {
    for (relative, absolute) in schemas {
        copy_file_with_parents(absolute, &dest.join(relative))?;
    }
    tracing::debug!("Copied {} schema file(s) to {}", schemas.len(), dest.display());
    Ok(())
}
