//! Running protoc with a target's plugin

use std::ffi::OsString;
use std::fs;
use std::io::{BufRead, BufReader, Write};
use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};

use super::resolver::BinaryResolver;
use super::root::{import_relative, infer_proto_root};
use crate::common::fs::walk_files;
use crate::error::{BundlerError, Result};
use crate::target::Target;

/// Files written by one compiler run
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GeneratedFiles {
    /// The target's output directory
    pub dir: PathBuf,
    /// Absolute paths of every file under `dir`, sorted
    pub files: Vec<PathBuf>,
}

impl GeneratedFiles {
    /// `(absolute, relative to dir)` pairs
    pub fn relative(&self) -> impl Iterator<Item = (&Path, &Path)> {
        self.files
            .iter()
            .filter_map(|f| f.strip_prefix(&self.dir).ok().map(|rel| (f.as_path(), rel)))
    }
}

/// Builds and runs the protoc command line
pub struct CompilerInvoker {
    protoc: PathBuf,
    resolver: BinaryResolver,
}

impl CompilerInvoker {
    pub fn new(protoc: impl Into<PathBuf>, resolver: BinaryResolver) -> Self {
        Self {
            protoc: protoc.into(),
            resolver,
        }
    }

    /// Compile `proto_files` (absolute, inside `schema_dir`) for `target`.
    ///
    /// Output goes to `<work_dir>/generated`; every file found there after a
    /// successful run is returned.
    pub fn invoke(
        &self,
        target: Target,
        proto_files: &[PathBuf],
        schema_dir: &Path,
        work_dir: &Path,
    ) -> Result<GeneratedFiles> {
        let plugin = target.plugin();
        let plugin_bin = self.resolver.resolve(plugin.bin, plugin.package)?;

        let gen_dir = work_dir.join("generated");
        fs::create_dir_all(&gen_dir).map_err(|e| BundlerError::write_failed(&gen_dir, e))?;

        let proto_root = infer_proto_root(schema_dir);
        let args = build_args(target, &plugin_bin, &proto_root, schema_dir, &gen_dir, proto_files)?;

        tracing::info!(
            "Running: {} {}",
            self.protoc.display(),
            args.iter()
                .map(|a| a.to_string_lossy())
                .collect::<Vec<_>>()
                .join(" ")
        );
        self.run(&args)?;

        let files = walk_files(&gen_dir)?;
        tracing::info!("protoc generated {} file(s)", files.len());
        Ok(GeneratedFiles {
            dir: gen_dir,
            files,
        })
    }

    /// Run protoc with stdin closed and stdout discarded. Stderr is echoed
    /// live and kept for the error on failure.
    fn run(&self, args: &[OsString]) -> Result<()> {
        let program = self.protoc.display().to_string();
        let mut child = Command::new(&self.protoc)
            .args(args)
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::piped())
            .spawn()
            .map_err(|e| BundlerError::CompilerSpawnFailed {
                program: program.clone(),
                reason: e.to_string(),
            })?;

        let mut diagnostics = String::new();
        if let Some(stderr) = child.stderr.take() {
            let mut reader = BufReader::new(stderr);
            let mut console = std::io::stderr().lock();
            let mut line = Vec::new();
            loop {
                line.clear();
                match reader.read_until(b'\n', &mut line) {
                    Ok(0) => break,
                    Ok(_) => {
                        let _ = console.write_all(&line);
                        diagnostics.push_str(&String::from_utf8_lossy(&line));
                    }
                    Err(e) => {
                        tracing::warn!("Failed to read protoc stderr: {e}");
                        break;
                    }
                }
            }
        }

        let status = child.wait().map_err(|e| BundlerError::CompilerSpawnFailed {
            program,
            reason: e.to_string(),
        })?;
        if status.success() {
            return Ok(());
        }

        Err(BundlerError::CompilerFailed {
            code: status
                .code()
                .map_or_else(|| "signal".to_string(), |c| c.to_string()),
            stderr: diagnostics.trim_end().to_string(),
        })
    }
}

/// The protoc argument list:
/// `--plugin=<bin>=<path> --proto_path=<root> [--proto_path=<tree>] <out_flag>=<dir> <files...>`
fn build_args(
    target: Target,
    plugin_bin: &Path,
    proto_root: &Path,
    schema_dir: &Path,
    gen_dir: &Path,
    proto_files: &[PathBuf],
) -> Result<Vec<OsString>> {
    let plugin = target.plugin();

    let mut needs_tree_root = false;
    let mut relative = Vec::with_capacity(proto_files.len());
    for file in proto_files {
        let (rel, outside_root) = import_relative(file, proto_root, schema_dir).ok_or_else(|| {
            BundlerError::IoError {
                message: format!(
                    "{} is outside the schema tree {}",
                    file.display(),
                    schema_dir.display()
                ),
            }
        })?;
        needs_tree_root |= outside_root;
        relative.push(rel.as_os_str().to_os_string());
    }

    let mut args = vec![
        flag_value(&format!("--plugin={}", plugin.bin), plugin_bin),
        flag_value("--proto_path", proto_root),
    ];
    if needs_tree_root {
        args.push(flag_value("--proto_path", schema_dir));
    }
    args.push(flag_value(plugin.out_flag, gen_dir));
    args.extend(relative);
    Ok(args)
}

fn flag_value(flag: &str, path: &Path) -> OsString {
    let mut arg = OsString::from(flag);
    arg.push("=");
    arg.push(path.as_os_str());
    arg
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn strings(args: &[OsString]) -> Vec<String> {
        args.iter().map(|a| a.to_string_lossy().to_string()).collect()
    }

    #[test]
    fn test_build_args_order() {
        let args = build_args(
            Target::Solidity,
            Path::new("/p/node_modules/.bin/protoc-gen-solidity"),
            Path::new("/w/proto"),
            Path::new("/w/proto"),
            Path::new("/w/generated"),
            &[PathBuf::from("/w/proto/a/b.proto"), PathBuf::from("/w/proto/a/c.proto")],
        )
        .unwrap();

        assert_eq!(
            strings(&args),
            vec![
                "--plugin=protoc-gen-solidity=/p/node_modules/.bin/protoc-gen-solidity",
                "--proto_path=/w/proto",
                "--solidity_out=/w/generated",
                "a/b.proto",
                "a/c.proto",
            ]
        );
    }

    #[test]
    fn test_build_args_relative_to_inferred_root() {
        let args = build_args(
            Target::Solana,
            Path::new("/bin/protoc-gen-solana"),
            Path::new("/w/proto/protos"),
            Path::new("/w/proto"),
            Path::new("/w/generated"),
            &[PathBuf::from("/w/proto/protos/wire/v1/opp.proto")],
        )
        .unwrap();

        assert_eq!(
            strings(&args),
            vec![
                "--plugin=protoc-gen-solana=/bin/protoc-gen-solana",
                "--proto_path=/w/proto/protos",
                "--solana_out=/w/generated",
                "wire/v1/opp.proto",
            ]
        );
    }

    #[test]
    fn test_build_args_adds_tree_root_for_stray_files() {
        let args = build_args(
            Target::Solana,
            Path::new("/bin/protoc-gen-solana"),
            Path::new("/w/proto/proto"),
            Path::new("/w/proto"),
            Path::new("/w/generated"),
            &[
                PathBuf::from("/w/proto/proto/a.proto"),
                PathBuf::from("/w/proto/extra/b.proto"),
            ],
        )
        .unwrap();

        assert_eq!(
            strings(&args),
            vec![
                "--plugin=protoc-gen-solana=/bin/protoc-gen-solana",
                "--proto_path=/w/proto/proto",
                "--proto_path=/w/proto",
                "--solana_out=/w/generated",
                "a.proto",
                "extra/b.proto",
            ]
        );
    }

    #[test]
    fn test_build_args_rejects_file_outside_tree() {
        let result = build_args(
            Target::Solana,
            Path::new("/bin/protoc-gen-solana"),
            Path::new("/w/proto"),
            Path::new("/w/proto"),
            Path::new("/w/generated"),
            &[PathBuf::from("/elsewhere/a.proto")],
        );
        assert!(result.is_err());
    }

    #[test]
    fn test_generated_files_relative() {
        let generated = GeneratedFiles {
            dir: PathBuf::from("/w/generated"),
            files: vec![PathBuf::from("/w/generated/a/B.sol")],
        };
        let pairs: Vec<_> = generated.relative().collect();
        assert_eq!(
            pairs,
            vec![(Path::new("/w/generated/a/B.sol"), Path::new("a/B.sol"))]
        );
    }

    #[cfg(unix)]
    mod process {
        use super::*;
        use crate::test_fixtures::{create_temp_dir, failing_protoc, fake_protoc, write_files};
        use std::collections::HashSet;

        struct Setup {
            _temp: tempfile::TempDir,
            project: PathBuf,
            schema_dir: PathBuf,
            work_dir: PathBuf,
            protos: Vec<PathBuf>,
        }

        fn setup() -> Setup {
            let temp = create_temp_dir();
            let project = temp.path().join("project");
            crate::test_fixtures::write_executable(
                &project.join("node_modules/.bin/protoc-gen-solidity"),
                "#!/bin/sh\n",
            );
            let work_dir = temp.path().join("work");
            let schema_dir = work_dir.join("proto");
            write_files(
                &schema_dir,
                &[("a/b.proto", "syntax = \"proto3\";"), ("a/c.proto", "syntax = \"proto3\";")],
            );
            let protos = vec![schema_dir.join("a/b.proto"), schema_dir.join("a/c.proto")];
            Setup {
                _temp: temp,
                project,
                schema_dir,
                work_dir,
                protos,
            }
        }

        fn resolver(project: &Path) -> BinaryResolver {
            BinaryResolver::new(project).with_search_path(project.join("no-such-dir").into_os_string())
        }

        #[test]
        fn test_invoke_collects_every_generated_file_once() {
            let s = setup();
            let protoc = fake_protoc(&s.project.join("protoc"), ".sol");
            let invoker = CompilerInvoker::new(protoc, resolver(&s.project));

            let generated = invoker
                .invoke(Target::Solidity, &s.protos, &s.schema_dir, &s.work_dir)
                .unwrap();

            assert_eq!(generated.dir, s.work_dir.join("generated"));
            assert_eq!(
                generated.files,
                vec![
                    s.work_dir.join("generated/a/b.sol"),
                    s.work_dir.join("generated/a/c.sol"),
                ]
            );
            let unique: HashSet<_> = generated.files.iter().collect();
            assert_eq!(unique.len(), generated.files.len());
            assert!(generated.files.iter().all(|f| f.starts_with(&generated.dir)));
        }

        #[test]
        fn test_invoke_passes_plugin_and_relative_paths() {
            let s = setup();
            let protoc = fake_protoc(&s.project.join("protoc"), ".sol");
            let invoker = CompilerInvoker::new(protoc, resolver(&s.project));
            invoker
                .invoke(Target::Solidity, &s.protos, &s.schema_dir, &s.work_dir)
                .unwrap();

            let recorded = fs::read_to_string(s.work_dir.join("protoc-args.txt")).unwrap();
            let lines: Vec<&str> = recorded.lines().collect();
            let plugin = dunce::canonicalize(s.project.join("node_modules/.bin/protoc-gen-solidity"))
                .unwrap();
            assert_eq!(
                lines,
                vec![
                    format!("--plugin=protoc-gen-solidity={}", plugin.display()),
                    format!("--proto_path={}", s.schema_dir.display()),
                    format!("--solidity_out={}", s.work_dir.join("generated").display()),
                    "a/b.proto".to_string(),
                    "a/c.proto".to_string(),
                ]
            );
        }

        #[test]
        fn test_invoke_surfaces_exit_code_and_stderr() {
            let s = setup();
            let protoc = failing_protoc(&s.project.join("protoc"), 3);
            let invoker = CompilerInvoker::new(protoc, resolver(&s.project));

            let result = invoker.invoke(Target::Solidity, &s.protos, &s.schema_dir, &s.work_dir);
            match result {
                Err(BundlerError::CompilerFailed { code, stderr }) => {
                    assert_eq!(code, "3");
                    assert!(stderr.contains("a/b.proto:3:1"));
                }
                other => panic!("expected CompilerFailed, got {other:?}"),
            }
        }

        #[test]
        fn test_invoke_keeps_non_utf8_diagnostics() {
            let s = setup();
            let protoc = crate::test_fixtures::write_executable(
                &s.project.join("protoc"),
                "#!/bin/sh\nprintf 'caf\\351.proto:1:1: bad\\n' >&2\nexit 1\n",
            );
            let invoker = CompilerInvoker::new(protoc, resolver(&s.project));

            let result = invoker.invoke(Target::Solidity, &s.protos, &s.schema_dir, &s.work_dir);
            match result {
                Err(BundlerError::CompilerFailed { code, stderr }) => {
                    assert_eq!(code, "1");
                    assert!(stderr.starts_with("caf"));
                    assert!(stderr.contains(".proto:1:1: bad"));
                }
                other => panic!("expected CompilerFailed, got {other:?}"),
            }
        }

        #[test]
        fn test_invoke_missing_plugin_fails_before_running() {
            let s = setup();
            let protoc = fake_protoc(&s.project.join("protoc"), ".rs");
            let invoker = CompilerInvoker::new(protoc, resolver(&s.project));

            let result = invoker.invoke(Target::Solana, &s.protos, &s.schema_dir, &s.work_dir);
            assert!(matches!(result, Err(BundlerError::PluginNotFound { .. })));
            assert!(!s.work_dir.join("protoc-args.txt").exists());
        }

        #[test]
        fn test_invoke_missing_compiler() {
            let s = setup();
            let invoker = CompilerInvoker::new(s.project.join("no-protoc"), resolver(&s.project));
            let result = invoker.invoke(Target::Solidity, &s.protos, &s.schema_dir, &s.work_dir);
            assert!(matches!(
                result,
                Err(BundlerError::CompilerSpawnFailed { .. })
            ));
        }
    }
}
