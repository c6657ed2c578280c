//! Common test utilities for protobuf-bundler integration tests

#![allow(dead_code)]

use std::fs;
use std::path::{Path, PathBuf};

use assert_cmd::Command;
use git2::{Repository, RepositoryInitOptions, Signature};
use tempfile::TempDir;

/// A scratch area holding schema repositories, a project with plugin
/// installs, a private temp directory and the output location
pub struct TestWorkspace {
    pub temp: TempDir,
    /// Path to workspace root
    pub path: PathBuf,
}

impl TestWorkspace {
    pub fn new() -> Self {
        let temp = TempDir::new().expect("Failed to create temp directory");
        let path = temp.path().to_path_buf();
        fs::create_dir_all(path.join("tmp")).expect("Failed to create tmp directory");
        fs::create_dir_all(path.join("project")).expect("Failed to create project directory");
        Self { temp, path }
    }

    /// Write a file in workspace
    pub fn write_file(&self, path: &str, content: &str) {
        write_files(&self.path, &[(path, content)]);
    }

    /// Read a file from workspace
    pub fn read_file(&self, path: &str) -> String {
        fs::read_to_string(self.path.join(path)).expect("Failed to read file")
    }

    /// Check if a file exists in workspace
    pub fn file_exists(&self, path: &str) -> bool {
        self.path.join(path).exists()
    }

    /// Directory used as `TMPDIR` by [`Self::cmd`]
    pub fn tmp_dir(&self) -> PathBuf {
        self.path.join("tmp")
    }

    /// Project root searched for `node_modules` plugin installs
    pub fn project_dir(&self) -> PathBuf {
        self.path.join("project")
    }

    /// Entries left in [`Self::tmp_dir`]
    pub fn leftover_temp_entries(&self) -> Vec<String> {
        fs::read_dir(self.tmp_dir())
            .expect("Failed to read tmp directory")
            .map(|entry| {
                entry
                    .expect("Failed to read tmp entry")
                    .file_name()
                    .to_string_lossy()
                    .to_string()
            })
            .collect()
    }

    /// Create a git repository named `name` with `files` committed on `main`
    pub fn create_git_repo(&self, name: &str, files: &[(&str, &str)]) -> PathBuf {
        let repo_path = self.path.join("repos").join(name);
        let mut opts = RepositoryInitOptions::new();
        opts.initial_head("main");
        let repo = Repository::init_opts(&repo_path, &opts).expect("Failed to init repository");
        write_files(&repo_path, files);
        commit_all(&repo, "Initial commit");
        repo_path
    }

    /// Command running the real binary, isolated from the caller's environment
    #[allow(deprecated)]
    pub fn cmd(&self) -> Command {
        let mut cmd = Command::cargo_bin("protobuf-bundler").expect("Failed to find binary");
        cmd.current_dir(&self.path)
            .env("TMPDIR", self.tmp_dir())
            .env("PROTOBUF_BUNDLER_PROJECT_ROOT", self.project_dir())
            .env_remove("PROTOC")
            .env_remove("RUST_LOG");
        cmd
    }
}

impl Default for TestWorkspace {
    fn default() -> Self {
        Self::new()
    }
}

/// Write `files` (relative path, content) under `root`, creating parents
pub fn write_files(root: &Path, files: &[(&str, &str)]) {
    for (name, content) in files {
        let file = root.join(name);
        if let Some(parent) = file.parent() {
            fs::create_dir_all(parent).expect("Failed to create parent directory");
        }
        fs::write(&file, content).expect("Failed to write file");
    }
}

/// Stage everything and commit on HEAD
pub fn commit_all(repo: &Repository, message: &str) {
    let mut index = repo.index().expect("Failed to open index");
    index
        .add_all(["*"].iter(), git2::IndexAddOption::DEFAULT, None)
        .expect("Failed to stage files");
    index.write().expect("Failed to write index");
    let tree_id = index.write_tree().expect("Failed to write tree");
    let tree = repo.find_tree(tree_id).expect("Failed to find tree");
    let sig = Signature::now("Test", "test@test.com").expect("Failed to create signature");

    let parent = repo.head().ok().and_then(|head| head.peel_to_commit().ok());
    let parents: Vec<&git2::Commit<'_>> = parent.iter().collect();
    repo.commit(Some("HEAD"), &sig, &sig, message, &tree, &parents)
        .expect("Failed to commit");
}

/// `file://` URL for a local repository
pub fn file_url(path: &Path) -> String {
    format!("file://{}", path.display())
}

#[cfg(unix)]
pub mod tools {
    //! Shell stand-ins for protoc and its plugins

    use super::TestWorkspace;
    use std::fs;
    use std::os::unix::fs::PermissionsExt;
    use std::path::{Path, PathBuf};

    fn write_executable(path: &Path, script: &str) -> PathBuf {
        fs::create_dir_all(path.parent().expect("script has a parent"))
            .expect("Failed to create script directory");
        fs::write(path, script).expect("Failed to write script");
        fs::set_permissions(path, fs::Permissions::from_mode(0o755))
            .expect("Failed to chmod script");
        path.to_path_buf()
    }

    impl TestWorkspace {
        /// Install `bin` as an npm shim under the project's `node_modules/.bin`
        pub fn install_plugin(&self, bin: &str) -> PathBuf {
            write_executable(
                &self.project_dir().join("node_modules/.bin").join(bin),
                "#!/bin/sh\nexit 0\n",
            )
        }

        /// A protoc stand-in that writes one file per schema argument,
        /// `.rs` for the solana plugin and `.sol` for the solidity plugin,
        /// and records its arguments in `<workspace>/protoc-args.txt`. It
        /// also prints `protoc stdout marker` on stdout.
        pub fn fake_protoc(&self) -> PathBuf {
            let script = format!(
                r#"#!/bin/sh
printf '%s\n' "$@" > "{args}"
out=""
ext=""
for arg in "$@"; do
  case "$arg" in
    --solana_out=*) out="${{arg#*=}}"; ext=".rs" ;;
    --solidity_out=*) out="${{arg#*=}}"; ext=".sol" ;;
  esac
done
for arg in "$@"; do
  case "$arg" in
    --*) ;;
    *)
      dir=$(dirname "$arg")
      mkdir -p "$out/$dir"
      echo "// generated from $arg" > "$out/$dir/$(basename "$arg" .proto)$ext"
      ;;
  esac
done
echo "protoc stdout marker"
"#,
                args = self.path.join("protoc-args.txt").display()
            );
            write_executable(&self.path.join("bin/protoc"), &script)
        }

        /// A protoc stand-in rejecting every schema
        pub fn failing_protoc(&self) -> PathBuf {
            write_executable(
                &self.path.join("bin/protoc"),
                "#!/bin/sh\necho 'a/b.proto:1:1: Syntax error' >&2\nexit 1\n",
            )
        }
    }
}
