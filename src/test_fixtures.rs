//! Test fixtures shared by unit tests.
//!
//! Helpers to build schema trees, local git repositories and stand-in
//! executables for the schema compiler and its plugins.

#![allow(clippy::expect_used)]

use std::fs;
use std::path::{Path, PathBuf};

use git2::Repository;
use tempfile::TempDir;

/// Create a temp directory in the system temp location.
///
/// Uses `crate::temp::temp_dir_base()` to ensure temp dirs are never
/// created under the current working directory.
#[must_use]
pub fn create_temp_dir() -> TempDir {
    TempDir::new_in(crate::temp::temp_dir_base()).expect("Failed to create temp directory")
}

/// Write `files` (relative path, content) under `root`, creating parents
pub fn write_files(root: &Path, files: &[(&str, &str)]) {
    for (name, content) in files {
        let file = root.join(name);
        fs::create_dir_all(file.parent().expect("file has a parent"))
            .expect("Failed to create parent directory");
        fs::write(file, content).expect("Failed to write file");
    }
}

/// Initialize a repository at `path` with `files` committed on HEAD
pub fn create_git_repo(path: &Path, files: &[(&str, &str)]) -> Repository {
    let repo = Repository::init(path).expect("Failed to init git repository");
    write_files(path, files);
    commit_all(&repo, "Initial commit");
    repo
}

/// Stage the whole working tree and commit it on HEAD
pub fn commit_all(repo: &Repository, message: &str) {
    let mut index = repo.index().expect("Failed to open index");
    index
        .add_all(["*"].iter(), git2::IndexAddOption::DEFAULT, None)
        .expect("Failed to stage files");
    index.write().expect("Failed to write index");
    let tree_id = index.write_tree().expect("Failed to write tree");
    let tree = repo.find_tree(tree_id).expect("Failed to find tree");
    let sig = git2::Signature::now("Test", "test@test.com").expect("Failed to create signature");
    let parent = repo.head().ok().and_then(|head| head.peel_to_commit().ok());
    let parents: Vec<&git2::Commit<'_>> = parent.iter().collect();
    repo.commit(Some("HEAD"), &sig, &sig, message, &tree, &parents)
        .expect("Failed to commit");
}

/// `file://` URL for a local repository
pub fn file_url(path: &Path) -> String {
    format!("file://{}", path.display())
}

/// Write a shell script at `path` and mark it executable
#[cfg(unix)]
pub fn write_executable(path: &Path, script: &str) -> PathBuf {
    use std::os::unix::fs::PermissionsExt;

    fs::create_dir_all(path.parent().expect("script has a parent"))
        .expect("Failed to create script directory");
    fs::write(path, script).expect("Failed to write script");
    let mut perms = fs::metadata(path).expect("Failed to stat script").permissions();
    perms.set_mode(0o755);
    fs::set_permissions(path, perms).expect("Failed to chmod script");
    path.to_path_buf()
}

/// Stand-in for protoc.
///
/// Records its arguments one per line in `protoc-args.txt` next to the
/// output directory, then writes one `<stem><ext>` file into the output
/// directory per schema argument, mirroring the schema's relative path.
#[cfg(unix)]
pub fn fake_protoc(path: &Path, ext: &str) -> PathBuf {
    let script = format!(
        r#"#!/bin/sh
out=""
for arg in "$@"; do
  case "$arg" in
    --*_out=*) out="${{arg#*=}}" ;;
  esac
done
printf '%s\n' "$@" > "$out/../protoc-args.txt"
for arg in "$@"; do
  case "$arg" in
    --*) ;;
    *)
      dir=$(dirname "$arg")
      mkdir -p "$out/$dir"
      echo "// generated from $arg" > "$out/$dir/$(basename "$arg" .proto){ext}"
      ;;
  esac
done
echo "ignored stdout"
"#
    );
    write_executable(path, &script)
}

/// Stand-in for protoc that reports a schema error and exits with `code`
#[cfg(unix)]
pub fn failing_protoc(path: &Path, code: i32) -> PathBuf {
    let script = format!(
        "#!/bin/sh\necho 'a/b.proto:3:1: Expected top-level statement' >&2\nexit {code}\n"
    );
    write_executable(path, &script)
}
