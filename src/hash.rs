//! BLAKE3 digest of a schema file set

use std::fs::File;
use std::io::{BufReader, Read};
use std::path::Path;

use blake3::Hasher;

use crate::error::{BundlerError, Result};

/// Hash prefix for BLAKE3 hashes
pub const HASH_PREFIX: &str = "blake3:";

/// Digest of `(relative path, absolute path)` pairs.
///
/// Each file contributes its relative path, a NUL, its contents and a NUL,
/// in relative path order, so the digest does not depend on where the
/// files were checked out.
pub fn hash_files<R, A>(files: &[(R, A)]) -> Result<String>
where
    R: AsRef<Path>,
    A: AsRef<Path>,
{
    let mut ordered: Vec<_> = files.iter().map(|(r, a)| (r.as_ref(), a.as_ref())).collect();
    ordered.sort_by_key(|(relative, _)| *relative);

    let mut hasher = Hasher::new();
    for (relative, absolute) in ordered {
        hasher.update(relative.to_string_lossy().replace('\\', "/").as_bytes());
        hasher.update(b"\0");
        hash_contents(&mut hasher, absolute)?;
        hasher.update(b"\0");
    }

    Ok(format!("{HASH_PREFIX}{}", hasher.finalize().to_hex()))
}

fn hash_contents(hasher: &mut Hasher, path: &Path) -> Result<()> {
    let file = File::open(path).map_err(|e| BundlerError::read_failed(path, e))?;
    let mut reader = BufReader::new(file);
    let mut buffer = [0u8; 8192];

    loop {
        let bytes_read = reader
            .read(&mut buffer)
            .map_err(|e| BundlerError::read_failed(path, e))?;
        if bytes_read == 0 {
            return Ok(());
        }
        hasher.update(&buffer[..bytes_read]);
    }
}
