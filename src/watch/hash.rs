// src/watch/hash.rs

use std::fs::File;
use std::io::Read;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use blake3::Hasher;
use tracing::debug;

/// Compute a deterministic hash over the contents of the given files.
///
/// The caller decides which files belong to a task (all files matching its
/// input globs). Order of `paths` does not matter; we sort them before
/// hashing to keep the hash stable. Paths themselves are hashed too, so a
/// rename counts as a change.
pub fn hash_paths<I, P>(paths: I) -> Result<String>
where
    I: IntoIterator<Item = P>,
    P: AsRef<Path>,
{
    let mut hasher = Hasher::new();

    let mut paths_vec: Vec<PathBuf> = paths.into_iter().map(|p| p.as_ref().to_path_buf()).collect();
    paths_vec.sort();

    for path in paths_vec {
        if path.is_file() {
            hasher.update(path.to_string_lossy().as_bytes());
            let mut file = File::open(&path)
                .with_context(|| format!("opening file for hashing: {:?}", path))?;
            let mut buf = [0u8; 8192];
            loop {
                let n = file.read(&mut buf)?;
                if n == 0 {
                    break;
                }
                hasher.update(&buf[..n]);
            }
        }
    }

    let hash = hasher.finalize().to_hex().to_string();
    debug!(hash = %hash, "computed aggregate hash");
    Ok(hash)
}
