// src/files.rs

//! Small filesystem helpers shared by the asset pipelines and checks.

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::Result;
use globset::GlobSet;
use walkdir::WalkDir;

use crate::watch::patterns::build_globset;

/// Enumerate all files under `root` matching `include` globs and not matching
/// `exclude` globs. Paths are returned relative to `root`, sorted, with
/// forward slashes, so file sets are stable across platforms.
pub fn collect_files(root: &Path, include: &[String], exclude: &[String]) -> Result<Vec<PathBuf>> {
    let include_set = build_globset(include)?;
    let exclude_set: Option<GlobSet> = if exclude.is_empty() {
        None
    } else {
        Some(build_globset(exclude)?)
    };

    let mut out = Vec::new();

    for entry in WalkDir::new(root).follow_links(false) {
        let entry = match entry {
            Ok(e) => e,
            // Unreadable directories are skipped, not fatal.
            Err(_) => continue,
        };
        if !entry.file_type().is_file() {
            continue;
        }
        let rel = match entry.path().strip_prefix(root) {
            Ok(r) => r,
            Err(_) => continue,
        };
        let rel_str = rel.to_string_lossy().replace('\\', "/");
        if !include_set.is_match(&rel_str) {
            continue;
        }
        if let Some(ex) = &exclude_set {
            if ex.is_match(&rel_str) {
                continue;
            }
        }
        out.push(PathBuf::from(rel_str));
    }

    out.sort();
    Ok(out)
}

/// Write an artifact atomically: the content lands in a sibling temp file
/// first and is renamed over the destination, so a failed run never leaves a
/// partially written output behind.
pub fn write_artifact(dest: &Path, contents: &[u8]) -> std::io::Result<()> {
    if let Some(parent) = dest.parent() {
        fs::create_dir_all(parent)?;
    }

    let tmp = dest.with_extension(match dest.extension() {
        Some(ext) => format!("{}.tmp", ext.to_string_lossy()),
        None => "tmp".to_string(),
    });

    fs::write(&tmp, contents)?;
    fs::rename(&tmp, dest)?;
    Ok(())
}
