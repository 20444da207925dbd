use anyhow::{Context, Result};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{info, warn};

use super::segment::TEMP_SUFFIX;

/// Finalize segment files left open by earlier runs
///
/// A temp file can only survive a process that died mid-segment. Segments
/// are append-only, so stripping the suffix never loses data, although the
/// last packet may be truncated. Returns the finalized paths.
pub fn recover_open_segments(output_dir: &Path) -> Result<Vec<PathBuf>> {
    let entries = fs::read_dir(output_dir)
        .with_context(|| format!("Failed to scan output directory: {:?}", output_dir))?;

    let mut recovered = Vec::new();

    for entry in entries {
        let entry = entry.context("Failed to read output directory entry")?;
        if !entry.file_type()?.is_file() {
            continue;
        }

        let name = entry.file_name();
        let Some(final_name) = name.to_str().and_then(|n| n.strip_suffix(TEMP_SUFFIX)) else {
            continue;
        };
        if final_name.is_empty() {
            continue;
        }

        let temp_path = entry.path();
        let final_path = output_dir.join(final_name);

        if final_path.exists() {
            warn!(
                "Found open file {:?} but {:?} already exists, leaving it",
                temp_path, final_path
            );
            continue;
        }

        warn!("Found open file {:?}, renaming", temp_path);
        fs::rename(&temp_path, &final_path)
            .with_context(|| format!("Failed to finalize {:?}", temp_path))?;
        recovered.push(final_path);
    }

    if !recovered.is_empty() {
        info!("Recovered {} open segment(s)", recovered.len());
    }

    Ok(recovered)
}
