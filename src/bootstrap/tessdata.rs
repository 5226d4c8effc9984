use std::fs;
use std::path::Path;

use anyhow::{Context, Result};
use tracing::{debug, info};

/// Merges the image's default OCR data into the live data directory.
/// Files already present in the target always win; nothing is overwritten.
pub fn stage(source: &Path, target: &Path) -> Result<usize> {
    if !source.is_dir() {
        info!("No default OCR data at {}; skipping staging", source.display());
        return Ok(0);
    }

    let is_empty = fs::read_dir(source)
        .with_context(|| format!("read source directory {}", source.display()))?
        .next()
        .is_none();
    if is_empty {
        info!(
            "Default OCR data directory {} is empty; skipping staging",
            source.display()
        );
        return Ok(0);
    }

    merge_missing(source, target)
}

fn merge_missing(source: &Path, target: &Path) -> Result<usize> {
    fs::create_dir_all(target)
        .with_context(|| format!("create target directory {}", target.display()))?;

    let mut copied = 0;
    let entries = fs::read_dir(source)
        .with_context(|| format!("read source directory {}", source.display()))?;
    for entry in entries {
        let entry = entry.context("read source entry")?;
        let from = entry.path();
        let to = target.join(entry.file_name());
        let kind = entry.file_type().context("stat source entry")?;

        if kind.is_dir() {
            copied += merge_missing(&from, &to)?;
        } else if to.exists() {
            debug!("Keeping existing {}", to.display());
        } else {
            fs::copy(&from, &to)
                .with_context(|| format!("copy {} to {}", from.display(), to.display()))?;
            copied += 1;
        }
    }

    Ok(copied)
}
