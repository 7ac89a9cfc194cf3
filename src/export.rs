//! Batch export of print variants to disk.
//!
//! Takes files and/or directories, renders every configured print target
//! for each source image, and writes `{stem}_{Target}.jpg` next to a copy
//! of the original in the output directory. Directory inputs are walked
//! recursively; only raster extensions the decoder supports are picked up.
//!
//! Export is fail-fast: the first broken source or unwritable path aborts
//! the run, so a finished run means every listed file is on disk.

use std::collections::BTreeSet;
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;
use walkdir::WalkDir;

use crate::imaging::{ImagingError, PrintTarget, Quality, generate_variants};

#[derive(Error, Debug)]
pub enum ExportError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("{path}: {source}")]
    Render {
        path: PathBuf,
        source: ImagingError,
    },
    #[error("no exportable images found in the given inputs")]
    NoInputs,
    #[error("input does not exist: {0}")]
    MissingInput(PathBuf),
}

/// What a finished export produced.
#[derive(Debug, Clone, Default)]
pub struct ExportSummary {
    /// Source images that were rendered.
    pub sources: Vec<PathBuf>,
    /// Every file written, originals included, in write order.
    pub written: Vec<PathBuf>,
}

const RASTER_EXTENSIONS: &[&str] = &["png", "jpg", "jpeg", "webp"];

fn is_raster(path: &Path) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .map(|e| RASTER_EXTENSIONS.contains(&e.to_ascii_lowercase().as_str()))
        .unwrap_or(false)
}

/// Expand file and directory inputs into a sorted, de-duplicated list of
/// source images.
fn collect_sources(inputs: &[PathBuf]) -> Result<Vec<PathBuf>, ExportError> {
    let mut sources = BTreeSet::new();
    for input in inputs {
        if input.is_dir() {
            for entry in WalkDir::new(input).into_iter().filter_map(Result::ok) {
                if entry.file_type().is_file() && is_raster(entry.path()) {
                    sources.insert(entry.path().to_path_buf());
                }
            }
        } else if input.is_file() {
            sources.insert(input.clone());
        } else {
            return Err(ExportError::MissingInput(input.clone()));
        }
    }
    if sources.is_empty() {
        return Err(ExportError::NoInputs);
    }
    Ok(sources.into_iter().collect())
}

/// Render and write every print variant for every source image.
pub fn export_prints(
    inputs: &[PathBuf],
    out_dir: &Path,
    targets: &[PrintTarget],
    quality: Quality,
) -> Result<ExportSummary, ExportError> {
    let sources = collect_sources(inputs)?;
    fs::create_dir_all(out_dir)?;

    let mut summary = ExportSummary::default();
    for source in sources {
        let bytes = fs::read(&source)?;
        let variants = generate_variants(&bytes, targets, quality).map_err(|e| {
            ExportError::Render {
                path: source.clone(),
                source: e,
            }
        })?;

        let stem = source
            .file_stem()
            .and_then(|s| s.to_str())
            .unwrap_or("image");
        for variant in variants.iter() {
            let path = out_dir.join(format!("{stem}_{}.jpg", variant.name));
            fs::write(&path, &variant.bytes)?;
            summary.written.push(path);
        }

        // Keep the untouched original alongside the prints
        let original = out_dir.join(source.file_name().unwrap_or(source.as_os_str()));
        fs::copy(&source, &original)?;
        summary.written.push(original);

        log::info!("exported {} print(s) for {}", targets.len(), source.display());
        summary.sources.push(source);
    }
    Ok(summary)
}
