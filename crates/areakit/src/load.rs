//! Frame folder loading.
//!
//! Every `*.png` directly inside the folder is a frame, in filename
//! order. Files that fail to decode are skipped with a warning.

use std::path::{Path, PathBuf};

use areakit_pipeline::{FrameStack, RgbaImage};

use crate::CliError;

/// PNG files directly inside `dir`, sorted by file name.
///
/// # Errors
///
/// Returns [`CliError::Io`] if the directory cannot be listed.
pub fn png_paths(dir: &Path) -> Result<Vec<PathBuf>, CliError> {
    let entries = std::fs::read_dir(dir).map_err(|source| CliError::Io {
        path: dir.to_path_buf(),
        source,
    })?;

    let mut paths: Vec<PathBuf> = entries
        .filter_map(Result::ok)
        .map(|entry| entry.path())
        .filter(|path| {
            path.is_file()
                && path
                    .extension()
                    .and_then(|ext| ext.to_str())
                    .is_some_and(|ext| ext.eq_ignore_ascii_case("png"))
        })
        .collect();
    paths.sort_by(|a, b| a.file_name().cmp(&b.file_name()));
    Ok(paths)
}

/// Load the frame stack stored in `dir`.
///
/// # Errors
///
/// Returns [`CliError::Io`] if the directory cannot be listed, and
/// [`CliError::Region`] when no frame decodes or the frames disagree in
/// size.
pub fn load_frames(dir: &Path) -> Result<FrameStack, CliError> {
    let mut frames: Vec<RgbaImage> = Vec::new();
    for path in png_paths(dir)? {
        match decode_frame(&path) {
            Ok(frame) => frames.push(frame),
            Err(e) => tracing::warn!(path = %path.display(), error = %e, "skipping unreadable frame"),
        }
    }
    tracing::debug!(count = frames.len(), dir = %dir.display(), "decoded frames");
    Ok(FrameStack::new(frames)?)
}

fn decode_frame(path: &Path) -> Result<RgbaImage, CliError> {
    let bytes = std::fs::read(path).map_err(|source| CliError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    Ok(image::load_from_memory(&bytes)?.to_rgba8())
}
