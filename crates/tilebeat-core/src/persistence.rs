use std::{
    fs::{self, File},
    path::Path,
};

use tracing::{debug, instrument};

use crate::engine::EngineError;

/// Writes `path` through a temp file in the same directory and renames it into
/// place once `write` succeeds, so readers never observe a partial file.
#[instrument(skip(write), fields(path = %path.display()))]
pub fn write_atomically<F>(path: &Path, write: F) -> Result<(), EngineError>
where
    F: FnOnce(&mut File) -> Result<(), EngineError>,
{
    let parent = path
        .parent()
        .filter(|parent| !parent.as_os_str().is_empty())
        .unwrap_or_else(|| Path::new("."));
    fs::create_dir_all(parent).map_err(|error| {
        EngineError::output_write(path, format!("failed to create directory: {error}"))
    })?;

    let mut temp_file = tempfile::NamedTempFile::new_in(parent).map_err(|error| {
        EngineError::output_write(path, format!("failed to create temp file: {error}"))
    })?;
    write(temp_file.as_file_mut())?;
    temp_file
        .persist(path)
        .map_err(|error| EngineError::output_write(path, error.error.to_string()))?;

    debug!("file persisted");
    Ok(())
}
