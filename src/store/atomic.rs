use crate::error::SyncWriteError;
use serde::Serialize;
use serde::de::DeserializeOwned;
use std::fs;
use std::path::{Path, PathBuf};

const TEMP_SUFFIX: &str = "tmp";

fn temp_path_for(path: &Path) -> PathBuf {
    let mut name = path.file_name().unwrap_or_default().to_os_string();
    name.push(".");
    name.push(TEMP_SUFFIX);
    path.with_file_name(name)
}

fn io_error(path: &Path, source: std::io::Error) -> SyncWriteError {
    SyncWriteError::Io {
        path: path.display().to_string(),
        source,
    }
}

/// Write `value` as pretty JSON via `<file>.tmp` + rename.
///
/// A failure at any step removes the temp file and leaves the previous
/// content of `path` untouched.
pub fn write_json_atomic<T: Serialize + ?Sized>(
    path: &Path,
    value: &T,
) -> Result<(), SyncWriteError> {
    let encoded = serde_json::to_vec_pretty(value).map_err(|e| SyncWriteError::Encode {
        path: path.display().to_string(),
        message: e.to_string(),
    })?;
    write_atomic(path, &encoded)
}

pub fn write_atomic(path: &Path, content: &[u8]) -> Result<(), SyncWriteError> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).map_err(|e| io_error(parent, e))?;
    }

    let temp_path = temp_path_for(path);
    if let Err(write_error) = fs::write(&temp_path, content) {
        let _ = fs::remove_file(&temp_path);
        return Err(io_error(&temp_path, write_error));
    }

    if let Err(rename_error) = fs::rename(&temp_path, path) {
        let _ = fs::remove_file(&temp_path);
        return Err(io_error(path, rename_error));
    }

    Ok(())
}

/// Read a JSON document. `Ok(None)` when the file does not exist.
pub fn read_json<T: DeserializeOwned>(path: &Path) -> anyhow::Result<Option<T>> {
    let raw = match fs::read(path) {
        Ok(raw) => raw,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
        Err(e) => return Err(e.into()),
    };
    Ok(Some(serde_json::from_slice(&raw)?))
}

/// Remove leftover temp files from interrupted writes. Returns how many were removed.
pub fn discard_stale_temps(dir: &Path) -> usize {
    let Ok(entries) = fs::read_dir(dir) else {
        return 0;
    };

    let mut removed = 0;
    for entry in entries.flatten() {
        let path = entry.path();
        let is_temp = path.is_file()
            && path
                .extension()
                .and_then(|ext| ext.to_str())
                .is_some_and(|ext| ext == TEMP_SUFFIX);
        if is_temp && fs::remove_file(&path).is_ok() {
            tracing::debug!(path = %path.display(), "Discarded incomplete temp file");
            removed += 1;
        }
    }
    removed
}
