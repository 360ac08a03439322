use std::fs;
use std::io::{BufWriter, Write};
use std::path::Path;

use serde::Serialize;
use tempfile::NamedTempFile;

use crate::core::errors::SetupError;

/// Serializes `value` as pretty JSON to a temp file beside `path`, syncs it,
/// then renames it over `path`. Readers see either the old file or the new one.
pub fn write_json_atomic<T: Serialize + ?Sized>(path: &Path, value: &T) -> Result<(), SetupError> {
    let parent = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };
    fs::create_dir_all(parent).map_err(|err| persist_error(path, err))?;

    let temp = NamedTempFile::new_in(parent).map_err(|err| persist_error(path, err))?;
    {
        let mut writer = BufWriter::new(temp.as_file());
        serde_json::to_writer_pretty(&mut writer, value)
            .map_err(|err| persist_error(path, err.into()))?;
        writer.flush().map_err(|err| persist_error(path, err))?;
    }
    temp.as_file()
        .sync_all()
        .map_err(|err| persist_error(path, err))?;

    temp.persist(path)
        .map_err(|err| persist_error(path, err.error))?;
    Ok(())
}

fn persist_error(path: &Path, source: std::io::Error) -> SetupError {
    SetupError::Persist {
        path: path.to_path_buf(),
        source,
    }
}
