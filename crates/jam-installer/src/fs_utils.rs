use std::fs;
use std::io;
use std::path::Path;

use jam_core::{JamError, Result};

pub fn remove_file_if_exists(path: &Path) -> io::Result<()> {
    if path.exists() {
        fs::remove_file(path)?;
    }
    Ok(())
}

/// Returns whether anything was removed.
pub fn remove_dir_if_exists(path: &Path) -> Result<bool> {
    match fs::remove_dir_all(path) {
        Ok(()) => Ok(true),
        Err(err) if err.kind() == io::ErrorKind::NotFound => Ok(false),
        Err(err) => Err(JamError::io(
            format!("failed to remove {}", path.display()),
            err,
        )),
    }
}

/// Writes `contents` to a sibling temp file and renames it over `path`.
pub fn write_file_replacing(path: &Path, contents: &[u8]) -> Result<()> {
    if let Some(parent) = path.parent().filter(|parent| !parent.as_os_str().is_empty()) {
        fs::create_dir_all(parent).map_err(|source| {
            JamError::io(format!("failed to create {}", parent.display()), source)
        })?;
    }

    let file_name = path
        .file_name()
        .map(|name| name.to_string_lossy().to_string())
        .unwrap_or_default();
    let tmp_path = path.with_file_name(format!(".{file_name}.tmp-{}", std::process::id()));

    fs::write(&tmp_path, contents).map_err(|source| {
        JamError::io(format!("failed to write {}", tmp_path.display()), source)
    })?;
    if let Err(err) = fs::rename(&tmp_path, path) {
        let _ = remove_file_if_exists(&tmp_path);
        return Err(JamError::io(
            format!("failed to replace {}", path.display()),
            err,
        ));
    }
    Ok(())
}
