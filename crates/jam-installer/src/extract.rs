use std::fs;
use std::io::{Cursor, Read};
use std::path::{Component, Path, PathBuf};

use jam_core::{JamError, Result};
use log::debug;
use zip::ZipArchive;

/// Drops the first path segment of an archive entry name.
///
/// Source-hosting zipballs wrap the repository in a single synthetic
/// directory (`owner-repo-sha/`); stripping it leaves the repository tree.
pub fn strip_wrapper_dir(name: &str) -> String {
    name.split('/').skip(1).collect::<Vec<_>>().join("/")
}

/// Writes every file entry of `archive` under `dest`, naming each one by
/// `remap(entry_name)`. Entries that remap to an empty name are skipped.
///
/// Not transactional: a failure partway through leaves the files written so
/// far in place. Returns the number of files written.
pub fn extract_zip<F>(archive: &[u8], dest: &Path, remap: F) -> Result<usize>
where
    F: Fn(&str) -> String,
{
    let mut archive = ZipArchive::new(Cursor::new(archive)).map_err(|err| {
        JamError::CorruptArchive {
            reason: err.to_string(),
        }
    })?;

    let mut written = 0_usize;
    for index in 0..archive.len() {
        let mut entry = archive
            .by_index(index)
            .map_err(|err| JamError::CorruptArchive {
                reason: format!("failed to read entry {index}: {err}"),
            })?;
        if entry.is_dir() {
            continue;
        }

        let name = entry.name().to_string();
        let mapped = remap(&name);
        if mapped.is_empty() {
            continue;
        }
        let relative = validated_relative_entry_path(&mapped)?;

        let mut contents = Vec::new();
        entry
            .read_to_end(&mut contents)
            .map_err(|err| JamError::CorruptArchive {
                reason: format!("failed to decompress '{name}': {err}"),
            })?;

        let write_path = dest.join(relative);
        if let Some(parent) = write_path.parent() {
            fs::create_dir_all(parent).map_err(|source| JamError::ExtractionIo {
                path: parent.to_path_buf(),
                source,
            })?;
        }
        fs::write(&write_path, &contents).map_err(|source| JamError::ExtractionIo {
            path: write_path.clone(),
            source,
        })?;

        #[cfg(unix)]
        set_unix_mode(&write_path, entry.unix_mode())?;

        written += 1;
    }

    debug!("extracted {written} file(s) into {}", dest.display());
    Ok(written)
}

#[cfg(unix)]
fn set_unix_mode(path: &Path, mode: Option<u32>) -> Result<()> {
    use std::os::unix::fs::PermissionsExt;

    let Some(mode) = mode.map(|mode| mode & 0o777).filter(|mode| *mode != 0) else {
        return Ok(());
    };
    fs::set_permissions(path, fs::Permissions::from_mode(mode)).map_err(|source| {
        JamError::ExtractionIo {
            path: path.to_path_buf(),
            source,
        }
    })
}

fn validated_relative_entry_path(mapped: &str) -> Result<PathBuf> {
    let path = Path::new(mapped);
    let mut relative = PathBuf::new();
    for component in path.components() {
        match component {
            Component::Normal(part) => relative.push(part),
            Component::CurDir => {}
            Component::ParentDir | Component::RootDir | Component::Prefix(_) => {
                return Err(JamError::CorruptArchive {
                    reason: format!("entry escapes the destination directory: {mapped}"),
                });
            }
        }
    }
    if relative.as_os_str().is_empty() {
        return Err(JamError::CorruptArchive {
            reason: format!("entry has no file name: {mapped}"),
        });
    }
    Ok(relative)
}
