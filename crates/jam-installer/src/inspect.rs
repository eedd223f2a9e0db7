use std::fmt;
use std::fs;
use std::io;
use std::path::PathBuf;

use jam_core::{ApplicationKind, JamError, Manifest, Result, MANIFEST_FILE_NAME};
use log::debug;

use crate::index::ApplicationIndex;
use crate::layout::VERSION_SIDECAR_FILE;
use crate::ApplicationsLayout;

/// Reads the `explanation.json` shipped inside an installed package, if the
/// repository tree carried one.
pub fn read_local_manifest(
    layout: &ApplicationsLayout,
    kind: ApplicationKind,
    short_id: &str,
    version: &str,
) -> Result<Option<Manifest>> {
    let path = layout
        .package_dir(kind, short_id, version)
        .join(MANIFEST_FILE_NAME);
    let raw = match fs::read_to_string(&path) {
        Ok(raw) => raw,
        Err(err) if err.kind() == io::ErrorKind::NotFound => return Ok(None),
        Err(err) => {
            return Err(JamError::io(
                format!("failed to read {}", path.display()),
                err,
            ))
        }
    };
    Manifest::from_json_str(&raw).map(Some)
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HealthIssue {
    MissingPackageDir {
        short_id: String,
        path: PathBuf,
    },
    MissingVersionSidecar {
        short_id: String,
        path: PathBuf,
    },
    VersionMismatch {
        short_id: String,
        recorded: String,
        on_disk: String,
    },
}

impl fmt::Display for HealthIssue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::MissingPackageDir { short_id, path } => {
                write!(f, "{short_id}: package directory {} is missing", path.display())
            }
            Self::MissingVersionSidecar { short_id, path } => {
                write!(f, "{short_id}: {} is missing", path.display())
            }
            Self::VersionMismatch {
                short_id,
                recorded,
                on_disk,
            } => write!(
                f,
                "{short_id}: index records {recorded} but {VERSION_SIDECAR_FILE} contains {on_disk}"
            ),
        }
    }
}

/// Checks that every index entry has its package tree and a matching
/// `__version` sidecar on disk.
pub fn check_installation(
    layout: &ApplicationsLayout,
    index: &ApplicationIndex,
) -> Result<Vec<HealthIssue>> {
    let mut issues = Vec::new();
    for (short_id, entry) in index.iter() {
        let package_dir = layout.package_dir(entry.kind, short_id, &entry.version);
        if !package_dir.is_dir() {
            issues.push(HealthIssue::MissingPackageDir {
                short_id: short_id.clone(),
                path: package_dir,
            });
            continue;
        }

        let sidecar = package_dir.join(VERSION_SIDECAR_FILE);
        match fs::read_to_string(&sidecar) {
            Ok(on_disk) if on_disk.trim() == entry.version => {}
            Ok(on_disk) => issues.push(HealthIssue::VersionMismatch {
                short_id: short_id.clone(),
                recorded: entry.version.clone(),
                on_disk: on_disk.trim().to_string(),
            }),
            Err(err) if err.kind() == io::ErrorKind::NotFound => {
                issues.push(HealthIssue::MissingVersionSidecar {
                    short_id: short_id.clone(),
                    path: sidecar,
                })
            }
            Err(err) => {
                return Err(JamError::io(
                    format!("failed to read {}", sidecar.display()),
                    err,
                ))
            }
        }
    }

    debug!(
        "checked {} index entries, {} issue(s)",
        index.len(),
        issues.len()
    );
    Ok(issues)
}
