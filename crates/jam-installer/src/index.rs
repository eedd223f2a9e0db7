use std::collections::btree_map;
use std::collections::BTreeMap;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use jam_core::{is_valid_version, ApplicationKind, JamError, Result};
use serde::{Deserialize, Serialize};

use crate::fs_utils::write_file_replacing;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct IndexEntry {
    #[serde(rename = "type")]
    pub kind: ApplicationKind,
    pub version: String,
}

/// Installed applications keyed by short id. The only persisted record of
/// what is installed.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(transparent)]
pub struct ApplicationIndex {
    entries: BTreeMap<String, IndexEntry>,
}

impl ApplicationIndex {
    pub fn get(&self, short_id: &str) -> Option<&IndexEntry> {
        self.entries.get(short_id)
    }

    /// Replaces any existing entry and returns it.
    pub fn insert(&mut self, short_id: impl Into<String>, entry: IndexEntry) -> Option<IndexEntry> {
        self.entries.insert(short_id.into(), entry)
    }

    pub fn remove(&mut self, short_id: &str) -> Option<IndexEntry> {
        self.entries.remove(short_id)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> btree_map::Iter<'_, String, IndexEntry> {
        self.entries.iter()
    }

    pub fn short_ids(&self) -> impl Iterator<Item = &str> {
        self.entries.keys().map(String::as_str)
    }
}

/// The index file on disk. Every operation loads, mutates and saves the
/// whole file; there is no cross-process locking.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IndexStore {
    path: PathBuf,
}

impl IndexStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// An absent file is an empty index.
    pub fn load(&self) -> Result<ApplicationIndex> {
        let raw = match fs::read_to_string(&self.path) {
            Ok(raw) => raw,
            Err(err) if err.kind() == io::ErrorKind::NotFound => {
                return Ok(ApplicationIndex::default())
            }
            Err(err) => {
                return Err(JamError::io(
                    format!("failed to read applications index: {}", self.path.display()),
                    err,
                ))
            }
        };
        parse_index(&raw).map_err(|reason| JamError::IndexCorrupt {
            path: self.path.clone(),
            reason,
        })
    }

    pub fn save(&self, index: &ApplicationIndex) -> Result<()> {
        let mut payload =
            serde_json::to_string_pretty(index).map_err(|err| JamError::IndexCorrupt {
                path: self.path.clone(),
                reason: format!("failed to serialize index: {err}"),
            })?;
        payload.push('\n');
        write_file_replacing(&self.path, payload.as_bytes())
    }
}

pub(crate) fn parse_index(raw: &str) -> std::result::Result<ApplicationIndex, String> {
    if raw.trim().is_empty() {
        return Err("index file is empty".to_string());
    }
    let index: ApplicationIndex = serde_json::from_str(raw).map_err(|err| err.to_string())?;
    for (short_id, entry) in index.iter() {
        if entry.version.trim().is_empty() {
            return Err(format!("entry '{short_id}' has an empty version"));
        }
        if !is_valid_version(&entry.version) {
            return Err(format!(
                "entry '{short_id}' has an unusable version '{}'",
                entry.version
            ));
        }
    }
    Ok(index)
}
