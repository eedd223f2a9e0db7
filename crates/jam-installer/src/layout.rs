use std::fs;
use std::path::{Path, PathBuf};

use jam_core::{ApplicationKind, JamError, Result};

pub const DEFAULT_APPLICATIONS_ROOT: &str = "/Applications";
pub const DEFAULT_SHELL_ALIAS_FILE: &str = ".shell.alias";

pub(crate) const VERSION_SIDECAR_FILE: &str = "__version";
const INDEX_FILE: &str = "index.json";
const CONTRIBUTIONS_AGGREGATOR_FILE: &str = "_shell-contributions.alias";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ApplicationsLayout {
    root: PathBuf,
    shell_alias_path: PathBuf,
}

impl ApplicationsLayout {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            shell_alias_path: PathBuf::from(DEFAULT_SHELL_ALIAS_FILE),
        }
    }

    pub fn with_shell_alias_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.shell_alias_path = path.into();
        self
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn index_path(&self) -> PathBuf {
        self.root.join(INDEX_FILE)
    }

    pub fn kind_dir(&self, kind: ApplicationKind) -> PathBuf {
        self.root.join(kind.subtree())
    }

    pub fn package_dir(&self, kind: ApplicationKind, short_id: &str, version: &str) -> PathBuf {
        self.kind_dir(kind).join(format!("{short_id}@{version}"))
    }

    pub fn version_sidecar_path(
        &self,
        kind: ApplicationKind,
        short_id: &str,
        version: &str,
    ) -> PathBuf {
        self.package_dir(kind, short_id, version)
            .join(VERSION_SIDECAR_FILE)
    }

    pub fn contributions_aggregator_path(&self) -> PathBuf {
        self.root.join(CONTRIBUTIONS_AGGREGATOR_FILE)
    }

    /// Root include file that pulls in the contributions aggregator.
    pub fn shell_alias_path(&self) -> &Path {
        &self.shell_alias_path
    }

    pub fn ensure_base_dirs(&self) -> Result<()> {
        for dir in [
            self.root.clone(),
            self.kind_dir(ApplicationKind::Cli),
            self.kind_dir(ApplicationKind::Desktop),
        ] {
            fs::create_dir_all(&dir).map_err(|source| {
                JamError::io(format!("failed to create {}", dir.display()), source)
            })?;
        }
        Ok(())
    }
}

impl Default for ApplicationsLayout {
    fn default() -> Self {
        Self::new(DEFAULT_APPLICATIONS_ROOT)
    }
}
