use std::path::{Component, Path};

use serde::{Deserialize, Serialize};

use crate::error::{JamError, Result};

/// Name of the descriptor file at the root of every application repository.
pub const MANIFEST_FILE_NAME: &str = "explanation.json";

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[serde(rename_all = "lowercase")]
pub enum ApplicationKind {
    Cli,
    Desktop,
}

impl ApplicationKind {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Cli => "cli",
            Self::Desktop => "desktop",
        }
    }

    /// Subtree of the applications root that holds packages of this kind.
    pub fn subtree(self) -> &'static str {
        match self {
            Self::Cli => "_cli",
            Self::Desktop => "_desktop",
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct CliManifest {
    pub title: String,
    pub description: String,
    pub shell_contributions_file: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct DesktopManifest {
    pub title: String,
    pub description: String,
    pub startup_file: String,
    pub app_icon: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum Manifest {
    Cli(CliManifest),
    Desktop(DesktopManifest),
}

impl Manifest {
    pub fn from_json_str(input: &str) -> Result<Self> {
        let manifest: Self =
            serde_json::from_str(input).map_err(|err| JamError::ManifestParseFailed {
                reason: err.to_string(),
            })?;

        if let Self::Cli(cli) = &manifest {
            validate_package_relative_path(&cli.shell_contributions_file).map_err(|reason| {
                JamError::ManifestParseFailed {
                    reason: format!("invalid shellContributionsFile: {reason}"),
                }
            })?;
        }
        Ok(manifest)
    }

    pub fn kind(&self) -> ApplicationKind {
        match self {
            Self::Cli(_) => ApplicationKind::Cli,
            Self::Desktop(_) => ApplicationKind::Desktop,
        }
    }

    pub fn title(&self) -> &str {
        match self {
            Self::Cli(cli) => &cli.title,
            Self::Desktop(desktop) => &desktop.title,
        }
    }

    pub fn description(&self) -> &str {
        match self {
            Self::Cli(cli) => &cli.description,
            Self::Desktop(desktop) => &desktop.description,
        }
    }
}

fn validate_package_relative_path(value: &str) -> std::result::Result<(), String> {
    if value.trim().is_empty() {
        return Err("path must not be empty".to_string());
    }
    let path = Path::new(value);
    for component in path.components() {
        match component {
            Component::Normal(_) | Component::CurDir => {}
            _ => return Err(format!("path must stay inside the package: {value}")),
        }
    }
    Ok(())
}
