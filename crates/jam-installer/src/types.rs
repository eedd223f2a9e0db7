use std::fmt;
use std::path::PathBuf;

use jam_core::ApplicationKind;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Outcome {
    Installed,
    Updated,
    Skipped,
    Removed,
}

impl Outcome {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Installed => "installed",
            Self::Updated => "updated",
            Self::Skipped => "skipped",
            Self::Removed => "removed",
        }
    }
}

impl fmt::Display for Outcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// What a single lifecycle operation did to one application.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OperationReport {
    pub short_id: String,
    pub outcome: Outcome,
    /// `None` when the application was neither installed nor resolved.
    pub kind: Option<ApplicationKind>,
    pub version: Option<String>,
    pub previous_version: Option<String>,
    /// Latest published release, when it was resolved.
    pub latest_version: Option<String>,
    pub package_dir: Option<PathBuf>,
    pub pruned_dir: Option<PathBuf>,
}

impl OperationReport {
    pub(crate) fn new(short_id: impl Into<String>, outcome: Outcome) -> Self {
        Self {
            short_id: short_id.into(),
            outcome,
            kind: None,
            version: None,
            previous_version: None,
            latest_version: None,
            package_dir: None,
            pruned_dir: None,
        }
    }

    /// The latest release, when the operation targeted an older one.
    pub fn stale_latest(&self) -> Option<&str> {
        match (self.version.as_deref(), self.latest_version.as_deref()) {
            (Some(version), Some(latest)) if version != latest => Some(latest),
            _ => None,
        }
    }
}

/// What to do with the previous version's tree after an update.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CleanupPolicy {
    #[default]
    KeepPrevious,
    RemovePrevious,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum FailurePolicy {
    /// Attempt every identifier and report failures at the end.
    #[default]
    Continue,
    FailFast,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct LifecycleOptions {
    pub cleanup: CleanupPolicy,
}
