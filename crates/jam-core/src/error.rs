use std::io;
use std::path::PathBuf;

use thiserror::Error;

pub type Result<T, E = JamError> = std::result::Result<T, E>;

/// Failure kinds for a single application operation.
///
/// None of these are retried; each one ends the operation for the affected
/// application.
#[derive(Debug, Error)]
pub enum JamError {
    #[error("improperly formatted application id '{raw}' (expected owner.package or owner.package@version)")]
    MalformedIdentifier { raw: String },

    #[error("cannot download {owner}.{package} (HTTP {status}): the repository is private or does not exist")]
    AuthorizationDenied {
        owner: String,
        package: String,
        status: u16,
    },

    #[error("failed to ping application repository: {message}")]
    RepositoryQueryFailed { message: String },

    #[error("application is not properly configured; failed to fetch explanation.json: {message}")]
    ManifestFetchFailed { message: String },

    #[error("failed to parse application explanation file: {reason}")]
    ManifestParseFailed { reason: String },

    #[error("version {version} of application {app} does not exist")]
    VersionNotFound { app: String, version: String },

    #[error("error downloading application: {body}")]
    ArchiveFetchFailed { body: String },

    #[error("application archive is corrupt: {reason}")]
    CorruptArchive { reason: String },

    #[error("failed to write {}: {source}", .path.display())]
    ExtractionIo { path: PathBuf, source: io::Error },

    #[error("applications index is corrupt: {} ({reason})", .path.display())]
    IndexCorrupt { path: PathBuf, reason: String },

    #[error("{message}")]
    Usage { message: String },

    #[error("{context}: {source}")]
    Io { context: String, source: io::Error },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    MalformedIdentifier,
    AuthorizationDenied,
    RepositoryQueryFailed,
    ManifestFetchFailed,
    ManifestParseFailed,
    VersionNotFound,
    ArchiveFetchFailed,
    CorruptArchive,
    ExtractionIo,
    IndexCorrupt,
    Usage,
    Io,
}

impl JamError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::MalformedIdentifier { .. } => ErrorKind::MalformedIdentifier,
            Self::AuthorizationDenied { .. } => ErrorKind::AuthorizationDenied,
            Self::RepositoryQueryFailed { .. } => ErrorKind::RepositoryQueryFailed,
            Self::ManifestFetchFailed { .. } => ErrorKind::ManifestFetchFailed,
            Self::ManifestParseFailed { .. } => ErrorKind::ManifestParseFailed,
            Self::VersionNotFound { .. } => ErrorKind::VersionNotFound,
            Self::ArchiveFetchFailed { .. } => ErrorKind::ArchiveFetchFailed,
            Self::CorruptArchive { .. } => ErrorKind::CorruptArchive,
            Self::ExtractionIo { .. } => ErrorKind::ExtractionIo,
            Self::IndexCorrupt { .. } => ErrorKind::IndexCorrupt,
            Self::Usage { .. } => ErrorKind::Usage,
            Self::Io { .. } => ErrorKind::Io,
        }
    }

    pub fn io(context: impl Into<String>, source: io::Error) -> Self {
        Self::Io {
            context: context.into(),
            source,
        }
    }
}
