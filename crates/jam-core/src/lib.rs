mod app_id;
mod error;
mod manifest;
mod source;

pub use app_id::{is_valid_version, AppId};
pub use error::{ErrorKind, JamError, Result};
pub use manifest::{ApplicationKind, CliManifest, DesktopManifest, Manifest, MANIFEST_FILE_NAME};
pub use source::ReleaseSource;
