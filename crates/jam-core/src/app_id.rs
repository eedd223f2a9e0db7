use std::fmt;
use std::str::FromStr;

use crate::error::{JamError, Result};

/// A parsed `owner.package[@version]` application identifier.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct AppId {
    owner: String,
    package: String,
    version: Option<String>,
}

impl AppId {
    /// Splits on the first `.` into owner and remainder, then the remainder on
    /// the first `@` into package and version. An empty version is treated as
    /// absent.
    pub fn parse(raw: &str) -> Result<Self> {
        let raw = raw.trim();
        let Some((owner, remainder)) = raw.split_once('.') else {
            return Err(malformed(raw));
        };
        if owner.is_empty() || remainder.is_empty() {
            return Err(malformed(raw));
        }

        let (package, version) = match remainder.split_once('@') {
            Some((package, version)) => (package, Some(version)),
            None => (remainder, None),
        };
        if package.is_empty() {
            return Err(malformed(raw));
        }
        if !is_valid_name(owner) || !is_valid_name(package) {
            return Err(malformed(raw));
        }

        let version = version.filter(|value| !value.is_empty());
        if let Some(version) = version {
            if !is_valid_version(version) {
                return Err(malformed(raw));
            }
        }

        Ok(Self {
            owner: owner.to_string(),
            package: package.to_string(),
            version: version.map(str::to_string),
        })
    }

    pub fn new(owner: &str, package: &str, version: Option<&str>) -> Result<Self> {
        let raw = match version {
            Some(version) => format!("{owner}.{package}@{version}"),
            None => format!("{owner}.{package}"),
        };
        let parsed = Self::parse(&raw)?;
        if parsed.owner != owner || parsed.package != package {
            return Err(malformed(&raw));
        }
        Ok(parsed)
    }

    pub fn owner(&self) -> &str {
        &self.owner
    }

    pub fn package(&self) -> &str {
        &self.package
    }

    pub fn version(&self) -> Option<&str> {
        self.version.as_deref()
    }

    /// Index key, independent of version.
    pub fn short_id(&self) -> String {
        format!("{}.{}", self.owner, self.package)
    }

    /// On-disk directory name for this application at `version`.
    pub fn long_id(&self, version: &str) -> String {
        format!("{}@{}", self.short_id(), version)
    }

    pub fn with_version(&self, version: &str) -> Self {
        Self {
            owner: self.owner.clone(),
            package: self.package.clone(),
            version: Some(version.to_string()),
        }
    }

    pub fn without_version(&self) -> Self {
        Self {
            owner: self.owner.clone(),
            package: self.package.clone(),
            version: None,
        }
    }
}

impl fmt::Display for AppId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.version {
            Some(version) => write!(f, "{}.{}@{}", self.owner, self.package, version),
            None => write!(f, "{}.{}", self.owner, self.package),
        }
    }
}

impl FromStr for AppId {
    type Err = JamError;

    fn from_str(s: &str) -> Result<Self> {
        Self::parse(s)
    }
}

fn malformed(raw: &str) -> JamError {
    JamError::MalformedIdentifier {
        raw: raw.to_string(),
    }
}

// Owner and package become URL path segments and directory names.
fn is_valid_name(value: &str) -> bool {
    value != ".."
        && value
            .chars()
            .all(|ch| ch.is_ascii_alphanumeric() || matches!(ch, '.' | '-' | '_'))
}

/// Whether `value` can name a release. Versions become directory names, so
/// path separators and `.`/`..` are refused.
pub fn is_valid_version(value: &str) -> bool {
    !value.is_empty()
        && value != "."
        && value != ".."
        && !value
            .chars()
            .any(|ch| ch.is_whitespace() || ch.is_control() || matches!(ch, '/' | '\\'))
}
