use base64::engine::general_purpose::STANDARD;
use base64::Engine as _;
use jam_core::{JamError, Manifest, ReleaseSource, Result, MANIFEST_FILE_NAME};
use log::debug;
use reqwest::blocking::{Client, RequestBuilder, Response};
use reqwest::header::ACCEPT;
use reqwest::StatusCode;
use serde::Deserialize;

pub const DEFAULT_API_BASE_URL: &str = "https://api.github.com";

const USER_AGENT: &str = concat!("jam/", env!("CARGO_PKG_VERSION"));

/// [`ReleaseSource`] backed by the GitHub REST API, or anything that speaks
/// the same three endpoints.
#[derive(Debug, Clone)]
pub struct GitHubSource {
    client: Client,
    base_url: String,
    token: Option<String>,
}

#[derive(Debug, Deserialize)]
struct LatestRelease {
    name: Option<String>,
    tag_name: Option<String>,
}

#[derive(Debug, Deserialize)]
struct FileContents {
    content: String,
    encoding: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ApiErrorBody {
    message: String,
}

impl GitHubSource {
    pub fn new(base_url: impl Into<String>, token: Option<String>) -> Result<Self> {
        let client = Client::builder()
            .user_agent(USER_AGENT)
            .build()
            .map_err(|err| JamError::RepositoryQueryFailed {
                message: format!("failed to build HTTP client: {err}"),
            })?;

        let base_url = base_url.into().trim_end_matches('/').to_string();
        let token = token.filter(|value| !value.trim().is_empty());
        Ok(Self {
            client,
            base_url,
            token,
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn has_token(&self) -> bool {
        self.token.is_some()
    }

    pub fn latest_release_url(&self, owner: &str, package: &str) -> String {
        format!("{}/repos/{owner}/{package}/releases/latest", self.base_url)
    }

    pub fn manifest_url(&self, owner: &str, package: &str) -> String {
        format!(
            "{}/repos/{owner}/{package}/contents/{MANIFEST_FILE_NAME}",
            self.base_url
        )
    }

    pub fn archive_url(&self, owner: &str, package: &str, version: &str) -> String {
        format!("{}/repos/{owner}/{package}/zipball/{version}", self.base_url)
    }

    fn get(&self, url: &str) -> RequestBuilder {
        let request = self
            .client
            .get(url)
            .header(ACCEPT, "application/vnd.github+json");
        match &self.token {
            Some(token) => request.bearer_auth(token),
            None => request,
        }
    }
}

impl ReleaseSource for GitHubSource {
    fn latest_release(&self, owner: &str, package: &str) -> Result<String> {
        let url = self.latest_release_url(owner, package);
        debug!("GET {url}");
        let query_failed = |err: reqwest::Error| JamError::RepositoryQueryFailed {
            message: err.to_string(),
        };

        let response = self.get(&url).send().map_err(query_failed)?;
        let status = response.status();
        let body = response.text().map_err(query_failed)?;

        if !status.is_success() {
            if matches!(
                status,
                StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN | StatusCode::NOT_FOUND
            ) {
                return Err(JamError::AuthorizationDenied {
                    owner: owner.to_string(),
                    package: package.to_string(),
                    status: status.as_u16(),
                });
            }
            return Err(JamError::RepositoryQueryFailed {
                message: error_message(status, &body),
            });
        }

        parse_latest_release_name(&body)
    }

    fn fetch_manifest(&self, owner: &str, package: &str, version: &str) -> Result<Manifest> {
        let url = self.manifest_url(owner, package);
        debug!("GET {url}?ref={version}");
        let fetch_failed = |err: reqwest::Error| JamError::ManifestFetchFailed {
            message: err.to_string(),
        };

        let response = self
            .get(&url)
            .query(&[("ref", version)])
            .send()
            .map_err(fetch_failed)?;
        let status = response.status();
        let body = response.text().map_err(fetch_failed)?;

        if !status.is_success() {
            return Err(JamError::ManifestFetchFailed {
                message: error_message(status, &body),
            });
        }

        let decoded = decode_file_contents(&body)?;
        Manifest::from_json_str(&decoded)
    }

    fn fetch_archive(&self, owner: &str, package: &str, version: &str) -> Result<Vec<u8>> {
        let url = self.archive_url(owner, package, version);
        debug!("GET {url}");
        let fetch_failed = |err: reqwest::Error| JamError::ArchiveFetchFailed {
            body: err.to_string(),
        };

        let response: Response = self.get(&url).send().map_err(fetch_failed)?;
        let status = response.status();
        if status == StatusCode::NOT_FOUND {
            return Err(JamError::VersionNotFound {
                app: format!("{owner}.{package}"),
                version: version.to_string(),
            });
        }
        if !status.is_success() {
            let body = response.text().map_err(fetch_failed)?;
            return Err(JamError::ArchiveFetchFailed {
                body: if body.trim().is_empty() {
                    status.to_string()
                } else {
                    body
                },
            });
        }

        let bytes = response.bytes().map_err(fetch_failed)?;
        debug!("downloaded {} archive bytes for {owner}.{package}@{version}", bytes.len());
        Ok(bytes.to_vec())
    }
}

pub(crate) fn parse_latest_release_name(body: &str) -> Result<String> {
    let release: LatestRelease =
        serde_json::from_str(body).map_err(|err| JamError::RepositoryQueryFailed {
            message: format!("unexpected latest release response: {err}"),
        })?;

    release
        .name
        .filter(|name| !name.trim().is_empty())
        .or(release.tag_name.filter(|tag| !tag.trim().is_empty()))
        .ok_or_else(|| JamError::RepositoryQueryFailed {
            message: "latest release has neither a name nor a tag".to_string(),
        })
}

pub(crate) fn decode_file_contents(body: &str) -> Result<String> {
    let contents: FileContents =
        serde_json::from_str(body).map_err(|err| JamError::ManifestFetchFailed {
            message: format!("unexpected file contents response: {err}"),
        })?;
    if let Some(encoding) = contents.encoding.as_deref() {
        if encoding != "base64" {
            return Err(JamError::ManifestParseFailed {
                reason: format!("unsupported content encoding '{encoding}'"),
            });
        }
    }

    let compact: String = contents
        .content
        .chars()
        .filter(|ch| !ch.is_ascii_whitespace())
        .collect();
    let bytes = STANDARD
        .decode(compact.as_bytes())
        .map_err(|err| JamError::ManifestParseFailed {
            reason: format!("content is not valid base64: {err}"),
        })?;
    String::from_utf8(bytes).map_err(|err| JamError::ManifestParseFailed {
        reason: format!("content is not valid UTF-8: {err}"),
    })
}

/// `message` of a JSON error body, else the raw body, else the status line.
pub(crate) fn error_message(status: StatusCode, body: &str) -> String {
    if let Ok(parsed) = serde_json::from_str::<ApiErrorBody>(body) {
        if !parsed.message.trim().is_empty() {
            return parsed.message;
        }
    }
    let trimmed = body.trim();
    if trimmed.is_empty() {
        status.to_string()
    } else {
        trimmed.to_string()
    }
}
