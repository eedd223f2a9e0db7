use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use jam_installer::{
    ApplicationsLayout, CleanupPolicy, FailurePolicy, DEFAULT_APPLICATIONS_ROOT,
    DEFAULT_SHELL_ALIAS_FILE,
};
use jam_remote::DEFAULT_API_BASE_URL;
use serde::Deserialize;

const CONFIG_ENV: &str = "JAM_CONFIG";
const ROOT_ENV: &str = "JAM_APPLICATIONS_ROOT";
const API_URL_ENV: &str = "JAM_API_URL";
const TOKEN_ENVS: [&str; 2] = ["JAM_TOKEN", "GITHUB_TOKEN"];

/// Contents of `config.toml`. Every key is optional.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub(crate) struct ConfigFile {
    pub(crate) applications_root: Option<PathBuf>,
    pub(crate) shell_alias_file: Option<PathBuf>,
    pub(crate) api_base_url: Option<String>,
    pub(crate) token: Option<String>,
    pub(crate) prune_previous_versions: Option<bool>,
    pub(crate) fail_fast: Option<bool>,
}

/// Values given on the command line; they win over everything else.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub(crate) struct CliOverrides {
    pub(crate) root: Option<PathBuf>,
    pub(crate) prune_previous: bool,
    pub(crate) fail_fast: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct Settings {
    pub(crate) config_path: Option<PathBuf>,
    pub(crate) applications_root: PathBuf,
    pub(crate) shell_alias_file: PathBuf,
    pub(crate) api_base_url: String,
    pub(crate) token: Option<String>,
    pub(crate) cleanup: CleanupPolicy,
    pub(crate) failure_policy: FailurePolicy,
}

impl Settings {
    pub(crate) fn layout(&self) -> ApplicationsLayout {
        ApplicationsLayout::new(self.applications_root.clone())
            .with_shell_alias_path(self.shell_alias_file.clone())
    }
}

pub(crate) fn parse_config(raw: &str) -> Result<ConfigFile> {
    toml::from_str(raw).context("invalid configuration")
}

/// Where to look for the configuration file, and whether it was asked for
/// explicitly. A missing explicit file is an error; a missing default is not.
pub(crate) fn resolve_config_path(
    explicit: Option<&Path>,
    env: &dyn Fn(&str) -> Option<String>,
) -> Option<(PathBuf, bool)> {
    if let Some(path) = explicit {
        return Some((path.to_path_buf(), true));
    }
    if let Some(path) = env(CONFIG_ENV).filter(|value| !value.trim().is_empty()) {
        return Some((PathBuf::from(path), true));
    }
    if let Some(xdg) = env("XDG_CONFIG_HOME").filter(|value| !value.trim().is_empty()) {
        return Some((PathBuf::from(xdg).join("jam").join("config.toml"), false));
    }
    env("HOME")
        .filter(|value| !value.trim().is_empty())
        .map(|home| {
            (
                PathBuf::from(home)
                    .join(".config")
                    .join("jam")
                    .join("config.toml"),
                false,
            )
        })
}

fn read_config_file(path: &Path, required: bool) -> Result<ConfigFile> {
    match fs::read_to_string(path) {
        Ok(raw) => parse_config(&raw).with_context(|| format!("failed to load {}", path.display())),
        Err(err) if err.kind() == io::ErrorKind::NotFound && !required => {
            Ok(ConfigFile::default())
        }
        Err(err) => {
            Err(err).with_context(|| format!("failed to read config file {}", path.display()))
        }
    }
}

/// Layers the configuration file, environment and command-line flags, in
/// increasing precedence, over the built-in defaults. Relative paths are
/// resolved against `cwd`.
pub(crate) fn resolve_settings(
    file: ConfigFile,
    config_path: Option<PathBuf>,
    env: &dyn Fn(&str) -> Option<String>,
    overrides: &CliOverrides,
    cwd: &Path,
) -> Settings {
    let non_blank = |name: &str| env(name).filter(|value| !value.trim().is_empty());

    let applications_root = overrides
        .root
        .clone()
        .or_else(|| non_blank(ROOT_ENV).map(PathBuf::from))
        .or(file.applications_root)
        .unwrap_or_else(|| PathBuf::from(DEFAULT_APPLICATIONS_ROOT));
    let shell_alias_file = file
        .shell_alias_file
        .unwrap_or_else(|| PathBuf::from(DEFAULT_SHELL_ALIAS_FILE));
    let api_base_url = non_blank(API_URL_ENV)
        .or(file.api_base_url)
        .unwrap_or_else(|| DEFAULT_API_BASE_URL.to_string());
    let token = TOKEN_ENVS
        .iter()
        .find_map(|name| non_blank(*name))
        .or(file.token)
        .filter(|token| !token.trim().is_empty());

    let cleanup = if overrides.prune_previous || file.prune_previous_versions.unwrap_or(false) {
        CleanupPolicy::RemovePrevious
    } else {
        CleanupPolicy::KeepPrevious
    };
    let failure_policy = if overrides.fail_fast || file.fail_fast.unwrap_or(false) {
        FailurePolicy::FailFast
    } else {
        FailurePolicy::Continue
    };

    Settings {
        config_path,
        applications_root: absolutize(cwd, applications_root),
        shell_alias_file: absolutize(cwd, shell_alias_file),
        api_base_url,
        token,
        cleanup,
        failure_policy,
    }
}

fn absolutize(cwd: &Path, path: PathBuf) -> PathBuf {
    if path.is_absolute() {
        path
    } else {
        cwd.join(path)
    }
}

pub(crate) fn load_settings(explicit: Option<&Path>, overrides: &CliOverrides) -> Result<Settings> {
    let env = |name: &str| std::env::var(name).ok();
    let (file, config_path) = match resolve_config_path(explicit, &env) {
        Some((path, required)) => {
            let file = read_config_file(&path, required)?;
            (file, Some(path))
        }
        None => (ConfigFile::default(), None),
    };
    let cwd = std::env::current_dir().context("failed to resolve the working directory")?;
    Ok(resolve_settings(file, config_path, &env, overrides, &cwd))
}
