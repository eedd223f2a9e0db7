use super::*;
use std::collections::HashMap;
use std::path::{Path, PathBuf};

use clap::error::ErrorKind;
use jam_core::{ApplicationKind, JamError};
use jam_installer::{CleanupPolicy, FailurePolicy, IndexEntry, OperationReport, Outcome};
use jam_remote::DEFAULT_API_BASE_URL;

use crate::completion::write_completions_script;
use crate::config::{
    parse_config, resolve_config_path, resolve_settings, CliOverrides, ConfigFile,
};
use crate::render::{
    format_info_lines, format_list_lines, format_report_line, format_stale_warning,
    render_failure_line, render_status_line, resolve_output_style, resolve_spinner_enabled,
    OutputStyle,
};

fn app(raw: &str) -> AppId {
    AppId::parse(raw).expect("must parse app id")
}

fn report(outcome: Outcome) -> OperationReport {
    OperationReport {
        short_id: "acme.tool".to_string(),
        outcome,
        kind: Some(ApplicationKind::Cli),
        version: Some("2.0.0".to_string()),
        previous_version: None,
        latest_version: Some("2.0.0".to_string()),
        package_dir: None,
        pruned_dir: None,
    }
}

fn env_from(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
    let values = pairs
        .iter()
        .map(|(key, value)| (key.to_string(), value.to_string()))
        .collect::<HashMap<_, _>>();
    move |name: &str| values.get(name).cloned()
}

#[test]
fn cli_parses_install_with_multiple_ids() {
    let cli = Cli::try_parse_from(["jam", "install", "acme.tool@1.0.0", "acme.viewer"])
        .expect("command must parse");
    match cli.command {
        Commands::Install {
            apps,
            prune_previous,
            fail_fast,
        } => {
            assert_eq!(apps, vec![app("acme.tool@1.0.0"), app("acme.viewer")]);
            assert!(!prune_previous);
            assert!(!fail_fast);
        }
        other => panic!("unexpected command: {other:?}"),
    }
}

#[test]
fn cli_accepts_command_aliases() {
    let cli = Cli::try_parse_from(["jam", "i", "acme.tool", "--prune-previous"])
        .expect("install alias must parse");
    assert!(matches!(
        cli.command,
        Commands::Install {
            prune_previous: true,
            ..
        }
    ));

    let cli = Cli::try_parse_from(["jam", "rm", "acme.tool", "--fail-fast"])
        .expect("remove alias must parse");
    assert!(matches!(
        cli.command,
        Commands::Remove {
            fail_fast: true,
            ..
        }
    ));
}

#[test]
fn cli_rejects_install_without_ids() {
    let err = Cli::try_parse_from(["jam", "install"]).expect_err("ids are required");
    assert_eq!(err.kind(), ErrorKind::MissingRequiredArgument);
    assert_eq!(err.exit_code(), 2);

    let err = Cli::try_parse_from(["jam", "remove"]).expect_err("ids are required");
    assert_eq!(err.kind(), ErrorKind::MissingRequiredArgument);
}

#[test]
fn cli_rejects_malformed_ids_as_usage_errors() {
    let err = Cli::try_parse_from(["jam", "install", "noowner"]).expect_err("must reject id");
    assert_eq!(err.kind(), ErrorKind::ValueValidation);
    assert_eq!(err.exit_code(), 2);
    assert!(err.to_string().contains("improperly formatted application id"));
}

#[test]
fn cli_rejects_unknown_command() {
    let err = Cli::try_parse_from(["jam", "frobnicate"]).expect_err("must reject command");
    assert_eq!(err.kind(), ErrorKind::InvalidSubcommand);
    assert_eq!(err.exit_code(), 2);
}

#[test]
fn cli_help_exits_successfully() {
    let err = Cli::try_parse_from(["jam", "--help"]).expect_err("help short-circuits");
    assert_eq!(err.kind(), ErrorKind::DisplayHelp);
    assert_eq!(err.exit_code(), 0);
}

#[test]
fn cli_parses_global_flags_and_optional_upgrade_ids() {
    let cli = Cli::try_parse_from(["jam", "-vv", "upgrade", "--root", "/opt/apps"])
        .expect("command must parse");
    assert_eq!(cli.verbose, 2);
    assert_eq!(cli.root.as_deref(), Some(Path::new("/opt/apps")));
    match cli.command {
        Commands::Upgrade { apps, .. } => assert!(apps.is_empty()),
        other => panic!("unexpected command: {other:?}"),
    }
}

#[test]
fn resolve_output_style_follows_stdout() {
    assert_eq!(resolve_output_style(true), OutputStyle::Rich);
    assert_eq!(resolve_output_style(false), OutputStyle::Plain);
}

#[test]
fn resolve_spinner_enabled_requires_rich_output_and_stderr_tty() {
    assert!(resolve_spinner_enabled(OutputStyle::Rich, true));
    assert!(!resolve_spinner_enabled(OutputStyle::Rich, false));
    assert!(!resolve_spinner_enabled(OutputStyle::Plain, true));
}

#[test]
fn render_status_line_plain_is_unadorned() {
    assert_eq!(
        render_status_line(OutputStyle::Plain, "ok", "installed acme.tool 1.0.0 (cli)"),
        "installed acme.tool 1.0.0 (cli)"
    );
}

#[test]
fn render_status_line_rich_includes_ascii_badge() {
    assert_eq!(
        render_status_line(OutputStyle::Rich, "ok", "installed acme.tool 1.0.0 (cli)"),
        "[OK] installed acme.tool 1.0.0 (cli)"
    );
    assert_eq!(
        render_status_line(OutputStyle::Rich, "warn", "acme.tool is stale"),
        "[WARN] acme.tool is stale"
    );
    assert_eq!(
        render_status_line(OutputStyle::Rich, "step", "acme.tool is not installed"),
        "[..] acme.tool is not installed"
    );
}

#[test]
fn render_failure_line_names_the_identifier() {
    let err = JamError::VersionNotFound {
        app: "acme.tool".to_string(),
        version: "9.9.9".to_string(),
    };
    assert_eq!(
        render_failure_line(OutputStyle::Rich, "acme.tool@9.9.9", &err),
        "[ERR] acme.tool@9.9.9: version 9.9.9 of application acme.tool does not exist"
    );
    assert_eq!(
        render_failure_line(OutputStyle::Plain, "acme.tool@9.9.9", &err),
        "error: acme.tool@9.9.9: version 9.9.9 of application acme.tool does not exist"
    );
}

#[test]
fn format_report_line_describes_each_outcome() {
    assert_eq!(
        format_report_line(&report(Outcome::Installed)),
        "installed acme.tool 2.0.0 (cli)"
    );

    let mut updated = report(Outcome::Updated);
    updated.previous_version = Some("1.0.0".to_string());
    assert_eq!(
        format_report_line(&updated),
        "updated acme.tool 1.0.0 -> 2.0.0 (cli)"
    );

    assert_eq!(
        format_report_line(&report(Outcome::Skipped)),
        "acme.tool 2.0.0 is already installed"
    );
    assert_eq!(
        format_report_line(&report(Outcome::Removed)),
        "removed acme.tool 2.0.0 (cli)"
    );

    let mut missing = report(Outcome::Skipped);
    missing.version = None;
    assert_eq!(format_report_line(&missing), "acme.tool is not installed");
}

#[test]
fn format_stale_warning_only_for_older_versions() {
    let current = report(Outcome::Installed);
    assert!(format_stale_warning(&app("acme.tool"), &current).is_none());

    let mut stale = report(Outcome::Installed);
    stale.version = Some("1.0.0".to_string());
    let warning =
        format_stale_warning(&app("acme.tool@1.0.0"), &stale).expect("must warn when stale");
    assert_eq!(
        warning,
        "acme.tool 1.0.0 is not the latest version (latest is 2.0.0); install acme.tool to get it"
    );
}

#[test]
fn format_list_lines_renders_entries_or_placeholder() {
    let empty: Vec<(&String, &IndexEntry)> = Vec::new();
    assert_eq!(format_list_lines(empty), vec!["No installed applications"]);

    let short_id = "acme.tool".to_string();
    let entry = IndexEntry {
        kind: ApplicationKind::Cli,
        version: "1.0.0".to_string(),
    };
    assert_eq!(
        format_list_lines(vec![(&short_id, &entry)]),
        vec!["acme.tool 1.0.0 (cli)"]
    );
}

#[test]
fn format_info_lines_includes_manifest_details_when_present() {
    let entry = IndexEntry {
        kind: ApplicationKind::Desktop,
        version: "0.3.0".to_string(),
    };
    let lines = format_info_lines(
        "acme.viewer",
        &entry,
        Path::new("/Applications/_desktop/acme.viewer@0.3.0"),
        Some("Viewer"),
        None,
    );
    assert_eq!(
        lines,
        vec![
            "Application: acme.viewer",
            "Version: 0.3.0",
            "Kind: desktop",
            "Path: /Applications/_desktop/acme.viewer@0.3.0",
            "Title: Viewer",
        ]
    );
}

#[test]
fn parse_config_reads_all_keys() {
    let config = parse_config(
        r#"
applications_root = "/opt/Applications"
shell_alias_file = "/home/dev/.shell.alias"
api_base_url = "https://github.example.test/api/v3"
token = "secret"
prune_previous_versions = true
fail_fast = true
"#,
    )
    .expect("config must parse");
    assert_eq!(
        config,
        ConfigFile {
            applications_root: Some(PathBuf::from("/opt/Applications")),
            shell_alias_file: Some(PathBuf::from("/home/dev/.shell.alias")),
            api_base_url: Some("https://github.example.test/api/v3".to_string()),
            token: Some("secret".to_string()),
            prune_previous_versions: Some(true),
            fail_fast: Some(true),
        }
    );
}

#[test]
fn parse_config_rejects_unknown_keys() {
    let err = parse_config("registry = \"x\"\n").expect_err("unknown key must fail");
    assert!(err.to_string().contains("invalid configuration"));
}

#[test]
fn resolve_config_path_prefers_explicit_then_env_then_xdg_then_home() {
    let env = env_from(&[
        ("JAM_CONFIG", "/etc/jam.toml"),
        ("XDG_CONFIG_HOME", "/home/dev/.xdg"),
        ("HOME", "/home/dev"),
    ]);
    assert_eq!(
        resolve_config_path(Some(Path::new("/tmp/explicit.toml")), &env),
        Some((PathBuf::from("/tmp/explicit.toml"), true))
    );
    assert_eq!(
        resolve_config_path(None, &env),
        Some((PathBuf::from("/etc/jam.toml"), true))
    );

    let env = env_from(&[("XDG_CONFIG_HOME", "/home/dev/.xdg"), ("HOME", "/home/dev")]);
    assert_eq!(
        resolve_config_path(None, &env),
        Some((PathBuf::from("/home/dev/.xdg/jam/config.toml"), false))
    );

    let env = env_from(&[("HOME", "/home/dev")]);
    assert_eq!(
        resolve_config_path(None, &env),
        Some((PathBuf::from("/home/dev/.config/jam/config.toml"), false))
    );

    assert_eq!(resolve_config_path(None, &env_from(&[])), None);
}

#[test]
fn resolve_settings_defaults() {
    let settings = resolve_settings(
        ConfigFile::default(),
        None,
        &env_from(&[]),
        &CliOverrides::default(),
        Path::new("/work"),
    );
    assert_eq!(settings.applications_root, PathBuf::from("/Applications"));
    assert_eq!(settings.shell_alias_file, PathBuf::from("/work/.shell.alias"));
    assert_eq!(settings.api_base_url, DEFAULT_API_BASE_URL);
    assert_eq!(settings.token, None);
    assert_eq!(settings.cleanup, CleanupPolicy::KeepPrevious);
    assert_eq!(settings.failure_policy, FailurePolicy::Continue);
}

#[test]
fn resolve_settings_layers_file_env_and_flags() {
    let file = ConfigFile {
        applications_root: Some(PathBuf::from("/from/file")),
        api_base_url: Some("https://file.example.test".to_string()),
        token: Some("file-token".to_string()),
        ..ConfigFile::default()
    };
    let env = env_from(&[
        ("JAM_APPLICATIONS_ROOT", "/from/env"),
        ("GITHUB_TOKEN", "gh-token"),
    ]);

    let settings = resolve_settings(
        file.clone(),
        None,
        &env,
        &CliOverrides::default(),
        Path::new("/work"),
    );
    assert_eq!(settings.applications_root, PathBuf::from("/from/env"));
    assert_eq!(settings.api_base_url, "https://file.example.test");
    assert_eq!(settings.token.as_deref(), Some("gh-token"));

    let env = env_from(&[("JAM_TOKEN", "jam-token"), ("GITHUB_TOKEN", "gh-token")]);
    let overrides = CliOverrides {
        root: Some(PathBuf::from("apps")),
        prune_previous: true,
        fail_fast: true,
    };
    let settings = resolve_settings(file, None, &env, &overrides, Path::new("/work"));
    assert_eq!(settings.applications_root, PathBuf::from("/work/apps"));
    assert_eq!(settings.token.as_deref(), Some("jam-token"));
    assert_eq!(settings.cleanup, CleanupPolicy::RemovePrevious);
    assert_eq!(settings.failure_policy, FailurePolicy::FailFast);
}

#[test]
fn resolve_settings_ignores_blank_token() {
    let file = ConfigFile {
        token: Some("   ".to_string()),
        ..ConfigFile::default()
    };
    let settings = resolve_settings(
        file,
        None,
        &env_from(&[("JAM_TOKEN", "")]),
        &CliOverrides::default(),
        Path::new("/work"),
    );
    assert_eq!(settings.token, None);
}

#[test]
fn settings_layout_uses_resolved_paths() {
    let settings = resolve_settings(
        ConfigFile::default(),
        None,
        &env_from(&[]),
        &CliOverrides {
            root: Some(PathBuf::from("/opt/apps")),
            ..CliOverrides::default()
        },
        Path::new("/work"),
    );
    let layout = settings.layout();
    assert_eq!(layout.index_path(), PathBuf::from("/opt/apps/index.json"));
    assert_eq!(layout.shell_alias_path(), Path::new("/work/.shell.alias"));
}

#[test]
fn completions_script_names_the_binary() {
    let mut generated = Vec::new();
    write_completions_script(clap_complete::Shell::Bash, &mut generated)
        .expect("must write completions");
    let script = String::from_utf8(generated).expect("script must be utf-8");
    assert!(script.contains("jam"));
    assert!(script.contains("install"));
}
