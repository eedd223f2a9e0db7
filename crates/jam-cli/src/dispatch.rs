use std::process::ExitCode;

use anyhow::{Context, Result};
use jam_core::{AppId, JamError};
use jam_installer::{
    check_installation, read_local_manifest, run_batch, ApplicationsLayout, BatchRun,
    FailurePolicy, IndexStore, Lifecycle, LifecycleOptions, OperationReport,
};
use jam_remote::GitHubSource;
use log::debug;

use crate::completion::write_completions_script;
use crate::config::{load_settings, CliOverrides, Settings};
use crate::render::{
    format_info_lines, format_list_lines, format_report_line, format_stale_warning,
    outcome_status, TerminalRenderer,
};
use crate::{Cli, Commands};

pub(crate) fn run_cli(cli: Cli) -> Result<ExitCode> {
    let mut overrides = CliOverrides {
        root: cli.root.clone(),
        ..CliOverrides::default()
    };
    match &cli.command {
        Commands::Install {
            prune_previous,
            fail_fast,
            ..
        }
        | Commands::Upgrade {
            prune_previous,
            fail_fast,
            ..
        } => {
            overrides.prune_previous = *prune_previous;
            overrides.fail_fast = *fail_fast;
        }
        Commands::Remove { fail_fast, .. } => overrides.fail_fast = *fail_fast,
        _ => {}
    }

    let renderer = TerminalRenderer::current();
    match cli.command {
        Commands::Completions { shell } => {
            let mut stdout = std::io::stdout();
            write_completions_script(shell, &mut stdout)?;
            Ok(ExitCode::SUCCESS)
        }
        Commands::Version => {
            println!("jam {}", env!("CARGO_PKG_VERSION"));
            Ok(ExitCode::SUCCESS)
        }
        command => {
            let settings = load_settings(cli.config.as_deref(), &overrides)?;
            debug!(
                "applications root {}, api {}",
                settings.applications_root.display(),
                settings.api_base_url
            );
            run_with_settings(command, &settings, renderer)
        }
    }
}

fn run_with_settings(
    command: Commands,
    settings: &Settings,
    renderer: TerminalRenderer,
) -> Result<ExitCode> {
    let layout = settings.layout();
    let options = LifecycleOptions {
        cleanup: settings.cleanup,
    };

    match command {
        Commands::Install { apps, .. } => {
            let source = build_source(settings)?;
            let lifecycle = Lifecycle::new(&layout, &source).with_options(options);
            let run = run_with_progress(
                renderer,
                "installing",
                &apps,
                settings.failure_policy,
                |app| lifecycle.install(app),
            );
            Ok(finish_batch(renderer, &run))
        }
        Commands::Remove { apps, .. } => {
            let source = build_source(settings)?;
            let lifecycle = Lifecycle::new(&layout, &source).with_options(options);
            let run = run_with_progress(
                renderer,
                "removing",
                &apps,
                settings.failure_policy,
                |app| lifecycle.remove(app),
            );
            Ok(finish_batch(renderer, &run))
        }
        Commands::Upgrade { apps, .. } => {
            let source = build_source(settings)?;
            let lifecycle = Lifecycle::new(&layout, &source).with_options(options);
            let targets = if apps.is_empty() {
                lifecycle.upgrade_targets()?
            } else {
                apps
            };
            let run = run_with_progress(
                renderer,
                "upgrading",
                &targets,
                settings.failure_policy,
                |app| lifecycle.upgrade(app),
            );
            Ok(finish_batch(renderer, &run))
        }
        Commands::List => {
            let index = IndexStore::new(layout.index_path()).load()?;
            renderer.print_lines(&format_list_lines(index.iter()));
            Ok(ExitCode::SUCCESS)
        }
        Commands::Info { app } => run_info(&layout, &app, renderer),
        Commands::Doctor => run_doctor(settings, &layout, renderer),
        Commands::Completions { .. } | Commands::Version => Ok(ExitCode::SUCCESS),
    }
}

fn build_source(settings: &Settings) -> Result<GitHubSource> {
    GitHubSource::new(settings.api_base_url.clone(), settings.token.clone())
        .context("failed to initialize the release source")
}

fn run_with_progress<Op>(
    renderer: TerminalRenderer,
    verb: &str,
    apps: &[AppId],
    policy: FailurePolicy,
    mut op: Op,
) -> BatchRun
where
    Op: FnMut(&AppId) -> Result<OperationReport, JamError>,
{
    run_batch(
        apps,
        policy,
        |app| {
            let spinner = renderer.start_spinner(&format!("{verb} {app}"));
            let result = op(app);
            spinner.finish();
            result
        },
        |app, result| match result {
            Ok(report) => {
                if let Some(warning) = format_stale_warning(app, report) {
                    renderer.print_warning(&warning);
                }
                renderer.print_status(outcome_status(report.outcome), &format_report_line(report));
            }
            Err(err) => renderer.print_failure(&app.to_string(), err),
        },
    )
}

fn finish_batch(renderer: TerminalRenderer, run: &BatchRun) -> ExitCode {
    if run.unattempted > 0 {
        renderer.print_warning(&format!(
            "stopped after the first failure; {} application(s) not attempted",
            run.unattempted
        ));
    }
    if run.summary.has_failures() {
        renderer.print_status("err", &run.render_summary());
        ExitCode::FAILURE
    } else {
        renderer.print_status("ok", &run.render_summary());
        ExitCode::SUCCESS
    }
}

fn run_info(
    layout: &ApplicationsLayout,
    app: &AppId,
    renderer: TerminalRenderer,
) -> Result<ExitCode> {
    let index = IndexStore::new(layout.index_path()).load()?;
    let short_id = app.short_id();
    let Some(entry) = index.get(&short_id) else {
        renderer.print_status("step", &format!("{short_id} is not installed"));
        return Ok(ExitCode::FAILURE);
    };

    let package_dir = layout.package_dir(entry.kind, &short_id, &entry.version);
    let manifest = read_local_manifest(layout, entry.kind, &short_id, &entry.version)
        .unwrap_or_else(|err| {
            renderer.print_warning(&format!("{short_id}: {err}"));
            None
        });
    renderer.print_lines(&format_info_lines(
        &short_id,
        entry,
        &package_dir,
        manifest.as_ref().map(|manifest| manifest.title()),
        manifest.as_ref().map(|manifest| manifest.description()),
    ));
    Ok(ExitCode::SUCCESS)
}

fn run_doctor(
    settings: &Settings,
    layout: &ApplicationsLayout,
    renderer: TerminalRenderer,
) -> Result<ExitCode> {
    let config = settings
        .config_path
        .as_ref()
        .map(|path| path.display().to_string())
        .unwrap_or_else(|| "(none)".to_string());
    renderer.print_lines(&[
        format!("config: {config}"),
        format!("root: {}", layout.root().display()),
        format!("index: {}", layout.index_path().display()),
        format!(
            "contributions: {}",
            layout.contributions_aggregator_path().display()
        ),
        format!("shell alias: {}", layout.shell_alias_path().display()),
        format!("api: {}", settings.api_base_url),
    ]);

    let index = IndexStore::new(layout.index_path()).load()?;
    let issues = check_installation(layout, &index)?;
    if issues.is_empty() {
        renderer.print_status(
            "ok",
            &format!("{} application(s) checked, no issues", index.len()),
        );
        return Ok(ExitCode::SUCCESS);
    }
    for issue in &issues {
        renderer.print_warning(&issue.to_string());
    }
    renderer.print_status("err", &format!("{} issue(s) found", issues.len()));
    Ok(ExitCode::FAILURE)
}
