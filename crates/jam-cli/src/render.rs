use std::io::IsTerminal;
use std::path::Path;
use std::time::Duration;

use anstyle::{AnsiColor, Effects, Style};
use indicatif::{ProgressBar, ProgressStyle};
use jam_core::{AppId, JamError};
use jam_installer::{IndexEntry, OperationReport, Outcome};

#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub(crate) enum OutputStyle {
    Plain,
    Rich,
}

pub(crate) fn resolve_output_style(stdout_is_tty: bool) -> OutputStyle {
    if stdout_is_tty {
        OutputStyle::Rich
    } else {
        OutputStyle::Plain
    }
}

/// The spinner draws on stderr, so it also needs stderr to be a terminal.
pub(crate) fn resolve_spinner_enabled(style: OutputStyle, stderr_is_tty: bool) -> bool {
    style == OutputStyle::Rich && stderr_is_tty
}

#[derive(Copy, Clone, Debug)]
pub(crate) struct TerminalRenderer {
    style: OutputStyle,
    spinner: bool,
}

pub(crate) struct TerminalSpinner {
    progress_bar: Option<ProgressBar>,
}

impl TerminalRenderer {
    pub(crate) fn current() -> Self {
        let style = resolve_output_style(std::io::stdout().is_terminal());
        Self {
            style,
            spinner: resolve_spinner_enabled(style, std::io::stderr().is_terminal()),
        }
    }

    pub(crate) fn print_status(self, status: &str, message: &str) {
        let line = render_status_line(self.style, status, message);
        println!("{}", paint_status_line(self.style, status, line));
    }

    pub(crate) fn print_warning(self, message: &str) {
        let line = render_status_line(self.style, "warn", message);
        eprintln!("{}", paint_status_line(self.style, "warn", line));
    }

    pub(crate) fn print_failure(self, subject: &str, err: &JamError) {
        let line = render_failure_line(self.style, subject, err);
        eprintln!("{}", paint_status_line(self.style, "err", line));
    }

    pub(crate) fn print_lines(self, lines: &[String]) {
        for line in lines {
            println!("{line}");
        }
    }

    /// Spinner on stderr while one application is being processed.
    pub(crate) fn start_spinner(self, message: &str) -> TerminalSpinner {
        if !self.spinner {
            return TerminalSpinner { progress_bar: None };
        }

        let progress_bar = ProgressBar::new_spinner();
        if let Ok(style) = ProgressStyle::with_template("{spinner:.cyan.bold} {msg} {elapsed}") {
            progress_bar.set_style(style.tick_chars(".oO@* "));
        }
        progress_bar.set_message(message.to_string());
        progress_bar.enable_steady_tick(Duration::from_millis(80));
        TerminalSpinner {
            progress_bar: Some(progress_bar),
        }
    }
}

impl TerminalSpinner {
    pub(crate) fn finish(mut self) {
        if let Some(progress_bar) = self.progress_bar.take() {
            progress_bar.finish_and_clear();
        }
    }
}

pub(crate) fn render_status_line(style: OutputStyle, status: &str, message: &str) -> String {
    match style {
        OutputStyle::Plain => message.to_string(),
        OutputStyle::Rich => format!("{} {message}", status_badge(status)),
    }
}

fn paint_status_line(style: OutputStyle, status: &str, line: String) -> String {
    if style == OutputStyle::Plain {
        return line;
    }
    let badge = status_badge(status);
    match line.strip_prefix(badge) {
        Some(rest) => format!("{}{rest}", colorize(badge_style(status), badge)),
        None => line,
    }
}

fn status_badge(status: &str) -> &'static str {
    match status {
        "ok" => "[OK]",
        "warn" => "[WARN]",
        "err" => "[ERR]",
        _ => "[..]",
    }
}

/// Failure lines keep a marker in plain output so they stay greppable in logs.
pub(crate) fn render_failure_line(style: OutputStyle, subject: &str, err: &JamError) -> String {
    let message = format!("{subject}: {err}");
    match style {
        OutputStyle::Plain => format!("error: {message}"),
        OutputStyle::Rich => render_status_line(style, "err", &message),
    }
}

pub(crate) fn outcome_status(outcome: Outcome) -> &'static str {
    match outcome {
        Outcome::Installed | Outcome::Updated | Outcome::Removed => "ok",
        Outcome::Skipped => "step",
    }
}

pub(crate) fn format_report_line(report: &OperationReport) -> String {
    let version = report.version.as_deref().unwrap_or("?");
    let kind = report
        .kind
        .map(|kind| format!(" ({})", kind.as_str()))
        .unwrap_or_default();
    match report.outcome {
        Outcome::Installed => format!("installed {} {version}{kind}", report.short_id),
        Outcome::Updated => format!(
            "updated {} {} -> {version}{kind}",
            report.short_id,
            report.previous_version.as_deref().unwrap_or("?")
        ),
        Outcome::Removed => format!("removed {} {version}{kind}", report.short_id),
        Outcome::Skipped => match report.version.as_deref() {
            Some(version) => format!("{} {version} is already installed", report.short_id),
            None => format!("{} is not installed", report.short_id),
        },
    }
}

pub(crate) fn format_stale_warning(app: &AppId, report: &OperationReport) -> Option<String> {
    let latest = report.stale_latest()?;
    let version = report.version.as_deref().unwrap_or("?");
    Some(format!(
        "{} {version} is not the latest version (latest is {latest}); install {} to get it",
        report.short_id,
        app.without_version()
    ))
}

pub(crate) fn format_list_lines<'a>(
    entries: impl IntoIterator<Item = (&'a String, &'a IndexEntry)>,
) -> Vec<String> {
    let lines = entries
        .into_iter()
        .map(|(short_id, entry)| format!("{short_id} {} ({})", entry.version, entry.kind.as_str()))
        .collect::<Vec<_>>();
    if lines.is_empty() {
        vec!["No installed applications".to_string()]
    } else {
        lines
    }
}

pub(crate) fn format_info_lines(
    short_id: &str,
    entry: &IndexEntry,
    package_dir: &Path,
    title: Option<&str>,
    description: Option<&str>,
) -> Vec<String> {
    let mut lines = vec![
        format!("Application: {short_id}"),
        format!("Version: {}", entry.version),
        format!("Kind: {}", entry.kind.as_str()),
        format!("Path: {}", package_dir.display()),
    ];
    if let Some(title) = title {
        lines.push(format!("Title: {title}"));
    }
    if let Some(description) = description {
        lines.push(format!("Description: {description}"));
    }
    lines
}

fn badge_style(status: &str) -> Style {
    match status {
        "ok" => ok_style(),
        "warn" => warn_style(),
        "err" => err_style(),
        _ => step_style(),
    }
}

fn ok_style() -> Style {
    Style::new()
        .fg_color(Some(AnsiColor::BrightGreen.into()))
        .effects(Effects::BOLD)
}

fn warn_style() -> Style {
    Style::new()
        .fg_color(Some(AnsiColor::BrightYellow.into()))
        .effects(Effects::BOLD)
}

fn err_style() -> Style {
    Style::new()
        .fg_color(Some(AnsiColor::BrightRed.into()))
        .effects(Effects::BOLD)
}

fn step_style() -> Style {
    Style::new().fg_color(Some(AnsiColor::BrightBlue.into()))
}

fn colorize(style: Style, text: &str) -> String {
    format!("{}{}{}", style.render(), text, style.render_reset())
}
