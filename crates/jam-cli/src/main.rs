use std::path::PathBuf;
use std::process::ExitCode;

use clap::{ArgAction, Parser, Subcommand};
use clap_complete::Shell;
use env_logger::Env;
use jam_core::AppId;

mod completion;
mod config;
mod dispatch;
mod render;

use dispatch::run_cli;

const LOG_ENV: &str = "JAM_LOG";

#[derive(Parser, Debug)]
#[command(name = "jam")]
#[command(about = "Install command line and desktop applications from release repositories", long_about = None)]
struct Cli {
    /// Configuration file (defaults to $JAM_CONFIG or ~/.config/jam/config.toml).
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Applications root directory.
    #[arg(long, global = true)]
    root: Option<PathBuf>,

    /// Increase log verbosity (-v info, -vv debug).
    #[arg(short, long, action = ArgAction::Count, global = true)]
    verbose: u8,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Install or update applications (owner.package or owner.package@version).
    #[command(visible_alias = "i")]
    Install {
        #[arg(required = true, num_args = 1.., value_name = "APP_ID", value_parser = parse_app_id)]
        apps: Vec<AppId>,
        /// Delete the previous version's directory after an update.
        #[arg(long)]
        prune_previous: bool,
        /// Stop at the first application that fails.
        #[arg(long)]
        fail_fast: bool,
    },
    /// Remove installed applications.
    #[command(visible_alias = "rm")]
    Remove {
        #[arg(required = true, num_args = 1.., value_name = "APP_ID", value_parser = parse_app_id)]
        apps: Vec<AppId>,
        #[arg(long)]
        fail_fast: bool,
    },
    /// Update installed applications to their latest release (all when none given).
    Upgrade {
        #[arg(value_name = "APP_ID", value_parser = parse_app_id)]
        apps: Vec<AppId>,
        #[arg(long)]
        prune_previous: bool,
        #[arg(long)]
        fail_fast: bool,
    },
    /// List installed applications.
    List,
    /// Show what is installed for one application.
    Info {
        #[arg(value_name = "APP_ID", value_parser = parse_app_id)]
        app: AppId,
    },
    /// Check the applications root against the index.
    Doctor,
    /// Print a shell completion script.
    Completions {
        #[arg(value_enum)]
        shell: Shell,
    },
    /// Print the jam version.
    Version,
}

fn parse_app_id(raw: &str) -> Result<AppId, String> {
    AppId::parse(raw).map_err(|err| err.to_string())
}

fn init_logging(verbose: u8) {
    let default_filter = match verbose {
        0 => "warn",
        1 => "info",
        _ => "debug",
    };
    env_logger::Builder::from_env(Env::new().filter_or(LOG_ENV, default_filter))
        .format_timestamp(None)
        .target(env_logger::Target::Stderr)
        .init();
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    match run_cli(cli) {
        Ok(code) => code,
        Err(err) => {
            eprintln!("error: {err:#}");
            ExitCode::FAILURE
        }
    }
}

#[cfg(test)]
mod tests;
