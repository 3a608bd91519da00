//! yarn-install - Yarn dependency installation step
//!
//! CLI entry point that dispatches to subcommands.

use clap::Parser;
use console::style;
use std::process::ExitCode;
use tracing_subscriber::EnvFilter;
use yarn_install::cli::{Cli, Commands};
use yarn_install::error::{YarnInstallError, YarnInstallResult};

/// Exit code reporting that detection did not pass
const DETECT_FAIL: u8 = 100;

#[tokio::main]
async fn main() -> ExitCode {
    match run().await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) if e.is_detect_failure() => {
            eprintln!("{} {}", style("Detect:").yellow().bold(), e);
            ExitCode::from(DETECT_FAIL)
        }
        Err(e) => {
            report(&e);
            ExitCode::FAILURE
        }
    }
}

fn report(e: &YarnInstallError) {
    eprintln!("{} {}", style("Error:").red().bold(), e);
    if let Some(hint) = e.hint() {
        eprintln!("{} {}", style("Hint:").yellow(), hint);
    }
}

async fn run() -> YarnInstallResult<()> {
    let cli = Cli::parse();

    // 0 = warn, 1 = info, 2+ = debug
    let filter = match cli.verbose {
        0 => EnvFilter::new("yarn_install=warn"),
        1 => EnvFilter::new("yarn_install=info"),
        _ => EnvFilter::new("yarn_install=debug"),
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .without_time()
        .with_writer(std::io::stderr)
        .init();

    match cli.command {
        Commands::Detect(args) => yarn_install::cli::commands::detect(args).await,
        Commands::Build(args) => yarn_install::cli::commands::build(args).await,
        Commands::SetupSymlinks(args) => yarn_install::cli::commands::setup_symlinks(args).await,
    }
}
