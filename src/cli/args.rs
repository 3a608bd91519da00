//! CLI argument definitions using clap derive

use clap::{ArgAction, Parser, Subcommand};
use std::path::PathBuf;

/// yarn-install - Yarn dependency installation with layer caching
///
/// Detects Yarn projects, installs their dependencies into cacheable
/// layers and repairs the node_modules link at launch.
#[derive(Parser, Debug)]
#[command(name = "yarn-install")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Subcommand to execute
    #[command(subcommand)]
    pub command: Commands,

    /// Increase verbosity (-v info, -vv debug)
    #[arg(short, long, global = true, action = ArgAction::Count)]
    pub verbose: u8,
}

/// Available commands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Check whether the project is a Yarn project and write its build plan
    Detect(DetectArgs),

    /// Install dependencies into build and launch layers
    Build(BuildArgs),

    /// Re-point node_modules at the launch layer
    SetupSymlinks(SetupSymlinksArgs),
}

/// Arguments for the detect command
#[derive(Parser, Debug)]
pub struct DetectArgs {
    /// Application directory (defaults to current directory)
    #[arg(long, env = "CNB_APP_DIR")]
    pub app_dir: Option<PathBuf>,

    /// Write the build plan here instead of stdout
    #[arg(long, env = "CNB_BUILD_PLAN_PATH")]
    pub output: Option<PathBuf>,
}

/// Arguments for the build command
#[derive(Parser, Debug)]
pub struct BuildArgs {
    /// Application directory (defaults to current directory)
    #[arg(long, env = "CNB_APP_DIR")]
    pub app_dir: Option<PathBuf>,

    /// Directory that holds this step's layers
    #[arg(long, env = "CNB_LAYERS_DIR")]
    pub layers_dir: PathBuf,

    /// Resolved buildpack plan (launch layer only when absent)
    #[arg(long, env = "CNB_BP_PLAN_PATH")]
    pub plan: Option<PathBuf>,

    /// Yarn executable to invoke
    #[arg(long, env = "YARN_INSTALL_YARN_BIN", default_value = "yarn")]
    pub yarn: PathBuf,

    /// NODE_ENV folded into the dependency fingerprint
    #[arg(long, env = "NODE_ENV", hide_env_values = true)]
    pub node_env: Option<String>,
}

/// Arguments for the setup-symlinks command
#[derive(Parser, Debug)]
pub struct SetupSymlinksArgs {
    /// Path of the launch helper, inside `<layer>/bin/`
    pub executable: PathBuf,

    /// Application directory
    pub app_dir: PathBuf,
}
