//! Setup-symlinks command - launch-time node_modules repair

use crate::cli::args::SetupSymlinksArgs;
use crate::error::YarnInstallResult;
use crate::layer;
use tracing::debug;

/// Execute the setup-symlinks command
pub async fn execute(args: SetupSymlinksArgs) -> YarnInstallResult<()> {
    debug!(
        "Repairing node_modules in {} from {}",
        args.app_dir.display(),
        args.executable.display()
    );
    layer::setup_symlinks(&args.executable, &args.app_dir).await
}
