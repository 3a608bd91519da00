//! Detect command - decide whether this is a Yarn project

use crate::cli::args::DetectArgs;
use crate::error::{YarnInstallError, YarnInstallResult};
use crate::plan;
use std::env;
use tracing::{debug, info};

/// Execute the detect command
pub async fn execute(args: DetectArgs) -> YarnInstallResult<()> {
    let app_dir = match args.app_dir {
        Some(dir) => dir,
        None => env::current_dir()
            .map_err(|e| YarnInstallError::io("getting current directory", e))?,
    };
    debug!("Detecting in {}", app_dir.display());

    let plan = plan::detect(&app_dir).await?;
    info!("Providing {}", plan.provides[0].name);
    let content = plan.to_toml()?;

    match args.output {
        Some(path) => tokio::fs::write(&path, content)
            .await
            .map_err(|e| YarnInstallError::io(format!("writing {}", path.display()), e)),
        None => {
            print!("{}", content);
            Ok(())
        }
    }
}
