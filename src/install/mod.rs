//! Running `yarn install`
//!
//! `executable` is the subprocess seam; `process` builds the exact
//! command line for a strategy and runs it.

pub mod executable;
pub mod process;

pub use executable::{Executable, Execution, OutputMode, YarnExecutable};
pub use process::{install_args, InstallProcess, YARN_CACHE_FOLDER};
