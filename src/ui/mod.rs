//! Build log output with fixed indentation levels

mod output;

pub use output::BuildLog;
