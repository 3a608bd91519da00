//! yarn-install - Yarn dependency installation with layer caching
//!
//! Decides how a Yarn project links its dependencies, whether a cached
//! dependency layer is still valid, and runs `yarn install` into a layer
//! when it is not.

pub mod cache;
pub mod cli;
pub mod config;
pub mod error;
pub mod install;
pub mod layer;
pub mod plan;
pub mod project;
pub mod strategy;
pub mod ui;

pub use error::{YarnInstallError, YarnInstallResult};
