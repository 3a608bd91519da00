//! Install strategy classification
//!
//! Decides, once per build, which Yarn generation a project uses, which
//! linker materializes its dependencies, and which build-plan capability
//! the step provides. Every later stage (cache oracle, layer staging,
//! install command) branches on the same [`Strategy`] value instead of
//! re-reading the project files.
//!
//! | `.yarnrc.yml`        | `nodeLinker`            | Linking mode     | Provides       |
//! |----------------------|-------------------------|------------------|----------------|
//! | absent               | -                       | `FlatDirectory`  | `node_modules` |
//! | present              | unset / empty / `pnp`   | `PlugAndPlay`    | `yarn_pkgs`    |
//! | present              | `node-modules`          | `FlatDirectory`  | `node_modules` |
//! | present              | `pnpm`                  | `ExternalLinker` | `node_modules` |
//! | present              | anything else           | `FlatDirectory`  | `node_modules` |

pub mod probe;

use crate::config::{self, YarnrcConfig};
use crate::error::YarnInstallResult;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::Path;
use tracing::debug;

/// `nodeLinker` value selecting Plug'n'Play
pub const NODE_LINKER_PNP: &str = "pnp";
/// `nodeLinker` value selecting a classic `node_modules` tree
pub const NODE_LINKER_NODE_MODULES: &str = "node-modules";
/// `nodeLinker` value selecting pnpm-style symlinked `node_modules`
pub const NODE_LINKER_PNPM: &str = "pnpm";

/// How the dependency tree is materialized on disk
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LinkingMode {
    /// A single resolved `node_modules` directory
    FlatDirectory,
    /// `.pnp.cjs` plus an offline zip cache, no `node_modules`
    PlugAndPlay,
    /// A third-party linker; handled exactly like `FlatDirectory`
    ExternalLinker,
}

impl LinkingMode {
    /// Whether installs produce a `node_modules` directory
    pub fn uses_node_modules(&self) -> bool {
        matches!(self, Self::FlatDirectory | Self::ExternalLinker)
    }
}

impl fmt::Display for LinkingMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::FlatDirectory => "node-modules",
            Self::PlugAndPlay => "pnp",
            Self::ExternalLinker => "pnpm",
        };
        write!(f, "{}", name)
    }
}

/// Yarn release line in use
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Generation {
    /// Yarn 1.x, recognised by a bare `yarn.lock`
    Classic,
    /// Yarn 2+, recognised by `.yarnrc.yml`
    Berry,
}

impl fmt::Display for Generation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Classic => write!(f, "classic"),
            Self::Berry => write!(f, "berry"),
        }
    }
}

/// Capability published to build-plan negotiation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Provision {
    #[serde(rename = "node_modules")]
    NodeModules,
    #[serde(rename = "yarn_pkgs")]
    YarnPkgs,
}

impl Provision {
    /// Name used in the build plan
    pub fn plan_name(&self) -> &'static str {
        match self {
            Self::NodeModules => "node_modules",
            Self::YarnPkgs => "yarn_pkgs",
        }
    }
}

impl fmt::Display for Provision {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.plan_name())
    }
}

/// Map the (optional) project config to a linking mode.
///
/// Unknown linkers fall back to `FlatDirectory`; they are never assumed
/// to be zero-install.
pub fn classify_linking_mode(config: Option<&YarnrcConfig>) -> LinkingMode {
    let Some(config) = config else {
        return LinkingMode::FlatDirectory;
    };

    match config.node_linker.as_deref() {
        None | Some("") | Some(NODE_LINKER_PNP) => LinkingMode::PlugAndPlay,
        Some(NODE_LINKER_NODE_MODULES) => LinkingMode::FlatDirectory,
        Some(NODE_LINKER_PNPM) => LinkingMode::ExternalLinker,
        Some(other) => {
            debug!("Unknown nodeLinker '{}', treating as node-modules", other);
            LinkingMode::FlatDirectory
        }
    }
}

/// Detect the Yarn generation from the files in the project root.
///
/// `Ok(None)` means there is no version signal at all.
pub fn classify_generation(project_dir: &Path) -> YarnInstallResult<Option<Generation>> {
    if probe::has_yarnrc(project_dir)? {
        return Ok(Some(Generation::Berry));
    }
    if probe::has_lockfile(project_dir)? {
        return Ok(Some(Generation::Classic));
    }
    Ok(None)
}

/// Capability provided for a linking mode
pub fn classify_provision(mode: LinkingMode) -> Provision {
    if mode.uses_node_modules() {
        Provision::NodeModules
    } else {
        Provision::YarnPkgs
    }
}

/// Every classification for one build, computed once
#[derive(Debug, Clone, PartialEq)]
pub struct Strategy {
    /// `None` when the project has no `.yarnrc.yml`
    pub config: Option<YarnrcConfig>,
    pub generation: Option<Generation>,
    pub linking_mode: LinkingMode,
    pub provision: Provision,
}

impl Strategy {
    /// Read the project config and classify the project
    pub async fn resolve(project_dir: &Path) -> YarnInstallResult<Self> {
        let config = config::read_yarnrc(project_dir).await?;
        let generation = classify_generation(project_dir)?;
        Ok(Self::from_parts(config, generation))
    }

    /// Build a strategy from an already-loaded config
    pub fn from_parts(config: Option<YarnrcConfig>, generation: Option<Generation>) -> Self {
        let linking_mode = classify_linking_mode(config.as_ref());
        Self {
            provision: classify_provision(linking_mode),
            linking_mode,
            generation,
            config,
        }
    }

    /// Whether installs produce a `node_modules` directory
    pub fn uses_node_modules(&self) -> bool {
        self.linking_mode.uses_node_modules()
    }
}
