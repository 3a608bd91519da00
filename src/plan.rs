//! Build plan types and detection
//!
//! Detection writes a [`BuildPlan`] saying what this step provides and what
//! it needs from earlier steps. At build time the platform hands back a
//! [`BuildpackPlan`] whose entries say which layers are wanted.

use crate::config::{read_yarnrc, PACKAGE_JSON, YARNRC_YML, YARN_LOCK};
use crate::error::{YarnInstallError, YarnInstallResult};
use crate::project::read_package_json;
use crate::strategy::{classify_linking_mode, classify_provision, probe, Provision};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::io::ErrorKind;
use std::path::Path;

/// Plan requirement names
pub const PLAN_NODE: &str = "node";
pub const PLAN_YARN: &str = "yarn";

/// Where the Node.js version came from
pub const VERSION_SOURCE_PACKAGE_JSON: &str = "package.json";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BuildPlan {
    pub provides: Vec<Provided>,
    pub requires: Vec<Required>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Provided {
    pub name: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Required {
    pub name: String,
    pub metadata: RequirementMetadata,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RequirementMetadata {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub version: Option<String>,
    #[serde(
        default,
        rename = "version-source",
        skip_serializing_if = "Option::is_none"
    )]
    pub version_source: Option<String>,
    #[serde(default)]
    pub build: bool,
}

impl BuildPlan {
    pub fn to_toml(&self) -> YarnInstallResult<String> {
        Ok(toml::to_string_pretty(self)?)
    }
}

/// Decide whether this step applies to the project and what it needs.
///
/// Not applying is reported as [`YarnInstallError::DetectFailed`].
pub async fn detect(project_dir: &Path) -> YarnInstallResult<BuildPlan> {
    let config = read_yarnrc(project_dir).await?;

    if config.is_none() && !probe::has_lockfile(project_dir)? {
        return Err(YarnInstallError::DetectFailed(format!(
            "no '{}' or '{}' file found in the project path {}",
            YARNRC_YML,
            YARN_LOCK,
            project_dir.display()
        )));
    }

    let provision = classify_provision(classify_linking_mode(config.as_ref()));

    let package = read_package_json(project_dir).await?.ok_or_else(|| {
        YarnInstallError::DetectFailed(format!(
            "no '{}' found in project path {}",
            PACKAGE_JSON,
            project_dir.display()
        ))
    })?;

    let node = match package.node_version() {
        Some(version) => RequirementMetadata {
            version: Some(version.to_string()),
            version_source: Some(VERSION_SOURCE_PACKAGE_JSON.to_string()),
            build: true,
        },
        None => RequirementMetadata {
            build: true,
            ..Default::default()
        },
    };

    Ok(BuildPlan {
        provides: vec![Provided {
            name: provision.plan_name().to_string(),
        }],
        requires: vec![
            Required {
                name: PLAN_NODE.to_string(),
                metadata: node,
            },
            Required {
                name: PLAN_YARN.to_string(),
                metadata: RequirementMetadata {
                    build: true,
                    ..Default::default()
                },
            },
        ],
    })
}

/// Plan handed to the build by the platform
#[derive(Debug, Clone, Default, Deserialize)]
pub struct BuildpackPlan {
    #[serde(default)]
    pub entries: Vec<PlanEntry>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct PlanEntry {
    pub name: String,
    #[serde(default)]
    pub metadata: BTreeMap<String, toml::Value>,
}

impl PlanEntry {
    fn flag(&self, key: &str) -> bool {
        self.metadata
            .get(key)
            .and_then(toml::Value::as_bool)
            .unwrap_or(false)
    }
}

/// Which layers a build should produce
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LayerRequests {
    pub build: bool,
    pub launch: bool,
}

impl BuildpackPlan {
    /// Read the plan file. A missing file is an empty plan.
    pub async fn from_file(path: &Path) -> YarnInstallResult<Self> {
        match tokio::fs::read_to_string(path).await {
            Ok(content) => Self::parse(&content, path),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(Self::default()),
            Err(e) => Err(YarnInstallError::io(
                format!("reading {}", path.display()),
                e,
            )),
        }
    }

    pub fn parse(content: &str, path: &Path) -> YarnInstallResult<Self> {
        toml::from_str(content).map_err(|e| YarnInstallError::ConfigInvalid {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })
    }

    /// Layers requested for `provision`.
    ///
    /// Without a matching entry asking for either, the project gets a launch
    /// layer only.
    pub fn requests(&self, provision: Provision) -> LayerRequests {
        let matching = self
            .entries
            .iter()
            .filter(|entry| entry.name == provision.plan_name());

        let mut requests = LayerRequests {
            build: false,
            launch: false,
        };
        for entry in matching {
            requests.build |= entry.flag("build");
            requests.launch |= entry.flag("launch");
        }

        if !requests.build && !requests.launch {
            requests.launch = true;
        }
        requests
    }
}
