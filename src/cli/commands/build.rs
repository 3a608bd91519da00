//! Build command - install dependencies into layers

use crate::cache::CacheOracle;
use crate::cli::args::BuildArgs;
use crate::config::NODE_MODULES;
use crate::error::{YarnInstallError, YarnInstallResult};
use crate::install::{Executable, InstallProcess, YarnExecutable};
use crate::layer::{self, Layer, LayerTypes, BUILD_MODULES, LAUNCH_MODULES};
use crate::plan::BuildpackPlan;
use crate::strategy::Strategy;
use crate::ui::BuildLog;
use chrono::Utc;
use std::env;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

/// Execute the build command
pub async fn execute(args: BuildArgs) -> YarnInstallResult<()> {
    let app_dir = match args.app_dir {
        Some(dir) => dir,
        None => env::current_dir()
            .map_err(|e| YarnInstallError::io("getting current directory", e))?,
    };

    let plan = match args.plan {
        Some(ref path) => BuildpackPlan::from_file(path).await?,
        None => BuildpackPlan::default(),
    };

    let build = Build {
        app_dir,
        layers_dir: args.layers_dir,
        plan,
        node_env: args.node_env,
        path: env::var("PATH").ok(),
    };

    let yarn = YarnExecutable::with_program(args.yarn);
    let log = BuildLog::new();
    let outcomes = build.run(&yarn, &log).await?;

    for outcome in &outcomes {
        info!(
            "{}: {}",
            outcome.name,
            if outcome.installed { "installed" } else { "reused" }
        );
    }
    Ok(())
}

/// Inputs of one build, captured up front
#[derive(Debug, Clone)]
pub struct Build {
    pub app_dir: PathBuf,
    pub layers_dir: PathBuf,
    pub plan: BuildpackPlan,
    pub node_env: Option<String>,
    /// `PATH` handed to the install; the process environment is never modified
    pub path: Option<String>,
}

/// What happened to one layer
#[derive(Debug, Clone, PartialEq)]
pub struct LayerOutcome {
    pub name: String,
    pub path: PathBuf,
    pub installed: bool,
}

/// How a single layer is produced
struct LayerJob<'a> {
    name: &'a str,
    launch: bool,
    types: LayerTypes,
    warm: Option<&'a Path>,
    /// Re-point the project at this layer when it is reused
    link_on_reuse: bool,
}

impl Build {
    /// Resolve the strategy once, then produce every requested layer
    pub async fn run(
        &self,
        yarn: &dyn Executable,
        log: &BuildLog,
    ) -> YarnInstallResult<Vec<LayerOutcome>> {
        log.title(format!("Yarn Install {}", env!("CARGO_PKG_VERSION")));

        let strategy = Strategy::resolve(&self.app_dir).await?;
        log.process("Resolving installation process");
        match strategy.generation {
            Some(generation) => log.subprocess(format!("Detected Yarn {} project", generation)),
            None => log.subprocess("No yarn.lock or .yarnrc.yml found"),
        }
        log.subprocess(format!("Linking mode: {}", strategy.linking_mode));
        log.break_line();

        let requests = self.plan.requests(strategy.provision);
        debug!("Layer requests: {:?}", requests);

        let mut outcomes = Vec::new();
        let mut warm: Option<PathBuf> = None;

        if requests.build {
            let outcome = self
                .produce(
                    yarn,
                    log,
                    &strategy,
                    LayerJob {
                        name: BUILD_MODULES,
                        launch: false,
                        types: LayerTypes {
                            build: true,
                            launch: false,
                            cache: true,
                        },
                        warm: None,
                        link_on_reuse: true,
                    },
                )
                .await?;

            if strategy.uses_node_modules() && outcome.path.join(NODE_MODULES).is_dir() {
                warm = Some(outcome.path.clone());
            }
            outcomes.push(outcome);
        }

        if requests.launch {
            let outcome = self
                .produce(
                    yarn,
                    log,
                    &strategy,
                    LayerJob {
                        name: LAUNCH_MODULES,
                        launch: true,
                        types: LayerTypes {
                            build: false,
                            launch: true,
                            cache: true,
                        },
                        warm: warm.as_deref(),
                        link_on_reuse: !requests.build,
                    },
                )
                .await?;
            outcomes.push(outcome);
        }

        Ok(outcomes)
    }

    async fn produce(
        &self,
        yarn: &dyn Executable,
        log: &BuildLog,
        strategy: &Strategy,
        job: LayerJob<'_>,
    ) -> YarnInstallResult<LayerOutcome> {
        let mut layer = Layer::open(&self.layers_dir, job.name).await?;
        log.process(format!("Configuring {} layer", job.name));

        let decision = CacheOracle::new(yarn, log)
            .with_node_env(self.node_env.clone())
            .decide(&self.app_dir, strategy, &layer.manifest.metadata)
            .await?;

        layer.manifest.types = job.types;

        if !decision.should_run() {
            log.process(format!("Reusing cached layer {}", layer.path.display()));
            if strategy.uses_node_modules() && job.link_on_reuse {
                layer.ensure_dir().await?;
                let app_dir = self.app_dir.clone();
                let reused = layer.path.clone();
                blocking("Linking", move || layer::link_into_project(&app_dir, &reused)).await?;
            }
            layer.save().await?;
            log.break_line();
            return Ok(LayerOutcome {
                name: layer.name,
                path: layer.path,
                installed: false,
            });
        }

        layer.ensure_dir().await?;
        let app_dir = self.app_dir.clone();
        let warm = job.warm.map(Path::to_path_buf);
        let next = layer.path.clone();
        let mode = strategy.linking_mode;
        let target = blocking("Staging", move || {
            layer::stage(&app_dir, warm.as_deref(), &next, mode)
        })
        .await?;

        log.process("Executing build process");
        InstallProcess::new(yarn, log)
            .with_path(self.path.clone())
            .run(&self.app_dir, &target, job.launch, strategy)
            .await?;

        // The layer now holds a fresh install; an old fingerprint no longer describes it
        match decision.fingerprint() {
            Some(fingerprint) => layer.manifest.metadata.set_cache_sha(fingerprint),
            None => layer.manifest.metadata.clear_cache_sha(),
        }
        layer.manifest.metadata.set_built_at(Utc::now());
        layer.save().await?;
        log.break_line();

        Ok(LayerOutcome {
            name: layer.name,
            path: layer.path,
            installed: true,
        })
    }
}

/// Run filesystem-heavy work off the async runtime
async fn blocking<T, F>(what: &str, work: F) -> YarnInstallResult<T>
where
    F: FnOnce() -> YarnInstallResult<T> + Send + 'static,
    T: Send + 'static,
{
    tokio::task::spawn_blocking(work)
        .await
        .map_err(|e| YarnInstallError::User(format!("{} task failed: {}", what, e)))?
}

#[cfg(all(test, unix))]
mod tests {
    use super::*;
    use crate::install::Execution;
    use crate::layer::LayerManifest;
    use async_trait::async_trait;
    use std::fs;
    use std::sync::Mutex;
    use tempfile::TempDir;

    /// Answers `info` with fixed output (or a failure) and records every call
    struct FakeYarn {
        info: Option<Vec<u8>>,
        calls: Mutex<Vec<Execution>>,
    }

    impl FakeYarn {
        fn new(info: &str) -> Self {
            Self {
                info: Some(info.as_bytes().to_vec()),
                calls: Mutex::new(Vec::new()),
            }
        }

        fn broken_info() -> Self {
            Self {
                info: None,
                calls: Mutex::new(Vec::new()),
            }
        }

        fn installs(&self) -> Vec<Execution> {
            self.calls
                .lock()
                .unwrap()
                .iter()
                .filter(|e| e.args.first().map(String::as_str) == Some("install"))
                .cloned()
                .collect()
        }
    }

    #[async_trait]
    impl Executable for FakeYarn {
        fn name(&self) -> &str {
            "yarn"
        }

        async fn execute(&self, execution: &Execution) -> YarnInstallResult<Vec<u8>> {
            self.calls.lock().unwrap().push(execution.clone());
            if execution.args.first().map(String::as_str) == Some("info") {
                self.info
                    .clone()
                    .ok_or_else(|| YarnInstallError::command_exit(self.describe(execution), Some(1)))
            } else {
                Ok(Vec::new())
            }
        }
    }

    struct Fixture {
        _temp: TempDir,
        build: Build,
    }

    fn fixture(files: &[(&str, &str)], plan: BuildpackPlan) -> Fixture {
        let temp = TempDir::new().unwrap();
        let app_dir = temp.path().join("workspace");
        let layers_dir = temp.path().join("layers");
        fs::create_dir_all(&app_dir).unwrap();
        fs::create_dir_all(&layers_dir).unwrap();
        for (name, content) in files {
            fs::write(app_dir.join(name), content).unwrap();
        }

        Fixture {
            _temp: temp,
            build: Build {
                app_dir,
                layers_dir,
                plan,
                node_env: Some("production".to_string()),
                path: Some("/usr/bin".to_string()),
            },
        }
    }

    fn both_layers() -> BuildpackPlan {
        BuildpackPlan::parse(
            "[[entries]]\nname = \"node_modules\"\n[entries.metadata]\nbuild = true\nlaunch = true\n",
            Path::new("plan.toml"),
        )
        .unwrap()
    }

    async fn manifest(build: &Build, name: &str) -> LayerManifest {
        LayerManifest::from_file(&build.layers_dir.join(format!("{}.toml", name)))
            .await
            .unwrap()
    }

    #[tokio::test]
    async fn first_build_installs_and_records_fingerprint() {
        let f = fixture(
            &[("yarn.lock", "lock"), ("package.json", "{}")],
            BuildpackPlan::default(),
        );
        let yarn = FakeYarn::new("{}");
        let log = BuildLog::silent();

        let outcomes = f.build.run(&yarn, &log).await.unwrap();

        assert_eq!(outcomes.len(), 1);
        assert_eq!(outcomes[0].name, LAUNCH_MODULES);
        assert!(outcomes[0].installed);

        let saved = manifest(&f.build, LAUNCH_MODULES).await;
        assert!(saved.metadata.cache_sha().is_some());
        assert!(saved.metadata.built_at().is_some());
        assert!(saved.types.launch);
        assert!(!saved.types.build);

        let link = f.build.app_dir.join("node_modules");
        assert_eq!(
            fs::read_link(&link).unwrap(),
            f.build.layers_dir.join(LAUNCH_MODULES).join("node_modules")
        );
        assert_eq!(yarn.installs().len(), 1);
    }

    #[tokio::test]
    async fn unchanged_inputs_reuse_the_layer() {
        let f = fixture(
            &[("yarn.lock", "lock"), ("package.json", "{}")],
            BuildpackPlan::default(),
        );
        let log = BuildLog::silent();

        f.build.run(&FakeYarn::new("{}"), &log).await.unwrap();
        let before = manifest(&f.build, LAUNCH_MODULES).await;

        let yarn = FakeYarn::new("{}");
        let outcomes = f.build.run(&yarn, &log).await.unwrap();

        assert!(!outcomes[0].installed);
        assert!(yarn.installs().is_empty());
        assert_eq!(manifest(&f.build, LAUNCH_MODULES).await.metadata, before.metadata);
    }

    #[tokio::test]
    async fn changed_probe_output_reinstalls() {
        let f = fixture(
            &[("yarn.lock", "lock"), ("package.json", "{}")],
            BuildpackPlan::default(),
        );
        let log = BuildLog::silent();

        f.build.run(&FakeYarn::new("{}"), &log).await.unwrap();
        let before = manifest(&f.build, LAUNCH_MODULES).await.metadata.cache_sha();

        let yarn = FakeYarn::new(r#"{"value":"left-pad@1.3.0"}"#);
        let outcomes = f.build.run(&yarn, &log).await.unwrap();

        assert!(outcomes[0].installed);
        assert_ne!(
            manifest(&f.build, LAUNCH_MODULES).await.metadata.cache_sha(),
            before
        );
    }

    #[tokio::test]
    async fn build_and_launch_layers_share_the_warm_tree() {
        let f = fixture(&[("yarn.lock", "lock"), ("package.json", "{}")], both_layers());
        let yarn = FakeYarn::new("{}");
        let log = BuildLog::silent();

        let outcomes = f.build.run(&yarn, &log).await.unwrap();

        assert_eq!(
            outcomes.iter().map(|o| o.name.as_str()).collect::<Vec<_>>(),
            vec![BUILD_MODULES, LAUNCH_MODULES]
        );
        let installs = yarn.installs();
        assert_eq!(installs.len(), 2);
        assert!(installs[0].args.contains(&"--production".to_string()));
        assert!(!installs[1].args.contains(&"--production".to_string()));

        assert!(f.build.layers_dir.join(LAUNCH_MODULES).join("node_modules").is_dir());
        assert_eq!(
            fs::read_link(f.build.app_dir.join("node_modules")).unwrap(),
            f.build.layers_dir.join(BUILD_MODULES).join("node_modules")
        );
        assert!(manifest(&f.build, BUILD_MODULES).await.types.build);
    }

    #[tokio::test]
    async fn pnp_project_with_zero_install_state_skips() {
        let f = fixture(
            &[
                ("yarn.lock", "lock"),
                ("package.json", "{}"),
                (".yarnrc.yml", "nodeLinker: pnp\n"),
                (".pnp.cjs", ""),
            ],
            BuildpackPlan::default(),
        );
        fs::create_dir_all(f.build.app_dir.join(".yarn/cache")).unwrap();
        let yarn = FakeYarn::new("{}");
        let log = BuildLog::silent();

        let outcomes = f.build.run(&yarn, &log).await.unwrap();

        assert!(!outcomes[0].installed);
        assert!(yarn.calls.lock().unwrap().is_empty());
        assert!(!f.build.app_dir.join("node_modules").exists());
        assert!(manifest(&f.build, LAUNCH_MODULES).await.metadata.is_empty());
    }

    #[tokio::test]
    async fn pnp_install_records_no_fingerprint() {
        let f = fixture(
            &[
                ("yarn.lock", "lock"),
                ("package.json", "{}"),
                (".yarnrc.yml", "nodeLinker: pnp\n"),
            ],
            BuildpackPlan::default(),
        );
        let yarn = FakeYarn::new("{}");
        let log = BuildLog::silent();

        let outcomes = f.build.run(&yarn, &log).await.unwrap();

        assert!(outcomes[0].installed);
        let installs = yarn.installs();
        assert_eq!(installs.len(), 1);
        assert_eq!(
            installs[0].env.get("YARN_CACHE_FOLDER").map(PathBuf::from),
            Some(f.build.layers_dir.join(LAUNCH_MODULES).join("cache"))
        );
        assert!(manifest(&f.build, LAUNCH_MODULES).await.metadata.cache_sha().is_none());
    }

    #[tokio::test]
    async fn install_without_fingerprint_forgets_the_recorded_one() {
        let f = fixture(
            &[("yarn.lock", "lock"), ("package.json", r#"{"dependencies":{"a":"1"}}"#)],
            BuildpackPlan::default(),
        );
        let log = BuildLog::silent();

        f.build.run(&FakeYarn::new("{}"), &log).await.unwrap();
        let recorded = manifest(&f.build, LAUNCH_MODULES).await.metadata.cache_sha();
        assert!(recorded.is_some());

        fs::write(
            f.build.app_dir.join("package.json"),
            r#"{"dependencies":{"b":"1"}}"#,
        )
        .unwrap();
        let outcomes = f.build.run(&FakeYarn::broken_info(), &log).await.unwrap();
        assert!(outcomes[0].installed);

        let after = manifest(&f.build, LAUNCH_MODULES).await.metadata;
        assert!(after.cache_sha().is_none());
        assert!(after.built_at().is_some());

        fs::write(
            f.build.app_dir.join("package.json"),
            r#"{"dependencies":{"a":"1"}}"#,
        )
        .unwrap();
        let yarn = FakeYarn::new("{}");
        let outcomes = f.build.run(&yarn, &log).await.unwrap();

        assert!(outcomes[0].installed);
        assert_eq!(yarn.installs().len(), 1);
        assert_eq!(manifest(&f.build, LAUNCH_MODULES).await.metadata.cache_sha(), recorded);
    }

    #[tokio::test]
    async fn install_without_lockfile_forgets_the_recorded_fingerprint() {
        let f = fixture(
            &[("yarn.lock", "lock"), ("package.json", "{}")],
            BuildpackPlan::default(),
        );
        let log = BuildLog::silent();

        f.build.run(&FakeYarn::new("{}"), &log).await.unwrap();
        assert!(manifest(&f.build, LAUNCH_MODULES).await.metadata.cache_sha().is_some());

        fs::remove_file(f.build.app_dir.join("yarn.lock")).unwrap();
        let outcomes = f.build.run(&FakeYarn::new("{}"), &log).await.unwrap();
        assert!(outcomes[0].installed);
        assert!(manifest(&f.build, LAUNCH_MODULES).await.metadata.cache_sha().is_none());

        fs::write(f.build.app_dir.join("yarn.lock"), "lock").unwrap();
        let yarn = FakeYarn::new("{}");
        let outcomes = f.build.run(&yarn, &log).await.unwrap();
        assert!(outcomes[0].installed);
        assert_eq!(yarn.installs().len(), 1);
    }

    #[tokio::test]
    async fn malformed_config_aborts_before_any_subprocess() {
        let f = fixture(
            &[("yarn.lock", "lock"), (".yarnrc.yml", "nodeLinker: [pnp\n")],
            BuildpackPlan::default(),
        );
        let yarn = FakeYarn::new("{}");
        let log = BuildLog::silent();

        let err = f.build.run(&yarn, &log).await.unwrap_err();

        assert!(matches!(err, YarnInstallError::ConfigInvalid { .. }));
        assert!(yarn.calls.lock().unwrap().is_empty());
    }
}
