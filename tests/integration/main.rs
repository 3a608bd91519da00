//! Integration tests for yarn-install

mod cli_tests {
    use assert_cmd::{cargo::cargo_bin_cmd, Command};
    use predicates::prelude::*;

    pub fn yarn_install() -> Command {
        let mut cmd = cargo_bin_cmd!("yarn-install");
        for var in [
            "CNB_APP_DIR",
            "CNB_LAYERS_DIR",
            "CNB_BP_PLAN_PATH",
            "CNB_BUILD_PLAN_PATH",
            "YARN_INSTALL_YARN_BIN",
            "NODE_ENV",
        ] {
            cmd.env_remove(var);
        }
        cmd
    }

    #[test]
    fn help_displays() {
        yarn_install()
            .arg("--help")
            .assert()
            .success()
            .stdout(predicate::str::contains("Yarn dependency installation"));
    }

    #[test]
    fn version_displays() {
        yarn_install()
            .arg("--version")
            .assert()
            .success()
            .stdout(predicate::str::contains("yarn-install"));
    }

    #[test]
    fn build_requires_layers_dir() {
        yarn_install()
            .arg("build")
            .assert()
            .failure()
            .stderr(predicate::str::contains("--layers-dir"));
    }
}

mod detect_tests {
    use super::cli_tests::yarn_install;
    use predicates::prelude::*;
    use std::fs;
    use tempfile::TempDir;

    #[test]
    fn classic_project_passes() {
        let temp = TempDir::new().unwrap();
        fs::write(temp.path().join("yarn.lock"), "").unwrap();
        fs::write(
            temp.path().join("package.json"),
            r#"{"engines":{"node":"20.x"}}"#,
        )
        .unwrap();

        yarn_install()
            .args(["detect", "--app-dir"])
            .arg(temp.path())
            .assert()
            .success()
            .stdout(predicate::str::contains(r#"name = "node_modules""#))
            .stdout(predicate::str::contains(r#"version = "20.x""#))
            .stdout(predicate::str::contains(r#"name = "yarn""#));
    }

    #[test]
    fn plan_is_written_to_output_file() {
        let temp = TempDir::new().unwrap();
        fs::write(temp.path().join(".yarnrc.yml"), "nodeLinker: pnp\n").unwrap();
        fs::write(temp.path().join("package.json"), "{}").unwrap();
        let output = temp.path().join("plan.toml");

        yarn_install()
            .args(["detect", "--app-dir"])
            .arg(temp.path())
            .arg("--output")
            .arg(&output)
            .assert()
            .success();

        let plan = fs::read_to_string(&output).unwrap();
        assert!(plan.contains(r#"name = "yarn_pkgs""#));
    }

    #[test]
    fn non_yarn_project_fails_with_detect_code() {
        let temp = TempDir::new().unwrap();
        fs::write(temp.path().join("package.json"), "{}").unwrap();

        yarn_install()
            .args(["detect", "--app-dir"])
            .arg(temp.path())
            .assert()
            .code(100)
            .stderr(predicate::str::contains("yarn.lock"));
    }

    #[test]
    fn malformed_yarnrc_is_an_error_not_a_fail() {
        let temp = TempDir::new().unwrap();
        fs::write(temp.path().join(".yarnrc.yml"), "nodeLinker: [pnp\n").unwrap();
        fs::write(temp.path().join("package.json"), "{}").unwrap();

        yarn_install()
            .args(["detect", "--app-dir"])
            .arg(temp.path())
            .assert()
            .code(1)
            .stderr(predicate::str::contains("Invalid configuration"));
    }
}

#[cfg(unix)]
mod build_tests {
    use super::cli_tests::yarn_install;
    use predicates::prelude::*;
    use std::fs;
    use std::os::unix::fs::PermissionsExt;
    use std::path::{Path, PathBuf};
    use tempfile::TempDir;

    struct Workspace {
        _temp: TempDir,
        app: PathBuf,
        layers: PathBuf,
        yarn: PathBuf,
        calls: PathBuf,
    }

    /// A project plus a stand-in `yarn` that logs its arguments
    fn workspace(files: &[(&str, &str)]) -> Workspace {
        let temp = TempDir::new().unwrap();
        let app = temp.path().join("workspace");
        let layers = temp.path().join("layers");
        let calls = temp.path().join("calls.log");
        fs::create_dir_all(&app).unwrap();
        fs::create_dir_all(&layers).unwrap();
        for (name, content) in files {
            fs::write(app.join(name), content).unwrap();
        }

        let yarn = temp.path().join("yarn");
        let script = format!(
            "#!/bin/sh\necho \"$@\" >> '{}'\ncase \"$1\" in\n  info) echo '{{\"value\":\"left-pad@1.3.0\"}}' ;;\n  install) exit 0 ;;\nesac\n",
            calls.display()
        );
        fs::write(&yarn, script).unwrap();
        fs::set_permissions(&yarn, fs::Permissions::from_mode(0o755)).unwrap();

        Workspace {
            _temp: temp,
            app,
            layers,
            yarn,
            calls,
        }
    }

    fn build(ws: &Workspace) -> assert_cmd::assert::Assert {
        yarn_install()
            .arg("build")
            .arg("--app-dir")
            .arg(&ws.app)
            .arg("--layers-dir")
            .arg(&ws.layers)
            .arg("--yarn")
            .arg(&ws.yarn)
            .assert()
    }

    fn calls(path: &Path) -> Vec<String> {
        fs::read_to_string(path)
            .unwrap_or_default()
            .lines()
            .map(str::to_string)
            .collect()
    }

    #[test]
    fn classic_build_installs_then_reuses() {
        let ws = workspace(&[("yarn.lock", "# yarn lockfile v1\n"), ("package.json", "{}")]);

        build(&ws)
            .success()
            .stdout(predicate::str::contains("Detected Yarn classic project"))
            .stdout(predicate::str::contains("yarn.lock -> Found"))
            .stdout(predicate::str::contains("Running 'yarn install --ignore-engines"));

        let manifest = fs::read_to_string(ws.layers.join("launch-modules.toml")).unwrap();
        assert!(manifest.contains("cache_sha"));
        assert!(manifest.contains("launch = true"));
        assert_eq!(
            fs::read_link(ws.app.join("node_modules")).unwrap(),
            ws.layers.join("launch-modules").join("node_modules")
        );

        build(&ws)
            .success()
            .stdout(predicate::str::contains("Reusing cached layer"));

        let installs = calls(&ws.calls)
            .into_iter()
            .filter(|line| line.starts_with("install"))
            .count();
        assert_eq!(installs, 1);
    }

    #[test]
    fn pnp_zero_install_skips_yarn_entirely() {
        let ws = workspace(&[
            ("yarn.lock", ""),
            ("package.json", "{}"),
            (".yarnrc.yml", "nodeLinker: pnp\n"),
            (".pnp.cjs", ""),
        ]);
        fs::create_dir_all(ws.app.join(".yarn/cache")).unwrap();

        build(&ws)
            .success()
            .stdout(predicate::str::contains("PnP setup complete"));

        assert!(calls(&ws.calls).is_empty());
        assert!(!ws.app.join("node_modules").exists());
    }

    #[test]
    fn failing_install_fails_the_build() {
        let ws = workspace(&[("yarn.lock", ""), ("package.json", "{}")]);
        fs::write(&ws.yarn, "#!/bin/sh\nexit 3\n").unwrap();

        build(&ws)
            .failure()
            .stderr(predicate::str::contains("exit code: 3"));

        assert!(!ws.layers.join("launch-modules.toml").exists());
    }

    #[test]
    fn setup_symlinks_repairs_dangling_target() {
        let ws = workspace(&[("yarn.lock", ""), ("package.json", "{}")]);
        let launch = ws.layers.join("launch-modules");
        fs::create_dir_all(launch.join("node_modules")).unwrap();
        fs::create_dir_all(launch.join("bin")).unwrap();
        let target = ws.layers.join("build-modules").join("node_modules");
        std::os::unix::fs::symlink(&target, ws.app.join("node_modules")).unwrap();

        yarn_install()
            .arg("setup-symlinks")
            .arg(launch.join("bin").join("setup-symlinks"))
            .arg(&ws.app)
            .assert()
            .success();

        assert_eq!(fs::read_link(&target).unwrap(), launch.join("node_modules"));
    }
}
