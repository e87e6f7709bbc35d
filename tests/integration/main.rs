//! Integration tests for pocketide

mod cli_tests {
    use assert_cmd::{cargo::cargo_bin_cmd, Command};
    use predicates::prelude::*;
    use std::fs;
    use tempfile::TempDir;

    /// Isolated state and config; no shell assets so nothing hits the network
    /// except the (unreachable) backend.
    struct Env {
        dir: TempDir,
    }

    impl Env {
        fn new() -> Self {
            let dir = TempDir::new().unwrap();
            fs::write(
                dir.path().join("config.toml"),
                r#"
[backend]
endpoint = "http://127.0.0.1:9/exec"
timeout_secs = 2

[shell]
origin = "http://127.0.0.1:9/"
assets = []

[editor]
path = "EDITOR_PATH"
"#
                .replace(
                    "EDITOR_PATH",
                    &dir.path().join("editor.txt").display().to_string(),
                ),
            )
            .unwrap();
            Self { dir }
        }

        fn cmd(&self) -> Command {
            let mut cmd = cargo_bin_cmd!("pocketide");
            cmd.env("POCKETIDE_CONFIG", self.dir.path().join("config.toml"))
                .env("POCKETIDE_STATE_DIR", self.dir.path().join("state"))
                .env_remove("POCKETIDE_KEY");
            cmd
        }

        fn state(&self, name: &str) -> std::path::PathBuf {
            self.dir.path().join("state").join(name)
        }
    }

    #[test]
    fn help_displays() {
        cargo_bin_cmd!("pocketide")
            .arg("--help")
            .assert()
            .success()
            .stdout(predicate::str::contains("deploy"))
            .stdout(predicate::str::contains("shell"));
    }

    #[test]
    fn version_displays() {
        cargo_bin_cmd!("pocketide")
            .arg("--version")
            .assert()
            .success()
            .stdout(predicate::str::contains("pocketide"));
    }

    #[test]
    fn completions_print() {
        cargo_bin_cmd!("pocketide")
            .args(["completions", "bash"])
            .assert()
            .success()
            .stdout(predicate::str::contains("pocketide"));
    }

    #[test]
    fn config_path_follows_flag() {
        let env = Env::new();
        env.cmd()
            .args(["config", "path"])
            .assert()
            .success()
            .stdout(predicate::str::contains("config.toml"));
    }

    #[test]
    fn config_show() {
        let env = Env::new();
        env.cmd()
            .args(["config", "show"])
            .assert()
            .success()
            .stdout(predicate::str::contains("[backend]"))
            .stdout(predicate::str::contains("Wrong Password"));
    }

    #[test]
    fn config_set_edits_in_place() {
        let env = Env::new();
        env.cmd()
            .args(["config", "set", "shell.version", "ide-network-first-v3"])
            .assert()
            .success();

        let content = fs::read_to_string(env.dir.path().join("config.toml")).unwrap();
        assert!(content.contains("version = \"ide-network-first-v3\""));
        assert!(content.contains("timeout_secs = 2"));
    }

    #[test]
    fn config_set_unknown_key() {
        let env = Env::new();
        env.cmd()
            .args(["config", "set", "shell.colour", "red"])
            .assert()
            .failure()
            .stderr(predicate::str::contains("Unknown config key"));
    }

    #[test]
    fn logout_when_logged_out() {
        let env = Env::new();
        env.cmd()
            .arg("logout")
            .assert()
            .success()
            .stdout(predicate::str::contains("Not logged in"));
    }

    #[test]
    fn save_without_project() {
        let env = Env::new();
        env.cmd()
            .arg("save")
            .assert()
            .failure()
            .stderr(predicate::str::contains("No project is open"))
            .stderr(predicate::str::contains("pocketide open"));
    }

    #[test]
    fn tab_without_project() {
        let env = Env::new();
        env.cmd()
            .args(["tab", "markup"])
            .assert()
            .failure()
            .stderr(predicate::str::contains("No project is open"));
    }

    #[test]
    fn close_without_project() {
        let env = Env::new();
        env.cmd()
            .arg("close")
            .assert()
            .success()
            .stdout(predicate::str::contains("No project is open"));
    }

    #[test]
    fn projects_requires_login() {
        let env = Env::new();
        env.cmd()
            .arg("projects")
            .assert()
            .failure()
            .stderr(predicate::str::contains("Not logged in"));
    }

    #[test]
    fn login_keeps_key_when_backend_unreachable() {
        let env = Env::new();
        env.cmd()
            .args(["login", "--key", "secret"])
            .assert()
            .success()
            .stdout(predicate::str::contains("Could not verify"));

        let storage = fs::read_to_string(env.state("local-storage.json")).unwrap();
        assert!(storage.contains("\"ide_key\""));

        env.cmd()
            .arg("projects")
            .assert()
            .failure()
            .stderr(predicate::str::contains("Cannot reach the backend"));

        env.cmd()
            .arg("logout")
            .assert()
            .success()
            .stdout(predicate::str::contains("Logged out"));
        let storage = fs::read_to_string(env.state("local-storage.json")).unwrap();
        assert!(!storage.contains("\"ide_key\""));
    }

    #[test]
    fn theme_is_persisted() {
        let env = Env::new();
        env.cmd().args(["theme", "dark"]).assert().success();
        env.cmd()
            .arg("theme")
            .assert()
            .success()
            .stdout(predicate::str::contains("dark"));
        env.cmd().args(["theme", "toggle"]).assert().success();
        env.cmd()
            .arg("theme")
            .assert()
            .success()
            .stdout(predicate::str::contains("light"));
    }

    #[test]
    fn shell_update_then_status() {
        let env = Env::new();
        env.cmd()
            .args(["shell", "update"])
            .assert()
            .success()
            .stdout(predicate::str::contains("ide-network-first-v2"));

        env.cmd()
            .args(["shell", "status", "--format", "plain"])
            .assert()
            .success()
            .stdout(predicate::str::contains("ide-network-first-v2"));

        env.cmd()
            .args(["shell", "reset", "--yes", "--no-reload"])
            .assert()
            .success()
            .stdout(predicate::str::contains("Deleted 1 cache store(s)"));
    }
}
