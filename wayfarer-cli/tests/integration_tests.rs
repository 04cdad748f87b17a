//! Integration tests for the wayfarer CLI
//!
//! Every invocation is a fresh process, so these tests exercise the full
//! persist-then-rehydrate cycle through real storage backends.

use assert_cmd::Command;
use predicates::prelude::*;
use serde_json::Value;
use std::fs;
use std::path::PathBuf;
use tempfile::TempDir;

/// Isolated config and state directory for one test
struct TestEnv {
    _temp_dir: TempDir,
    config_path: PathBuf,
    state_path: PathBuf,
}

impl TestEnv {
    fn new() -> Self {
        Self::with_backend("file", "state")
    }

    fn with_backend(backend: &str, state_name: &str) -> Self {
        let temp_dir = TempDir::new().unwrap();
        let state_path = temp_dir.path().join(state_name);
        let config_path = temp_dir.path().join("config.toml");

        let escaped = state_path.to_string_lossy().replace('\\', "\\\\");
        let config_content = format!(
            r#"
[storage]
backend = "{}"
path = "{}"
"#,
            backend, escaped
        );
        fs::write(&config_path, config_content).unwrap();

        Self {
            _temp_dir: temp_dir,
            config_path,
            state_path,
        }
    }

    fn cmd(&self) -> Command {
        let mut cmd = Command::cargo_bin("wayfarer").unwrap();
        cmd.env("WAYFARER_CONFIG", &self.config_path);
        cmd.env_remove("RUST_LOG");
        cmd
    }

    fn run(&self, args: &[&str]) -> Value {
        let output = self.cmd().args(args).output().unwrap();
        assert!(
            output.status.success(),
            "wayfarer {:?} failed: {}",
            args,
            String::from_utf8_lossy(&output.stderr)
        );
        serde_json::from_slice(&output.stdout).unwrap()
    }

    fn login(&self) -> Value {
        self.run(&[
            "login",
            "--user-id",
            "u1",
            "--token",
            "tok123",
            "--first-name",
            "An",
            "--last-name",
            "Nguyen",
            "--avatar",
            "a.png",
            "--cover",
            "c.png",
        ])
    }
}

#[test]
fn test_state_defaults() {
    let env = TestEnv::new();
    let state = env.run(&["state"]);

    assert_eq!(state["auth"]["isLoggedIn"], false);
    assert_eq!(state["auth"]["token"], Value::Null);
    assert_eq!(state["auth"]["msg"], "");
    assert_eq!(state["tab"]["activeTab"], "home");
}

#[test]
fn test_login_persists_across_processes() {
    let env = TestEnv::new();
    let after_login = env.login();
    assert_eq!(after_login["auth"]["isLoggedIn"], true);

    let state = env.run(&["state"]);
    assert_eq!(state["auth"]["userId"], "u1");
    assert_eq!(state["auth"]["firstName"], "An");
    assert_eq!(state["auth"]["lastName"], "Nguyen");
    assert_eq!(state["auth"]["avatar"], "a.png");
    assert_eq!(state["auth"]["cover"], "c.png");
    assert_eq!(state["auth"]["token"], "tok123");
    assert_eq!(state["auth"]["isLoggedIn"], true);
}

#[test]
fn test_tab_persists_only_whitelisted_field() {
    let env = TestEnv::new();
    env.run(&["tab", "my-trips"]);

    let on_disk = fs::read_to_string(env.state_path.join("tab.json")).unwrap();
    let stored: Value = serde_json::from_str(&on_disk).unwrap();
    assert_eq!(stored, serde_json::json!({ "activeTab": "my-trips" }));

    let state = env.run(&["state"]);
    assert_eq!(state["tab"]["activeTab"], "my-trips");
}

#[test]
fn test_invalid_tab_rejected() {
    let env = TestEnv::new();
    env.cmd()
        .args(["tab", "settings"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Invalid tab"));
}

#[test]
fn test_logout_clears_session() {
    let env = TestEnv::new();
    env.login();
    env.run(&["login-fail", "--msg", "Wrong password"]);
    env.login();

    let state = env.run(&["logout"]);
    assert_eq!(state["auth"]["isLoggedIn"], false);
    assert_eq!(state["auth"]["token"], Value::Null);
    assert_eq!(state["auth"]["userId"], Value::Null);
    assert_eq!(state["auth"]["msg"], "");

    let state = env.run(&["state"]);
    assert_eq!(state["auth"]["isLoggedIn"], false);
}

#[test]
fn test_login_fail_keeps_message() {
    let env = TestEnv::new();
    let state = env.run(&["login-fail", "--msg", "Wrong password"]);
    assert_eq!(state["auth"]["msg"], "Wrong password");
    assert_eq!(state["auth"]["isLoggedIn"], false);
}

#[test]
fn test_check_auth_uses_stored_token() {
    let env = TestEnv::new();
    env.login();

    let state = env.run(&["check-auth"]);
    assert_eq!(state["auth"]["isLoggedIn"], true);
    assert_eq!(state["auth"]["token"], "tok123");
    // Revalidation drops the profile fields
    assert_eq!(state["auth"]["firstName"], Value::Null);
    assert_eq!(state["auth"]["avatar"], Value::Null);
}

#[test]
fn test_check_auth_with_empty_token_logs_out() {
    let env = TestEnv::new();
    env.login();

    let state = env.run(&["check-auth", "--token", ""]);
    assert_eq!(state["auth"]["isLoggedIn"], false);
    assert_eq!(state["auth"]["token"], Value::Null);
}

#[test]
fn test_avatar_and_cover_updates() {
    let env = TestEnv::new();
    env.login();
    env.run(&["avatar", "b.png"]);
    let state = env.run(&["cover", "d.png"]);

    assert_eq!(state["auth"]["avatar"], "b.png");
    assert_eq!(state["auth"]["cover"], "d.png");
    assert_eq!(state["auth"]["token"], "tok123");
}

#[test]
fn test_dispatch_raw_action() {
    let env = TestEnv::new();
    let state = env.run(&["dispatch", r#"{"type":"tab-group"}"#]);
    assert_eq!(state["tab"]["activeTab"], "group");
}

#[test]
fn test_dispatch_from_stdin() {
    let env = TestEnv::new();
    let output = env
        .cmd()
        .args(["dispatch", "-"])
        .write_stdin(r#"{"type":"login-fail","data":{"msg":"Account locked"}}"#)
        .output()
        .unwrap();
    assert!(output.status.success());

    let state: Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(state["auth"]["msg"], "Account locked");
}

#[test]
fn test_dispatch_unknown_type_is_ignored() {
    let env = TestEnv::new();
    env.run(&["tab", "explore"]);

    let state = env.run(&["dispatch", r#"{"type":"feed/refresh","data":{"page":2}}"#]);
    assert_eq!(state["tab"]["activeTab"], "explore");
    assert_eq!(state["auth"]["isLoggedIn"], false);
}

#[test]
fn test_dispatch_malformed_payload_degrades() {
    let env = TestEnv::new();
    let state = env.run(&[
        "dispatch",
        r#"{"type":"login-success","data":{"userId":7,"userProfile":null,"token":"t"}}"#,
    ]);
    assert_eq!(state["auth"]["userId"], "7");
    assert_eq!(state["auth"]["firstName"], Value::Null);
    assert_eq!(state["auth"]["isLoggedIn"], true);
}

#[test]
fn test_dispatch_without_type_is_invalid_input() {
    let env = TestEnv::new();
    env.cmd()
        .args(["dispatch", r#"{"data":{}}"#])
        .assert()
        .code(3)
        .stderr(predicate::str::contains("Invalid input"));
}

#[test]
fn test_corrupted_storage_falls_back_to_defaults() {
    let env = TestEnv::new();
    env.login();
    fs::write(env.state_path.join("auth.json"), "{not json").unwrap();

    let state = env.run(&["state"]);
    assert_eq!(state["auth"]["isLoggedIn"], false);
    assert_eq!(state["auth"]["token"], Value::Null);
}

#[test]
fn test_reset_clears_persisted_state() {
    let env = TestEnv::new();
    env.login();
    env.run(&["tab", "profile"]);

    env.cmd()
        .arg("reset")
        .assert()
        .success()
        .stdout(predicate::str::contains("Persisted state cleared"));

    assert!(!env.state_path.join("auth.json").exists());
    let state = env.run(&["state"]);
    assert_eq!(state["auth"]["isLoggedIn"], false);
    assert_eq!(state["tab"]["activeTab"], "home");
}

#[test]
fn test_sqlite_backend_round_trip() {
    let env = TestEnv::with_backend("sqlite", "state.db");
    env.login();
    env.run(&["tab", "message"]);

    let state = env.run(&["state"]);
    assert_eq!(state["auth"]["token"], "tok123");
    assert_eq!(state["tab"]["activeTab"], "message");
    assert!(env.state_path.exists());
}

#[test]
fn test_explicit_config_flag() {
    let env = TestEnv::new();
    let output = Command::cargo_bin("wayfarer")
        .unwrap()
        .env_remove("WAYFARER_CONFIG")
        .arg("--config")
        .arg(&env.config_path)
        .args(["tab", "explore"])
        .output()
        .unwrap();
    assert!(output.status.success());
    assert!(env.state_path.join("tab.json").exists());
}

#[test]
fn test_missing_config_file_is_an_error_with_flag() {
    let env = TestEnv::new();
    env.cmd()
        .args(["--config", "/nonexistent/wayfarer.toml", "state"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Failed to load config"));
}

#[test]
fn test_unopenable_sqlite_falls_back_to_defaults() {
    let env = TestEnv::with_backend("sqlite", "not-a-dir/state.db");
    // A regular file where the database directory should be
    fs::write(env.state_path.parent().unwrap(), "").unwrap();

    let state = env.run(&["state"]);
    assert_eq!(state["auth"]["isLoggedIn"], false);
    assert_eq!(state["tab"]["activeTab"], "home");

    let state = env.run(&["tab", "explore"]);
    assert_eq!(state["tab"]["activeTab"], "explore");

    // Nothing was persisted
    let state = env.run(&["state"]);
    assert_eq!(state["tab"]["activeTab"], "home");
}
