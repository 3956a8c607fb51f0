use predicates::prelude::*;
use std::fs;
use test_env::TestEnv;

#[test]
fn test_login_creates_session() {
    let env = TestEnv::new();

    env.cmd()
        .args(["login", "ana", "--name", "Ana"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Logged in as Ana (ana)"));
    assert!(env.session_path().exists());

    env.cmd()
        .arg("whoami")
        .assert()
        .success()
        .stdout(predicate::str::contains("Ana (ana)"))
        .stdout(predicate::str::contains("Running timers: 0"));
}

#[test]
fn test_login_is_stable_per_username() {
    let env = TestEnv::new();
    env.cmd().args(["login", "ana"]).assert().success();
    let first: serde_json::Value = serde_json::from_str(&fs::read_to_string(env.session_path()).unwrap()).unwrap();

    env.cmd().args(["login", "ana"]).assert().success();
    let second: serde_json::Value = serde_json::from_str(&fs::read_to_string(env.session_path()).unwrap()).unwrap();

    assert_eq!(first["user_id"], second["user_id"]);
}

#[test]
fn test_usernames_match_exactly() {
    let env = TestEnv::new();
    env.cmd().args(["login", "ana"]).assert().success();
    env.cmd().args(["add", "--date", test_env::DAY, "Only for ana"]).assert().success();

    env.cmd().args(["login", "Ana"]).assert().success();
    env.cmd()
        .args(["list", "--date", test_env::DAY])
        .assert()
        .success()
        .stdout(predicate::str::contains("No tasks."));
}

#[test]
fn test_commands_require_login() {
    let env = TestEnv::new();

    env.cmd()
        .args(["list"])
        .assert()
        .failure()
        .code(1)
        .stderr(predicate::str::starts_with("Error:"))
        .stderr(predicate::str::contains("Not logged in"));
}

#[test]
fn test_logout() {
    let env = TestEnv::logged_in();

    env.cmd()
        .arg("logout")
        .assert()
        .success()
        .stdout(predicate::str::contains("Logged out."));
    assert!(!env.session_path().exists());

    env.cmd()
        .arg("logout")
        .assert()
        .success()
        .stdout(predicate::str::contains("Not logged in."));

    env.cmd().arg("whoami").assert().failure().code(1);
}

#[test]
fn test_empty_username_rejected() {
    let env = TestEnv::new();

    env.cmd()
        .args(["login", "  "])
        .assert()
        .failure()
        .code(1)
        .stderr(predicate::str::starts_with("Error:"));
    assert!(!env.session_path().exists());
}

#[test]
fn test_corrupt_session_means_logged_out() {
    let env = TestEnv::logged_in();
    fs::write(env.session_path(), "garbage").unwrap();

    env.cmd()
        .arg("whoami")
        .assert()
        .failure()
        .code(1)
        .stderr(predicate::str::contains("Not logged in"));
}
