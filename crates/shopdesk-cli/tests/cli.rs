use assert_cmd::Command;
use predicates::prelude::*;
use tempfile::tempdir;

fn shopdesk() -> Command {
    let mut cmd = Command::cargo_bin("shopdesk").unwrap();
    cmd.env_remove("SHOPDESK_API_URL").env_remove("RUST_LOG");
    cmd
}

#[test]
fn test_help_lists_commands() {
    shopdesk()
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("product"))
        .stdout(predicate::str::contains("order"))
        .stdout(predicate::str::contains("app-config"))
        .stdout(predicate::str::contains("SHOPDESK_API_URL"));
}

#[test]
fn test_config_show_defaults() {
    let dir = tempdir().unwrap();
    shopdesk()
        .args(["--config-dir", dir.path().to_str().unwrap(), "config", "show"])
        .assert()
        .success()
        .stdout(predicate::str::contains("page_size"))
        .stdout(predicate::str::contains("http://localhost:5000/api"));
}

#[test]
fn test_config_set_persists() {
    let dir = tempdir().unwrap();
    let dir_arg = dir.path().to_str().unwrap();

    shopdesk()
        .args(["--config-dir", dir_arg, "config", "set", "page_size", "25"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Set page_size to 25"));

    shopdesk()
        .args(["--config-dir", dir_arg, "--format", "json", "config", "show"])
        .assert()
        .success()
        .stdout(predicate::str::contains("\"page_size\": 25"));
}

#[test]
fn test_config_set_rejects_bad_values() {
    let dir = tempdir().unwrap();
    let dir_arg = dir.path().to_str().unwrap();

    shopdesk()
        .args(["--config-dir", dir_arg, "config", "set", "page_size", "many"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("page_size"));

    shopdesk()
        .args(["--config-dir", dir_arg, "config", "set", "api_url", "not a url"])
        .assert()
        .failure();

    assert!(!dir.path().join("config.toml").exists());
}

#[test]
fn test_resource_commands_require_login() {
    let dir = tempdir().unwrap();
    shopdesk()
        .args(["--config-dir", dir.path().to_str().unwrap(), "product", "list"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("not signed in"))
        .stderr(predicate::str::contains("auth login"));
}

#[test]
fn test_auth_status_without_session() {
    let dir = tempdir().unwrap();
    shopdesk()
        .args(["--config-dir", dir.path().to_str().unwrap(), "auth", "status"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Not signed in."));
}

#[test]
fn test_invalid_enum_value_is_rejected_by_parser() {
    shopdesk()
        .args(["order", "list", "--order-status", "lost"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("unknown order status"));
}
