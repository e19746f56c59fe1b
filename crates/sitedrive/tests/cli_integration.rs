//! CLI integration tests for the sitedrive command-line interface.
//!
//! These tests verify:
//! - Help text is displayed correctly
//! - Argument parsing works as expected
//! - Authentication outcomes that need no network (pending sign-in,
//!   platform misconfiguration, missing settings)
//!
//! Each test runs in an empty temporary directory with its own config
//! directory so no user configuration or cached sign-in leaks in.

use assert_cmd::Command;
use predicates::prelude::*;
use tempfile::TempDir;

const SITEDRIVE_VARS: &[&str] = &[
    "CLIENT_ID",
    "TENANT_ID",
    "CLIENT_SECRET",
    "AUTHORITY",
    "REDIRECT_URI",
    "GRAPH_API_ENDPOINT",
    "SITEDRIVE_MAX_PAGES",
    "SHAREPOINT_SITE_URL",
    "WEBSITE_AUTH_ENABLED",
    "MS_TOKEN_AAD_ACCESS_TOKEN",
];

/// Get a command for the sitedrive binary, isolated in `home`.
fn sitedrive(home: &TempDir) -> Command {
    let mut cmd = Command::cargo_bin("sitedrive").unwrap();
    for var in SITEDRIVE_VARS {
        cmd.env_remove(var);
    }
    cmd.current_dir(home.path())
        .env("SITEDRIVE_CONFIG_DIR", home.path().join("config"));
    cmd
}

fn home() -> TempDir {
    TempDir::new().unwrap()
}

// ─────────────────────────────────────────────────────────────────────────────
// Help and Version Tests
// ─────────────────────────────────────────────────────────────────────────────

#[test]
fn test_help_displays() {
    let home = home();
    sitedrive(&home)
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("sitedrive"))
        .stdout(predicate::str::contains("SharePoint"));
}

#[test]
fn test_version_displays() {
    let home = home();
    sitedrive(&home)
        .arg("--version")
        .assert()
        .success()
        .stdout(predicate::str::contains("sitedrive"));
}

#[test]
fn test_help_lists_subcommands() {
    let home = home();
    sitedrive(&home)
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("auth"))
        .stdout(predicate::str::contains("ls"))
        .stdout(predicate::str::contains("search"))
        .stdout(predicate::str::contains("get"));
}

#[test]
fn test_help_lists_global_flags() {
    let home = home();
    sitedrive(&home)
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("--site"))
        .stdout(predicate::str::contains("--endpoint"))
        .stdout(predicate::str::contains("--json"))
        .stdout(predicate::str::contains("--verbose"));
}

// ─────────────────────────────────────────────────────────────────────────────
// Subcommand Help Tests
// ─────────────────────────────────────────────────────────────────────────────

#[test]
fn test_auth_subcommands_listed() {
    let home = home();
    sitedrive(&home)
        .args(["auth", "--help"])
        .assert()
        .success()
        .stdout(predicate::str::contains("login"))
        .stdout(predicate::str::contains("status"))
        .stdout(predicate::str::contains("logout"));
}

#[test]
fn test_login_help_shows_app_flag() {
    let home = home();
    sitedrive(&home)
        .args(["auth", "login", "--help"])
        .assert()
        .success()
        .stdout(predicate::str::contains("--app"));
}

#[test]
fn test_get_help_shows_output_flag() {
    let home = home();
    sitedrive(&home)
        .args(["get", "--help"])
        .assert()
        .success()
        .stdout(predicate::str::contains("--output"));
}

// ─────────────────────────────────────────────────────────────────────────────
// Invalid Input Tests
// ─────────────────────────────────────────────────────────────────────────────

#[test]
fn test_unknown_subcommand_fails() {
    let home = home();
    sitedrive(&home)
        .arg("nonexistent-command")
        .assert()
        .failure()
        .stderr(predicate::str::contains("unrecognized subcommand"));
}

#[test]
fn test_search_requires_query() {
    let home = home();
    sitedrive(&home).arg("search").assert().failure();
}

#[test]
fn test_get_rejects_path_without_file_name() {
    let home = home();
    sitedrive(&home)
        .args(["get", "/"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("--output"));
}

// ─────────────────────────────────────────────────────────────────────────────
// Authentication Tests
// ─────────────────────────────────────────────────────────────────────────────

#[test]
fn test_interactive_mode_requires_client_id() {
    let home = home();
    sitedrive(&home)
        .args(["ls", "--site", "https://contoso.sharepoint.com/sites/demo"])
        .assert()
        .code(1)
        .stderr(predicate::str::contains("client_id"));
}

#[test]
fn test_pending_sign_in_is_not_an_error() {
    let home = home();
    sitedrive(&home)
        .env("CLIENT_ID", "client-1")
        .env("TENANT_ID", "tenant-1")
        .args(["ls", "--site", "https://contoso.sharepoint.com/sites/demo"])
        .assert()
        .success()
        .stderr(predicate::str::contains("sitedrive auth login"));
}

#[test]
fn test_cancelled_sign_in_is_a_warning() {
    let home = home();
    sitedrive(&home)
        .env("CLIENT_ID", "client-1")
        .env("TENANT_ID", "tenant-1")
        .args(["auth", "login"])
        .write_stdin("")
        .assert()
        .success()
        .stderr(predicate::str::contains("Sign-in failed"))
        .stderr(predicate::str::contains("no redirect URL provided"))
        .stderr(predicate::str::contains("Error:").not());
}

#[test]
fn test_app_sign_in_without_secret_is_a_warning() {
    let home = home();
    sitedrive(&home)
        .env("CLIENT_ID", "client-1")
        .env("TENANT_ID", "tenant-1")
        .args(["auth", "login", "--app"])
        .assert()
        .success()
        .stderr(predicate::str::contains("Sign-in failed"));
}

#[test]
fn test_auth_status_json_signed_out() {
    let home = home();
    sitedrive(&home)
        .env("CLIENT_ID", "client-1")
        .env("TENANT_ID", "tenant-1")
        .args(["--json", "auth", "status"])
        .assert()
        .success()
        .stdout(predicate::str::contains("\"mode\": \"interactive\""))
        .stdout(predicate::str::contains("\"state\": \"signed out\""));
}

#[test]
fn test_logout_without_session() {
    let home = home();
    sitedrive(&home)
        .env("CLIENT_ID", "client-1")
        .env("TENANT_ID", "tenant-1")
        .args(["auth", "logout"])
        .assert()
        .success()
        .stdout(predicate::str::contains("No cached sign-in found"));
}

#[test]
fn test_managed_mode_without_token_is_misconfigured() {
    let home = home();
    sitedrive(&home)
        .env("WEBSITE_AUTH_ENABLED", "true")
        .args(["ls", "--site", "https://contoso.sharepoint.com/sites/demo"])
        .assert()
        .code(1)
        .stderr(predicate::str::contains("X-MS-TOKEN-AAD-ACCESS-TOKEN"));
}

#[test]
fn test_managed_mode_status() {
    let home = home();
    sitedrive(&home)
        .env("MS_TOKEN_AAD_ACCESS_TOKEN", "injected")
        .args(["auth", "status"])
        .assert()
        .success()
        .stdout(predicate::str::contains("managed platform"))
        .stdout(predicate::str::contains("signed in"));
}

#[test]
fn test_missing_site_is_reported() {
    let home = home();
    sitedrive(&home)
        .env("MS_TOKEN_AAD_ACCESS_TOKEN", "injected")
        .arg("ls")
        .assert()
        .code(1)
        .stderr(predicate::str::contains("No site configured"));
}

#[test]
fn test_project_config_is_read() {
    let home = home();
    std::fs::write(
        home.path().join("sitedrive.toml"),
        "[identity]\nclient_id = \"from-file\"\ntenant_id = \"tenant-1\"\n",
    )
    .unwrap();

    sitedrive(&home)
        .args(["ls", "--site", "https://contoso.sharepoint.com/sites/demo"])
        .assert()
        .success()
        .stderr(predicate::str::contains("sitedrive auth login"));
}
