//! Shared test utilities for binary tests

use std::path::PathBuf;

/// Cached binary path for the relay CLI to avoid repeated lookups
#[allow(deprecated)]
pub static RELAY_BIN: std::sync::LazyLock<PathBuf> =
    std::sync::LazyLock::new(|| assert_cmd::cargo::cargo_bin("relay"));

/// Test helper to create a command with the cached binary
pub fn relay_cmd() -> assert_cmd::Command {
    let mut cmd = assert_cmd::Command::new(&*RELAY_BIN);
    cmd.env_remove("RELAY_CATALOG")
        .env_remove("RELAY_CONFIG")
        .env_remove("RELAY_SHOW_HIDDEN")
        .env("RELAY_CONFIG_DIR", std::env::temp_dir().join("relay-cli-tests-empty"));
    cmd
}
