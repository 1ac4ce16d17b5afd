//! Shared setup for CLI integration tests.
//!
//! Every command runs with `DUMPSCOPE_CONFIG` pointing into the fixture's
//! temp dir, so a config file on the developer machine never leaks in.
#![cfg(test)]
#![allow(dead_code)]

use assert_cmd::Command;
use assert_cmd::cargo::cargo_bin_cmd;
use dumpscope_testing::UploadDir;
use std::path::PathBuf;

pub struct TestFixture {
    uploads: UploadDir,
}

impl Default for TestFixture {
    fn default() -> Self {
        Self::new()
    }
}

impl TestFixture {
    pub fn new() -> Self {
        Self {
            uploads: UploadDir::new().expect("Failed to create upload dir"),
        }
    }

    pub fn uploads(&self) -> &UploadDir {
        &self.uploads
    }

    pub fn config_path(&self) -> PathBuf {
        self.uploads.path().join("config").join("config.toml")
    }

    pub fn command(&self) -> Command {
        let mut cmd = cargo_bin_cmd!("dumpscope");
        cmd.env("DUMPSCOPE_CONFIG", self.config_path())
            .env_remove("DUMPSCOPE_LOG");
        cmd
    }

    /// Run with `--format json` and parse stdout, asserting success
    pub fn json(&self, args: &[&str]) -> serde_json::Value {
        let output = self
            .command()
            .args(args)
            .args(["--format", "json"])
            .output()
            .expect("Failed to run dumpscope");

        assert!(
            output.status.success(),
            "dumpscope {:?} failed: {}",
            args,
            String::from_utf8_lossy(&output.stderr)
        );
        serde_json::from_slice(&output.stdout).expect("stdout is JSON")
    }
}
