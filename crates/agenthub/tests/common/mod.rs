//! Common test utilities for AgentHub integration tests
#![allow(dead_code)]

use assert_cmd::Command;
use std::path::PathBuf;
use tempfile::{tempdir, TempDir};

/// Isolated HOME with its own config and store
pub struct TestEnv {
    pub temp_dir: TempDir,
    pub data_dir: PathBuf,
}

impl TestEnv {
    pub fn new() -> anyhow::Result<Self> {
        let temp_dir = tempdir()?;
        let data_dir = temp_dir.path().join(".agenthub");
        Ok(Self { temp_dir, data_dir })
    }

    pub fn config_file(&self) -> PathBuf {
        self.data_dir.join("config.json")
    }

    pub fn store_file(&self) -> PathBuf {
        self.data_dir.join("agenthub.db")
    }

    /// Command running against this environment, with no API key
    pub fn command(&self) -> Command {
        let mut cmd = Command::new(env!("CARGO_BIN_EXE_agenthub"));
        cmd.env("HOME", self.temp_dir.path());
        cmd.env_remove("ANTHROPIC_API_KEY");
        cmd.env_remove("WORKER_ID");
        cmd.env_remove("RUST_LOG");
        cmd
    }

    /// Run `args` and return stdout, panicking on failure
    pub fn run(&self, args: &[&str]) -> String {
        let output = self
            .command()
            .args(args)
            .output()
            .expect("Failed to execute agenthub");
        assert!(
            output.status.success(),
            "agenthub {:?} failed: {}",
            args,
            String::from_utf8_lossy(&output.stderr)
        );
        String::from_utf8_lossy(&output.stdout).into_owned()
    }

    /// Submit a task and return its id
    pub fn submit(&self, extra: &[&str]) -> String {
        let mut args = vec!["submit", "-a", "bookkeeper", "-t", "Categorize last week"];
        args.extend_from_slice(extra);
        let stdout = self.run(&args);
        task_id(&stdout).expect("submit printed no task id")
    }
}

impl Default for TestEnv {
    fn default() -> Self {
        Self::new().expect("Failed to create test environment")
    }
}

/// Task id from `submit` output
pub fn task_id(stdout: &str) -> Option<String> {
    stdout
        .lines()
        .find_map(|line| line.split("Task submitted: ").nth(1))
        .map(|id| id.trim().to_string())
}
