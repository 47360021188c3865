#![allow(dead_code)]

use std::fs;
use std::path::{Path, PathBuf};
use std::process;

use tempfile::TempDir;

/// WorkDir represents a directory in which tests are run.
#[derive(Debug)]
pub struct WorkDir {
    /// Removed when the WorkDir is dropped.
    root: TempDir,
    /// The directory in which the test will run.
    dir: PathBuf,
    /// Kept outside `dir` so it never shows up in test output.
    log: PathBuf,
}

impl WorkDir {
    /// Creates a fresh, empty working directory.
    pub fn new() -> WorkDir {
        let root = tempfile::tempdir().expect("failed to create temp dir");
        let dir = root.path().join("work");
        fs::create_dir(&dir).expect("failed to create work dir");
        let dir = dir.canonicalize().expect("failed to canonicalize work dir");
        let log = root.path().join("smallsh.log");
        WorkDir { root, dir, log }
    }

    pub fn path(&self) -> &Path {
        &self.dir
    }

    /// Creates a file in the working directory.
    pub fn create<P: AsRef<Path>>(&self, name: P, contents: &str) -> PathBuf {
        let path = self.dir.join(name);
        fs::write(&path, contents).expect("failed to write file");
        path
    }

    pub fn read<P: AsRef<Path>>(&self, name: P) -> String {
        fs::read_to_string(self.dir.join(name)).expect("failed to read file")
    }

    /// Builds a smallsh command running in this working directory.
    pub fn command(&self) -> assert_cmd::Command {
        let mut cmd = assert_cmd::Command::new(bin());
        cmd.current_dir(&self.dir)
            .env("HOME", &self.dir)
            .arg(format!("--log={}", self.log.display()));
        cmd
    }

    /// Like `command`, for tests that talk to the shell while it runs.
    pub fn std_command(&self) -> process::Command {
        let mut cmd = process::Command::new(bin());
        cmd.current_dir(&self.dir)
            .env("HOME", &self.dir)
            .arg(format!("--log={}", self.log.display()));
        cmd
    }
}

/// Returns path to executable.
fn bin() -> PathBuf {
    PathBuf::from(env!("CARGO_BIN_EXE_smallsh"))
}
