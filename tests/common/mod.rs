#![allow(dead_code)]

use std::fs;
use std::path::{Path, PathBuf};

use gradeledger::ledger::Ledger;
use tempfile::{TempDir, tempdir};

/// Returns the absolute path to a fixture under `tests/data`.
pub fn fixture_path(name: &str) -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR"))
        .join("tests")
        .join("data")
        .join(name)
}

/// Scratch course directory that is removed on drop.
pub struct TestWorkspace {
    temp_dir: TempDir,
}

impl TestWorkspace {
    pub fn new() -> Self {
        Self {
            temp_dir: tempdir().expect("temp dir"),
        }
    }

    /// Starts from a copy of the fixture course under `tests/data/course`.
    pub fn with_fixture_course() -> Self {
        let workspace = Self::new();
        let source = fixture_path("course");
        for entry in fs::read_dir(&source).expect("read fixture course") {
            let entry = entry.expect("fixture entry");
            fs::copy(entry.path(), workspace.path().join(entry.file_name()))
                .expect("copy fixture file");
        }
        workspace
    }

    pub fn path(&self) -> &Path {
        self.temp_dir.path()
    }

    pub fn file(&self, name: &str) -> PathBuf {
        self.temp_dir.path().join(name)
    }

    /// Writes `contents` into a file under the workspace and returns the path.
    pub fn write(&self, name: &str, contents: &str) -> PathBuf {
        let path = self.file(name);
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).expect("create parent dirs");
        }
        fs::write(&path, contents).expect("write temp file contents");
        path
    }

    pub fn read(&self, name: &str) -> String {
        fs::read_to_string(self.file(name)).expect("read workspace file")
    }

    pub fn ledger(&self, name: &str) -> Ledger {
        Ledger::load(&self.file(name), b',').expect("load ledger")
    }
}
