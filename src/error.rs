//! Error taxonomy for ledger reads, writes, merges, and aggregation.
//!
//! Every variant carries the path of the ledger (or course directory) it
//! concerns so messages surfaced to the user always name the file involved.
//! Command handlers wrap these with `anyhow::Context` for extra detail.

use std::{io, path::PathBuf};

use thiserror::Error;

#[derive(Debug, Error)]
pub enum LedgerError {
    #[error("No grades<N>.csv ledgers found in {dir:?}")]
    MissingLedger { dir: PathBuf },

    #[error("Ledger {path:?} has no recognizable Name column (header: {headers:?})")]
    MalformedHeader { path: PathBuf, headers: Vec<String> },

    #[error("Ledger {path:?} repeats the column '{column}'")]
    DuplicateColumn { path: PathBuf, column: String },

    #[error("I/O failure on {path:?}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("Unreadable delimited text in {path:?}: {source}")]
    Csv {
        path: PathBuf,
        #[source]
        source: csv::Error,
    },

    #[error("Update for {path:?} has no Name value to match a row on")]
    MissingName { path: PathBuf },
}

impl LedgerError {
    pub fn io(path: impl Into<PathBuf>, source: io::Error) -> Self {
        LedgerError::Io {
            path: path.into(),
            source,
        }
    }

    pub fn csv(path: impl Into<PathBuf>, source: csv::Error) -> Self {
        LedgerError::Csv {
            path: path.into(),
            source,
        }
    }

    /// Path of the file or directory the failure concerns.
    pub fn path(&self) -> &std::path::Path {
        match self {
            LedgerError::MissingLedger { dir } => dir,
            LedgerError::MalformedHeader { path, .. }
            | LedgerError::DuplicateColumn { path, .. }
            | LedgerError::Io { path, .. }
            | LedgerError::Csv { path, .. }
            | LedgerError::MissingName { path } => path,
        }
    }
}

pub type LedgerResult<T> = std::result::Result<T, LedgerError>;
