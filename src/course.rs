//! Course directory conventions.
//!
//! A course directory holds one `grades<N>.csv` ledger per assignment and an
//! optional `course_info.json` describing the course. Reports are written to
//! the `Home/` subdirectory when it exists.

use std::{
    fs,
    path::{Path, PathBuf},
    sync::LazyLock,
};

use log::{debug, warn};
use regex::Regex;
use serde::Deserialize;

use crate::error::{LedgerError, LedgerResult};

pub const COURSE_INFO_FILE: &str = "course_info.json";

static LEDGER_FILE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)^grades([0-9]+)\.csv$").expect("ledger file pattern compiles")
});

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LedgerFile {
    pub number: u32,
    pub path: PathBuf,
}

pub fn ledger_file_name(number: u32) -> String {
    format!("grades{number}.csv")
}

pub fn ledger_path(course_dir: &Path, number: u32) -> PathBuf {
    course_dir.join(ledger_file_name(number))
}

/// Assignment number encoded in a ledger file name.
pub fn parse_ledger_number(file_name: &str) -> Option<u32> {
    LEDGER_FILE
        .captures(file_name)
        .and_then(|caps| caps.get(1))
        .and_then(|digits| digits.as_str().parse().ok())
}

/// Lists ledgers in `course_dir` ordered by assignment number. When two files
/// carry the same number (`grades1.csv` and `Grades01.csv`) the first by file
/// name is kept.
pub fn discover_ledgers(course_dir: &Path) -> LedgerResult<Vec<LedgerFile>> {
    let entries = fs::read_dir(course_dir).map_err(|err| LedgerError::io(course_dir, err))?;
    let mut found = Vec::new();
    for entry in entries {
        let entry = entry.map_err(|err| LedgerError::io(course_dir, err))?;
        let path = entry.path();
        if !path.is_file() {
            continue;
        }
        let Some(number) = path
            .file_name()
            .and_then(|name| name.to_str())
            .and_then(parse_ledger_number)
        else {
            continue;
        };
        found.push(LedgerFile { number, path });
    }
    found.sort_by(|a, b| a.number.cmp(&b.number).then_with(|| a.path.cmp(&b.path)));

    let mut ledgers: Vec<LedgerFile> = Vec::with_capacity(found.len());
    for file in found {
        if let Some(previous) = ledgers.last()
            && previous.number == file.number
        {
            warn!(
                "Ignoring {:?}: assignment {} already provided by {:?}",
                file.path, file.number, previous.path
            );
            continue;
        }
        ledgers.push(file);
    }

    if ledgers.is_empty() {
        return Err(LedgerError::MissingLedger {
            dir: course_dir.to_path_buf(),
        });
    }
    debug!("Discovered {} ledger(s) in {:?}", ledgers.len(), course_dir);
    Ok(ledgers)
}

/// Highest assignment number with a ledger, or 1 for a fresh course.
pub fn latest_assignment(course_dir: &Path) -> LedgerResult<u32> {
    match discover_ledgers(course_dir) {
        Ok(ledgers) => Ok(ledgers.last().map_or(1, |file| file.number)),
        Err(LedgerError::MissingLedger { .. }) => Ok(1),
        Err(err) => Err(err),
    }
}

/// Optional `course_info.json` contents; unknown keys are ignored.
#[derive(Debug, Clone, Default, Deserialize, PartialEq, Eq)]
pub struct CourseInfo {
    #[serde(
        default,
        alias = "course_abbr",
        alias = "abbr",
        alias = "short_name",
        alias = "code",
        alias = "shortName",
        alias = "course_short_name"
    )]
    pub abbreviation: Option<String>,
    #[serde(default)]
    pub full_name: Option<String>,
    #[serde(default, alias = "termyear", alias = "term_year")]
    pub term: Option<String>,
}

impl CourseInfo {
    /// Reads `course_info.json`; a missing or unparsable file yields defaults.
    pub fn load(course_dir: &Path) -> Self {
        let path = course_dir.join(COURSE_INFO_FILE);
        let text = match fs::read_to_string(&path) {
            Ok(text) => text,
            Err(_) => {
                debug!("No readable {:?}; using defaults", path);
                return CourseInfo::default();
            }
        };
        serde_json::from_str(&text).unwrap_or_else(|err| {
            warn!("Ignoring unparsable {:?}: {err}", path);
            CourseInfo::default()
        })
    }

    /// Configured abbreviation, else the directory name stripped to ASCII
    /// alphanumerics, else `course`.
    pub fn abbreviation_for(&self, course_dir: &Path) -> String {
        if let Some(abbr) = self.abbreviation.as_deref().filter(|a| !a.trim().is_empty()) {
            return abbr.trim().to_string();
        }
        let stripped = course_dir
            .file_name()
            .and_then(|name| name.to_str())
            .unwrap_or_default()
            .chars()
            .filter(|c| c.is_ascii_alphanumeric())
            .collect::<String>();
        if stripped.is_empty() {
            "course".to_string()
        } else {
            stripped
        }
    }

    pub fn title_for(&self, course_dir: &Path) -> String {
        self.full_name
            .as_deref()
            .filter(|name| !name.trim().is_empty())
            .map(|name| name.trim().to_string())
            .unwrap_or_else(|| self.abbreviation_for(course_dir))
    }
}

/// Directory reports are written to: `Home/` when present, else the course.
pub fn report_dir(course_dir: &Path) -> PathBuf {
    let home = course_dir.join("Home");
    if home.is_dir() { home } else { course_dir.to_path_buf() }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn ledger_names_are_matched_case_insensitively() {
        assert_eq!(parse_ledger_number("grades12.csv"), Some(12));
        assert_eq!(parse_ledger_number("GRADES3.CSV"), Some(3));
        assert_eq!(parse_ledger_number("grades.csv"), None);
        assert_eq!(parse_ledger_number("grades1.csv.bak"), None);
        assert_eq!(parse_ledger_number("oldgrades1.csv"), None);
    }

    #[test]
    fn discovery_sorts_numerically_and_drops_duplicates() {
        let dir = tempdir().unwrap();
        for name in ["grades10.csv", "grades2.csv", "grades02.csv", "notes.csv"] {
            fs::write(dir.path().join(name), "Name\n").unwrap();
        }
        let ledgers = discover_ledgers(dir.path()).unwrap();
        let numbers = ledgers.iter().map(|l| l.number).collect::<Vec<_>>();
        assert_eq!(numbers, vec![2, 10]);
        assert!(ledgers[0].path.ends_with("grades02.csv"));
    }

    #[test]
    fn empty_course_reports_missing_ledger_and_defaults_latest_to_one() {
        let dir = tempdir().unwrap();
        assert!(matches!(
            discover_ledgers(dir.path()),
            Err(LedgerError::MissingLedger { .. })
        ));
        assert_eq!(latest_assignment(dir.path()).unwrap(), 1);
    }

    #[test]
    fn course_info_accepts_aliases_and_falls_back_to_directory_name() {
        let dir = tempdir().unwrap();
        let course = dir.path().join("Linear Algebra-2");
        fs::create_dir(&course).unwrap();
        assert_eq!(CourseInfo::load(&course).abbreviation_for(&course), "LinearAlgebra2");

        fs::write(
            course.join(COURSE_INFO_FILE),
            r#"{"abbr": "LA", "full_name": "Linear Algebra", "termyear": "MT25"}"#,
        )
        .unwrap();
        let info = CourseInfo::load(&course);
        assert_eq!(info.abbreviation_for(&course), "LA");
        assert_eq!(info.title_for(&course), "Linear Algebra");
        assert_eq!(info.term.as_deref(), Some("MT25"));
    }
}
