//! Writes finished reports as text or JSON to a file, stdout, or the
//! course's report directory.

use std::{
    io::Write,
    path::{Path, PathBuf},
};

use anyhow::{Context, Result};
use chrono::{Local, NaiveDate};
use log::info;
use serde::Serialize;

use crate::{
    aggregate::LedgerFailure,
    cli::ReportFormat,
    course::{self, CourseInfo},
    io_utils,
    report::{AssignmentReport, TermReport},
};

pub trait TextReport {
    fn render_text(&self) -> String;
}

impl TextReport for AssignmentReport {
    fn render_text(&self) -> String {
        AssignmentReport::render_text(self)
    }
}

impl TextReport for TermReport {
    fn render_text(&self) -> String {
        TermReport::render_text(self)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SkippedLedger {
    pub path: PathBuf,
    pub error: String,
}

impl From<&LedgerFailure> for SkippedLedger {
    fn from(failure: &LedgerFailure) -> Self {
        SkippedLedger {
            path: failure.path.clone(),
            error: failure.error.to_string(),
        }
    }
}

/// A report plus the metadata the renderer puts on its title page.
#[derive(Debug, Clone, Serialize)]
pub struct ReportDocument<T> {
    pub title: String,
    pub subtitle: String,
    pub course: String,
    pub term: Option<String>,
    pub generated: NaiveDate,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub skipped: Vec<SkippedLedger>,
    pub report: T,
}

impl<T: Serialize + TextReport> ReportDocument<T> {
    pub fn new(course_dir: &Path, info: &CourseInfo, subtitle: impl Into<String>, report: T) -> Self {
        ReportDocument {
            title: info.title_for(course_dir),
            subtitle: subtitle.into(),
            course: info.abbreviation_for(course_dir),
            term: info.term.clone(),
            generated: Local::now().date_naive(),
            skipped: Vec::new(),
            report,
        }
    }

    pub fn render(&self, format: ReportFormat) -> Result<String> {
        match format {
            ReportFormat::Json => {
                let mut json =
                    serde_json::to_string_pretty(self).context("Serializing report to JSON")?;
                json.push('\n');
                Ok(json)
            }
            ReportFormat::Text => {
                let mut out = format!("{}\n{}\n", self.title, self.subtitle);
                if let Some(term) = &self.term {
                    out.push_str(term);
                    out.push('\n');
                }
                out.push_str(&format!("Generated {}\n\n", self.generated));
                out.push_str(&self.report.render_text());
                if !self.skipped.is_empty() {
                    out.push_str("\nSkipped ledgers\n");
                    for skipped in &self.skipped {
                        out.push_str(&format!("  {}: {}\n", skipped.path.display(), skipped.error));
                    }
                }
                Ok(out)
            }
        }
    }
}

/// Where a report goes: an explicit path, the default file name under the
/// course's report directory, or stdout.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Destination {
    Stdout,
    File(PathBuf),
}

impl Destination {
    pub fn choose(
        output: Option<&Path>,
        save: bool,
        course_dir: &Path,
        file_stem: &str,
        format: ReportFormat,
    ) -> Self {
        match output {
            Some(path) if !io_utils::is_dash(path) => Destination::File(path.to_path_buf()),
            Some(_) => Destination::Stdout,
            None if save => Destination::File(
                course::report_dir(course_dir).join(format!("{file_stem}.{}", format.extension())),
            ),
            None => Destination::Stdout,
        }
    }
}

pub fn publish<T: Serialize + TextReport>(
    document: &ReportDocument<T>,
    format: ReportFormat,
    destination: &Destination,
) -> Result<()> {
    let rendered = document.render(format)?;
    let target = match destination {
        Destination::File(path) => Some(path.as_path()),
        Destination::Stdout => None,
    };
    let mut writer = io_utils::open_output(target)?;
    writer
        .write_all(rendered.as_bytes())
        .and_then(|_| writer.flush())
        .with_context(|| format!("Writing {}", document.subtitle))?;
    if let Destination::File(path) = destination {
        info!("Wrote {} to {:?}", document.subtitle, path);
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::report::{Cell, Table};

    fn document() -> ReportDocument<AssignmentReport> {
        let report = AssignmentReport {
            assignment: 2,
            grades: Table {
                headers: vec!["Name".to_string(), "Overall".to_string()],
                rows: vec![vec![Cell::verbatim("Alice"), Cell::grade("3")]],
            },
            feedback: Vec::new(),
        };
        ReportDocument {
            title: "Linear Algebra".to_string(),
            subtitle: "Problem Sheet 2".to_string(),
            course: "LA".to_string(),
            term: None,
            generated: NaiveDate::from_ymd_opt(2025, 10, 3).unwrap(),
            skipped: Vec::new(),
            report,
        }
    }

    #[test]
    fn json_document_carries_metadata_and_omits_empty_skips() {
        let json: serde_json::Value =
            serde_json::from_str(&document().render(ReportFormat::Json).unwrap()).unwrap();
        assert_eq!(json["course"], "LA");
        assert_eq!(json["generated"], "2025-10-03");
        assert_eq!(json["report"]["assignment"], 2);
        assert!(json.get("skipped").is_none());
    }

    #[test]
    fn text_document_lists_skipped_ledgers() {
        let mut doc = document();
        doc.skipped.push(SkippedLedger {
            path: PathBuf::from("grades3.csv"),
            error: "no Name column".to_string(),
        });
        let text = doc.render(ReportFormat::Text).unwrap();
        assert!(text.starts_with("Linear Algebra\nProblem Sheet 2\nGenerated 2025-10-03\n"));
        assert!(text.contains("Alice"));
        assert!(text.contains("grades3.csv: no Name column"));
    }

    #[test]
    fn save_uses_report_directory_and_format_extension() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::create_dir(dir.path().join("Home")).unwrap();
        let destination =
            Destination::choose(None, true, dir.path(), "Summary_LA_2", ReportFormat::Json);
        assert_eq!(
            destination,
            Destination::File(dir.path().join("Home").join("Summary_LA_2.json"))
        );
        assert_eq!(
            Destination::choose(Some(Path::new("-")), false, dir.path(), "x", ReportFormat::Text),
            Destination::Stdout
        );
    }
}
