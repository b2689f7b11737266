use std::path::PathBuf;

use clap::{Args, Parser, Subcommand, ValueEnum};

#[derive(Debug, Parser)]
#[command(author, version, about = "Record and report per-assignment grades", long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Record one student's grades into an assignment ledger
    Record(RecordArgs),
    /// Merge every row of a CSV file into an assignment ledger
    Import(ImportArgs),
    /// List a ledger's columns with their classification
    Columns(ColumnsArgs),
    /// Preview the first few rows of a ledger in a formatted table
    Preview(PreviewArgs),
    /// Build the report for a single assignment
    Summary(SummaryArgs),
    /// Build the cross-term report for every student in a course
    Termly(TermlyArgs),
}

#[derive(Debug, Args)]
pub struct RecordArgs {
    /// Course directory holding the grades<N>.csv ledgers
    #[arg(short = 'c', long = "course", default_value = ".")]
    pub course: PathBuf,
    /// Assignment number (defaults to the latest ledger in the course)
    #[arg(short = 'a', long = "assignment", value_parser = parse_assignment)]
    pub assignment: Option<u32>,
    /// Student name used to find or create the row
    #[arg(short = 'n', long = "name")]
    pub name: String,
    /// Overall grade
    #[arg(long)]
    pub overall: Option<String>,
    /// Feedback text
    #[arg(long, conflicts_with = "feedback_file")]
    pub feedback: Option<String>,
    /// Read the feedback text from a file
    #[arg(long = "feedback-file")]
    pub feedback_file: Option<PathBuf>,
    /// Submission time to store verbatim
    #[arg(long = "submission-time", conflicts_with = "stamp_now")]
    pub submission_time: Option<String>,
    /// Store the current local time as the submission time
    #[arg(long = "stamp-now")]
    pub stamp_now: bool,
    /// Per-question grades in order; the first value is Q1
    #[arg(short = 'q', long = "question", action = clap::ArgAction::Append)]
    pub questions: Vec<String>,
    /// Additional `column=value` fields
    #[arg(long = "set", value_parser = parse_field, action = clap::ArgAction::Append)]
    pub fields: Vec<(String, String)>,
    /// Ledger delimiter character (supports ',', 'tab', ';', '|')
    #[arg(long, value_parser = parse_delimiter)]
    pub delimiter: Option<u8>,
}

#[derive(Debug, Args)]
pub struct ImportArgs {
    /// Course directory holding the grades<N>.csv ledgers
    #[arg(short = 'c', long = "course", default_value = ".")]
    pub course: PathBuf,
    /// Assignment number (defaults to the latest ledger in the course)
    #[arg(short = 'a', long = "assignment", value_parser = parse_assignment)]
    pub assignment: Option<u32>,
    /// CSV file with a Name column and one column per field to merge
    #[arg(short = 'i', long = "input")]
    pub input: PathBuf,
    /// Ledger delimiter character
    #[arg(long, value_parser = parse_delimiter)]
    pub delimiter: Option<u8>,
    /// Delimiter of the input file (defaults to its extension)
    #[arg(long = "input-delimiter", value_parser = parse_delimiter)]
    pub input_delimiter: Option<u8>,
}

#[derive(Debug, Args)]
pub struct ColumnsArgs {
    /// Ledger file to inspect
    #[arg(short = 'i', long = "input")]
    pub input: PathBuf,
    /// CSV delimiter character
    #[arg(long, value_parser = parse_delimiter)]
    pub delimiter: Option<u8>,
}

#[derive(Debug, Args)]
pub struct PreviewArgs {
    /// Ledger file to preview
    #[arg(short = 'i', long = "input")]
    pub input: PathBuf,
    /// Number of rows to display
    #[arg(long, default_value_t = 10)]
    pub rows: usize,
    /// CSV delimiter character
    #[arg(long, value_parser = parse_delimiter)]
    pub delimiter: Option<u8>,
    /// Clip cells longer than this many characters (0 disables clipping)
    #[arg(long = "max-width", default_value_t = 40)]
    pub max_width: usize,
}

#[derive(Debug, Clone, Copy, Default, ValueEnum, PartialEq, Eq)]
#[value(rename_all = "kebab-case")]
pub enum ReportFormat {
    #[default]
    Text,
    Json,
}

impl ReportFormat {
    pub fn extension(self) -> &'static str {
        match self {
            ReportFormat::Text => "txt",
            ReportFormat::Json => "json",
        }
    }
}

#[derive(Debug, Args)]
pub struct SummaryArgs {
    /// Course directory holding the grades<N>.csv ledgers
    #[arg(short = 'c', long = "course", default_value = ".")]
    pub course: PathBuf,
    /// Assignment number (defaults to the latest ledger in the course)
    #[arg(short = 'a', long = "assignment", value_parser = parse_assignment)]
    pub assignment: Option<u32>,
    /// Output format
    #[arg(long, value_enum, default_value = "text")]
    pub format: ReportFormat,
    /// Output file (stdout if omitted)
    #[arg(short = 'o', long = "output", conflicts_with = "save")]
    pub output: Option<PathBuf>,
    /// Write the report under the course's report directory
    #[arg(long)]
    pub save: bool,
    /// Ledger delimiter character
    #[arg(long, value_parser = parse_delimiter)]
    pub delimiter: Option<u8>,
}

#[derive(Debug, Args)]
pub struct TermlyArgs {
    /// Course directory holding the grades<N>.csv ledgers
    #[arg(short = 'c', long = "course", default_value = ".")]
    pub course: PathBuf,
    /// Output format
    #[arg(long, value_enum, default_value = "text")]
    pub format: ReportFormat,
    /// Output file (stdout if omitted)
    #[arg(short = 'o', long = "output", conflicts_with = "save")]
    pub output: Option<PathBuf>,
    /// Write the report under the course's report directory
    #[arg(long)]
    pub save: bool,
    /// Ledger delimiter character
    #[arg(long, value_parser = parse_delimiter)]
    pub delimiter: Option<u8>,
}

pub fn parse_delimiter(value: &str) -> Result<u8, String> {
    match value {
        "tab" | "\t" => Ok(b'\t'),
        "comma" | "," => Ok(b','),
        "|" | "pipe" => Ok(b'|'),
        ";" | "semicolon" => Ok(b';'),
        other => {
            let mut chars = other.chars();
            let first = chars
                .next()
                .ok_or_else(|| "Delimiter cannot be empty".to_string())?;
            if chars.next().is_some() {
                return Err("Delimiter must be a single character".to_string());
            }
            if !first.is_ascii() || first == '"' || first == '\n' {
                return Err(format!("Unsupported delimiter {first:?}"));
            }
            Ok(first as u8)
        }
    }
}

pub fn parse_assignment(value: &str) -> Result<u32, String> {
    match value.trim().parse::<u32>() {
        Ok(0) => Err("Assignment numbers start at 1".to_string()),
        Ok(number) => Ok(number),
        Err(_) => Err(format!("'{value}' is not an assignment number")),
    }
}

/// Parses `column=value`; the value may itself contain `=`.
pub fn parse_field(value: &str) -> Result<(String, String), String> {
    let (column, field) = value
        .split_once('=')
        .ok_or_else(|| format!("Expected column=value, got '{value}'"))?;
    let column = column.trim();
    if column.is_empty() {
        return Err(format!("Missing column name in '{value}'"));
    }
    Ok((column.to_string(), field.to_string()))
}
