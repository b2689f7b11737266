use anyhow::{Context, Result, anyhow};
use log::info;

use crate::{
    cli::SummaryArgs,
    course::{self, CourseInfo},
    io_utils,
    ledger::Ledger,
    publish::{self, Destination, ReportDocument},
    report,
};

pub fn execute(args: &SummaryArgs) -> Result<()> {
    let ledgers = course::discover_ledgers(&args.course)
        .with_context(|| format!("Scanning course directory {:?}", args.course))?;
    let file = match args.assignment {
        Some(number) => ledgers
            .into_iter()
            .find(|file| file.number == number)
            .ok_or_else(|| {
                anyhow!(
                    "No ledger for assignment {number} in {:?}",
                    args.course
                )
            })?,
        // discover_ledgers never returns an empty list
        None => ledgers
            .into_iter()
            .last()
            .ok_or_else(|| anyhow!("No ledgers in {:?}", args.course))?,
    };

    let delimiter = io_utils::resolve_input_delimiter(&file.path, args.delimiter);
    let ledger = Ledger::load(&file.path, delimiter)
        .with_context(|| format!("Loading ledger {:?}", file.path))?;
    let report = report::assignment_report(file.number, &ledger, &file.path)
        .with_context(|| format!("Building report for {:?}", file.path))?;
    info!(
        "Summarised {} student(s) for assignment {}",
        report.feedback.len(),
        file.number
    );

    let info = CourseInfo::load(&args.course);
    let document = ReportDocument::new(
        &args.course,
        &info,
        format!("Problem Sheet {}", file.number),
        report,
    );
    let destination = Destination::choose(
        args.output.as_deref(),
        args.save,
        &args.course,
        &format!("Summary_{}_{}", document.course, file.number),
        args.format,
    );
    publish::publish(&document, args.format, &destination)
}
