use anyhow::{Context, Result};
use log::warn;

use crate::{
    aggregate,
    cli::TermlyArgs,
    course::CourseInfo,
    io_utils::DEFAULT_CSV_DELIMITER,
    publish::{self, Destination, ReportDocument, SkippedLedger},
    report,
};

pub fn execute(args: &TermlyArgs) -> Result<()> {
    let delimiter = args.delimiter.unwrap_or(DEFAULT_CSV_DELIMITER);
    let run = aggregate::aggregate_directory(&args.course, delimiter)
        .with_context(|| format!("Aggregating ledgers in {:?}", args.course))?;
    if run.sources.is_empty() {
        warn!("Every ledger in {:?} was skipped", args.course);
    }

    let info = CourseInfo::load(&args.course);
    let mut document = ReportDocument::new(
        &args.course,
        &info,
        "Termly Summary",
        report::term_report(&run.aggregate),
    );
    document.skipped = run.failures.iter().map(SkippedLedger::from).collect();
    let destination = Destination::choose(
        args.output.as_deref(),
        args.save,
        &args.course,
        &format!(
            "TermlySummary_{}_{}",
            document.course,
            document.generated.format("%Y-%m-%d")
        ),
        args.format,
    );
    publish::publish(&document, args.format, &destination)
}
