use anyhow::{Context, Result};
use log::info;

use crate::{cli::PreviewArgs, io_utils, ledger::Ledger, table};

pub fn execute(args: &PreviewArgs) -> Result<()> {
    let delimiter = io_utils::resolve_input_delimiter(&args.input, args.delimiter);
    let ledger = Ledger::load(&args.input, delimiter)
        .with_context(|| format!("Loading ledger {:?}", args.input))?;
    let rows = ledger
        .rows()
        .iter()
        .take(args.rows)
        .cloned()
        .collect::<Vec<_>>();
    let max_width = (args.max_width > 0).then_some(args.max_width);

    print!(
        "{}",
        table::render_table_clipped(ledger.headers(), &rows, max_width)
    );
    info!(
        "Displayed {} of {} row(s) from {:?}",
        rows.len(),
        ledger.row_count(),
        args.input
    );
    Ok(())
}
