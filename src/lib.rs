pub mod aggregate;
pub mod cli;
pub mod columns;
pub mod course;
pub mod error;
pub mod grade;
pub mod identity;
pub mod io_utils;
pub mod ledger;
pub mod merge;
pub mod preview;
pub mod publish;
pub mod record;
pub mod report;
pub mod summary;
pub mod table;
pub mod termly;

use std::{env, sync::OnceLock};

use anyhow::Result;
use clap::Parser;
use log::LevelFilter;

use crate::cli::{Cli, Commands};

static LOGGER: OnceLock<()> = OnceLock::new();

fn init_logging() {
    LOGGER.get_or_init(|| {
        let mut builder = env_logger::Builder::from_env(env_logger::Env::default());
        if env::var("RUST_LOG").is_err() {
            builder.filter_module("gradeledger", LevelFilter::Info);
        }
        let _ = builder.format_timestamp_millis().try_init();
    });
}

pub fn run() -> Result<()> {
    init_logging();
    let cli = Cli::parse();
    match cli.command {
        Commands::Record(args) => record::execute_record(&args),
        Commands::Import(args) => record::execute_import(&args),
        Commands::Columns(args) => columns::execute(&args),
        Commands::Preview(args) => preview::execute(&args),
        Commands::Summary(args) => summary::execute(&args),
        Commands::Termly(args) => termly::execute(&args),
    }
}

pub(crate) fn printable_delimiter(delimiter: u8) -> String {
    match delimiter {
        b',' => ",".to_string(),
        b'\t' => "\\t".to_string(),
        other => (other as char).to_string(),
    }
}
