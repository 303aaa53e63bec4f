//! Fanpipe CLI: run the pipeline over a directory of payload files.

use anyhow::Result;
use clap::Parser;
use fanpipe::engine::arg_parser::Cli;
use fanpipe::engine::handle_run;
use std::time::Instant;

fn main() -> Result<()> {
    let start_time = Instant::now();
    let cli = Cli::parse();
    handle_run(&cli)?;
    log::debug!("Total time: {:?}", start_time.elapsed());
    Ok(())
}
