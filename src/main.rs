//! seekmin CLI: md5sum-style checksums with sequential reads and parallel hashing.

use anyhow::Result;
use clap::Parser;
use seekmin::engine::arg_parser::Cli;
use seekmin::engine::handle_run;
use std::time::Instant;

fn main() -> Result<()> {
    let start_time = Instant::now();
    let cli = Cli::parse();
    handle_run(&cli)?;
    log::debug!("Total time: {:?}", start_time.elapsed());
    Ok(())
}
