//! Mailsweep CLI: fan a search query out across many mailboxes and export
//! matching messages as JSON lines.

use anyhow::Result;
use clap::Parser;
use mailsweep::engine::arg_parser::Cli;
use mailsweep::engine::handle_run;
use std::time::Instant;

fn main() -> Result<()> {
    let start_time = Instant::now();
    let cli = Cli::parse();
    handle_run(&cli)?;
    log::debug!("Total time: {:?}", start_time.elapsed());
    Ok(())
}
