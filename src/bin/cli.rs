// src/bin/cli.rs
use afl_stats_sync::{cli::{self, Cli, ConsoleProgress}, log, runner};
use clap::Parser;
use color_eyre::eyre::{Result, WrapErr};

fn main() -> Result<()> {
    color_eyre::install()?;
    let args = Cli::parse();
    log::init(&args.store, args.verbose).wrap_err("cannot set up logging")?;

    let mut progress = ConsoleProgress::default();
    let summary = runner::run(&args.options(), &mut progress)?;
    cli::print_summary(&summary);
    Ok(())
}
