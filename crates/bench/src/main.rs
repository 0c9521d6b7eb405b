//! Benchmark harness executable for convforge.

use anyhow::Result;
use clap::Parser;
use convforge_bench::cli::{run_cli, Cli};

fn main() -> Result<()> {
    let cli = Cli::parse();
    run_cli(cli)
}
