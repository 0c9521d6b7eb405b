//! CLI wiring for the convforge benchmark harness.

use crate::driver::DriverOptions;
use crate::report::{BenchReport, ScenarioReport, ScenarioStatus};
use crate::scenario::default_suite;
use anyhow::Result;
use clap::{Parser, Subcommand};
use convforge_kernels::probe::CpuFeatures;
use convforge_runtime::TopologyParams;
use std::path::PathBuf;
use tracing::info;

#[derive(Parser, Debug)]
#[command(name = "convforge-bench", about = "Depthwise-convolution end-to-end benchmarks")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// List the scenarios available on this machine.
    List,
    /// Run scenarios and emit a JSON report.
    Run {
        /// Only run scenarios whose name contains this substring.
        #[arg(long)]
        filter: Option<String>,
        #[arg(long, default_value_t = 25)]
        iterations: usize,
        #[arg(long, default_value_t = 1)]
        warmup: usize,
        /// MobileNet-style width multiplier applied to every layer.
        #[arg(long)]
        channel_multiplier: Option<f32>,
        /// Write the full report to this path as pretty-printed JSON.
        #[arg(long)]
        output: Option<PathBuf>,
    },
}

pub fn run_cli(cli: Cli) -> Result<()> {
    tracing_subscriber::fmt::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_target(false)
        .init();

    let features = CpuFeatures::detect();
    info!(?features, "probed CPU capabilities");

    match cli.command {
        Command::List => {
            for scenario in default_suite(&features) {
                println!("{}", scenario.name());
            }
        }
        Command::Run {
            filter,
            iterations,
            warmup,
            channel_multiplier,
            output,
        } => {
            let options = DriverOptions {
                iterations,
                warmup_iterations: warmup,
                params: channel_multiplier.map(|channel_multiplier| TopologyParams {
                    channel_multiplier,
                }),
            };

            let mut reports = Vec::new();
            for scenario in default_suite(&features) {
                if let Some(filter) = &filter {
                    if !scenario.name().contains(filter.as_str()) {
                        continue;
                    }
                }
                let outcome = scenario.run(&features, options);
                let report = ScenarioReport::from_outcome(scenario.name(), &outcome);
                match &report.status {
                    ScenarioStatus::Completed {
                        iterations,
                        average_time_us,
                        cpu_frequency_mhz,
                    } => println!(
                        "{}: {:.3} us/iter over {} iters (Freq {:.0} MHz)",
                        report.scenario, average_time_us, iterations, cpu_frequency_mhz
                    ),
                    ScenarioStatus::Skipped { failure } => {
                        println!("{}: SKIPPED ({failure})", report.scenario)
                    }
                }
                reports.push(report);
            }

            let report = BenchReport::new(reports);
            info!(
                scenarios = report.scenarios.len(),
                completed = report.completed(),
                "benchmark run finished"
            );
            if let Some(path) = output {
                report.save(&path)?;
                info!(path = %path.display(), "report written");
            }
        }
    }
    Ok(())
}
