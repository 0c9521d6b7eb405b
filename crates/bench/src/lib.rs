//! Benchmark harness for convforge: scenario registration, the driver
//! state machine, and JSON reporting.

pub mod cli;
pub mod driver;
pub mod freq;
pub mod report;
pub mod scenario;

pub use driver::{BenchmarkDriver, DriverOptions, DriverState, Measurement, ScenarioFailure};
pub use report::{BenchReport, ScenarioReport, ScenarioStatus};
pub use scenario::{default_suite, Scenario, ScenarioOutcome};
