//! Benchmark driver: registry init, overrides, plan build, measured loop.

use crate::freq;
use convforge_kernels::probe::CpuFeatures;
use convforge_kernels::registry::{MicrokernelDescriptor, MicrokernelRegistry};
use convforge_runtime::{ExecutionPlan, TopologyFactory, TopologyParams};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::time::{Duration, Instant};
use tracing::{debug, info};

/// Terminal failure kinds. None is retried: retrying would corrupt timing
/// semantics, and all three are configuration errors rather than transient
/// conditions.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "message")]
pub enum ScenarioFailure {
    Initialization(String),
    PlanBuild(String),
    OperatorRuntime(String),
}

impl fmt::Display for ScenarioFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Initialization(msg) => write!(f, "initialization failed: {msg}"),
            Self::PlanBuild(msg) => write!(f, "plan build failed: {msg}"),
            Self::OperatorRuntime(msg) => write!(f, "operator failed: {msg}"),
        }
    }
}

/// Driver lifecycle. Failure from any state is terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DriverState {
    Uninitialized,
    Ready,
    Measuring,
    Done,
    Failed,
}

/// Timing result of one completed measurement loop.
#[derive(Debug, Clone)]
pub struct Measurement {
    pub iterations: usize,
    pub total: Duration,
    pub average_time_us: f64,
    /// Observed processor clock frequency in Hz, 0 when unavailable.
    pub cpu_frequency_hz: u64,
}

#[derive(Debug, Clone, Copy)]
pub struct DriverOptions {
    pub iterations: usize,
    pub warmup_iterations: usize,
    pub params: Option<TopologyParams>,
}

impl Default for DriverOptions {
    fn default() -> Self {
        Self {
            iterations: 25,
            warmup_iterations: 1,
            params: None,
        }
    }
}

/// Drives one (topology, override) pair through the full lifecycle:
/// `Uninitialized -> Ready -> Measuring -> Done`, short-circuiting to
/// `Failed` on the first error at any stage.
pub struct BenchmarkDriver<'a> {
    topology: &'a dyn TopologyFactory,
    override_descriptor: Option<(usize, MicrokernelDescriptor)>,
    options: DriverOptions,
    state: DriverState,
}

impl<'a> BenchmarkDriver<'a> {
    pub fn new(topology: &'a dyn TopologyFactory, options: DriverOptions) -> Self {
        Self {
            topology,
            override_descriptor: None,
            options,
            state: DriverState::Uninitialized,
        }
    }

    /// Forces the registry slot for `row_tile` to `descriptor` before the
    /// plan is built. The override must land before the build: that ordering
    /// is what pins the implementation under measurement.
    pub fn with_override(mut self, row_tile: usize, descriptor: MicrokernelDescriptor) -> Self {
        self.override_descriptor = Some((row_tile, descriptor));
        self
    }

    pub fn state(&self) -> DriverState {
        self.state
    }

    pub fn run(&mut self, features: &CpuFeatures) -> Result<Measurement, ScenarioFailure> {
        match self.try_run(features) {
            Ok(measurement) => {
                self.state = DriverState::Done;
                Ok(measurement)
            }
            Err(failure) => {
                self.state = DriverState::Failed;
                Err(failure)
            }
        }
    }

    fn try_run(&mut self, features: &CpuFeatures) -> Result<Measurement, ScenarioFailure> {
        if self.state != DriverState::Uninitialized {
            return Err(ScenarioFailure::Initialization(
                "driver already consumed".to_string(),
            ));
        }

        let mut registry = MicrokernelRegistry::initialize(features)
            .map_err(|error| ScenarioFailure::Initialization(format!("{error:#}")))?;

        if let Some((row_tile, descriptor)) = &self.override_descriptor {
            debug!(row_tile, kernel = %descriptor.label(), "overriding registry slot");
            registry
                .override_descriptor(*row_tile, descriptor.clone())
                .map_err(|error| ScenarioFailure::Initialization(format!("{error:#}")))?;
        }

        let mut plan = ExecutionPlan::build(self.topology, &registry, self.options.params.as_ref())
            .map_err(|error| ScenarioFailure::PlanBuild(format!("{error:#}")))?;

        if plan.is_empty() {
            return Err(ScenarioFailure::PlanBuild(format!(
                "topology {} produced no operators",
                self.topology.name()
            )));
        }
        self.state = DriverState::Ready;

        for _ in 0..self.options.warmup_iterations {
            plan.run_plan()
                .map_err(|error| ScenarioFailure::OperatorRuntime(format!("{error:#}")))?;
        }

        self.state = DriverState::Measuring;
        let iterations = self.options.iterations.max(1);
        let mut total = Duration::default();
        for _ in 0..iterations {
            let start = Instant::now();
            plan.run_plan()
                .map_err(|error| ScenarioFailure::OperatorRuntime(format!("{error:#}")))?;
            total += start.elapsed();
        }

        let average_time_us = total.as_secs_f64() * 1.0e6 / iterations as f64;
        let cpu_frequency_hz = freq::current_cpu_frequency_hz();
        info!(
            topology = self.topology.name(),
            operators = plan.len(),
            iterations,
            average_time_us,
            cpu_frequency_hz,
            "measurement complete"
        );

        Ok(Measurement {
            iterations,
            total,
            average_time_us,
            cpu_frequency_hz,
        })
    }
}
