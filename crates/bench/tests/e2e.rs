use anyhow::{bail, Result};
use convforge_bench::driver::{BenchmarkDriver, DriverOptions, DriverState, ScenarioFailure};
use convforge_bench::report::{ScenarioReport, ScenarioStatus};
use convforge_bench::scenario::{Scenario, ScenarioOutcome};
use convforge_kernels::config::{DwconvProblem, TilingShape};
use convforge_kernels::dwconv::{DwconvInputs, DwconvMicrokernel};
use convforge_kernels::probe::CpuFeatures;
use convforge_kernels::registry::{MicrokernelDescriptor, MicrokernelRegistry};
use convforge_runtime::{
    DwconvOperator, MobileNetV1Dwconv, TopologyFactory, TopologyParams,
};
use ndarray::ArrayViewMut2;
use std::sync::Arc;

fn tiny_options() -> DriverOptions {
    DriverOptions {
        iterations: 3,
        warmup_iterations: 1,
        params: Some(TopologyParams {
            channel_multiplier: 0.125,
        }),
    }
}

struct EmptyTopology;

impl TopologyFactory for EmptyTopology {
    fn name(&self) -> &'static str {
        "empty"
    }

    fn build(
        &self,
        _registry: &MicrokernelRegistry,
        _params: Option<&TopologyParams>,
    ) -> Result<Vec<DwconvOperator>> {
        Ok(Vec::new())
    }
}

struct FailingKernel;

impl DwconvMicrokernel for FailingKernel {
    fn name(&self) -> &'static str {
        "failing"
    }

    fn tiling(&self) -> TilingShape {
        TilingShape::new(4, 9)
    }

    fn run(
        &self,
        _problem: &DwconvProblem,
        _inputs: &DwconvInputs<'_>,
        _output: ArrayViewMut2<'_, f32>,
    ) -> Result<()> {
        bail!("unsupported shape at run time")
    }
}

#[test]
fn driver_measures_mobilenet_stack() {
    let features = CpuFeatures::scalar_only();
    let topology = MobileNetV1Dwconv;
    let mut driver = BenchmarkDriver::new(&topology, tiny_options());

    let measurement = driver.run(&features).expect("scenario must complete");
    assert_eq!(driver.state(), DriverState::Done);
    assert_eq!(measurement.iterations, 3);
    assert!(measurement.average_time_us > 0.0);
}

#[test]
fn empty_plan_is_reported_as_build_failure() {
    let features = CpuFeatures::scalar_only();
    let topology = EmptyTopology;
    let mut driver = BenchmarkDriver::new(&topology, tiny_options());

    let failure = driver.run(&features).expect_err("empty plan must not run");
    assert_eq!(driver.state(), DriverState::Failed);
    assert!(matches!(failure, ScenarioFailure::PlanBuild(_)));
}

#[test]
fn operator_failure_aborts_the_loop() {
    let features = CpuFeatures::scalar_only();
    let topology = MobileNetV1Dwconv;
    let descriptor = MicrokernelDescriptor::new(Arc::new(FailingKernel));
    let mut driver =
        BenchmarkDriver::new(&topology, tiny_options()).with_override(9, descriptor);

    let failure = driver.run(&features).expect_err("failing kernel must abort");
    assert_eq!(driver.state(), DriverState::Failed);
    match failure {
        ScenarioFailure::OperatorRuntime(message) => {
            assert!(message.contains("unsupported shape"));
        }
        other => panic!("expected operator failure, got {other:?}"),
    }
}

#[test]
fn scenario_outcome_feeds_the_report() {
    let features = CpuFeatures::scalar_only();

    let ok = Scenario::new("ok/mobilenet_v1", Box::new(MobileNetV1Dwconv));
    let outcome = ok.run(&features, tiny_options());
    let report = ScenarioReport::from_outcome(ok.name(), &outcome);
    assert!(matches!(report.status, ScenarioStatus::Completed { .. }));

    let skipped = Scenario::new("skip/empty", Box::new(EmptyTopology));
    let outcome = skipped.run(&features, tiny_options());
    assert!(matches!(outcome, ScenarioOutcome::Skipped(_)));
    let report = ScenarioReport::from_outcome(skipped.name(), &outcome);
    match report.status {
        ScenarioStatus::Skipped { failure } => {
            assert!(matches!(failure, ScenarioFailure::PlanBuild(_)));
        }
        other => panic!("expected skip, got {other:?}"),
    }
}
