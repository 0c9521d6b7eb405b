//! Named benchmark scenarios: a topology bound to an optional kernel
//! override, one entry per `up{cr}x{mr}__{impl}` variant the current
//! machine can run.

use crate::driver::{BenchmarkDriver, DriverOptions, Measurement, ScenarioFailure};
use convforge_kernels::dwconv::{DynDwconvKernel, ParallelDwconv, ScalarDwconv, UnrolledDwconv};
use convforge_kernels::probe::CpuFeatures;
use convforge_kernels::registry::MicrokernelDescriptor;
use convforge_runtime::{MobileNetV1Dwconv, MobileNetV2Dwconv, TopologyFactory};
use std::sync::Arc;
use tracing::warn;

pub enum ScenarioOutcome {
    Completed(Measurement),
    Skipped(ScenarioFailure),
}

pub struct Scenario {
    name: String,
    topology: Box<dyn TopologyFactory>,
    override_descriptor: Option<(usize, MicrokernelDescriptor)>,
}

impl Scenario {
    pub fn new(name: impl Into<String>, topology: Box<dyn TopologyFactory>) -> Self {
        Self {
            name: name.into(),
            topology,
            override_descriptor: None,
        }
    }

    pub fn with_override(mut self, row_tile: usize, descriptor: MicrokernelDescriptor) -> Self {
        self.override_descriptor = Some((row_tile, descriptor));
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Runs the full driver lifecycle once. Any failure becomes a skip with
    /// a message, never a timing value.
    pub fn run(&self, features: &CpuFeatures, options: DriverOptions) -> ScenarioOutcome {
        let mut driver = BenchmarkDriver::new(self.topology.as_ref(), options);
        if let Some((row_tile, descriptor)) = &self.override_descriptor {
            driver = driver.with_override(*row_tile, descriptor.clone());
        }
        match driver.run(features) {
            Ok(measurement) => ScenarioOutcome::Completed(measurement),
            Err(failure) => {
                warn!(scenario = %self.name, %failure, "scenario skipped");
                ScenarioOutcome::Skipped(failure)
            }
        }
    }
}

fn descriptor(kernel: DynDwconvKernel) -> MicrokernelDescriptor {
    MicrokernelDescriptor::new(kernel)
}

/// The default scenario grid: every 3x3 kernel variant the probed
/// capabilities allow, crossed with both MobileNet depthwise stacks.
pub fn default_suite(features: &CpuFeatures) -> Vec<Scenario> {
    let mut variants: Vec<(String, MicrokernelDescriptor)> = Vec::new();

    let scalar = descriptor(Arc::new(ScalarDwconv::new(9)));
    variants.push((format!("dwconv_{}", scalar.label()), scalar));

    if features.wide_vectors {
        let unrolled = descriptor(Arc::new(UnrolledDwconv::new(4, 9)));
        variants.push((format!("dwconv_{}", unrolled.label()), unrolled));
    }
    if features.extra_wide_vectors {
        let unrolled = descriptor(Arc::new(UnrolledDwconv::new(8, 9)));
        variants.push((format!("dwconv_{}", unrolled.label()), unrolled));
    }

    let parallel = descriptor(Arc::new(ParallelDwconv::new(4, 9)));
    variants.push((format!("dwconv_{}", parallel.label()), parallel));

    let mut scenarios = Vec::with_capacity(variants.len() * 2);
    for (variant_name, descriptor) in variants {
        for model in ["mobilenet_v1", "mobilenet_v2"] {
            let topology: Box<dyn TopologyFactory> = match model {
                "mobilenet_v1" => Box::new(MobileNetV1Dwconv),
                _ => Box::new(MobileNetV2Dwconv),
            };
            scenarios.push(
                Scenario::new(format!("{variant_name}/{model}"), topology)
                    .with_override(9, descriptor.clone()),
            );
        }
    }
    scenarios
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn scalar_suite_has_two_variants_per_model() {
        let suite = default_suite(&CpuFeatures::scalar_only());
        // scalar + parallel, each against both models.
        assert_eq!(suite.len(), 4);
        assert!(suite
            .iter()
            .any(|s| s.name() == "dwconv_up1x9__scalar/mobilenet_v1"));
        assert!(suite
            .iter()
            .any(|s| s.name() == "dwconv_up4x9__parallel/mobilenet_v2"));
    }

    #[test]
    fn wide_vector_suite_adds_unrolled_variants() {
        let features = CpuFeatures {
            wide_vectors: true,
            extra_wide_vectors: true,
        };
        let suite = default_suite(&features);
        assert_eq!(suite.len(), 8);
        assert!(suite
            .iter()
            .any(|s| s.name() == "dwconv_up4x9__unrolled4/mobilenet_v1"));
        assert!(suite
            .iter()
            .any(|s| s.name() == "dwconv_up8x9__unrolled8/mobilenet_v2"));
    }
}
