//! Depthwise-convolution operators.

use anyhow::{anyhow, Result};
use convforge_kernels::config::DwconvProblem;
use convforge_kernels::dwconv::DwconvInputs;
use convforge_kernels::registry::{MicrokernelDescriptor, MicrokernelRegistry};
use ndarray::{Array1, Array2};
use tracing::debug;

/// One unit of computation in an execution plan.
///
/// The operator clones its descriptor out of the registry at construction
/// and never re-resolves it: registry overrides applied after a plan is
/// built do not change the plan's behavior.
pub struct DwconvOperator {
    name: String,
    descriptor: MicrokernelDescriptor,
    problem: DwconvProblem,
    input: Array2<f32>,
    weights: Array2<f32>,
    bias: Array1<f32>,
    output: Array2<f32>,
}

impl DwconvOperator {
    /// Binds the operator to whatever descriptor the registry currently
    /// holds for the problem's tap count.
    pub fn create(
        name: impl Into<String>,
        registry: &MicrokernelRegistry,
        problem: DwconvProblem,
    ) -> Result<Self> {
        let descriptor = registry
            .lookup(problem.taps)
            .cloned()
            .ok_or_else(|| anyhow!("no microkernel registered for {} taps", problem.taps))?;
        Ok(Self::from_descriptor(name, descriptor, problem))
    }

    /// Binds the operator to an explicit descriptor, bypassing the registry.
    pub fn from_descriptor(
        name: impl Into<String>,
        descriptor: MicrokernelDescriptor,
        problem: DwconvProblem,
    ) -> Self {
        let name = name.into();
        debug!(
            operator = %name,
            kernel = %descriptor.label(),
            channels = problem.channels,
            output_width = problem.output_width,
            "binding operator"
        );
        let input = Array2::from_shape_fn((problem.input_width(), problem.channels), |(i, j)| {
            let seed = ((i * 1313) ^ (j * 7331)) as f32;
            1.0 + (seed % 17.0) / 16.0
        });
        let weights = Array2::from_shape_fn((problem.taps, problem.channels), |(i, j)| {
            ((i + j) % 5) as f32 * 0.05 - 0.1
        });
        let bias = Array1::from_shape_fn(problem.channels, |c| (c % 3) as f32 * 0.25);
        let output = Array2::zeros((problem.output_width, problem.channels));
        Self {
            name,
            descriptor,
            problem,
            input,
            weights,
            bias,
            output,
        }
    }

    /// Invokes the bound microkernel over the operator's buffers.
    pub fn run(&mut self) -> Result<()> {
        let inputs = DwconvInputs::new(self.input.view(), self.weights.view(), self.bias.view());
        self.descriptor
            .kernel
            .run(&self.problem, &inputs, self.output.view_mut())
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn descriptor(&self) -> &MicrokernelDescriptor {
        &self.descriptor
    }

    pub fn problem(&self) -> &DwconvProblem {
        &self.problem
    }

    pub fn output(&self) -> &Array2<f32> {
        &self.output
    }
}
