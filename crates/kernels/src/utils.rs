//! Shared helpers for kernel implementations.

use crate::config::DwconvProblem;
use crate::dwconv::DwconvInputs;
use anyhow::{bail, Result};
use ndarray::ArrayView2;

pub fn validate_dwconv_buffers(
    problem: &DwconvProblem,
    inputs: &DwconvInputs<'_>,
    output: &ArrayView2<'_, f32>,
) -> Result<()> {
    if problem.taps == 0 {
        bail!("problem requires at least one filter tap");
    }
    let expected_input = (problem.input_width(), problem.channels);
    if inputs.input.dim() != expected_input {
        bail!(
            "input shape {:?} incompatible with problem (expected {:?})",
            inputs.input.dim(),
            expected_input
        );
    }
    if inputs.weights.dim() != (problem.taps, problem.channels) {
        bail!(
            "weight shape {:?} incompatible with problem (expected {:?})",
            inputs.weights.dim(),
            (problem.taps, problem.channels)
        );
    }
    if inputs.bias.len() != problem.channels {
        bail!(
            "bias length {} incompatible with {} channels",
            inputs.bias.len(),
            problem.channels
        );
    }
    if output.dim() != (problem.output_width, problem.channels) {
        bail!(
            "output shape {:?} incompatible with problem (expected {:?})",
            output.dim(),
            (problem.output_width, problem.channels)
        );
    }
    Ok(())
}
