//! Depthwise-convolution microkernels.

use crate::config::{DwconvProblem, TilingShape};
use crate::utils::validate_dwconv_buffers;
use anyhow::{ensure, Result};
use ndarray::{ArrayView1, ArrayView2, ArrayViewMut2, Axis, Zip};
use rayon::prelude::*;
use std::sync::Arc;

/// Buffers for one depthwise-convolution invocation.
///
/// Layout: `input` is `(output_width + taps - 1) x channels`, `weights` is
/// `taps x channels`, `bias` is `channels`.
pub struct DwconvInputs<'a> {
    pub input: ArrayView2<'a, f32>,
    pub weights: ArrayView2<'a, f32>,
    pub bias: ArrayView1<'a, f32>,
}

impl<'a> DwconvInputs<'a> {
    pub fn new(
        input: ArrayView2<'a, f32>,
        weights: ArrayView2<'a, f32>,
        bias: ArrayView1<'a, f32>,
    ) -> Self {
        Self {
            input,
            weights,
            bias,
        }
    }
}

/// One concrete depthwise-convolution implementation, specialized for a
/// single tiling shape. Selected through the registry, never re-resolved
/// after an operator captures it.
pub trait DwconvMicrokernel: Send + Sync {
    fn name(&self) -> &'static str;
    fn tiling(&self) -> TilingShape;
    fn run(
        &self,
        problem: &DwconvProblem,
        inputs: &DwconvInputs<'_>,
        output: ArrayViewMut2<'_, f32>,
    ) -> Result<()>;
}

pub type DynDwconvKernel = Arc<dyn DwconvMicrokernel>;

fn check_taps(kernel: &dyn DwconvMicrokernel, problem: &DwconvProblem) -> Result<()> {
    ensure!(
        problem.taps == kernel.tiling().row_tile,
        "{} kernel handles {} taps but the operator requires {}",
        kernel.name(),
        kernel.tiling().row_tile,
        problem.taps
    );
    Ok(())
}

/// Straight-line reference implementation, one channel at a time.
pub struct ScalarDwconv {
    taps: usize,
}

impl ScalarDwconv {
    pub fn new(taps: usize) -> Self {
        Self { taps }
    }
}

impl DwconvMicrokernel for ScalarDwconv {
    fn name(&self) -> &'static str {
        "scalar"
    }

    fn tiling(&self) -> TilingShape {
        TilingShape::new(1, self.taps)
    }

    fn run(
        &self,
        problem: &DwconvProblem,
        inputs: &DwconvInputs<'_>,
        mut output: ArrayViewMut2<'_, f32>,
    ) -> Result<()> {
        check_taps(self, problem)?;
        validate_dwconv_buffers(problem, inputs, &output.view())?;

        for x in 0..problem.output_width {
            for c in 0..problem.channels {
                let mut acc = inputs.bias[c];
                for t in 0..problem.taps {
                    acc += inputs.input[(x + t, c)] * inputs.weights[(t, c)];
                }
                output[(x, c)] = acc;
            }
        }
        Ok(())
    }
}

/// Channel-tiled implementation: accumulates `channel_tile` channels per
/// inner step with a scalar remainder loop, mimicking the register blocking
/// of a vectorized microkernel.
pub struct UnrolledDwconv {
    channel_tile: usize,
    taps: usize,
}

impl UnrolledDwconv {
    pub fn new(channel_tile: usize, taps: usize) -> Self {
        Self {
            channel_tile: channel_tile.max(1),
            taps,
        }
    }
}

impl DwconvMicrokernel for UnrolledDwconv {
    fn name(&self) -> &'static str {
        match self.channel_tile {
            4 => "unrolled4",
            8 => "unrolled8",
            _ => "unrolled",
        }
    }

    fn tiling(&self) -> TilingShape {
        TilingShape::new(self.channel_tile, self.taps)
    }

    fn run(
        &self,
        problem: &DwconvProblem,
        inputs: &DwconvInputs<'_>,
        mut output: ArrayViewMut2<'_, f32>,
    ) -> Result<()> {
        check_taps(self, problem)?;
        validate_dwconv_buffers(problem, inputs, &output.view())?;

        let cr = self.channel_tile;
        let full = problem.channels - problem.channels % cr;
        let mut acc = vec![0.0f32; cr];

        for x in 0..problem.output_width {
            for c0 in (0..full).step_by(cr) {
                for (lane, slot) in acc.iter_mut().enumerate() {
                    *slot = inputs.bias[c0 + lane];
                }
                for t in 0..problem.taps {
                    for (lane, slot) in acc.iter_mut().enumerate() {
                        *slot += inputs.input[(x + t, c0 + lane)] * inputs.weights[(t, c0 + lane)];
                    }
                }
                for (lane, slot) in acc.iter().enumerate() {
                    output[(x, c0 + lane)] = *slot;
                }
            }
            // Remainder channels.
            for c in full..problem.channels {
                let mut acc = inputs.bias[c];
                for t in 0..problem.taps {
                    acc += inputs.input[(x + t, c)] * inputs.weights[(t, c)];
                }
                output[(x, c)] = acc;
            }
        }
        Ok(())
    }
}

/// Row-parallel implementation: output rows are independent, so each rayon
/// worker computes one output pixel across all channels.
pub struct ParallelDwconv {
    channel_tile: usize,
    taps: usize,
}

impl ParallelDwconv {
    pub fn new(channel_tile: usize, taps: usize) -> Self {
        Self {
            channel_tile: channel_tile.max(1),
            taps,
        }
    }
}

impl DwconvMicrokernel for ParallelDwconv {
    fn name(&self) -> &'static str {
        "parallel"
    }

    fn tiling(&self) -> TilingShape {
        TilingShape::new(self.channel_tile, self.taps)
    }

    fn run(
        &self,
        problem: &DwconvProblem,
        inputs: &DwconvInputs<'_>,
        mut output: ArrayViewMut2<'_, f32>,
    ) -> Result<()> {
        check_taps(self, problem)?;
        validate_dwconv_buffers(problem, inputs, &output.view())?;

        let input = inputs.input;
        let weights = inputs.weights;
        let bias = inputs.bias;
        let taps = problem.taps;

        output
            .axis_iter_mut(Axis(0))
            .into_par_iter()
            .enumerate()
            .for_each(|(x, mut row)| {
                Zip::indexed(&mut row).for_each(|c, value| {
                    let mut acc = bias[c];
                    for t in 0..taps {
                        acc += input[(x + t, c)] * weights[(t, c)];
                    }
                    *value = acc;
                });
            });
        Ok(())
    }
}
