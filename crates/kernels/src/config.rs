//! Kernel configuration structures.

use serde::{Deserialize, Serialize};

/// Tiling shape of one depthwise-convolution microkernel variant.
///
/// `row_tile` is the number of filter taps a variant consumes per output
/// pixel and doubles as the registry key; `channel_tile` is the number of
/// channels the inner loop advances per step.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TilingShape {
    pub channel_tile: usize,
    pub row_tile: usize,
}

impl TilingShape {
    pub fn new(channel_tile: usize, row_tile: usize) -> Self {
        Self {
            channel_tile,
            row_tile,
        }
    }
}

/// Shape of one depthwise-convolution invocation.
///
/// The convolution slides `taps` filter coefficients per channel along the
/// pixel axis with stride 1, so the input must carry
/// `output_width + taps - 1` pixels.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct DwconvProblem {
    pub channels: usize,
    pub output_width: usize,
    pub taps: usize,
}

impl DwconvProblem {
    pub fn new(channels: usize, output_width: usize, taps: usize) -> Self {
        Self {
            channels,
            output_width,
            taps,
        }
    }

    pub fn input_width(&self) -> usize {
        self.output_width + self.taps.saturating_sub(1)
    }

    pub fn flops(&self) -> f64 {
        2.0 * self.channels as f64 * self.output_width as f64 * self.taps as f64
    }
}
