//! Microkernel registry: tiling-keyed lookup and caller overrides.
//!
//! The registry is an explicit value, not process-wide state. Callers must
//! finish all overrides before building an execution plan against it;
//! operators capture their descriptor at construction and are unaffected by
//! later mutation.

use crate::config::TilingShape;
use crate::dwconv::{DynDwconvKernel, ScalarDwconv, UnrolledDwconv};
use crate::probe::CpuFeatures;
use anyhow::{bail, ensure, Result};
use std::fmt;
use std::sync::Arc;

/// Upper bound on distinct row-tile slots in one registry.
pub const MAX_MICROKERNEL_SLOTS: usize = 4;

/// Tap counts the depthwise operator family ships specialized kernels for.
const DEFAULT_TAP_COUNTS: [usize; 3] = [4, 9, 25];

/// One registry slot: an implementation plus its tiling shape. Replaced
/// wholesale on override, never partially mutated.
#[derive(Clone)]
pub struct MicrokernelDescriptor {
    pub kernel: DynDwconvKernel,
    pub channel_tile: usize,
    pub row_tile: usize,
}

impl MicrokernelDescriptor {
    pub fn new(kernel: DynDwconvKernel) -> Self {
        let TilingShape {
            channel_tile,
            row_tile,
        } = kernel.tiling();
        Self {
            kernel,
            channel_tile,
            row_tile,
        }
    }

    /// Human-readable identifier in `up{cr}x{mr}__{impl}` form.
    pub fn label(&self) -> String {
        format!(
            "up{}x{}__{}",
            self.channel_tile,
            self.row_tile,
            self.kernel.name()
        )
    }
}

impl fmt::Debug for MicrokernelDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MicrokernelDescriptor")
            .field("kernel", &self.kernel.name())
            .field("channel_tile", &self.channel_tile)
            .field("row_tile", &self.row_tile)
            .finish()
    }
}

/// What `override_descriptor` does when no slot matches the requested row
/// tile. `Ignore` mirrors the permissive scan-and-break behavior callers
/// rely on when probing shapes the current architecture lacks.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum OverridePolicy {
    #[default]
    Ignore,
    Strict,
}

/// Fixed-capacity table of descriptors, at most one per row tile.
#[derive(Clone, Debug)]
pub struct MicrokernelRegistry {
    slots: Vec<MicrokernelDescriptor>,
    policy: OverridePolicy,
}

impl MicrokernelRegistry {
    /// Populates every slot with a default descriptor chosen from the probed
    /// capabilities.
    pub fn initialize(features: &CpuFeatures) -> Result<Self> {
        Self::from_descriptors(default_descriptors(features))
    }

    /// Builds a registry from explicit descriptors. Slot order is preserved.
    pub fn from_descriptors(descriptors: Vec<MicrokernelDescriptor>) -> Result<Self> {
        ensure!(
            !descriptors.is_empty(),
            "capability probing produced no usable microkernels"
        );
        ensure!(
            descriptors.len() <= MAX_MICROKERNEL_SLOTS,
            "{} descriptors exceed the {} registry slots",
            descriptors.len(),
            MAX_MICROKERNEL_SLOTS
        );
        for (idx, descriptor) in descriptors.iter().enumerate() {
            ensure!(
                descriptor.channel_tile > 0 && descriptor.row_tile > 0,
                "descriptor {} has a degenerate tiling shape",
                descriptor.label()
            );
            if descriptors[..idx]
                .iter()
                .any(|other| other.row_tile == descriptor.row_tile)
            {
                bail!("duplicate registry slot for row tile {}", descriptor.row_tile);
            }
        }
        Ok(Self {
            slots: descriptors,
            policy: OverridePolicy::default(),
        })
    }

    pub fn with_policy(mut self, policy: OverridePolicy) -> Self {
        self.policy = policy;
        self
    }

    /// Replaces the slot whose row tile matches `row_tile`. Absent-slot
    /// behavior follows the registry's [`OverridePolicy`].
    pub fn override_descriptor(
        &mut self,
        row_tile: usize,
        descriptor: MicrokernelDescriptor,
    ) -> Result<()> {
        for slot in &mut self.slots {
            if slot.row_tile == row_tile {
                *slot = descriptor;
                return Ok(());
            }
        }
        match self.policy {
            OverridePolicy::Ignore => Ok(()),
            OverridePolicy::Strict => bail!("no registry slot for row tile {row_tile}"),
        }
    }

    pub fn lookup(&self, row_tile: usize) -> Option<&MicrokernelDescriptor> {
        self.slots.iter().find(|slot| slot.row_tile == row_tile)
    }

    pub fn descriptors(&self) -> &[MicrokernelDescriptor] {
        &self.slots
    }
}

fn default_descriptors(features: &CpuFeatures) -> Vec<MicrokernelDescriptor> {
    DEFAULT_TAP_COUNTS
        .iter()
        .map(|&taps| {
            let kernel: DynDwconvKernel = if features.extra_wide_vectors {
                Arc::new(UnrolledDwconv::new(8, taps))
            } else if features.wide_vectors {
                Arc::new(UnrolledDwconv::new(4, taps))
            } else {
                Arc::new(ScalarDwconv::new(taps))
            };
            MicrokernelDescriptor::new(kernel)
        })
        .collect()
}
