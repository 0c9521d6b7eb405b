//! Execution plans and the sequential plan runner.

use crate::operator::DwconvOperator;
use crate::topology::{TopologyFactory, TopologyParams};
use anyhow::{Context, Result};
use convforge_kernels::registry::MicrokernelRegistry;
use tracing::debug;

/// Ordered, immutable sequence of operators. Insertion order is topology
/// order is execution order. The plan exclusively owns its operators and
/// their buffers; dropping it releases everything on any exit path.
pub struct ExecutionPlan {
    operators: Vec<DwconvOperator>,
}

impl ExecutionPlan {
    /// One-shot build against the registry's current bindings. An empty
    /// plan means the factory could not materialize the topology; callers
    /// must treat it as a build failure and never execute it.
    pub fn build(
        factory: &dyn TopologyFactory,
        registry: &MicrokernelRegistry,
        params: Option<&TopologyParams>,
    ) -> Result<Self> {
        let operators = factory
            .build(registry, params)
            .with_context(|| format!("building topology {}", factory.name()))?;
        debug!(
            topology = factory.name(),
            operators = operators.len(),
            "execution plan built"
        );
        Ok(Self { operators })
    }

    pub fn len(&self) -> usize {
        self.operators.len()
    }

    pub fn is_empty(&self) -> bool {
        self.operators.is_empty()
    }

    pub fn operators(&self) -> &[DwconvOperator] {
        &self.operators
    }

    /// Runs every operator in sequence order, stopping at the first failure.
    /// No re-selection happens here: repeated calls perform the identical
    /// kernel call sequence.
    pub fn run_plan(&mut self) -> Result<()> {
        for operator in &mut self.operators {
            operator
                .run()
                .with_context(|| format!("operator {} failed", operator.name()))?;
        }
        Ok(())
    }
}
