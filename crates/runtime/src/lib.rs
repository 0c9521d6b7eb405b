//! Execution-plan runtime for convforge.
//!
//! Operators freeze their microkernel binding when a plan is built; the
//! plan runner drives them strictly in sequence and stops at the first
//! failure.

pub mod operator;
pub mod plan;
pub mod topology;

pub use operator::DwconvOperator;
pub use plan::ExecutionPlan;
pub use topology::{MobileNetV1Dwconv, MobileNetV2Dwconv, TopologyFactory, TopologyParams};
