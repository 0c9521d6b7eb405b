//! Depthwise-convolution microkernels and the dispatch registry for convforge.

pub mod config;
pub mod dwconv;
pub mod probe;
pub mod registry;
pub mod utils;

pub use config::*;
pub use dwconv::*;
pub use probe::*;
pub use registry::*;
pub use utils::*;
