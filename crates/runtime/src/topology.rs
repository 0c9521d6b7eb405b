//! Topology factories: network descriptions turned into operator sequences.

use crate::operator::DwconvOperator;
use anyhow::Result;
use convforge_kernels::config::DwconvProblem;
use convforge_kernels::registry::MicrokernelRegistry;
use tracing::warn;

/// Optional knobs a caller may pass to a factory. `None` means defaults.
#[derive(Debug, Clone, Copy)]
pub struct TopologyParams {
    /// Scales every layer's channel count, MobileNet width-multiplier style.
    pub channel_multiplier: f32,
}

impl Default for TopologyParams {
    fn default() -> Self {
        Self {
            channel_multiplier: 1.0,
        }
    }
}

/// Produces the ordered operator sequence for one network topology.
///
/// A factory that cannot materialize the topology on the current registry
/// returns an empty sequence; it does not error. Callers decide whether an
/// empty plan is fatal.
pub trait TopologyFactory {
    fn name(&self) -> &'static str;
    fn build(
        &self,
        registry: &MicrokernelRegistry,
        params: Option<&TopologyParams>,
    ) -> Result<Vec<DwconvOperator>>;
}

/// `(channels, output_width)` per depthwise layer; all layers are 3x3
/// depthwise, so taps = 9 throughout.
type DwconvLayer = (usize, usize);

const MOBILENET_V1_LAYERS: [DwconvLayer; 13] = [
    (32, 112),
    (64, 56),
    (128, 56),
    (128, 28),
    (256, 28),
    (256, 14),
    (512, 14),
    (512, 14),
    (512, 14),
    (512, 14),
    (512, 14),
    (512, 7),
    (1024, 7),
];

const MOBILENET_V2_LAYERS: [DwconvLayer; 17] = [
    (32, 112),
    (96, 56),
    (144, 56),
    (144, 28),
    (192, 28),
    (192, 28),
    (192, 14),
    (384, 14),
    (384, 14),
    (384, 14),
    (384, 14),
    (576, 14),
    (576, 14),
    (576, 7),
    (960, 7),
    (960, 7),
    (960, 7),
];

fn build_stack(
    name: &'static str,
    layers: &[DwconvLayer],
    registry: &MicrokernelRegistry,
    params: Option<&TopologyParams>,
) -> Result<Vec<DwconvOperator>> {
    let multiplier = params
        .copied()
        .unwrap_or_default()
        .channel_multiplier
        .max(0.0);

    let mut operators = Vec::with_capacity(layers.len());
    for (idx, &(channels, output_width)) in layers.iter().enumerate() {
        let channels = ((channels as f32 * multiplier).round() as usize).max(1);
        let problem = DwconvProblem::new(channels, output_width, 9);
        match DwconvOperator::create(format!("{name}_dw{idx}"), registry, problem) {
            Ok(operator) => operators.push(operator),
            Err(error) => {
                // Unsupported configuration on this registry: report an
                // empty plan instead of a partial one.
                warn!(topology = name, layer = idx, %error, "topology not supported");
                return Ok(Vec::new());
            }
        }
    }
    Ok(operators)
}

/// The 13 depthwise layers of MobileNet V1.
pub struct MobileNetV1Dwconv;

impl TopologyFactory for MobileNetV1Dwconv {
    fn name(&self) -> &'static str {
        "mobilenet_v1"
    }

    fn build(
        &self,
        registry: &MicrokernelRegistry,
        params: Option<&TopologyParams>,
    ) -> Result<Vec<DwconvOperator>> {
        build_stack(self.name(), &MOBILENET_V1_LAYERS, registry, params)
    }
}

/// The 17 depthwise layers of MobileNet V2's inverted residual blocks.
pub struct MobileNetV2Dwconv;

impl TopologyFactory for MobileNetV2Dwconv {
    fn name(&self) -> &'static str {
        "mobilenet_v2"
    }

    fn build(
        &self,
        registry: &MicrokernelRegistry,
        params: Option<&TopologyParams>,
    ) -> Result<Vec<DwconvOperator>> {
        build_stack(self.name(), &MOBILENET_V2_LAYERS, registry, params)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use convforge_kernels::probe::CpuFeatures;
    use convforge_kernels::registry::MicrokernelDescriptor;
    use convforge_kernels::ScalarDwconv;
    use std::sync::Arc;

    #[test]
    fn mobilenet_v1_builds_thirteen_operators() {
        let registry = MicrokernelRegistry::initialize(&CpuFeatures::scalar_only()).unwrap();
        let operators = MobileNetV1Dwconv.build(&registry, None).unwrap();
        assert_eq!(operators.len(), 13);
        assert!(operators.iter().all(|op| op.problem().taps == 9));
    }

    #[test]
    fn channel_multiplier_scales_layers() {
        let registry = MicrokernelRegistry::initialize(&CpuFeatures::scalar_only()).unwrap();
        let params = TopologyParams {
            channel_multiplier: 0.25,
        };
        let operators = MobileNetV2Dwconv.build(&registry, Some(&params)).unwrap();
        assert_eq!(operators.len(), 17);
        assert_eq!(operators[0].problem().channels, 8);
    }

    #[test]
    fn missing_tap_slot_yields_empty_topology() {
        // A registry with only 25-tap kernels cannot host a 3x3 stack.
        let registry = MicrokernelRegistry::from_descriptors(vec![MicrokernelDescriptor::new(
            Arc::new(ScalarDwconv::new(25)),
        )])
        .unwrap();
        let operators = MobileNetV1Dwconv.build(&registry, None).unwrap();
        assert!(operators.is_empty());
    }
}
