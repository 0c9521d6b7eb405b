//! CPU capability probing used to pick default microkernels.

/// Vector capabilities relevant to kernel selection, collapsed to the two
/// widths the default table distinguishes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CpuFeatures {
    /// 128/256-bit class (AVX2, NEON): enables channel_tile = 4 variants.
    pub wide_vectors: bool,
    /// 512-bit class (AVX-512): enables channel_tile = 8 variants.
    pub extra_wide_vectors: bool,
}

impl CpuFeatures {
    pub fn detect() -> Self {
        #[cfg(target_arch = "x86_64")]
        {
            Self {
                wide_vectors: std::arch::is_x86_feature_detected!("avx2"),
                extra_wide_vectors: std::arch::is_x86_feature_detected!("avx512f"),
            }
        }
        #[cfg(target_arch = "aarch64")]
        {
            // NEON is baseline on aarch64.
            Self {
                wide_vectors: true,
                extra_wide_vectors: false,
            }
        }
        #[cfg(not(any(target_arch = "x86_64", target_arch = "aarch64")))]
        {
            Self::scalar_only()
        }
    }

    pub fn scalar_only() -> Self {
        Self {
            wide_vectors: false,
            extra_wide_vectors: false,
        }
    }
}
