//! Numeric backend interface and the built-in kernel implementation.

use rustc_hash::FxHashMap;
use tracing::info;

use crate::error::PipelineError;
use crate::image::PixelBuffer;
use crate::kernels::{diffusion, gaussian, nlmeans, wavelet};
use crate::params::{AlgorithmId, DenoiseParams};

/// The numeric engine performing the actual denoising.
///
/// Implementations carry process-lifetime mutable state (lazily loaded
/// computational modules) and tolerate no concurrent or reordered calls, so
/// they must only ever be driven from the execution queue's worker thread.
///
/// Contract: `ensure_loaded` is idempotent and may perform a one-time
/// load/compile on the first call per algorithm. `compute` is deterministic
/// for fixed inputs within a process lifetime and returns an output with the
/// same dimensions as the input.
pub trait DenoiseBackend: Send {
    /// Make sure the kernel module for `algorithm` is loaded.
    fn ensure_loaded(&mut self, algorithm: AlgorithmId) -> Result<(), PipelineError>;

    /// Run the algorithm identified by `params` over `input`.
    fn compute(
        &mut self,
        params: &DenoiseParams,
        input: &PixelBuffer,
    ) -> Result<PixelBuffer, PipelineError>;
}

/// A loaded kernel module. Construction is the "compile" step: whatever the
/// kernel precomputes (lookup tables, plans) is built here once and persists
/// for the process lifetime.
enum KernelModule {
    Gaussian,
    AnisotropicDiffusion,
    NonLocalMeans { exp_table: nlmeans::ExpTable },
    WaveletThresholding,
}

impl KernelModule {
    fn load(algorithm: AlgorithmId) -> Self {
        match algorithm {
            AlgorithmId::Gaussian => KernelModule::Gaussian,
            AlgorithmId::AnisotropicDiffusion => KernelModule::AnisotropicDiffusion,
            AlgorithmId::NonLocalMeans => KernelModule::NonLocalMeans {
                exp_table: nlmeans::ExpTable::new(),
            },
            AlgorithmId::WaveletThresholding => KernelModule::WaveletThresholding,
        }
    }
}

/// Built-in backend running the denoising kernels in-process.
///
/// Modules are loaded lazily into a registry on first use and are never
/// unloaded, mirroring an external host that compiles each kernel once.
pub struct NativeBackend {
    modules: FxHashMap<AlgorithmId, KernelModule>,
}

impl NativeBackend {
    pub fn new() -> Self {
        Self {
            modules: FxHashMap::default(),
        }
    }

    /// Number of modules currently loaded.
    pub fn loaded_count(&self) -> usize {
        self.modules.len()
    }
}

impl Default for NativeBackend {
    fn default() -> Self {
        Self::new()
    }
}

impl DenoiseBackend for NativeBackend {
    fn ensure_loaded(&mut self, algorithm: AlgorithmId) -> Result<(), PipelineError> {
        if !self.modules.contains_key(&algorithm) {
            info!(algorithm = algorithm.readable_name(), "loading kernel module");
            self.modules.insert(algorithm, KernelModule::load(algorithm));
        }
        Ok(())
    }

    fn compute(
        &mut self,
        params: &DenoiseParams,
        input: &PixelBuffer,
    ) -> Result<PixelBuffer, PipelineError> {
        params
            .validate()
            .map_err(PipelineError::BackendCompute)?;

        let module = self.modules.get(&params.algorithm()).ok_or_else(|| {
            PipelineError::BackendUnavailable(format!(
                "kernel module for {} is not loaded",
                params.algorithm().readable_name()
            ))
        })?;

        let plane = input.to_normalized();
        let output = match (params, module) {
            (DenoiseParams::Gaussian(p), KernelModule::Gaussian) => {
                gaussian::gaussian_blur(plane.view(), p.sigma)
            }
            (DenoiseParams::AnisotropicDiffusion(p), KernelModule::AnisotropicDiffusion) => {
                diffusion::anisotropic_diffusion(plane.view(), p)
            }
            (DenoiseParams::NonLocalMeans(p), KernelModule::NonLocalMeans { exp_table }) => {
                nlmeans::non_local_means(plane.view(), p, exp_table)
            }
            (DenoiseParams::WaveletThresholding(p), KernelModule::WaveletThresholding) => {
                wavelet::wavelet_threshold(plane.view(), p)
            }
            _ => {
                return Err(PipelineError::BackendCompute(
                    "parameter set does not match the loaded kernel module".to_string(),
                ))
            }
        };

        debug_assert_eq!(output.dim(), plane.dim());
        Ok(PixelBuffer::from_normalized(output.view()))
    }
}

/// Worker-owned state behind the execution queue: the backend plus the
/// preview cache it feeds. Both are mutated only from queue jobs.
pub struct ComputeContext {
    pub(crate) backend: Box<dyn DenoiseBackend>,
    pub(crate) cache: crate::cache::PreviewCache,
}

impl ComputeContext {
    pub fn new(backend: Box<dyn DenoiseBackend>, cache_capacity: usize) -> Self {
        Self {
            backend,
            cache: crate::cache::PreviewCache::new(cache_capacity),
        }
    }

    /// Load-if-needed and compute, as one unit. Running both inside the same
    /// serialized job keeps the load and the first compute from interleaving
    /// with any other backend call.
    pub fn denoise(
        &mut self,
        params: &DenoiseParams,
        input: &PixelBuffer,
    ) -> Result<PixelBuffer, PipelineError> {
        self.backend.ensure_loaded(params.algorithm())?;
        self.backend.compute(params, input)
    }
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::params::GaussianParams;

    fn test_input() -> PixelBuffer {
        let data: Vec<u8> = (0..16 * 16).map(|i| (i * 7 % 256) as u8).collect();
        PixelBuffer::new(16, 16, data).unwrap()
    }

    #[test]
    fn test_ensure_loaded_is_idempotent() {
        let mut backend = NativeBackend::new();
        assert_eq!(backend.loaded_count(), 0);

        backend.ensure_loaded(AlgorithmId::NonLocalMeans).unwrap();
        backend.ensure_loaded(AlgorithmId::NonLocalMeans).unwrap();
        assert_eq!(backend.loaded_count(), 1);

        backend.ensure_loaded(AlgorithmId::Gaussian).unwrap();
        assert_eq!(backend.loaded_count(), 2);
    }

    #[test]
    fn test_compute_without_load_is_unavailable() {
        let mut backend = NativeBackend::new();
        let result = backend.compute(&DenoiseParams::default(), &test_input());
        assert!(matches!(result, Err(PipelineError::BackendUnavailable(_))));
    }

    #[test]
    fn test_compute_preserves_dimensions_for_all_algorithms() {
        let mut backend = NativeBackend::new();
        let input = test_input();

        for algorithm in AlgorithmId::ALL {
            backend.ensure_loaded(algorithm).unwrap();
            let params = DenoiseParams::default_for(algorithm);
            let output = backend.compute(&params, &input).unwrap();
            assert_eq!(output.width(), input.width(), "{:?}", algorithm);
            assert_eq!(output.height(), input.height(), "{:?}", algorithm);
        }
    }

    #[test]
    fn test_compute_is_deterministic() {
        let mut backend = NativeBackend::new();
        backend.ensure_loaded(AlgorithmId::Gaussian).unwrap();

        let params = DenoiseParams::Gaussian(GaussianParams { sigma: 2.0 });
        let input = test_input();
        let a = backend.compute(&params, &input).unwrap();
        let b = backend.compute(&params, &input).unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn test_invalid_params_rejected() {
        let mut backend = NativeBackend::new();
        backend.ensure_loaded(AlgorithmId::Gaussian).unwrap();

        let params = DenoiseParams::Gaussian(GaussianParams { sigma: -1.0 });
        let result = backend.compute(&params, &test_input());
        assert!(matches!(result, Err(PipelineError::BackendCompute(_))));
    }

    #[test]
    fn test_context_denoise_loads_then_computes() {
        let mut context = ComputeContext::new(Box::new(NativeBackend::new()), 4);
        let output = context
            .denoise(&DenoiseParams::default(), &test_input())
            .unwrap();
        assert_eq!(output.width(), 16);
    }
}
