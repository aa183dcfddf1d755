//! Denoising algorithms and their parameter sets.
//!
//! Each algorithm has a dedicated parameter struct with named defaults and
//! declared valid ranges. The ranges are consumed both by `validate()` and by
//! the GUI sliders, so the two can never drift apart.

// =============================================================================
// Default Parameter Values
// =============================================================================

/// Default Gaussian blur standard deviation in pixels
const DEFAULT_GAUSSIAN_SIGMA: f32 = 1.5;

/// Default number of Perona-Malik diffusion iterations
const DEFAULT_DIFFUSION_ITERATIONS: usize = 10;

/// Default diffusion time step (must stay below 0.25 for stability)
const DEFAULT_DIFFUSION_TIME_STEP: f32 = 0.15;

/// Default diffusion conductance (edge threshold on [0, 1] intensities)
const DEFAULT_DIFFUSION_CONDUCTANCE: f32 = 0.1;

/// Default non-local means filter strength
const DEFAULT_NLM_STRENGTH: f32 = 0.15;

/// Default non-local means patch half size
const DEFAULT_NLM_HALF_BLOCK: usize = 4;

/// Default non-local means search window half size
const DEFAULT_NLM_HALF_SEARCH: usize = 5;

/// Default wavelet soft-threshold value
const DEFAULT_WAVELET_THRESHOLD: f32 = 0.1;

/// Default number of wavelet decomposition levels
const DEFAULT_WAVELET_LEVELS: usize = 3;

// =============================================================================
// Algorithm Identity
// =============================================================================

/// Identity of a denoising algorithm.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum AlgorithmId {
    /// Gaussian blur with mirrored boundaries.
    #[default]
    Gaussian,
    /// Perona-Malik edge-preserving diffusion.
    AnisotropicDiffusion,
    /// Patch-based non-local means averaging.
    NonLocalMeans,
    /// Haar wavelet decomposition with soft thresholding.
    WaveletThresholding,
}

impl AlgorithmId {
    /// All algorithms, in the order they are presented to the user.
    pub const ALL: [AlgorithmId; 4] = [
        AlgorithmId::Gaussian,
        AlgorithmId::AnisotropicDiffusion,
        AlgorithmId::NonLocalMeans,
        AlgorithmId::WaveletThresholding,
    ];

    /// Human-readable algorithm name for UI labels and result titles.
    pub fn readable_name(self) -> &'static str {
        match self {
            AlgorithmId::Gaussian => "Gaussian",
            AlgorithmId::AnisotropicDiffusion => "Anisotropic Diffusion",
            AlgorithmId::NonLocalMeans => "Non-Local Means",
            AlgorithmId::WaveletThresholding => "Wavelet Thresholding",
        }
    }
}

// =============================================================================
// Per-Algorithm Parameter Structs
// =============================================================================

/// Parameters for Gaussian blur.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GaussianParams {
    /// Blur standard deviation in pixels. Default: 1.5
    pub sigma: f32,
}

impl GaussianParams {
    pub const SIGMA_MIN: f32 = 0.1;
    pub const SIGMA_MAX: f32 = 10.0;

    /// Validate all fields against their declared ranges.
    pub fn validate(&self) -> Result<(), String> {
        if !(self.sigma >= Self::SIGMA_MIN && self.sigma <= Self::SIGMA_MAX) {
            return Err(format!(
                "sigma {} outside [{}, {}]",
                self.sigma,
                Self::SIGMA_MIN,
                Self::SIGMA_MAX
            ));
        }
        Ok(())
    }
}

impl Default for GaussianParams {
    fn default() -> Self {
        Self {
            sigma: DEFAULT_GAUSSIAN_SIGMA,
        }
    }
}

/// Parameters for Perona-Malik anisotropic diffusion.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DiffusionParams {
    /// Number of diffusion iterations. Default: 10
    pub iterations: usize,
    /// Integration time step. Default: 0.15
    pub time_step: f32,
    /// Conductance (edge threshold on normalized intensities). Default: 0.1
    pub conductance: f32,
}

impl DiffusionParams {
    pub const ITERATIONS_MIN: usize = 1;
    pub const ITERATIONS_MAX: usize = 50;
    pub const TIME_STEP_MIN: f32 = 0.01;
    // 4-neighbour explicit scheme is stable for dt <= 0.25
    pub const TIME_STEP_MAX: f32 = 0.25;
    pub const CONDUCTANCE_MIN: f32 = 0.01;
    pub const CONDUCTANCE_MAX: f32 = 1.0;

    /// Validate all fields against their declared ranges.
    pub fn validate(&self) -> Result<(), String> {
        if !(self.iterations >= Self::ITERATIONS_MIN && self.iterations <= Self::ITERATIONS_MAX) {
            return Err(format!(
                "iterations {} outside [{}, {}]",
                self.iterations,
                Self::ITERATIONS_MIN,
                Self::ITERATIONS_MAX
            ));
        }
        if !(self.time_step >= Self::TIME_STEP_MIN && self.time_step <= Self::TIME_STEP_MAX) {
            return Err(format!(
                "time step {} outside [{}, {}]",
                self.time_step,
                Self::TIME_STEP_MIN,
                Self::TIME_STEP_MAX
            ));
        }
        if !(self.conductance >= Self::CONDUCTANCE_MIN && self.conductance <= Self::CONDUCTANCE_MAX)
        {
            return Err(format!(
                "conductance {} outside [{}, {}]",
                self.conductance,
                Self::CONDUCTANCE_MIN,
                Self::CONDUCTANCE_MAX
            ));
        }
        Ok(())
    }
}

impl Default for DiffusionParams {
    fn default() -> Self {
        Self {
            iterations: DEFAULT_DIFFUSION_ITERATIONS,
            time_step: DEFAULT_DIFFUSION_TIME_STEP,
            conductance: DEFAULT_DIFFUSION_CONDUCTANCE,
        }
    }
}

/// Parameters for non-local means.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct NonLocalMeansParams {
    /// Filter strength; larger values average more aggressively. Default: 0.15
    pub strength: f32,
    /// Half size of the comparison patch. Default: 4
    pub half_block: usize,
    /// Half size of the search window around each pixel. Default: 5
    pub half_search: usize,
}

impl NonLocalMeansParams {
    pub const STRENGTH_MIN: f32 = 0.01;
    pub const STRENGTH_MAX: f32 = 1.0;
    pub const HALF_BLOCK_MIN: usize = 1;
    pub const HALF_BLOCK_MAX: usize = 5;
    pub const HALF_SEARCH_MIN: usize = 2;
    pub const HALF_SEARCH_MAX: usize = 10;

    /// Validate all fields against their declared ranges.
    pub fn validate(&self) -> Result<(), String> {
        if !(self.strength >= Self::STRENGTH_MIN && self.strength <= Self::STRENGTH_MAX) {
            return Err(format!(
                "strength {} outside [{}, {}]",
                self.strength,
                Self::STRENGTH_MIN,
                Self::STRENGTH_MAX
            ));
        }
        if !(self.half_block >= Self::HALF_BLOCK_MIN && self.half_block <= Self::HALF_BLOCK_MAX) {
            return Err(format!(
                "half block {} outside [{}, {}]",
                self.half_block,
                Self::HALF_BLOCK_MIN,
                Self::HALF_BLOCK_MAX
            ));
        }
        if !(self.half_search >= Self::HALF_SEARCH_MIN && self.half_search <= Self::HALF_SEARCH_MAX)
        {
            return Err(format!(
                "half search {} outside [{}, {}]",
                self.half_search,
                Self::HALF_SEARCH_MIN,
                Self::HALF_SEARCH_MAX
            ));
        }
        Ok(())
    }
}

impl Default for NonLocalMeansParams {
    fn default() -> Self {
        Self {
            strength: DEFAULT_NLM_STRENGTH,
            half_block: DEFAULT_NLM_HALF_BLOCK,
            half_search: DEFAULT_NLM_HALF_SEARCH,
        }
    }
}

/// Parameters for Haar wavelet soft thresholding.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct WaveletParams {
    /// Soft-threshold applied to detail coefficients. Default: 0.1
    pub threshold: f32,
    /// Number of decomposition levels. Default: 3
    pub levels: usize,
}

impl WaveletParams {
    pub const THRESHOLD_MIN: f32 = 0.0;
    pub const THRESHOLD_MAX: f32 = 1.0;
    pub const LEVELS_MIN: usize = 1;
    pub const LEVELS_MAX: usize = 5;

    /// Validate all fields against their declared ranges.
    pub fn validate(&self) -> Result<(), String> {
        if !(self.threshold >= Self::THRESHOLD_MIN && self.threshold <= Self::THRESHOLD_MAX) {
            return Err(format!(
                "threshold {} outside [{}, {}]",
                self.threshold,
                Self::THRESHOLD_MIN,
                Self::THRESHOLD_MAX
            ));
        }
        if !(self.levels >= Self::LEVELS_MIN && self.levels <= Self::LEVELS_MAX) {
            return Err(format!(
                "levels {} outside [{}, {}]",
                self.levels,
                Self::LEVELS_MIN,
                Self::LEVELS_MAX
            ));
        }
        Ok(())
    }
}

impl Default for WaveletParams {
    fn default() -> Self {
        Self {
            threshold: DEFAULT_WAVELET_THRESHOLD,
            levels: DEFAULT_WAVELET_LEVELS,
        }
    }
}

// =============================================================================
// Combined Parameter Set
// =============================================================================

/// A full parameter set for one algorithm.
///
/// The variant identifies the algorithm, so a `DenoiseParams` value is always
/// internally consistent: there is no way to pair Gaussian parameters with the
/// wavelet kernel.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum DenoiseParams {
    Gaussian(GaussianParams),
    AnisotropicDiffusion(DiffusionParams),
    NonLocalMeans(NonLocalMeansParams),
    WaveletThresholding(WaveletParams),
}

impl DenoiseParams {
    /// The algorithm these parameters belong to.
    pub fn algorithm(&self) -> AlgorithmId {
        match self {
            DenoiseParams::Gaussian(_) => AlgorithmId::Gaussian,
            DenoiseParams::AnisotropicDiffusion(_) => AlgorithmId::AnisotropicDiffusion,
            DenoiseParams::NonLocalMeans(_) => AlgorithmId::NonLocalMeans,
            DenoiseParams::WaveletThresholding(_) => AlgorithmId::WaveletThresholding,
        }
    }

    /// Default parameter set for the given algorithm.
    pub fn default_for(algorithm: AlgorithmId) -> Self {
        match algorithm {
            AlgorithmId::Gaussian => DenoiseParams::Gaussian(GaussianParams::default()),
            AlgorithmId::AnisotropicDiffusion => {
                DenoiseParams::AnisotropicDiffusion(DiffusionParams::default())
            }
            AlgorithmId::NonLocalMeans => {
                DenoiseParams::NonLocalMeans(NonLocalMeansParams::default())
            }
            AlgorithmId::WaveletThresholding => {
                DenoiseParams::WaveletThresholding(WaveletParams::default())
            }
        }
    }

    /// Validate the contained parameter struct against its declared ranges.
    pub fn validate(&self) -> Result<(), String> {
        match self {
            DenoiseParams::Gaussian(p) => p.validate(),
            DenoiseParams::AnisotropicDiffusion(p) => p.validate(),
            DenoiseParams::NonLocalMeans(p) => p.validate(),
            DenoiseParams::WaveletThresholding(p) => p.validate(),
        }
    }
}

impl Default for DenoiseParams {
    fn default() -> Self {
        DenoiseParams::default_for(AlgorithmId::default())
    }
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
#[allow(clippy::field_reassign_with_default)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_are_valid() {
        for algorithm in AlgorithmId::ALL {
            let params = DenoiseParams::default_for(algorithm);
            assert!(params.validate().is_ok(), "{:?}", algorithm);
            assert_eq!(params.algorithm(), algorithm);
        }
    }

    #[test]
    fn test_gaussian_sigma_out_of_range() {
        let params = GaussianParams { sigma: 0.0 };
        assert!(params.validate().is_err());

        let params = GaussianParams { sigma: 100.0 };
        assert!(params.validate().is_err());
    }

    #[test]
    fn test_gaussian_sigma_nan_rejected() {
        let params = GaussianParams { sigma: f32::NAN };
        assert!(params.validate().is_err());
    }

    #[test]
    fn test_diffusion_time_step_bounds() {
        let mut params = DiffusionParams::default();
        params.time_step = 0.5; // unstable
        assert!(params.validate().is_err());

        params.time_step = 0.25;
        assert!(params.validate().is_ok());
    }

    #[test]
    fn test_nlm_window_bounds() {
        let mut params = NonLocalMeansParams::default();
        params.half_search = 0;
        assert!(params.validate().is_err());

        params = NonLocalMeansParams::default();
        params.half_block = 6;
        assert!(params.validate().is_err());
    }

    #[test]
    fn test_wavelet_levels_bounds() {
        let mut params = WaveletParams::default();
        params.levels = 0;
        assert!(params.validate().is_err());

        params.levels = 5;
        assert!(params.validate().is_ok());
    }

    #[test]
    fn test_readable_names_distinct() {
        let names: Vec<&str> = AlgorithmId::ALL.iter().map(|a| a.readable_name()).collect();
        for (i, a) in names.iter().enumerate() {
            for b in &names[i + 1..] {
                assert_ne!(a, b);
            }
        }
    }
}
