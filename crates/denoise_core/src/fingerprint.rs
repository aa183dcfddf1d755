//! Value-comparable snapshots of denoising requests.

use std::hash::{Hash, Hasher};

use crate::params::{AlgorithmId, DenoiseParams};

/// An immutable deep snapshot of (algorithm, parameters, epoch), taken at
/// event time.
///
/// Equality and hashing go by full value, never identity: two fingerprints are
/// equal iff the algorithm, the epoch, and every parameter field match. This
/// is the only form in which parameter state crosses from the UI thread into
/// asynchronous work; a fingerprint never retains a reference to the live
/// parameter object, so later UI edits cannot reach it.
#[derive(Debug, Clone, PartialEq)]
pub struct ParameterFingerprint {
    algorithm: AlgorithmId,
    epoch: u64,
    params: DenoiseParams,
}

// Parameter fields are range-validated before use, which excludes NaN, so the
// derived partial equality is total in practice.
impl Eq for ParameterFingerprint {}

impl Hash for ParameterFingerprint {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.algorithm.hash(state);
        self.epoch.hash(state);
        match &self.params {
            DenoiseParams::Gaussian(p) => {
                hash_f32(p.sigma, state);
            }
            DenoiseParams::AnisotropicDiffusion(p) => {
                p.iterations.hash(state);
                hash_f32(p.time_step, state);
                hash_f32(p.conductance, state);
            }
            DenoiseParams::NonLocalMeans(p) => {
                hash_f32(p.strength, state);
                p.half_block.hash(state);
                p.half_search.hash(state);
            }
            DenoiseParams::WaveletThresholding(p) => {
                hash_f32(p.threshold, state);
                p.levels.hash(state);
            }
        }
    }
}

/// Hash a float by bit pattern. -0.0 compares equal to 0.0, so the two must
/// hash alike as well.
fn hash_f32<H: Hasher>(value: f32, state: &mut H) {
    let canonical = if value == 0.0 { 0.0f32 } else { value };
    canonical.to_bits().hash(state);
}

impl ParameterFingerprint {
    /// Snapshot the given parameters at `epoch`. The parameter set is copied
    /// field by field; no reference to the caller's value is kept.
    pub fn new(params: &DenoiseParams, epoch: u64) -> Self {
        Self {
            algorithm: params.algorithm(),
            epoch,
            params: *params,
        }
    }

    pub fn algorithm(&self) -> AlgorithmId {
        self.algorithm
    }

    pub fn epoch(&self) -> u64 {
        self.epoch
    }

    pub fn params(&self) -> &DenoiseParams {
        &self.params
    }
}

// =============================================================================
// Tests
// =============================================================================
