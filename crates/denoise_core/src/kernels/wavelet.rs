//! Haar wavelet decomposition with soft thresholding.

use ndarray::{Array2, ArrayView2};

use crate::params::WaveletParams;

use std::f32::consts::FRAC_1_SQRT_2;

/// Denoise a plane by multi-level Haar decomposition, soft-thresholding the
/// detail coefficients of every level, and reconstructing.
///
/// Each level transforms the even-sized top-left part of the current
/// approximation; a trailing odd row or column passes through untouched.
pub fn wavelet_threshold(input: ArrayView2<f32>, params: &WaveletParams) -> Array2<f32> {
    let mut plane = input.to_owned();
    let (rows, cols) = plane.dim();

    // Forward transform, thresholding each level's detail bands in place.
    let mut extents = Vec::with_capacity(params.levels);
    let (mut h, mut w) = (rows, cols);
    for _ in 0..params.levels {
        let (eh, ew) = (h & !1, w & !1);
        if eh < 2 || ew < 2 {
            break;
        }
        forward_rows(&mut plane, eh, ew);
        forward_cols(&mut plane, eh, ew);
        threshold_details(&mut plane, eh, ew, params.threshold);
        extents.push((eh, ew));
        h = eh / 2;
        w = ew / 2;
    }

    // Reconstruct in reverse level order.
    for &(eh, ew) in extents.iter().rev() {
        inverse_cols(&mut plane, eh, ew);
        inverse_rows(&mut plane, eh, ew);
    }

    plane
}

/// Soft-threshold every coefficient in the (eh, ew) region except the
/// approximation quadrant.
fn threshold_details(plane: &mut Array2<f32>, eh: usize, ew: usize, threshold: f32) {
    for r in 0..eh {
        for c in 0..ew {
            if r < eh / 2 && c < ew / 2 {
                continue; // approximation band
            }
            plane[[r, c]] = soft(plane[[r, c]], threshold);
        }
    }
}

fn soft(value: f32, threshold: f32) -> f32 {
    value.signum() * (value.abs() - threshold).max(0.0)
}

fn forward_rows(plane: &mut Array2<f32>, eh: usize, ew: usize) {
    let half = ew / 2;
    let mut scratch = vec![0.0f32; ew];
    for r in 0..eh {
        for i in 0..half {
            let a = plane[[r, 2 * i]];
            let b = plane[[r, 2 * i + 1]];
            scratch[i] = (a + b) * FRAC_1_SQRT_2;
            scratch[half + i] = (a - b) * FRAC_1_SQRT_2;
        }
        for (c, &v) in scratch.iter().enumerate() {
            plane[[r, c]] = v;
        }
    }
}

fn forward_cols(plane: &mut Array2<f32>, eh: usize, ew: usize) {
    let half = eh / 2;
    let mut scratch = vec![0.0f32; eh];
    for c in 0..ew {
        for i in 0..half {
            let a = plane[[2 * i, c]];
            let b = plane[[2 * i + 1, c]];
            scratch[i] = (a + b) * FRAC_1_SQRT_2;
            scratch[half + i] = (a - b) * FRAC_1_SQRT_2;
        }
        for (r, &v) in scratch.iter().enumerate() {
            plane[[r, c]] = v;
        }
    }
}

fn inverse_rows(plane: &mut Array2<f32>, eh: usize, ew: usize) {
    let half = ew / 2;
    let mut scratch = vec![0.0f32; ew];
    for r in 0..eh {
        for i in 0..half {
            let low = plane[[r, i]];
            let high = plane[[r, half + i]];
            scratch[2 * i] = (low + high) * FRAC_1_SQRT_2;
            scratch[2 * i + 1] = (low - high) * FRAC_1_SQRT_2;
        }
        for (c, &v) in scratch.iter().enumerate() {
            plane[[r, c]] = v;
        }
    }
}

fn inverse_cols(plane: &mut Array2<f32>, eh: usize, ew: usize) {
    let half = eh / 2;
    let mut scratch = vec![0.0f32; eh];
    for c in 0..ew {
        for i in 0..half {
            let low = plane[[i, c]];
            let high = plane[[half + i, c]];
            scratch[2 * i] = (low + high) * FRAC_1_SQRT_2;
            scratch[2 * i + 1] = (low - high) * FRAC_1_SQRT_2;
        }
        for (r, &v) in scratch.iter().enumerate() {
            plane[[r, c]] = v;
        }
    }
}

// =============================================================================
// Tests
// =============================================================================
