//! Separable Gaussian blur with mirrored boundaries.

use ndarray::{Array2, ArrayView2};

use super::mirror;

/// Kernel radius in standard deviations. Truncating at 3 sigma keeps > 99.7%
/// of the kernel mass.
const KERNEL_RADIUS_SIGMAS: f32 = 3.0;

/// Build a normalized 1-D Gaussian kernel for the given sigma.
pub fn gaussian_kernel_1d(sigma: f32) -> Vec<f32> {
    let radius = ((sigma * KERNEL_RADIUS_SIGMAS).ceil() as usize).max(1);
    let inv_two_sigma_sq = 1.0 / (2.0 * sigma * sigma);

    let mut kernel = Vec::with_capacity(2 * radius + 1);
    for i in -(radius as isize)..=(radius as isize) {
        let x = i as f32;
        kernel.push((-x * x * inv_two_sigma_sq).exp());
    }

    let sum: f32 = kernel.iter().sum();
    for w in &mut kernel {
        *w /= sum;
    }
    kernel
}

/// Blur a plane with a separable Gaussian of the given sigma.
pub fn gaussian_blur(input: ArrayView2<f32>, sigma: f32) -> Array2<f32> {
    let kernel = gaussian_kernel_1d(sigma);
    let horizontal = convolve_rows(input, &kernel);
    let transposed = convolve_rows(horizontal.t(), &kernel);
    transposed.reversed_axes()
}

/// Convolve each row with a 1-D kernel, mirroring at the edges.
fn convolve_rows(input: ArrayView2<f32>, kernel: &[f32]) -> Array2<f32> {
    let (rows, cols) = input.dim();
    let radius = kernel.len() / 2;

    let mut output = Array2::zeros((rows, cols));
    for r in 0..rows {
        for c in 0..cols {
            let mut acc = 0.0;
            for (k, &w) in kernel.iter().enumerate() {
                let offset = k as isize - radius as isize;
                let src = mirror(c as isize + offset, cols);
                acc += w * input[[r, src]];
            }
            output[[r, c]] = acc;
        }
    }
    output
}

// =============================================================================
// Tests
// =============================================================================
