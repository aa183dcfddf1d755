//! Non-local means averaging.

use ndarray::{Array2, ArrayView2};
use rayon::prelude::*;

use super::mirror;
use crate::params::NonLocalMeansParams;

/// Resolution of the precomputed exponential table.
const EXP_TABLE_SIZE: usize = 4096;

/// Arguments beyond this contribute weights below e^-8, which are negligible.
const EXP_TABLE_MAX_ARG: f32 = 8.0;

/// Precomputed table for exp(-x) on [0, 8).
///
/// Built once per process when the non-local means module is loaded; the
/// inner pixel loop then replaces every transcendental call with an indexed
/// lookup.
#[derive(Debug, Clone)]
pub struct ExpTable {
    values: Vec<f32>,
    scale: f32,
}

impl ExpTable {
    pub fn new() -> Self {
        let scale = (EXP_TABLE_SIZE - 1) as f32 / EXP_TABLE_MAX_ARG;
        let values = (0..EXP_TABLE_SIZE)
            .map(|i| (-(i as f32) / scale).exp())
            .collect();
        Self { values, scale }
    }

    /// Approximate exp(-x) for x >= 0.
    pub fn exp_neg(&self, x: f32) -> f32 {
        if x >= EXP_TABLE_MAX_ARG {
            return 0.0;
        }
        self.values[(x * self.scale) as usize]
    }
}

impl Default for ExpTable {
    fn default() -> Self {
        Self::new()
    }
}

/// Denoise a plane by weighted averaging of similar patches.
///
/// For every pixel, all pixels inside the search window are weighted by the
/// similarity of their surrounding patches and averaged. Rows are processed
/// in parallel; the result is deterministic regardless of thread count.
pub fn non_local_means(
    input: ArrayView2<f32>,
    params: &NonLocalMeansParams,
    exp_table: &ExpTable,
) -> Array2<f32> {
    let (rows, cols) = input.dim();
    let inv_h_sq = 1.0 / (params.strength * params.strength);

    let row_values: Vec<Vec<f32>> = (0..rows)
        .into_par_iter()
        .map(|r| {
            (0..cols)
                .map(|c| nlm_pixel(input, r, c, params, inv_h_sq, exp_table))
                .collect()
        })
        .collect();

    let mut output = Array2::zeros((rows, cols));
    for (r, values) in row_values.into_iter().enumerate() {
        for (c, value) in values.into_iter().enumerate() {
            output[[r, c]] = value;
        }
    }
    output
}

fn nlm_pixel(
    input: ArrayView2<f32>,
    row: usize,
    col: usize,
    params: &NonLocalMeansParams,
    inv_h_sq: f32,
    exp_table: &ExpTable,
) -> f32 {
    let half_search = params.half_search as isize;

    let mut weight_sum = 0.0f32;
    let mut value_sum = 0.0f32;

    for dr in -half_search..=half_search {
        for dc in -half_search..=half_search {
            let (nr, nc) = (row as isize + dr, col as isize + dc);
            let distance = patch_distance(input, row, col, nr, nc, params.half_block);
            let weight = exp_table.exp_neg(distance * inv_h_sq);

            let (h, w) = input.dim();
            let value = input[[mirror(nr, h), mirror(nc, w)]];
            weight_sum += weight;
            value_sum += weight * value;
        }
    }

    value_sum / weight_sum
}

/// Mean squared difference between the patches centered on (ar, ac) and
/// (br, bc), with mirrored boundaries.
fn patch_distance(
    input: ArrayView2<f32>,
    ar: usize,
    ac: usize,
    br: isize,
    bc: isize,
    half_block: usize,
) -> f32 {
    let (rows, cols) = input.dim();
    let half = half_block as isize;

    let mut sum = 0.0f32;
    for dr in -half..=half {
        for dc in -half..=half {
            let a = input[[
                mirror(ar as isize + dr, rows),
                mirror(ac as isize + dc, cols),
            ]];
            let b = input[[mirror(br + dr, rows), mirror(bc + dc, cols)]];
            let diff = a - b;
            sum += diff * diff;
        }
    }

    let side = 2 * half_block + 1;
    sum / (side * side) as f32
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn params() -> NonLocalMeansParams {
        NonLocalMeansParams {
            strength: 0.15,
            half_block: 2,
            half_search: 3,
        }
    }

    #[test]
    fn test_exp_table_tracks_exp() {
        let table = ExpTable::new();
        for x in [0.0f32, 0.1, 0.5, 1.0, 3.0, 7.9] {
            let expected = (-x).exp();
            assert!(
                (table.exp_neg(x) - expected).abs() < 5e-3,
                "x = {}",
                x
            );
        }
        assert_eq!(table.exp_neg(8.0), 0.0);
        assert_eq!(table.exp_neg(100.0), 0.0);
    }

    #[test]
    fn test_preserves_dimensions() {
        let input = Array2::<f32>::zeros((10, 7));
        let output = non_local_means(input.view(), &params(), &ExpTable::new());
        assert_eq!(output.dim(), (10, 7));
    }

    #[test]
    fn test_constant_plane_unchanged() {
        let input = Array2::from_elem((8, 8), 0.6f32);
        let output = non_local_means(input.view(), &params(), &ExpTable::new());
        for &v in output.iter() {
            assert!((v - 0.6).abs() < 1e-4);
        }
    }

    #[test]
    fn test_deterministic_across_runs() {
        let input = Array2::from_shape_fn((12, 12), |(r, c)| ((r * 31 + c * 17) % 11) as f32 / 10.0);
        let table = ExpTable::new();
        let a = non_local_means(input.view(), &params(), &table);
        let b = non_local_means(input.view(), &params(), &table);
        assert_eq!(a, b);
    }

    #[test]
    fn test_reduces_single_pixel_noise() {
        let mut input = Array2::from_elem((9, 9), 0.5f32);
        input[[4, 4]] = 0.9;

        let output = non_local_means(input.view(), &params(), &ExpTable::new());
        assert!((output[[4, 4]] - 0.5).abs() < 0.4);
        assert!(output[[4, 4]] < 0.9);
    }
}
