//! Composite rules on the unit box `[0, 1]^D`.
//!
//! The unit box is divided into `cells_per_dim^D` congruent cells, and a tensor-product Gauss
//! rule is placed in every cell. This mirrors integrating over a uniform unit interval, square
//! or cube mesh with an element-wise quadrature rule.

use crate::tensor::box_gauss;
use crate::Rule;

/// A composite Gauss rule for the unit box `[0, 1]^D`.
///
/// # Panics
///
/// Panics if `cells_per_dim` or `num_points_per_dim` is zero.
pub fn unit_box_gauss<const D: usize>(cells_per_dim: usize, num_points_per_dim: usize) -> Rule<D> {
    assert!(cells_per_dim > 0, "number of cells must be positive");
    let (reference_weights, reference_points) = box_gauss::<D>(num_points_per_dim);

    let h = 1.0 / cells_per_dim as f64;
    // Jacobian determinant of the map from [-1, 1]^D to a cell of side h
    let scale = (0.5 * h).powi(D as i32);
    let num_cells = cells_per_dim.pow(D as u32);
    let total = num_cells * reference_weights.len();
    let mut weights = Vec::with_capacity(total);
    let mut points = Vec::with_capacity(total);

    for cell_index in 0..num_cells {
        let mut remainder = cell_index;
        let mut cell_origin = [0.0; D];
        for axis in (0..D).rev() {
            cell_origin[axis] = (remainder % cells_per_dim) as f64 * h;
            remainder /= cells_per_dim;
        }

        for (w, xi) in reference_weights.iter().zip(&reference_points) {
            let mut x = [0.0; D];
            for axis in 0..D {
                x[axis] = cell_origin[axis] + 0.5 * h * (xi[axis] + 1.0);
            }
            weights.push(w * scale);
            points.push(x);
        }
    }

    (weights, points)
}

/// A composite Gauss rule for the unit interval `[0, 1]`.
pub fn unit_interval_gauss(cells: usize, num_points: usize) -> Rule<1> {
    unit_box_gauss(cells, num_points)
}

/// A composite Gauss rule for the unit square `[0, 1]^2`.
pub fn unit_square_gauss(cells_per_dim: usize, num_points_per_dim: usize) -> Rule<2> {
    unit_box_gauss(cells_per_dim, num_points_per_dim)
}

/// A composite Gauss rule for the unit cube `[0, 1]^3`.
pub fn unit_cube_gauss(cells_per_dim: usize, num_points_per_dim: usize) -> Rule<3> {
    unit_box_gauss(cells_per_dim, num_points_per_dim)
}
