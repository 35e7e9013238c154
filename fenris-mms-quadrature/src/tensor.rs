//! Tensor-product quadrature rules on `[-1, 1]^D`.

use crate::univariate::gauss;
use crate::Rule;

/// Forms the D-dimensional tensor product of a one-dimensional rule.
///
/// Points are ordered with the last coordinate varying fastest.
pub fn tensor_product<const D: usize>(rule1d: &Rule<1>) -> Rule<D> {
    let (weights1d, points1d) = rule1d;
    let n = weights1d.len();
    let total = n.pow(D as u32);
    let mut weights = Vec::with_capacity(total);
    let mut points = Vec::with_capacity(total);

    for linear_index in 0..total {
        let mut remainder = linear_index;
        let mut point = [0.0; D];
        let mut weight = 1.0;
        for axis in (0..D).rev() {
            let i = remainder % n;
            remainder /= n;
            point[axis] = points1d[i][0];
            weight *= weights1d[i];
        }
        weights.push(weight);
        points.push(point);
    }

    (weights, points)
}

/// A Gauss rule for `[-1, 1]^D` with the given number of points per dimension.
pub fn box_gauss<const D: usize>(num_points_per_dim: usize) -> Rule<D> {
    tensor_product(&gauss(num_points_per_dim))
}

/// A Gauss rule for the reference quadrilateral `[-1, 1]^2`.
pub fn quadrilateral_gauss(num_points_per_dim: usize) -> Rule<2> {
    box_gauss(num_points_per_dim)
}

/// A Gauss rule for the reference hexahedron `[-1, 1]^3`.
pub fn hexahedron_gauss(num_points_per_dim: usize) -> Rule<3> {
    box_gauss(num_points_per_dim)
}
