//! Quadrature rules for the one-dimensional domain `[-1, 1]`.

use crate::Rule;
use std::f64::consts::PI;

/// Evaluates the Legendre polynomial `p_n` and its derivative at `x`.
///
/// The derivative formula is singular at `|x| == 1`, so `x` must lie in the open interval.
fn legendre_with_derivative(n: usize, x: f64) -> (f64, f64) {
    // m p_m(x) = (2m - 1) x p_{m - 1}(x) - (m - 1) p_{m - 2}(x)
    let mut current = 1.0;
    let mut previous = 0.0;
    for m in 1..=n {
        let m = m as f64;
        let next = ((2.0 * m - 1.0) * x * current - (m - 1.0) * previous) / m;
        previous = current;
        current = next;
    }
    let n = n as f64;
    let derivative = n * (x * current - previous) / (x * x - 1.0);
    (current, derivative)
}

/// Gauss-Legendre quadrature for the reference interval `[-1, 1]`.
///
/// A rule with `n` points integrates polynomials of degree up to `2n - 1` exactly.
/// Points are returned in ascending order.
///
/// # Panics
///
/// Panics if zero points are requested.
pub fn gauss(num_points: usize) -> Rule<1> {
    let n = num_points;
    assert!(n > 0, "number of points must be positive");

    let mut roots = vec![0.0; n];
    let mut weights = vec![0.0; n];

    // Roots are symmetric about the origin, so only the non-negative half is computed.
    // Chebyshev-like initial guesses descend from the right end of the interval.
    for i in 0..(n + 1) / 2 {
        let mut x = (PI * (i as f64 + 0.75) / (n as f64 + 0.5)).cos();
        // Newton's method. Convergence is quadratic from these initial guesses, the iteration
        // cap only guards against oscillation in the last bit.
        for _ in 0..100 {
            let (p, dp) = legendre_with_derivative(n, x);
            let dx = p / dp;
            x -= dx;
            if dx.abs() <= 1e-15 {
                break;
            }
        }
        let (_, dp) = legendre_with_derivative(n, x);
        let w = 2.0 / ((1.0 - x * x) * dp * dp);

        roots[n - 1 - i] = x;
        weights[n - 1 - i] = w;
        roots[i] = -x;
        weights[i] = w;
    }

    // The middle root of an odd rule is exactly zero
    if n % 2 == 1 {
        roots[n / 2] = 0.0;
    }

    (weights, roots.into_iter().map(|x| [x]).collect())
}

/// Maps a rule on `[-1, 1]` to the interval `[a, b]`.
pub fn map_to_interval(rule: &Rule<1>, a: f64, b: f64) -> Rule<1> {
    let half_length = 0.5 * (b - a);
    let midpoint = 0.5 * (a + b);
    let (weights, points) = rule;
    let weights = weights.iter().map(|w| w * half_length).collect();
    let points = points
        .iter()
        .map(|&[xi]| [midpoint + half_length * xi])
        .collect();
    (weights, points)
}
