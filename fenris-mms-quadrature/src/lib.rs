//! Quadrature rules for integrating error integrands over simple domains.
//!
//! The rules in this crate are used by `fenris-mms` to estimate error norms between a compiled
//! manufactured expression and a numerical reference. They do not depend on `fenris-mms` and may
//! be used on their own.
//!
//! Rules are stored as a pair of weights and points. Reference rules live on `[-1, 1]^D`,
//! while the [`composite`] rules cover the unit box `[0, 1]^D` with a uniform grid of cells.

pub mod composite;
pub mod tensor;
pub mod univariate;

/// A D-dimensional point.
pub type Point<const D: usize> = [f64; D];

/// A D-dimensional rule.
pub type Rule<const D: usize> = (Vec<f64>, Vec<Point<D>>);

/// A one-dimensional quadrature rule.
pub type Rule1d = Rule<1>;

/// A two-dimensional quadrature rule.
pub type Rule2d = Rule<2>;

/// A three-dimensional quadrature rule.
pub type Rule3d = Rule<3>;

/// Approximates the integral of `f` with the given rule.
pub fn integrate<const D: usize>(rule: &Rule<D>, f: impl Fn(&Point<D>) -> f64) -> f64 {
    let (weights, points) = rule;
    assert_eq!(weights.len(), points.len(), "weights and points must have the same length");
    weights.iter().zip(points).map(|(w, x)| w * f(x)).sum()
}
