use crate::shape::Shape;
use crate::symbolic::{t, Expr};
use crate::tensor::SymTensor;
use ::proptest::collection::vec;
use ::proptest::prelude::*;

pub fn point(geometric_dim: usize) -> impl Strategy<Value = Vec<f64>> {
    // Keep coordinates moderate, so that polynomials of high degree stay well-conditioned
    vec(-2.0..2.0, geometric_dim)
}

pub fn time() -> impl Strategy<Value = f64> {
    -2.0..2.0
}

/// A monomial `c * x^a * y^b * z^c * t^d` with time exponent at most 1.
fn monomial(geometric_dim: usize, max_degree: usize) -> impl Strategy<Value = Expr> {
    let exponents = vec(0..=max_degree as i32, geometric_dim);
    (-5.0..5.0, exponents, 0..=1i32).prop_map(move |(coefficient, exponents, time_exponent)| {
        let powers = exponents
            .into_iter()
            .enumerate()
            .map(|(axis, exponent)| Expr::coordinate(axis).powi(exponent));
        Expr::product(
            std::iter::once(Expr::number(coefficient))
                .chain(powers)
                .chain(std::iter::once(t().powi(time_exponent))),
        )
    })
}

/// A polynomial in the coordinates of the given dimension, and possibly time.
pub fn polynomial(geometric_dim: usize, max_degree: usize) -> impl Strategy<Value = Expr> {
    vec(monomial(geometric_dim, max_degree), 1..=4).prop_map(Expr::sum)
}

/// A tensor of the given shape with polynomial components.
pub fn polynomial_tensor(shape: Shape, geometric_dim: usize, max_degree: usize) -> impl Strategy<Value = SymTensor> {
    let num_components = shape.num_components();
    vec(polynomial(geometric_dim, max_degree), num_components)
        .prop_map(move |components| SymTensor::from_components(shape.clone(), components))
}
