//! Functionality for error estimation.
//!
//! Error norms compare two point-evaluable functions, typically a compiled manufactured solution
//! and a numerical approximation, by integrating their squared difference with a quadrature rule.
use crate::compiled::CompiledExpression;
use eyre::eyre;
use fenris_mms_quadrature::Rule;

/// A function that can be evaluated at points in space.
pub trait SpatialFunction {
    /// The number of scalar components of the function value.
    fn num_components(&self) -> usize;

    /// The dimension of the points the function accepts, if known.
    fn geometric_dim(&self) -> Option<usize> {
        None
    }

    /// Evaluates the function at the given point, writing its components to `output`.
    fn evaluate_into(&self, point: &[f64], output: &mut [f64]);
}

impl SpatialFunction for CompiledExpression {
    fn num_components(&self) -> usize {
        self.shape().num_components()
    }

    fn geometric_dim(&self) -> Option<usize> {
        Some(CompiledExpression::geometric_dim(self))
    }

    fn evaluate_into(&self, point: &[f64], output: &mut [f64]) {
        CompiledExpression::evaluate_into(self, point, output)
    }
}

impl<F: SpatialFunction + ?Sized> SpatialFunction for &F {
    fn num_components(&self) -> usize {
        F::num_components(self)
    }

    fn geometric_dim(&self) -> Option<usize> {
        F::geometric_dim(self)
    }

    fn evaluate_into(&self, point: &[f64], output: &mut [f64]) {
        F::evaluate_into(self, point, output)
    }
}

/// Adapts a closure `f(point, output)` to a [`SpatialFunction`].
#[derive(Debug, Clone)]
pub struct FnSpatialFunction<F> {
    num_components: usize,
    function: F,
}

impl<F> FnSpatialFunction<F>
where
    F: Fn(&[f64], &mut [f64]),
{
    pub fn new(num_components: usize, function: F) -> Self {
        Self {
            num_components,
            function,
        }
    }
}

impl<F> SpatialFunction for FnSpatialFunction<F>
where
    F: Fn(&[f64], &mut [f64]),
{
    fn num_components(&self) -> usize {
        self.num_components
    }

    fn evaluate_into(&self, point: &[f64], output: &mut [f64]) {
        (self.function)(point, output)
    }
}

/// Adapts a scalar closure `f(point)` to a [`SpatialFunction`].
pub fn scalar_function(f: impl Fn(&[f64]) -> f64) -> FnSpatialFunction<impl Fn(&[f64], &mut [f64])> {
    FnSpatialFunction::new(1, move |point: &[f64], output: &mut [f64]| output[0] = f(point))
}

/// Estimate the squared $L^2$ error $\norm{u - v}^2_{L^2}$ with the given quadrature rule.
///
/// Fails if the functions have different numbers of components, if either function accepts points
/// of a dimension other than `D`, or if the rule has mismatched weights and points.
#[allow(non_snake_case)]
pub fn estimate_L2_error_squared<const D: usize>(
    u: impl SpatialFunction,
    v: impl SpatialFunction,
    rule: &Rule<D>,
) -> eyre::Result<f64> {
    let (weights, points) = rule;
    if weights.len() != points.len() {
        return Err(eyre!(
            "Quadrature rule has {} weights but {} points",
            weights.len(),
            points.len()
        ));
    }
    for dim in [u.geometric_dim(), v.geometric_dim()].into_iter().flatten() {
        if dim != D {
            return Err(eyre!(
                "Cannot evaluate a function in {}D at the points of a {}D quadrature rule",
                dim,
                D
            ));
        }
    }
    let n = u.num_components();
    if v.num_components() != n {
        return Err(eyre!(
            "Cannot compare functions with {} and {} components",
            n,
            v.num_components()
        ));
    }

    let mut u_buffer = vec![0.0; n];
    let mut v_buffer = vec![0.0; n];
    let mut result = 0.0;
    for (w, x) in weights.iter().zip(points) {
        u.evaluate_into(x, &mut u_buffer);
        v.evaluate_into(x, &mut v_buffer);
        let error_squared: f64 = u_buffer
            .iter()
            .zip(&v_buffer)
            .map(|(u_i, v_i)| (u_i - v_i).powi(2))
            .sum();
        result += w * error_squared;
    }
    Ok(result)
}

/// Estimate the $L^2$ error $\norm{u - v}_{L^2}$ with the given quadrature rule.
///
/// See [`estimate_L2_error_squared`].
#[allow(non_snake_case)]
pub fn estimate_L2_error<const D: usize>(
    u: impl SpatialFunction,
    v: impl SpatialFunction,
    rule: &Rule<D>,
) -> eyre::Result<f64> {
    Ok(estimate_L2_error_squared(u, v, rule)?.sqrt())
}

/// Estimate the $L^2$ norm $\norm{u}_{L^2}$ with the given quadrature rule.
#[allow(non_snake_case)]
pub fn estimate_L2_norm<const D: usize>(u: impl SpatialFunction, rule: &Rule<D>) -> eyre::Result<f64> {
    let n = u.num_components();
    let zero = FnSpatialFunction::new(n, |_: &[f64], output: &mut [f64]| output.fill(0.0));
    estimate_L2_error(u, zero, rule)
}
