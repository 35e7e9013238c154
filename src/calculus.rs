//! Tensor calculus on symbolic tensors.
//!
//! Every operator here works componentwise on [`SymTensor`]s and delegates the actual
//! differentiation of scalar components to [`Expr::diff`]. Derivatives are only ever taken with
//! respect to spatial coordinates; the time symbol is left untouched.
use crate::expression::curl_shape;
use crate::shape::{broadcast, dot_shape, inner_shape, outer_shape, square_matrix_dim, sum_shape, Shape, ShapeError};
use crate::symbolic::{Expr, MathFunction, Predicate, Symbol};
use crate::tensor::SymTensor;
use crate::translate::TranslationError;

/// The partial derivative of every component with respect to the coordinate along `axis`.
pub fn partial_derivative(tensor: &SymTensor, axis: usize) -> SymTensor {
    let symbol = Symbol::coordinate(axis);
    tensor.map(|component| component.diff(symbol))
}

/// The gradient, which appends a trailing axis of dimension `geometric_dim`.
///
/// Entry `[i_1, ..., i_r, j]` is the partial derivative of component `[i_1, ..., i_r]` with
/// respect to coordinate `j`.
pub fn grad(tensor: &SymTensor, geometric_dim: usize) -> SymTensor {
    let symbols: Vec<_> = (0..geometric_dim).map(Symbol::coordinate).collect();
    let components = tensor
        .components()
        .iter()
        .flat_map(|component| symbols.iter().map(move |&symbol| component.diff(symbol)))
        .collect();
    SymTensor::from_components(tensor.shape().with_trailing_axis(geometric_dim), components)
}

/// The divergence, contracting the trailing axis with the partial derivatives.
///
/// The divergence of a vector is a scalar, and the divergence of a matrix is the vector of the
/// divergences of its rows.
pub fn div(tensor: &SymTensor, geometric_dim: usize) -> Result<SymTensor, ShapeError> {
    let shape = tensor.shape();
    if shape.dims().last() != Some(&geometric_dim) {
        return Err(ShapeError::new(
            "div",
            &[shape],
            "the trailing dimension must equal the geometric dimension",
        ));
    }
    let components = tensor
        .components()
        .chunks(geometric_dim)
        .map(|row| {
            Expr::sum(
                row.iter()
                    .enumerate()
                    .map(|(axis, component)| component.diff(Symbol::coordinate(axis))),
            )
        })
        .collect();
    Ok(SymTensor::from_components(shape.strip_trailing(), components))
}

/// The curl in 2D or 3D.
///
/// - scalar `u`: the rotated gradient `(du/dx1, -du/dx0)`
/// - 2-vector `v`: the scalar `dv1/dx0 - dv0/dx1`
/// - 3-vector `v` (3D only): the usual curl vector
pub fn curl(tensor: &SymTensor, geometric_dim: usize) -> Result<SymTensor, TranslationError> {
    let shape = curl_shape(tensor.shape(), geometric_dim)?;
    let d = |index: usize, axis: usize| tensor.components()[index].diff(Symbol::coordinate(axis));
    let components = match tensor.shape().dims() {
        [] => vec![d(0, 1), -d(0, 0)],
        [2] => vec![d(1, 0) - d(0, 1)],
        _ => vec![d(2, 1) - d(1, 2), d(0, 2) - d(2, 0), d(1, 0) - d(0, 1)],
    };
    Ok(SymTensor::from_components(shape, components))
}

/// Contracts the trailing axis of `a` with the leading axis of `b`.
///
/// Two scalars are multiplied.
pub fn dot(a: &SymTensor, b: &SymTensor) -> Result<SymTensor, ShapeError> {
    let shape = dot_shape(a.shape(), b.shape())?;
    if a.shape().is_scalar() {
        return Ok(SymTensor::scalar(a.components()[0].clone() * &b.components()[0]));
    }
    // a is viewed as an (m x k) matrix and b as a (k x n) matrix
    let k = a.shape().dims().last().copied().unwrap_or(1);
    let m = a.components().len() / k;
    let n = b.components().len() / k;
    let mut components = Vec::with_capacity(m * n);
    for i in 0..m {
        for j in 0..n {
            components.push(Expr::sum(
                (0..k).map(|l| &a.components()[i * k + l] * &b.components()[l * n + j]),
            ));
        }
    }
    Ok(SymTensor::from_components(shape, components))
}

/// The full contraction of two tensors of identical shape.
pub fn inner(a: &SymTensor, b: &SymTensor) -> Result<SymTensor, ShapeError> {
    inner_shape(a.shape(), b.shape())?;
    let terms = a
        .components()
        .iter()
        .zip(b.components())
        .map(|(a_i, b_i)| a_i * b_i);
    Ok(SymTensor::scalar(Expr::sum(terms)))
}

/// The outer product, whose rank is the sum of the ranks of `a` and `b`.
pub fn outer(a: &SymTensor, b: &SymTensor) -> SymTensor {
    let shape = outer_shape(a.shape(), b.shape());
    let components = a
        .components()
        .iter()
        .flat_map(|a_i| b.components().iter().map(move |b_j| a_i * b_j))
        .collect();
    SymTensor::from_components(shape, components)
}

pub fn transpose(tensor: &SymTensor) -> Result<SymTensor, ShapeError> {
    match tensor.shape().dims() {
        &[m, n] => Ok(SymTensor::from_fn(Shape::matrix(n, m), |index| {
            tensor.get(&[index[1], index[0]]).clone()
        })),
        _ => Err(ShapeError::new("transpose", &[tensor.shape()], "operand must be a matrix")),
    }
}

pub fn trace(tensor: &SymTensor) -> Result<SymTensor, ShapeError> {
    let n = square_matrix_dim("trace", tensor.shape())?;
    let diagonal = (0..n).map(|i| tensor.get(&[i, i]).clone());
    Ok(SymTensor::scalar(Expr::sum(diagonal)))
}

/// The determinant of a square matrix, by cofactor expansion along the first row.
///
/// The determinant of a scalar is the scalar itself.
pub fn determinant(tensor: &SymTensor) -> Result<SymTensor, ShapeError> {
    if let Some(scalar) = tensor.as_scalar() {
        return Ok(SymTensor::scalar(scalar.clone()));
    }
    let n = square_matrix_dim("determinant", tensor.shape())?;
    let rows: Vec<Vec<Expr>> = tensor
        .components()
        .chunks(n)
        .map(|row| row.to_vec())
        .collect();
    Ok(SymTensor::scalar(cofactor_expansion(&rows)))
}

fn cofactor_expansion(rows: &[Vec<Expr>]) -> Expr {
    match rows.len() {
        1 => rows[0][0].clone(),
        2 => &rows[0][0] * &rows[1][1] - &rows[0][1] * &rows[1][0],
        n => Expr::sum((0..n).map(|j| {
            let minor: Vec<Vec<Expr>> = rows[1..]
                .iter()
                .map(|row| {
                    row.iter()
                        .enumerate()
                        .filter(|&(col, _)| col != j)
                        .map(|(_, entry)| entry.clone())
                        .collect()
                })
                .collect();
            let sign = if j % 2 == 0 { 1.0 } else { -1.0 };
            sign * &rows[0][j] * cofactor_expansion(&minor)
        })),
    }
}

/// Elementwise sum of two tensors of identical shape.
pub fn sum(a: &SymTensor, b: &SymTensor) -> Result<SymTensor, ShapeError> {
    sum_shape(a.shape(), b.shape())?;
    Ok(a.zip_map(b, |a_i, b_i| a_i + b_i))
}

/// Product of a scalar with a tensor of any rank.
pub fn product(a: &SymTensor, b: &SymTensor) -> Result<SymTensor, ShapeError> {
    let shape = broadcast(a.shape(), b.shape())?;
    let component = |tensor: &SymTensor, index: &[usize]| tensor.as_scalar().unwrap_or_else(|| tensor.get(index)).clone();
    Ok(SymTensor::from_fn(shape, |index| component(a, index) * component(b, index)))
}

/// Division of every component by a scalar.
pub fn division(a: &SymTensor, b: &SymTensor) -> Result<SymTensor, ShapeError> {
    let denominator = b
        .as_scalar()
        .ok_or_else(|| ShapeError::new("division", &[a.shape(), b.shape()], "the denominator must be a scalar"))?;
    let reciprocal = denominator.recip();
    Ok(a.map(|a_i| a_i * &reciprocal))
}

/// Raises every component to a scalar power.
pub fn power(base: &SymTensor, exponent: &SymTensor) -> Result<SymTensor, ShapeError> {
    let exponent = exponent.as_scalar().ok_or_else(|| {
        ShapeError::new(
            "power",
            &[base.shape(), exponent.shape()],
            "the exponent must be a scalar",
        )
    })?;
    Ok(base.map(|b_i| b_i.pow(exponent)))
}

/// Applies an elementary function to every component.
pub fn apply(function: MathFunction, tensor: &SymTensor) -> SymTensor {
    tensor.map(|component| Expr::apply(function, component.clone()))
}

/// Selects `then` where the predicate holds and `otherwise` elsewhere, componentwise.
pub fn piecewise(predicate: &Predicate, then: &SymTensor, otherwise: &SymTensor) -> Result<SymTensor, ShapeError> {
    sum_shape(then.shape(), otherwise.shape())
        .map_err(|_| ShapeError::new("conditional", &[then.shape(), otherwise.shape()], "branches must have identical shapes"))?;
    Ok(then.zip_map(otherwise, |a, b| Expr::piecewise(predicate.clone(), a.clone(), b.clone())))
}
