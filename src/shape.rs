//! Shapes of scalar, vector and tensor quantities, and the shape algebra of tensor operators.
use itertools::Itertools;
use serde::{Deserialize, Serialize};
use std::error::Error;
use std::fmt;
use std::fmt::{Display, Formatter};

/// The rank and per-axis dimensions of a quantity.
///
/// A scalar has rank 0 and no axes. Components of a tensor are stored in row-major order, so
/// that the last axis varies fastest.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct Shape {
    dims: Vec<usize>,
}

impl Shape {
    pub fn scalar() -> Self {
        Self { dims: Vec::new() }
    }

    pub fn vector(n: usize) -> Self {
        Self::from_dims([n])
    }

    pub fn matrix(rows: usize, cols: usize) -> Self {
        Self::from_dims([rows, cols])
    }

    /// # Panics
    ///
    /// Panics if any dimension is zero.
    pub fn from_dims(dims: impl Into<Vec<usize>>) -> Self {
        let dims = dims.into();
        assert!(dims.iter().all(|&n| n > 0), "Shape dimensions must be positive");
        Self { dims }
    }

    pub fn rank(&self) -> usize {
        self.dims.len()
    }

    pub fn dims(&self) -> &[usize] {
        &self.dims
    }

    pub fn is_scalar(&self) -> bool {
        self.dims.is_empty()
    }

    /// Returns `true` if the shape is a rank-2 shape with equal dimensions.
    pub fn is_square(&self) -> bool {
        matches!(self.dims.as_slice(), [m, n] if m == n)
    }

    /// The number of scalar components. A scalar has a single component.
    pub fn num_components(&self) -> usize {
        self.dims.iter().product()
    }

    /// The shape obtained by appending an axis of dimension `n`.
    pub fn with_trailing_axis(&self, n: usize) -> Self {
        let mut dims = self.dims.clone();
        dims.push(n);
        Self::from_dims(dims)
    }

    /// The shape with the first `num_axes` axes removed.
    pub fn strip_leading(&self, num_axes: usize) -> Self {
        Self {
            dims: self.dims[num_axes..].to_vec(),
        }
    }

    /// The shape with the last axis removed.
    pub fn strip_trailing(&self) -> Self {
        let n = self.dims.len().saturating_sub(1);
        Self {
            dims: self.dims[..n].to_vec(),
        }
    }

    /// Concatenates the axes of two shapes.
    pub fn concat(&self, other: &Shape) -> Self {
        Self {
            dims: self.dims.iter().chain(&other.dims).copied().collect(),
        }
    }

    /// Returns the row-major linear index of the given multi-index.
    ///
    /// # Panics
    ///
    /// Panics if the multi-index does not have the same length as the rank, or if it is out of
    /// bounds.
    pub fn linear_index(&self, multi_index: &[usize]) -> usize {
        assert_eq!(multi_index.len(), self.rank(), "Multi-index must have one entry per axis");
        multi_index
            .iter()
            .zip(&self.dims)
            .fold(0, |linear, (&i, &n)| {
                assert!(i < n, "Index {} is out of bounds for axis of dimension {}", i, n);
                linear * n + i
            })
    }

    /// Iterates over all multi-indices in row-major order.
    ///
    /// A scalar shape produces exactly one (empty) multi-index.
    pub fn multi_indices(&self) -> impl Iterator<Item = Vec<usize>> {
        let iter: Box<dyn Iterator<Item = Vec<usize>>> = if self.is_scalar() {
            Box::new(std::iter::once(Vec::new()))
        } else {
            Box::new(self.dims.iter().map(|&n| 0..n).multi_cartesian_product())
        };
        iter
    }
}

impl Display for Shape {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "({})", self.dims.iter().join(", "))
    }
}

/// A mismatch between the shapes of the operands of an operator.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ShapeError {
    /// Name of the operator.
    pub operator: &'static str,
    /// Shapes of the offending operands.
    pub operands: Vec<Shape>,
    pub message: String,
}

impl ShapeError {
    pub fn new(operator: &'static str, operands: &[&Shape], message: impl Into<String>) -> Self {
        Self {
            operator,
            operands: operands.iter().map(|&shape| shape.clone()).collect(),
            message: message.into(),
        }
    }
}

impl Display for ShapeError {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Invalid operand shapes [{}] for {}: {}",
            self.operands.iter().join(", "),
            self.operator,
            self.message
        )
    }
}

impl Error for ShapeError {}

/// The shape of the sum of two operands, which must have identical shapes.
pub fn sum_shape(a: &Shape, b: &Shape) -> Result<Shape, ShapeError> {
    if a == b {
        Ok(a.clone())
    } else {
        Err(ShapeError::new("sum", &[a, b], "operands must have identical shapes"))
    }
}

/// The shape of the elementwise scalar product of two operands.
///
/// A rank-0 operand combines with an operand of any rank. Products of two tensors of rank 1 or
/// higher must be expressed with `dot`, `inner` or `outer`.
pub fn broadcast(a: &Shape, b: &Shape) -> Result<Shape, ShapeError> {
    match (a.is_scalar(), b.is_scalar()) {
        (true, _) => Ok(b.clone()),
        (_, true) => Ok(a.clone()),
        _ => Err(ShapeError::new(
            "product",
            &[a, b],
            "at least one factor must be a scalar, use dot, inner or outer for tensor products",
        )),
    }
}

/// The shape of `dot(a, b)`: the trailing axis of `a` is contracted with the leading axis of `b`.
///
/// Two scalars are multiplied.
pub fn dot_shape(a: &Shape, b: &Shape) -> Result<Shape, ShapeError> {
    if a.is_scalar() && b.is_scalar() {
        return Ok(Shape::scalar());
    }
    match (a.dims().last(), b.dims().first()) {
        (Some(m), Some(n)) if m == n => Ok(a.strip_trailing().concat(&b.strip_leading(1))),
        _ => Err(ShapeError::new(
            "dot",
            &[a, b],
            "the trailing dimension of the first operand must equal the leading dimension of the second",
        )),
    }
}

/// The shape of `inner(a, b)`, which is always a scalar.
pub fn inner_shape(a: &Shape, b: &Shape) -> Result<Shape, ShapeError> {
    if a == b {
        Ok(Shape::scalar())
    } else {
        Err(ShapeError::new("inner", &[a, b], "operands must have identical shapes"))
    }
}

/// The shape of `outer(a, b)`, whose rank is the sum of the operand ranks.
pub fn outer_shape(a: &Shape, b: &Shape) -> Shape {
    a.concat(b)
}

/// Checks that the shape is a square rank-2 shape, as needed for trace and determinant.
pub fn square_matrix_dim(operator: &'static str, shape: &Shape) -> Result<usize, ShapeError> {
    if shape.is_square() {
        Ok(shape.dims()[0])
    } else {
        Err(ShapeError::new(operator, &[shape], "operand must be a square matrix"))
    }
}
