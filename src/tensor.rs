//! Symbolic tensors and their numerical values.
use crate::shape::Shape;
use crate::symbolic::{Expr, Symbol};
use nalgebra::{DMatrix, DVector};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fmt;
use std::fmt::{Display, Formatter};

/// A rectangular array of scalar symbolic expressions.
///
/// Components are stored in row-major order according to the [`Shape`].
#[derive(Debug, Clone, PartialEq)]
pub struct SymTensor {
    shape: Shape,
    components: Vec<Expr>,
}

impl SymTensor {
    pub fn scalar(value: impl Into<Expr>) -> Self {
        Self {
            shape: Shape::scalar(),
            components: vec![value.into()],
        }
    }

    /// # Panics
    ///
    /// Panics if there are no components.
    pub fn vector<E: Into<Expr>>(components: impl IntoIterator<Item = E>) -> Self {
        let components: Vec<Expr> = components.into_iter().map(Into::into).collect();
        Self::from_components(Shape::vector(components.len()), components)
    }

    /// Constructs a matrix from its rows.
    ///
    /// # Panics
    ///
    /// Panics if the rows do not all have the same, positive, length.
    pub fn matrix<E, Row>(rows: impl IntoIterator<Item = Row>) -> Self
    where
        E: Into<Expr>,
        Row: IntoIterator<Item = E>,
    {
        let rows: Vec<Vec<Expr>> = rows
            .into_iter()
            .map(|row| row.into_iter().map(Into::into).collect())
            .collect();
        let num_rows = rows.len();
        let num_cols = rows.first().map_or(0, Vec::len);
        assert!(
            rows.iter().all(|row| row.len() == num_cols),
            "All rows of a matrix must have the same length"
        );
        Self::from_components(Shape::matrix(num_rows, num_cols), rows.into_iter().flatten().collect())
    }

    /// # Panics
    ///
    /// Panics if the number of components does not match the shape.
    pub fn from_components(shape: Shape, components: Vec<Expr>) -> Self {
        assert_eq!(
            shape.num_components(),
            components.len(),
            "Number of components must match the shape {}",
            shape
        );
        Self { shape, components }
    }

    /// Constructs a tensor by evaluating `f` at every multi-index in row-major order.
    pub fn from_fn(shape: Shape, f: impl FnMut(&[usize]) -> Expr) -> Self {
        let mut f = f;
        let components = shape.multi_indices().map(|index| f(&index)).collect();
        Self { shape, components }
    }

    /// A tensor of numeric constants, in row-major order.
    pub fn from_values(shape: Shape, values: &[f64]) -> Self {
        let components = values.iter().copied().map(Expr::number).collect();
        Self::from_components(shape, components)
    }

    pub fn zeros(shape: Shape) -> Self {
        let components = vec![Expr::zero(); shape.num_components()];
        Self { shape, components }
    }

    pub fn shape(&self) -> &Shape {
        &self.shape
    }

    pub fn rank(&self) -> usize {
        self.shape.rank()
    }

    pub fn components(&self) -> &[Expr] {
        &self.components
    }

    pub fn into_components(self) -> Vec<Expr> {
        self.components
    }

    /// # Panics
    ///
    /// Panics if the multi-index is invalid for the shape.
    pub fn get(&self, multi_index: &[usize]) -> &Expr {
        &self.components[self.shape.linear_index(multi_index)]
    }

    /// The single component of a scalar tensor.
    pub fn as_scalar(&self) -> Option<&Expr> {
        if self.shape.is_scalar() {
            self.components.first()
        } else {
            None
        }
    }

    /// Applies `f` to every component.
    pub fn map(&self, f: impl FnMut(&Expr) -> Expr) -> Self {
        Self {
            shape: self.shape.clone(),
            components: self.components.iter().map(f).collect(),
        }
    }

    /// Combines corresponding components of two tensors of identical shape.
    ///
    /// # Panics
    ///
    /// Panics if the shapes differ.
    pub fn zip_map(&self, other: &SymTensor, mut f: impl FnMut(&Expr, &Expr) -> Expr) -> Self {
        assert_eq!(self.shape, other.shape, "zip_map requires identical shapes");
        Self {
            shape: self.shape.clone(),
            components: self
                .components
                .iter()
                .zip(&other.components)
                .map(|(a, b)| f(a, b))
                .collect(),
        }
    }

    pub fn free_symbols(&self) -> BTreeSet<Symbol> {
        self.components
            .iter()
            .flat_map(Expr::free_symbols)
            .collect()
    }

    pub fn depends_on(&self, symbol: Symbol) -> bool {
        self.components.iter().any(|c| c.depends_on(symbol))
    }
}

impl From<Expr> for SymTensor {
    fn from(expr: Expr) -> Self {
        SymTensor::scalar(expr)
    }
}

impl From<&Expr> for SymTensor {
    fn from(expr: &Expr) -> Self {
        SymTensor::scalar(expr.clone())
    }
}

impl From<f64> for SymTensor {
    fn from(value: f64) -> Self {
        SymTensor::scalar(value)
    }
}

impl<const N: usize> From<[Expr; N]> for SymTensor {
    fn from(components: [Expr; N]) -> Self {
        SymTensor::vector(components)
    }
}

impl<const R: usize, const C: usize> From<[[Expr; C]; R]> for SymTensor {
    fn from(rows: [[Expr; C]; R]) -> Self {
        SymTensor::matrix(rows)
    }
}

impl Display for SymTensor {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        fn write_axis(f: &mut Formatter<'_>, tensor: &SymTensor, offset: usize, axis: usize) -> fmt::Result {
            let dims = tensor.shape.dims();
            if axis == dims.len() {
                return write!(f, "{}", tensor.components[offset]);
            }
            let stride: usize = dims[axis + 1..].iter().product();
            write!(f, "[")?;
            for i in 0..dims[axis] {
                if i > 0 {
                    write!(f, ", ")?;
                }
                write_axis(f, tensor, offset + i * stride, axis + 1)?;
            }
            write!(f, "]")
        }
        write_axis(f, self, 0, 0)
    }
}

/// The numerical value of a scalar, vector or tensor quantity at a point.
///
/// Components are stored in row-major order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Value {
    shape: Shape,
    data: Vec<f64>,
}

impl Value {
    /// # Panics
    ///
    /// Panics if the length of `data` does not match the shape.
    pub fn new(shape: Shape, data: Vec<f64>) -> Self {
        assert_eq!(shape.num_components(), data.len(), "Data length must match the shape");
        Self { shape, data }
    }

    pub fn scalar(value: f64) -> Self {
        Self::new(Shape::scalar(), vec![value])
    }

    /// # Panics
    ///
    /// Panics if the vector is empty.
    pub fn from_vector(vector: &DVector<f64>) -> Self {
        Self::new(Shape::vector(vector.len()), vector.as_slice().to_vec())
    }

    /// Stores the entries in row-major order.
    ///
    /// # Panics
    ///
    /// Panics if the matrix has no rows or no columns.
    pub fn from_matrix(matrix: &DMatrix<f64>) -> Self {
        let data = matrix.transpose().as_slice().to_vec();
        Self::new(Shape::matrix(matrix.nrows(), matrix.ncols()), data)
    }

    pub fn shape(&self) -> &Shape {
        &self.shape
    }

    pub fn as_slice(&self) -> &[f64] {
        &self.data
    }

    pub fn get(&self, multi_index: &[usize]) -> f64 {
        self.data[self.shape.linear_index(multi_index)]
    }

    pub fn as_scalar(&self) -> Option<f64> {
        self.shape.is_scalar().then(|| self.data[0])
    }

    pub fn to_vector(&self) -> Option<DVector<f64>> {
        (self.shape.rank() == 1).then(|| DVector::from_column_slice(&self.data))
    }

    pub fn to_matrix(&self) -> Option<DMatrix<f64>> {
        match self.shape.dims() {
            &[rows, cols] => Some(DMatrix::from_row_slice(rows, cols, &self.data)),
            _ => None,
        }
    }

    /// The Frobenius (Euclidean) norm of all components.
    pub fn norm(&self) -> f64 {
        self.data.iter().map(|v| v * v).sum::<f64>().sqrt()
    }
}
