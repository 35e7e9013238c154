//! Tensor-calculus expressions over finite element coefficients.
//!
//! An [`Expression`] is an immutable DAG of [`Operator`] nodes. The leaves are literal numbers,
//! global [`Constant`]s, discretized [`Field`]s and the spatial coordinate. Fields are referenced
//! by an opaque [`CoefficientId`], which is what a [`Substitutions`](crate::substitution::Substitutions)
//! map is keyed on.
//!
//! Expressions are built with the free functions in this module ([`grad`], [`dot`], [`det`],
//! [`conditional`], ...) and the usual arithmetic operators:
//!
//! ```
//! use fenris_mms::expression::{dot, grad, Field};
//!
//! let u = Field::scalar(2).with_name("u");
//! let e = dot(&grad(&u), &grad(&u)) + 3.0 * u.expr();
//! assert_eq!(e.shape(2).unwrap(), fenris_mms::Shape::scalar());
//! ```
use crate::shape::{broadcast, dot_shape, inner_shape, outer_shape, square_matrix_dim, sum_shape, Shape, ShapeError};
use crate::symbolic::{Comparison, MathFunction, MAX_GEOMETRIC_DIM};
use crate::tensor::Value;
use crate::translate::TranslationError;
use nalgebra::{DMatrix, DVector, SMatrix, SVector};
use rustc_hash::FxHashMap;
use std::fmt;
use std::fmt::{Display, Formatter};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

mod operators;

pub use operators::*;

/// An opaque identity token of a coefficient.
///
/// Every [`Field`] and [`Constant`] receives a distinct token at creation, and clones share it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct CoefficientId(u64);

impl CoefficientId {
    fn next() -> Self {
        static COUNTER: AtomicU64 = AtomicU64::new(0);
        Self(COUNTER.fetch_add(1, Ordering::Relaxed))
    }
}

impl Display for CoefficientId {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// A discretized finite element field, known only through its identity and shape.
///
/// The shape and geometric dimension are fixed at creation.
#[derive(Debug, Clone)]
pub struct Field {
    id: CoefficientId,
    shape: Shape,
    geometric_dim: usize,
    name: Option<String>,
}

impl Field {
    /// # Panics
    ///
    /// Panics if the geometric dimension is not 1, 2 or 3.
    pub fn new(shape: Shape, geometric_dim: usize) -> Self {
        assert!(
            (1..=MAX_GEOMETRIC_DIM).contains(&geometric_dim),
            "Geometric dimension must be 1, 2 or 3"
        );
        Self {
            id: CoefficientId::next(),
            shape,
            geometric_dim,
            name: None,
        }
    }

    pub fn scalar(geometric_dim: usize) -> Self {
        Self::new(Shape::scalar(), geometric_dim)
    }

    /// A vector field with one component per spatial dimension.
    pub fn vector(geometric_dim: usize) -> Self {
        Self::new(Shape::vector(geometric_dim), geometric_dim)
    }

    /// A rank-2 tensor field of dimension `geometric_dim x geometric_dim`.
    pub fn tensor(geometric_dim: usize) -> Self {
        Self::new(Shape::matrix(geometric_dim, geometric_dim), geometric_dim)
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    pub fn id(&self) -> CoefficientId {
        self.id
    }

    pub fn shape(&self) -> &Shape {
        &self.shape
    }

    pub fn geometric_dim(&self) -> usize {
        self.geometric_dim
    }

    pub fn name(&self) -> Option<&str> {
        self.name.as_deref()
    }

    pub fn expr(&self) -> Expression {
        Expression::new(Operator::Field(self.clone()))
    }
}

impl PartialEq for Field {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

impl Eq for Field {}

/// A global constant: spatially invariant, with a known numerical value.
#[derive(Debug, Clone)]
pub struct Constant {
    id: CoefficientId,
    value: Value,
}

impl Constant {
    pub fn new(value: Value) -> Self {
        Self {
            id: CoefficientId::next(),
            value,
        }
    }

    pub fn scalar(value: f64) -> Self {
        Self::new(Value::scalar(value))
    }

    pub fn vector<const N: usize>(vector: SVector<f64, N>) -> Self {
        Self::from_vector(&DVector::from_column_slice(vector.as_slice()))
    }

    pub fn matrix<const R: usize, const C: usize>(matrix: SMatrix<f64, R, C>) -> Self {
        Self::from_matrix(&DMatrix::from_column_slice(R, C, matrix.as_slice()))
    }

    /// # Panics
    ///
    /// Panics if the vector is empty.
    pub fn from_vector(vector: &DVector<f64>) -> Self {
        Self::new(Value::from_vector(vector))
    }

    /// # Panics
    ///
    /// Panics if the matrix has no rows or no columns.
    pub fn from_matrix(matrix: &DMatrix<f64>) -> Self {
        Self::new(Value::from_matrix(matrix))
    }

    pub fn id(&self) -> CoefficientId {
        self.id
    }

    pub fn value(&self) -> &Value {
        &self.value
    }

    pub fn shape(&self) -> &Shape {
        self.value.shape()
    }

    pub fn expr(&self) -> Expression {
        Expression::new(Operator::Constant(self.clone()))
    }
}

impl PartialEq for Constant {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

/// A coefficient of an expression that may appear as a substitution key.
#[derive(Debug, Clone, PartialEq)]
pub enum Coefficient {
    Field(Field),
    Constant(Constant),
}

impl Coefficient {
    pub fn id(&self) -> CoefficientId {
        match self {
            Coefficient::Field(field) => field.id(),
            Coefficient::Constant(constant) => constant.id(),
        }
    }

    pub fn shape(&self) -> &Shape {
        match self {
            Coefficient::Field(field) => field.shape(),
            Coefficient::Constant(constant) => constant.shape(),
        }
    }
}

impl From<Field> for Coefficient {
    fn from(field: Field) -> Self {
        Coefficient::Field(field)
    }
}

impl From<&Field> for Coefficient {
    fn from(field: &Field) -> Self {
        Coefficient::Field(field.clone())
    }
}

impl From<Constant> for Coefficient {
    fn from(constant: Constant) -> Self {
        Coefficient::Constant(constant)
    }
}

impl From<&Constant> for Coefficient {
    fn from(constant: &Constant) -> Self {
        Coefficient::Constant(constant.clone())
    }
}

/// A node of a tensor-calculus expression.
#[derive(Debug, Clone)]
pub enum Operator {
    /// A plain scalar number.
    Literal(f64),
    Constant(Constant),
    Field(Field),
    /// The position vector `(x, y, z)`, truncated to the geometric dimension.
    SpatialCoordinate,
    /// A tensor assembled from components of identical shape, stacked along a new leading axis.
    ListTensor(Vec<Expression>),
    /// Selects the given index along the leading axis.
    Indexed(Expression, usize),
    Sum(Expression, Expression),
    Product(Expression, Expression),
    Division(Expression, Expression),
    Power(Expression, Expression),
    /// Partial derivative with respect to the coordinate along the given axis.
    SpatialDerivative(Expression, usize),
    Grad(Expression),
    Div(Expression),
    Curl(Expression),
    Dot(Expression, Expression),
    Inner(Expression, Expression),
    Outer(Expression, Expression),
    Transpose(Expression),
    Trace(Expression),
    Determinant(Expression),
    Conditional(Condition, Expression, Expression),
    Function(MathFunction, Expression),
}

/// A boolean condition of a [`conditional`] expression.
#[derive(Debug, Clone)]
pub enum Condition {
    Compare(Comparison, Expression, Expression),
    And(Box<Condition>, Box<Condition>),
    Or(Box<Condition>, Box<Condition>),
    Not(Box<Condition>),
}

impl Condition {
    pub fn and(self, other: Condition) -> Self {
        Condition::And(Box::new(self), Box::new(other))
    }

    pub fn or(self, other: Condition) -> Self {
        Condition::Or(Box::new(self), Box::new(other))
    }
}

impl std::ops::Not for Condition {
    type Output = Condition;

    fn not(self) -> Condition {
        Condition::Not(Box::new(self))
    }
}

/// A tensor-calculus expression.
///
/// Cloning is cheap, and clones share their nodes. Shared nodes are translated only once.
#[derive(Debug, Clone)]
pub struct Expression(Arc<Operator>);

impl Expression {
    pub fn new(operator: Operator) -> Self {
        Self(Arc::new(operator))
    }

    pub fn operator(&self) -> &Operator {
        &self.0
    }

    /// An address identifying this node, shared by all clones of the expression.
    pub(crate) fn node_address(&self) -> usize {
        Arc::as_ptr(&self.0) as usize
    }

    pub fn literal(value: f64) -> Self {
        Self::new(Operator::Literal(value))
    }

    /// Partial derivative with respect to the coordinate along `axis`.
    pub fn dx(&self, axis: usize) -> Self {
        Self::new(Operator::SpatialDerivative(self.clone(), axis))
    }

    /// Selects the entry `index` along the leading axis, e.g. `u[0]` of a vector or the first row
    /// of a matrix.
    pub fn index(&self, index: usize) -> Self {
        Self::new(Operator::Indexed(self.clone(), index))
    }

    pub fn pow(&self, exponent: impl Into<Expression>) -> Self {
        Self::new(Operator::Power(self.clone(), exponent.into()))
    }

    pub fn apply(&self, function: MathFunction) -> Self {
        Self::new(Operator::Function(function, self.clone()))
    }

    /// The shape of the expression in the given geometric dimension.
    ///
    /// Fails if the operand shapes of any node are incompatible with its operator, if an operator
    /// is undefined in the geometric dimension, or if a field was created for a different
    /// geometric dimension.
    pub fn shape(&self, geometric_dim: usize) -> Result<Shape, TranslationError> {
        shape_of(self, geometric_dim)
    }
}

/// Computes the shape of an expression in the given geometric dimension.
pub fn shape_of(expr: &Expression, geometric_dim: usize) -> Result<Shape, TranslationError> {
    ShapeInference {
        dim: geometric_dim,
        cache: FxHashMap::default(),
    }
    .shape(expr)
}

/// Shape inference memoised by node address, so that shared subexpressions are checked once.
struct ShapeInference {
    dim: usize,
    cache: FxHashMap<usize, Shape>,
}

impl ShapeInference {
    fn shape(&mut self, expr: &Expression) -> Result<Shape, TranslationError> {
        if let Some(shape) = self.cache.get(&expr.node_address()) {
            return Ok(shape.clone());
        }
        let shape = self.infer(expr)?;
        self.cache.insert(expr.node_address(), shape.clone());
        Ok(shape)
    }

    fn infer(&mut self, expr: &Expression) -> Result<Shape, TranslationError> {
        let dim = self.dim;
        let shape = match expr.operator() {
            Operator::Literal(_) => Shape::scalar(),
            Operator::Constant(constant) => constant.shape().clone(),
            Operator::Field(field) => {
                if field.geometric_dim() != dim {
                    return Err(TranslationError::Dimension {
                        operator: "field",
                        geometric_dim: dim,
                    });
                }
                field.shape().clone()
            }
            Operator::SpatialCoordinate => {
                check_geometric_dim("spatial_coordinate", dim)?;
                Shape::vector(dim)
            }
            Operator::ListTensor(components) => {
                let (first, others) = components
                    .split_first()
                    .ok_or_else(|| ShapeError::new("list_tensor", &[], "at least one component is required"))?;
                let first = self.shape(first)?;
                for other in others {
                    let other = self.shape(other)?;
                    sum_shape(&first, &other)
                        .map_err(|_| ShapeError::new("list_tensor", &[&first, &other], "components must have identical shapes"))?;
                }
                Shape::vector(components.len()).concat(&first)
            }
            Operator::Indexed(operand, index) => {
                let operand = self.shape(operand)?;
                match operand.dims().first() {
                    Some(&n) if *index < n => operand.strip_leading(1),
                    _ => {
                        return Err(ShapeError::new("index", &[&operand], format!("index {} is out of bounds", index)).into())
                    }
                }
            }
            Operator::Sum(a, b) => sum_shape(&self.shape(a)?, &self.shape(b)?)?,
            Operator::Product(a, b) => broadcast(&self.shape(a)?, &self.shape(b)?)?,
            Operator::Division(a, b) => {
                let (a, b) = (self.shape(a)?, self.shape(b)?);
                if !b.is_scalar() {
                    return Err(ShapeError::new("division", &[&a, &b], "the denominator must be a scalar").into());
                }
                a
            }
            Operator::Power(a, b) => {
                let (a, b) = (self.shape(a)?, self.shape(b)?);
                if !b.is_scalar() {
                    return Err(ShapeError::new("power", &[&a, &b], "the exponent must be a scalar").into());
                }
                a
            }
            Operator::SpatialDerivative(operand, axis) => {
                if *axis >= dim {
                    return Err(TranslationError::Dimension {
                        operator: "spatial_derivative",
                        geometric_dim: dim,
                    });
                }
                self.shape(operand)?
            }
            Operator::Grad(operand) => self.shape(operand)?.with_trailing_axis(dim),
            Operator::Div(operand) => {
                let operand = self.shape(operand)?;
                match operand.dims().last() {
                    Some(&n) if n == dim => operand.strip_trailing(),
                    _ => {
                        return Err(ShapeError::new(
                            "div",
                            &[&operand],
                            "the trailing dimension must equal the geometric dimension",
                        )
                        .into())
                    }
                }
            }
            Operator::Curl(operand) => curl_shape(&self.shape(operand)?, dim)?,
            Operator::Dot(a, b) => dot_shape(&self.shape(a)?, &self.shape(b)?)?,
            Operator::Inner(a, b) => inner_shape(&self.shape(a)?, &self.shape(b)?)?,
            Operator::Outer(a, b) => outer_shape(&self.shape(a)?, &self.shape(b)?),
            Operator::Transpose(operand) => {
                let operand = self.shape(operand)?;
                match operand.dims() {
                    &[m, n] => Shape::matrix(n, m),
                    _ => return Err(ShapeError::new("transpose", &[&operand], "operand must be a matrix").into()),
                }
            }
            Operator::Trace(operand) => {
                square_matrix_dim("trace", &self.shape(operand)?)?;
                Shape::scalar()
            }
            Operator::Determinant(operand) => {
                let operand = self.shape(operand)?;
                if !operand.is_scalar() {
                    square_matrix_dim("determinant", &operand)?;
                }
                Shape::scalar()
            }
            Operator::Conditional(condition, then, otherwise) => {
                self.check_condition(condition)?;
                let (then, otherwise) = (self.shape(then)?, self.shape(otherwise)?);
                sum_shape(&then, &otherwise).map_err(|_| {
                    ShapeError::new("conditional", &[&then, &otherwise], "branches must have identical shapes")
                })?
            }
            Operator::Function(_, operand) => self.shape(operand)?,
        };
        Ok(shape)
    }

    fn check_condition(&mut self, condition: &Condition) -> Result<(), TranslationError> {
        match condition {
            Condition::Compare(_, a, b) => {
                let (a, b) = (self.shape(a)?, self.shape(b)?);
                if a.is_scalar() && b.is_scalar() {
                    Ok(())
                } else {
                    Err(ShapeError::new("comparison", &[&a, &b], "operands must be scalars").into())
                }
            }
            Condition::And(p, q) | Condition::Or(p, q) => {
                self.check_condition(p)?;
                self.check_condition(q)
            }
            Condition::Not(p) => self.check_condition(p),
        }
    }
}

/// Checks that the geometric dimension is 1, 2 or 3.
pub(crate) fn check_geometric_dim(operator: &'static str, geometric_dim: usize) -> Result<(), TranslationError> {
    if (1..=MAX_GEOMETRIC_DIM).contains(&geometric_dim) {
        Ok(())
    } else {
        Err(TranslationError::Dimension { operator, geometric_dim })
    }
}

/// The shape of the curl of an operand of the given shape.
///
/// The curl of a scalar is the rotated gradient `(du/dx1, -du/dx0)`, the curl of a 2-vector is a
/// scalar and the curl of a 3-vector is a 3-vector.
pub(crate) fn curl_shape(operand: &Shape, geometric_dim: usize) -> Result<Shape, TranslationError> {
    if geometric_dim != 2 && geometric_dim != 3 {
        return Err(TranslationError::Dimension {
            operator: "curl",
            geometric_dim,
        });
    }
    match operand.dims() {
        [] => Ok(Shape::vector(2)),
        [2] => Ok(Shape::scalar()),
        [3] if geometric_dim == 3 => Ok(Shape::vector(3)),
        _ => Err(ShapeError::new("curl", &[operand], "operand must be a scalar, a 2-vector or a 3-vector in 3D").into()),
    }
}
