//! Translation of tensor-calculus expressions into symbolic tensors.
use crate::calculus;
use crate::expression::{check_geometric_dim, CoefficientId, Condition, Expression, Operator};
use crate::shape::{Shape, ShapeError};
use crate::substitution::{Substitutions, ValidationError};
use crate::symbolic::{Expr, Predicate};
use crate::tensor::SymTensor;
use log::{debug, trace};
use rustc_hash::FxHashMap;
use std::error::Error;
use std::fmt;
use std::fmt::{Display, Formatter};

/// Errors that abort a translation. No partial result is ever produced.
#[derive(Debug, Clone, PartialEq)]
pub enum TranslationError {
    /// The operand shapes of a node are incompatible with its operator.
    Shape(ShapeError),
    /// A field has no entry in the substitution map.
    UnknownField(CoefficientId),
    /// The operator is undefined in the active geometric dimension.
    Dimension {
        operator: &'static str,
        geometric_dim: usize,
    },
    /// The substitution map was rejected before translation.
    Validation(ValidationError),
}

impl Display for TranslationError {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match self {
            TranslationError::Shape(err) => write!(f, "{}", err),
            TranslationError::UnknownField(id) => write!(f, "No substitution for field {}", id),
            TranslationError::Dimension {
                operator,
                geometric_dim,
            } => write!(f, "Operator {} is undefined in geometric dimension {}", operator, geometric_dim),
            TranslationError::Validation(err) => write!(f, "Invalid substitutions: {}", err),
        }
    }
}

impl Error for TranslationError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            TranslationError::Shape(err) => Some(err),
            TranslationError::Validation(err) => Some(err),
            _ => None,
        }
    }
}

impl From<ShapeError> for TranslationError {
    fn from(err: ShapeError) -> Self {
        TranslationError::Shape(err)
    }
}

impl From<ValidationError> for TranslationError {
    fn from(err: ValidationError) -> Self {
        TranslationError::Validation(err)
    }
}

/// Rewrites expressions into symbolic tensors, replacing fields by their exact forms.
///
/// The geometric dimension is fixed for the lifetime of the translator. Nodes shared between
/// expressions are translated once and reused, for as long as the translator lives.
///
/// The substitution map is assumed to be valid. Use
/// [`check_substitutions`](crate::substitution::check_substitutions) beforehand, or compile with
/// [`CompiledExpressionBuilder`](crate::compiled::CompiledExpressionBuilder), which does so.
pub struct Translator<'a> {
    geometric_dim: usize,
    substitutions: &'a Substitutions,
    // Keyed by node address. The expression is kept alive so that the address is not reused.
    cache: FxHashMap<usize, (Expression, SymTensor)>,
}

impl<'a> Translator<'a> {
    pub fn new(geometric_dim: usize, substitutions: &'a Substitutions) -> Self {
        Self {
            geometric_dim,
            substitutions,
            cache: FxHashMap::default(),
        }
    }

    pub fn geometric_dim(&self) -> usize {
        self.geometric_dim
    }

    /// Translates an expression into a symbolic tensor of the same shape.
    pub fn translate(&mut self, expr: &Expression) -> Result<SymTensor, TranslationError> {
        check_geometric_dim("translate", self.geometric_dim)?;
        let cached_before = self.cache.len();
        let tensor = self.translate_node(expr)?;
        debug!(
            "Translated expression of shape {} in {}D ({} new nodes)",
            tensor.shape(),
            self.geometric_dim,
            self.cache.len() - cached_before
        );
        Ok(tensor)
    }

    fn translate_node(&mut self, expr: &Expression) -> Result<SymTensor, TranslationError> {
        if let Some((_, tensor)) = self.cache.get(&expr.node_address()) {
            return Ok(tensor.clone());
        }
        let tensor = self.translate_operator(expr.operator())?;
        self.cache
            .insert(expr.node_address(), (expr.clone(), tensor.clone()));
        Ok(tensor)
    }

    fn translate_operator(&mut self, operator: &Operator) -> Result<SymTensor, TranslationError> {
        let dim = self.geometric_dim;
        let tensor = match operator {
            Operator::Literal(value) => SymTensor::scalar(*value),
            Operator::Constant(constant) => {
                let value = constant.value();
                SymTensor::from_values(value.shape().clone(), value.as_slice())
            }
            Operator::Field(field) => {
                if field.geometric_dim() != dim {
                    return Err(TranslationError::Dimension {
                        operator: "field",
                        geometric_dim: dim,
                    });
                }
                let form = self
                    .substitutions
                    .exact_form(field.id())
                    .ok_or(TranslationError::UnknownField(field.id()))?;
                trace!("Substituting field {} with {}", field.id(), form);
                form.clone()
            }
            Operator::SpatialCoordinate => SymTensor::vector((0..dim).map(Expr::coordinate)),
            Operator::ListTensor(components) => self.translate_list_tensor(components)?,
            Operator::Indexed(operand, index) => {
                let operand = self.translate_node(operand)?;
                let shape = operand.shape();
                match shape.dims().first() {
                    Some(&n) if *index < n => {
                        let stride = operand.components().len() / n;
                        let components = operand.components()[index * stride..(index + 1) * stride].to_vec();
                        SymTensor::from_components(shape.strip_leading(1), components)
                    }
                    _ => return Err(ShapeError::new("index", &[shape], format!("index {} is out of bounds", index)).into()),
                }
            }
            Operator::Sum(a, b) => calculus::sum(&self.translate_node(a)?, &self.translate_node(b)?)?,
            Operator::Product(a, b) => calculus::product(&self.translate_node(a)?, &self.translate_node(b)?)?,
            Operator::Division(a, b) => calculus::division(&self.translate_node(a)?, &self.translate_node(b)?)?,
            Operator::Power(a, b) => calculus::power(&self.translate_node(a)?, &self.translate_node(b)?)?,
            Operator::SpatialDerivative(operand, axis) => {
                if *axis >= dim {
                    return Err(TranslationError::Dimension {
                        operator: "spatial_derivative",
                        geometric_dim: dim,
                    });
                }
                calculus::partial_derivative(&self.translate_node(operand)?, *axis)
            }
            Operator::Grad(operand) => calculus::grad(&self.translate_node(operand)?, dim),
            Operator::Div(operand) => calculus::div(&self.translate_node(operand)?, dim)?,
            Operator::Curl(operand) => calculus::curl(&self.translate_node(operand)?, dim)?,
            Operator::Dot(a, b) => calculus::dot(&self.translate_node(a)?, &self.translate_node(b)?)?,
            Operator::Inner(a, b) => calculus::inner(&self.translate_node(a)?, &self.translate_node(b)?)?,
            Operator::Outer(a, b) => calculus::outer(&self.translate_node(a)?, &self.translate_node(b)?),
            Operator::Transpose(operand) => calculus::transpose(&self.translate_node(operand)?)?,
            Operator::Trace(operand) => calculus::trace(&self.translate_node(operand)?)?,
            Operator::Determinant(operand) => calculus::determinant(&self.translate_node(operand)?)?,
            Operator::Conditional(condition, then, otherwise) => {
                let predicate = self.translate_condition(condition)?;
                calculus::piecewise(&predicate, &self.translate_node(then)?, &self.translate_node(otherwise)?)?
            }
            Operator::Function(function, operand) => calculus::apply(*function, &self.translate_node(operand)?),
        };
        Ok(tensor)
    }

    fn translate_list_tensor(&mut self, components: &[Expression]) -> Result<SymTensor, TranslationError> {
        let tensors = components
            .iter()
            .map(|component| self.translate_node(component))
            .collect::<Result<Vec<_>, _>>()?;
        let first_shape = match tensors.first() {
            Some(first) => first.shape().clone(),
            None => return Err(ShapeError::new("list_tensor", &[], "at least one component is required").into()),
        };
        if let Some(other) = tensors.iter().find(|t| t.shape() != &first_shape) {
            return Err(ShapeError::new(
                "list_tensor",
                &[&first_shape, other.shape()],
                "components must have identical shapes",
            )
            .into());
        }
        let shape = Shape::vector(tensors.len()).concat(&first_shape);
        let components = tensors
            .into_iter()
            .flat_map(SymTensor::into_components)
            .collect();
        Ok(SymTensor::from_components(shape, components))
    }

    /// Translates a condition into a symbolic predicate. Comparisons are kept symbolic, and are
    /// only decided when the resulting expression is evaluated at a point.
    pub fn translate_condition(&mut self, condition: &Condition) -> Result<Predicate, TranslationError> {
        let predicate = match condition {
            Condition::Compare(comparison, a, b) => {
                let (a, b) = (self.translate_node(a)?, self.translate_node(b)?);
                match (a.as_scalar(), b.as_scalar()) {
                    (Some(a), Some(b)) => Predicate::compare(*comparison, a, b),
                    _ => return Err(ShapeError::new("comparison", &[a.shape(), b.shape()], "operands must be scalars").into()),
                }
            }
            Condition::And(p, q) => self.translate_condition(p)?.and(self.translate_condition(q)?),
            Condition::Or(p, q) => self.translate_condition(p)?.or(self.translate_condition(q)?),
            Condition::Not(p) => !self.translate_condition(p)?,
        };
        Ok(predicate)
    }
}

/// Translates an expression in the given geometric dimension.
///
/// The substitution map is checked first, and a rejected map fails with
/// [`TranslationError::Validation`].
pub fn translate(
    expr: &Expression,
    substitutions: &Substitutions,
    geometric_dim: usize,
) -> Result<SymTensor, TranslationError> {
    crate::substitution::check_substitutions(substitutions)?;
    Translator::new(geometric_dim, substitutions).translate(expr)
}
