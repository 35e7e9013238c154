//! Constructors for operator nodes and arithmetic on expressions.
use super::{Condition, Constant, Expression, Field, Operator};
use crate::symbolic::{Comparison, MathFunction};
use std::ops::{Add, Div, Mul, Neg, Sub};

impl From<f64> for Expression {
    fn from(value: f64) -> Self {
        Expression::literal(value)
    }
}

impl From<&Expression> for Expression {
    fn from(expr: &Expression) -> Self {
        expr.clone()
    }
}

impl From<Field> for Expression {
    fn from(field: Field) -> Self {
        Expression::new(Operator::Field(field))
    }
}

impl From<&Field> for Expression {
    fn from(field: &Field) -> Self {
        field.expr()
    }
}

impl From<Constant> for Expression {
    fn from(constant: Constant) -> Self {
        Expression::new(Operator::Constant(constant))
    }
}

impl From<&Constant> for Expression {
    fn from(constant: &Constant) -> Self {
        constant.expr()
    }
}

/// The position vector, with one component per spatial dimension.
pub fn spatial_coordinate() -> Expression {
    Expression::new(Operator::SpatialCoordinate)
}

/// Assembles a vector from scalar components, or a higher-rank tensor from components of
/// identical shape.
pub fn as_vector<E: Into<Expression>>(components: impl IntoIterator<Item = E>) -> Expression {
    Expression::new(Operator::ListTensor(components.into_iter().map(Into::into).collect()))
}

/// Assembles a matrix from its rows of scalar components.
pub fn as_matrix<E, Row>(rows: impl IntoIterator<Item = Row>) -> Expression
where
    E: Into<Expression>,
    Row: IntoIterator<Item = E>,
{
    as_vector(rows.into_iter().map(|row| as_vector(row)))
}

pub fn grad(operand: impl Into<Expression>) -> Expression {
    Expression::new(Operator::Grad(operand.into()))
}

pub fn div(operand: impl Into<Expression>) -> Expression {
    Expression::new(Operator::Div(operand.into()))
}

pub fn curl(operand: impl Into<Expression>) -> Expression {
    Expression::new(Operator::Curl(operand.into()))
}

pub fn dot(a: impl Into<Expression>, b: impl Into<Expression>) -> Expression {
    Expression::new(Operator::Dot(a.into(), b.into()))
}

pub fn inner(a: impl Into<Expression>, b: impl Into<Expression>) -> Expression {
    Expression::new(Operator::Inner(a.into(), b.into()))
}

pub fn outer(a: impl Into<Expression>, b: impl Into<Expression>) -> Expression {
    Expression::new(Operator::Outer(a.into(), b.into()))
}

pub fn transpose(operand: impl Into<Expression>) -> Expression {
    Expression::new(Operator::Transpose(operand.into()))
}

pub fn tr(operand: impl Into<Expression>) -> Expression {
    Expression::new(Operator::Trace(operand.into()))
}

pub fn det(operand: impl Into<Expression>) -> Expression {
    Expression::new(Operator::Determinant(operand.into()))
}

/// `then` where the condition holds, `otherwise` elsewhere.
pub fn conditional(condition: Condition, then: impl Into<Expression>, otherwise: impl Into<Expression>) -> Expression {
    Expression::new(Operator::Conditional(condition, then.into(), otherwise.into()))
}

fn compare(comparison: Comparison, a: impl Into<Expression>, b: impl Into<Expression>) -> Condition {
    Condition::Compare(comparison, a.into(), b.into())
}

pub fn eq(a: impl Into<Expression>, b: impl Into<Expression>) -> Condition {
    compare(Comparison::Eq, a, b)
}

pub fn ne(a: impl Into<Expression>, b: impl Into<Expression>) -> Condition {
    compare(Comparison::Ne, a, b)
}

pub fn lt(a: impl Into<Expression>, b: impl Into<Expression>) -> Condition {
    compare(Comparison::Lt, a, b)
}

pub fn le(a: impl Into<Expression>, b: impl Into<Expression>) -> Condition {
    compare(Comparison::Le, a, b)
}

pub fn gt(a: impl Into<Expression>, b: impl Into<Expression>) -> Condition {
    compare(Comparison::Gt, a, b)
}

pub fn ge(a: impl Into<Expression>, b: impl Into<Expression>) -> Condition {
    compare(Comparison::Ge, a, b)
}

macro_rules! function_constructors {
    ($($name:ident => $function:ident),* $(,)?) => {
        $(
            pub fn $name(operand: impl Into<Expression>) -> Expression {
                operand.into().apply(MathFunction::$function)
            }
        )*
    };
}

function_constructors!(
    sin => Sin,
    cos => Cos,
    tan => Tan,
    asin => Asin,
    acos => Acos,
    atan => Atan,
    sinh => Sinh,
    cosh => Cosh,
    tanh => Tanh,
    exp => Exp,
    ln => Ln,
    sqrt => Sqrt,
    abs => Abs,
    sign => Sign,
);

fn add(a: Expression, b: Expression) -> Expression {
    Expression::new(Operator::Sum(a, b))
}

fn sub(a: Expression, b: Expression) -> Expression {
    add(a, -b)
}

fn mul(a: Expression, b: Expression) -> Expression {
    Expression::new(Operator::Product(a, b))
}

fn divide(a: Expression, b: Expression) -> Expression {
    Expression::new(Operator::Division(a, b))
}

macro_rules! impl_binary_op {
    ($trait:ident, $method:ident, $func:ident) => {
        impl $trait<Expression> for Expression {
            type Output = Expression;
            fn $method(self, rhs: Expression) -> Expression {
                $func(self, rhs)
            }
        }

        impl $trait<&Expression> for Expression {
            type Output = Expression;
            fn $method(self, rhs: &Expression) -> Expression {
                $func(self, rhs.clone())
            }
        }

        impl $trait<Expression> for &Expression {
            type Output = Expression;
            fn $method(self, rhs: Expression) -> Expression {
                $func(self.clone(), rhs)
            }
        }

        impl $trait<&Expression> for &Expression {
            type Output = Expression;
            fn $method(self, rhs: &Expression) -> Expression {
                $func(self.clone(), rhs.clone())
            }
        }

        impl $trait<f64> for Expression {
            type Output = Expression;
            fn $method(self, rhs: f64) -> Expression {
                $func(self, Expression::literal(rhs))
            }
        }

        impl $trait<f64> for &Expression {
            type Output = Expression;
            fn $method(self, rhs: f64) -> Expression {
                $func(self.clone(), Expression::literal(rhs))
            }
        }

        impl $trait<Expression> for f64 {
            type Output = Expression;
            fn $method(self, rhs: Expression) -> Expression {
                $func(Expression::literal(self), rhs)
            }
        }

        impl $trait<&Expression> for f64 {
            type Output = Expression;
            fn $method(self, rhs: &Expression) -> Expression {
                $func(Expression::literal(self), rhs.clone())
            }
        }
    };
}

impl_binary_op!(Add, add, add);
impl_binary_op!(Sub, sub, sub);
impl_binary_op!(Mul, mul, mul);
impl_binary_op!(Div, div, divide);

impl Neg for Expression {
    type Output = Expression;

    fn neg(self) -> Expression {
        mul(Expression::literal(-1.0), self)
    }
}

impl Neg for &Expression {
    type Output = Expression;

    fn neg(self) -> Expression {
        -self.clone()
    }
}
