//! Infix rendering of symbolic expressions, e.g. `3*x^2 - sin(t)`.
use super::{Expr, ExprKind, Predicate, Symbol};
use std::fmt;
use std::fmt::{Display, Formatter};

impl Display for Symbol {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match self {
            Symbol::Coordinate(0) => write!(f, "x"),
            Symbol::Coordinate(1) => write!(f, "y"),
            Symbol::Coordinate(2) => write!(f, "z"),
            Symbol::Coordinate(axis) => write!(f, "x{}", axis),
            Symbol::Time => write!(f, "t"),
        }
    }
}

const SUM_PRECEDENCE: u8 = 1;
const PRODUCT_PRECEDENCE: u8 = 2;
const POWER_PRECEDENCE: u8 = 3;
const ATOM_PRECEDENCE: u8 = 4;

/// Whether the expression is rendered with a leading minus sign.
fn is_negative(expr: &Expr) -> bool {
    match expr.kind() {
        ExprKind::Number(value) => value.is_sign_negative() && *value != 0.0,
        ExprKind::Product(factors) => factors.first().map_or(false, is_negative),
        _ => false,
    }
}

fn precedence(expr: &Expr) -> u8 {
    match expr.kind() {
        _ if is_negative(expr) => SUM_PRECEDENCE,
        ExprKind::Sum(_) | ExprKind::Piecewise { .. } => SUM_PRECEDENCE,
        ExprKind::Product(_) => PRODUCT_PRECEDENCE,
        ExprKind::Power(..) => POWER_PRECEDENCE,
        ExprKind::Number(_) | ExprKind::Symbol(_) | ExprKind::Function(..) => ATOM_PRECEDENCE,
    }
}

fn write_number(f: &mut Formatter<'_>, value: f64) -> fmt::Result {
    if value.fract() == 0.0 && value.abs() < 1e15 {
        write!(f, "{}", value as i64)
    } else {
        write!(f, "{}", value)
    }
}

fn write_operand(f: &mut Formatter<'_>, operand: &Expr, min_precedence: u8) -> fmt::Result {
    if precedence(operand) < min_precedence {
        write!(f, "({})", operand)
    } else {
        write!(f, "{}", operand)
    }
}

impl Display for Expr {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match self.kind() {
            ExprKind::Number(value) => write_number(f, *value),
            ExprKind::Symbol(symbol) => write!(f, "{}", symbol),
            ExprKind::Sum(terms) => {
                for (i, term) in terms.iter().enumerate() {
                    if i == 0 {
                        write!(f, "{}", term)?;
                    } else if is_negative(term) {
                        write!(f, " - ")?;
                        write_operand(f, &-term, PRODUCT_PRECEDENCE)?;
                    } else {
                        write!(f, " + {}", term)?;
                    }
                }
                Ok(())
            }
            ExprKind::Product(factors) => {
                let mut factors = factors.as_slice();
                if factors.first().and_then(Expr::as_number) == Some(-1.0) {
                    write!(f, "-")?;
                    factors = &factors[1..];
                }
                for (i, factor) in factors.iter().enumerate() {
                    if i > 0 {
                        write!(f, "*")?;
                    }
                    // A leading negative coefficient is rendered without parentheses
                    if i == 0 && factor.as_number().is_some() {
                        write!(f, "{}", factor)?;
                    } else {
                        write_operand(f, factor, PRODUCT_PRECEDENCE)?;
                    }
                }
                Ok(())
            }
            ExprKind::Power(base, exponent) => {
                write_operand(f, base, ATOM_PRECEDENCE)?;
                write!(f, "^")?;
                write_operand(f, exponent, ATOM_PRECEDENCE)
            }
            ExprKind::Function(function, argument) => write!(f, "{}({})", function.name(), argument),
            ExprKind::Piecewise {
                predicate,
                then,
                otherwise,
            } => write!(f, "piecewise({}, {}, {})", predicate, then, otherwise),
        }
    }
}

impl Display for Predicate {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match self {
            Predicate::Compare(comparison, a, b) => write!(f, "{} {} {}", a, comparison.symbol(), b),
            Predicate::And(p, q) => write!(f, "({}) & ({})", p, q),
            Predicate::Or(p, q) => write!(f, "({}) | ({})", p, q),
            Predicate::Not(p) => write!(f, "!({})", p),
        }
    }
}
