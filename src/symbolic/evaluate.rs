//! Direct numerical evaluation of symbolic expressions by walking the tree.
use super::{Expr, ExprKind, Predicate, Symbol, MAX_GEOMETRIC_DIM};

/// Numerical values bound to the free symbols of an expression.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Bindings {
    coordinates: [f64; MAX_GEOMETRIC_DIM],
    time: f64,
}

impl Bindings {
    /// Binds the leading coordinate symbols to the entries of `point`.
    ///
    /// Coordinates beyond the length of `point` are unbound and evaluate to NaN.
    ///
    /// # Panics
    ///
    /// Panics if `point` has more than [`MAX_GEOMETRIC_DIM`] entries.
    pub fn new(point: &[f64], time: f64) -> Self {
        assert!(
            point.len() <= MAX_GEOMETRIC_DIM,
            "Point has more coordinates than the maximum geometric dimension"
        );
        let mut coordinates = [f64::NAN; MAX_GEOMETRIC_DIM];
        coordinates[..point.len()].copy_from_slice(point);
        Self { coordinates, time }
    }

    pub fn time(&self) -> f64 {
        self.time
    }

    pub fn value_of(&self, symbol: Symbol) -> f64 {
        match symbol {
            Symbol::Coordinate(axis) => self.coordinates.get(axis).copied().unwrap_or(f64::NAN),
            Symbol::Time => self.time,
        }
    }
}

impl Expr {
    /// Evaluates the expression with the given bindings.
    ///
    /// Only the branch selected by the predicate of a piecewise expression is evaluated.
    pub fn evaluate(&self, bindings: &Bindings) -> f64 {
        match self.kind() {
            ExprKind::Number(value) => *value,
            ExprKind::Symbol(symbol) => bindings.value_of(*symbol),
            ExprKind::Sum(terms) => terms.iter().map(|term| term.evaluate(bindings)).sum(),
            ExprKind::Product(factors) => factors.iter().map(|factor| factor.evaluate(bindings)).product(),
            ExprKind::Power(base, exponent) => base.evaluate(bindings).powf(exponent.evaluate(bindings)),
            ExprKind::Function(function, argument) => function.apply(argument.evaluate(bindings)),
            ExprKind::Piecewise {
                predicate,
                then,
                otherwise,
            } => {
                if predicate.evaluate(bindings) {
                    then.evaluate(bindings)
                } else {
                    otherwise.evaluate(bindings)
                }
            }
        }
    }
}

impl Predicate {
    pub fn evaluate(&self, bindings: &Bindings) -> bool {
        match self {
            Predicate::Compare(comparison, a, b) => comparison.apply(a.evaluate(bindings), b.evaluate(bindings)),
            Predicate::And(p, q) => p.evaluate(bindings) && q.evaluate(bindings),
            Predicate::Or(p, q) => p.evaluate(bindings) || q.evaluate(bindings),
            Predicate::Not(p) => !p.evaluate(bindings),
        }
    }
}
