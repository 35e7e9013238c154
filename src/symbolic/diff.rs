//! Symbolic partial differentiation.
use super::{Expr, ExprKind, MathFunction, Symbol};
use rustc_hash::FxHashMap;

impl MathFunction {
    /// The derivative `f'(u)` of the function, evaluated at the argument `u`.
    fn derivative_at(self, u: &Expr) -> Expr {
        use MathFunction::*;
        let one_minus_u_squared = || 1.0 - u.powi(2);
        match self {
            Sin => u.cos(),
            Cos => -u.sin(),
            Tan => 1.0 + u.tan().powi(2),
            Asin => one_minus_u_squared().pow(-0.5),
            Acos => -one_minus_u_squared().pow(-0.5),
            Atan => (1.0 + u.powi(2)).recip(),
            Sinh => Expr::apply(Cosh, u.clone()),
            Cosh => Expr::apply(Sinh, u.clone()),
            Tanh => 1.0 - Expr::apply(Tanh, u.clone()).powi(2),
            Exp => u.exp(),
            Ln => u.recip(),
            Sqrt => 0.5 * u.sqrt().recip(),
            Abs => Expr::apply(Sign, u.clone()),
            // Zero almost everywhere
            Sign => Expr::zero(),
        }
    }
}

impl Expr {
    /// The partial derivative with respect to `symbol`.
    ///
    /// All other symbols are held fixed. The time symbol is treated like any other symbol, but
    /// note that the translation of tensor operators only ever differentiates with respect to
    /// spatial coordinates.
    ///
    /// Shared subexpressions are differentiated once, so the derivative of a DAG stays a DAG.
    pub fn diff(&self, symbol: Symbol) -> Expr {
        Differentiator {
            symbol,
            cache: FxHashMap::default(),
        }
        .diff(self)
    }
}

/// Memoises derivatives by node address for the duration of one differentiation.
struct Differentiator {
    symbol: Symbol,
    cache: FxHashMap<usize, Expr>,
}

impl Differentiator {
    fn diff(&mut self, expr: &Expr) -> Expr {
        if let Some(derivative) = self.cache.get(&expr.node_address()) {
            return derivative.clone();
        }
        let derivative = self.diff_node(expr);
        self.cache.insert(expr.node_address(), derivative.clone());
        derivative
    }

    fn diff_node(&mut self, expr: &Expr) -> Expr {
        let symbol = self.symbol;
        match expr.kind() {
            ExprKind::Number(_) => Expr::zero(),
            ExprKind::Symbol(s) if *s == symbol => Expr::one(),
            ExprKind::Symbol(_) => Expr::zero(),
            ExprKind::Sum(terms) => {
                let terms: Vec<_> = terms.iter().map(|term| self.diff(term)).collect();
                Expr::sum(terms)
            }
            ExprKind::Product(factors) => {
                // (f_1 f_2 ... f_n)' = sum_i f_1 ... f_i' ... f_n
                let mut terms = Vec::with_capacity(factors.len());
                for (i, factor) in factors.iter().enumerate() {
                    let factor_prime = self.diff(factor);
                    if !factor_prime.is_zero() {
                        terms.push(Expr::product(factors.iter().enumerate().map(|(j, other)| {
                            if i == j {
                                factor_prime.clone()
                            } else {
                                other.clone()
                            }
                        })));
                    }
                }
                Expr::sum(terms)
            }
            ExprKind::Power(base, exponent) => {
                let base_prime = self.diff(base);
                let exponent_prime = self.diff(exponent);
                if exponent_prime.is_zero() {
                    // (b^e)' = e b^(e - 1) b'
                    if base_prime.is_zero() {
                        return Expr::zero();
                    }
                    Expr::product([
                        exponent.clone(),
                        Expr::power(base.clone(), exponent - 1.0),
                        base_prime,
                    ])
                } else {
                    // (b^e)' = b^e (e' ln(b) + e b' / b)
                    let log_term = &exponent_prime * base.ln();
                    let base_term = Expr::product([exponent.clone(), base_prime, base.recip()]);
                    expr * (log_term + base_term)
                }
            }
            ExprKind::Function(function, argument) => {
                let argument_prime = self.diff(argument);
                if argument_prime.is_zero() {
                    Expr::zero()
                } else {
                    function.derivative_at(argument) * argument_prime
                }
            }
            ExprKind::Piecewise {
                predicate,
                then,
                otherwise,
            } => {
                let then = self.diff(then);
                let otherwise = self.diff(otherwise);
                Expr::piecewise(predicate.clone(), then, otherwise)
            }
        }
    }
}
