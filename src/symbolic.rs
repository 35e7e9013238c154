//! A small computer-algebra substrate for exact manufactured solutions.
//!
//! Scalar expressions are immutable DAGs of [`Expr`] nodes over the coordinate symbols
//! `x`, `y`, `z` and the time symbol `t`. Constructors perform light simplification (numeric
//! folding, flattening of nested sums and products, merging of like terms and repeated factors,
//! removal of additive zeros and multiplicative ones), which keeps derivative expressions compact
//! without a separate simplification pass.
//!
//! Simplification assumes that every subexpression is defined: `0 * a`, `a - a` and `a / a`
//! fold to numbers even at points where `a` evaluates to NaN or an infinity.
//!
//! ```
//! use fenris_mms::symbolic::{t, x, Symbol};
//!
//! let f = 3.0 * x() + t();
//! let df_dx = f.diff(Symbol::X);
//! assert_eq!(df_dx.as_number(), Some(3.0));
//! ```

use rustc_hash::FxHashSet;
use std::collections::BTreeSet;
use std::ops::{Add, Div, Mul, Neg, Not, Sub};
use std::sync::Arc;

mod diff;
mod display;
mod evaluate;

pub use evaluate::Bindings;

/// The maximum supported geometric dimension.
pub const MAX_GEOMETRIC_DIM: usize = 3;

/// A free symbol of a symbolic expression.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Symbol {
    /// The spatial coordinate along the given axis.
    Coordinate(usize),
    /// The distinguished time symbol.
    Time,
}

impl Symbol {
    pub const X: Symbol = Symbol::Coordinate(0);
    pub const Y: Symbol = Symbol::Coordinate(1);
    pub const Z: Symbol = Symbol::Coordinate(2);
    pub const T: Symbol = Symbol::Time;

    /// # Panics
    ///
    /// Panics if `axis` is not smaller than [`MAX_GEOMETRIC_DIM`].
    pub fn coordinate(axis: usize) -> Self {
        assert!(
            axis < MAX_GEOMETRIC_DIM,
            "Coordinate axis {} exceeds the maximum geometric dimension",
            axis
        );
        Symbol::Coordinate(axis)
    }
}

/// The coordinate symbol `x` as an expression.
pub fn x() -> Expr {
    Expr::symbol(Symbol::X)
}

/// The coordinate symbol `y` as an expression.
pub fn y() -> Expr {
    Expr::symbol(Symbol::Y)
}

/// The coordinate symbol `z` as an expression.
pub fn z() -> Expr {
    Expr::symbol(Symbol::Z)
}

/// The time symbol `t` as an expression.
pub fn t() -> Expr {
    Expr::symbol(Symbol::T)
}

/// Elementary functions of one argument.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MathFunction {
    Sin,
    Cos,
    Tan,
    Asin,
    Acos,
    Atan,
    Sinh,
    Cosh,
    Tanh,
    Exp,
    Ln,
    Sqrt,
    Abs,
    Sign,
}

impl MathFunction {
    pub fn name(self) -> &'static str {
        use MathFunction::*;
        match self {
            Sin => "sin",
            Cos => "cos",
            Tan => "tan",
            Asin => "asin",
            Acos => "acos",
            Atan => "atan",
            Sinh => "sinh",
            Cosh => "cosh",
            Tanh => "tanh",
            Exp => "exp",
            Ln => "ln",
            Sqrt => "sqrt",
            Abs => "abs",
            Sign => "sign",
        }
    }

    pub fn apply(self, x: f64) -> f64 {
        use MathFunction::*;
        match self {
            Sin => x.sin(),
            Cos => x.cos(),
            Tan => x.tan(),
            Asin => x.asin(),
            Acos => x.acos(),
            Atan => x.atan(),
            Sinh => x.sinh(),
            Cosh => x.cosh(),
            Tanh => x.tanh(),
            Exp => x.exp(),
            Ln => x.ln(),
            Sqrt => x.sqrt(),
            Abs => x.abs(),
            // Unlike f64::signum, the sign of zero is zero
            Sign if x > 0.0 => 1.0,
            Sign if x < 0.0 => -1.0,
            Sign => x * 0.0,
        }
    }
}

/// Binary comparison operators.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Comparison {
    Eq,
    Ne,
    Lt,
    Le,
    Gt,
    Ge,
}

impl Comparison {
    pub fn symbol(self) -> &'static str {
        match self {
            Comparison::Eq => "==",
            Comparison::Ne => "!=",
            Comparison::Lt => "<",
            Comparison::Le => "<=",
            Comparison::Gt => ">",
            Comparison::Ge => ">=",
        }
    }

    pub fn apply(self, a: f64, b: f64) -> bool {
        match self {
            Comparison::Eq => a == b,
            Comparison::Ne => a != b,
            Comparison::Lt => a < b,
            Comparison::Le => a <= b,
            Comparison::Gt => a > b,
            Comparison::Ge => a >= b,
        }
    }
}

/// A scalar symbolic expression.
///
/// Cloning is cheap: nodes are reference counted and shared between expressions.
#[derive(Debug, Clone)]
pub struct Expr(Arc<ExprKind>);

impl PartialEq for Expr {
    fn eq(&self, other: &Self) -> bool {
        // Shared nodes are equal without visiting their subtrees
        Arc::ptr_eq(&self.0, &other.0) || self.0 == other.0
    }
}

/// The structure of a symbolic expression node.
#[derive(Debug, Clone, PartialEq)]
pub enum ExprKind {
    Number(f64),
    Symbol(Symbol),
    /// N-ary sum. Never nested, and contains at most one number, stored last.
    Sum(Vec<Expr>),
    /// N-ary product. Never nested, and contains at most one number, stored first.
    Product(Vec<Expr>),
    Power(Expr, Expr),
    Function(MathFunction, Expr),
    /// `then` where the predicate holds, `otherwise` elsewhere.
    Piecewise {
        predicate: Predicate,
        then: Expr,
        otherwise: Expr,
    },
}

/// A symbolic boolean predicate.
#[derive(Debug, Clone, PartialEq)]
pub enum Predicate {
    Compare(Comparison, Expr, Expr),
    And(Box<Predicate>, Box<Predicate>),
    Or(Box<Predicate>, Box<Predicate>),
    Not(Box<Predicate>),
}

impl Predicate {
    pub fn compare(comparison: Comparison, lhs: impl Into<Expr>, rhs: impl Into<Expr>) -> Self {
        Predicate::Compare(comparison, lhs.into(), rhs.into())
    }

    pub fn ge(lhs: impl Into<Expr>, rhs: impl Into<Expr>) -> Self {
        Self::compare(Comparison::Ge, lhs, rhs)
    }

    pub fn gt(lhs: impl Into<Expr>, rhs: impl Into<Expr>) -> Self {
        Self::compare(Comparison::Gt, lhs, rhs)
    }

    pub fn le(lhs: impl Into<Expr>, rhs: impl Into<Expr>) -> Self {
        Self::compare(Comparison::Le, lhs, rhs)
    }

    pub fn lt(lhs: impl Into<Expr>, rhs: impl Into<Expr>) -> Self {
        Self::compare(Comparison::Lt, lhs, rhs)
    }

    pub fn and(self, other: Predicate) -> Self {
        Predicate::And(Box::new(self), Box::new(other))
    }

    pub fn or(self, other: Predicate) -> Self {
        Predicate::Or(Box::new(self), Box::new(other))
    }

    fn collect_symbols(&self, symbols: &mut BTreeSet<Symbol>, visited: &mut FxHashSet<usize>) {
        match self {
            Predicate::Compare(_, a, b) => {
                a.collect_symbols(symbols, visited);
                b.collect_symbols(symbols, visited);
            }
            Predicate::And(p, q) | Predicate::Or(p, q) => {
                p.collect_symbols(symbols, visited);
                q.collect_symbols(symbols, visited);
            }
            Predicate::Not(p) => p.collect_symbols(symbols, visited),
        }
    }
}

impl Not for Predicate {
    type Output = Predicate;

    fn not(self) -> Predicate {
        Predicate::Not(Box::new(self))
    }
}

impl Expr {
    fn new(kind: ExprKind) -> Self {
        Self(Arc::new(kind))
    }

    pub fn kind(&self) -> &ExprKind {
        &self.0
    }

    /// The address of the shared node, identifying it for as long as it is alive.
    pub(crate) fn node_address(&self) -> usize {
        Arc::as_ptr(&self.0) as usize
    }

    pub fn number(value: f64) -> Self {
        Self::new(ExprKind::Number(value))
    }

    pub fn zero() -> Self {
        Self::number(0.0)
    }

    pub fn one() -> Self {
        Self::number(1.0)
    }

    pub fn symbol(symbol: Symbol) -> Self {
        Self::new(ExprKind::Symbol(symbol))
    }

    /// The coordinate symbol along the given axis.
    ///
    /// # Panics
    ///
    /// Panics if `axis` is not smaller than [`MAX_GEOMETRIC_DIM`].
    pub fn coordinate(axis: usize) -> Self {
        Self::symbol(Symbol::coordinate(axis))
    }

    pub fn as_number(&self) -> Option<f64> {
        match self.kind() {
            ExprKind::Number(value) => Some(*value),
            _ => None,
        }
    }

    pub fn is_zero(&self) -> bool {
        self.as_number() == Some(0.0)
    }

    pub fn is_one(&self) -> bool {
        self.as_number() == Some(1.0)
    }

    /// Splits a term into its numeric coefficient and the remaining factors.
    fn split_coefficient(&self) -> (f64, Expr) {
        match self.kind() {
            ExprKind::Product(factors) => match factors.split_first() {
                Some((first, rest)) => match first.as_number() {
                    Some(coefficient) if rest.len() == 1 => (coefficient, rest[0].clone()),
                    Some(coefficient) => (coefficient, Self::new(ExprKind::Product(rest.to_vec()))),
                    None => (1.0, self.clone()),
                },
                None => (1.0, self.clone()),
            },
            _ => (1.0, self.clone()),
        }
    }

    /// Splits a factor into its base and numeric exponent.
    fn split_exponent(&self) -> (Expr, f64) {
        match self.kind() {
            ExprKind::Power(base, exponent) => match exponent.as_number() {
                Some(exponent) => (base.clone(), exponent),
                None => (self.clone(), 1.0),
            },
            _ => (self.clone(), 1.0),
        }
    }

    /// Constructs the sum of the given terms.
    ///
    /// Like terms are merged, so that `a + a` becomes `2*a`.
    pub fn sum(terms: impl IntoIterator<Item = Expr>) -> Self {
        let mut constant = 0.0;
        let mut merged = MergedOperands::default();
        let mut push = |term: &Expr, merged: &mut MergedOperands| match term.kind() {
            ExprKind::Number(value) => constant += value,
            _ => {
                let (coefficient, rest) = term.split_coefficient();
                merged.push(term, rest, coefficient);
            }
        };
        for term in terms {
            match term.kind() {
                ExprKind::Sum(inner) => inner.iter().for_each(|t| push(t, &mut merged)),
                _ => push(&term, &mut merged),
            }
        }

        let mut flat = Vec::with_capacity(merged.operands.len() + 1);
        for operand in merged.operands {
            let term = match operand.original {
                Some(original) => original,
                None => Expr::product([Expr::number(operand.number), operand.key]),
            };
            // A merged coefficient of one may expose a nested sum
            match term.kind() {
                ExprKind::Number(value) => constant += value,
                ExprKind::Sum(inner) => inner.iter().for_each(|t| match t.as_number() {
                    Some(value) => constant += value,
                    None => flat.push(t.clone()),
                }),
                _ => flat.push(term),
            }
        }
        if constant != 0.0 {
            flat.push(Expr::number(constant));
        }
        if flat.len() <= 1 {
            flat.pop().unwrap_or_else(Expr::zero)
        } else {
            Self::new(ExprKind::Sum(flat))
        }
    }

    /// Constructs the product of the given factors.
    ///
    /// A zero factor annihilates the product. Repeated factors are merged, so that `a * a`
    /// becomes `a^2`.
    pub fn product(factors: impl IntoIterator<Item = Expr>) -> Self {
        let mut coefficient = 1.0;
        let mut merged = MergedOperands::default();
        let mut push = |factor: &Expr, merged: &mut MergedOperands| match factor.kind() {
            ExprKind::Number(value) => coefficient *= value,
            _ => {
                let (base, exponent) = factor.split_exponent();
                merged.push(factor, base, exponent);
            }
        };
        for factor in factors {
            match factor.kind() {
                ExprKind::Product(inner) => inner.iter().for_each(|f| push(f, &mut merged)),
                _ => push(&factor, &mut merged),
            }
        }

        let mut flat = Vec::with_capacity(merged.operands.len() + 1);
        for operand in merged.operands {
            let factor = match operand.original {
                Some(original) => original,
                None => Expr::power(operand.key, Expr::number(operand.number)),
            };
            match factor.kind() {
                ExprKind::Number(value) => coefficient *= value,
                ExprKind::Product(inner) => inner.iter().for_each(|f| match f.as_number() {
                    Some(value) => coefficient *= value,
                    None => flat.push(f.clone()),
                }),
                _ => flat.push(factor),
            }
        }

        if coefficient == 0.0 || flat.is_empty() {
            return Expr::number(coefficient);
        }
        if coefficient != 1.0 {
            flat.insert(0, Expr::number(coefficient));
        }
        if flat.len() == 1 {
            flat.pop().unwrap_or_else(Expr::one)
        } else {
            Self::new(ExprKind::Product(flat))
        }
    }

    /// Constructs `base^exponent`.
    pub fn power(base: Expr, exponent: Expr) -> Self {
        match (base.as_number(), exponent.as_number()) {
            (Some(b), Some(e)) => Expr::number(b.powf(e)),
            (_, Some(e)) if e == 0.0 => Expr::one(),
            (_, Some(e)) if e == 1.0 => base,
            (Some(b), _) if b == 1.0 => Expr::one(),
            _ => Self::new(ExprKind::Power(base, exponent)),
        }
    }

    /// Applies an elementary function. Numeric arguments are folded.
    pub fn apply(function: MathFunction, argument: Expr) -> Self {
        match argument.as_number() {
            Some(value) => Expr::number(function.apply(value)),
            None => Self::new(ExprKind::Function(function, argument)),
        }
    }

    /// Constructs a piecewise expression. The predicate is kept symbolic.
    pub fn piecewise(predicate: Predicate, then: Expr, otherwise: Expr) -> Self {
        if then == otherwise {
            then
        } else {
            Self::new(ExprKind::Piecewise {
                predicate,
                then,
                otherwise,
            })
        }
    }

    pub fn pow(&self, exponent: impl Into<Expr>) -> Self {
        Expr::power(self.clone(), exponent.into())
    }

    pub fn powi(&self, exponent: i32) -> Self {
        self.pow(exponent as f64)
    }

    pub fn recip(&self) -> Self {
        self.powi(-1)
    }

    pub fn sin(&self) -> Self {
        Expr::apply(MathFunction::Sin, self.clone())
    }

    pub fn cos(&self) -> Self {
        Expr::apply(MathFunction::Cos, self.clone())
    }

    pub fn tan(&self) -> Self {
        Expr::apply(MathFunction::Tan, self.clone())
    }

    pub fn exp(&self) -> Self {
        Expr::apply(MathFunction::Exp, self.clone())
    }

    pub fn ln(&self) -> Self {
        Expr::apply(MathFunction::Ln, self.clone())
    }

    pub fn sqrt(&self) -> Self {
        Expr::apply(MathFunction::Sqrt, self.clone())
    }

    pub fn abs(&self) -> Self {
        Expr::apply(MathFunction::Abs, self.clone())
    }

    /// The set of free symbols of the expression.
    pub fn free_symbols(&self) -> BTreeSet<Symbol> {
        let mut symbols = BTreeSet::new();
        self.collect_symbols(&mut symbols, &mut FxHashSet::default());
        symbols
    }

    pub fn depends_on(&self, symbol: Symbol) -> bool {
        match self.kind() {
            ExprKind::Number(_) => false,
            ExprKind::Symbol(s) => *s == symbol,
            _ => self.free_symbols().contains(&symbol),
        }
    }

    /// Visits every shared node once.
    fn collect_symbols(&self, symbols: &mut BTreeSet<Symbol>, visited: &mut FxHashSet<usize>) {
        if !visited.insert(self.node_address()) {
            return;
        }
        match self.kind() {
            ExprKind::Number(_) => {}
            ExprKind::Symbol(s) => {
                symbols.insert(*s);
            }
            ExprKind::Sum(operands) | ExprKind::Product(operands) => operands
                .iter()
                .for_each(|e| e.collect_symbols(symbols, visited)),
            ExprKind::Power(base, exponent) => {
                base.collect_symbols(symbols, visited);
                exponent.collect_symbols(symbols, visited);
            }
            ExprKind::Function(_, argument) => argument.collect_symbols(symbols, visited),
            ExprKind::Piecewise {
                predicate,
                then,
                otherwise,
            } => {
                predicate.collect_symbols(symbols, visited);
                then.collect_symbols(symbols, visited);
                otherwise.collect_symbols(symbols, visited);
            }
        }
    }

    /// The number of distinct nodes in the expression DAG.
    pub fn num_distinct_nodes(&self) -> usize {
        fn visit(expr: &Expr, visited: &mut FxHashSet<usize>) {
            if !visited.insert(expr.node_address()) {
                return;
            }
            match expr.kind() {
                ExprKind::Number(_) | ExprKind::Symbol(_) => {}
                ExprKind::Sum(operands) | ExprKind::Product(operands) => {
                    operands.iter().for_each(|e| visit(e, visited))
                }
                ExprKind::Power(base, exponent) => {
                    visit(base, visited);
                    visit(exponent, visited);
                }
                ExprKind::Function(_, argument) => visit(argument, visited),
                ExprKind::Piecewise { then, otherwise, .. } => {
                    visit(then, visited);
                    visit(otherwise, visited);
                }
            }
        }
        let mut visited = FxHashSet::default();
        visit(self, &mut visited);
        visited.len()
    }

    /// The number of nodes in the expression tree, counting shared nodes once per use.
    pub fn num_nodes(&self) -> usize {
        1 + match self.kind() {
            ExprKind::Number(_) | ExprKind::Symbol(_) => 0,
            ExprKind::Sum(operands) | ExprKind::Product(operands) => operands.iter().map(Expr::num_nodes).sum(),
            ExprKind::Power(base, exponent) => base.num_nodes() + exponent.num_nodes(),
            ExprKind::Function(_, argument) => argument.num_nodes(),
            ExprKind::Piecewise { then, otherwise, .. } => then.num_nodes() + otherwise.num_nodes(),
        }
    }
}

/// An operand of a sum or product, keyed by the part that like operands have in common.
struct MergedOperand {
    key: Expr,
    number: f64,
    // The operand as given, as long as nothing was merged into it
    original: Option<Expr>,
}

#[derive(Default)]
struct MergedOperands {
    operands: Vec<MergedOperand>,
}

impl MergedOperands {
    /// Adds `number` to the operand with the same key, or appends a new operand.
    fn push(&mut self, original: &Expr, key: Expr, number: f64) {
        match self.operands.iter_mut().find(|operand| operand.key == key) {
            Some(operand) => {
                operand.number += number;
                operand.original = None;
            }
            None => self.operands.push(MergedOperand {
                key,
                number,
                original: Some(original.clone()),
            }),
        }
    }
}

impl From<f64> for Expr {
    fn from(value: f64) -> Self {
        Expr::number(value)
    }
}

impl From<Symbol> for Expr {
    fn from(symbol: Symbol) -> Self {
        Expr::symbol(symbol)
    }
}

impl From<&Expr> for Expr {
    fn from(expr: &Expr) -> Self {
        expr.clone()
    }
}

fn add(a: Expr, b: Expr) -> Expr {
    Expr::sum([a, b])
}

fn sub(a: Expr, b: Expr) -> Expr {
    Expr::sum([a, -b])
}

fn mul(a: Expr, b: Expr) -> Expr {
    Expr::product([a, b])
}

fn div(a: Expr, b: Expr) -> Expr {
    Expr::product([a, b.recip()])
}

macro_rules! impl_binary_op {
    ($trait:ident, $method:ident, $func:ident) => {
        impl $trait<Expr> for Expr {
            type Output = Expr;
            fn $method(self, rhs: Expr) -> Expr {
                $func(self, rhs)
            }
        }

        impl $trait<&Expr> for Expr {
            type Output = Expr;
            fn $method(self, rhs: &Expr) -> Expr {
                $func(self, rhs.clone())
            }
        }

        impl $trait<Expr> for &Expr {
            type Output = Expr;
            fn $method(self, rhs: Expr) -> Expr {
                $func(self.clone(), rhs)
            }
        }

        impl $trait<&Expr> for &Expr {
            type Output = Expr;
            fn $method(self, rhs: &Expr) -> Expr {
                $func(self.clone(), rhs.clone())
            }
        }

        impl $trait<f64> for Expr {
            type Output = Expr;
            fn $method(self, rhs: f64) -> Expr {
                $func(self, Expr::number(rhs))
            }
        }

        impl $trait<f64> for &Expr {
            type Output = Expr;
            fn $method(self, rhs: f64) -> Expr {
                $func(self.clone(), Expr::number(rhs))
            }
        }

        impl $trait<Expr> for f64 {
            type Output = Expr;
            fn $method(self, rhs: Expr) -> Expr {
                $func(Expr::number(self), rhs)
            }
        }

        impl $trait<&Expr> for f64 {
            type Output = Expr;
            fn $method(self, rhs: &Expr) -> Expr {
                $func(Expr::number(self), rhs.clone())
            }
        }
    };
}

impl_binary_op!(Add, add, add);
impl_binary_op!(Sub, sub, sub);
impl_binary_op!(Mul, mul, mul);
impl_binary_op!(Div, div, div);

impl Neg for Expr {
    type Output = Expr;

    fn neg(self) -> Expr {
        Expr::product([Expr::number(-1.0), self])
    }
}

impl Neg for &Expr {
    type Output = Expr;

    fn neg(self) -> Expr {
        -self.clone()
    }
}
