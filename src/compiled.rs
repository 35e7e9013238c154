//! Point-evaluable, time-parametrized expressions.
//!
//! A [`CompiledExpression`] wraps a translated symbolic tensor together with an advisory
//! polynomial degree and a mutable time. It is what interpolation and error-norm routines consume.
//!
//! ```
//! use fenris_mms::compiled::CompiledExpressionBuilder;
//! use fenris_mms::expression::{cos, Field};
//! use fenris_mms::substitution::Substitutions;
//! use fenris_mms::symbolic::{t, x};
//!
//! let v = Field::scalar(1);
//! let substitutions = Substitutions::new().with(&v, 3.0 * x() + t());
//! let e = v.expr() - 3.0 * v.expr().pow(2.0) + cos(&v) * v.expr().dx(0);
//!
//! let compiled = CompiledExpressionBuilder::new(1)
//!     .with_degree(2)
//!     .with_time(2.0)
//!     .build(&e, &substitutions)
//!     .unwrap();
//! let f = 3.0 * 0.5 + 2.0;
//! let expected = f - 3.0 * f * f + f64::cos(f) * 3.0;
//! assert!((compiled.evaluate(&[0.5]).as_scalar().unwrap() - expected).abs() < 1e-12);
//! ```
use crate::expression::{check_geometric_dim, Expression};
use crate::shape::Shape;
use crate::substitution::{check_substitutions, Substitutions};
use crate::symbolic::{Bindings, Symbol};
use crate::tensor::{SymTensor, Value};
use crate::translate::{TranslationError, Translator};
use log::debug;
use rayon::prelude::*;

mod program;

pub use program::{Instruction, Program};

/// A translated symbolic tensor, compiled for evaluation at points.
///
/// The time may be changed between evaluations without any recompilation. The degree is fixed at
/// construction and purely advisory: it tells interpolation routines which polynomial degree faithfully captures the
/// expression, and never affects the values returned by [`evaluate`](Self::evaluate).
#[derive(Debug, Clone)]
pub struct CompiledExpression {
    symbolic: SymTensor,
    programs: Vec<Program>,
    geometric_dim: usize,
    degree: usize,
    time: f64,
}

impl CompiledExpression {
    /// Compiles an exact symbolic form directly, without translation.
    ///
    /// Fails if the form refers to a coordinate that does not exist in the geometric dimension.
    pub fn from_exact(
        exact_form: impl Into<SymTensor>,
        geometric_dim: usize,
        degree: usize,
    ) -> Result<Self, TranslationError> {
        check_geometric_dim("compile", geometric_dim)?;
        let symbolic = exact_form.into();
        let out_of_bounds = symbolic
            .free_symbols()
            .into_iter()
            .any(|symbol| matches!(symbol, Symbol::Coordinate(axis) if axis >= geometric_dim));
        if out_of_bounds {
            return Err(TranslationError::Dimension {
                operator: "coordinate",
                geometric_dim,
            });
        }

        let programs: Vec<_> = symbolic
            .components()
            .iter()
            .map(Program::compile)
            .collect();
        debug!(
            "Compiled expression of shape {} into {} instructions",
            symbolic.shape(),
            programs
                .iter()
                .map(|program| program.instructions().len())
                .sum::<usize>()
        );
        Ok(Self {
            symbolic,
            programs,
            geometric_dim,
            degree,
            time: 0.0,
        })
    }

    pub fn degree(&self) -> usize {
        self.degree
    }

    pub fn time(&self) -> f64 {
        self.time
    }

    /// Sets the time bound to the time symbol in subsequent evaluations.
    pub fn set_time(&mut self, time: f64) {
        self.time = time;
    }

    pub fn with_time(mut self, time: f64) -> Self {
        self.set_time(time);
        self
    }

    pub fn geometric_dim(&self) -> usize {
        self.geometric_dim
    }

    pub fn shape(&self) -> &Shape {
        self.symbolic.shape()
    }

    /// The translated symbolic tensor.
    pub fn symbolic(&self) -> &SymTensor {
        &self.symbolic
    }

    /// The compiled programs, one per component in row-major order.
    pub fn programs(&self) -> &[Program] {
        &self.programs
    }

    pub fn is_time_dependent(&self) -> bool {
        self.symbolic.depends_on(Symbol::Time)
    }

    /// Evaluates the expression at the given point and the current time.
    ///
    /// # Panics
    ///
    /// Panics if the length of `point` differs from the geometric dimension.
    pub fn evaluate(&self, point: &[f64]) -> Value {
        let mut data = vec![0.0; self.programs.len()];
        self.evaluate_into(point, &mut data);
        Value::new(self.shape().clone(), data)
    }

    /// Evaluates the expression at the given point, writing components in row-major order.
    ///
    /// # Panics
    ///
    /// Panics if the length of `point` differs from the geometric dimension, or if the length of
    /// `output` differs from the number of components.
    pub fn evaluate_into(&self, point: &[f64], output: &mut [f64]) {
        assert_eq!(point.len(), self.geometric_dim, "Point must have one coordinate per dimension");
        assert_eq!(output.len(), self.programs.len(), "Output must have one entry per component");
        let max_stack_size = self
            .programs
            .iter()
            .map(Program::max_stack_size)
            .max()
            .unwrap_or(0);
        let mut stack = Vec::with_capacity(max_stack_size);
        for (program, out) in self.programs.iter().zip(output) {
            *out = program.execute(point, self.time, &mut stack);
        }
    }

    /// Evaluates the expression by walking the symbolic tree instead of running the compiled
    /// programs. Shared subexpressions are evaluated once per use.
    ///
    /// # Panics
    ///
    /// Panics if the length of `point` differs from the geometric dimension.
    pub fn evaluate_symbolic(&self, point: &[f64]) -> Value {
        assert_eq!(point.len(), self.geometric_dim, "Point must have one coordinate per dimension");
        let bindings = Bindings::new(point, self.time);
        let data = self
            .symbolic
            .components()
            .iter()
            .map(|component| component.evaluate(&bindings))
            .collect();
        Value::new(self.shape().clone(), data)
    }

    /// Evaluates the expression at many points in parallel.
    ///
    /// # Panics
    ///
    /// Panics if any point has a length different from the geometric dimension.
    pub fn evaluate_at_points_par<P>(&self, points: &[P]) -> Vec<Value>
    where
        P: AsRef<[f64]> + Sync,
    {
        points
            .par_iter()
            .map(|point| self.evaluate(point.as_ref()))
            .collect()
    }
}

/// Configures the compilation of expressions.
#[derive(Debug, Clone)]
pub struct CompiledExpressionBuilder {
    geometric_dim: usize,
    degree: usize,
    time: f64,
}

impl CompiledExpressionBuilder {
    /// A builder for the given geometric dimension, with degree 1 and time 0.
    pub fn new(geometric_dim: usize) -> Self {
        Self {
            geometric_dim,
            degree: 1,
            time: 0.0,
        }
    }

    pub fn with_degree(self, degree: usize) -> Self {
        Self { degree, ..self }
    }

    pub fn with_time(self, time: f64) -> Self {
        Self { time, ..self }
    }

    /// Validates the substitutions, translates the expression and compiles the result.
    pub fn build(&self, expr: &Expression, substitutions: &Substitutions) -> Result<CompiledExpression, TranslationError> {
        check_substitutions(substitutions)?;
        let symbolic = Translator::new(self.geometric_dim, substitutions).translate(expr)?;
        self.build_exact(symbolic)
    }

    /// Compiles an exact symbolic form with the configured degree and time.
    pub fn build_exact(&self, exact_form: impl Into<SymTensor>) -> Result<CompiledExpression, TranslationError> {
        Ok(CompiledExpression::from_exact(exact_form, self.geometric_dim, self.degree)?.with_time(self.time))
    }
}

/// Validates, translates and compiles an expression at time zero.
pub fn compile(
    expr: &Expression,
    substitutions: &Substitutions,
    geometric_dim: usize,
    degree: usize,
) -> Result<CompiledExpression, TranslationError> {
    CompiledExpressionBuilder::new(geometric_dim)
        .with_degree(degree)
        .build(expr, substitutions)
}
