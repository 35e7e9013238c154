//! Symbolic verification of finite element expressions with manufactured solutions.
//!
//! Tensor-calculus [`Expression`](expression::Expression)s over discretized fields are translated
//! into [`SymTensor`]s by substituting every field with a known exact form, and the result is
//! compiled into a [`CompiledExpression`](compiled::CompiledExpression) that can be evaluated at
//! points and for any time. Comparing the compiled expression against the numerical evaluation of
//! the same expression verifies the numerical pipeline.
pub mod calculus;
pub mod compiled;
pub mod error;
pub mod expression;
pub mod shape;
pub mod substitution;
pub mod symbolic;
pub mod tensor;
pub mod translate;

#[cfg(feature = "proptest")]
pub mod proptest;

pub extern crate fenris_mms_quadrature as quadrature;
pub extern crate nalgebra;

pub use shape::{Shape, ShapeError};
pub use tensor::{SymTensor, Value};
pub use translate::TranslationError;
