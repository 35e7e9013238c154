//! Substitution of discretized fields with exact symbolic forms.
use crate::expression::{Coefficient, CoefficientId};
use crate::shape::Shape;
use crate::tensor::SymTensor;
use log::warn;
use rustc_hash::FxHashMap;
use std::error::Error;
use std::fmt;
use std::fmt::{Display, Formatter};

/// A map from coefficients to the exact symbolic forms that replace them during translation.
///
/// Entries are keyed on the identity token of the coefficient.
#[derive(Debug, Clone, Default)]
pub struct Substitutions {
    entries: FxHashMap<CoefficientId, (Coefficient, SymTensor)>,
}

impl Substitutions {
    pub fn new() -> Self {
        Self::default()
    }

    /// Inserts or replaces the exact form of a coefficient.
    pub fn insert(&mut self, coefficient: impl Into<Coefficient>, exact_form: impl Into<SymTensor>) {
        let coefficient = coefficient.into();
        self.entries
            .insert(coefficient.id(), (coefficient, exact_form.into()));
    }

    /// Builder-style variant of [`insert`](Self::insert).
    pub fn with(mut self, coefficient: impl Into<Coefficient>, exact_form: impl Into<SymTensor>) -> Self {
        self.insert(coefficient, exact_form);
        self
    }

    /// The exact form substituted for the coefficient with the given id.
    pub fn exact_form(&self, id: CoefficientId) -> Option<&SymTensor> {
        self.entries.get(&id).map(|(_, form)| form)
    }

    pub fn get(&self, id: CoefficientId) -> Option<(&Coefficient, &SymTensor)> {
        self.entries
            .get(&id)
            .map(|(coefficient, form)| (coefficient, form))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Iterates over the entries in order of coefficient creation.
    pub fn iter(&self) -> impl Iterator<Item = (&Coefficient, &SymTensor)> {
        let mut entries: Vec<_> = self.entries.values().collect();
        entries.sort_by_key(|(coefficient, _)| coefficient.id());
        entries
            .into_iter()
            .map(|(coefficient, form)| (coefficient, form))
    }
}

/// The reason a substitution map was rejected.
#[derive(Debug, Clone, PartialEq)]
pub enum ValidationError {
    /// A global constant of rank 1 or higher was used as a key. Such constants are spatially
    /// invariant and cannot stand in for a manufactured field.
    ConstantTensorKey { id: CoefficientId, shape: Shape },
    /// The shape of the exact form differs from the shape of the field it replaces.
    ShapeMismatch {
        id: CoefficientId,
        expected: Shape,
        actual: Shape,
    },
}

impl Display for ValidationError {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match self {
            ValidationError::ConstantTensorKey { id, shape } => write!(
                f,
                "Global constant {} of shape {} cannot be a substitution key",
                id, shape
            ),
            ValidationError::ShapeMismatch { id, expected, actual } => write!(
                f,
                "Exact form for field {} has shape {}, but the field has shape {}",
                id, actual, expected
            ),
        }
    }
}

impl Error for ValidationError {}

/// Checks that a substitution map is well-formed, reporting the first offending entry.
///
/// Entries are checked in order of coefficient creation, so the reported error is deterministic.
///
/// - A global constant of rank 1 or higher is never a valid key.
/// - A scalar global constant is accepted. It is never looked up during translation, since
///   constants always translate to their own value.
/// - The exact form of a field must have the same shape as the field.
pub fn check_substitutions(substitutions: &Substitutions) -> Result<(), ValidationError> {
    for (coefficient, form) in substitutions.iter() {
        let result = match coefficient {
            Coefficient::Constant(constant) if !constant.shape().is_scalar() => Err(ValidationError::ConstantTensorKey {
                id: constant.id(),
                shape: constant.shape().clone(),
            }),
            Coefficient::Constant(_) => Ok(()),
            Coefficient::Field(field) if field.shape() != form.shape() => Err(ValidationError::ShapeMismatch {
                id: field.id(),
                expected: field.shape().clone(),
                actual: form.shape().clone(),
            }),
            Coefficient::Field(_) => Ok(()),
        };
        if let Err(err) = result {
            warn!("Rejected substitution map: {}", err);
            return Err(err);
        }
    }
    Ok(())
}

/// Returns `true` if the substitution map is well-formed.
///
/// See [`check_substitutions`] for the rules. Invalid maps are signaled by the return value and
/// never by a panic.
pub fn validate(substitutions: &Substitutions) -> bool {
    check_substitutions(substitutions).is_ok()
}
