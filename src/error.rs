//! Modeling errors.
//!
//! Every failure in this crate is a caller-correctable usage error raised
//! synchronously at the offending call. A failed call never leaves a
//! partially registered entity or a partially emitted formula behind.

use thiserror::Error;

/// Result alias used throughout the modeling layer.
pub type ModelResult<T> = Result<T, ModelError>;

/// Broad category of a [`ModelError`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    /// A value of the right type but outside the accepted set
    /// (unknown literal, wrong operand count, impossible count).
    Validity,
    /// An argument of the wrong shape: negative where non-negative is
    /// required, empty collection, handle from another context.
    Type,
    /// A name or requirement that is already registered.
    Duplication,
}

/// An error raised while building a scheduling model.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ModelError {
    #[error("{field} must be a strictly positive integer, got {value}")]
    NotPositive { field: &'static str, value: i64 },

    #[error("{field} must be a non-negative integer, got {value}")]
    Negative { field: &'static str, value: i64 },

    #[error("{0} must not be empty")]
    EmptyCollection(&'static str),

    #[error("({lower}, {upper}) is not a time interval")]
    InvalidInterval { lower: i64, upper: i64 },

    #[error("{0} does not belong to this context")]
    ForeignHandle(String),

    #[error("unknown precedence kind '{0}', expected one of 'lax', 'tight', 'strict'")]
    UnknownPrecedenceKind(String),

    #[error("xor expects exactly 2 operands, got {0}")]
    XorArity(usize),

    #[error("cannot require {requested} out of {available} candidates")]
    CountOutOfRange { requested: usize, available: usize },

    #[error("task '{0}' does not have a variable duration")]
    NotVariableDuration(String),

    #[error("assignment has no value for variable '{0}'")]
    Unassigned(String),

    #[error("the solver returned an assignment that violates the model")]
    InvalidAssignment,

    #[error("{0} overflows a 64-bit integer")]
    Overflow(String),

    #[error("a task named '{0}' already exists")]
    DuplicateTask(String),

    #[error("a resource named '{0}' already exists")]
    DuplicateResource(String),

    #[error("a variable named '{0}' already exists")]
    DuplicateVariable(String),

    #[error("task '{task}' already requires resource '{resource}'")]
    DuplicateRequirement { task: String, resource: String },
}

impl ModelError {
    /// Returns the category of this error.
    pub fn kind(&self) -> ErrorKind {
        match self {
            ModelError::NotPositive { .. }
            | ModelError::Negative { .. }
            | ModelError::EmptyCollection(_)
            | ModelError::InvalidInterval { .. }
            | ModelError::ForeignHandle(_) => ErrorKind::Type,
            ModelError::UnknownPrecedenceKind(_)
            | ModelError::XorArity(_)
            | ModelError::CountOutOfRange { .. }
            | ModelError::NotVariableDuration(_)
            | ModelError::Unassigned(_)
            | ModelError::InvalidAssignment
            | ModelError::Overflow(_) => ErrorKind::Validity,
            ModelError::DuplicateTask(_)
            | ModelError::DuplicateResource(_)
            | ModelError::DuplicateVariable(_)
            | ModelError::DuplicateRequirement { .. } => ErrorKind::Duplication,
        }
    }
}

/// Checks that `value` is strictly positive.
pub(crate) fn ensure_positive(field: &'static str, value: i64) -> ModelResult<i64> {
    if value > 0 {
        Ok(value)
    } else {
        Err(ModelError::NotPositive { field, value })
    }
}

/// Checks that `value` is non-negative.
pub(crate) fn ensure_non_negative(field: &'static str, value: i64) -> ModelResult<i64> {
    if value >= 0 {
        Ok(value)
    } else {
        Err(ModelError::Negative { field, value })
    }
}
