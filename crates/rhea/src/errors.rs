//! Error types for the solver.

use thiserror::Error;

/// Top-level error type for the solver.
#[derive(Debug, Error)]
pub enum SolverError {
    #[error(transparent)]
    AddConstraint(#[from] AddConstraintError),

    #[error(transparent)]
    RemoveConstraint(#[from] RemoveConstraintError),

    #[error(transparent)]
    AddEditVariable(#[from] AddEditVariableError),

    #[error(transparent)]
    RemoveEditVariable(#[from] RemoveEditVariableError),

    #[error(transparent)]
    SuggestValue(#[from] SuggestValueError),
}

/// An invariant breach inside the solver. This is never a user error; it
/// indicates a bug in the solver itself.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[error("internal solver error: {0}")]
pub struct InternalSolverError(pub(crate) &'static str);

/// Errors from [`Solver::add_constraint`](crate::Solver::add_constraint).
#[derive(Debug, Error)]
pub enum AddConstraintError {
    #[error("the constraint has already been added to the solver")]
    DuplicateConstraint,

    #[error("the required constraint cannot be satisfied alongside the current system")]
    UnsatisfiableConstraint,

    #[error(transparent)]
    Internal(#[from] InternalSolverError),
}

/// Errors from [`Solver::remove_constraint`](crate::Solver::remove_constraint).
#[derive(Debug, Error)]
pub enum RemoveConstraintError {
    #[error("the constraint is not in the solver")]
    UnknownConstraint,

    #[error(transparent)]
    Internal(#[from] InternalSolverError),
}

/// Errors from [`Solver::add_edit_variable`](crate::Solver::add_edit_variable).
#[derive(Debug, Error)]
pub enum AddEditVariableError {
    #[error("the variable is already registered as an edit variable")]
    DuplicateEditVariable,

    #[error("edit variables cannot be given the required strength")]
    BadRequiredStrength,
}

/// Errors from [`Solver::remove_edit_variable`](crate::Solver::remove_edit_variable).
#[derive(Debug, Error)]
pub enum RemoveEditVariableError {
    #[error("the variable is not registered as an edit variable")]
    UnknownEditVariable,

    #[error(transparent)]
    Internal(#[from] InternalSolverError),
}

/// Errors from [`Solver::suggest_value`](crate::Solver::suggest_value).
#[derive(Debug, Error)]
pub enum SuggestValueError {
    #[error("the variable is not registered as an edit variable")]
    UnknownEditVariable,

    #[error(transparent)]
    Internal(#[from] InternalSolverError),
}
