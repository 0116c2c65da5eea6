//! Solver adapters

use std::fmt;

use good_lp::ResolutionError;
use thiserror::Error;

use crate::formulations::model::{Problem, VarId};

pub mod milp;

/// Verdict reported by a solver backend.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SolveStatus {
    /// An optimal solution was found
    Optimal,

    /// No assignment satisfies every constraint
    Infeasible,

    /// The objective can decrease without bound
    Unbounded,

    /// The backend failed or stopped before proving optimality
    SolverError,
}

impl fmt::Display for SolveStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            SolveStatus::Optimal => "optimal",
            SolveStatus::Infeasible => "infeasible",
            SolveStatus::Unbounded => "unbounded",
            SolveStatus::SolverError => "solver error",
        })
    }
}

/// Solver Errors
#[derive(Debug, Error)]
pub enum SolverError {
    /// The backend did not return an optimal solution.
    #[error("solve failed ({status}): {reason}")]
    SolveFailure {
        /// Non-optimal status reported by the backend
        status: SolveStatus,
        /// Backend-provided detail
        reason: String,
    },

    /// A solved value broke an invariant the formulation guarantees (this is a bug in
    /// the backend or the formulation).
    #[error("solver invariant violated: {message}")]
    InvariantViolation {
        /// What invariant was violated
        message: String,
    },
}

impl SolverError {
    /// Status behind a [`SolverError::SolveFailure`].
    pub fn status(&self) -> Option<SolveStatus> {
        match self {
            SolverError::SolveFailure { status, .. } => Some(*status),
            SolverError::InvariantViolation { .. } => None,
        }
    }

    pub(crate) fn invariant(message: impl Into<String>) -> Self {
        SolverError::InvariantViolation {
            message: message.into(),
        }
    }
}

impl From<ResolutionError> for SolverError {
    fn from(err: ResolutionError) -> Self {
        let status = match &err {
            ResolutionError::Infeasible => SolveStatus::Infeasible,
            ResolutionError::Unbounded => SolveStatus::Unbounded,
            _ => SolveStatus::SolverError,
        };

        SolverError::SolveFailure {
            status,
            reason: err.to_string(),
        }
    }
}

/// Values assigned to every variable of an optimally solved [`Problem`].
#[derive(Debug, Clone, PartialEq)]
pub struct Assignment {
    values: Vec<f64>,
}

impl Assignment {
    /// Wrap per-variable values, indexed by [`VarId::index`].
    pub fn new(values: Vec<f64>) -> Self {
        Self { values }
    }

    /// Value assigned to `var`, if the variable exists.
    pub fn value(&self, var: VarId) -> Option<f64> {
        self.values.get(var.index()).copied()
    }

    /// All values in variable order.
    pub fn values(&self) -> &[f64] {
        &self.values
    }

    /// Ensure the assignment covers every variable of `problem`.
    ///
    /// # Errors
    ///
    /// Returns [`SolverError::InvariantViolation`] on a length mismatch.
    pub fn ensure_covers(&self, problem: &Problem) -> Result<(), SolverError> {
        if self.values.len() != problem.variables().len() {
            return Err(SolverError::invariant(format!(
                "backend returned {} values for {} variables",
                self.values.len(),
                problem.variables().len()
            )));
        }

        Ok(())
    }
}

/// A MILP solver capable of minimising a [`Problem`].
pub trait SolverBackend {
    /// Solve `problem` to optimality.
    ///
    /// # Errors
    ///
    /// Returns [`SolverError::SolveFailure`] when the status is anything but optimal;
    /// a non-optimal solve never yields an [`Assignment`].
    fn solve(&self, problem: &Problem) -> Result<Assignment, SolverError>;
}

impl<B: SolverBackend + ?Sized> SolverBackend for &B {
    fn solve(&self, problem: &Problem) -> Result<Assignment, SolverError> {
        (**self).solve(problem)
    }
}
