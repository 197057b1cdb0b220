//! Error types for planning and distance providers.

use serde::Serialize;
use thiserror::Error;

/// Fatal outcomes of a planning request.
///
/// Per-day infeasibility is not represented here: a day without a closing
/// sequence is dropped, and only the global outcome surfaces.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PlanError {
    /// No carrier survived validation.
    #[error("no valid carrier: provide at least one carrier with id, name and address")]
    NoCarrier,
    /// Every carrier run was infeasible.
    #[error("no feasible carrier: no carrier can satisfy the constraints")]
    NoFeasibleCarrier,
    /// No pickup, delivery or transit survived validation.
    #[error("no valid task: provide at least one pickup, delivery or transit with complete data")]
    NoEligibleTask,
    /// No task carries a date constraint.
    #[error("no candidate date: no task defines a fixed date or a date window")]
    NoCandidateDate,
    /// Any other fault caught at the response boundary.
    #[error("internal failure: {0}")]
    Internal(String),
}

impl PlanError {
    /// Machine-readable category for the failure response.
    pub fn category(&self) -> ErrorCategory {
        match self {
            Self::NoCarrier | Self::NoFeasibleCarrier => ErrorCategory::NoEligibleCarrier,
            Self::NoEligibleTask => ErrorCategory::NoEligibleTask,
            Self::NoCandidateDate => ErrorCategory::NoCandidateDate,
            Self::Internal(_) => ErrorCategory::UnexpectedInternalFailure,
        }
    }
}

/// Failure categories exposed to callers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorCategory {
    NoEligibleCarrier,
    NoEligibleTask,
    NoCandidateDate,
    UnexpectedInternalFailure,
}

/// Errors from a [`crate::traits::DistanceMatrixProvider`].
///
/// These never reach the caller of the planner; the engine logs them and
/// switches to the synthetic estimator.
#[derive(Debug, Error)]
pub enum ProviderError {
    /// Transport or decoding failure.
    #[error("distance request failed: {0}")]
    Http(#[from] reqwest::Error),
    /// The API answered with a non-OK status.
    #[error("distance API returned status {status}")]
    Status { status: String },
    /// The matrix does not have one row and one column per address.
    #[error("expected a {expected}x{expected} matrix, got {rows} rows")]
    MalformedMatrix { expected: usize, rows: usize },
}
