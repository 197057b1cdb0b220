//! Request entry points.
//!
//! [`plan`] runs validation, carrier selection and formatting. [`respond`]
//! wraps it for callers that need a response value in every case.

use std::panic::{AssertUnwindSafe, catch_unwind};

use tracing::{error, info};

use crate::error::PlanError;
use crate::format::{PlanFailure, PlanReport, PlanResponse, report};
use crate::request::{PlanRequest, sanitize};
use crate::solver::{PlanOptions, solve};
use crate::traits::DistanceMatrixProvider;

/// Plan the day tour for `request`.
pub fn plan<M>(request: &PlanRequest, provider: &M) -> Result<PlanReport, PlanError>
where
    M: DistanceMatrixProvider,
{
    let sanitized = sanitize(request);
    let options = PlanOptions::from_constraints(&request.constraints);

    let selection = solve(
        &sanitized.tasks,
        &sanitized.carriers,
        &sanitized.site,
        provider,
        &options,
    )?;

    Ok(report(&selection, &sanitized.tasks, &options, sanitized.tally))
}

/// Plan and convert every outcome, including panics, into a response.
pub fn respond<M>(request: &PlanRequest, provider: &M) -> PlanResponse
where
    M: DistanceMatrixProvider,
{
    let outcome = catch_unwind(AssertUnwindSafe(|| plan(request, provider)))
        .unwrap_or_else(|payload| {
            let message = payload
                .downcast_ref::<&str>()
                .map(|s| (*s).to_string())
                .or_else(|| payload.downcast_ref::<String>().cloned())
                .unwrap_or_else(|| "unknown failure".to_string());
            error!(
                component = "planner",
                stage = "respond",
                decision = "internal_failure",
                message = %message,
            );
            Err(PlanError::Internal(message))
        });

    match outcome {
        Ok(report) => PlanResponse::Success(Box::new(report)),
        Err(err) => {
            info!(
                component = "planner",
                stage = "respond",
                decision = "failure",
                category = ?err.category(),
                error = %err,
            );
            PlanResponse::Failure(PlanFailure {
                success: false,
                category: err.category(),
                details: err.to_string(),
            })
        }
    }
}
