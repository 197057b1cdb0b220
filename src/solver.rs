//! Carrier selector: runs the day-tour pipeline once per carrier and keeps
//! the best run.

use rayon::prelude::*;
use serde::Serialize;
use tracing::{debug, info, warn};

use crate::calendar::{candidate_days, segments_for_day};
use crate::error::{PlanError, ProviderError};
use crate::model::{Carrier, Site, TaskId, TaskSet};
use crate::registry::LocationRegistry;
use crate::request::Constraints;
use crate::segment::{TravelParams, generate};
use crate::sequence::{Budget, DayPlan, best_plan, build_day};
use crate::synthetic::SyntheticMatrix;
use crate::traits::{DistanceMatrix, DistanceMatrixProvider, is_square};

#[derive(Debug, Clone, PartialEq)]
pub struct PlanOptions {
    /// Cap on the cumulative tour duration. `None` means unbounded.
    pub max_duration_hours: Option<f64>,
    pub average_speed_kmh: f64,
    /// Handling time per task stop.
    pub operation_time_minutes: f64,
    /// Cost per kilometer used for the estimated cost in reports.
    pub cost_per_km: f64,
}

impl Default for PlanOptions {
    fn default() -> Self {
        Self {
            max_duration_hours: None,
            average_speed_kmh: 70.0,
            operation_time_minutes: 30.0,
            cost_per_km: 1.5,
        }
    }
}

impl PlanOptions {
    /// Read request constraints, keeping defaults for invalid values.
    ///
    /// Any finite duration cap is kept, including zero or negative ones.
    pub fn from_constraints(constraints: &Constraints) -> Self {
        let defaults = Self::default();
        Self {
            max_duration_hours: finite(&constraints.max_duration_hours, "max_duration_hours"),
            average_speed_kmh: positive(&constraints.average_speed_kmh, "average_speed_kmh")
                .unwrap_or(defaults.average_speed_kmh),
            operation_time_minutes: non_negative(
                &constraints.operation_time_minutes,
                "operation_time_minutes",
            )
            .unwrap_or(defaults.operation_time_minutes),
            cost_per_km: defaults.cost_per_km,
        }
    }

    pub fn travel_params(&self) -> TravelParams {
        TravelParams {
            average_speed_kmh: self.average_speed_kmh,
            operation_hours: self.operation_time_minutes / 60.0,
        }
    }

    pub fn budget(&self) -> Budget {
        Budget(self.max_duration_hours)
    }
}

fn constraint_value(
    value: &Option<crate::request::NumberOrText>,
    name: &'static str,
    accept: impl Fn(f64) -> bool,
) -> Option<f64> {
    let raw = value.as_ref()?;
    match raw.value().filter(|v| v.is_finite() && accept(*v)) {
        Some(v) => Some(v),
        None => {
            warn!(
                component = "request",
                stage = "constraints",
                decision = "ignore",
                constraint = name,
                value = ?raw,
            );
            None
        }
    }
}

/// Any finite value; a cap of zero or below leaves no room for any segment.
fn finite(value: &Option<crate::request::NumberOrText>, name: &'static str) -> Option<f64> {
    constraint_value(value, name, |_| true)
}

fn positive(value: &Option<crate::request::NumberOrText>, name: &'static str) -> Option<f64> {
    constraint_value(value, name, |v| v > 0.0)
}

fn non_negative(value: &Option<crate::request::NumberOrText>, name: &'static str) -> Option<f64> {
    constraint_value(value, name, |v| v >= 0.0)
}

/// Why a task is missing from a carrier's tour.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum UncoveredReason {
    /// The pickup is imposed on another carrier.
    IncompatibleCarrier { required: String },
    /// The duration cap or the chosen day left no room for it.
    DurationOrDate,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct UncoveredTask {
    pub task: TaskId,
    pub reason: UncoveredReason,
}

/// Outcome of the pipeline for one carrier.
#[derive(Debug, Clone)]
pub struct CarrierPlan {
    pub carrier: Carrier,
    pub plan: DayPlan,
    /// Every task of the request not served, sorted by task id.
    pub uncovered: Vec<UncoveredTask>,
    pub registry: LocationRegistry,
}

impl CarrierPlan {
    pub fn covered(&self) -> usize {
        self.plan.covered.len()
    }

    pub fn distance_m(&self) -> u64 {
        self.plan.distance_m
    }

    pub fn duration_h(&self) -> f64 {
        self.plan.duration_h
    }

    /// Whether `self` beats `other`: more tasks, then shorter distance,
    /// then shorter duration.
    pub fn beats(&self, other: &Self) -> bool {
        self.covered()
            .cmp(&other.covered())
            .then_with(|| other.distance_m().cmp(&self.distance_m()))
            .then_with(|| other.duration_h().total_cmp(&self.duration_h()))
            .is_gt()
    }
}

/// The chosen carrier and every other feasible run, in input order.
#[derive(Debug, Clone)]
pub struct Selection {
    pub best: CarrierPlan,
    pub alternatives: Vec<CarrierPlan>,
}

impl Selection {
    /// Best run among the alternatives.
    pub fn runner_up(&self) -> Option<&CarrierPlan> {
        self.alternatives.iter().fold(None, |best, plan| match best {
            Some(current) if !plan.beats(current) => Some(current),
            _ => Some(plan),
        })
    }

    /// Distance saved against the runner-up, in meters; negative if the
    /// runner-up drives less while covering fewer tasks.
    pub fn savings_m(&self) -> Option<i64> {
        self.runner_up()
            .map(|other| other.distance_m() as i64 - self.best.distance_m() as i64)
    }
}

/// Evaluate every carrier and select the best feasible run.
pub fn solve<M>(
    tasks: &TaskSet,
    carriers: &[Carrier],
    site: &Site,
    provider: &M,
    options: &PlanOptions,
) -> Result<Selection, PlanError>
where
    M: DistanceMatrixProvider,
{
    if carriers.is_empty() {
        return Err(PlanError::NoCarrier);
    }
    if tasks.is_empty() {
        return Err(PlanError::NoEligibleTask);
    }
    if !tasks.has_date_constraint() {
        return Err(PlanError::NoCandidateDate);
    }

    info!(
        component = "carrier",
        stage = "solve",
        carriers = carriers.len(),
        tasks = tasks.len(),
        max_duration_hours = ?options.max_duration_hours,
    );

    let mut plans: Vec<CarrierPlan> = carriers
        .iter()
        .filter_map(|carrier| plan_for_carrier(tasks, carrier, site, provider, options))
        .collect();

    let best_index = plans
        .iter()
        .enumerate()
        .fold(None::<usize>, |best, (i, plan)| match best {
            Some(b) if !plan.beats(&plans[b]) => Some(b),
            _ => Some(i),
        })
        .ok_or(PlanError::NoFeasibleCarrier)?;

    let best = plans.remove(best_index);
    info!(
        component = "carrier",
        stage = "select",
        decision = "best",
        carrier = %best.carrier.id,
        day = %best.plan.day,
        covered = best.covered(),
        distance_m = best.distance_m(),
        alternatives = plans.len(),
    );

    Ok(Selection {
        best,
        alternatives: plans,
    })
}

/// Run the pipeline with `carrier` as depot.
///
/// Returns `None` when no candidate day yields a closed tour.
pub fn plan_for_carrier<M>(
    tasks: &TaskSet,
    carrier: &Carrier,
    site: &Site,
    provider: &M,
    options: &PlanOptions,
) -> Option<CarrierPlan>
where
    M: DistanceMatrixProvider,
{
    let mut excluded: Vec<UncoveredTask> = Vec::new();
    let mut eligible = Vec::new();
    for (i, pickup) in tasks.pickups.iter().enumerate() {
        match pickup.carrier.as_deref() {
            Some(required) if required != carrier.id => {
                debug!(
                    component = "carrier",
                    stage = "partition",
                    decision = "exclude",
                    carrier = %carrier.id,
                    pickup = %pickup.id,
                    required,
                );
                excluded.push(UncoveredTask {
                    task: TaskId::Pickup(i),
                    reason: UncoveredReason::IncompatibleCarrier {
                        required: required.to_string(),
                    },
                });
            }
            _ => eligible.push((i, pickup)),
        }
    }

    let registry = LocationRegistry::build(
        carrier,
        site,
        eligible,
        tasks.deliveries.iter().enumerate(),
        tasks.transits.iter().enumerate(),
    );

    let days = match candidate_days(&registry) {
        Ok(days) => days,
        Err(err) => {
            debug!(
                component = "carrier",
                stage = "calendar",
                decision = "drop",
                carrier = %carrier.id,
                error = %err,
            );
            return None;
        }
    };

    let matrix = fetch_matrix(provider, &registry.addresses());
    let library = generate(&registry, &matrix, options.travel_params());
    let budget = options.budget();

    let per_day: Vec<Option<DayPlan>> = days
        .par_iter()
        .map(|&day| {
            let segments = segments_for_day(&library, &registry, day);
            if segments.is_empty() {
                return None;
            }
            build_day(day, &segments, &registry, budget)
        })
        .collect();

    let Some(plan) = best_plan(per_day.into_iter().flatten()) else {
        info!(
            component = "carrier",
            stage = "sequence",
            decision = "infeasible",
            carrier = %carrier.id,
            days = days.len(),
        );
        return None;
    };

    let mut uncovered: Vec<UncoveredTask> = plan
        .uncovered
        .iter()
        .map(|&task| UncoveredTask {
            task,
            reason: UncoveredReason::DurationOrDate,
        })
        .chain(excluded)
        .collect();
    uncovered.sort_by_key(|u| u.task);

    info!(
        component = "carrier",
        stage = "sequence",
        decision = "feasible",
        carrier = %carrier.id,
        day = %plan.day,
        covered = plan.covered.len(),
        uncovered = uncovered.len(),
        distance_m = plan.distance_m,
        duration_h = plan.duration_h,
    );

    Some(CarrierPlan {
        carrier: carrier.clone(),
        plan,
        uncovered,
        registry,
    })
}

/// Fetch the matrix for `addresses`, falling back to [`SyntheticMatrix`] on
/// any provider failure or malformed result.
pub fn fetch_matrix<M>(provider: &M, addresses: &[String]) -> DistanceMatrix
where
    M: DistanceMatrixProvider,
{
    let result = provider.matrix_for(addresses).and_then(|matrix| {
        if is_square(&matrix, addresses.len()) {
            Ok(matrix)
        } else {
            Err(ProviderError::MalformedMatrix {
                expected: addresses.len(),
                rows: matrix.len(),
            })
        }
    });

    match result {
        Ok(matrix) => matrix,
        Err(err) => {
            warn!(
                component = "provider",
                stage = "fetch",
                decision = "fallback",
                addresses = addresses.len(),
                error = %err,
            );
            SyntheticMatrix::matrix(addresses.len())
        }
    }
}
