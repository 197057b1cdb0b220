//! Solution formatter: turns the selected carrier run into a stop-by-stop
//! itinerary and a serializable report.

use chrono::NaiveDate;
use serde::Serialize;

use crate::error::ErrorCategory;
use crate::model::{Role, TaskCounts, TaskId, TaskSet};
use crate::registry::Node;
use crate::request::ValidationTally;
use crate::solver::{CarrierPlan, PlanOptions, Selection, UncoveredReason};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum StopKind {
    DepotDeparture,
    DepotReturn,
    SiteArrival,
    SiteDeparture,
    SitePassthrough,
    Pickup,
    Delivery,
    TransitLoad,
    TransitUnload,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Stop {
    /// 1-based position in the itinerary.
    pub order: usize,
    /// 1-based number of the segment that reaches this stop.
    pub phase: usize,
    pub kind: StopKind,
    pub client: String,
    pub address: String,
    pub planned_date: NaiveDate,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reference: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub material: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Statistics {
    pub distance_km: f64,
    pub duration_hours: f64,
    pub max_duration_hours: Option<f64>,
    pub estimated_cost: f64,
    pub covered: TaskCounts,
    pub totals: TaskCounts,
    pub completion_percent: u32,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ChosenCarrier {
    pub id: String,
    pub name: String,
    pub address: String,
    pub savings_km: Option<f64>,
    pub reason: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AlternativeCarrier {
    pub id: String,
    pub name: String,
    pub distance_km: f64,
    pub duration_hours: f64,
    pub tasks_covered: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UncoveredEntry {
    pub task: TaskId,
    pub reference: String,
    pub client: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub material: Option<String>,
    pub reason: UncoveredReason,
}

/// Successful planning outcome.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PlanReport {
    pub success: bool,
    pub complete: bool,
    pub day: NaiveDate,
    /// Day as `dd/mm/YYYY`.
    pub day_formatted: String,
    /// Why this day was chosen, e.g. `Covers 3/4 tasks`.
    pub day_reason: String,
    pub itinerary: Vec<Stop>,
    pub segment_count: usize,
    pub statistics: Statistics,
    pub carrier: ChosenCarrier,
    pub alternatives: Vec<AlternativeCarrier>,
    pub uncovered: Vec<UncoveredEntry>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub warning: Option<String>,
    pub validation: ValidationTally,
}

/// Infeasible or failed request.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PlanFailure {
    pub success: bool,
    pub category: ErrorCategory,
    pub details: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum PlanResponse {
    Success(Box<PlanReport>),
    Failure(PlanFailure),
}

impl PlanResponse {
    pub fn is_success(&self) -> bool {
        matches!(self, PlanResponse::Success(_))
    }
}

/// Build the report for the selected carrier.
pub fn report(
    selection: &Selection,
    tasks: &TaskSet,
    options: &PlanOptions,
    validation: ValidationTally,
) -> PlanReport {
    let best = &selection.best;
    let plan = &best.plan;

    let totals = TaskCounts {
        pickups: tasks.pickups.len(),
        deliveries: tasks.deliveries.len(),
        transits: tasks.transits.len(),
    };
    let covered = TaskCounts::count(&plan.covered);

    let distance_km = best.distance_m() as f64 / 1000.0;
    let savings_km = selection.savings_m().map(|m| round2(m as f64 / 1000.0));

    let uncovered: Vec<UncoveredEntry> = best
        .uncovered
        .iter()
        .map(|u| {
            let (reference, client, material) = describe(tasks, u.task);
            UncoveredEntry {
                task: u.task,
                reference,
                client,
                material,
                reason: u.reason.clone(),
            }
        })
        .collect();

    PlanReport {
        success: true,
        complete: uncovered.is_empty(),
        day: plan.day,
        day_formatted: plan.day.format("%d/%m/%Y").to_string(),
        day_reason: format!("Covers {}/{} tasks", covered.total(), totals.total()),
        itinerary: itinerary(best),
        segment_count: plan.segments.len(),
        statistics: Statistics {
            distance_km: round2(distance_km),
            duration_hours: round2(plan.duration_h),
            max_duration_hours: options.max_duration_hours,
            estimated_cost: round2(distance_km * options.cost_per_km),
            covered,
            totals,
            completion_percent: completion_percent(covered.total(), totals.total()),
        },
        carrier: ChosenCarrier {
            id: best.carrier.id.clone(),
            name: best.carrier.name.clone(),
            address: best.carrier.address.clone(),
            savings_km,
            reason: savings_km.map(|km| format!("Saves {km:.1} km compared to the alternatives")),
        },
        alternatives: selection
            .alternatives
            .iter()
            .map(|alt| AlternativeCarrier {
                id: alt.carrier.id.clone(),
                name: alt.carrier.name.clone(),
                distance_km: round2(alt.distance_m() as f64 / 1000.0),
                duration_hours: round2(alt.duration_h()),
                tasks_covered: alt.covered(),
            })
            .collect(),
        warning: (!uncovered.is_empty())
            .then(|| format!("{} task(s) not included", uncovered.len())),
        uncovered,
        validation,
    }
}

/// Flatten the accepted segments into stops.
///
/// Consecutive segments share a node (the end of one is the origin of the
/// next); it appears once.
pub fn itinerary(plan: &CarrierPlan) -> Vec<Stop> {
    let registry = &plan.registry;
    let mut path: Vec<(usize, usize)> = Vec::new();
    for (i, segment) in plan.plan.segments.iter().enumerate() {
        let phase = i + 1;
        if path.is_empty() {
            path.push((phase, segment.origin));
        }
        path.extend(segment.stops.iter().map(|&node| (phase, node)));
    }

    let roles: Vec<Option<Role>> = path
        .iter()
        .map(|&(_, node)| registry.node(node).map(|n| n.role))
        .collect();

    path.iter()
        .enumerate()
        .filter_map(|(i, &(phase, node))| {
            let node = registry.node(node)?;
            let prev = i.checked_sub(1).and_then(|p| roles.get(p)).copied().flatten();
            let next = roles.get(i + 1).copied().flatten();
            Some(stop(i + 1, phase, node, stop_kind(i, node.role, prev, next), plan.plan.day))
        })
        .collect()
}

fn stop_kind(position: usize, role: Role, prev: Option<Role>, next: Option<Role>) -> StopKind {
    match role {
        Role::Depot if position == 0 => StopKind::DepotDeparture,
        Role::Depot => StopKind::DepotReturn,
        Role::Site => {
            let arrival = matches!(prev, Some(Role::Pickup | Role::TransitDestination));
            let departure = matches!(
                next,
                Some(Role::Delivery | Role::Pickup | Role::TransitOrigin)
            );
            match (arrival, departure) {
                (true, false) => StopKind::SiteArrival,
                (false, true) => StopKind::SiteDeparture,
                _ => StopKind::SitePassthrough,
            }
        }
        Role::Pickup => StopKind::Pickup,
        Role::Delivery => StopKind::Delivery,
        Role::TransitOrigin => StopKind::TransitLoad,
        Role::TransitDestination => StopKind::TransitUnload,
    }
}

fn stop(order: usize, phase: usize, node: &Node, kind: StopKind, day: NaiveDate) -> Stop {
    Stop {
        order,
        phase,
        kind,
        client: node.client.clone(),
        address: node.address.clone(),
        planned_date: day,
        reference: Some(node.reference.clone()).filter(|r| !r.is_empty()),
        material: node.material.clone(),
    }
}

fn describe(tasks: &TaskSet, task: TaskId) -> (String, String, Option<String>) {
    match task {
        TaskId::Pickup(i) => tasks
            .pickups
            .get(i)
            .map(|p| (p.id.clone(), p.client.clone(), None)),
        TaskId::Delivery(i) => tasks
            .deliveries
            .get(i)
            .map(|d| (d.id.clone(), d.client.clone(), None)),
        TaskId::Transit(i) => tasks.transits.get(i).map(|t| {
            (
                t.id.clone(),
                format!("Transit loading ({})", t.material),
                Some(t.material.clone()),
            )
        }),
    }
    .unwrap_or_default()
}

/// Whole percent, ties rounded to even.
fn completion_percent(covered: usize, total: usize) -> u32 {
    if total == 0 {
        return 0;
    }
    (covered as f64 / total as f64 * 100.0).round_ties_even() as u32
}

fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_site_kinds() {
        assert_eq!(
            stop_kind(3, Role::Site, Some(Role::Pickup), Some(Role::Delivery)),
            StopKind::SitePassthrough
        );
        assert_eq!(
            stop_kind(3, Role::Site, Some(Role::Pickup), Some(Role::Depot)),
            StopKind::SiteArrival
        );
        assert_eq!(
            stop_kind(1, Role::Site, Some(Role::Depot), Some(Role::Pickup)),
            StopKind::SiteDeparture
        );
        assert_eq!(
            stop_kind(1, Role::Site, Some(Role::Depot), Some(Role::Depot)),
            StopKind::SitePassthrough
        );
    }

    #[test]
    fn test_depot_kinds() {
        assert_eq!(stop_kind(0, Role::Depot, None, Some(Role::Pickup)), StopKind::DepotDeparture);
        assert_eq!(stop_kind(4, Role::Depot, Some(Role::Site), None), StopKind::DepotReturn);
    }

    #[test]
    fn test_completion_percent_rounds_half_to_even() {
        assert_eq!(completion_percent(1, 8), 12);
        assert_eq!(completion_percent(3, 8), 38);
        assert_eq!(completion_percent(1, 3), 33);
        assert_eq!(completion_percent(2, 2), 100);
        assert_eq!(completion_percent(0, 0), 0);
    }

    #[test]
    fn test_round2() {
        assert_eq!(round2(2.714_285), 2.71);
        assert_eq!(round2(260.0), 260.0);
    }
}
