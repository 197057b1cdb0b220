//! Sequence builder: greedy assembly of one day's tour.
//!
//! The builder is a small state machine over the vehicle position. Each
//! accepted segment produces a new [`TourState`] through [`TourState::apply`];
//! no state is mutated in place, so every intermediate state can be inspected.
//!
//! 1. Start: the first depot-anchored segment, real work before the
//!    depot → site no-op, shorter first.
//! 2. Middle: repeatedly the best-ranked segment leaving the current
//!    position, until no task remains, nothing fits, or the depot is reached.
//! 3. Close: an end segment back to the depot. Without one the day is dropped.

use std::cmp::Ordering;
use std::collections::BTreeSet;

use chrono::NaiveDate;
use tracing::{debug, trace};

use crate::model::{Role, TaskId};
use crate::registry::LocationRegistry;
use crate::segment::{Phase, Segment};

/// Where the vehicle stands.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Position {
    AtDepot,
    AtSite,
    /// Any other node, e.g. the destination of a transit that skipped the site.
    AtNode(usize),
}

impl Position {
    pub fn of(registry: &LocationRegistry, node: usize) -> Self {
        match registry.node(node).map(|n| n.role) {
            Some(Role::Depot) => Position::AtDepot,
            Some(Role::Site) => Position::AtSite,
            _ => Position::AtNode(node),
        }
    }
}

/// Optional cap on the cumulative duration of a tour, in hours.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Budget(pub Option<f64>);

impl Budget {
    pub fn admits(self, duration_h: f64) -> bool {
        self.0.is_none_or(|max| duration_h <= max)
    }
}

/// Immutable snapshot of a tour under construction.
#[derive(Debug, Clone, PartialEq)]
pub struct TourState<'a> {
    pub position: Position,
    pub remaining: BTreeSet<TaskId>,
    pub accepted: Vec<&'a Segment>,
    pub distance_m: u64,
    pub duration_h: f64,
}

impl<'a> TourState<'a> {
    /// Vehicle at the depot, nothing served.
    pub fn initial(tasks: impl IntoIterator<Item = TaskId>) -> Self {
        Self {
            position: Position::AtDepot,
            remaining: tasks.into_iter().collect(),
            accepted: Vec::new(),
            distance_m: 0,
            duration_h: 0.0,
        }
    }

    /// Back at the depot after at least one segment.
    pub fn is_closed(&self) -> bool {
        self.position == Position::AtDepot && !self.accepted.is_empty()
    }

    /// Whether none of the segment's tasks has been served yet.
    pub fn is_unconsumed(&self, segment: &Segment) -> bool {
        segment.tasks.iter().all(|task| self.remaining.contains(task))
    }

    pub fn fits(&self, segment: &Segment, budget: Budget) -> bool {
        budget.admits(self.duration_h + segment.duration_h)
    }

    pub fn leaves_from_here(&self, segment: &Segment, registry: &LocationRegistry) -> bool {
        Position::of(registry, segment.origin) == self.position
    }

    /// State after driving `segment`.
    pub fn apply(&self, segment: &'a Segment, registry: &LocationRegistry) -> Self {
        let mut accepted = self.accepted.clone();
        accepted.push(segment);
        Self {
            position: Position::of(registry, segment.destination()),
            remaining: self
                .remaining
                .iter()
                .copied()
                .filter(|task| !segment.tasks.contains(task))
                .collect(),
            accepted,
            distance_m: self.distance_m + segment.distance_m,
            duration_h: self.duration_h + segment.duration_h,
        }
    }
}

/// A closed tour for one day.
#[derive(Debug, Clone, PartialEq)]
pub struct DayPlan {
    pub day: NaiveDate,
    pub segments: Vec<Segment>,
    pub covered: BTreeSet<TaskId>,
    pub uncovered: BTreeSet<TaskId>,
    pub distance_m: u64,
    pub duration_h: f64,
}

impl DayPlan {
    /// More tasks, then shorter duration, then shorter distance.
    pub fn cmp_quality(&self, other: &Self) -> Ordering {
        self.covered
            .len()
            .cmp(&other.covered.len())
            .then_with(|| other.duration_h.total_cmp(&self.duration_h))
            .then_with(|| other.distance_m.cmp(&self.distance_m))
    }
}

/// Keep the first plan among the best; callers pass plans in ascending day
/// order so ties go to the earliest day.
pub fn best_plan(plans: impl IntoIterator<Item = DayPlan>) -> Option<DayPlan> {
    plans.into_iter().fold(None, |best, plan| match best {
        Some(current) if plan.cmp_quality(&current) != Ordering::Greater => Some(current),
        _ => Some(plan),
    })
}

/// Build the tour for `day` from the segments valid on that day.
///
/// Returns `None` when no start segment fits or the tour cannot be closed
/// within `budget`.
pub fn build_day<'a>(
    day: NaiveDate,
    segments: &[&'a Segment],
    registry: &LocationRegistry,
    budget: Budget,
) -> Option<DayPlan> {
    let tasks = registry.task_ids();
    let state = TourState::initial(tasks.iter().copied());

    let state = start(state, segments, registry, budget, day)?;
    let state = middle(state, segments, registry, budget, day);
    let state = close(state, segments, registry, budget, day)?;

    let covered: BTreeSet<TaskId> = tasks
        .iter()
        .copied()
        .filter(|task| !state.remaining.contains(task))
        .collect();

    debug!(
        component = "sequence",
        stage = "done",
        %day,
        segments = state.accepted.len(),
        covered = covered.len(),
        uncovered = state.remaining.len(),
        distance_m = state.distance_m,
        duration_h = state.duration_h,
    );

    Some(DayPlan {
        day,
        segments: state.accepted.iter().map(|&s| s.clone()).collect(),
        covered,
        uncovered: state.remaining,
        distance_m: state.distance_m,
        duration_h: state.duration_h,
    })
}

fn start<'a>(
    state: TourState<'a>,
    segments: &[&'a Segment],
    registry: &LocationRegistry,
    budget: Budget,
    day: NaiveDate,
) -> Option<TourState<'a>> {
    let mut starts: Vec<&'a Segment> = segments
        .iter()
        .copied()
        .filter(|s| s.shape.phase() == Phase::Start)
        .collect();
    starts.sort_by(|a, b| {
        a.shape
            .is_no_op()
            .cmp(&b.shape.is_no_op())
            .then_with(|| a.duration_h.total_cmp(&b.duration_h))
    });

    let chosen = starts.into_iter().find(|segment| {
        let accepted = state.fits(segment, budget)
            && state.is_unconsumed(segment)
            && !(segment.shape.is_no_op() && state.remaining.is_empty());
        if !accepted {
            trace!(
                component = "sequence",
                stage = "start",
                decision = "reject",
                %day,
                shape = ?segment.shape,
                duration_h = segment.duration_h,
            );
        }
        accepted
    });

    let Some(segment) = chosen else {
        debug!(
            component = "sequence",
            stage = "start",
            decision = "infeasible",
            %day,
        );
        return None;
    };

    debug!(
        component = "sequence",
        stage = "start",
        decision = "accept",
        %day,
        shape = ?segment.shape,
        duration_h = segment.duration_h,
    );
    Some(state.apply(segment, registry))
}

fn middle<'a>(
    mut state: TourState<'a>,
    segments: &[&'a Segment],
    registry: &LocationRegistry,
    budget: Budget,
    day: NaiveDate,
) -> TourState<'a> {
    // Every accepted step serves a task or returns to the depot, so this
    // many steps always suffice.
    let ceiling = state.remaining.len() + 1;

    for step in 0..ceiling {
        if state.remaining.is_empty() || state.position == Position::AtDepot {
            return state;
        }

        let remaining = state.remaining.len();
        let best = segments
            .iter()
            .copied()
            .filter(|s| s.shape.phase() != Phase::Start)
            .filter(|s| state.leaves_from_here(s, registry))
            .filter(|s| state.is_unconsumed(s))
            .filter(|s| state.fits(s, budget))
            .min_by(|a, b| rank(a, remaining, registry).cmp(&rank(b, remaining, registry)));

        let Some(segment) = best else {
            debug!(
                component = "sequence",
                stage = "middle",
                decision = "nothing_fits",
                %day,
                step,
                remaining,
            );
            return state;
        };

        debug!(
            component = "sequence",
            stage = "middle",
            decision = "accept",
            %day,
            step,
            shape = ?segment.shape,
            tasks = segment.tasks.len(),
            distance_m = segment.distance_m,
        );
        state = state.apply(segment, registry);
    }

    if !state.remaining.is_empty() && state.position != Position::AtDepot {
        debug!(
            component = "sequence",
            stage = "middle",
            decision = "ceiling_reached",
            %day,
            ceiling,
        );
    }
    state
}

/// Sort key: returning to the depot early last, then more task stops, then
/// shorter distance.
fn rank(
    segment: &Segment,
    remaining: usize,
    registry: &LocationRegistry,
) -> (bool, std::cmp::Reverse<usize>, u64) {
    let ends_tour = Position::of(registry, segment.destination()) == Position::AtDepot;
    let leaves_work = ends_tour && remaining > segment.tasks.len();
    (
        leaves_work,
        std::cmp::Reverse(segment.task_stops),
        segment.distance_m,
    )
}

fn close<'a>(
    state: TourState<'a>,
    segments: &[&'a Segment],
    registry: &LocationRegistry,
    budget: Budget,
    day: NaiveDate,
) -> Option<TourState<'a>> {
    if state.is_closed() {
        return Some(state);
    }

    let end = segments.iter().copied().find(|s| {
        s.shape.phase() == Phase::End
            && state.leaves_from_here(s, registry)
            && state.fits(s, budget)
    });

    match end {
        Some(segment) => {
            debug!(
                component = "sequence",
                stage = "close",
                decision = "accept",
                %day,
                shape = ?segment.shape,
            );
            Some(state.apply(segment, registry))
        }
        None => {
            debug!(
                component = "sequence",
                stage = "close",
                decision = "infeasible",
                %day,
                duration_h = state.duration_h,
            );
            None
        }
    }
}
