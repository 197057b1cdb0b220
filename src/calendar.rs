//! Calendar resolver: candidate days and per-day segment filtering.

use std::collections::BTreeSet;

use chrono::NaiveDate;
use tracing::{debug, trace};

use crate::error::PlanError;
use crate::registry::LocationRegistry;
use crate::segment::{Segment, SegmentLibrary};

/// Collect every day named by a task's date constraint, ascending and unique.
///
/// Tasks without a constraint do not contribute. Transit constraints are read
/// once per transit.
pub fn candidate_days(registry: &LocationRegistry) -> Result<Vec<NaiveDate>, PlanError> {
    let mut days = BTreeSet::new();

    let task_nodes = registry
        .pickups()
        .iter()
        .chain(registry.deliveries())
        .copied()
        .chain(registry.transits().iter().map(|pair| pair.origin));

    for node in task_nodes.filter_map(|index| registry.node(index)) {
        if let Some(date) = node.date {
            days.extend(date.days());
        }
    }

    if days.is_empty() {
        debug!(
            component = "calendar",
            stage = "resolve",
            decision = "no_candidate_date",
        );
        return Err(PlanError::NoCandidateDate);
    }

    debug!(
        component = "calendar",
        stage = "resolve",
        days = days.len(),
        first = %days.first().map(ToString::to_string).unwrap_or_default(),
        last = %days.last().map(ToString::to_string).unwrap_or_default(),
    );

    Ok(days.into_iter().collect())
}

/// Segments whose every task node admits `day`.
pub fn segments_for_day<'a>(
    library: &'a SegmentLibrary,
    registry: &LocationRegistry,
    day: NaiveDate,
) -> Vec<&'a Segment> {
    let compatible: Vec<&Segment> = library
        .iter()
        .filter(|segment| {
            let path: Vec<usize> = segment.path().collect();
            let admitted = registry.admits_day(&path, day);
            if !admitted {
                trace!(
                    component = "calendar",
                    stage = "filter",
                    decision = "reject",
                    %day,
                    shape = ?segment.shape,
                );
            }
            admitted
        })
        .collect();

    debug!(
        component = "calendar",
        stage = "filter",
        %day,
        compatible = compatible.len(),
        total = library.len(),
    );

    compatible
}
