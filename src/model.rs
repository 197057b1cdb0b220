//! Domain types shared by every stage of the planner.

use chrono::NaiveDate;
use serde::Serialize;

/// Role of a node within one carrier run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    Depot,
    Site,
    Pickup,
    Delivery,
    TransitOrigin,
    TransitDestination,
}

impl Role {
    /// Depot and site are anchors: they never carry a task or a date.
    pub fn is_anchor(self) -> bool {
        matches!(self, Role::Depot | Role::Site)
    }
}

/// Calendar constraint attached to a task.
///
/// A task has either a fixed day or a window, never both: when a record
/// carries both, the fixed day is kept and the window is dropped.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DateConstraint {
    Fixed(NaiveDate),
    /// Inclusive range. A range whose start is after its end admits no day.
    Window { start: NaiveDate, end: NaiveDate },
}

impl DateConstraint {
    /// Whether `day` satisfies the constraint.
    pub fn admits(&self, day: NaiveDate) -> bool {
        match *self {
            DateConstraint::Fixed(fixed) => fixed == day,
            DateConstraint::Window { start, end } => start <= day && day <= end,
        }
    }

    /// Every day the constraint admits, ascending.
    pub fn days(&self) -> impl Iterator<Item = NaiveDate> + '_ {
        let (start, end) = match *self {
            DateConstraint::Fixed(fixed) => (fixed, fixed),
            DateConstraint::Window { start, end } => (start, end),
        };
        start.iter_days().take_while(move |day| *day <= end)
    }
}

/// Identifies a task by category and position in the validated task lists.
///
/// Positions refer to the request-wide lists, so identifiers stay stable across
/// carrier runs even when some pickups are excluded from a run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(tag = "type", content = "index", rename_all = "snake_case")]
pub enum TaskId {
    Pickup(usize),
    Delivery(usize),
    Transit(usize),
}

/// A pickup to collect and bring to the treatment site.
#[derive(Debug, Clone, PartialEq)]
pub struct Pickup {
    pub id: String,
    pub client: String,
    pub address: String,
    pub date: Option<DateConstraint>,
    /// Carrier id imposed on this pickup, if any.
    pub carrier: Option<String>,
}

/// A delivery carried from the treatment site to a client.
#[derive(Debug, Clone, PartialEq)]
pub struct Delivery {
    pub id: String,
    pub client: String,
    pub address: String,
    pub date: Option<DateConstraint>,
}

/// Goods moved directly between two addresses, bypassing the site.
#[derive(Debug, Clone, PartialEq)]
pub struct Transit {
    pub id: String,
    pub material: String,
    pub origin: String,
    pub destination: String,
    pub date: Option<DateConstraint>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Carrier {
    pub id: String,
    pub name: String,
    pub address: String,
}

/// The treatment site every pickup is unloaded at.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Site {
    pub name: String,
    pub address: String,
}

/// Validated tasks of one request.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TaskSet {
    pub pickups: Vec<Pickup>,
    pub deliveries: Vec<Delivery>,
    pub transits: Vec<Transit>,
}

impl TaskSet {
    pub fn len(&self) -> usize {
        self.pickups.len() + self.deliveries.len() + self.transits.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Every task identifier, in category order.
    pub fn ids(&self) -> impl Iterator<Item = TaskId> + '_ {
        (0..self.pickups.len())
            .map(TaskId::Pickup)
            .chain((0..self.deliveries.len()).map(TaskId::Delivery))
            .chain((0..self.transits.len()).map(TaskId::Transit))
    }

    /// Whether any task carries a date constraint.
    pub fn has_date_constraint(&self) -> bool {
        self.pickups.iter().any(|p| p.date.is_some())
            || self.deliveries.iter().any(|d| d.date.is_some())
            || self.transits.iter().any(|t| t.date.is_some())
    }
}

/// Per-category task counts.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TaskCounts {
    pub pickups: usize,
    pub deliveries: usize,
    pub transits: usize,
}

impl TaskCounts {
    pub fn total(&self) -> usize {
        self.pickups + self.deliveries + self.transits
    }

    pub fn count<'a>(ids: impl IntoIterator<Item = &'a TaskId>) -> Self {
        let mut counts = Self::default();
        for id in ids {
            match id {
                TaskId::Pickup(_) => counts.pickups += 1,
                TaskId::Delivery(_) => counts.deliveries += 1,
                TaskId::Transit(_) => counts.transits += 1,
            }
        }
        counts
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn day(d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2026, 2, d).expect("valid date")
    }

    #[test]
    fn test_window_days_inclusive() {
        let window = DateConstraint::Window {
            start: day(2),
            end: day(6),
        };
        let days: Vec<_> = window.days().collect();
        assert_eq!(days, vec![day(2), day(3), day(4), day(5), day(6)]);
        assert!(window.admits(day(6)));
        assert!(!window.admits(day(7)));
    }

    #[test]
    fn test_inverted_window_admits_nothing() {
        let window = DateConstraint::Window {
            start: day(6),
            end: day(2),
        };
        assert_eq!(window.days().count(), 0);
        assert!(!window.admits(day(4)));
    }

    #[test]
    fn test_fixed_date() {
        let fixed = DateConstraint::Fixed(day(3));
        assert_eq!(fixed.days().collect::<Vec<_>>(), vec![day(3)]);
        assert!(!fixed.admits(day(4)));
    }

    #[test]
    fn test_counts() {
        let ids = [TaskId::Pickup(0), TaskId::Pickup(3), TaskId::Transit(1)];
        let counts = TaskCounts::count(&ids);
        assert_eq!(counts.pickups, 2);
        assert_eq!(counts.deliveries, 0);
        assert_eq!(counts.transits, 1);
        assert_eq!(counts.total(), 3);
    }
}
