//! Request schema and record validation.
//!
//! Raw records arrive with every field optional. [`sanitize`] drops the ones
//! missing required data and converts the rest into domain types.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::model::{Carrier, DateConstraint, Delivery, Pickup, Site, TaskSet, Transit};

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct PlanRequest {
    pub pickups: Vec<PickupRecord>,
    pub deliveries: Vec<DeliveryRecord>,
    pub transits: Vec<TransitRecord>,
    pub carriers: Vec<CarrierRecord>,
    pub treatment_site: SiteRecord,
    pub constraints: Constraints,
}

/// Date fields shared by every task record, as `YYYY-MM-DD` strings.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct DateFields {
    pub fixed_date: Option<String>,
    pub window_start: Option<String>,
    pub window_end: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct PickupRecord {
    pub id: Option<String>,
    pub client: Option<String>,
    pub address: Option<String>,
    #[serde(flatten)]
    pub dates: DateFields,
    /// Imposed carrier id; blank means any carrier.
    pub carrier: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct DeliveryRecord {
    pub id: Option<String>,
    pub client: Option<String>,
    pub address: Option<String>,
    #[serde(flatten)]
    pub dates: DateFields,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct TransitRecord {
    pub id: Option<String>,
    pub material: Option<String>,
    pub origin_address: Option<String>,
    pub destination_address: Option<String>,
    #[serde(flatten)]
    pub dates: DateFields,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct CarrierRecord {
    pub id: Option<String>,
    pub name: Option<String>,
    pub address: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct SiteRecord {
    pub name: Option<String>,
    pub address: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Constraints {
    pub max_duration_hours: Option<NumberOrText>,
    pub average_speed_kmh: Option<NumberOrText>,
    pub operation_time_minutes: Option<NumberOrText>,
}

/// A numeric value sent either as a JSON number or as a string.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(untagged)]
pub enum NumberOrText {
    Number(f64),
    Text(String),
}

impl NumberOrText {
    pub fn value(&self) -> Option<f64> {
        match self {
            NumberOrText::Number(n) => Some(*n),
            NumberOrText::Text(text) => text.trim().parse().ok(),
        }
    }
}

/// Record counts before and after validation, per category.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ValidationTally {
    pub pickups: (usize, usize),
    pub deliveries: (usize, usize),
    pub transits: (usize, usize),
    pub carriers: (usize, usize),
}

impl ValidationTally {
    /// Records dropped across all categories.
    pub fn dropped(&self) -> usize {
        [self.pickups, self.deliveries, self.transits, self.carriers]
            .iter()
            .map(|(before, after)| before - after)
            .sum()
    }
}

/// Validated content of a request.
#[derive(Debug, Clone, PartialEq)]
pub struct Sanitized {
    pub tasks: TaskSet,
    pub carriers: Vec<Carrier>,
    pub site: Site,
    pub tally: ValidationTally,
}

/// Drop incomplete records and convert the rest.
///
/// Pickups and deliveries need an address and a client, transits both
/// addresses and a material, carriers an address, a name and an id.
pub fn sanitize(request: &PlanRequest) -> Sanitized {
    let pickups: Vec<Pickup> = request
        .pickups
        .iter()
        .filter_map(|record| {
            Some(Pickup {
                address: required(&record.address)?,
                client: required(&record.client)?,
                id: record.id.clone().unwrap_or_default(),
                date: parse_dates(&record.dates),
                carrier: required(&record.carrier),
            })
        })
        .collect();

    let deliveries: Vec<Delivery> = request
        .deliveries
        .iter()
        .filter_map(|record| {
            Some(Delivery {
                address: required(&record.address)?,
                client: required(&record.client)?,
                id: record.id.clone().unwrap_or_default(),
                date: parse_dates(&record.dates),
            })
        })
        .collect();

    let transits: Vec<Transit> = request
        .transits
        .iter()
        .filter_map(|record| {
            Some(Transit {
                origin: required(&record.origin_address)?,
                destination: required(&record.destination_address)?,
                material: required(&record.material)?,
                id: record.id.clone().unwrap_or_default(),
                date: parse_dates(&record.dates),
            })
        })
        .collect();

    let carriers: Vec<Carrier> = request
        .carriers
        .iter()
        .filter_map(|record| {
            Some(Carrier {
                address: required(&record.address)?,
                name: required(&record.name)?,
                id: required(&record.id)?,
            })
        })
        .collect();

    let site = Site {
        name: required(&request.treatment_site.name).unwrap_or_else(|| "Site".to_string()),
        address: request.treatment_site.address.clone().unwrap_or_default(),
    };

    let tally = ValidationTally {
        pickups: (request.pickups.len(), pickups.len()),
        deliveries: (request.deliveries.len(), deliveries.len()),
        transits: (request.transits.len(), transits.len()),
        carriers: (request.carriers.len(), carriers.len()),
    };

    info!(
        component = "request",
        stage = "validate",
        pickups = ?tally.pickups,
        deliveries = ?tally.deliveries,
        transits = ?tally.transits,
        carriers = ?tally.carriers,
        dropped = tally.dropped(),
    );

    Sanitized {
        tasks: TaskSet {
            pickups,
            deliveries,
            transits,
        },
        carriers,
        site,
        tally,
    }
}

fn required(value: &Option<String>) -> Option<String> {
    value
        .as_deref()
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(str::to_string)
}

/// A fixed date wins over a window. Unparseable values count as absent.
fn parse_dates(dates: &DateFields) -> Option<DateConstraint> {
    if let Some(fixed) = required(&dates.fixed_date) {
        if let Some(day) = parse_day(&fixed) {
            return Some(DateConstraint::Fixed(day));
        }
    }

    let start = required(&dates.window_start)?;
    let end = required(&dates.window_end)?;
    Some(DateConstraint::Window {
        start: parse_day(&start)?,
        end: parse_day(&end)?,
    })
}

fn parse_day(value: &str) -> Option<NaiveDate> {
    match NaiveDate::parse_from_str(value, "%Y-%m-%d") {
        Ok(day) => Some(day),
        Err(err) => {
            warn!(
                component = "request",
                stage = "parse_date",
                decision = "ignore",
                value,
                error = %err,
            );
            None
        }
    }
}
