//! Test fixtures for daytour-planner.
//!
//! Builders for plan requests with sensible defaults. Dates are given as day
//! numbers in February 2026.

#![allow(dead_code)]

use chrono::NaiveDate;
use daytour_planner::request::{
    CarrierRecord, Constraints, DateFields, DeliveryRecord, NumberOrText, PickupRecord,
    PlanRequest, SiteRecord, TransitRecord,
};

pub fn feb(day: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(2026, 2, day).expect("valid date")
}

fn iso(day: u32) -> Option<String> {
    Some(feb(day).format("%Y-%m-%d").to_string())
}

/// Date fields for a fixed day.
pub fn on(day: u32) -> DateFields {
    DateFields {
        fixed_date: iso(day),
        ..Default::default()
    }
}

/// Date fields for an inclusive window.
pub fn between(start: u32, end: u32) -> DateFields {
    DateFields {
        fixed_date: None,
        window_start: iso(start),
        window_end: iso(end),
    }
}

pub fn undated() -> DateFields {
    DateFields::default()
}

/// Builder for requests, one treatment site at "Site Road 1".
#[derive(Debug, Clone)]
pub struct RequestBuilder {
    request: PlanRequest,
}

impl RequestBuilder {
    pub fn new() -> Self {
        Self {
            request: PlanRequest {
                treatment_site: SiteRecord {
                    name: Some("Treatment Site".to_string()),
                    address: Some("Site Road 1".to_string()),
                },
                ..Default::default()
            },
        }
    }

    pub fn carrier(mut self, id: &str) -> Self {
        self.request.carriers.push(CarrierRecord {
            id: Some(id.to_string()),
            name: Some(format!("Carrier {id}")),
            address: Some(format!("{id} Depot Street")),
        });
        self
    }

    pub fn pickup(self, id: &str, dates: DateFields) -> Self {
        self.pickup_for(id, dates, None)
    }

    /// Pickup imposed on `carrier` when given.
    pub fn pickup_for(mut self, id: &str, dates: DateFields, carrier: Option<&str>) -> Self {
        self.request.pickups.push(PickupRecord {
            id: Some(id.to_string()),
            client: Some(format!("Client {id}")),
            address: Some(format!("{id} Pickup Lane")),
            dates,
            carrier: carrier.map(str::to_string),
        });
        self
    }

    pub fn delivery(mut self, id: &str, dates: DateFields) -> Self {
        self.request.deliveries.push(DeliveryRecord {
            id: Some(id.to_string()),
            client: Some(format!("Client {id}")),
            address: Some(format!("{id} Delivery Avenue")),
            dates,
        });
        self
    }

    pub fn transit(mut self, id: &str, material: &str, dates: DateFields) -> Self {
        self.request.transits.push(TransitRecord {
            id: Some(id.to_string()),
            material: Some(material.to_string()),
            origin_address: Some(format!("{id} Loading Dock")),
            destination_address: Some(format!("{id} Unloading Dock")),
            dates,
        });
        self
    }

    pub fn max_duration_hours(mut self, hours: f64) -> Self {
        self.request.constraints.max_duration_hours = Some(NumberOrText::Number(hours));
        self
    }

    pub fn constraints(mut self, constraints: Constraints) -> Self {
        self.request.constraints = constraints;
        self
    }

    pub fn build(self) -> PlanRequest {
        self.request
    }
}

impl Default for RequestBuilder {
    fn default() -> Self {
        Self::new()
    }
}
