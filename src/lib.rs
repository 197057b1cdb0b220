//! daytour-planner
//!
//! Builds a single-vehicle day tour between a carrier depot, a treatment site
//! and a set of pickups, deliveries and transits, and picks the best carrier.

pub mod traits;
pub mod error;
pub mod model;
pub mod registry;
pub mod segment;
pub mod calendar;
pub mod sequence;
pub mod solver;
pub mod format;
pub mod request;
pub mod planner;
pub mod synthetic;
pub mod google;
