//! Segment generator: the finite library of legal sub-tour shapes.
//!
//! A segment leaves an origin node (the vehicle's current position) and visits
//! an ordered list of stops. Start shapes leave the depot, middle shapes leave
//! the site, end shapes return to the depot from wherever the vehicle stands.
//!
//! Two domain rules shape the library:
//! - both ends of a transit always appear together, origin first;
//! - the vehicle is empty after unloading a transit, so a transit destination
//!   is never followed directly by the site.

use tracing::debug;

use crate::model::{Role, TaskId};
use crate::registry::LocationRegistry;
use crate::traits::DistanceMatrix;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Shape {
    /// Depot → pickup → site.
    StartPickup,
    /// Depot → site, carrying nothing.
    StartSite,
    /// Depot → transit origin → transit destination.
    StartTransit,
    /// Depot → transit → pickup → site.
    StartTransitPickup,
    SitePickup,
    SiteDelivery,
    SiteDeliveryPickup,
    SiteTransitPickup,
    /// Site → transit → depot.
    SiteTransitEnd,
    SiteDeliveryTransitPickup,
    SiteDeliveryTransitEnd,
    SiteTwoTransitsPickup,
    SiteTwoTransitsEnd,
    EndFromSite,
    EndFromDelivery,
    EndFromTransit,
}

/// Which step of the sequence builder may use a shape.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    Start,
    Middle,
    End,
}

impl Shape {
    pub fn phase(self) -> Phase {
        match self {
            Shape::StartPickup
            | Shape::StartSite
            | Shape::StartTransit
            | Shape::StartTransitPickup => Phase::Start,
            Shape::EndFromSite | Shape::EndFromDelivery | Shape::EndFromTransit => Phase::End,
            _ => Phase::Middle,
        }
    }

    /// The depot → site start that serves no task.
    pub fn is_no_op(self) -> bool {
        self == Shape::StartSite
    }
}

/// Travel assumptions used to turn distances into durations.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TravelParams {
    pub average_speed_kmh: f64,
    /// Fixed handling time per task stop, in hours.
    pub operation_hours: f64,
}

/// One immutable sub-tour.
#[derive(Debug, Clone, PartialEq)]
pub struct Segment {
    pub shape: Shape,
    /// Node the vehicle leaves from.
    pub origin: usize,
    /// Nodes visited after the origin, in order.
    pub stops: Vec<usize>,
    /// Tasks served by the stops, each listed once.
    pub tasks: Vec<TaskId>,
    /// Non-anchor stops; both ends of a transit count.
    pub task_stops: usize,
    pub distance_m: u64,
    pub duration_h: f64,
}

impl Segment {
    /// Origin followed by every stop.
    pub fn path(&self) -> impl Iterator<Item = usize> + '_ {
        std::iter::once(self.origin).chain(self.stops.iter().copied())
    }

    /// Node the vehicle stands at once the segment is driven.
    pub fn destination(&self) -> usize {
        self.stops.last().copied().unwrap_or(self.origin)
    }
}

/// Every segment generated for one carrier run, in generation order.
#[derive(Debug, Clone, Default)]
pub struct SegmentLibrary {
    segments: Vec<Segment>,
}

impl SegmentLibrary {
    pub fn segments(&self) -> &[Segment] {
        &self.segments
    }

    pub fn len(&self) -> usize {
        self.segments.len()
    }

    pub fn is_empty(&self) -> bool {
        self.segments.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Segment> {
        self.segments.iter()
    }
}

struct Builder<'a> {
    registry: &'a LocationRegistry,
    matrix: &'a DistanceMatrix,
    params: TravelParams,
    segments: Vec<Segment>,
}

impl Builder<'_> {
    fn add(&mut self, shape: Shape, path: &[usize]) {
        let Some((&origin, stops)) = path.split_first() else {
            return;
        };

        let distance_m: u64 = path
            .windows(2)
            .map(|leg| self.matrix[leg[0]][leg[1]])
            .sum();

        let mut tasks: Vec<TaskId> = Vec::new();
        let mut task_stops = 0usize;
        for node in stops.iter().filter_map(|&index| self.registry.node(index)) {
            if node.role.is_anchor() {
                continue;
            }
            task_stops += 1;
            if let Some(task) = node.task {
                if !tasks.contains(&task) {
                    tasks.push(task);
                }
            }
        }

        let travel_h = distance_m as f64 / 1000.0 / self.params.average_speed_kmh;
        let duration_h = travel_h + task_stops as f64 * self.params.operation_hours;

        self.segments.push(Segment {
            shape,
            origin,
            stops: stops.to_vec(),
            tasks,
            task_stops,
            distance_m,
            duration_h,
        });
    }
}

/// Enumerate the full segment library for one carrier run.
///
/// `matrix` must be square over the registry's nodes.
pub fn generate(
    registry: &LocationRegistry,
    matrix: &DistanceMatrix,
    params: TravelParams,
) -> SegmentLibrary {
    let depot = registry.depot();
    let site = registry.site();
    let pickups = registry.pickups();
    let deliveries = registry.deliveries();
    let transits = registry.transits();

    let mut b = Builder {
        registry,
        matrix,
        params,
        segments: Vec::new(),
    };

    // Start shapes.
    for &p in pickups {
        b.add(Shape::StartPickup, &[depot, p, site]);
    }
    b.add(Shape::StartSite, &[depot, site]);
    for t in transits {
        b.add(Shape::StartTransit, &[depot, t.origin, t.destination]);
        for &p in pickups {
            b.add(Shape::StartTransitPickup, &[depot, t.origin, t.destination, p, site]);
        }
    }

    // Middle shapes, all leaving the site.
    for &p in pickups {
        b.add(Shape::SitePickup, &[site, p, site]);
    }
    for &d in deliveries {
        b.add(Shape::SiteDelivery, &[site, d, site]);
    }
    for &d in deliveries {
        for &p in pickups {
            b.add(Shape::SiteDeliveryPickup, &[site, d, p, site]);
        }
    }
    for t in transits {
        for &p in pickups {
            b.add(Shape::SiteTransitPickup, &[site, t.origin, t.destination, p, site]);
        }
    }
    for t in transits {
        b.add(Shape::SiteTransitEnd, &[site, t.origin, t.destination, depot]);
    }
    for &d in deliveries {
        for t in transits {
            for &p in pickups {
                b.add(
                    Shape::SiteDeliveryTransitPickup,
                    &[site, d, t.origin, t.destination, p, site],
                );
            }
        }
    }
    for &d in deliveries {
        for t in transits {
            b.add(
                Shape::SiteDeliveryTransitEnd,
                &[site, d, t.origin, t.destination, depot],
            );
        }
    }
    for first in transits {
        for second in transits {
            if first.task == second.task {
                continue;
            }
            for &p in pickups {
                b.add(
                    Shape::SiteTwoTransitsPickup,
                    &[
                        site,
                        first.origin,
                        first.destination,
                        second.origin,
                        second.destination,
                        p,
                        site,
                    ],
                );
            }
            b.add(
                Shape::SiteTwoTransitsEnd,
                &[
                    site,
                    first.origin,
                    first.destination,
                    second.origin,
                    second.destination,
                    depot,
                ],
            );
        }
    }

    // End shapes.
    b.add(Shape::EndFromSite, &[site, depot]);
    for &d in deliveries {
        b.add(Shape::EndFromDelivery, &[d, depot]);
    }
    for t in transits {
        b.add(Shape::EndFromTransit, &[t.destination, depot]);
    }

    debug!(
        component = "segments",
        stage = "generate",
        segments = b.segments.len(),
        pickups = pickups.len(),
        deliveries = deliveries.len(),
        transits = transits.len(),
    );

    SegmentLibrary {
        segments: b.segments,
    }
}

/// Whether `segment` keeps both ends of every transit together, origin first.
pub fn transits_are_atomic(segment: &Segment, registry: &LocationRegistry) -> bool {
    registry.transits().iter().all(|pair| {
        let origin = segment.stops.iter().position(|&n| n == pair.origin);
        let destination = segment.stops.iter().position(|&n| n == pair.destination);
        match (origin, destination) {
            (Some(o), Some(d)) => o < d,
            (None, None) => true,
            _ => false,
        }
    })
}

/// Whether `segment` drives from a transit destination straight to the site.
pub fn returns_empty_to_site(segment: &Segment, registry: &LocationRegistry) -> bool {
    let path: Vec<usize> = segment.path().collect();
    path.windows(2).any(|leg| {
        let from = registry.node(leg[0]).map(|n| n.role);
        let to = registry.node(leg[1]).map(|n| n.role);
        from == Some(Role::TransitDestination) && to == Some(Role::Site)
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{Carrier, Delivery, Pickup, Site, Transit};
    use crate::synthetic::SyntheticMatrix;

    const PARAMS: TravelParams = TravelParams {
        average_speed_kmh: 70.0,
        operation_hours: 0.5,
    };

    fn registry(pickups: usize, deliveries: usize, transits: usize) -> LocationRegistry {
        let carrier = Carrier {
            id: "c".to_string(),
            name: "C".to_string(),
            address: "depot".to_string(),
        };
        let site = Site {
            name: "S".to_string(),
            address: "site".to_string(),
        };
        let p: Vec<Pickup> = (0..pickups)
            .map(|i| Pickup {
                id: format!("p{i}"),
                client: format!("P{i}"),
                address: format!("pickup {i}"),
                date: None,
                carrier: None,
            })
            .collect();
        let d: Vec<Delivery> = (0..deliveries)
            .map(|i| Delivery {
                id: format!("d{i}"),
                client: format!("D{i}"),
                address: format!("delivery {i}"),
                date: None,
            })
            .collect();
        let t: Vec<Transit> = (0..transits)
            .map(|i| Transit {
                id: format!("t{i}"),
                material: "sand".to_string(),
                origin: format!("from {i}"),
                destination: format!("to {i}"),
                date: None,
            })
            .collect();
        LocationRegistry::build(
            &carrier,
            &site,
            p.iter().enumerate(),
            d.iter().enumerate(),
            t.iter().enumerate(),
        )
    }

    fn library(registry: &LocationRegistry) -> SegmentLibrary {
        let matrix = SyntheticMatrix::matrix(registry.nodes().len());
        generate(registry, &matrix, PARAMS)
    }

    fn count(library: &SegmentLibrary, shape: Shape) -> usize {
        library.iter().filter(|s| s.shape == shape).count()
    }

    #[test]
    fn test_library_size() {
        let (p, d, t) = (2, 1, 2);
        let lib = library(&registry(p, d, t));
        let start = p + 1 + t + t * p;
        let middle = p + d + d * p + t * p + t + d * t * p + d * t + t * (t - 1) * (p + 1);
        let end = 1 + d + t;
        assert_eq!(lib.len(), start + middle + end);
        assert_eq!(count(&lib, Shape::SiteTwoTransitsPickup), 4);
        assert_eq!(count(&lib, Shape::SiteTwoTransitsEnd), 2);
    }

    #[test]
    fn test_single_pickup_durations() {
        let reg = registry(1, 0, 0);
        let lib = library(&reg);
        assert_eq!(lib.len(), 4);

        let start = lib
            .iter()
            .find(|s| s.shape == Shape::StartPickup)
            .expect("start pickup");
        // depot(0) -> pickup(2) = 120 km, pickup(2) -> site(1) = 70 km
        assert_eq!(start.distance_m, 190_000);
        assert!((start.duration_h - (190.0 / 70.0 + 0.5)).abs() < 1e-9);
        assert_eq!(start.tasks, vec![TaskId::Pickup(0)]);

        let no_op = lib
            .iter()
            .find(|s| s.shape == Shape::StartSite)
            .expect("start site");
        assert_eq!(no_op.distance_m, 70_000);
        assert!((no_op.duration_h - 1.0).abs() < 1e-9);
        assert!(no_op.tasks.is_empty());
    }

    #[test]
    fn test_transit_counts_two_operations() {
        let reg = registry(0, 0, 1);
        let lib = library(&reg);
        let start = lib
            .iter()
            .find(|s| s.shape == Shape::StartTransit)
            .expect("start transit");
        // depot(0) -> origin(2) = 120 km, origin(2) -> destination(3) = 70 km
        assert_eq!(start.distance_m, 190_000);
        assert!((start.duration_h - (190.0 / 70.0 + 1.0)).abs() < 1e-9);
        assert_eq!(start.tasks, vec![TaskId::Transit(0)]);
    }

    #[test]
    fn test_end_shape_origin_is_not_an_operation() {
        let reg = registry(0, 0, 1);
        let lib = library(&reg);
        let end = lib
            .iter()
            .find(|s| s.shape == Shape::EndFromTransit)
            .expect("end from transit");
        assert_eq!(end.origin, 3);
        assert_eq!(end.stops, vec![reg.depot()]);
        assert!(end.tasks.is_empty());
        assert!((end.duration_h - 170.0 / 70.0).abs() < 1e-9);
    }

    #[test]
    fn test_domain_rules_hold() {
        let reg = registry(2, 2, 3);
        let lib = library(&reg);
        for segment in lib.iter() {
            assert!(transits_are_atomic(segment, &reg), "{:?}", segment.shape);
            assert!(!returns_empty_to_site(segment, &reg), "{:?}", segment.shape);
        }
    }

    #[test]
    fn test_no_transit_chains_with_itself() {
        let reg = registry(1, 0, 1);
        let lib = library(&reg);
        assert_eq!(count(&lib, Shape::SiteTwoTransitsPickup), 0);
        assert_eq!(count(&lib, Shape::SiteTwoTransitsEnd), 0);
    }
}
