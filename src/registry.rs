//! Location registry: the indexed node list of one carrier run.
//!
//! Node positions double as distance-matrix indices. The depot is pushed
//! first and the site second, but callers find them through [`Role`] rather
//! than by position.

use tracing::debug;

use crate::model::{Carrier, DateConstraint, Delivery, Pickup, Role, Site, TaskId, Transit};

#[derive(Debug, Clone, PartialEq)]
pub struct Node {
    pub index: usize,
    pub role: Role,
    pub address: String,
    pub client: String,
    /// Record reference (carrier, pickup, delivery or transit id).
    pub reference: String,
    pub date: Option<DateConstraint>,
    /// Task served at this node. Both ends of a transit share one id.
    pub task: Option<TaskId>,
    /// Transit material, on transit nodes only.
    pub material: Option<String>,
}

/// Matrix indices of both ends of one transit.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TransitPair {
    pub task: TaskId,
    pub origin: usize,
    pub destination: usize,
}

#[derive(Debug, Clone)]
pub struct LocationRegistry {
    nodes: Vec<Node>,
    depot: usize,
    site: usize,
    pickups: Vec<usize>,
    deliveries: Vec<usize>,
    transits: Vec<TransitPair>,
}

impl LocationRegistry {
    /// Build the registry for `carrier`.
    ///
    /// Tasks are given with their request-wide index so that [`TaskId`]s stay
    /// comparable across carrier runs.
    pub fn build<'a>(
        carrier: &Carrier,
        site: &Site,
        pickups: impl IntoIterator<Item = (usize, &'a Pickup)>,
        deliveries: impl IntoIterator<Item = (usize, &'a Delivery)>,
        transits: impl IntoIterator<Item = (usize, &'a Transit)>,
    ) -> Self {
        let mut registry = Self {
            nodes: Vec::new(),
            depot: 0,
            site: 0,
            pickups: Vec::new(),
            deliveries: Vec::new(),
            transits: Vec::new(),
        };

        registry.depot = registry.push(Node {
            index: 0,
            role: Role::Depot,
            address: carrier.address.clone(),
            client: carrier.name.clone(),
            reference: carrier.id.clone(),
            date: None,
            task: None,
            material: None,
        });
        registry.site = registry.push(Node {
            index: 0,
            role: Role::Site,
            address: site.address.clone(),
            client: site.name.clone(),
            reference: String::new(),
            date: None,
            task: None,
            material: None,
        });

        for (i, pickup) in pickups {
            let index = registry.push(Node {
                index: 0,
                role: Role::Pickup,
                address: pickup.address.clone(),
                client: pickup.client.clone(),
                reference: pickup.id.clone(),
                date: pickup.date,
                task: Some(TaskId::Pickup(i)),
                material: None,
            });
            registry.pickups.push(index);
        }

        for (i, delivery) in deliveries {
            let index = registry.push(Node {
                index: 0,
                role: Role::Delivery,
                address: delivery.address.clone(),
                client: delivery.client.clone(),
                reference: delivery.id.clone(),
                date: delivery.date,
                task: Some(TaskId::Delivery(i)),
                material: None,
            });
            registry.deliveries.push(index);
        }

        for (i, transit) in transits {
            let task = TaskId::Transit(i);
            let origin = registry.push(Node {
                index: 0,
                role: Role::TransitOrigin,
                address: transit.origin.clone(),
                client: format!("Transit loading ({})", transit.material),
                reference: transit.id.clone(),
                date: transit.date,
                task: Some(task),
                material: Some(transit.material.clone()),
            });
            let destination = registry.push(Node {
                index: 0,
                role: Role::TransitDestination,
                address: transit.destination.clone(),
                client: format!("Transit unloading ({})", transit.material),
                reference: transit.id.clone(),
                date: transit.date,
                task: Some(task),
                material: Some(transit.material.clone()),
            });
            registry.transits.push(TransitPair {
                task,
                origin,
                destination,
            });
        }

        debug!(
            component = "registry",
            stage = "build",
            carrier = %carrier.id,
            nodes = registry.nodes.len(),
            pickups = registry.pickups.len(),
            deliveries = registry.deliveries.len(),
            transits = registry.transits.len(),
        );

        registry
    }

    fn push(&mut self, mut node: Node) -> usize {
        let index = self.nodes.len();
        node.index = index;
        self.nodes.push(node);
        index
    }

    pub fn nodes(&self) -> &[Node] {
        &self.nodes
    }

    /// Node at `index`, if any.
    pub fn node(&self, index: usize) -> Option<&Node> {
        self.nodes.get(index)
    }

    pub fn depot(&self) -> usize {
        self.depot
    }

    pub fn site(&self) -> usize {
        self.site
    }

    pub fn pickups(&self) -> &[usize] {
        &self.pickups
    }

    pub fn deliveries(&self) -> &[usize] {
        &self.deliveries
    }

    pub fn transits(&self) -> &[TransitPair] {
        &self.transits
    }

    /// Task identifiers present in this run.
    pub fn task_ids(&self) -> Vec<TaskId> {
        self.pickups
            .iter()
            .chain(&self.deliveries)
            .filter_map(|&index| self.nodes.get(index).and_then(|node| node.task))
            .chain(self.transits.iter().map(|pair| pair.task))
            .collect()
    }

    /// Addresses in matrix order.
    pub fn addresses(&self) -> Vec<String> {
        self.nodes.iter().map(|node| node.address.clone()).collect()
    }

    /// Whether every node of `path` admits `day`. Anchors always do.
    pub fn admits_day(&self, path: &[usize], day: chrono::NaiveDate) -> bool {
        path.iter()
            .filter_map(|&index| self.nodes.get(index))
            .filter(|node| !node.role.is_anchor())
            .all(|node| node.date.is_none_or(|date| date.admits(day)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn carrier() -> Carrier {
        Carrier {
            id: "c1".to_string(),
            name: "Carrier".to_string(),
            address: "depot street".to_string(),
        }
    }

    fn site() -> Site {
        Site {
            name: "Site".to_string(),
            address: "site street".to_string(),
        }
    }

    #[test]
    fn test_layout_and_roles() {
        let pickup = Pickup {
            id: "p".to_string(),
            client: "P".to_string(),
            address: "pickup street".to_string(),
            date: None,
            carrier: None,
        };
        let transit = Transit {
            id: "t".to_string(),
            material: "sand".to_string(),
            origin: "from".to_string(),
            destination: "to".to_string(),
            date: None,
        };
        let registry = LocationRegistry::build(
            &carrier(),
            &site(),
            [(3, &pickup)],
            Vec::<(usize, &Delivery)>::new(),
            [(0, &transit)],
        );

        assert_eq!(registry.nodes().len(), 5);
        assert_eq!(registry.node(registry.depot()).map(|n| n.role), Some(Role::Depot));
        assert_eq!(registry.node(registry.site()).map(|n| n.role), Some(Role::Site));
        assert_eq!(registry.pickups(), &[2]);
        assert_eq!(
            registry.transits(),
            &[TransitPair {
                task: TaskId::Transit(0),
                origin: 3,
                destination: 4
            }]
        );
        assert_eq!(
            registry.task_ids(),
            vec![TaskId::Pickup(3), TaskId::Transit(0)]
        );
        assert_eq!(
            registry.addresses(),
            vec!["depot street", "site street", "pickup street", "from", "to"]
        );
    }
}
