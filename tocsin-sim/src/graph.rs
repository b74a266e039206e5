//! Propagation graph: who forwards to whom, and how long each hop takes.

use std::collections::HashMap;

use tocsin_core::{DeviceId, Propagation, Tick};

/// Outgoing hop from a device.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Link {
    /// Receiving device
    pub to: DeviceId,
    /// Ticks between sending and delivery
    pub delay: Tick,
}

/// Static directed multigraph of propagation links.
///
/// Parallel links between the same pair of devices are kept; each one
/// delivers its own copy of every message. Devices are not checked against
/// any registry.
#[derive(Debug, Clone, Default)]
pub struct PropagationGraph {
    links: HashMap<DeviceId, Vec<Link>>,
    link_count: usize,
}

impl PropagationGraph {
    /// Creates an empty graph.
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a link. Links from one device keep insertion order.
    pub fn add_link(&mut self, from: DeviceId, to: DeviceId, delay: Tick) {
        self.links.entry(from).or_default().push(Link { to, delay });
        self.link_count += 1;
    }

    /// Returns outgoing links of `device` in declaration order.
    pub fn links_from(&self, device: DeviceId) -> &[Link] {
        self.links.get(&device).map(Vec::as_slice).unwrap_or(&[])
    }

    /// Total number of links, parallel ones included.
    pub fn link_count(&self) -> usize {
        self.link_count
    }

    /// Devices with at least one outgoing link, in ascending order.
    pub fn senders(&self) -> Vec<DeviceId> {
        let mut senders: Vec<DeviceId> = self.links.keys().copied().collect();
        senders.sort();
        senders
    }
}

impl<'a> FromIterator<&'a Propagation> for PropagationGraph {
    fn from_iter<I: IntoIterator<Item = &'a Propagation>>(iter: I) -> Self {
        let mut graph = Self::new();
        for propagation in iter {
            graph.add_link(propagation.from, propagation.to, propagation.delay);
        }
        graph
    }
}

#[cfg(test)]
mod tests {
    use tocsin_core::ScenarioConfig;

    use super::*;

    #[test]
    fn test_links_keep_declaration_order() {
        let mut graph = PropagationGraph::new();
        graph.add_link(DeviceId(1), DeviceId(3), 30);
        graph.add_link(DeviceId(1), DeviceId(2), 10);
        graph.add_link(DeviceId(2), DeviceId(1), 5);

        let targets: Vec<DeviceId> = graph.links_from(DeviceId(1)).iter().map(|l| l.to).collect();
        assert_eq!(targets, vec![DeviceId(3), DeviceId(2)]);
        assert_eq!(graph.link_count(), 3);
    }

    #[test]
    fn test_parallel_links_are_not_merged() {
        let scenario = ScenarioConfig::new(20)
            .with_propagation(1, 2, 5)
            .with_propagation(1, 2, 5);
        let graph: PropagationGraph = scenario.propagations.iter().collect();

        assert_eq!(graph.links_from(DeviceId(1)).len(), 2);
    }

    #[test]
    fn test_unknown_device_has_no_links() {
        let graph = PropagationGraph::new();
        assert!(graph.links_from(DeviceId(7)).is_empty());
        assert!(graph.senders().is_empty());
    }

    #[test]
    fn test_senders_are_sorted() {
        let mut graph = PropagationGraph::new();
        graph.add_link(DeviceId(9), DeviceId(1), 1);
        graph.add_link(DeviceId(2), DeviceId(1), 1);
        assert_eq!(graph.senders(), vec![DeviceId(2), DeviceId(9)]);
    }
}
