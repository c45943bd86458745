use crate::Network;
use petgraph::algo::connected_components;
use petgraph::graph::{NodeIndex, UnGraph};
use serde::Serialize;
use std::collections::{HashMap, HashSet, VecDeque};

/// Synchronous components of the bus-view topology.
///
/// Two buses are synchronous when they are linked by a path of connected AC branches (lines,
/// transformers, closed switches). HVDC links do not join components. Components are numbered
/// from 0 in bus enumeration order. A bus without any connected AC branch belongs to no
/// component.
#[derive(Debug, Clone, Default)]
pub struct SynchronousComponents {
    components: HashMap<String, usize>,
    count: usize,
}

impl SynchronousComponents {
    /// Labels components breadth-first, starting from each unvisited bus in network order.
    pub fn compute(network: &Network) -> Self {
        let graph = build_ac_graph(network);
        let mut visited = HashSet::new();
        let mut components = HashMap::new();
        let mut count = 0;

        for start in graph.node_indices() {
            if visited.contains(&start) || graph.neighbors(start).next().is_none() {
                continue;
            }
            let mut queue = VecDeque::new();
            queue.push_back(start);
            while let Some(node) = queue.pop_front() {
                if !visited.insert(node) {
                    continue;
                }
                components.insert(graph[node].to_string(), count);
                for neighbor in graph.neighbors(node) {
                    if !visited.contains(&neighbor) {
                        queue.push_back(neighbor);
                    }
                }
            }
            count += 1;
        }

        Self { components, count }
    }

    pub fn component_of(&self, bus_id: &str) -> Option<usize> {
        self.components.get(bus_id).copied()
    }

    pub fn component_count(&self) -> usize {
        self.count
    }
}

/// Summary of the bus-view topology reported by `gridcim inspect`.
#[derive(Debug, Clone, Serialize)]
pub struct TopologyStats {
    pub bus_count: usize,
    pub ac_edge_count: usize,
    /// Connected components, isolated buses included
    pub connected_components: usize,
    pub synchronous_components: usize,
    pub isolated_buses: usize,
}

pub fn topology_stats(network: &Network) -> TopologyStats {
    let graph = build_ac_graph(network);
    let isolated_buses = graph
        .node_indices()
        .filter(|&n| graph.neighbors(n).next().is_none())
        .count();
    TopologyStats {
        bus_count: graph.node_count(),
        ac_edge_count: graph.edge_count(),
        connected_components: connected_components(&graph),
        synchronous_components: SynchronousComponents::compute(network).component_count(),
        isolated_buses,
    }
}

fn build_ac_graph(network: &Network) -> UnGraph<&str, ()> {
    let mut graph = UnGraph::new_undirected();
    let mut index: HashMap<&str, NodeIndex> = HashMap::new();
    for bus in &network.buses {
        let node = graph.add_node(bus.id.as_str());
        index.insert(bus.id.as_str(), node);
    }

    let lines = network
        .lines
        .iter()
        .map(|l| (l.bus1.as_deref(), l.bus2.as_deref()));
    let transformers = network
        .two_windings_transformers
        .iter()
        .map(|t| (t.bus1.as_deref(), t.bus2.as_deref()));
    let closed_switches = network
        .switches
        .iter()
        .filter(|s| !s.open)
        .map(|s| (s.bus1.as_deref(), s.bus2.as_deref()));

    for (bus1, bus2) in lines.chain(transformers).chain(closed_switches) {
        let (Some(bus1), Some(bus2)) = (bus1, bus2) else {
            continue;
        };
        if bus1 == bus2 {
            continue;
        }
        if let (Some(&a), Some(&b)) = (index.get(bus1), index.get(bus2)) {
            graph.add_edge(a, b, ());
        }
    }

    graph
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{Bus, Kilovolts, Line, Substation, Switch, SwitchKind, VoltageLevel};
    use chrono::Utc;

    fn network_with_buses(ids: &[&str]) -> Network {
        let mut network = Network::new("test", Utc::now());
        network.substations.push(Substation::new("S1", "S1"));
        network
            .voltage_levels
            .push(VoltageLevel::new("VL1", "VL1", "S1", Kilovolts(110.0)));
        for id in ids {
            network.buses.push(Bus::new(id, "VL1"));
        }
        network
    }

    #[test]
    fn test_components_follow_bus_order() {
        let mut network = network_with_buses(&["A", "B", "C", "D"]);
        network
            .lines
            .push(Line::new("L1", "VL1", Some("C"), "VL1", Some("D")));
        network
            .lines
            .push(Line::new("L2", "VL1", Some("A"), "VL1", Some("B")));

        let components = SynchronousComponents::compute(&network);
        assert_eq!(components.component_count(), 2);
        assert_eq!(components.component_of("A"), Some(0));
        assert_eq!(components.component_of("B"), Some(0));
        assert_eq!(components.component_of("C"), Some(1));
        assert_eq!(components.component_of("D"), Some(1));
    }

    #[test]
    fn test_isolated_bus_has_no_component() {
        let mut network = network_with_buses(&["A", "B", "ISO"]);
        network
            .lines
            .push(Line::new("L1", "VL1", Some("A"), "VL1", Some("B")));

        let components = SynchronousComponents::compute(&network);
        assert_eq!(components.component_of("ISO"), None);
        assert_eq!(components.component_count(), 1);
    }

    #[test]
    fn test_disconnected_line_and_open_switch_do_not_join() {
        let mut network = network_with_buses(&["A", "B", "C"]);
        network
            .lines
            .push(Line::new("L1", "VL1", Some("A"), "VL1", None));
        network
            .lines
            .push(Line::new("L2", "VL1", Some("A"), "VL1", Some("C")));
        network.switches.push(Switch {
            id: "SW1".to_string(),
            name: "SW1".to_string(),
            voltage_level_id: "VL1".to_string(),
            kind: SwitchKind::Breaker,
            open: true,
            retained: true,
            bus1: Some("B".to_string()),
            bus2: Some("C".to_string()),
            aliases: Default::default(),
        });

        let components = SynchronousComponents::compute(&network);
        assert_eq!(components.component_of("A"), components.component_of("C"));
        assert_eq!(components.component_of("B"), None);
    }

    #[test]
    fn test_topology_stats() {
        let mut network = network_with_buses(&["A", "B", "ISO"]);
        network
            .lines
            .push(Line::new("L1", "VL1", Some("A"), "VL1", Some("B")));

        let stats = topology_stats(&network);
        assert_eq!(stats.bus_count, 3);
        assert_eq!(stats.ac_edge_count, 1);
        assert_eq!(stats.connected_components, 2);
        assert_eq!(stats.synchronous_components, 1);
        assert_eq!(stats.isolated_buses, 1);
    }
}
