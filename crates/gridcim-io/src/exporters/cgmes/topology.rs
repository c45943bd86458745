//! Bus to topological-node resolution and topological island detection for TP and SV.

use super::context::ExportContext;
use gridcim_core::{Diagnostics, Network, SynchronousComponents};
use std::borrow::Cow;
use std::collections::{BTreeMap, BTreeSet};
use std::fmt;
use tracing::{debug, warn};

const CATEGORY: &str = "topology";

/// Identity of a topological island
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum IslandKey {
    /// Synchronous component number
    Component(usize),
    /// A bus outside any synchronous component forms its own island
    Bus(String),
}

impl fmt::Display for IslandKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            IslandKey::Component(n) => write!(f, "component {}", n),
            IslandKey::Bus(id) => write!(f, "bus {}", id),
        }
    }
}

/// Answers topology questions against one context and one network snapshot.
///
/// Holds no state besides the synchronous components computed at construction.
pub struct TopologyResolver<'a> {
    context: &'a ExportContext,
    components: SynchronousComponents,
}

impl<'a> TopologyResolver<'a> {
    pub fn new(context: &'a ExportContext, network: &Network) -> Self {
        Self {
            context,
            components: SynchronousComponents::compute(network),
        }
    }

    pub fn nodes_for_bus(&self, bus_id: &str) -> Option<Cow<'a, BTreeSet<String>>> {
        self.context.topological_nodes_for_bus(bus_id)
    }

    pub fn island_key(&self, bus_id: &str) -> IslandKey {
        match self.components.component_of(bus_id) {
            Some(component) => IslandKey::Component(component),
            None => IslandKey::Bus(bus_id.to_string()),
        }
    }

    /// Representative node of a bus's node set: the first in iteration order.
    pub fn canonical_node(nodes: &BTreeSet<String>) -> Option<&str> {
        nodes.iter().next().map(String::as_str)
    }

    /// Group the topological nodes of every mapped bus by island.
    ///
    /// Buses without topological nodes contribute nothing.
    pub fn build_islands(&self, network: &Network) -> BTreeMap<IslandKey, BTreeSet<String>> {
        let mut islands: BTreeMap<IslandKey, BTreeSet<String>> = BTreeMap::new();
        for bus in &network.buses {
            let Some(nodes) = self.nodes_for_bus(&bus.id) else {
                continue;
            };
            if nodes.is_empty() {
                continue;
            }
            islands
                .entry(self.island_key(&bus.id))
                .or_default()
                .extend(nodes.iter().cloned());
        }
        islands
    }

    /// One angle-reference node per island, taken from the voltage levels' slack terminals.
    ///
    /// Voltage levels are scanned in network order and the first slack terminal claiming an
    /// island wins. Rejected slack terminals are reported.
    pub fn build_angle_references(
        &self,
        network: &Network,
        diag: &mut Diagnostics,
    ) -> BTreeMap<IslandKey, String> {
        let mut references: BTreeMap<IslandKey, String> = BTreeMap::new();
        for vl in &network.voltage_levels {
            let Some(slack) = &vl.slack_terminal else {
                continue;
            };
            let Some(bus) = network.terminal_bus(&slack.equipment_id, slack.side) else {
                warn!(
                    voltage_level = %vl.id,
                    equipment = %slack.equipment_id,
                    "Slack terminal is not connected to a bus, ignored"
                );
                diag.add_warning_with_entity(
                    CATEGORY,
                    &format!(
                        "Slack terminal of '{}' is not connected to a bus",
                        slack.equipment_id
                    ),
                    &vl.id,
                );
                continue;
            };
            let Some(nodes) = self.nodes_for_bus(&bus.id) else {
                debug!(bus = %bus.id, "Slack bus has no topological node");
                continue;
            };
            let Some(node) = Self::canonical_node(&nodes) else {
                continue;
            };

            let key = self.island_key(&bus.id);
            if let Some(existing) = references.get(&key) {
                warn!(
                    island = %key,
                    kept = %existing,
                    ignored = node,
                    "Several slack terminals in one island, keeping the first"
                );
                diag.add_warning_with_entity(
                    CATEGORY,
                    &format!(
                        "Angle reference '{}' ignored: {} already references '{}'",
                        node, key, existing
                    ),
                    &vl.id,
                );
                continue;
            }
            references.insert(key, node.to_string());
        }
        references
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::exporters::cgmes::context::TopologyMappingPolicy;
    use crate::exporters::cgmes::options::ExportOptions;
    use chrono::Utc;
    use gridcim_core::{Bus, CgmesTopology, Kilovolts, Line, Load, Side, Substation, VoltageLevel};

    /// B1-B2 linked by a line, B3 isolated, B4-B5 linked by another line.
    fn network() -> Network {
        let mut network = Network::new("islands", Utc::now());
        network.substations.push(Substation::new("S1", "S1"));
        network
            .voltage_levels
            .push(VoltageLevel::new("VL1", "VL1", "S1", Kilovolts(400.0)));
        for id in ["B1", "B2", "B3", "B4", "B5"] {
            network.buses.push(Bus::new(id, "VL1"));
        }
        network
            .lines
            .push(Line::new("L12", "VL1", Some("B1"), "VL1", Some("B2")));
        network
            .lines
            .push(Line::new("L45", "VL1", Some("B4"), "VL1", Some("B5")));
        network
    }

    fn context(network: &Network, policy: TopologyMappingPolicy) -> ExportContext {
        let options = ExportOptions {
            topology_mapping_policy: Some(policy),
            ..ExportOptions::default()
        };
        ExportContext::new(network, &options).unwrap()
    }

    fn set(ids: &[&str]) -> BTreeSet<String> {
        ids.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_islands_partition_mapped_nodes() {
        let network = network();
        let ctx = context(&network, TopologyMappingPolicy::NoMapping);
        let resolver = TopologyResolver::new(&ctx, &network);

        let islands = resolver.build_islands(&network);
        assert_eq!(islands.len(), 3);
        assert_eq!(islands[&IslandKey::Component(0)], set(&["B1", "B2"]));
        assert_eq!(islands[&IslandKey::Bus("B3".to_string())], set(&["B3"]));
        assert_eq!(islands[&IslandKey::Component(1)], set(&["B4", "B5"]));

        let total: usize = islands.values().map(BTreeSet::len).sum();
        assert_eq!(total, network.buses.len());
    }

    #[test]
    fn test_unmapped_buses_are_skipped() {
        let mut network = network();
        network.cgmes_topology = Some(
            CgmesTopology::default()
                .with_bus("B1", &["TN1"])
                .with_bus("B2", &["TN1", "TN2"]),
        );
        let ctx = context(&network, TopologyMappingPolicy::MappingOnly);
        let resolver = TopologyResolver::new(&ctx, &network);

        let islands = resolver.build_islands(&network);
        assert_eq!(islands.len(), 1);
        assert_eq!(islands[&IslandKey::Component(0)], set(&["TN1", "TN2"]));
    }

    #[test]
    fn test_first_slack_terminal_wins() {
        let mut network = network();
        network
            .voltage_levels
            .push(VoltageLevel::new("VL2", "VL2", "S1", Kilovolts(400.0)));
        network.loads.push(Load::new("LD1", "VL1", Some("B1"), 1.0, 0.0));
        network.voltage_levels[0] =
            network.voltage_levels[0].clone().with_slack_terminal("LD1", None);
        network.voltage_levels[1] = network.voltage_levels[1]
            .clone()
            .with_slack_terminal("L12", Some(Side::Two));

        let ctx = context(&network, TopologyMappingPolicy::NoMapping);
        let resolver = TopologyResolver::new(&ctx, &network);
        let mut diag = Diagnostics::new();

        let references = resolver.build_angle_references(&network, &mut diag);
        assert_eq!(references.len(), 1);
        assert_eq!(references[&IslandKey::Component(0)], "B1");
        assert_eq!(diag.warning_count(), 1);
    }

    #[test]
    fn test_disconnected_slack_terminal_is_reported() {
        let mut network = network();
        network.loads.push(Load::new("LD1", "VL1", None, 1.0, 0.0));
        network.voltage_levels[0] =
            network.voltage_levels[0].clone().with_slack_terminal("LD1", None);

        let ctx = context(&network, TopologyMappingPolicy::NoMapping);
        let resolver = TopologyResolver::new(&ctx, &network);
        let mut diag = Diagnostics::new();

        assert!(resolver
            .build_angle_references(&network, &mut diag)
            .is_empty());
        assert_eq!(diag.warning_count(), 1);
    }

    #[test]
    fn test_isolated_bus_is_keyed_by_id() {
        let network = network();
        let ctx = context(&network, TopologyMappingPolicy::NoMapping);
        let resolver = TopologyResolver::new(&ctx, &network);

        assert_eq!(resolver.island_key("B3"), IslandKey::Bus("B3".to_string()));
        assert_eq!(resolver.island_key("B2"), IslandKey::Component(0));
    }

    #[test]
    fn test_canonical_node() {
        assert_eq!(TopologyResolver::canonical_node(&set(&["b", "a"])), Some("a"));
        assert_eq!(TopologyResolver::canonical_node(&BTreeSet::new()), None);
    }
}
