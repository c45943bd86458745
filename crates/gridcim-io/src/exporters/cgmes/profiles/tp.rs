//! Topology (TP) profile: topological nodes and the node each terminal connects to.

use super::IdentifiedTerminal;
use crate::exporters::cgmes::context::ExportContext;
use crate::exporters::cgmes::error::ExportResult;
use crate::exporters::cgmes::topology::TopologyResolver;
use crate::exporters::cgmes::writer::CimWriter;
use gridcim_core::Network;
use std::collections::{HashMap, HashSet};
use std::io::Write;
use tracing::debug;

pub fn write<W: Write>(
    network: &Network,
    context: &ExportContext,
    terminals: &[IdentifiedTerminal<'_>],
    writer: &mut CimWriter<W>,
) -> ExportResult<()> {
    let resolver = TopologyResolver::new(context, network);

    let mut written = HashSet::new();
    for bus in &network.buses {
        let Some(nodes) = resolver.nodes_for_bus(&bus.id) else {
            debug!(bus = %bus.id, "Bus has no topological node");
            continue;
        };
        let base_voltage = network
            .voltage_level(&bus.voltage_level_id)
            .map(|vl| context.base_voltage_id(vl.nominal_v.value()));
        for node in nodes.iter() {
            if !written.insert(node.clone()) {
                continue;
            }
            let name = if bus.name.is_empty() { node } else { &bus.name };
            writer.start_object("TopologicalNode", node)?;
            writer.identified_object(node, name)?;
            writer.reference(
                "TopologicalNode",
                "ConnectivityNodeContainer",
                &bus.voltage_level_id,
            )?;
            if let Some(base_voltage) = &base_voltage {
                writer.reference("TopologicalNode", "BaseVoltage", base_voltage)?;
            }
            writer.end_object("TopologicalNode")?;
        }
    }

    // Node of each bus, resolved once
    let mut bus_nodes: HashMap<&str, Option<String>> = HashMap::new();
    for (terminal, id) in terminals {
        let Some(bus_id) = terminal.bus else {
            debug!(terminal = %id, "Disconnected terminal left out of TP");
            continue;
        };
        let node = bus_nodes.entry(bus_id).or_insert_with(|| {
            resolver
                .nodes_for_bus(bus_id)
                .and_then(|nodes| TopologyResolver::canonical_node(&nodes).map(str::to_string))
        });
        let Some(node) = node else {
            continue;
        };
        writer.start_object_about("Terminal", id)?;
        writer.reference("Terminal", "TopologicalNode", node)?;
        writer.end_object("Terminal")?;
    }

    Ok(())
}
