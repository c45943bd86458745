//! State variables (SV) profile: topological islands, voltages, flows, shunt sections, tap steps
//! and equipment status.
//!
//! Every topological node written in TP gets exactly one `SvVoltage`. Boundary nodes reached by a
//! dangling line get the boundary voltage and are marked as mapped. Whatever remains unmapped
//! afterwards gets a zero voltage.

use super::{phase_tap_changer_id, ratio_tap_changer_id, IdentifiedTerminal};
use crate::exporters::cgmes::context::ExportContext;
use crate::exporters::cgmes::error::ExportResult;
use crate::exporters::cgmes::naming::random_id;
use crate::exporters::cgmes::topology::TopologyResolver;
use crate::exporters::cgmes::writer::CimWriter;
use gridcim_core::{Diagnostics, Network};
use std::collections::HashSet;
use std::io::Write;
use tracing::{debug, warn};

pub fn write<W: Write>(
    network: &Network,
    context: &mut ExportContext,
    terminals: &[IdentifiedTerminal<'_>],
    writer: &mut CimWriter<W>,
    diag: &mut Diagnostics,
) -> ExportResult<()> {
    let mut voltages: Vec<(String, f64, f64)> = Vec::new();
    let mut seen = HashSet::new();
    {
        let resolver = TopologyResolver::new(context, network);
        let islands = resolver.build_islands(network);
        let angle_references = resolver.build_angle_references(network, diag);

        for (key, nodes) in &islands {
            let Some(angle_reference) = angle_references.get(key) else {
                debug!(island = %key, nodes = nodes.len(), "Island without angle reference");
                diag.add_warning(
                    "topology",
                    &format!(
                        "Topological island of {} has no angle reference, not exported",
                        key
                    ),
                );
                continue;
            };
            let id = random_id();
            writer.start_object("TopologicalIsland", &id)?;
            writer.identified_object(&id, angle_reference)?;
            writer.reference("TopologicalIsland", "AngleRefTopologicalNode", angle_reference)?;
            for node in nodes {
                writer.reference("TopologicalIsland", "TopologicalNodes", node)?;
            }
            writer.end_object("TopologicalIsland")?;
        }

        for bus in &network.buses {
            let Some(nodes) = resolver.nodes_for_bus(&bus.id) else {
                continue;
            };
            for node in nodes.iter() {
                if seen.insert(node.clone()) {
                    voltages.push((node.clone(), bus.v.value(), bus.angle.value()));
                }
            }
        }
    }

    for (node, v, angle) in &voltages {
        write_voltage(writer, node, *v, *angle)?;
    }

    for dl in &network.dangling_lines {
        let Some(node) = &dl.boundary_topological_node else {
            continue;
        };
        if seen.insert(node.clone()) {
            write_voltage(writer, node, dl.boundary_v.value(), dl.boundary_angle.value())?;
        }
        context.mark_mapped(node);
    }

    let unmapped: Vec<String> = context
        .unmapped_topological_nodes()
        .iter()
        .filter(|node| !seen.contains(*node))
        .cloned()
        .collect();
    for node in &unmapped {
        write_voltage(writer, node, 0.0, 0.0)?;
    }

    for (terminal, id) in terminals {
        if !terminal.is_connected() || !(terminal.p.is_finite() || terminal.q.is_finite()) {
            continue;
        }
        let sv_id = random_id();
        writer.start_object("SvPowerFlow", &sv_id)?;
        if terminal.p.is_finite() {
            writer.double("SvPowerFlow", "p", terminal.p.value())?;
        }
        if terminal.q.is_finite() {
            writer.double("SvPowerFlow", "q", terminal.q.value())?;
        }
        writer.reference("SvPowerFlow", "Terminal", id)?;
        writer.end_object("SvPowerFlow")?;
    }

    for shunt in &network.shunt_compensators {
        let sv_id = random_id();
        writer.start_object("SvShuntCompensatorSections", &sv_id)?;
        writer.reference("SvShuntCompensatorSections", "ShuntCompensator", &shunt.id)?;
        writer.double("SvShuntCompensatorSections", "sections", shunt.section_count.into())?;
        writer.end_object("SvShuntCompensatorSections")?;
    }

    for twt in &network.two_windings_transformers {
        let ratio = twt
            .ratio_tap_changer
            .as_ref()
            .map(|rtc| (ratio_tap_changer_id(context, &twt.id, rtc), rtc.tap_position));
        let phase = twt
            .phase_tap_changer
            .as_ref()
            .map(|ptc| (phase_tap_changer_id(context, &twt.id, ptc), ptc.tap_position));
        let steps = ratio.into_iter().chain(phase);
        for (tap_changer_id, position) in steps {
            let sv_id = random_id();
            writer.start_object("SvTapStep", &sv_id)?;
            writer.double("SvTapStep", "position", position.into())?;
            writer.reference("SvTapStep", "TapChanger", &tap_changer_id)?;
            writer.end_object("SvTapStep")?;
        }
    }

    write_status(network, writer)?;

    if !unmapped.is_empty() {
        warn!(
            count = unmapped.len(),
            "Topological nodes not matched to any bus were given a zero voltage"
        );
    }

    Ok(())
}

fn write_voltage<W: Write>(
    writer: &mut CimWriter<W>,
    node: &str,
    v: f64,
    angle: f64,
) -> ExportResult<()> {
    let id = random_id();
    writer.start_object("SvVoltage", &id)?;
    writer.double("SvVoltage", "angle", angle)?;
    writer.double("SvVoltage", "v", v)?;
    writer.reference("SvVoltage", "TopologicalNode", node)?;
    writer.end_object("SvVoltage")
}

/// One `SvStatus` per conducting equipment: in service when any of its terminals is connected
fn write_status<W: Write>(network: &Network, writer: &mut CimWriter<W>) -> ExportResult<()> {
    let terminals = network.terminals();
    let mut start = 0;
    while start < terminals.len() {
        let equipment_id = terminals[start].equipment_id;
        let end = terminals[start..]
            .iter()
            .position(|t| t.equipment_id != equipment_id)
            .map_or(terminals.len(), |offset| start + offset);
        let in_service = terminals[start..end].iter().any(|t| t.is_connected());

        let id = random_id();
        writer.start_object("SvStatus", &id)?;
        writer.boolean("SvStatus", "inService", in_service)?;
        writer.reference("SvStatus", "ConductingEquipment", equipment_id)?;
        writer.end_object("SvStatus")?;

        start = end;
    }
    Ok(())
}
