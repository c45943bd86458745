//! The four profile writers and the helpers they share.
//!
//! Each writer is a function that takes the network, the export context, the terminals that have
//! a CGMES id and an open [`CimWriter`], writes the profile body after the header and returns.
//! None keeps state between calls.

pub mod eq;
pub mod ssh;
pub mod sv;
pub mod tp;

use super::context::ExportContext;
use super::error::ExportResult;
use super::profile::Profile;
use super::writer::CimWriter;
use gridcim_core::{
    Diagnostics, EnergySource, LoadKind, Network, PhaseTapChanger, RatioTapChanger, SwitchKind,
    TerminalRef,
};
use std::collections::HashMap;
use std::io::Write;
use tracing::error;

/// Open the document and write its `md:FullModel` header
pub(crate) fn begin_document<W: Write>(
    profile: Profile,
    context: &ExportContext,
    writer: &mut CimWriter<W>,
) -> ExportResult<()> {
    writer.start_document()?;
    writer.write_model_header(
        profile,
        context.model_description(profile),
        context.scenario_time(),
        context.created(),
    )
}

/// A terminal paired with its CGMES id
pub(crate) type IdentifiedTerminal<'a> = (TerminalRef<'a>, String);

/// Terminals paired with their CGMES ids. Terminals without an id are dropped and reported once
/// per export, however many profiles are written against `context`.
pub(crate) fn identified_terminals<'a>(
    network: &'a Network,
    context: &mut ExportContext,
    diag: &mut Diagnostics,
) -> Vec<IdentifiedTerminal<'a>> {
    let mut identified = Vec::new();
    for terminal in network.terminals() {
        if let Some(id) = context.terminal_id(&terminal) {
            identified.push((terminal, id));
            continue;
        }
        if !context.note_unidentified_terminal(&terminal) {
            continue;
        }
        error!(
            equipment = terminal.equipment_id,
            side = terminal.sequence_number,
            "No CGMES terminal id"
        );
        diag.add_error_with_entity(
            "terminal",
            &format!(
                "Terminal {} of {} '{}' has no CGMES id",
                terminal.sequence_number,
                terminal.kind.label(),
                terminal.equipment_id
            ),
            terminal.equipment_id,
        );
    }
    identified
}

/// `(equipment id, sequence number) -> terminal id`
pub(crate) type TerminalIds = HashMap<(String, u8), String>;

pub(crate) fn terminal_index(terminals: &[IdentifiedTerminal<'_>]) -> TerminalIds {
    terminals
        .iter()
        .map(|(t, id)| ((t.equipment_id.to_string(), t.sequence_number), id.clone()))
        .collect()
}

pub(crate) fn load_class(kind: LoadKind) -> &'static str {
    match kind {
        LoadKind::EnergyConsumer => "EnergyConsumer",
        LoadKind::ConformLoad => "ConformLoad",
        LoadKind::NonConformLoad => "NonConformLoad",
    }
}

pub(crate) fn generating_unit_class(source: EnergySource) -> &'static str {
    match source {
        EnergySource::Hydro => "HydroGeneratingUnit",
        EnergySource::Thermal => "ThermalGeneratingUnit",
        EnergySource::Nuclear => "NuclearGeneratingUnit",
        EnergySource::Wind => "WindGeneratingUnit",
        EnergySource::Solar => "SolarGeneratingUnit",
        EnergySource::Other => "GeneratingUnit",
    }
}

pub(crate) fn switch_class(kind: SwitchKind) -> &'static str {
    match kind {
        SwitchKind::Breaker => "Breaker",
        SwitchKind::Disconnector => "Disconnector",
        SwitchKind::LoadBreakSwitch => "LoadBreakSwitch",
    }
}

pub(crate) fn generating_unit_id(context: &ExportContext, generator_id: &str) -> String {
    context.derived_id(&format!("{}_GU", generator_id))
}

pub(crate) fn transformer_end_id(context: &ExportContext, twt_id: &str, end: u8) -> String {
    context.derived_id(&format!("{}_PTE{}", twt_id, end))
}

pub(crate) fn ratio_tap_changer_id(
    context: &ExportContext,
    twt_id: &str,
    rtc: &RatioTapChanger,
) -> String {
    rtc.id
        .clone()
        .unwrap_or_else(|| context.derived_id(&format!("{}_RTC", twt_id)))
}

pub(crate) fn phase_tap_changer_id(
    context: &ExportContext,
    twt_id: &str,
    ptc: &PhaseTapChanger,
) -> String {
    ptc.id
        .clone()
        .unwrap_or_else(|| context.derived_id(&format!("{}_PTC", twt_id)))
}
