//! Steady-state hypothesis (SSH) profile: set-points, switch states, terminal connection flags
//! and the merged regulating controls.

use super::{
    generating_unit_class, generating_unit_id, load_class, phase_tap_changer_id,
    ratio_tap_changer_id, switch_class, IdentifiedTerminal,
};
use crate::exporters::cgmes::context::ExportContext;
use crate::exporters::cgmes::error::ExportResult;
use crate::exporters::cgmes::regulating_control::{merge_regulating_controls, report_conflicts};
use crate::exporters::cgmes::writer::CimWriter;
use gridcim_core::{
    ConverterStationKind, Diagnostics, HvdcConverterStation, HvdcConvertersMode, Network,
    SvcRegulationMode,
};
use std::io::Write;

pub fn write<W: Write>(
    network: &Network,
    context: &ExportContext,
    terminals: &[IdentifiedTerminal<'_>],
    writer: &mut CimWriter<W>,
    diag: &mut Diagnostics,
) -> ExportResult<()> {
    for load in &network.loads {
        let class = load_class(load.kind);
        writer.start_object_about(class, &load.id)?;
        writer.double("EnergyConsumer", "p", load.p0.value())?;
        writer.double("EnergyConsumer", "q", load.q0.value())?;
        writer.end_object(class)?;
    }

    for gen in &network.generators {
        let unit_class = generating_unit_class(gen.energy_source);
        writer.start_object_about(unit_class, &generating_unit_id(context, &gen.id))?;
        writer.double("GeneratingUnit", "normalPF", 0.0)?;
        writer.end_object(unit_class)?;

        writer.start_object_about("SynchronousMachine", &gen.id)?;
        // Load sign convention: production is negative.
        writer.double("RotatingMachine", "p", -gen.target_p.value())?;
        writer.double("RotatingMachine", "q", -gen.target_q.value())?;
        writer.integer("SynchronousMachine", "referencePriority", 0)?;
        writer.enum_value(
            "SynchronousMachine",
            "operatingMode",
            "SynchronousMachineOperatingMode.generator",
        )?;
        writer.boolean(
            "RegulatingCondEq",
            "controlEnabled",
            gen.voltage_regulator_on,
        )?;
        writer.end_object("SynchronousMachine")?;
    }

    for shunt in &network.shunt_compensators {
        writer.start_object_about("LinearShuntCompensator", &shunt.id)?;
        writer.integer("ShuntCompensator", "sections", shunt.section_count.into())?;
        writer.boolean(
            "RegulatingCondEq",
            "controlEnabled",
            shunt.voltage_regulation_on,
        )?;
        writer.end_object("LinearShuntCompensator")?;
    }

    for svc in &network.static_var_compensators {
        writer.start_object_about("StaticVarCompensator", &svc.id)?;
        let q = if svc.reactive_power_setpoint.is_finite() {
            svc.reactive_power_setpoint.value()
        } else {
            0.0
        };
        writer.double("StaticVarCompensator", "q", q)?;
        writer.boolean(
            "RegulatingCondEq",
            "controlEnabled",
            svc.regulation_mode != SvcRegulationMode::Off,
        )?;
        writer.end_object("StaticVarCompensator")?;
    }

    for twt in &network.two_windings_transformers {
        if let Some(rtc) = &twt.ratio_tap_changer {
            writer.start_object_about(
                "RatioTapChanger",
                &ratio_tap_changer_id(context, &twt.id, rtc),
            )?;
            writer.integer("TapChanger", "step", rtc.tap_position.into())?;
            writer.boolean("TapChanger", "controlEnabled", rtc.regulating)?;
            writer.end_object("RatioTapChanger")?;
        }
        if let Some(ptc) = &twt.phase_tap_changer {
            writer.start_object_about(
                "PhaseTapChangerTabular",
                &phase_tap_changer_id(context, &twt.id, ptc),
            )?;
            writer.integer("TapChanger", "step", ptc.tap_position.into())?;
            writer.boolean("TapChanger", "controlEnabled", ptc.regulating)?;
            writer.end_object("PhaseTapChangerTabular")?;
        }
    }

    for switch in &network.switches {
        let class = switch_class(switch.kind);
        writer.start_object_about(class, &switch.id)?;
        writer.boolean("Switch", "open", switch.open)?;
        writer.end_object(class)?;
    }

    for station in &network.hvdc_converter_stations {
        write_converter(network, station, writer)?;
    }

    for (terminal, id) in terminals {
        writer.start_object_about("Terminal", id)?;
        writer.boolean("ACDCTerminal", "connected", terminal.is_connected())?;
        writer.end_object("Terminal")?;
    }

    let merged = merge_regulating_controls(network);
    report_conflicts(&merged, diag);
    for entry in &merged {
        let control = &entry.control;
        let class = control.kind.class_name();
        writer.start_object_about(class, &control.control_id)?;
        writer.boolean("RegulatingControl", "discrete", control.discrete)?;
        writer.boolean("RegulatingControl", "enabled", control.control_enabled)?;
        writer.double("RegulatingControl", "targetDeadband", control.target_deadband)?;
        writer.double("RegulatingControl", "targetValue", control.target_value)?;
        writer.enum_value(
            "RegulatingControl",
            "targetValueUnitMultiplier",
            &format!("UnitMultiplier.{}", control.unit_multiplier.cim_name()),
        )?;
        writer.end_object(class)?;
    }

    Ok(())
}

/// Whether `station` rectifies (AC to DC) under its line's converters mode
fn is_rectifier(network: &Network, station: &HvdcConverterStation) -> Option<bool> {
    let line_id = station.hvdc_line_id.as_deref()?;
    let line = network.hvdc_lines.iter().find(|l| l.id == line_id)?;
    let side_one = line.converter_station1_id == station.id;
    Some(match line.converters_mode {
        HvdcConvertersMode::SideOneRectifierSideTwoInverter => side_one,
        HvdcConvertersMode::SideOneInverterSideTwoRectifier => !side_one,
    })
}

fn write_converter<W: Write>(
    network: &Network,
    station: &HvdcConverterStation,
    writer: &mut CimWriter<W>,
) -> ExportResult<()> {
    let rectifier = is_rectifier(network, station);
    let setpoint = station
        .hvdc_line_id
        .as_deref()
        .and_then(|id| network.hvdc_lines.iter().find(|l| l.id == id))
        .map(|l| l.active_power_setpoint.value())
        .unwrap_or(0.0);
    let target_ppcc = match rectifier {
        Some(false) => -setpoint,
        _ => setpoint,
    };

    match &station.kind {
        ConverterStationKind::Lcc { power_factor } => {
            writer.start_object_about("CsConverter", &station.id)?;
            writer.double("ACDCConverter", "targetPpcc", target_ppcc)?;
            writer.double("ACDCConverter", "p", target_ppcc)?;
            let tan_phi = (1.0 / (power_factor * power_factor) - 1.0).max(0.0).sqrt();
            let q = target_ppcc.abs() * tan_phi;
            // power factor 0 or unknown
            if q.is_finite() {
                writer.double("ACDCConverter", "q", q)?;
            }
            let mode = if rectifier == Some(false) {
                "CsOperatingModeKind.inverter"
            } else {
                "CsOperatingModeKind.rectifier"
            };
            writer.enum_value("CsConverter", "operatingMode", mode)?;
            writer.enum_value("CsConverter", "pPccControl", "CsPpccControlKind.activePower")?;
            writer.end_object("CsConverter")?;
        }
        ConverterStationKind::Vsc {
            voltage_regulator_on,
            voltage_setpoint,
            reactive_power_setpoint,
            ..
        } => {
            writer.start_object_about("VsConverter", &station.id)?;
            writer.double("ACDCConverter", "targetPpcc", target_ppcc)?;
            writer.double("ACDCConverter", "p", target_ppcc)?;
            if *voltage_regulator_on {
                writer.enum_value("VsConverter", "qPccControl", "VsQpccControlKind.voltagePcc")?;
                writer.double("VsConverter", "targetUpcc", voltage_setpoint.value())?;
            } else {
                writer.enum_value("VsConverter", "qPccControl", "VsQpccControlKind.reactivePcc")?;
                writer.double("VsConverter", "targetQpcc", reactive_power_setpoint.value())?;
            }
            writer.enum_value("VsConverter", "pPccControl", "VsPpccControlKind.pPcc")?;
            writer.end_object("VsConverter")?;
        }
    }
    Ok(())
}
