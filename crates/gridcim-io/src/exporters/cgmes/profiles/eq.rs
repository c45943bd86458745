//! Equipment (EQ) profile: containers, base voltages, conducting equipment, terminals and
//! regulating controls.

use super::{
    generating_unit_class, generating_unit_id, load_class, phase_tap_changer_id,
    ratio_tap_changer_id, switch_class, terminal_index, transformer_end_id, IdentifiedTerminal,
    TerminalIds,
};
use crate::exporters::cgmes::context::ExportContext;
use crate::exporters::cgmes::error::ExportResult;
use crate::exporters::cgmes::naming::format_double;
use crate::exporters::cgmes::regulating_control::merge_regulating_controls;
use crate::exporters::cgmes::writer::CimWriter;
use gridcim_core::{
    ConverterStationKind, Diagnostics, Kilovolts, Network, SvcRegulationMode,
    TwoWindingsTransformer,
};
use std::collections::HashSet;
use std::io::Write;
use tracing::warn;

pub fn write<W: Write>(
    network: &Network,
    context: &ExportContext,
    terminals: &[IdentifiedTerminal<'_>],
    writer: &mut CimWriter<W>,
    diag: &mut Diagnostics,
) -> ExportResult<()> {
    let terminal_ids = terminal_index(terminals);

    write_base_voltages(network, context, writer)?;
    write_containers(network, context, writer)?;
    write_injections(network, context, writer)?;
    write_branches(network, context, writer, &terminal_ids)?;
    write_hvdc(network, writer)?;

    for (terminal, id) in terminals {
        writer.start_object("Terminal", id)?;
        writer.identified_object(
            id,
            &format!("{}_{}", terminal.equipment_id, terminal.sequence_number),
        )?;
        writer.integer("ACDCTerminal", "sequenceNumber", terminal.sequence_number.into())?;
        writer.reference("Terminal", "ConductingEquipment", terminal.equipment_id)?;
        writer.end_object("Terminal")?;
    }

    for merged in merge_regulating_controls(network) {
        let control = &merged.control;
        let class = control.kind.class_name();
        writer.start_object(class, &control.control_id)?;
        writer.identified_object(&control.control_id, &control.control_id)?;
        writer.enum_value(
            "RegulatingControl",
            "mode",
            &format!("RegulatingControlModeKind.{}", control.mode.cim_name()),
        )?;
        let key = (control.equipment_id.clone(), control.side.sequence_number());
        match terminal_ids.get(&key) {
            Some(terminal_id) => writer.reference("RegulatingControl", "Terminal", terminal_id)?,
            None => {
                warn!(control = %control.control_id, "Regulating control has no terminal");
                diag.add_warning_with_entity(
                    "regulating-control",
                    &format!(
                        "No terminal for the control point of '{}'",
                        control.equipment_id
                    ),
                    &control.control_id,
                );
            }
        }
        writer.end_object(class)?;
    }

    Ok(())
}

fn write_base_voltages<W: Write>(
    network: &Network,
    context: &ExportContext,
    writer: &mut CimWriter<W>,
) -> ExportResult<()> {
    let mut written = HashSet::new();
    let nominal_voltages = network
        .voltage_levels
        .iter()
        .map(|vl| vl.nominal_v)
        .chain(network.hvdc_lines.iter().map(|l| l.nominal_v));
    for nominal_v in nominal_voltages {
        let id = context.base_voltage_id(nominal_v.value());
        if !written.insert(id.clone()) {
            continue;
        }
        writer.start_object("BaseVoltage", &id)?;
        writer.identified_object(&id, &format!("{} kV", format_double(nominal_v.value())))?;
        writer.double("BaseVoltage", "nominalVoltage", nominal_v.value())?;
        writer.end_object("BaseVoltage")?;
    }
    Ok(())
}

fn write_containers<W: Write>(
    network: &Network,
    context: &ExportContext,
    writer: &mut CimWriter<W>,
) -> ExportResult<()> {
    for substation in &network.substations {
        writer.start_object("Substation", &substation.id)?;
        writer.identified_object(&substation.id, &substation.name)?;
        writer.end_object("Substation")?;
    }
    for vl in &network.voltage_levels {
        writer.start_object("VoltageLevel", &vl.id)?;
        writer.identified_object(&vl.id, &vl.name)?;
        writer.reference("VoltageLevel", "Substation", &vl.substation_id)?;
        writer.reference(
            "VoltageLevel",
            "BaseVoltage",
            &context.base_voltage_id(vl.nominal_v.value()),
        )?;
        if let Some(low) = vl.low_voltage_limit.filter(|v| v.is_finite()) {
            writer.double("VoltageLevel", "lowVoltageLimit", low.value())?;
        }
        if let Some(high) = vl.high_voltage_limit.filter(|v| v.is_finite()) {
            writer.double("VoltageLevel", "highVoltageLimit", high.value())?;
        }
        writer.end_object("VoltageLevel")?;
    }
    Ok(())
}

fn equipment<W: Write>(
    writer: &mut CimWriter<W>,
    class: &str,
    id: &str,
    name: &str,
    container_id: &str,
) -> ExportResult<()> {
    writer.start_object(class, id)?;
    writer.identified_object(id, if name.is_empty() { id } else { name })?;
    writer.reference("Equipment", "EquipmentContainer", container_id)
}

fn nominal_v(network: &Network, voltage_level_id: &str) -> Kilovolts {
    network
        .voltage_level(voltage_level_id)
        .map(|vl| vl.nominal_v)
        .unwrap_or_else(Kilovolts::unknown)
}

fn write_injections<W: Write>(
    network: &Network,
    context: &ExportContext,
    writer: &mut CimWriter<W>,
) -> ExportResult<()> {
    for load in &network.loads {
        let class = load_class(load.kind);
        equipment(writer, class, &load.id, &load.name, &load.voltage_level_id)?;
        writer.end_object(class)?;
    }

    for gen in &network.generators {
        let unit_class = generating_unit_class(gen.energy_source);
        let unit_id = generating_unit_id(context, &gen.id);
        writer.start_object(unit_class, &unit_id)?;
        writer.identified_object(&unit_id, &gen.id)?;
        writer.double("GeneratingUnit", "minOperatingP", gen.min_p.value())?;
        writer.double("GeneratingUnit", "maxOperatingP", gen.max_p.value())?;
        writer.double("GeneratingUnit", "initialP", gen.target_p.value())?;
        writer.reference("Equipment", "EquipmentContainer", &gen.voltage_level_id)?;
        writer.end_object(unit_class)?;

        equipment(writer, "SynchronousMachine", &gen.id, &gen.name, &gen.voltage_level_id)?;
        writer.reference("RotatingMachine", "GeneratingUnit", &unit_id)?;
        writer.enum_value("SynchronousMachine", "type", "SynchronousMachineKind.generator")?;
        if let Some(control_id) = &gen.regulating_control_id {
            writer.reference("RegulatingCondEq", "RegulatingControl", control_id)?;
        }
        writer.end_object("SynchronousMachine")?;
    }

    for shunt in &network.shunt_compensators {
        equipment(
            writer,
            "LinearShuntCompensator",
            &shunt.id,
            &shunt.name,
            &shunt.voltage_level_id,
        )?;
        writer.integer(
            "ShuntCompensator",
            "maximumSections",
            shunt.maximum_section_count.into(),
        )?;
        writer.integer("ShuntCompensator", "normalSections", shunt.section_count.into())?;
        writer.double(
            "ShuntCompensator",
            "nomU",
            nominal_v(network, &shunt.voltage_level_id).value(),
        )?;
        writer.double("LinearShuntCompensator", "bPerSection", shunt.b_per_section.value())?;
        writer.double("LinearShuntCompensator", "gPerSection", shunt.g_per_section.value())?;
        if let Some(control_id) = &shunt.regulating_control_id {
            writer.reference("RegulatingCondEq", "RegulatingControl", control_id)?;
        }
        writer.end_object("LinearShuntCompensator")?;
    }

    for svc in &network.static_var_compensators {
        equipment(writer, "StaticVarCompensator", &svc.id, &svc.name, &svc.voltage_level_id)?;
        if svc.b_max.value() != 0.0 {
            writer.double("StaticVarCompensator", "capacitiveRating", 1.0 / svc.b_max.value())?;
        }
        if svc.b_min.value() != 0.0 {
            writer.double("StaticVarCompensator", "inductiveRating", 1.0 / svc.b_min.value())?;
        }
        let mode = match svc.regulation_mode {
            SvcRegulationMode::ReactivePower => "SVCControlMode.reactivePower",
            SvcRegulationMode::Voltage | SvcRegulationMode::Off => "SVCControlMode.voltage",
        };
        writer.enum_value("StaticVarCompensator", "sVCControlMode", mode)?;
        if svc.voltage_setpoint.is_finite() {
            writer.double(
                "StaticVarCompensator",
                "voltageSetPoint",
                svc.voltage_setpoint.value(),
            )?;
        }
        if let Some(control_id) = &svc.regulating_control_id {
            writer.reference("RegulatingCondEq", "RegulatingControl", control_id)?;
        }
        writer.end_object("StaticVarCompensator")?;
    }

    for dl in &network.dangling_lines {
        equipment(writer, "ACLineSegment", &dl.id, &dl.name, &dl.voltage_level_id)?;
        writer.double("ACLineSegment", "r", dl.r.value())?;
        writer.double("ACLineSegment", "x", dl.x.value())?;
        writer.double("ACLineSegment", "gch", dl.g.value())?;
        writer.double("ACLineSegment", "bch", dl.b.value())?;
        writer.reference(
            "ConductingEquipment",
            "BaseVoltage",
            &context.base_voltage_id(nominal_v(network, &dl.voltage_level_id).value()),
        )?;
        writer.end_object("ACLineSegment")?;
    }

    Ok(())
}

fn write_branches<W: Write>(
    network: &Network,
    context: &ExportContext,
    writer: &mut CimWriter<W>,
    terminal_ids: &TerminalIds,
) -> ExportResult<()> {
    for line in &network.lines {
        // Lines between two voltage levels belong to no single container; use side one's.
        equipment(writer, "ACLineSegment", &line.id, &line.name, &line.voltage_level1_id)?;
        writer.double("ACLineSegment", "r", line.r.value())?;
        writer.double("ACLineSegment", "x", line.x.value())?;
        writer.double("ACLineSegment", "gch", (line.g1 + line.g2).value())?;
        writer.double("ACLineSegment", "bch", (line.b1 + line.b2).value())?;
        writer.reference(
            "ConductingEquipment",
            "BaseVoltage",
            &context.base_voltage_id(nominal_v(network, &line.voltage_level1_id).value()),
        )?;
        writer.end_object("ACLineSegment")?;
    }

    for twt in &network.two_windings_transformers {
        write_transformer(network, context, writer, twt, terminal_ids)?;
    }

    for switch in &network.switches {
        let class = switch_class(switch.kind);
        equipment(writer, class, &switch.id, &switch.name, &switch.voltage_level_id)?;
        writer.boolean("Switch", "normalOpen", switch.open)?;
        writer.boolean("Switch", "retained", switch.retained)?;
        writer.end_object(class)?;
    }

    Ok(())
}

fn write_transformer<W: Write>(
    network: &Network,
    context: &ExportContext,
    writer: &mut CimWriter<W>,
    twt: &TwoWindingsTransformer,
    terminal_ids: &TerminalIds,
) -> ExportResult<()> {
    equipment(writer, "PowerTransformer", &twt.id, &twt.name, &twt.substation_id)?;
    writer.end_object("PowerTransformer")?;

    // All series and shunt parameters sit on end one, end two carries zeros.
    let ends = [
        (1u8, &twt.voltage_level1_id, twt.rated_u1, twt.r, twt.x, twt.g, twt.b),
        (
            2u8,
            &twt.voltage_level2_id,
            twt.rated_u2,
            Default::default(),
            Default::default(),
            Default::default(),
            Default::default(),
        ),
    ];
    for (end, vl_id, rated_u, r, x, g, b) in ends {
        let end_id = transformer_end_id(context, &twt.id, end);
        let terminal = terminal_ids.get(&(twt.id.clone(), end));

        writer.start_object("PowerTransformerEnd", &end_id)?;
        writer.identified_object(&end_id, &format!("{}_{}", twt.id, end))?;
        writer.integer("TransformerEnd", "endNumber", end.into())?;
        writer.reference("PowerTransformerEnd", "PowerTransformer", &twt.id)?;
        if let Some(terminal_id) = terminal {
            writer.reference("TransformerEnd", "Terminal", terminal_id)?;
        }
        writer.reference(
            "TransformerEnd",
            "BaseVoltage",
            &context.base_voltage_id(nominal_v(network, vl_id).value()),
        )?;
        writer.double("PowerTransformerEnd", "ratedU", rated_u.value())?;
        writer.double("PowerTransformerEnd", "r", r.value())?;
        writer.double("PowerTransformerEnd", "x", x.value())?;
        writer.double("PowerTransformerEnd", "g", g.value())?;
        writer.double("PowerTransformerEnd", "b", b.value())?;
        writer.end_object("PowerTransformerEnd")?;
    }

    let end1 = transformer_end_id(context, &twt.id, 1);

    if let Some(rtc) = &twt.ratio_tap_changer {
        let id = ratio_tap_changer_id(context, &twt.id, rtc);
        writer.start_object("RatioTapChanger", &id)?;
        writer.identified_object(&id, &format!("{}_RTC", twt.id))?;
        writer.integer("TapChanger", "lowStep", rtc.low_tap.into())?;
        writer.integer("TapChanger", "highStep", rtc.high_tap().into())?;
        writer.integer("TapChanger", "normalStep", rtc.tap_position.into())?;
        writer.boolean("TapChanger", "ltcFlag", rtc.load_tap_changing_capabilities)?;
        if let [first, second, ..] = rtc.steps.as_slice() {
            writer.double(
                "RatioTapChanger",
                "stepVoltageIncrement",
                (second.rho - first.rho) * 100.0,
            )?;
        }
        writer.reference("RatioTapChanger", "TransformerEnd", &end1)?;
        if let Some(control_id) = &rtc.regulating_control_id {
            writer.reference("TapChanger", "TapChangerControl", control_id)?;
        }
        writer.end_object("RatioTapChanger")?;
    }

    if let Some(ptc) = &twt.phase_tap_changer {
        let id = phase_tap_changer_id(context, &twt.id, ptc);
        let table_id = context.derived_id(&format!("{}_PTC_TABLE", twt.id));
        writer.start_object("PhaseTapChangerTabular", &id)?;
        writer.identified_object(&id, &format!("{}_PTC", twt.id))?;
        writer.integer("TapChanger", "lowStep", ptc.low_tap.into())?;
        writer.integer("TapChanger", "highStep", ptc.high_tap().into())?;
        writer.integer("TapChanger", "normalStep", ptc.tap_position.into())?;
        writer.boolean("TapChanger", "ltcFlag", false)?;
        writer.reference("PhaseTapChanger", "TransformerEnd", &end1)?;
        writer.reference("PhaseTapChangerTabular", "PhaseTapChangerTable", &table_id)?;
        if let Some(control_id) = &ptc.regulating_control_id {
            writer.reference("TapChanger", "TapChangerControl", control_id)?;
        }
        writer.end_object("PhaseTapChangerTabular")?;

        writer.start_object("PhaseTapChangerTable", &table_id)?;
        writer.identified_object(&table_id, &format!("{}_PTC_TABLE", twt.id))?;
        writer.end_object("PhaseTapChangerTable")?;

        for (step, point) in (ptc.low_tap..).zip(&ptc.steps) {
            let point_id = context.derived_id(&format!("{}_PTC_TABLE_{}", twt.id, step));
            writer.start_object("PhaseTapChangerTablePoint", &point_id)?;
            writer.integer("TapChangerTablePoint", "step", step.into())?;
            writer.double("TapChangerTablePoint", "ratio", point.rho)?;
            writer.double("PhaseTapChangerTablePoint", "angle", point.alpha.value())?;
            writer.reference(
                "PhaseTapChangerTablePoint",
                "PhaseTapChangerTable",
                &table_id,
            )?;
            writer.end_object("PhaseTapChangerTablePoint")?;
        }
    }

    Ok(())
}

fn write_hvdc<W: Write>(network: &Network, writer: &mut CimWriter<W>) -> ExportResult<()> {
    for station in &network.hvdc_converter_stations {
        let class = match station.kind {
            ConverterStationKind::Lcc { .. } => "CsConverter",
            ConverterStationKind::Vsc { .. } => "VsConverter",
        };
        equipment(writer, class, &station.id, &station.name, &station.voltage_level_id)?;
        let rated_udc = station
            .hvdc_line_id
            .as_deref()
            .and_then(|id| network.hvdc_lines.iter().find(|l| l.id == id))
            .map(|l| l.nominal_v.value());
        if let Some(rated_udc) = rated_udc {
            writer.double("ACDCConverter", "ratedUdc", rated_udc)?;
        }
        if let ConverterStationKind::Vsc { loss_factor, .. } = station.kind {
            writer.double("ACDCConverter", "switchingLoss", loss_factor)?;
        }
        writer.end_object(class)?;
    }

    for line in &network.hvdc_lines {
        writer.start_object("DCLineSegment", &line.id)?;
        let name = if line.name.is_empty() { &line.id } else { &line.name };
        writer.identified_object(&line.id, name)?;
        writer.double("DCLineSegment", "resistance", line.r.value())?;
        writer.end_object("DCLineSegment")?;
    }

    Ok(())
}
