//! End-to-end tests for the CGMES exporter
//!
//! Networks are built in code, exported profile by profile and checked on the produced XML.

use anyhow::Result;
use chrono::{TimeZone, Utc};
use gridcim_core::{
    Bus, CgmesMetadataModels, CgmesModel, CgmesTopology, ConverterStationKind, DanglingLine,
    Degrees, Diagnostics, Generator, HvdcConverterStation, HvdcConvertersMode, HvdcLine,
    Kilovolts, Line, Load, Megavars, Megawatts, Network, Ohms, ShuntCompensator, Substation,
    VoltageLevel,
};
use gridcim_io::exporters::cgmes::{
    export_network_to_cgmes, profile_to_string, ExportContext, ExportError, ExportOptions,
    Profile, TopologyMappingPolicy,
};
use tempfile::TempDir;

/// Two buses joined by one line, voltages from a solved load flow
fn two_bus_network() -> Network {
    let mut network = Network::new(
        "two-bus",
        Utc.with_ymd_and_hms(2024, 3, 1, 12, 0, 0).unwrap(),
    );
    network.substations.push(Substation::new("S1", "Substation 1"));
    network
        .voltage_levels
        .push(VoltageLevel::new("VL1", "VL1", "S1", Kilovolts(400.0)));
    network
        .buses
        .push(Bus::new("B1", "VL1").with_voltage(Kilovolts(401.2), Degrees(0.0)));
    network
        .buses
        .push(Bus::new("B2", "VL1").with_voltage(Kilovolts(398.5), Degrees(-2.5)));
    network
        .lines
        .push(Line::new("L1", "VL1", Some("B1"), "VL1", Some("B2")));
    network
}

fn options(policy: TopologyMappingPolicy) -> ExportOptions {
    ExportOptions {
        topology_mapping_policy: Some(policy),
        ..ExportOptions::default()
    }
}

fn export(
    network: &Network,
    options: &ExportOptions,
    profile: Profile,
) -> Result<(String, Diagnostics)> {
    let mut context = ExportContext::new(network, options)?;
    let mut diag = Diagnostics::new();
    let xml = profile_to_string(profile, network, &mut context, &mut diag)?;
    Ok((xml, diag))
}

fn count(xml: &str, pattern: &str) -> usize {
    xml.matches(pattern).count()
}

#[test]
fn test_two_bus_topology_without_mapping() -> Result<()> {
    let network = two_bus_network();
    let (tp, diag) = export(
        &network,
        &options(TopologyMappingPolicy::NoMapping),
        Profile::Topology,
    )?;

    assert_eq!(count(&tp, "<cim:TopologicalNode "), 2);
    assert!(tp.contains("<cim:TopologicalNode rdf:ID=\"_B1\">"));
    assert!(tp.contains("<cim:TopologicalNode rdf:ID=\"_B2\">"));
    assert!(tp.contains("<cim:IdentifiedObject.mRID>B1</cim:IdentifiedObject.mRID>"));
    assert!(tp.contains("<cim:IdentifiedObject.mRID>B2</cim:IdentifiedObject.mRID>"));

    assert_eq!(count(&tp, "<cim:Terminal "), 2);
    assert_eq!(
        count(&tp, "<cim:Terminal.TopologicalNode rdf:resource=\"#_B1\"/>"),
        1
    );
    assert_eq!(
        count(&tp, "<cim:Terminal.TopologicalNode rdf:resource=\"#_B2\"/>"),
        1
    );
    assert!(!diag.has_errors());
    Ok(())
}

#[test]
fn test_two_bus_state_variables_without_slack() -> Result<()> {
    let network = two_bus_network();
    let (sv, diag) = export(
        &network,
        &options(TopologyMappingPolicy::NoMapping),
        Profile::StateVariables,
    )?;

    assert_eq!(count(&sv, "<cim:SvVoltage "), 2);
    assert!(sv.contains("<cim:SvVoltage.v>401.2</cim:SvVoltage.v>"));
    assert!(sv.contains("<cim:SvVoltage.angle>0</cim:SvVoltage.angle>"));
    assert!(sv.contains("<cim:SvVoltage.v>398.5</cim:SvVoltage.v>"));
    assert!(sv.contains("<cim:SvVoltage.angle>-2.5</cim:SvVoltage.angle>"));
    assert_eq!(count(&sv, "<cim:TopologicalIsland "), 0);

    // The island exists but has no angle reference.
    assert_eq!(diag.issues_by_category("topology").count(), 1);
    Ok(())
}

#[test]
fn test_slack_terminal_produces_island() -> Result<()> {
    let mut network = two_bus_network();
    network.voltage_levels[0] = network.voltage_levels[0]
        .clone()
        .with_slack_terminal("L1", None);

    let (sv, diag) = export(
        &network,
        &options(TopologyMappingPolicy::NoMapping),
        Profile::StateVariables,
    )?;

    assert_eq!(count(&sv, "<cim:TopologicalIsland "), 1);
    assert!(sv.contains(
        "<cim:TopologicalIsland.AngleRefTopologicalNode rdf:resource=\"#_B1\"/>"
    ));
    assert_eq!(count(&sv, "<cim:TopologicalIsland.TopologicalNodes "), 2);
    assert!(!diag.has_issues());
    Ok(())
}

#[test]
fn test_shared_regulating_control_takes_positive_deadband() -> Result<()> {
    let mut network = two_bus_network();
    network.shunt_compensators.push(
        ShuntCompensator::new("SH1", "VL1", Some("B1"), 0.001)
            .with_voltage_regulation("RC1", 400.0, 0.0),
    );
    network.generators.push(
        Generator::new("G1", "VL1", Some("B1"))
            .with_p_limits(0.0, 500.0)
            .with_voltage_regulation("RC1", 400.0, 1.5),
    );

    let (ssh, diag) = export(
        &network,
        &options(TopologyMappingPolicy::NoMapping),
        Profile::SteadyStateHypothesis,
    )?;
    assert_eq!(count(&ssh, "<cim:RegulatingControl rdf:about=\"#_RC1\">"), 1);
    assert!(ssh.contains(
        "<cim:RegulatingControl.targetDeadband>1.5</cim:RegulatingControl.targetDeadband>"
    ));
    assert!(ssh.contains("<cim:RegulatingControl.discrete>true</cim:RegulatingControl.discrete>"));
    assert!(!diag.has_issues());

    let (eq, _) = export(
        &network,
        &options(TopologyMappingPolicy::NoMapping),
        Profile::Equipment,
    )?;
    assert_eq!(count(&eq, "<cim:RegulatingControl rdf:ID=\"_RC1\">"), 1);
    assert!(eq.contains("RegulatingControlModeKind.voltage"));
    Ok(())
}

#[test]
fn test_mapping_only_skips_unmapped_buses() -> Result<()> {
    let mut network = two_bus_network();
    network.cgmes_topology = Some(CgmesTopology::default().with_bus("B1", &["TN-B1"]));
    let options = options(TopologyMappingPolicy::MappingOnly);

    let (tp, _) = export(&network, &options, Profile::Topology)?;
    assert_eq!(count(&tp, "<cim:TopologicalNode "), 1);
    assert!(tp.contains("rdf:ID=\"_TN-B1\""));
    assert_eq!(count(&tp, "<cim:Terminal "), 1);

    let (sv, _) = export(&network, &options, Profile::StateVariables)?;
    assert_eq!(count(&sv, "<cim:SvVoltage "), 1);
    Ok(())
}

#[test]
fn test_partial_mapping_falls_back_to_bus_ids() -> Result<()> {
    let mut network = two_bus_network();
    network.cgmes_topology = Some(CgmesTopology::default().with_bus("B1", &["TN-B1"]));

    // Partial mapping is the default when the network carries a mapping.
    let (tp, _) = export(&network, &ExportOptions::default(), Profile::Topology)?;
    assert_eq!(count(&tp, "<cim:TopologicalNode "), 2);
    assert!(tp.contains("rdf:ID=\"_TN-B1\""));
    assert!(tp.contains("rdf:ID=\"_B2\""));
    Ok(())
}

#[test]
fn test_boundary_nodes_are_marked_mapped() -> Result<()> {
    let mut network = two_bus_network();
    network.cgmes_topology = Some(
        CgmesTopology::default()
            .with_unmapped("BOUNDARY-1")
            .with_unmapped("BOUNDARY-2"),
    );
    network.dangling_lines.push(DanglingLine {
        id: "DL1".to_string(),
        name: "DL1".to_string(),
        voltage_level_id: "VL1".to_string(),
        bus: Some("B2".to_string()),
        r: Default::default(),
        x: Default::default(),
        g: Default::default(),
        b: Default::default(),
        p0: Default::default(),
        q0: Default::default(),
        boundary_topological_node: Some("BOUNDARY-1".to_string()),
        boundary_v: Kilovolts(399.0),
        boundary_angle: Degrees(-3.0),
        p: Default::default(),
        q: Default::default(),
        aliases: Default::default(),
    });

    let options = options(TopologyMappingPolicy::PartialMapping);
    let mut context = ExportContext::new(&network, &options)?;
    let mut diag = Diagnostics::new();
    let sv = profile_to_string(Profile::StateVariables, &network, &mut context, &mut diag)?;

    // Two buses, the boundary node and the remaining unmapped node
    assert_eq!(count(&sv, "<cim:SvVoltage "), 4);
    assert!(sv.contains("<cim:SvVoltage.v>399</cim:SvVoltage.v>"));
    assert!(sv.contains("<cim:SvVoltage.TopologicalNode rdf:resource=\"#_BOUNDARY-2\"/>"));
    assert!(!context.unmapped_topological_nodes().contains("BOUNDARY-1"));
    assert!(context.unmapped_topological_nodes().contains("BOUNDARY-2"));
    Ok(())
}

#[test]
fn test_missing_terminal_ids_are_reported() -> Result<()> {
    let mut network = two_bus_network();
    let mut load = Load::new("LD1", "VL1", Some("B1"), 100.0, 20.0);
    load.aliases
        .insert("CGMES.Terminal1".to_string(), "T-LD1".to_string());
    network.loads.push(load);
    let options = ExportOptions {
        derive_missing_terminal_ids: false,
        ..options(TopologyMappingPolicy::NoMapping)
    };

    let (tp, diag) = export(&network, &options, Profile::Topology)?;
    assert_eq!(count(&tp, "<cim:Terminal "), 1);
    assert!(tp.contains("rdf:about=\"#_T-LD1\""));
    assert_eq!(diag.error_count(), 2);
    Ok(())
}

#[test]
fn test_flows_skip_unknown_values() -> Result<()> {
    let mut network = two_bus_network();
    network.lines[0].p1.0 = 50.0;
    network.lines[0].q1.0 = 10.0;

    let (sv, _) = export(
        &network,
        &options(TopologyMappingPolicy::NoMapping),
        Profile::StateVariables,
    )?;
    assert_eq!(count(&sv, "<cim:SvPowerFlow "), 1);
    assert!(sv.contains("<cim:SvPowerFlow.p>50</cim:SvPowerFlow.p>"));
    assert_eq!(count(&sv, "<cim:SvStatus "), 1);
    Ok(())
}

fn lcc_station(id: &str, bus: &str, power_factor: f64) -> HvdcConverterStation {
    HvdcConverterStation {
        id: id.to_string(),
        name: id.to_string(),
        voltage_level_id: "VL1".to_string(),
        bus: Some(bus.to_string()),
        hvdc_line_id: Some("HVDC1".to_string()),
        kind: ConverterStationKind::Lcc { power_factor },
        p: Megawatts::unknown(),
        q: Megavars::unknown(),
        aliases: Default::default(),
    }
}

#[test]
fn test_lcc_reactive_power_needs_a_power_factor() -> Result<()> {
    let mut network = two_bus_network();
    network.hvdc_converter_stations.push(lcc_station("CS1", "B1", 0.0));
    network.hvdc_converter_stations.push(lcc_station("CS2", "B2", 1.0));
    network.hvdc_lines.push(HvdcLine {
        id: "HVDC1".to_string(),
        name: "HVDC1".to_string(),
        r: Ohms(1.0),
        nominal_v: Kilovolts(500.0),
        active_power_setpoint: Megawatts(100.0),
        max_p: Megawatts(500.0),
        converter_station1_id: "CS1".to_string(),
        converter_station2_id: "CS2".to_string(),
        converters_mode: HvdcConvertersMode::SideOneRectifierSideTwoInverter,
        aliases: Default::default(),
    });

    let (ssh, _) = export(
        &network,
        &options(TopologyMappingPolicy::NoMapping),
        Profile::SteadyStateHypothesis,
    )?;

    assert_eq!(count(&ssh, "<cim:CsConverter "), 2);
    assert!(!ssh.contains(">inf<"));
    assert!(!ssh.contains(">NaN<"));
    // unity power factor draws no reactive power; zero leaves q unwritten
    assert_eq!(count(&ssh, "<cim:ACDCConverter.q>"), 1);
    assert!(ssh.contains("<cim:ACDCConverter.q>0</cim:ACDCConverter.q>"));
    Ok(())
}

#[test]
fn test_header_carries_model_description() -> Result<()> {
    let mut network = two_bus_network();
    network.cgmes_metadata = Some(CgmesMetadataModels {
        eq: Some(CgmesModel {
            description: "EQ of the two-bus case".to_string(),
            version: 2,
            dependencies: vec!["urn:uuid:boundary-eq".to_string()],
            modeling_authority_set: Some("http://tso.example/planning".to_string()),
        }),
        ..CgmesMetadataModels::default()
    });

    let (eq, _) = export(&network, &ExportOptions::default(), Profile::Equipment)?;
    assert_eq!(count(&eq, "<md:FullModel "), 1);
    assert!(eq.contains("<md:Model.version>3</md:Model.version>"));
    assert!(eq.contains("<md:Model.DependentOn rdf:resource=\"urn:uuid:boundary-eq\"/>"));
    assert!(eq.contains("<md:Model.scenarioTime>2024-03-01T12:00:00Z</md:Model.scenarioTime>"));
    assert!(eq.contains(
        "<md:Model.profile>http://entsoe.eu/CIM/EquipmentCore/3/1</md:Model.profile>"
    ));
    assert!(eq.contains(
        "<md:Model.modelingAuthoritySet>http://tso.example/planning</md:Model.modelingAuthoritySet>"
    ));
    Ok(())
}

#[test]
fn test_cim100_namespace_and_profiles() -> Result<()> {
    let network = two_bus_network();
    let options = ExportOptions {
        cim_version: 100,
        ..ExportOptions::default()
    };
    let (sv, _) = export(&network, &options, Profile::StateVariables)?;
    assert!(sv.contains("xmlns:cim=\"http://iec.ch/TC57/CIM100#\""));
    assert!(sv.contains("http://iec.ch/TC57/ns/CIM/StateVariables-EU/3.0"));
    Ok(())
}

#[test]
fn test_export_writes_all_profiles() -> Result<()> {
    let network = two_bus_network();
    let temp_dir = TempDir::new()?;
    let out = temp_dir.path().join("cgmes");

    let report = export_network_to_cgmes(&network, &out, "case", &ExportOptions::default())?;

    let names: Vec<String> = report
        .files
        .iter()
        .map(|p| p.file_name().unwrap().to_string_lossy().into_owned())
        .collect();
    assert_eq!(
        names,
        vec!["case_EQ.xml", "case_TP.xml", "case_SSH.xml", "case_SV.xml"]
    );
    for file in &report.files {
        let content = std::fs::read_to_string(file)?;
        assert!(content.starts_with("<?xml"));
        assert_eq!(count(&content, "<md:FullModel "), 1);
        assert!(content.trim_end().ends_with("</rdf:RDF>"));
    }

    let tp = std::fs::read_to_string(&report.files[1])?;
    let sv = std::fs::read_to_string(&report.files[3])?;
    let eq = std::fs::read_to_string(&report.files[0])?;
    let eq_id = eq
        .split("<md:FullModel rdf:about=\"")
        .nth(1)
        .and_then(|rest| rest.split('"').next())
        .unwrap();
    assert!(tp.contains(&format!("<md:Model.DependentOn rdf:resource=\"{}\"/>", eq_id)));
    assert_eq!(count(&sv, "<md:Model.DependentOn "), 2);
    Ok(())
}

#[test]
fn test_unidentified_terminals_reported_once_per_export() -> Result<()> {
    let network = two_bus_network();
    let temp_dir = TempDir::new()?;
    let options = ExportOptions {
        derive_missing_terminal_ids: false,
        ..options(TopologyMappingPolicy::NoMapping)
    };

    let report = export_network_to_cgmes(&network, temp_dir.path(), "case", &options)?;

    assert_eq!(report.files.len(), 4);
    assert_eq!(report.diagnostics.error_count(), 2);
    let mut sides: Vec<String> = report
        .diagnostics
        .issues_by_category("terminal")
        .map(|issue| issue.message.clone())
        .collect();
    sides.sort();
    sides.dedup();
    assert_eq!(sides.len(), 2);
    assert!(report
        .diagnostics
        .issues_by_category("terminal")
        .all(|issue| issue.entity.as_deref() == Some("L1")));
    Ok(())
}

#[test]
fn test_selected_profiles_only() -> Result<()> {
    let network = two_bus_network();
    let temp_dir = TempDir::new()?;
    let options = ExportOptions {
        profiles: vec![Profile::StateVariables, Profile::Topology],
        ..ExportOptions::default()
    };

    let report = export_network_to_cgmes(&network, temp_dir.path(), "case", &options)?;
    assert_eq!(report.files.len(), 2);
    assert!(report.files[0].ends_with("case_TP.xml"));
    assert!(report.files[1].ends_with("case_SV.xml"));
    Ok(())
}

#[test]
fn test_unsupported_cim_version_fails() {
    let network = two_bus_network();
    let temp_dir = TempDir::new().unwrap();
    let options = ExportOptions {
        cim_version: 14,
        ..ExportOptions::default()
    };

    let err = export_network_to_cgmes(&network, temp_dir.path(), "case", &options).unwrap_err();
    assert!(matches!(err, ExportError::UnsupportedCimVersion(14)));
}

#[test]
fn test_network_from_json() -> Result<()> {
    let json = serde_json::json!({
        "id": "json-case",
        "case_date": "2024-03-01T12:00:00Z",
        "substations": [{"id": "S1", "name": "S1"}],
        "voltage_levels": [{"id": "VL1", "name": "VL1", "substation_id": "S1", "nominal_v": 225.0}],
        "buses": [
            {"id": "B1", "voltage_level_id": "VL1", "v": 226.0, "angle": 0.0},
            {"id": "B2", "voltage_level_id": "VL1", "v": null}
        ],
        "loads": [{"id": "LD1", "voltage_level_id": "VL1", "bus": "B2", "p0": 10.0, "q0": 2.0}]
    });
    let network = Network::from_json_str(&json.to_string())?;

    let (sv, _) = export(
        &network,
        &options(TopologyMappingPolicy::NoMapping),
        Profile::StateVariables,
    )?;
    assert_eq!(count(&sv, "<cim:SvVoltage "), 2);
    assert!(sv.contains("<cim:SvVoltage.v>226</cim:SvVoltage.v>"));
    assert!(sv.contains("<cim:SvVoltage.v>0</cim:SvVoltage.v>"));
    Ok(())
}
