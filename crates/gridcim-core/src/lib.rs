//! # gridcim-core: network model for CGMES export
//!
//! Provides the in-memory, bus-view power network consumed by the `gridcim-io` exporter, plus
//! the graph utilities (synchronous components) and diagnostics shared by the other crates.
//!
//! ## Design
//!
//! Elements are stored in ordered `Vec`s and addressed by string identifiers, which is how CGMES
//! identifies objects. The enumeration order of every collection is significant: whenever the
//! exporter has to pick "the first" of several candidates (angle references, regulating-control
//! views) it follows this order, so the output is reproducible.
//!
//! Connections use the bus view: an injection has at most one bus, a branch has one bus per side,
//! and `None` means the terminal is disconnected.
//!
//! ## Quick Start
//!
//! ```rust
//! use gridcim_core::*;
//!
//! let mut network = Network::new("grid", chrono::Utc::now());
//! network.substations.push(Substation::new("S1", "Substation 1"));
//! network
//!     .voltage_levels
//!     .push(VoltageLevel::new("VL1", "VL1", "S1", Kilovolts(400.0)));
//! network.buses.push(Bus::new("B1", "VL1").with_voltage(Kilovolts(401.2), Degrees(0.0)));
//! network.buses.push(Bus::new("B2", "VL1").with_voltage(Kilovolts(398.7), Degrees(-1.3)));
//! network.lines.push(Line::new("L1", "VL1", Some("B1"), "VL1", Some("B2")));
//!
//! assert_eq!(network.stats().num_buses, 2);
//! assert_eq!(network.terminals().len(), 2);
//! ```
//!
//! ## Modules
//!
//! - [`diagnostics`] - skip-and-continue issue collection
//! - [`extensions`] - CGMES provenance carried by an imported network
//! - [`graph_utils`] - synchronous components over the bus-view topology
//! - [`units`] - unit newtypes

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::Path;

pub mod diagnostics;
pub mod error;
pub mod extensions;
pub mod graph_utils;
pub mod units;

pub use diagnostics::{DiagnosticIssue, Diagnostics, Severity};
pub use error::{GridError, GridResult};
pub use extensions::{CgmesMetadataModels, CgmesModel, CgmesTopology};
pub use graph_utils::{topology_stats, SynchronousComponents, TopologyStats};
pub use units::{Degrees, Kilovolts, Megavars, Megawatts, Ohms, Siemens};

/// Alias map of an identifiable (e.g. `CGMES.Terminal1 -> <terminal id>`)
pub type Aliases = BTreeMap<String, String>;

/// Prefix of the alias keys holding the original CGMES terminal identifiers.
pub const TERMINAL_ALIAS_PREFIX: &str = "CGMES.Terminal";

fn default_true() -> bool {
    true
}

/// Side of a two-terminal equipment
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Side {
    One,
    Two,
}

impl Side {
    /// CGMES terminal sequence number for this side
    pub fn sequence_number(self) -> u8 {
        match self {
            Side::One => 1,
            Side::Two => 2,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Substation {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub country: Option<String>,
    #[serde(default)]
    pub aliases: Aliases,
}

impl Substation {
    pub fn new(id: &str, name: &str) -> Self {
        Self {
            id: id.to_string(),
            name: name.to_string(),
            country: None,
            aliases: Aliases::new(),
        }
    }
}

/// Slack-terminal annotation of a voltage level: the terminal whose bus is the angle reference.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SlackTerminal {
    pub equipment_id: String,
    /// Side for branches; ignored for injections
    #[serde(default)]
    pub side: Option<Side>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VoltageLevel {
    pub id: String,
    pub name: String,
    pub substation_id: String,
    pub nominal_v: Kilovolts,
    #[serde(default)]
    pub low_voltage_limit: Option<Kilovolts>,
    #[serde(default)]
    pub high_voltage_limit: Option<Kilovolts>,
    #[serde(default)]
    pub slack_terminal: Option<SlackTerminal>,
    #[serde(default)]
    pub aliases: Aliases,
}

impl VoltageLevel {
    pub fn new(id: &str, name: &str, substation_id: &str, nominal_v: Kilovolts) -> Self {
        Self {
            id: id.to_string(),
            name: name.to_string(),
            substation_id: substation_id.to_string(),
            nominal_v,
            low_voltage_limit: None,
            high_voltage_limit: None,
            slack_terminal: None,
            aliases: Aliases::new(),
        }
    }

    pub fn with_slack_terminal(mut self, equipment_id: &str, side: Option<Side>) -> Self {
        self.slack_terminal = Some(SlackTerminal {
            equipment_id: equipment_id.to_string(),
            side,
        });
        self
    }
}

/// Bus of the bus-view topology, with the state computed by the last load flow
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Bus {
    pub id: String,
    #[serde(default)]
    pub name: String,
    pub voltage_level_id: String,
    /// Voltage magnitude, `NaN` when not computed
    #[serde(default = "Kilovolts::unknown")]
    pub v: Kilovolts,
    /// Voltage angle, `NaN` when not computed
    #[serde(default = "Degrees::unknown")]
    pub angle: Degrees,
}

impl Bus {
    pub fn new(id: &str, voltage_level_id: &str) -> Self {
        Self {
            id: id.to_string(),
            name: id.to_string(),
            voltage_level_id: voltage_level_id.to_string(),
            v: Kilovolts::unknown(),
            angle: Degrees::unknown(),
        }
    }

    pub fn with_voltage(mut self, v: Kilovolts, angle: Degrees) -> Self {
        self.v = v;
        self.angle = angle;
        self
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LoadKind {
    #[default]
    EnergyConsumer,
    ConformLoad,
    NonConformLoad,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Load {
    pub id: String,
    #[serde(default)]
    pub name: String,
    pub voltage_level_id: String,
    #[serde(default)]
    pub bus: Option<String>,
    #[serde(default)]
    pub kind: LoadKind,
    pub p0: Megawatts,
    pub q0: Megavars,
    #[serde(default = "Megawatts::unknown")]
    pub p: Megawatts,
    #[serde(default = "Megavars::unknown")]
    pub q: Megavars,
    #[serde(default)]
    pub aliases: Aliases,
}

impl Load {
    pub fn new(id: &str, voltage_level_id: &str, bus: Option<&str>, p0: f64, q0: f64) -> Self {
        Self {
            id: id.to_string(),
            name: id.to_string(),
            voltage_level_id: voltage_level_id.to_string(),
            bus: bus.map(str::to_string),
            kind: LoadKind::default(),
            p0: Megawatts(p0),
            q0: Megavars(q0),
            p: Megawatts::unknown(),
            q: Megavars::unknown(),
            aliases: Aliases::new(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EnergySource {
    Hydro,
    Thermal,
    Nuclear,
    Wind,
    Solar,
    #[default]
    Other,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Generator {
    pub id: String,
    #[serde(default)]
    pub name: String,
    pub voltage_level_id: String,
    #[serde(default)]
    pub bus: Option<String>,
    #[serde(default)]
    pub energy_source: EnergySource,
    pub min_p: Megawatts,
    pub max_p: Megawatts,
    pub target_p: Megawatts,
    #[serde(default)]
    pub target_q: Megavars,
    #[serde(default = "Kilovolts::unknown")]
    pub target_v: Kilovolts,
    #[serde(default)]
    pub voltage_regulator_on: bool,
    /// Voltage deadband of the remote regulation (kV), 0 when not regulated with a band
    #[serde(default)]
    pub regulating_deadband: f64,
    /// Id of the CGMES regulating control this machine participates in
    #[serde(default)]
    pub regulating_control_id: Option<String>,
    #[serde(default = "Megawatts::unknown")]
    pub p: Megawatts,
    #[serde(default = "Megavars::unknown")]
    pub q: Megavars,
    #[serde(default)]
    pub aliases: Aliases,
}

impl Generator {
    pub fn new(id: &str, voltage_level_id: &str, bus: Option<&str>) -> Self {
        Self {
            id: id.to_string(),
            name: id.to_string(),
            voltage_level_id: voltage_level_id.to_string(),
            bus: bus.map(str::to_string),
            energy_source: EnergySource::default(),
            min_p: Megawatts(0.0),
            max_p: Megawatts(0.0),
            target_p: Megawatts(0.0),
            target_q: Megavars(0.0),
            target_v: Kilovolts::unknown(),
            voltage_regulator_on: false,
            regulating_deadband: 0.0,
            regulating_control_id: None,
            p: Megawatts::unknown(),
            q: Megavars::unknown(),
            aliases: Aliases::new(),
        }
    }

    /// Set active power limits (in MW)
    pub fn with_p_limits(mut self, min_p: f64, max_p: f64) -> Self {
        self.min_p = Megawatts(min_p);
        self.max_p = Megawatts(max_p);
        self
    }

    /// Enable voltage regulation through the given regulating control
    pub fn with_voltage_regulation(
        mut self,
        control_id: &str,
        target_v: f64,
        deadband: f64,
    ) -> Self {
        self.voltage_regulator_on = true;
        self.target_v = Kilovolts(target_v);
        self.regulating_deadband = deadband;
        self.regulating_control_id = Some(control_id.to_string());
        self
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ShuntCompensator {
    pub id: String,
    #[serde(default)]
    pub name: String,
    pub voltage_level_id: String,
    #[serde(default)]
    pub bus: Option<String>,
    pub section_count: u32,
    pub maximum_section_count: u32,
    pub b_per_section: Siemens,
    #[serde(default)]
    pub g_per_section: Siemens,
    #[serde(default)]
    pub voltage_regulation_on: bool,
    #[serde(default = "Kilovolts::unknown")]
    pub target_v: Kilovolts,
    #[serde(default)]
    pub target_deadband: f64,
    #[serde(default)]
    pub regulating_control_id: Option<String>,
    #[serde(default = "Megawatts::unknown")]
    pub p: Megawatts,
    #[serde(default = "Megavars::unknown")]
    pub q: Megavars,
    #[serde(default)]
    pub aliases: Aliases,
}

impl ShuntCompensator {
    pub fn new(id: &str, voltage_level_id: &str, bus: Option<&str>, b_per_section: f64) -> Self {
        Self {
            id: id.to_string(),
            name: id.to_string(),
            voltage_level_id: voltage_level_id.to_string(),
            bus: bus.map(str::to_string),
            section_count: 1,
            maximum_section_count: 1,
            b_per_section: Siemens(b_per_section),
            g_per_section: Siemens(0.0),
            voltage_regulation_on: false,
            target_v: Kilovolts::unknown(),
            target_deadband: 0.0,
            regulating_control_id: None,
            p: Megawatts::unknown(),
            q: Megavars::unknown(),
            aliases: Aliases::new(),
        }
    }

    pub fn with_voltage_regulation(
        mut self,
        control_id: &str,
        target_v: f64,
        deadband: f64,
    ) -> Self {
        self.voltage_regulation_on = true;
        self.target_v = Kilovolts(target_v);
        self.target_deadband = deadband;
        self.regulating_control_id = Some(control_id.to_string());
        self
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SvcRegulationMode {
    Voltage,
    ReactivePower,
    #[default]
    Off,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StaticVarCompensator {
    pub id: String,
    #[serde(default)]
    pub name: String,
    pub voltage_level_id: String,
    #[serde(default)]
    pub bus: Option<String>,
    pub b_min: Siemens,
    pub b_max: Siemens,
    #[serde(default)]
    pub regulation_mode: SvcRegulationMode,
    #[serde(default = "Kilovolts::unknown")]
    pub voltage_setpoint: Kilovolts,
    #[serde(default = "Megavars::unknown")]
    pub reactive_power_setpoint: Megavars,
    #[serde(default)]
    pub regulating_control_id: Option<String>,
    #[serde(default = "Megawatts::unknown")]
    pub p: Megawatts,
    #[serde(default = "Megavars::unknown")]
    pub q: Megavars,
    #[serde(default)]
    pub aliases: Aliases,
}

/// AC line between two buses
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Line {
    pub id: String,
    #[serde(default)]
    pub name: String,
    pub voltage_level1_id: String,
    pub voltage_level2_id: String,
    #[serde(default)]
    pub bus1: Option<String>,
    #[serde(default)]
    pub bus2: Option<String>,
    pub r: Ohms,
    pub x: Ohms,
    #[serde(default)]
    pub g1: Siemens,
    #[serde(default)]
    pub b1: Siemens,
    #[serde(default)]
    pub g2: Siemens,
    #[serde(default)]
    pub b2: Siemens,
    #[serde(default = "Megawatts::unknown")]
    pub p1: Megawatts,
    #[serde(default = "Megavars::unknown")]
    pub q1: Megavars,
    #[serde(default = "Megawatts::unknown")]
    pub p2: Megawatts,
    #[serde(default = "Megavars::unknown")]
    pub q2: Megavars,
    #[serde(default)]
    pub aliases: Aliases,
}

impl Line {
    pub fn new(
        id: &str,
        voltage_level1_id: &str,
        bus1: Option<&str>,
        voltage_level2_id: &str,
        bus2: Option<&str>,
    ) -> Self {
        Self {
            id: id.to_string(),
            name: id.to_string(),
            voltage_level1_id: voltage_level1_id.to_string(),
            voltage_level2_id: voltage_level2_id.to_string(),
            bus1: bus1.map(str::to_string),
            bus2: bus2.map(str::to_string),
            r: Ohms(1.0),
            x: Ohms(10.0),
            g1: Siemens(0.0),
            b1: Siemens(0.0),
            g2: Siemens(0.0),
            b2: Siemens(0.0),
            p1: Megawatts::unknown(),
            q1: Megavars::unknown(),
            p2: Megawatts::unknown(),
            q2: Megavars::unknown(),
            aliases: Aliases::new(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RatioTapChangerStep {
    pub rho: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RatioTapChanger {
    /// Original CGMES id; a name-based id is derived when absent
    #[serde(default)]
    pub id: Option<String>,
    pub low_tap: i32,
    pub tap_position: i32,
    pub steps: Vec<RatioTapChangerStep>,
    #[serde(default)]
    pub load_tap_changing_capabilities: bool,
    #[serde(default)]
    pub regulating: bool,
    #[serde(default = "Kilovolts::unknown")]
    pub target_v: Kilovolts,
    #[serde(default)]
    pub target_deadband: f64,
    #[serde(default)]
    pub regulating_control_id: Option<String>,
}

impl RatioTapChanger {
    pub fn high_tap(&self) -> i32 {
        self.low_tap + self.steps.len().saturating_sub(1) as i32
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PhaseRegulationMode {
    CurrentLimiter,
    ActivePowerControl,
    #[default]
    FixedTap,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PhaseTapChangerStep {
    pub rho: f64,
    pub alpha: Degrees,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PhaseTapChanger {
    #[serde(default)]
    pub id: Option<String>,
    pub low_tap: i32,
    pub tap_position: i32,
    pub steps: Vec<PhaseTapChangerStep>,
    #[serde(default)]
    pub regulation_mode: PhaseRegulationMode,
    /// Current (A) or active power (MW) target, depending on the mode
    #[serde(default)]
    pub regulation_value: f64,
    #[serde(default)]
    pub regulating: bool,
    #[serde(default)]
    pub target_deadband: f64,
    #[serde(default)]
    pub regulating_control_id: Option<String>,
}

impl PhaseTapChanger {
    pub fn high_tap(&self) -> i32 {
        self.low_tap + self.steps.len().saturating_sub(1) as i32
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TwoWindingsTransformer {
    pub id: String,
    #[serde(default)]
    pub name: String,
    pub substation_id: String,
    pub voltage_level1_id: String,
    pub voltage_level2_id: String,
    #[serde(default)]
    pub bus1: Option<String>,
    #[serde(default)]
    pub bus2: Option<String>,
    pub r: Ohms,
    pub x: Ohms,
    #[serde(default)]
    pub g: Siemens,
    #[serde(default)]
    pub b: Siemens,
    pub rated_u1: Kilovolts,
    pub rated_u2: Kilovolts,
    #[serde(default)]
    pub ratio_tap_changer: Option<RatioTapChanger>,
    #[serde(default)]
    pub phase_tap_changer: Option<PhaseTapChanger>,
    #[serde(default = "Megawatts::unknown")]
    pub p1: Megawatts,
    #[serde(default = "Megavars::unknown")]
    pub q1: Megavars,
    #[serde(default = "Megawatts::unknown")]
    pub p2: Megawatts,
    #[serde(default = "Megavars::unknown")]
    pub q2: Megavars,
    #[serde(default)]
    pub aliases: Aliases,
}

/// Line to the boundary: one network terminal plus an equivalent injection at the boundary node.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DanglingLine {
    pub id: String,
    #[serde(default)]
    pub name: String,
    pub voltage_level_id: String,
    #[serde(default)]
    pub bus: Option<String>,
    pub r: Ohms,
    pub x: Ohms,
    #[serde(default)]
    pub g: Siemens,
    #[serde(default)]
    pub b: Siemens,
    pub p0: Megawatts,
    pub q0: Megavars,
    /// Boundary topological node this line ends on, when imported from CGMES
    #[serde(default)]
    pub boundary_topological_node: Option<String>,
    #[serde(default = "Kilovolts::unknown")]
    pub boundary_v: Kilovolts,
    #[serde(default = "Degrees::unknown")]
    pub boundary_angle: Degrees,
    #[serde(default = "Megawatts::unknown")]
    pub p: Megawatts,
    #[serde(default = "Megavars::unknown")]
    pub q: Megavars,
    #[serde(default)]
    pub aliases: Aliases,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SwitchKind {
    #[default]
    Breaker,
    Disconnector,
    LoadBreakSwitch,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Switch {
    pub id: String,
    #[serde(default)]
    pub name: String,
    pub voltage_level_id: String,
    #[serde(default)]
    pub kind: SwitchKind,
    #[serde(default)]
    pub open: bool,
    #[serde(default = "default_true")]
    pub retained: bool,
    #[serde(default)]
    pub bus1: Option<String>,
    #[serde(default)]
    pub bus2: Option<String>,
    #[serde(default)]
    pub aliases: Aliases,
}

/// Kind-specific data of an HVDC converter station
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ConverterStationKind {
    Lcc {
        power_factor: f64,
    },
    Vsc {
        voltage_regulator_on: bool,
        #[serde(default = "Kilovolts::unknown")]
        voltage_setpoint: Kilovolts,
        #[serde(default = "Megavars::unknown")]
        reactive_power_setpoint: Megavars,
        #[serde(default)]
        loss_factor: f64,
    },
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HvdcConverterStation {
    pub id: String,
    #[serde(default)]
    pub name: String,
    pub voltage_level_id: String,
    #[serde(default)]
    pub bus: Option<String>,
    #[serde(default)]
    pub hvdc_line_id: Option<String>,
    pub kind: ConverterStationKind,
    #[serde(default = "Megawatts::unknown")]
    pub p: Megawatts,
    #[serde(default = "Megavars::unknown")]
    pub q: Megavars,
    #[serde(default)]
    pub aliases: Aliases,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum HvdcConvertersMode {
    #[default]
    SideOneRectifierSideTwoInverter,
    SideOneInverterSideTwoRectifier,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HvdcLine {
    pub id: String,
    #[serde(default)]
    pub name: String,
    pub r: Ohms,
    pub nominal_v: Kilovolts,
    pub active_power_setpoint: Megawatts,
    pub max_p: Megawatts,
    pub converter_station1_id: String,
    pub converter_station2_id: String,
    #[serde(default)]
    pub converters_mode: HvdcConvertersMode,
    #[serde(default)]
    pub aliases: Aliases,
}

/// Kind of conducting equipment owning a terminal
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EquipmentKind {
    Load,
    Generator,
    ShuntCompensator,
    StaticVarCompensator,
    DanglingLine,
    HvdcConverterStation,
    Line,
    TwoWindingsTransformer,
    Switch,
}

impl EquipmentKind {
    pub fn label(self) -> &'static str {
        match self {
            EquipmentKind::Load => "load",
            EquipmentKind::Generator => "generator",
            EquipmentKind::ShuntCompensator => "shunt compensator",
            EquipmentKind::StaticVarCompensator => "static var compensator",
            EquipmentKind::DanglingLine => "dangling line",
            EquipmentKind::HvdcConverterStation => "HVDC converter station",
            EquipmentKind::Line => "line",
            EquipmentKind::TwoWindingsTransformer => "two-windings transformer",
            EquipmentKind::Switch => "switch",
        }
    }
}

/// Borrowed view of one equipment terminal
#[derive(Debug, Clone, Copy)]
pub struct TerminalRef<'a> {
    pub kind: EquipmentKind,
    pub equipment_id: &'a str,
    /// 1-based terminal sequence number
    pub sequence_number: u8,
    pub voltage_level_id: &'a str,
    /// Bus-view bus, `None` when disconnected
    pub bus: Option<&'a str>,
    pub aliases: &'a Aliases,
    /// Flow leaving the bus into the equipment; `NaN` when unknown or not applicable
    pub p: Megawatts,
    pub q: Megavars,
}

impl<'a> TerminalRef<'a> {
    /// Original CGMES terminal id preserved as an alias, if any
    pub fn cgmes_id(&self) -> Option<&'a str> {
        self.aliases
            .get(&format!("{}{}", TERMINAL_ALIAS_PREFIX, self.sequence_number))
            .map(String::as_str)
    }

    pub fn is_connected(&self) -> bool {
        self.bus.is_some()
    }
}

/// The network snapshot to export
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Network {
    pub id: String,
    #[serde(default)]
    pub name: String,
    /// Scenario time of the snapshot
    pub case_date: DateTime<Utc>,
    /// Minutes between the forecast time and the case date (0 for snapshots)
    #[serde(default)]
    pub forecast_distance: u32,
    #[serde(default)]
    pub substations: Vec<Substation>,
    #[serde(default)]
    pub voltage_levels: Vec<VoltageLevel>,
    #[serde(default)]
    pub buses: Vec<Bus>,
    #[serde(default)]
    pub loads: Vec<Load>,
    #[serde(default)]
    pub generators: Vec<Generator>,
    #[serde(default)]
    pub shunt_compensators: Vec<ShuntCompensator>,
    #[serde(default)]
    pub static_var_compensators: Vec<StaticVarCompensator>,
    #[serde(default)]
    pub lines: Vec<Line>,
    #[serde(default)]
    pub two_windings_transformers: Vec<TwoWindingsTransformer>,
    #[serde(default)]
    pub dangling_lines: Vec<DanglingLine>,
    #[serde(default)]
    pub switches: Vec<Switch>,
    #[serde(default)]
    pub hvdc_converter_stations: Vec<HvdcConverterStation>,
    #[serde(default)]
    pub hvdc_lines: Vec<HvdcLine>,
    /// Model metadata preserved from a previous CGMES import
    #[serde(default)]
    pub cgmes_metadata: Option<CgmesMetadataModels>,
    /// Bus to topological-node mapping preserved from a previous CGMES import
    #[serde(default)]
    pub cgmes_topology: Option<CgmesTopology>,
}

impl Network {
    pub fn new(id: &str, case_date: DateTime<Utc>) -> Self {
        Self {
            id: id.to_string(),
            name: id.to_string(),
            case_date,
            forecast_distance: 0,
            substations: Vec::new(),
            voltage_levels: Vec::new(),
            buses: Vec::new(),
            loads: Vec::new(),
            generators: Vec::new(),
            shunt_compensators: Vec::new(),
            static_var_compensators: Vec::new(),
            lines: Vec::new(),
            two_windings_transformers: Vec::new(),
            dangling_lines: Vec::new(),
            switches: Vec::new(),
            hvdc_converter_stations: Vec::new(),
            hvdc_lines: Vec::new(),
            cgmes_metadata: None,
            cgmes_topology: None,
        }
    }

    /// Load a network snapshot from its JSON representation
    pub fn from_json_str(json: &str) -> GridResult<Self> {
        Ok(serde_json::from_str(json)?)
    }

    /// Load a network snapshot from a JSON file
    pub fn load_json(path: impl AsRef<Path>) -> GridResult<Self> {
        let content = std::fs::read_to_string(path.as_ref())?;
        Self::from_json_str(&content)
    }

    pub fn substation(&self, id: &str) -> Option<&Substation> {
        self.substations.iter().find(|s| s.id == id)
    }

    pub fn voltage_level(&self, id: &str) -> Option<&VoltageLevel> {
        self.voltage_levels.iter().find(|vl| vl.id == id)
    }

    pub fn bus(&self, id: &str) -> Option<&Bus> {
        self.buses.iter().find(|b| b.id == id)
    }

    pub fn hvdc_converter_station(&self, id: &str) -> Option<&HvdcConverterStation> {
        self.hvdc_converter_stations.iter().find(|c| c.id == id)
    }

    pub fn buses_in_voltage_level<'a>(&'a self, vl_id: &'a str) -> impl Iterator<Item = &'a Bus> {
        self.buses.iter().filter(move |b| b.voltage_level_id == vl_id)
    }

    /// Every equipment terminal, in canonical order: injections (loads, generators, shunts,
    /// SVCs, dangling lines, converter stations) then branches (lines, transformers, switches).
    pub fn terminals(&self) -> Vec<TerminalRef<'_>> {
        let mut terminals = Vec::new();

        for load in &self.loads {
            terminals.push(single_terminal(
                EquipmentKind::Load,
                &load.id,
                &load.voltage_level_id,
                &load.bus,
                &load.aliases,
                load.p,
                load.q,
            ));
        }
        for gen in &self.generators {
            terminals.push(single_terminal(
                EquipmentKind::Generator,
                &gen.id,
                &gen.voltage_level_id,
                &gen.bus,
                &gen.aliases,
                gen.p,
                gen.q,
            ));
        }
        for shunt in &self.shunt_compensators {
            terminals.push(single_terminal(
                EquipmentKind::ShuntCompensator,
                &shunt.id,
                &shunt.voltage_level_id,
                &shunt.bus,
                &shunt.aliases,
                shunt.p,
                shunt.q,
            ));
        }
        for svc in &self.static_var_compensators {
            terminals.push(single_terminal(
                EquipmentKind::StaticVarCompensator,
                &svc.id,
                &svc.voltage_level_id,
                &svc.bus,
                &svc.aliases,
                svc.p,
                svc.q,
            ));
        }
        for dl in &self.dangling_lines {
            terminals.push(single_terminal(
                EquipmentKind::DanglingLine,
                &dl.id,
                &dl.voltage_level_id,
                &dl.bus,
                &dl.aliases,
                dl.p,
                dl.q,
            ));
        }
        for station in &self.hvdc_converter_stations {
            terminals.push(single_terminal(
                EquipmentKind::HvdcConverterStation,
                &station.id,
                &station.voltage_level_id,
                &station.bus,
                &station.aliases,
                station.p,
                station.q,
            ));
        }
        for line in &self.lines {
            terminals.extend(branch_terminals(
                EquipmentKind::Line,
                &line.id,
                [&line.voltage_level1_id, &line.voltage_level2_id],
                [&line.bus1, &line.bus2],
                &line.aliases,
                [(line.p1, line.q1), (line.p2, line.q2)],
            ));
        }
        for twt in &self.two_windings_transformers {
            terminals.extend(branch_terminals(
                EquipmentKind::TwoWindingsTransformer,
                &twt.id,
                [&twt.voltage_level1_id, &twt.voltage_level2_id],
                [&twt.bus1, &twt.bus2],
                &twt.aliases,
                [(twt.p1, twt.q1), (twt.p2, twt.q2)],
            ));
        }
        for switch in &self.switches {
            terminals.extend(branch_terminals(
                EquipmentKind::Switch,
                &switch.id,
                [&switch.voltage_level_id, &switch.voltage_level_id],
                [&switch.bus1, &switch.bus2],
                &switch.aliases,
                [
                    (Megawatts::unknown(), Megavars::unknown()),
                    (Megawatts::unknown(), Megavars::unknown()),
                ],
            ));
        }

        terminals
    }

    /// Bus a terminal is connected to. `side` selects the branch side (defaults to side one).
    pub fn terminal_bus(&self, equipment_id: &str, side: Option<Side>) -> Option<&Bus> {
        let sequence_number = side.unwrap_or(Side::One).sequence_number();
        let terminals = self.terminals();
        let bus_id = terminals
            .iter()
            .find(|t| t.equipment_id == equipment_id && t.sequence_number == sequence_number)
            .and_then(|t| t.bus)?;
        self.bus(bus_id)
    }

    /// Compute basic statistics about the network
    pub fn stats(&self) -> NetworkStats {
        NetworkStats {
            num_substations: self.substations.len(),
            num_voltage_levels: self.voltage_levels.len(),
            num_buses: self.buses.len(),
            num_injections: self.loads.len()
                + self.generators.len()
                + self.shunt_compensators.len()
                + self.static_var_compensators.len()
                + self.dangling_lines.len()
                + self.hvdc_converter_stations.len(),
            num_branches: self.lines.len() + self.two_windings_transformers.len(),
            num_switches: self.switches.len(),
            total_load_mw: self.loads.iter().map(|l| l.p0).sum::<Megawatts>().value(),
        }
    }

    /// Check referential integrity. Dangling references are reported, not fixed.
    pub fn validate_into(&self, diag: &mut Diagnostics) {
        if self.buses.is_empty() {
            diag.add_warning("structure", "Network has no buses");
        }
        for vl in &self.voltage_levels {
            if self.substation(&vl.substation_id).is_none() {
                diag.add_error_with_entity(
                    "reference",
                    &format!("Unknown substation '{}'", vl.substation_id),
                    &vl.id,
                );
            }
        }
        for bus in &self.buses {
            if self.voltage_level(&bus.voltage_level_id).is_none() {
                diag.add_error_with_entity(
                    "reference",
                    &format!("Unknown voltage level '{}'", bus.voltage_level_id),
                    &bus.id,
                );
            }
        }
        for terminal in self.terminals() {
            if self.voltage_level(terminal.voltage_level_id).is_none() {
                diag.add_error_with_entity(
                    "reference",
                    &format!("Unknown voltage level '{}'", terminal.voltage_level_id),
                    terminal.equipment_id,
                );
            }
            if let Some(bus_id) = terminal.bus {
                if self.bus(bus_id).is_none() {
                    diag.add_error_with_entity(
                        "reference",
                        &format!("Unknown bus '{}'", bus_id),
                        terminal.equipment_id,
                    );
                }
            }
        }
    }
}

fn single_terminal<'a>(
    kind: EquipmentKind,
    equipment_id: &'a str,
    voltage_level_id: &'a str,
    bus: &'a Option<String>,
    aliases: &'a Aliases,
    p: Megawatts,
    q: Megavars,
) -> TerminalRef<'a> {
    TerminalRef {
        kind,
        equipment_id,
        sequence_number: 1,
        voltage_level_id,
        bus: bus.as_deref(),
        aliases,
        p,
        q,
    }
}

fn branch_terminals<'a>(
    kind: EquipmentKind,
    equipment_id: &'a str,
    voltage_level_ids: [&'a str; 2],
    buses: [&'a Option<String>; 2],
    aliases: &'a Aliases,
    flows: [(Megawatts, Megavars); 2],
) -> [TerminalRef<'a>; 2] {
    [Side::One, Side::Two].map(|side| {
        let i = side.sequence_number() as usize - 1;
        TerminalRef {
            kind,
            equipment_id,
            sequence_number: side.sequence_number(),
            voltage_level_id: voltage_level_ids[i],
            bus: buses[i].as_deref(),
            aliases,
            p: flows[i].0,
            q: flows[i].1,
        }
    })
}

/// Statistics about a network's size
#[derive(Debug, Clone, Default, Serialize)]
pub struct NetworkStats {
    pub num_substations: usize,
    pub num_voltage_levels: usize,
    pub num_buses: usize,
    pub num_injections: usize,
    pub num_branches: usize,
    pub num_switches: usize,
    pub total_load_mw: f64,
}

impl std::fmt::Display for NetworkStats {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{} substations, {} voltage levels, {} buses, ",
            self.num_substations, self.num_voltage_levels, self.num_buses
        )?;
        write!(
            f,
            "{} injections, {} branches, {} switches ({:.0} MW load)",
            self.num_injections, self.num_branches, self.num_switches, self.total_load_mw
        )
    }
}
