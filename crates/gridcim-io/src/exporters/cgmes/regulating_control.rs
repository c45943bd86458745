//! Merging of regulating controls shared by several pieces of equipment.
//!
//! A regulating control is referenced by id from shunts, generators, SVCs and tap changers.
//! Each referencing equipment contributes a [`RegulatingControlView`] built from its own local
//! state. Views are grouped by control id in equipment enumeration order (shunts, generators,
//! SVCs, then ratio and phase tap changers of each transformer) and each group is reduced to a
//! single record by [`combine`].

use gridcim_core::{
    Diagnostics, Network, PhaseRegulationMode, PhaseTapChanger, RatioTapChanger, Side,
    SvcRegulationMode,
};
use std::collections::BTreeMap;
use tracing::{debug, warn};

const CATEGORY: &str = "regulating-control";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RegulatingControlKind {
    RegulatingControl,
    TapChangerControl,
}

impl RegulatingControlKind {
    pub fn class_name(self) -> &'static str {
        match self {
            RegulatingControlKind::RegulatingControl => "RegulatingControl",
            RegulatingControlKind::TapChangerControl => "TapChangerControl",
        }
    }
}

/// `RegulatingControlModeKind` values
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RegulatingControlMode {
    Voltage,
    ReactivePower,
    ActivePower,
    CurrentFlow,
    Fixed,
}

impl RegulatingControlMode {
    pub fn cim_name(self) -> &'static str {
        match self {
            RegulatingControlMode::Voltage => "voltage",
            RegulatingControlMode::ReactivePower => "reactivePower",
            RegulatingControlMode::ActivePower => "activePower",
            RegulatingControlMode::CurrentFlow => "currentFlow",
            RegulatingControlMode::Fixed => "fixed",
        }
    }
}

/// `UnitMultiplier` of a regulating control's target value
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UnitMultiplier {
    None,
    Kilo,
    Mega,
}

impl UnitMultiplier {
    pub fn cim_name(self) -> &'static str {
        match self {
            UnitMultiplier::None => "none",
            UnitMultiplier::Kilo => "k",
            UnitMultiplier::Mega => "M",
        }
    }
}

/// One equipment's view of a shared regulating control
#[derive(Debug, Clone, PartialEq)]
pub struct RegulatingControlView {
    pub control_id: String,
    pub kind: RegulatingControlKind,
    pub mode: RegulatingControlMode,
    pub discrete: bool,
    pub control_enabled: bool,
    pub target_deadband: f64,
    pub target_value: f64,
    pub unit_multiplier: UnitMultiplier,
    /// Equipment whose terminal is the control point
    pub equipment_id: String,
    pub side: Side,
}

/// Views grouped by control id, each group in contribution order
pub fn collect_views(network: &Network) -> BTreeMap<String, Vec<RegulatingControlView>> {
    let mut views: BTreeMap<String, Vec<RegulatingControlView>> = BTreeMap::new();
    let mut push = |view: RegulatingControlView| {
        views.entry(view.control_id.clone()).or_default().push(view);
    };

    for shunt in &network.shunt_compensators {
        if let Some(control_id) = &shunt.regulating_control_id {
            push(RegulatingControlView {
                control_id: control_id.clone(),
                kind: RegulatingControlKind::RegulatingControl,
                mode: RegulatingControlMode::Voltage,
                discrete: true,
                control_enabled: shunt.voltage_regulation_on,
                target_deadband: shunt.target_deadband,
                target_value: shunt.target_v.value(),
                unit_multiplier: UnitMultiplier::Kilo,
                equipment_id: shunt.id.clone(),
                side: Side::One,
            });
        }
    }
    for gen in &network.generators {
        if let Some(control_id) = &gen.regulating_control_id {
            push(RegulatingControlView {
                control_id: control_id.clone(),
                kind: RegulatingControlKind::RegulatingControl,
                mode: RegulatingControlMode::Voltage,
                discrete: false,
                control_enabled: gen.voltage_regulator_on,
                target_deadband: gen.regulating_deadband,
                target_value: gen.target_v.value(),
                unit_multiplier: UnitMultiplier::Kilo,
                equipment_id: gen.id.clone(),
                side: Side::One,
            });
        }
    }
    for svc in &network.static_var_compensators {
        if let Some(control_id) = &svc.regulating_control_id {
            let (mode, target_value, unit_multiplier) = match svc.regulation_mode {
                SvcRegulationMode::ReactivePower => (
                    RegulatingControlMode::ReactivePower,
                    svc.reactive_power_setpoint.value(),
                    UnitMultiplier::Mega,
                ),
                SvcRegulationMode::Voltage | SvcRegulationMode::Off => (
                    RegulatingControlMode::Voltage,
                    svc.voltage_setpoint.value(),
                    UnitMultiplier::Kilo,
                ),
            };
            push(RegulatingControlView {
                control_id: control_id.clone(),
                kind: RegulatingControlKind::RegulatingControl,
                mode,
                discrete: false,
                control_enabled: svc.regulation_mode != SvcRegulationMode::Off,
                target_deadband: 0.0,
                target_value,
                unit_multiplier,
                equipment_id: svc.id.clone(),
                side: Side::One,
            });
        }
    }
    for twt in &network.two_windings_transformers {
        if let Some(rtc) = &twt.ratio_tap_changer {
            if let Some(view) = ratio_tap_changer_view(&twt.id, rtc) {
                push(view);
            }
        }
        if let Some(ptc) = &twt.phase_tap_changer {
            if let Some(view) = phase_tap_changer_view(&twt.id, ptc) {
                push(view);
            }
        }
    }

    views
}

fn ratio_tap_changer_view(twt_id: &str, rtc: &RatioTapChanger) -> Option<RegulatingControlView> {
    let control_id = rtc.regulating_control_id.as_ref()?;
    Some(RegulatingControlView {
        control_id: control_id.clone(),
        kind: RegulatingControlKind::TapChangerControl,
        mode: RegulatingControlMode::Voltage,
        discrete: true,
        control_enabled: rtc.regulating,
        target_deadband: rtc.target_deadband,
        target_value: rtc.target_v.value(),
        unit_multiplier: UnitMultiplier::Kilo,
        equipment_id: twt_id.to_string(),
        side: Side::Two,
    })
}

fn phase_tap_changer_view(twt_id: &str, ptc: &PhaseTapChanger) -> Option<RegulatingControlView> {
    let control_id = ptc.regulating_control_id.as_ref()?;
    let (mode, unit_multiplier) = match ptc.regulation_mode {
        PhaseRegulationMode::CurrentLimiter => {
            (RegulatingControlMode::CurrentFlow, UnitMultiplier::None)
        }
        PhaseRegulationMode::ActivePowerControl => {
            (RegulatingControlMode::ActivePower, UnitMultiplier::Mega)
        }
        PhaseRegulationMode::FixedTap => (RegulatingControlMode::Fixed, UnitMultiplier::None),
    };
    Some(RegulatingControlView {
        control_id: control_id.clone(),
        kind: RegulatingControlKind::TapChangerControl,
        mode,
        discrete: true,
        control_enabled: ptc.regulating,
        target_deadband: ptc.target_deadband,
        target_value: ptc.regulation_value,
        unit_multiplier,
        equipment_id: twt_id.to_string(),
        side: Side::One,
    })
}

/// Reduce the views of one control to a single record.
///
/// The first view is the base. Later views can only upgrade it: a positive deadband replaces a
/// non-positive one, and `discrete` / `control_enabled` become true if any view sets them. Every
/// other field comes from the base. Returns `None` for an empty slice.
pub fn combine(views: &[RegulatingControlView]) -> Option<RegulatingControlView> {
    let (base, rest) = views.split_first()?;
    let mut merged = base.clone();
    for view in rest {
        let base_unset = merged.target_deadband.is_nan() || merged.target_deadband <= 0.0;
        if base_unset && view.target_deadband > 0.0 {
            merged.target_deadband = view.target_deadband;
        }
        merged.discrete |= view.discrete;
        merged.control_enabled |= view.control_enabled;
    }
    Some(merged)
}

/// A merged control with what was learned while merging it
#[derive(Debug, Clone)]
pub struct MergedRegulatingControl {
    pub control: RegulatingControlView,
    pub view_count: usize,
    /// Later views whose target value or unit multiplier differ from the base view
    pub conflicting_equipment: Vec<String>,
}

/// One merged record per distinct control id, ordered by id
pub fn merge_regulating_controls(network: &Network) -> Vec<MergedRegulatingControl> {
    collect_views(network)
        .into_iter()
        .filter_map(|(control_id, views)| {
            let control = combine(&views)?;
            if views.len() > 1 {
                debug!(
                    control = %control_id,
                    views = views.len(),
                    "Combining regulating control views"
                );
            }
            let conflicting_equipment = views[1..]
                .iter()
                .filter(|view| disagrees(&views[0], view))
                .map(|view| view.equipment_id.clone())
                .collect();
            Some(MergedRegulatingControl {
                control,
                view_count: views.len(),
                conflicting_equipment,
            })
        })
        .collect()
}

/// Report merged controls whose views disagree on target value or unit multiplier
pub fn report_conflicts(merged: &[MergedRegulatingControl], diag: &mut Diagnostics) {
    for entry in merged.iter().filter(|m| !m.conflicting_equipment.is_empty()) {
        let control = &entry.control;
        warn!(
            control = %control.control_id,
            kept_from = %control.equipment_id,
            "Regulating control views disagree on target, keeping the first"
        );
        diag.add_warning_with_entity(
            CATEGORY,
            &format!(
                "Target of '{}' differs in {}; kept {} {} from '{}'",
                control.control_id,
                entry.conflicting_equipment.join(", "),
                control.target_value,
                control.unit_multiplier.cim_name(),
                control.equipment_id
            ),
            &control.control_id,
        );
    }
}

fn disagrees(base: &RegulatingControlView, other: &RegulatingControlView) -> bool {
    let same_value = base.target_value == other.target_value
        || (base.target_value.is_nan() && other.target_value.is_nan());
    !same_value || base.unit_multiplier != other.unit_multiplier
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use gridcim_core::{Generator, ShuntCompensator};

    fn view(
        control_id: &str,
        deadband: f64,
        discrete: bool,
        enabled: bool,
    ) -> RegulatingControlView {
        RegulatingControlView {
            control_id: control_id.to_string(),
            kind: RegulatingControlKind::RegulatingControl,
            mode: RegulatingControlMode::Voltage,
            discrete,
            control_enabled: enabled,
            target_deadband: deadband,
            target_value: 400.0,
            unit_multiplier: UnitMultiplier::Kilo,
            equipment_id: format!("EQ-{}", deadband),
            side: Side::One,
        }
    }

    #[test]
    fn test_combine_single_view_is_identity() {
        let single = view("RC", 0.5, false, true);
        assert_eq!(combine(std::slice::from_ref(&single)), Some(single));
        assert_eq!(combine(&[]), None);
    }

    #[test]
    fn test_combine_only_upgrades() {
        let views = [
            view("RC", 0.0, false, false),
            view("RC", 2.0, true, false),
            view("RC", 3.0, false, true),
            view("RC", 0.0, false, false),
        ];
        let merged = combine(&views).unwrap();

        assert_eq!(merged.target_deadband, 2.0);
        assert!(merged.discrete);
        assert!(merged.control_enabled);
        assert_eq!(merged.equipment_id, views[0].equipment_id);
    }

    #[test]
    fn test_combine_keeps_positive_base_deadband() {
        let views = [view("RC", 1.0, false, false), view("RC", 5.0, false, false)];
        let merged = combine(&views).unwrap();
        assert_eq!(merged.target_deadband, 1.0);
    }

    fn shared_control_network(generator_target_v: f64) -> Network {
        let mut network = Network::new("rc", Utc::now());
        network.shunt_compensators.push(
            ShuntCompensator::new("SH1", "VL1", Some("B1"), 0.01)
                .with_voltage_regulation("RC1", 400.0, 0.0),
        );
        network.generators.push(
            Generator::new("G1", "VL1", Some("B1"))
                .with_voltage_regulation("RC1", generator_target_v, 1.5),
        );
        network
    }

    #[test]
    fn test_shunt_and_generator_share_control() {
        let network = shared_control_network(400.0);

        let views = collect_views(&network);
        assert_eq!(views["RC1"].len(), 2);
        assert_eq!(views["RC1"][0].equipment_id, "SH1");

        let merged = merge_regulating_controls(&network);
        assert_eq!(merged.len(), 1);
        assert_eq!(merged[0].view_count, 2);
        assert_eq!(merged[0].control.target_deadband, 1.5);
        assert!(merged[0].control.discrete);
        assert!(merged[0].conflicting_equipment.is_empty());

        let mut diag = Diagnostics::new();
        report_conflicts(&merged, &mut diag);
        assert!(!diag.has_issues());
    }

    #[test]
    fn test_disagreeing_targets_keep_first_and_warn() {
        let network = shared_control_network(410.0);

        let merged = merge_regulating_controls(&network);
        assert_eq!(merged[0].control.target_value, 400.0);
        assert_eq!(merged[0].conflicting_equipment, vec!["G1".to_string()]);

        let mut diag = Diagnostics::new();
        report_conflicts(&merged, &mut diag);
        assert_eq!(diag.warning_count(), 1);
        assert_eq!(diag.issues_by_category(CATEGORY).count(), 1);
    }

    #[test]
    fn test_equipment_without_control_id_contributes_nothing() {
        let mut network = Network::new("rc", Utc::now());
        network
            .shunt_compensators
            .push(ShuntCompensator::new("SH1", "VL1", Some("B1"), 0.01));
        assert!(collect_views(&network).is_empty());
    }
}
