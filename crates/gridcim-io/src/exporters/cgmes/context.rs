//! Per-export bookkeeping shared by the four profile writers.
//!
//! An [`ExportContext`] is created once per export run and threaded by reference through the
//! writers in sequence. It owns:
//!
//! - the CIM version and the scenario/creation times,
//! - one [`ModelDescription`] per profile,
//! - the bus to topological-node mapping and the set of topological nodes not yet matched to
//!   any bus.
//!
//! The only state mutated after construction is the unmapped-node set (see
//! [`ExportContext::mark_mapped`]) and the record of terminals already reported without an id.
//! A context is not meant to be shared between threads.

use super::error::ExportResult;
use super::naming::{format_double, model_urn, uuid5};
use super::options::ExportOptions;
use super::profile::{CimVersion, Profile};
use chrono::{DateTime, Utc};
use gridcim_core::{CgmesModel, Network, TerminalRef};
use serde::{Deserialize, Serialize};
use std::borrow::Cow;
use std::collections::{BTreeMap, BTreeSet};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

pub const DEFAULT_MODELING_AUTHORITY_SET: &str = "powsybl.org";

/// How bus-view buses are translated into CIM topological nodes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TopologyMappingPolicy {
    /// Only buses present in the mapping are exported; others have no topological node.
    MappingOnly,
    /// Mapped buses use the mapping; others fall back to a node named after the bus.
    PartialMapping,
    /// Every bus is its own topological node.
    NoMapping,
}

impl fmt::Display for TopologyMappingPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            TopologyMappingPolicy::MappingOnly => "mapping_only",
            TopologyMappingPolicy::PartialMapping => "partial_mapping",
            TopologyMappingPolicy::NoMapping => "no_mapping",
        };
        f.write_str(name)
    }
}

impl FromStr for TopologyMappingPolicy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().replace('-', "_").as_str() {
            "mapping_only" => Ok(TopologyMappingPolicy::MappingOnly),
            "partial_mapping" => Ok(TopologyMappingPolicy::PartialMapping),
            "no_mapping" => Ok(TopologyMappingPolicy::NoMapping),
            other => Err(format!(
                "unknown topology mapping policy '{}' \
                 (expected mapping_only, partial_mapping or no_mapping)",
                other
            )),
        }
    }
}

/// Content of a profile's `md:FullModel` header
#[derive(Debug, Clone, PartialEq)]
pub struct ModelDescription {
    /// `urn:uuid:` identifier of this export's document
    pub id: String,
    pub description: String,
    pub version: u32,
    /// Model URNs this document depends on, in declaration order
    pub dependencies: Vec<String>,
    pub modeling_authority_set: String,
}

impl ModelDescription {
    fn fresh(profile: Profile, network: &Network) -> Self {
        Self {
            id: model_urn(&Uuid::new_v4()),
            description: format!("{} {} Model", network.name, profile),
            version: 1,
            dependencies: Vec::new(),
            modeling_authority_set: DEFAULT_MODELING_AUTHORITY_SET.to_string(),
        }
    }

    /// Continue a previously imported model: same description and authority, next version,
    /// prior dependencies kept.
    fn continued(profile: Profile, network: &Network, prior: &CgmesModel) -> Self {
        let mut model = Self::fresh(profile, network);
        if !prior.description.is_empty() {
            model.description = prior.description.clone();
        }
        model.version = prior.version.saturating_add(1);
        for dependency in &prior.dependencies {
            model.add_dependency(dependency);
        }
        if let Some(authority) = &prior.modeling_authority_set {
            model.modeling_authority_set = authority.clone();
        }
        model
    }

    /// Append a dependency unless already declared
    pub fn add_dependency(&mut self, urn: &str) {
        if !self.dependencies.iter().any(|d| d == urn) {
            self.dependencies.push(urn.to_string());
        }
    }

    pub fn clear_dependencies(&mut self) {
        self.dependencies.clear();
    }
}

/// Mutable state of one export run
#[derive(Debug, Clone)]
pub struct ExportContext {
    cim_version: CimVersion,
    scenario_time: DateTime<Utc>,
    created: DateTime<Utc>,
    naming_namespace: Uuid,
    derive_missing_terminal_ids: bool,
    indent: bool,
    models: BTreeMap<Profile, ModelDescription>,
    policy: TopologyMappingPolicy,
    bus_topological_nodes: BTreeMap<String, BTreeSet<String>>,
    unmapped_topological_nodes: BTreeSet<String>,
    /// `(equipment id, sequence number)` of terminals reported without a CGMES id
    unidentified_terminals: BTreeSet<(String, u8)>,
}

impl ExportContext {
    /// Set up a context for exporting `network`.
    ///
    /// Fails only on an unsupported CIM version.
    pub fn new(network: &Network, options: &ExportOptions) -> ExportResult<Self> {
        let cim_version = CimVersion::try_from(options.cim_version)?;
        let policy = options.topology_mapping_policy.unwrap_or(match network.cgmes_topology {
            Some(_) => TopologyMappingPolicy::PartialMapping,
            None => TopologyMappingPolicy::NoMapping,
        });

        let mut models = BTreeMap::new();
        for profile in Profile::ALL {
            let prior = network
                .cgmes_metadata
                .as_ref()
                .and_then(|metadata| match profile {
                    Profile::Equipment => metadata.eq.as_ref(),
                    Profile::Topology => metadata.tp.as_ref(),
                    Profile::SteadyStateHypothesis => metadata.ssh.as_ref(),
                    Profile::StateVariables => metadata.sv.as_ref(),
                });
            let mut model = match prior {
                Some(prior) => ModelDescription::continued(profile, network, prior),
                None => ModelDescription::fresh(profile, network),
            };
            if let Some(authority) = &options.modeling_authority_set {
                model.modeling_authority_set = authority.clone();
            }
            models.insert(profile, model);
        }

        let (bus_topological_nodes, unmapped_topological_nodes) = match &network.cgmes_topology {
            Some(topology) => {
                let mapping = match policy {
                    TopologyMappingPolicy::NoMapping => BTreeMap::new(),
                    _ => topology.bus_topological_nodes.clone(),
                };
                (mapping, topology.unmapped_topological_nodes.clone())
            }
            None => (BTreeMap::new(), BTreeSet::new()),
        };

        let mut context = Self {
            cim_version,
            scenario_time: network.case_date,
            created: Utc::now(),
            naming_namespace: options.naming_namespace,
            derive_missing_terminal_ids: options.derive_missing_terminal_ids,
            indent: options.indent,
            models,
            policy,
            bus_topological_nodes,
            unmapped_topological_nodes,
            unidentified_terminals: BTreeSet::new(),
        };

        if options.with_export_dependencies {
            let exported = options.ordered_profiles();
            let declare = |context: &mut Self, dependent: Profile, dependency: Profile| {
                if exported.contains(&dependent) && exported.contains(&dependency) {
                    let urn = context.models[&dependency].id.clone();
                    context.model_description_mut(dependent).add_dependency(&urn);
                }
            };
            declare(&mut context, Profile::Topology, Profile::Equipment);
            declare(&mut context, Profile::SteadyStateHypothesis, Profile::Equipment);
            declare(&mut context, Profile::StateVariables, Profile::Topology);
            declare(&mut context, Profile::StateVariables, Profile::SteadyStateHypothesis);
        }

        Ok(context)
    }

    pub fn cim_version(&self) -> CimVersion {
        self.cim_version
    }

    pub fn scenario_time(&self) -> DateTime<Utc> {
        self.scenario_time
    }

    pub fn created(&self) -> DateTime<Utc> {
        self.created
    }

    /// Whether documents are pretty-printed
    pub fn indent(&self) -> bool {
        self.indent
    }

    pub fn topology_mapping_policy(&self) -> TopologyMappingPolicy {
        self.policy
    }

    pub fn model_description(&self, profile: Profile) -> &ModelDescription {
        &self.models[&profile]
    }

    pub fn model_description_mut(&mut self, profile: Profile) -> &mut ModelDescription {
        self.models
            .entry(profile)
            .or_insert_with(|| ModelDescription {
                id: model_urn(&Uuid::new_v4()),
                description: String::new(),
                version: 1,
                dependencies: Vec::new(),
                modeling_authority_set: DEFAULT_MODELING_AUTHORITY_SET.to_string(),
            })
    }

    /// Topological nodes of a bus under the current mapping policy.
    ///
    /// `None` means the bus has no topological node and is left out of TP and SV.
    pub fn topological_nodes_for_bus<'a>(
        &'a self,
        bus_id: &str,
    ) -> Option<Cow<'a, BTreeSet<String>>> {
        let identity = || Cow::Owned(BTreeSet::from([bus_id.to_string()]));
        match self.policy {
            TopologyMappingPolicy::NoMapping => Some(identity()),
            TopologyMappingPolicy::MappingOnly => {
                self.bus_topological_nodes.get(bus_id).map(Cow::Borrowed)
            }
            TopologyMappingPolicy::PartialMapping => Some(
                self.bus_topological_nodes
                    .get(bus_id)
                    .map(Cow::Borrowed)
                    .unwrap_or_else(identity),
            ),
        }
    }

    /// Record that `topological_node` has been matched. Returns whether it was still unmapped.
    pub fn mark_mapped(&mut self, topological_node: &str) -> bool {
        self.unmapped_topological_nodes.remove(topological_node)
    }

    pub fn unmapped_topological_nodes(&self) -> &BTreeSet<String> {
        &self.unmapped_topological_nodes
    }

    /// CGMES id of a terminal: its preserved alias, else a derived id when allowed.
    pub fn terminal_id(&self, terminal: &TerminalRef<'_>) -> Option<String> {
        if let Some(id) = terminal.cgmes_id() {
            return Some(id.to_string());
        }
        if self.derive_missing_terminal_ids {
            return Some(self.derived_id(&format!(
                "{}_{}",
                terminal.equipment_id, terminal.sequence_number
            )));
        }
        None
    }

    /// Record a terminal found without a CGMES id. Returns false when it was already recorded
    /// by an earlier profile of this export.
    pub fn note_unidentified_terminal(&mut self, terminal: &TerminalRef<'_>) -> bool {
        self.unidentified_terminals
            .insert((terminal.equipment_id.to_string(), terminal.sequence_number))
    }

    /// Deterministic id for an object that has no identifier in the network model
    pub fn derived_id(&self, name: &str) -> String {
        uuid5(&self.naming_namespace, name).to_string()
    }

    pub fn base_voltage_id(&self, nominal_v: f64) -> String {
        self.derived_id(&format!("BaseVoltage_{}", format_double(nominal_v)))
    }
}
