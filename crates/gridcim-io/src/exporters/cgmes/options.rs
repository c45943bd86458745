//! Export configuration.
//!
//! Options can be built in code or loaded from a TOML file where unspecified values use the
//! defaults below:
//!
//! ```toml
//! cim_version = 16
//! topology_mapping_policy = "mapping_only"
//! modeling_authority_set = "http://example.com/authority"
//! profiles = ["EQ", "TP", "SSH", "SV"]
//! ```

use super::context::TopologyMappingPolicy;
use super::profile::Profile;
use gridcim_core::{GridError, GridResult};
use serde::{Deserialize, Serialize};
use std::path::Path;
use uuid::Uuid;

/// Namespace of the name-based identifiers when none is configured.
pub const DEFAULT_NAMING_NAMESPACE: Uuid =
    Uuid::from_u128(0x5b3c_6f0e_2d4a_4e1b_9c77_41d2_a8e6_f309);

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ExportOptions {
    /// CIM schema version (16 or 100)
    pub cim_version: u32,

    /// Bus to topological-node mapping policy. When unset, `PartialMapping` is used if the
    /// network carries a mapping and `NoMapping` otherwise.
    pub topology_mapping_policy: Option<TopologyMappingPolicy>,

    /// Overrides the modeling authority set of every profile.
    pub modeling_authority_set: Option<String>,

    /// Namespace for name-based (UUID v5) identifiers.
    pub naming_namespace: Uuid,

    /// Derive an id for terminals without a `CGMES.Terminal<n>` alias. When off, such terminals
    /// are reported and left out of TP and SV.
    pub derive_missing_terminal_ids: bool,

    /// Declare dependencies between the documents of this export (TP/SSH on EQ, SV on TP/SSH).
    pub with_export_dependencies: bool,

    pub profiles: Vec<Profile>,

    /// Pretty-print the XML output
    pub indent: bool,
}

impl Default for ExportOptions {
    fn default() -> Self {
        Self {
            cim_version: 16,
            topology_mapping_policy: None,
            modeling_authority_set: None,
            naming_namespace: DEFAULT_NAMING_NAMESPACE,
            derive_missing_terminal_ids: true,
            with_export_dependencies: true,
            profiles: Profile::ALL.to_vec(),
            indent: true,
        }
    }
}

impl ExportOptions {
    pub fn from_toml_str(content: &str) -> GridResult<Self> {
        toml::from_str(content).map_err(|e| GridError::Config(e.to_string()))
    }

    pub fn load(path: impl AsRef<Path>) -> GridResult<Self> {
        let content = std::fs::read_to_string(path.as_ref())?;
        Self::from_toml_str(&content)
    }

    /// Requested profiles in canonical order, without duplicates
    pub fn ordered_profiles(&self) -> Vec<Profile> {
        Profile::ALL
            .into_iter()
            .filter(|p| self.profiles.contains(p))
            .collect()
    }
}
