//! CGMES provenance preserved on a network that was originally imported from CGMES.
//!
//! Re-exporting such a network must keep the model history intact: versions are bumped rather
//! than reset, dependencies and modeling authorities are carried over, and the original
//! bus to topological-node mapping is reused.

use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};

/// Header of one previously imported profile document
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CgmesModel {
    #[serde(default)]
    pub description: String,
    pub version: u32,
    #[serde(default)]
    pub dependencies: Vec<String>,
    #[serde(default)]
    pub modeling_authority_set: Option<String>,
}

/// Previously imported headers, one optional entry per profile
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CgmesMetadataModels {
    #[serde(default)]
    pub eq: Option<CgmesModel>,
    #[serde(default)]
    pub tp: Option<CgmesModel>,
    #[serde(default)]
    pub ssh: Option<CgmesModel>,
    #[serde(default)]
    pub sv: Option<CgmesModel>,
}

/// Mapping between bus-view buses and the topological nodes they were built from
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CgmesTopology {
    #[serde(default)]
    pub bus_topological_nodes: BTreeMap<String, BTreeSet<String>>,
    /// Topological nodes of the imported data (typically boundary nodes) that no bus maps to
    #[serde(default)]
    pub unmapped_topological_nodes: BTreeSet<String>,
}

impl CgmesTopology {
    pub fn with_bus(mut self, bus_id: &str, topological_nodes: &[&str]) -> Self {
        self.bus_topological_nodes.insert(
            bus_id.to_string(),
            topological_nodes.iter().map(|tn| tn.to_string()).collect(),
        );
        self
    }

    pub fn with_unmapped(mut self, topological_node: &str) -> Self {
        self.unmapped_topological_nodes
            .insert(topological_node.to_string());
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_topology_builder() {
        let topology = CgmesTopology::default()
            .with_bus("B1", &["TN1", "TN2"])
            .with_unmapped("TN_BOUNDARY");

        assert_eq!(topology.bus_topological_nodes["B1"].len(), 2);
        assert!(topology.unmapped_topological_nodes.contains("TN_BOUNDARY"));
    }

    #[test]
    fn test_metadata_deserializes_partial_profiles() {
        let json = r#"{"sv": {"version": 4, "dependencies": ["urn:uuid:a"]}}"#;
        let models: CgmesMetadataModels = serde_json::from_str(json).unwrap();

        assert!(models.eq.is_none());
        let sv = models.sv.unwrap();
        assert_eq!(sv.version, 4);
        assert_eq!(sv.dependencies, vec!["urn:uuid:a".to_string()]);
        assert!(sv.modeling_authority_set.is_none());
    }
}
