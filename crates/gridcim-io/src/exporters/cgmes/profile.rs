//! Profiles and CIM versions, with the URIs that identify them on the wire.

use super::error::ExportError;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

pub const RDF_NAMESPACE: &str = "http://www.w3.org/1999/02/22-rdf-syntax-ns#";
pub const MD_NAMESPACE: &str = "http://iec.ch/TC57/61970-552/ModelDescription/1#";
pub const ENTSOE_NAMESPACE: &str = "http://entsoe.eu/CIM/SchemaExtension/3/1#";

/// One of the four exported documents
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Profile {
    #[serde(rename = "EQ")]
    Equipment,
    #[serde(rename = "TP")]
    Topology,
    #[serde(rename = "SSH")]
    SteadyStateHypothesis,
    #[serde(rename = "SV")]
    StateVariables,
}

impl Profile {
    /// Canonical export order
    pub const ALL: [Profile; 4] = [
        Profile::Equipment,
        Profile::Topology,
        Profile::SteadyStateHypothesis,
        Profile::StateVariables,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Profile::Equipment => "EQ",
            Profile::Topology => "TP",
            Profile::SteadyStateHypothesis => "SSH",
            Profile::StateVariables => "SV",
        }
    }

    /// `<baseName>_<PROFILE>.xml`
    pub fn file_name(self, base_name: &str) -> String {
        format!("{}_{}.xml", base_name, self.as_str())
    }
}

impl fmt::Display for Profile {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Profile {
    type Err = ExportError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_uppercase().as_str() {
            "EQ" => Ok(Profile::Equipment),
            "TP" => Ok(Profile::Topology),
            "SSH" => Ok(Profile::SteadyStateHypothesis),
            "SV" => Ok(Profile::StateVariables),
            _ => Err(ExportError::UnknownProfile(s.to_string())),
        }
    }
}

/// Supported CIM schema versions: 16 (CGMES 2.4.15) and 100 (CGMES 3.0)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CimVersion {
    Cim16,
    Cim100,
}

impl CimVersion {
    pub fn number(self) -> u32 {
        match self {
            CimVersion::Cim16 => 16,
            CimVersion::Cim100 => 100,
        }
    }

    pub fn namespace(self) -> &'static str {
        match self {
            CimVersion::Cim16 => "http://iec.ch/TC57/2013/CIM-schema-cim16#",
            CimVersion::Cim100 => "http://iec.ch/TC57/CIM100#",
        }
    }

    pub fn profile_uri(self, profile: Profile) -> &'static str {
        match (self, profile) {
            (CimVersion::Cim16, Profile::Equipment) => "http://entsoe.eu/CIM/EquipmentCore/3/1",
            (CimVersion::Cim16, Profile::Topology) => "http://entsoe.eu/CIM/Topology/4/1",
            (CimVersion::Cim16, Profile::SteadyStateHypothesis) => {
                "http://entsoe.eu/CIM/SteadyStateHypothesis/1/1"
            }
            (CimVersion::Cim16, Profile::StateVariables) => {
                "http://entsoe.eu/CIM/StateVariables/4/1"
            }
            (CimVersion::Cim100, Profile::Equipment) => {
                "http://iec.ch/TC57/ns/CIM/CoreEquipment-EU/3.0"
            }
            (CimVersion::Cim100, Profile::Topology) => "http://iec.ch/TC57/ns/CIM/Topology-EU/3.0",
            (CimVersion::Cim100, Profile::SteadyStateHypothesis) => {
                "http://iec.ch/TC57/ns/CIM/SteadyStateHypothesis-EU/3.0"
            }
            (CimVersion::Cim100, Profile::StateVariables) => {
                "http://iec.ch/TC57/ns/CIM/StateVariables-EU/3.0"
            }
        }
    }
}

impl TryFrom<u32> for CimVersion {
    type Error = ExportError;

    fn try_from(value: u32) -> Result<Self, Self::Error> {
        match value {
            16 => Ok(CimVersion::Cim16),
            100 => Ok(CimVersion::Cim100),
            other => Err(ExportError::UnsupportedCimVersion(other)),
        }
    }
}
