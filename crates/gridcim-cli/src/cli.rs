use clap::{Parser, Subcommand, ValueEnum, ValueHint};
use gridcim_io::exporters::cgmes::{Profile, TopologyMappingPolicy};
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(author, version, about = "Export bus-view power networks as CGMES", long_about = None)]
pub struct Cli {
    /// Set the logging level
    #[arg(long, default_value = "info")]
    pub log_level: tracing::Level,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Export a network as CGMES EQ/TP/SSH/SV documents
    Export {
        /// Network snapshot (JSON)
        #[arg(value_hint = ValueHint::FilePath)]
        network: PathBuf,
        /// Output directory
        #[arg(short, long, value_hint = ValueHint::DirPath)]
        output: PathBuf,
        /// Base name of the produced files (defaults to the network id)
        #[arg(long)]
        base_name: Option<String>,
        /// Export options file (TOML); the flags below override it
        #[arg(long, value_hint = ValueHint::FilePath)]
        config: Option<PathBuf>,
        /// CIM version (16 or 100)
        #[arg(long)]
        cim_version: Option<u32>,
        /// Topology mapping policy (mapping_only, partial_mapping, no_mapping)
        #[arg(long)]
        policy: Option<TopologyMappingPolicy>,
        /// Profiles to export, comma separated (e.g. "EQ,TP")
        #[arg(long, value_delimiter = ',')]
        profiles: Option<Vec<Profile>>,
        /// Modeling authority set written in every header
        #[arg(long)]
        modeling_authority_set: Option<String>,
        /// Fail when the export reports any error diagnostic
        #[arg(long)]
        strict: bool,
    },
    /// Summarize a network and its bus-view topology
    Inspect {
        /// Network snapshot (JSON)
        #[arg(value_hint = ValueHint::FilePath)]
        network: PathBuf,
        /// Output format
        #[arg(long, value_enum, default_value_t = OutputFormat::Plain)]
        format: OutputFormat,
    },
}

#[derive(ValueEnum, Clone, Copy, Debug, PartialEq, Eq)]
pub enum OutputFormat {
    Plain,
    Json,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_export_overrides() {
        let cli = Cli::try_parse_from([
            "gridcim",
            "export",
            "grid.json",
            "-o",
            "out",
            "--policy",
            "no-mapping",
            "--profiles",
            "eq,sv",
        ])
        .unwrap();

        match cli.command {
            Commands::Export {
                policy, profiles, ..
            } => {
                assert_eq!(policy, Some(TopologyMappingPolicy::NoMapping));
                assert_eq!(
                    profiles,
                    Some(vec![Profile::Equipment, Profile::StateVariables])
                );
            }
            other => panic!("unexpected command {:?}", other),
        }
    }

    #[test]
    fn rejects_unknown_profile() {
        let result = Cli::try_parse_from([
            "gridcim",
            "export",
            "grid.json",
            "-o",
            "out",
            "--profiles",
            "XX",
        ]);
        assert!(result.is_err());
    }
}
