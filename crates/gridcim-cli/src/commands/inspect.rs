//! `gridcim inspect`: network size and topology summary.

use anyhow::{Context, Result};
use gridcim_cli::OutputFormat;
use gridcim_core::{topology_stats, Diagnostics, Network};
use std::path::Path;

pub fn handle(path: &Path, format: OutputFormat) -> Result<()> {
    let network = Network::load_json(path)
        .with_context(|| format!("loading network from {}", path.display()))?;
    let stats = network.stats();
    let topology = topology_stats(&network);
    let mut diagnostics = Diagnostics::new();
    network.validate_into(&mut diagnostics);

    match format {
        OutputFormat::Json => {
            let value = serde_json::json!({
                "id": network.id,
                "case_date": network.case_date.to_rfc3339(),
                "stats": stats,
                "topology": topology,
                "diagnostics": diagnostics,
            });
            println!("{}", serde_json::to_string_pretty(&value)?);
        }
        OutputFormat::Plain => {
            println!("Network {} ({})", network.id, network.case_date.to_rfc3339());
            println!("  {}", stats);
            println!("Topology:");
            println!("  Buses                 : {}", topology.bus_count);
            println!("  AC edges              : {}", topology.ac_edge_count);
            println!("  Connected components  : {}", topology.connected_components);
            println!("  Synchronous components: {}", topology.synchronous_components);
            println!("  Isolated buses        : {}", topology.isolated_buses);
            println!(
                "CGMES provenance: metadata {}, topology mapping {}",
                if network.cgmes_metadata.is_some() { "yes" } else { "no" },
                if network.cgmes_topology.is_some() { "yes" } else { "no" },
            );
            print!("{}", diagnostics);
        }
    }
    Ok(())
}
