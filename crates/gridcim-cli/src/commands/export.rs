//! `gridcim export`: write a network snapshot as CGMES profile documents.

use anyhow::{bail, Context, Result};
use gridcim_core::Network;
use gridcim_io::exporters::cgmes::{
    export_network_to_cgmes, ExportOptions, Profile, TopologyMappingPolicy,
};
use std::path::Path;
use tracing::{error, info, warn};

pub struct ExportArgs<'a> {
    pub network: &'a Path,
    pub output: &'a Path,
    pub base_name: Option<&'a str>,
    pub config: Option<&'a Path>,
    pub cim_version: Option<u32>,
    pub policy: Option<TopologyMappingPolicy>,
    pub profiles: Option<&'a [Profile]>,
    pub modeling_authority_set: Option<&'a str>,
    pub strict: bool,
}

pub fn handle(args: &ExportArgs<'_>) -> Result<()> {
    let network = Network::load_json(args.network)
        .with_context(|| format!("loading network from {}", args.network.display()))?;
    let options = resolve_options(args)?;
    let base_name = args.base_name.unwrap_or(&network.id);

    info!(
        "Exporting '{}' to {} (CIM{})",
        network.id,
        args.output.display(),
        options.cim_version
    );
    let report = export_network_to_cgmes(&network, args.output, base_name, &options)
        .context("CGMES export")?;

    for issue in report.diagnostics.warnings() {
        warn!("{}", issue);
    }
    for issue in report.diagnostics.errors() {
        error!("{}", issue);
    }
    for file in &report.files {
        println!("{}", file.display());
    }
    println!("Diagnostics: {}", report.diagnostics.summary());

    if args.strict && report.diagnostics.has_errors() {
        bail!(
            "export reported {} error(s)",
            report.diagnostics.error_count()
        );
    }
    Ok(())
}

/// Options from the config file (or defaults) with command-line overrides applied
fn resolve_options(args: &ExportArgs<'_>) -> Result<ExportOptions> {
    let mut options = match args.config {
        Some(path) => ExportOptions::load(path)
            .with_context(|| format!("loading export options from {}", path.display()))?,
        None => ExportOptions::default(),
    };
    if let Some(version) = args.cim_version {
        options.cim_version = version;
    }
    if let Some(policy) = args.policy {
        options.topology_mapping_policy = Some(policy);
    }
    if let Some(profiles) = args.profiles {
        options.profiles = profiles.to_vec();
    }
    if let Some(authority) = args.modeling_authority_set {
        options.modeling_authority_set = Some(authority.to_string());
    }
    Ok(options)
}
