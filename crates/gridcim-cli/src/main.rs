use anyhow::Result;
use clap::Parser;
use gridcim_cli::{Cli, Commands};
use tracing_subscriber::FmtSubscriber;

mod commands;

fn main() -> Result<()> {
    let cli = Cli::parse();

    let subscriber = FmtSubscriber::builder()
        .with_max_level(cli.log_level)
        .with_writer(std::io::stderr)
        .finish();
    tracing::subscriber::set_global_default(subscriber)?;

    match &cli.command {
        Commands::Export {
            network,
            output,
            base_name,
            config,
            cim_version,
            policy,
            profiles,
            modeling_authority_set,
            strict,
        } => commands::export::handle(&commands::export::ExportArgs {
            network,
            output,
            base_name: base_name.as_deref(),
            config: config.as_deref(),
            cim_version: *cim_version,
            policy: *policy,
            profiles: profiles.as_deref(),
            modeling_authority_set: modeling_authority_set.as_deref(),
            strict: *strict,
        }),
        Commands::Inspect { network, format } => commands::inspect::handle(network, *format),
    }
}
