//! CGMES multi-profile export.
//!
//! Writes a [`Network`] as four cross-referencing CIM RDF/XML documents:
//!
//! | Profile | Content |
//! |---------|---------|
//! | EQ  | containers, base voltages, equipment, terminals, regulating controls |
//! | TP  | topological nodes, terminal to node connections |
//! | SSH | set-points, switch states, terminal connection flags, regulating control targets |
//! | SV  | topological islands, voltages, flows, sections, tap steps, status |
//!
//! All four documents of one export share a single [`ExportContext`] and are written
//! sequentially in the order above. Fatal conditions (I/O, XML, invalid configuration) surface
//! as [`ExportError`]; skipped elements are reported in the returned [`Diagnostics`].
//!
//! # Example
//!
//! ```no_run
//! use gridcim_core::Network;
//! use gridcim_io::exporters::cgmes::{export_network_to_cgmes, ExportOptions};
//!
//! let network = Network::load_json("grid.json")?;
//! let report = export_network_to_cgmes(&network, "out", "grid", &ExportOptions::default())?;
//! println!("{} files, {}", report.files.len(), report.diagnostics.summary());
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```

pub mod context;
pub mod error;
pub mod naming;
pub mod options;
pub mod profile;
pub mod profiles;
pub mod regulating_control;
pub mod topology;
pub mod writer;

pub use context::{ExportContext, ModelDescription, TopologyMappingPolicy};
pub use error::{ExportError, ExportResult};
pub use options::ExportOptions;
pub use profile::{CimVersion, Profile};

use gridcim_core::{Diagnostics, Network};
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};
use tracing::{debug, info};
use writer::CimWriter;

/// Outcome of a multi-profile export
#[derive(Debug)]
pub struct ExportReport {
    /// Written documents, in profile order
    pub files: Vec<PathBuf>,
    pub diagnostics: Diagnostics,
}

/// Write one profile document of `network` to `out` and hand `out` back.
///
/// On error the partially written document is invalid and must be discarded.
pub fn write_profile<W: Write>(
    profile: Profile,
    network: &Network,
    context: &mut ExportContext,
    out: W,
    diag: &mut Diagnostics,
) -> ExportResult<W> {
    let terminals = profiles::identified_terminals(network, context, diag);
    let mut writer = CimWriter::new(out, context.cim_version(), context.indent());
    profiles::begin_document(profile, context, &mut writer)?;
    match profile {
        Profile::Equipment => {
            profiles::eq::write(network, context, &terminals, &mut writer, diag)?
        }
        Profile::Topology => profiles::tp::write(network, context, &terminals, &mut writer)?,
        Profile::SteadyStateHypothesis => {
            profiles::ssh::write(network, context, &terminals, &mut writer, diag)?
        }
        Profile::StateVariables => {
            profiles::sv::write(network, context, &terminals, &mut writer, diag)?
        }
    }
    writer.end_document()
}

/// Write one profile document into a string
pub fn profile_to_string(
    profile: Profile,
    network: &Network,
    context: &mut ExportContext,
    diag: &mut Diagnostics,
) -> ExportResult<String> {
    let bytes = write_profile(profile, network, context, Vec::new(), diag)?;
    Ok(String::from_utf8_lossy(&bytes).into_owned())
}

/// Export the profiles selected in `options` as `<dir>/<base_name>_<PROFILE>.xml`.
pub fn export_network_to_cgmes(
    network: &Network,
    dir: impl AsRef<Path>,
    base_name: &str,
    options: &ExportOptions,
) -> ExportResult<ExportReport> {
    let dir = dir.as_ref();
    std::fs::create_dir_all(dir)?;

    let mut context = ExportContext::new(network, options)?;
    let mut diagnostics = Diagnostics::new();
    network.validate_into(&mut diagnostics);
    debug!(
        policy = %context.topology_mapping_policy(),
        cim_version = context.cim_version().number(),
        "Exporting network '{}'",
        network.id
    );

    let mut files = Vec::new();
    for profile in options.ordered_profiles() {
        let path = dir.join(profile.file_name(base_name));
        let file = BufWriter::new(File::create(&path)?);
        write_profile(profile, network, &mut context, file, &mut diagnostics)?;
        info!(profile = %profile, path = %path.display(), "Wrote CGMES profile");
        files.push(path);
    }

    Ok(ExportReport { files, diagnostics })
}
