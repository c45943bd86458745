//! # gridcim-io: CGMES export
//!
//! Turns a [`gridcim_core::Network`] snapshot into the four cross-referencing CIM RDF/XML
//! documents of a CGMES model: Equipment (EQ), Topology (TP), Steady-State Hypothesis (SSH) and
//! State Variables (SV).
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use gridcim_core::Network;
//! use gridcim_io::exporters::{export_network_to_cgmes, ExportOptions};
//!
//! fn main() -> anyhow::Result<()> {
//!     let network = Network::load_json("grid.json")?;
//!     let report = export_network_to_cgmes(&network, "out", "grid", &ExportOptions::default())?;
//!
//!     for file in &report.files {
//!         println!("wrote {}", file.display());
//!     }
//!     if report.diagnostics.has_issues() {
//!         eprintln!("{}", report.diagnostics);
//!     }
//!     Ok(())
//! }
//! ```
//!
//! ## Output
//!
//! | Profile | File | Depends on |
//! |---------|------|------------|
//! | EQ  | `<base>_EQ.xml`  | |
//! | TP  | `<base>_TP.xml`  | EQ |
//! | SSH | `<base>_SSH.xml` | EQ |
//! | SV  | `<base>_SV.xml`  | TP, SSH |
//!
//! CIM 16 (CGMES 2.4.15) and CIM 100 (CGMES 3.0) schemas are supported.
//!
//! ## Error Handling
//!
//! Export failures that invalidate a document (I/O, XML, bad configuration) are returned as
//! [`exporters::cgmes::ExportError`]. Problems that only affect one element (a bus without a
//! topological node, a second slack terminal in an island, a terminal without an id) skip that
//! element and are collected as diagnostics in the [`exporters::ExportReport`].
//!
//! ## Identifiers
//!
//! Network ids are written as-is. Objects without an id in the network (generating units,
//! transformer ends, base voltages, terminals without a preserved alias) get name-based UUIDs
//! derived from [`exporters::ExportOptions::naming_namespace`], so re-exports are stable.
//! Per-export objects (`SvVoltage`, `SvPowerFlow`, islands) get random UUIDs.

pub mod exporters;

pub use exporters::cgmes::{ExportContext, ExportError, ExportResult};
