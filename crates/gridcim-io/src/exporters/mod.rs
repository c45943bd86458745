//! Network exporters.
//!
//! Only CGMES is supported: see [`cgmes`] for the profile writers and the export facade.

pub mod cgmes;

pub use cgmes::{export_network_to_cgmes, write_profile, ExportOptions, ExportReport, Profile};
