use thiserror::Error;

/// Fatal export failures. The current document is aborted and must be discarded.
///
/// Data-quality problems are not errors: they are skipped and reported through
/// [`gridcim_core::Diagnostics`].
#[derive(Error, Debug)]
pub enum ExportError {
    #[error("CGMES export failed: {0}")]
    Io(#[from] std::io::Error),

    #[error("CGMES export failed: {0}")]
    Xml(#[from] quick_xml::Error),

    #[error("unknown CGMES profile '{0}' (expected EQ, TP, SSH or SV)")]
    UnknownProfile(String),

    #[error("unsupported CIM version {0} (expected 16 or 100)")]
    UnsupportedCimVersion(u32),
}

pub type ExportResult<T> = Result<T, ExportError>;
