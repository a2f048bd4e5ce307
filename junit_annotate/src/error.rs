use std::path::PathBuf;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum ReportError {
    #[error("io error at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse report {path}: {message}")]
    XmlParse { path: PathBuf, message: String },

    #[error("failed to retrieve root test suite from {path}")]
    MissingRootSuite { path: PathBuf },
}

impl ReportError {
    pub fn path(&self) -> &std::path::Path {
        match self {
            ReportError::Io { path, .. }
            | ReportError::XmlParse { path, .. }
            | ReportError::MissingRootSuite { path } => path,
        }
    }
}
