use std::path::PathBuf;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum IndexError {
    #[error("Failed to parse index: {0}")]
    Parse(#[from] serde_yaml_ng::Error),

    #[error("Index data is empty")]
    EmptyInput,

    #[error("No API version specified in index")]
    NoApiVersion,

    #[error("{} not found", describe_chart(.name, .constraint))]
    ChartNotFound { name: String, constraint: String },

    #[error("Invalid version constraint: {0}")]
    InvalidConstraint(String),

    #[error("IO error on {path:?}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Human-readable chart reference used in lookup errors
pub(crate) fn describe_chart(name: &str, constraint: &str) -> String {
    if constraint.is_empty() {
        format!("chart {:?}", name)
    } else {
        format!("chart {:?} version {:?}", name, constraint)
    }
}
