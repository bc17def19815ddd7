use std::path::PathBuf;

use thiserror::Error;

pub type Result<T> = std::result::Result<T, SeedError>;

#[derive(Error, Debug)]
pub enum SeedError {
    #[error("Server responded with error: {status}")]
    ServerUnavailable { status: u16 },

    #[error("Unable to connect to FHIR server: {0}")]
    ServerUnreachable(#[source] reqwest::Error),

    #[error("Data directory does not exist: {}", .0.display())]
    DataDirMissing(PathBuf),

    #[error("Failed to create search parameter (HTTP {status}): {body}")]
    SearchParameterRejected { status: u16, body: String },

    #[error("Invalid search parameter definition: {0}")]
    InvalidDefinition(String),

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Configuration error: {0}")]
    Config(String),
}

impl SeedError {
    /// Whether the metadata gate failed, i.e. nothing was written to the server.
    pub fn is_connectivity(&self) -> bool {
        matches!(self, Self::ServerUnavailable { .. } | Self::ServerUnreachable(_))
    }
}
