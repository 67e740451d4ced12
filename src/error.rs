use thiserror::Error;

#[derive(Debug, Error)]
pub enum AnglerError {
    #[error("Config error: {0}")]
    Config(String),

    #[error("Raster shape mismatch: {rows}x{columns} needs {expected} cells, got {actual}")]
    RasterShape {
        rows: usize,
        columns: usize,
        expected: usize,
        actual: usize,
    },

    #[error("Session started without an outbound transport")]
    MissingTransport,

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("TOML parse error: {0}")]
    Toml(#[from] toml::de::Error),
}

/// Failure reported by the outbound transport for a single send.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TransportError {
    #[error("Transport disconnected")]
    Disconnected,

    #[error("Transport rejected payload: {0}")]
    Rejected(String),
}
