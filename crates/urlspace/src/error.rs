use std::path::PathBuf;

/// Error type for loading a rule configuration.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Failed to read '{path}': {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("Invalid rule configuration: {0}")]
    Json(#[from] serde_json::Error),
}
