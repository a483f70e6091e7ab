use thiserror::Error;

#[derive(Debug, Error)]
pub enum MolscreenError {
    #[error("HTTP request error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("No target found for query: {0}")]
    TargetNotFound(String),

    #[error("Non-numeric potency value: {0}")]
    InvalidPotency(String),

    #[error("Invalid SMILES: {0}")]
    InvalidSmiles(String),

    #[error("{tool} failed ({status}): {stderr}")]
    Tool {
        tool: String,
        status: String,
        stderr: String,
    },

    #[error("Security error: {0}")]
    Security(String),

    #[error("Pipeline error: {0}")]
    Pipeline(String),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

pub type Result<T> = std::result::Result<T, MolscreenError>;
