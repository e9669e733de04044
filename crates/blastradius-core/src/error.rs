use thiserror::Error;

#[derive(Error, Debug)]
pub enum BlastRadiusError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Graph error: {0}")]
    Graph(String),

    #[error("Manifest error: {0}")]
    Manifest(String),

    #[error("Operation cancelled")]
    Cancelled,
}

pub type Result<T> = std::result::Result<T, BlastRadiusError>;
