use thiserror::Error;

#[derive(Error, Debug)]
pub enum MemeRadarError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Serialization error: {0}")]
    Serialization(String),

    #[error(transparent)]
    Anyhow(#[from] anyhow::Error),
}
