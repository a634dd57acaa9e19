use thiserror::Error;

#[derive(Error, Debug)]
pub enum NgramError {
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("I/O error: {0}")]
    Io(String),

    #[error("Serialization error: {0}")]
    Serialization(String),

    #[error("Directory walk error: {0}")]
    WalkDir(String),

    #[error("Invalid glob pattern: {0}")]
    InvalidPattern(String),
}

impl From<std::io::Error> for NgramError {
    fn from(err: std::io::Error) -> Self {
        NgramError::Io(err.to_string())
    }
}

pub type Result<T> = std::result::Result<T, NgramError>;
