use thiserror::Error;

#[derive(Error, Debug)]
pub enum AxError {
    #[error("Config error: {0}")]
    Config(String),
    #[error("Snapshot error: {0}")]
    Snapshot(String),
    #[error("I/O error: {0}")]
    Io(String),
    #[error("{message}")]
    SearchFailure { message: String },
    #[error("{attribute} is read-only for {element}")]
    ReadOnly { attribute: String, element: String },
    #[error("Internal invariant violated: {0}")]
    Invariant(String),
}

pub type Result<T> = std::result::Result<T, AxError>;

// Helper conversions
impl From<config::ConfigError> for AxError {
    fn from(e: config::ConfigError) -> Self { Self::Config(e.to_string()) }
}
impl From<serde_json::Error> for AxError {
    fn from(e: serde_json::Error) -> Self { Self::Snapshot(e.to_string()) }
}
impl From<std::io::Error> for AxError {
    fn from(e: std::io::Error) -> Self { Self::Io(e.to_string()) }
}
