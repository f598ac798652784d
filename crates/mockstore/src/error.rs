use thiserror::Error;

#[derive(Error, Debug)]
pub enum StoreError {
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Backend error: {0}")]
    Backend(String),

    #[error("Config error: {0}")]
    Config(#[from] confique::Error),
}

impl StoreError {
    /// True for failures raised by a backend's open/commit hooks, as opposed to
    /// argument or configuration errors raised before any I/O.
    pub fn is_backend_error(&self) -> bool {
        matches!(
            self,
            StoreError::Io(_) | StoreError::Serialization(_) | StoreError::Backend(_)
        )
    }
}

pub type Result<T> = std::result::Result<T, StoreError>;
