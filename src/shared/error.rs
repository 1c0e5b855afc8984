use thiserror::Error;

#[derive(Error, Debug)]
pub enum AppError {
    #[error("I/O Error: {0}")]
    Io(String),

    #[error("Network Error: {0}")]
    Network(String),

    #[error("Validation Error: {0}")]
    Validation(String),

    #[error("System Error: {0}")]
    System(String),

    /// The messaging transport to the backend is gone for good; the hosting
    /// surface must be reloaded rather than surfacing an error to the user.
    #[error("Extension context invalidated")]
    ContextInvalidated,

    #[error("Unknown Error: {0}")]
    Unknown(String),
}

impl AppError {
    pub fn is_context_invalidated(&self) -> bool {
        matches!(self, AppError::ContextInvalidated)
    }
}

impl From<std::io::Error> for AppError {
    fn from(err: std::io::Error) -> Self {
        AppError::Io(err.to_string())
    }
}

impl From<reqwest::Error> for AppError {
    fn from(err: reqwest::Error) -> Self {
        AppError::Network(err.to_string())
    }
}

impl From<serde_json::Error> for AppError {
    fn from(err: serde_json::Error) -> Self {
        AppError::Validation(format!("Serialization error: {}", err))
    }
}

pub type AppResult<T> = Result<T, AppError>;
