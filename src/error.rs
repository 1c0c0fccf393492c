use std::io;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum AppError {
    #[error("configuration error: {0}")]
    Configuration(String),
    #[error("transport error: {0}")]
    Transport(String),
    #[error("provider error: {0}")]
    Provider(String),
    #[error("provider returned an incomplete response: {0}")]
    IncompleteResponse(String),
    #[error("could not parse model reply ({reason}): {excerpt}")]
    Parse { reason: String, excerpt: String },
    #[error(transparent)]
    Io(#[from] io::Error),
}

impl AppError {
    /// Both hard provider failures and incomplete responses originate from the
    /// provider's envelope rather than the network.
    pub fn is_provider_error(&self) -> bool {
        matches!(self, AppError::Provider(_) | AppError::IncompleteResponse(_))
    }
}

pub type AppResult<T> = Result<T, AppError>;
