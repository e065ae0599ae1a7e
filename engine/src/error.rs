use derive_more::derive::Display;

pub type AppResult<T> = Result<T, AppError>;

/// Errors surfaced at the engine's boundaries. Classification and
/// extraction themselves never fail; only configuration validation
/// and catalog loading can reject input.
#[derive(Debug, Display)]
pub enum AppError {
    InvalidConfig(String),
    Catalog(String),
    Internal(anyhow::Error),
}

impl std::error::Error for AppError {}

impl From<anyhow::Error> for AppError {
    fn from(error: anyhow::Error) -> Self {
        AppError::Internal(error)
    }
}

impl From<config::ConfigError> for AppError {
    fn from(error: config::ConfigError) -> Self {
        AppError::Catalog(error.to_string())
    }
}
