use thiserror::Error;

#[derive(Debug, Error)]
pub enum AppError {
    #[error("Validation error: {0}")]
    ValidationError(#[from] validator::ValidationErrors),

    #[error("Composition error: {0}")]
    CompositionError(anyhow::Error),

    #[error("Provisioning error: {0}")]
    ProvisioningError(anyhow::Error),

    #[error("Configuration error: {0}")]
    ConfigError(anyhow::Error),

    #[error("Serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),

    #[error("Internal error: {0}")]
    InternalError(#[from] anyhow::Error),
}

impl From<config::ConfigError> for AppError {
    fn from(err: config::ConfigError) -> Self {
        AppError::ConfigError(anyhow::Error::new(err))
    }
}

impl From<std::io::Error> for AppError {
    fn from(err: std::io::Error) -> Self {
        AppError::InternalError(anyhow::Error::new(err))
    }
}

impl AppError {
    /// Process exit status reported by binaries for this error class.
    pub fn exit_code(&self) -> i32 {
        match self {
            AppError::ConfigError(_) => 78,
            AppError::ValidationError(_) | AppError::CompositionError(_) => 65,
            AppError::ProvisioningError(_) => 69,
            AppError::SerializationError(_) | AppError::InternalError(_) => 70,
        }
    }
}
