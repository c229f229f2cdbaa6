use crate::lifecycle::LifecycleError;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, OrmLifecycleError>;

#[derive(Debug, Error)]
pub enum OrmLifecycleError {
    #[error("Dependency not found: {type_name}")]
    DependencyNotFound { type_name: String },

    #[error("Failed to downcast type: {type_name}")]
    DowncastFailed { type_name: String },

    #[error("Module registration failed: {message}")]
    ModuleRegistrationFailed { message: String },

    #[error("Missing configuration key: {key}")]
    MissingConfig { key: String },

    #[error("Invalid value for {key}: {message}")]
    InvalidConfig { key: String, message: String },

    #[error("Shutdown hooks are already enabled for this service")]
    ShutdownHooksAlreadyEnabled,

    #[error("No tokio runtime available: {0}")]
    NoRuntime(String),

    #[error(transparent)]
    Lifecycle(#[from] LifecycleError),
}

impl OrmLifecycleError {
    pub fn missing_config(key: impl Into<String>) -> Self {
        Self::MissingConfig { key: key.into() }
    }

    pub fn invalid_config(key: impl Into<String>, message: impl Into<String>) -> Self {
        Self::InvalidConfig {
            key: key.into(),
            message: message.into(),
        }
    }
}
