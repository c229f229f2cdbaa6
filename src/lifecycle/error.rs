//! Lifecycle-specific error types

use thiserror::Error;

type BoxError = Box<dyn std::error::Error + Send + Sync + 'static>;

/// Errors that can occur during lifecycle operations
#[derive(Debug, Error)]
pub enum LifecycleError {
    /// Service initialization failed
    #[error("Initialization failed: {0}")]
    InitializationFailed(String),

    /// Operation timed out
    #[error("Timeout during {phase}: {message}")]
    Timeout {
        /// The lifecycle phase where timeout occurred
        phase: String,
        /// Additional error message
        message: String,
    },

    /// Hook execution failed
    #[error("Hook execution failed for {service}: {source}")]
    HookFailed {
        /// Name of the service that failed
        service: String,
        /// The error returned by the hook
        #[source]
        source: Box<LifecycleError>,
    },

    /// An error raised by a wrapped database client.
    ///
    /// Displays exactly as the client's error and exposes it as `source()`,
    /// so callers can downcast back to the client's own error type.
    #[error("{0}")]
    Client(#[source] BoxError),
}

impl LifecycleError {
    /// Create an initialization failure error
    pub fn init_failed(msg: impl Into<String>) -> Self {
        Self::InitializationFailed(msg.into())
    }

    /// Create a timeout error
    pub fn timeout(phase: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Timeout {
            phase: phase.into(),
            message: message.into(),
        }
    }

    /// Wrap the error of a failing hook with the name of its service
    pub fn hook_failed(service: impl Into<String>, source: LifecycleError) -> Self {
        Self::HookFailed {
            service: service.into(),
            source: Box::new(source),
        }
    }

    /// Carry a database client error without translating it
    pub fn client<E>(err: E) -> Self
    where
        E: std::error::Error + Send + Sync + 'static,
    {
        Self::Client(Box::new(err))
    }

    /// Walk through `HookFailed` wrappers down to the error the hook returned
    pub fn root(&self) -> &LifecycleError {
        match self {
            Self::HookFailed { source, .. } => source.root(),
            other => other,
        }
    }
}

/// A specialized Result type for lifecycle operations
pub type Result<T> = std::result::Result<T, LifecycleError>;

#[cfg(test)]
mod tests {
    use super::*;
    use std::error::Error as _;

    #[derive(Debug, Error)]
    #[error("connection refused (os error 111)")]
    struct Refused;

    #[test]
    fn client_error_displays_verbatim() {
        let err = LifecycleError::client(Refused);
        assert_eq!(err.to_string(), "connection refused (os error 111)");
        assert!(err.source().unwrap().downcast_ref::<Refused>().is_some());
    }

    #[test]
    fn root_unwraps_hook_failures() {
        let err = LifecycleError::hook_failed("DatabaseService", LifecycleError::client(Refused));
        assert_eq!(
            err.to_string(),
            "Hook execution failed for DatabaseService: connection refused (os error 111)"
        );
        assert!(matches!(err.root(), LifecycleError::Client(_)));
    }
}
