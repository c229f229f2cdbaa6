//! Lifecycle hook traits
//!
//! These traits define the contract for services that need to participate
//! in application lifecycle events.

use super::LifecycleError;
use async_trait::async_trait;

/// Called after the module's dependencies are resolved
///
/// [`DatabaseService`](crate::database::DatabaseService) implements this to
/// open its client's connection before the application serves anything.
///
/// # Example
///
/// ```rust,ignore
/// use orm_lifecycle::lifecycle::{OnModuleInit, LifecycleError};
/// use async_trait::async_trait;
///
/// #[async_trait]
/// impl OnModuleInit for SearchIndex {
///     async fn on_module_init(&mut self) -> Result<(), LifecycleError> {
///         self.client.connect().await.map_err(LifecycleError::client)
///     }
/// }
/// ```
#[async_trait]
pub trait OnModuleInit: Send + Sync {
    /// Called when the module is initialized
    ///
    /// This is invoked after all dependencies are resolved but before
    /// the application starts accepting requests.
    async fn on_module_init(&mut self) -> Result<(), LifecycleError>;
}

/// Called after all modules are initialized
#[async_trait]
pub trait OnApplicationBootstrap: Send + Sync {
    /// This is the last hook before the application starts accepting requests.
    async fn on_application_bootstrap(&mut self) -> Result<(), LifecycleError>;
}

/// Called when the application begins closing, before any module is destroyed
#[async_trait]
pub trait OnApplicationShutdown: Send + Sync {
    async fn on_application_shutdown(&mut self) -> Result<(), LifecycleError>;
}

/// Called when the application is shutting down
///
/// Services are destroyed in **reverse order** of their registration, so a
/// database registered first is released last.
#[async_trait]
pub trait OnModuleDestroy: Send + Sync {
    /// Invoked after every `OnApplicationShutdown` hook has run.
    async fn on_module_destroy(&mut self) -> Result<(), LifecycleError>;
}
