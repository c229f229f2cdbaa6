use crate::di::Container;
use crate::error::Result;

/// Trait for application modules
///
/// A module registers its providers into the container. See
/// [`DatabaseModule`](crate::database::DatabaseModule) for the module that
/// provides a lifecycle-managed database service.
///
/// # Example
/// ```
/// use orm_lifecycle::{Container, Module, Result};
/// use orm_lifecycle::config::DatabaseConfig;
///
/// struct ConfigModule;
///
/// impl Module for ConfigModule {
///     fn register(container: &mut Container) -> Result<()> {
///         container.register(DatabaseConfig::new("sqlite::memory:"));
///         Ok(())
///     }
/// }
/// ```
pub trait Module {
    /// Register all providers in this module
    fn register(container: &mut Container) -> Result<()>;
}
