use super::{DatabaseClient, DatabaseService};
use crate::di::{Container, Injectable};
use crate::error::{OrmLifecycleError, Result};
use crate::module::Module;
use std::marker::PhantomData;
use std::sync::Arc;
use tokio::sync::RwLock;

/// The shared handle lifecycle hooks and request handlers hold
pub type SharedDatabaseService<C> = Arc<RwLock<DatabaseService<C>>>;

/// Registers a `RwLock<DatabaseService<C>>` in the container
///
/// The client is built through its [`Injectable`] impl, so whatever it
/// depends on (a [`DatabaseConfig`](crate::config::DatabaseConfig) for
/// `SeaOrmClient`) must be registered first.
///
/// # Example
///
/// ```rust,ignore
/// let mut container = ContainerBuilder::new().register(config).build();
/// DatabaseModule::<SeaOrmClient>::register(&mut container)?;
///
/// let db = DatabaseModule::<SeaOrmClient>::resolve(&container)?;
/// let app = Application::builder()
///     .container(container)
///     .register_lifecycle(db, "DatabaseService")
///     .build()
///     .await?;
/// ```
pub struct DatabaseModule<C>(PhantomData<fn() -> C>);

impl<C> DatabaseModule<C>
where
    C: DatabaseClient + Injectable,
{
    /// Resolve the service registered by this module
    pub fn resolve(container: &Container) -> Result<SharedDatabaseService<C>> {
        container.resolve::<RwLock<DatabaseService<C>>>()
    }
}

impl<C> Module for DatabaseModule<C>
where
    C: DatabaseClient + Injectable,
{
    fn register(container: &mut Container) -> Result<()> {
        let service = DatabaseService::<C>::inject(container).map_err(|e| {
            OrmLifecycleError::ModuleRegistrationFailed {
                message: format!("DatabaseService: {e}"),
            }
        })?;
        container.register(RwLock::new(service));
        tracing::debug!(client = std::any::type_name::<C>(), "Registered DatabaseService");
        Ok(())
    }
}
