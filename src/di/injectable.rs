use crate::di::Container;
use crate::error::Result;

/// Trait for types that can be constructed from the DI container
///
/// # Example
/// ```
/// use orm_lifecycle::{Container, Injectable, Result};
/// use orm_lifecycle::config::DatabaseConfig;
/// use std::sync::Arc;
///
/// struct ReportJob {
///     config: Arc<DatabaseConfig>,
/// }
///
/// impl Injectable for ReportJob {
///     fn inject(container: &Container) -> Result<Self> {
///         Ok(Self {
///             config: container.resolve::<DatabaseConfig>()?,
///         })
///     }
/// }
/// ```
pub trait Injectable: Sized + Send + Sync + 'static {
    /// Create an instance by resolving dependencies from the container
    ///
    /// # Errors
    /// Returns an error if any required dependency is not found in the container.
    fn inject(container: &Container) -> Result<Self>;
}
