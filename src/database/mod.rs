//! Database lifecycle integration
//!
//! [`DatabaseService`] wraps a [`DatabaseClient`] and ties its connection to
//! the application lifecycle: the client connects during `OnModuleInit`,
//! disconnects during `OnModuleDestroy`, and
//! [`DatabaseService::enable_shutdown_hooks`] closes the application when the
//! process receives a termination signal.
//!
//! Pooling, retries, queries and transactions are the client's business; the
//! service only drives `connect` and `disconnect`.

mod memory;
mod module;
#[cfg(feature = "sea-orm-db")]
mod sea_orm_client;
mod service;

use async_trait::async_trait;
use strum_macros::{AsRefStr, Display};
use tokio::sync::watch;

pub use memory::{MemoryClient, MemoryClientError};
pub use module::{DatabaseModule, SharedDatabaseService};
#[cfg(feature = "sea-orm-db")]
pub use sea_orm_client::SeaOrmClient;
pub use service::DatabaseService;

/// Connection state reported by a [`DatabaseClient`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display, AsRefStr)]
#[strum(serialize_all = "snake_case")]
pub enum ConnectionState {
    Disconnected,
    Connecting,
    Connected,
    Disconnecting,
}

/// The connect/disconnect contract of a database client
///
/// Implementations own their errors: whatever `connect` returns is what the
/// caller of the lifecycle hook ends up seeing.
#[async_trait]
pub trait DatabaseClient: Send + Sync + 'static {
    type Error: std::error::Error + Send + Sync + 'static;

    /// Establish the connection. Connecting an already connected client is a no-op.
    async fn connect(&self) -> Result<(), Self::Error>;

    /// Release the connection. Disconnecting a disconnected client is a no-op.
    async fn disconnect(&self) -> Result<(), Self::Error>;

    fn state(&self) -> ConnectionState;

    /// Watch state transitions
    fn subscribe(&self) -> watch::Receiver<ConnectionState>;
}
