//! # orm-lifecycle
//!
//! Binds a database (ORM) client to an application's module lifecycle.
//!
//! A [`DatabaseService`](database::DatabaseService) wraps a client and
//!
//! - connects it when the module initializes (`OnModuleInit`),
//! - disconnects it when the module is destroyed (`OnModuleDestroy`),
//! - can close the whole application when the process receives SIGINT or
//!   SIGTERM (`enable_shutdown_hooks`).
//!
//! Everything else (pooling, queries, transactions, migrations) stays with
//! the wrapped client.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use orm_lifecycle::prelude::*;
//! use orm_lifecycle::database::{DatabaseModule, MemoryClient};
//!
//! #[tokio::main]
//! async fn main() -> std::result::Result<(), Box<dyn std::error::Error>> {
//!     let mut container = Container::new();
//!     DatabaseModule::<MemoryClient>::register(&mut container)?;
//!     let db = DatabaseModule::<MemoryClient>::resolve(&container)?;
//!
//!     let app = Application::builder()
//!         .container(container)
//!         .register_lifecycle(Arc::clone(&db), "DatabaseService")
//!         .build()
//!         .await?;
//!
//!     db.read().await.enable_shutdown_hooks(&app)?;
//!
//!     // Serve until Ctrl+C / SIGTERM closes the application.
//!     app.wait_closed().await;
//!     Ok(())
//! }
//! ```

pub mod config;
pub mod database;
pub mod di;
pub mod error;
pub mod lifecycle;
pub mod module;

pub use di::{Container, ContainerBuilder, Injectable};
pub use error::{OrmLifecycleError, Result};
pub use module::Module;

pub use async_trait::async_trait;

/// Prelude module for convenient imports
///
/// ```
/// use orm_lifecycle::prelude::*;
/// ```
pub mod prelude {
    pub use crate::config::{ConfigService, DatabaseConfig};
    pub use crate::database::{
        ConnectionState, DatabaseClient, DatabaseModule, DatabaseService, SharedDatabaseService,
    };
    pub use crate::di::{Container, ContainerBuilder, Injectable};
    pub use crate::error::{OrmLifecycleError, Result};
    pub use crate::lifecycle::{
        Application, ApplicationBuilder, LifecycleError, LifecycleManager, OnApplicationBootstrap,
        OnApplicationShutdown, OnModuleDestroy, OnModuleInit, ShutdownHandler, ShutdownSignal,
        shutdown_signal,
    };
    pub use crate::module::Module;
    pub use async_trait::async_trait;
    pub use std::sync::Arc;
}
