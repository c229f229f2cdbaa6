//! Lifecycle Hooks Module
//!
//! This module provides lifecycle hooks for managing initialization and cleanup
//! of services during application startup and shutdown.
//!
//! # Lifecycle Phases
//!
//! ```text
//! 1. Configuration Loading
//!    ↓
//! 2. DI Container Creation
//!    ↓
//! 3. Module Registration
//!    ↓
//! 4. OnModuleInit (each service)       ← database connects here
//!    ↓
//! 5. OnApplicationBootstrap
//!    ↓
//! [Running...]
//!    ↓
//! 6. Shutdown Signal (SIGTERM/SIGINT) or Application::close
//!    ↓
//! 7. OnApplicationShutdown
//!    ↓
//! 8. OnModuleDestroy (reverse order)   ← database disconnects here
//! ```
//!
//! Phases 7 and 8 form the application's close routine and run at most once.

mod application;
mod error;
mod manager;
mod shutdown;
mod traits;

pub use application::{Application, ApplicationBuilder};
pub use error::{LifecycleError, Result};
pub use manager::LifecycleManager;
pub use shutdown::{ShutdownHandler, ShutdownSignal, shutdown_signal};
pub use traits::{OnApplicationBootstrap, OnApplicationShutdown, OnModuleDestroy, OnModuleInit};
