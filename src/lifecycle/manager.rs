//! Lifecycle Manager
//!
//! Manages the registration and execution of lifecycle hooks.

use super::{
    LifecycleError, OnApplicationBootstrap, OnApplicationShutdown, OnModuleDestroy, OnModuleInit,
    Result,
};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{RwLock, watch};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum CloseState {
    Open,
    Closing,
    Closed,
}

/// Reopens the manager if a close is dropped before it completes
struct CloseGuard<'a> {
    state: &'a watch::Sender<CloseState>,
    completed: bool,
}

impl CloseGuard<'_> {
    fn complete(mut self) {
        self.completed = true;
        self.state.send_replace(CloseState::Closed);
    }
}

impl Drop for CloseGuard<'_> {
    fn drop(&mut self) {
        if !self.completed {
            tracing::warn!("Application close was cancelled before completing");
            self.state.send_replace(CloseState::Open);
        }
    }
}

/// A registered service together with the name used in logs and errors
struct LifecycleHook<T: ?Sized> {
    service: Arc<RwLock<T>>,
    name: String,
}

impl<T: ?Sized> LifecycleHook<T> {
    fn new(service: Arc<RwLock<T>>, name: impl Into<String>) -> Self {
        Self {
            service,
            name: name.into(),
        }
    }
}

/// Manages lifecycle hooks for all registered services
///
/// Init and bootstrap hooks run in registration order and stop at the first
/// failure. Shutdown and destroy hooks log failures and keep going, so one
/// misbehaving service cannot keep the others from releasing resources.
///
/// [`close`](Self::close) is the application's close routine: it runs the
/// shutdown and destroy phases at most once, however many times (and from
/// however many tasks) it is called. A close that is cancelled midway (its
/// future dropped) leaves the manager open, and the next caller starts the
/// close over.
///
/// # Example
///
/// ```rust,ignore
/// let mut manager = LifecycleManager::new();
/// manager.register_init(Arc::clone(&db), "DatabaseService");
/// manager.register_destroy(db, "DatabaseService");
///
/// manager.call_module_init().await?;
/// // ... application runs ...
/// manager.close().await?;
/// ```
pub struct LifecycleManager {
    on_init_hooks: Vec<LifecycleHook<dyn OnModuleInit>>,
    on_bootstrap_hooks: Vec<LifecycleHook<dyn OnApplicationBootstrap>>,
    on_shutdown_hooks: Vec<LifecycleHook<dyn OnApplicationShutdown>>,
    on_destroy_hooks: Vec<LifecycleHook<dyn OnModuleDestroy>>,
    destroy_timeout: Option<Duration>,
    close_state: watch::Sender<CloseState>,
}

impl Default for LifecycleManager {
    fn default() -> Self {
        Self::new()
    }
}

impl LifecycleManager {
    pub fn new() -> Self {
        let (close_state, _) = watch::channel(CloseState::Open);
        Self {
            on_init_hooks: Vec::new(),
            on_bootstrap_hooks: Vec::new(),
            on_shutdown_hooks: Vec::new(),
            on_destroy_hooks: Vec::new(),
            destroy_timeout: None,
            close_state,
        }
    }

    /// Register a service that implements OnModuleInit
    pub fn register_init<T>(&mut self, service: Arc<RwLock<T>>, name: impl Into<String>)
    where
        T: OnModuleInit + 'static,
    {
        self.on_init_hooks.push(LifecycleHook::new(service, name));
    }

    /// Register a service that implements OnApplicationBootstrap
    pub fn register_bootstrap<T>(&mut self, service: Arc<RwLock<T>>, name: impl Into<String>)
    where
        T: OnApplicationBootstrap + 'static,
    {
        self.on_bootstrap_hooks
            .push(LifecycleHook::new(service, name));
    }

    /// Register a service that implements OnApplicationShutdown
    pub fn register_shutdown<T>(&mut self, service: Arc<RwLock<T>>, name: impl Into<String>)
    where
        T: OnApplicationShutdown + 'static,
    {
        self.on_shutdown_hooks
            .push(LifecycleHook::new(service, name));
    }

    /// Register a service that implements OnModuleDestroy
    pub fn register_destroy<T>(&mut self, service: Arc<RwLock<T>>, name: impl Into<String>)
    where
        T: OnModuleDestroy + 'static,
    {
        self.on_destroy_hooks
            .push(LifecycleHook::new(service, name));
    }

    /// Bound the destroy phase of [`close`](Self::close)
    pub fn set_destroy_timeout(&mut self, timeout: Duration) {
        self.destroy_timeout = Some(timeout);
    }

    /// Execute all OnModuleInit hooks in registration order
    pub async fn call_module_init(&self) -> Result<()> {
        tracing::info!("Calling OnModuleInit hooks...");

        for hook in &self.on_init_hooks {
            tracing::debug!(service = %hook.name, "Initializing");
            let mut service = hook.service.write().await;
            service.on_module_init().await.map_err(|e| {
                tracing::error!(service = %hook.name, error = %e, "OnModuleInit failed");
                LifecycleError::hook_failed(&hook.name, e)
            })?;
            tracing::debug!(service = %hook.name, "Initialized");
        }

        tracing::info!(
            "OnModuleInit complete ({} hooks executed)",
            self.on_init_hooks.len()
        );
        Ok(())
    }

    /// Execute all OnModuleInit hooks with a timeout
    pub async fn call_module_init_with_timeout(&self, timeout: Duration) -> Result<()> {
        tokio::time::timeout(timeout, self.call_module_init())
            .await
            .map_err(|_| {
                LifecycleError::timeout("OnModuleInit", format!("Timeout after {:?}", timeout))
            })?
    }

    /// Execute all OnApplicationBootstrap hooks in registration order
    pub async fn call_application_bootstrap(&self) -> Result<()> {
        tracing::info!("Calling OnApplicationBootstrap hooks...");

        for hook in &self.on_bootstrap_hooks {
            let mut service = hook.service.write().await;
            service.on_application_bootstrap().await.map_err(|e| {
                tracing::error!(service = %hook.name, error = %e, "OnApplicationBootstrap failed");
                LifecycleError::hook_failed(&hook.name, e)
            })?;
        }

        tracing::info!(
            "OnApplicationBootstrap complete ({} hooks executed)",
            self.on_bootstrap_hooks.len()
        );
        Ok(())
    }

    /// Execute all OnApplicationBootstrap hooks with a timeout
    pub async fn call_application_bootstrap_with_timeout(&self, timeout: Duration) -> Result<()> {
        tokio::time::timeout(timeout, self.call_application_bootstrap())
            .await
            .map_err(|_| {
                LifecycleError::timeout(
                    "OnApplicationBootstrap",
                    format!("Timeout after {:?}", timeout),
                )
            })?
    }

    /// Execute all OnApplicationShutdown hooks in registration order
    pub async fn call_application_shutdown(&self) -> Result<()> {
        tracing::info!("Calling OnApplicationShutdown hooks...");

        for hook in &self.on_shutdown_hooks {
            let mut service = hook.service.write().await;
            if let Err(e) = service.on_application_shutdown().await {
                tracing::error!(service = %hook.name, error = %e, "OnApplicationShutdown failed");
            }
        }

        tracing::info!(
            "OnApplicationShutdown complete ({} hooks executed)",
            self.on_shutdown_hooks.len()
        );
        Ok(())
    }

    /// Execute all OnModuleDestroy hooks
    ///
    /// Hooks are executed in **reverse order** to properly handle dependencies.
    pub async fn call_module_destroy(&self) -> Result<()> {
        tracing::info!("Calling OnModuleDestroy hooks...");

        for hook in self.on_destroy_hooks.iter().rev() {
            tracing::debug!(service = %hook.name, "Destroying");
            let mut service = hook.service.write().await;
            if let Err(e) = service.on_module_destroy().await {
                tracing::error!(service = %hook.name, error = %e, "OnModuleDestroy failed");
            }
        }

        tracing::info!(
            "OnModuleDestroy complete ({} hooks executed)",
            self.on_destroy_hooks.len()
        );
        Ok(())
    }

    /// Execute all OnModuleDestroy hooks with a timeout
    pub async fn call_module_destroy_with_timeout(&self, timeout: Duration) -> Result<()> {
        tokio::time::timeout(timeout, self.call_module_destroy())
            .await
            .map_err(|_| {
                LifecycleError::timeout("OnModuleDestroy", format!("Timeout after {:?}", timeout))
            })?
    }

    /// Run the shutdown and destroy phases, once.
    ///
    /// The first caller runs the hooks. Every later or concurrent caller
    /// waits until that first close has finished and returns `Ok(())`; if the
    /// first close is cancelled instead, a waiting caller takes it over.
    pub async fn close(&self) -> Result<()> {
        while !self.claim_close() {
            let mut state = self.close_state.subscribe();
            // The sender lives as long as `self`, so the channel cannot close under us.
            let settled = state
                .wait_for(|state| *state != CloseState::Closing)
                .await
                .map(|state| *state);
            if !matches!(settled, Ok(CloseState::Open)) {
                return Ok(());
            }
            tracing::debug!("Previous close was cancelled, retrying");
        }

        let guard = CloseGuard {
            state: &self.close_state,
            completed: false,
        };

        let shutdown = self.call_application_shutdown().await;
        let destroy = match self.destroy_timeout {
            Some(timeout) => self.call_module_destroy_with_timeout(timeout).await,
            None => self.call_module_destroy().await,
        };

        guard.complete();
        shutdown.and(destroy)
    }

    fn claim_close(&self) -> bool {
        self.close_state.send_if_modified(|state| {
            if *state == CloseState::Open {
                *state = CloseState::Closing;
                true
            } else {
                false
            }
        })
    }

    /// Resolves once [`close`](Self::close) has completed
    pub async fn wait_closed(&self) {
        let mut state = self.close_state.subscribe();
        let _ = state.wait_for(|state| *state == CloseState::Closed).await;
    }

    pub fn is_closed(&self) -> bool {
        *self.close_state.borrow() == CloseState::Closed
    }
}
