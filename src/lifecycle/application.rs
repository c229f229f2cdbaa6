//! Application Bootstrap
//!
//! Provides a high-level API for bootstrapping applications with
//! integrated lifecycle management.

use super::{
    LifecycleError, LifecycleManager, OnApplicationBootstrap, OnApplicationShutdown,
    OnModuleDestroy, OnModuleInit, Result, ShutdownHandler,
};
use crate::di::Container;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::RwLock;

/// A running application: the container plus the hooks that were initialized
///
/// # Example
///
/// ```rust,ignore
/// let app = Arc::new(
///     Application::builder()
///         .container(container)
///         .register_lifecycle(database, "DatabaseService")
///         .build()
///         .await?,
/// );
///
/// // Serve until something closes the application...
/// app.wait_closed().await;
/// ```
pub struct Application {
    container: Arc<Container>,
    lifecycle_manager: Arc<LifecycleManager>,
}

impl Application {
    pub fn builder() -> ApplicationBuilder {
        ApplicationBuilder::new()
    }

    pub fn container(&self) -> &Arc<Container> {
        &self.container
    }

    /// Create a shutdown handler bound to this application's close routine
    pub fn shutdown_handler(&self) -> ShutdownHandler {
        ShutdownHandler::new(Arc::clone(&self.lifecycle_manager))
    }

    /// Close the application
    ///
    /// Runs OnApplicationShutdown then OnModuleDestroy hooks. Only the first
    /// call does any work; later calls wait for it and return `Ok(())`.
    pub async fn close(&self) -> Result<()> {
        tracing::info!("Closing application...");
        self.lifecycle_manager.close().await?;
        tracing::info!("Application closed");
        Ok(())
    }

    /// Resolves once the application has been closed
    pub async fn wait_closed(&self) {
        self.lifecycle_manager.wait_closed().await;
    }

    pub fn is_closed(&self) -> bool {
        self.lifecycle_manager.is_closed()
    }
}

/// Builder for Application
pub struct ApplicationBuilder {
    container: Option<Container>,
    lifecycle_manager: LifecycleManager,
    init_timeout: Option<Duration>,
    bootstrap_timeout: Option<Duration>,
}

impl Default for ApplicationBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl ApplicationBuilder {
    pub fn new() -> Self {
        Self {
            container: None,
            lifecycle_manager: LifecycleManager::new(),
            init_timeout: None,
            bootstrap_timeout: None,
        }
    }

    /// Set the DI container
    pub fn container(mut self, container: Container) -> Self {
        self.container = Some(container);
        self
    }

    /// Set a timeout for OnModuleInit hooks
    pub fn init_timeout(mut self, timeout: Duration) -> Self {
        self.init_timeout = Some(timeout);
        self
    }

    /// Set a timeout for OnApplicationBootstrap hooks
    pub fn bootstrap_timeout(mut self, timeout: Duration) -> Self {
        self.bootstrap_timeout = Some(timeout);
        self
    }

    /// Set a timeout for OnModuleDestroy hooks run by `Application::close`
    pub fn destroy_timeout(mut self, timeout: Duration) -> Self {
        self.lifecycle_manager.set_destroy_timeout(timeout);
        self
    }

    pub fn on_init<T>(mut self, service: Arc<RwLock<T>>, name: impl Into<String>) -> Self
    where
        T: OnModuleInit + 'static,
    {
        self.lifecycle_manager.register_init(service, name);
        self
    }

    pub fn on_bootstrap<T>(mut self, service: Arc<RwLock<T>>, name: impl Into<String>) -> Self
    where
        T: OnApplicationBootstrap + 'static,
    {
        self.lifecycle_manager.register_bootstrap(service, name);
        self
    }

    pub fn on_shutdown<T>(mut self, service: Arc<RwLock<T>>, name: impl Into<String>) -> Self
    where
        T: OnApplicationShutdown + 'static,
    {
        self.lifecycle_manager.register_shutdown(service, name);
        self
    }

    pub fn on_destroy<T>(mut self, service: Arc<RwLock<T>>, name: impl Into<String>) -> Self
    where
        T: OnModuleDestroy + 'static,
    {
        self.lifecycle_manager.register_destroy(service, name);
        self
    }

    /// Register a service for both its init and destroy hooks
    pub fn register_lifecycle<T>(self, service: Arc<RwLock<T>>, name: impl Into<String>) -> Self
    where
        T: OnModuleInit + OnModuleDestroy + 'static,
    {
        let name = name.into();
        self.on_init(Arc::clone(&service), name.clone())
            .on_destroy(service, name)
    }

    /// Build and initialize the application
    ///
    /// Runs every OnModuleInit hook, then every OnApplicationBootstrap hook.
    ///
    /// # Errors
    ///
    /// Returns the first hook failure (with the hook's own error as source),
    /// a timeout, or an error if no container was provided.
    pub async fn build(self) -> Result<Application> {
        let container = self
            .container
            .ok_or_else(|| LifecycleError::init_failed("Container not provided"))?;

        tracing::info!("Starting application initialization...");

        if let Some(timeout) = self.init_timeout {
            self.lifecycle_manager
                .call_module_init_with_timeout(timeout)
                .await?;
        } else {
            self.lifecycle_manager.call_module_init().await?;
        }

        if let Some(timeout) = self.bootstrap_timeout {
            self.lifecycle_manager
                .call_application_bootstrap_with_timeout(timeout)
                .await?;
        } else {
            self.lifecycle_manager.call_application_bootstrap().await?;
        }

        tracing::info!("Application initialization complete");

        Ok(Application {
            container: Arc::new(container),
            lifecycle_manager: Arc::new(self.lifecycle_manager),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Slow;

    #[async_trait::async_trait]
    impl OnModuleInit for Slow {
        async fn on_module_init(&mut self) -> Result<()> {
            tokio::time::sleep(Duration::from_secs(60)).await;
            Ok(())
        }
    }

    #[tokio::test]
    async fn build_requires_container() {
        let err = Application::builder().build().await.err().unwrap();
        assert!(matches!(err, LifecycleError::InitializationFailed(_)));
    }

    #[tokio::test(start_paused = true)]
    async fn init_timeout_is_enforced() {
        let err = Application::builder()
            .container(Container::new())
            .on_init(Arc::new(RwLock::new(Slow)), "Slow")
            .init_timeout(Duration::from_secs(1))
            .build()
            .await
            .err()
            .unwrap();
        assert!(matches!(err, LifecycleError::Timeout { ref phase, .. } if phase == "OnModuleInit"));
    }

    #[tokio::test(start_paused = true)]
    async fn bootstrap_runs_after_init() {
        struct Warmup {
            connected: bool,
            warmed: bool,
        }

        #[async_trait::async_trait]
        impl OnModuleInit for Warmup {
            async fn on_module_init(&mut self) -> Result<()> {
                self.connected = true;
                Ok(())
            }
        }

        #[async_trait::async_trait]
        impl OnApplicationBootstrap for Warmup {
            async fn on_application_bootstrap(&mut self) -> Result<()> {
                if !self.connected {
                    return Err(LifecycleError::init_failed("bootstrap before init"));
                }
                self.warmed = true;
                Ok(())
            }
        }

        let warmup = Arc::new(RwLock::new(Warmup {
            connected: false,
            warmed: false,
        }));
        Application::builder()
            .container(Container::new())
            .on_bootstrap(Arc::clone(&warmup), "Warmup")
            .on_init(Arc::clone(&warmup), "Warmup")
            .bootstrap_timeout(Duration::from_secs(1))
            .build()
            .await
            .unwrap();
        assert!(warmup.read().await.warmed);
    }

    #[tokio::test]
    async fn close_is_observable() {
        let app = Arc::new(
            Application::builder()
                .container(Container::new())
                .build()
                .await
                .unwrap(),
        );

        let waiter = tokio::spawn({
            let app = Arc::clone(&app);
            async move { app.wait_closed().await }
        });

        app.close().await.unwrap();
        waiter.await.unwrap();
        assert!(app.is_closed());
        app.close().await.unwrap();
    }
}
