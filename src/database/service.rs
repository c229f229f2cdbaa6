use super::{ConnectionState, DatabaseClient};
use crate::di::{Container, Injectable};
use crate::error::{OrmLifecycleError, Result};
use crate::lifecycle::{Application, LifecycleError, OnModuleDestroy, OnModuleInit};
use async_trait::async_trait;
use std::future::Future;
use std::ops::Deref;
use std::sync::atomic::{AtomicBool, Ordering};
use tokio::runtime::Handle;
use tokio::task::JoinHandle;

/// A database client bound to the application lifecycle
///
/// Connects the client in `OnModuleInit` and disconnects it in
/// `OnModuleDestroy`. Client errors pass through untranslated: a failed
/// connect surfaces as [`LifecycleError::Client`] whose `source()` is the
/// client's own error.
///
/// Derefs to the wrapped client, so queries go straight through the service.
///
/// # Example
///
/// ```rust,ignore
/// let db = Arc::new(RwLock::new(DatabaseService::new(SeaOrmClient::new(config))));
///
/// let app = Application::builder()
///     .container(container)
///     .register_lifecycle(Arc::clone(&db), "DatabaseService")
///     .build()
///     .await?;
///
/// db.read().await.enable_shutdown_hooks(&app)?;
/// ```
pub struct DatabaseService<C: DatabaseClient> {
    client: C,
    shutdown_hooks_enabled: AtomicBool,
}

impl<C: DatabaseClient> DatabaseService<C> {
    pub fn new(client: C) -> Self {
        Self {
            client,
            shutdown_hooks_enabled: AtomicBool::new(false),
        }
    }

    pub fn client(&self) -> &C {
        &self.client
    }

    pub fn state(&self) -> ConnectionState {
        self.client.state()
    }

    pub fn is_connected(&self) -> bool {
        self.state() == ConnectionState::Connected
    }

    /// Close `app` when the process receives SIGINT or SIGTERM
    ///
    /// Spawns a listener on the current tokio runtime and returns its handle.
    /// The listener runs the application's close routine, which in turn
    /// disconnects this service through `OnModuleDestroy`.
    ///
    /// # Errors
    ///
    /// [`OrmLifecycleError::NoRuntime`] outside a tokio runtime, and
    /// [`OrmLifecycleError::ShutdownHooksAlreadyEnabled`] if this service has
    /// already registered its hooks.
    pub fn enable_shutdown_hooks(&self, app: &Application) -> Result<JoinHandle<()>> {
        let runtime = self.claim_shutdown_hooks()?;
        let handler = app.shutdown_handler();
        Ok(runtime.spawn(async move { handler.wait_for_shutdown().await }))
    }

    /// Like [`enable_shutdown_hooks`](Self::enable_shutdown_hooks), but closes
    /// `app` when `signal` completes instead of waiting for an OS signal
    pub fn enable_shutdown_hooks_with<F>(&self, app: &Application, signal: F) -> Result<JoinHandle<()>>
    where
        F: Future<Output = ()> + Send + 'static,
    {
        let runtime = self.claim_shutdown_hooks()?;
        let handler = app.shutdown_handler();
        Ok(runtime.spawn(async move { handler.wait_for_shutdown_with(signal).await }))
    }

    fn claim_shutdown_hooks(&self) -> Result<Handle> {
        let runtime =
            Handle::try_current().map_err(|e| OrmLifecycleError::NoRuntime(e.to_string()))?;
        if self.shutdown_hooks_enabled.swap(true, Ordering::AcqRel) {
            tracing::warn!("Shutdown hooks already enabled, ignoring second registration");
            return Err(OrmLifecycleError::ShutdownHooksAlreadyEnabled);
        }
        tracing::debug!("Shutdown hooks enabled");
        Ok(runtime)
    }
}

impl<C: DatabaseClient> Deref for DatabaseService<C> {
    type Target = C;

    fn deref(&self) -> &C {
        &self.client
    }
}

#[async_trait]
impl<C: DatabaseClient> OnModuleInit for DatabaseService<C> {
    async fn on_module_init(&mut self) -> std::result::Result<(), LifecycleError> {
        tracing::info!("Connecting database client");
        self.client.connect().await.map_err(LifecycleError::client)?;
        tracing::info!(state = %self.state(), "Database client connected");
        Ok(())
    }
}

#[async_trait]
impl<C: DatabaseClient> OnModuleDestroy for DatabaseService<C> {
    async fn on_module_destroy(&mut self) -> std::result::Result<(), LifecycleError> {
        tracing::info!("Disconnecting database client");
        self.client
            .disconnect()
            .await
            .map_err(LifecycleError::client)?;
        tracing::info!(state = %self.state(), "Database client disconnected");
        Ok(())
    }
}

impl<C> Injectable for DatabaseService<C>
where
    C: DatabaseClient + Injectable,
{
    fn inject(container: &Container) -> Result<Self> {
        Ok(Self::new(C::inject(container)?))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::database::{MemoryClient, MemoryClientError};
    use crate::lifecycle::OnApplicationShutdown;
    use std::error::Error as _;
    use std::sync::Arc;
    use tokio::sync::{RwLock, oneshot};

    struct CloseCounter(usize);

    #[async_trait]
    impl OnApplicationShutdown for CloseCounter {
        async fn on_application_shutdown(&mut self) -> std::result::Result<(), LifecycleError> {
            self.0 += 1;
            Ok(())
        }
    }

    async fn build_app(
        db: &Arc<RwLock<DatabaseService<MemoryClient>>>,
        counter: &Arc<RwLock<CloseCounter>>,
    ) -> std::result::Result<Application, LifecycleError> {
        Application::builder()
            .container(Container::new())
            .register_lifecycle(Arc::clone(db), "DatabaseService")
            .on_shutdown(Arc::clone(counter), "CloseCounter")
            .build()
            .await
    }

    #[tokio::test]
    async fn init_connects_client() {
        let mut service = DatabaseService::new(MemoryClient::new());
        assert_eq!(service.state(), ConnectionState::Disconnected);

        service.on_module_init().await.unwrap();
        assert!(service.is_connected());
        assert_eq!(service.connect_count(), 1);
    }

    #[tokio::test]
    async fn destroy_disconnects_client() {
        let mut service = DatabaseService::new(MemoryClient::new());
        service.on_module_init().await.unwrap();

        service.on_module_destroy().await.unwrap();
        assert_eq!(service.state(), ConnectionState::Disconnected);

        service.on_module_destroy().await.unwrap();
        assert_eq!(service.client().disconnect_count(), 1);
    }

    #[tokio::test]
    async fn connect_failure_is_surfaced_unchanged() {
        let db = Arc::new(RwLock::new(DatabaseService::new(MemoryClient::unreachable(
            "localhost:5432",
        ))));
        let counter = Arc::new(RwLock::new(CloseCounter(0)));

        let err = build_app(&db, &counter).await.err().unwrap();
        let root = err.root();
        assert_eq!(root.to_string(), "Can't reach database server: localhost:5432");
        let client_err = root
            .source()
            .and_then(|e| e.downcast_ref::<MemoryClientError>())
            .unwrap();
        assert!(matches!(client_err, MemoryClientError::Unreachable(addr) if addr == "localhost:5432"));
        assert!(!db.read().await.is_connected());
    }

    #[tokio::test]
    async fn signal_closes_application_once() {
        let db = Arc::new(RwLock::new(DatabaseService::new(MemoryClient::new())));
        let counter = Arc::new(RwLock::new(CloseCounter(0)));
        let app = build_app(&db, &counter).await.unwrap();
        assert!(db.read().await.is_connected());

        let (tx, rx) = oneshot::channel::<()>();
        let hook = db
            .read()
            .await
            .enable_shutdown_hooks_with(&app, async move {
                let _ = rx.await;
            })
            .unwrap();

        tx.send(()).unwrap();
        hook.await.unwrap();

        assert!(app.is_closed());
        assert_eq!(counter.read().await.0, 1);
        assert_eq!(db.read().await.state(), ConnectionState::Disconnected);

        app.close().await.unwrap();
        assert_eq!(counter.read().await.0, 1);
        assert_eq!(db.read().await.client().disconnect_count(), 1);
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn sigterm_closes_application() {
        use nix::sys::signal::{Signal, kill};
        use nix::unistd::Pid;
        use std::time::Duration;
        use tokio::signal::unix::{SignalKind, signal};

        // Route SIGTERM to tokio before the hook task subscribes, so an early
        // delivery cannot take the default action and end the test process.
        let _sigterm = signal(SignalKind::terminate()).unwrap();

        let db = Arc::new(RwLock::new(DatabaseService::new(MemoryClient::new())));
        let counter = Arc::new(RwLock::new(CloseCounter(0)));
        let app = build_app(&db, &counter).await.unwrap();

        let hook = db.read().await.enable_shutdown_hooks(&app).unwrap();
        // Let the hook task run up to its signal wait.
        for _ in 0..8 {
            tokio::task::yield_now().await;
        }
        assert!(!app.is_closed());

        kill(Pid::this(), Signal::SIGTERM).unwrap();
        tokio::time::timeout(Duration::from_secs(10), hook)
            .await
            .unwrap()
            .unwrap();

        assert!(app.is_closed());
        assert_eq!(counter.read().await.0, 1);
        assert_eq!(db.read().await.state(), ConnectionState::Disconnected);
    }

    #[tokio::test]
    async fn shutdown_hooks_register_once() {
        let db = Arc::new(RwLock::new(DatabaseService::new(MemoryClient::new())));
        let counter = Arc::new(RwLock::new(CloseCounter(0)));
        let app = build_app(&db, &counter).await.unwrap();

        let service = db.read().await;
        let first = service
            .enable_shutdown_hooks_with(&app, std::future::pending())
            .unwrap();
        let second = service.enable_shutdown_hooks_with(&app, std::future::pending());
        assert!(matches!(
            second,
            Err(OrmLifecycleError::ShutdownHooksAlreadyEnabled)
        ));
        first.abort();
    }

    #[test]
    fn shutdown_hooks_need_a_runtime() {
        let service = DatabaseService::new(MemoryClient::new());
        let runtime = tokio::runtime::Builder::new_current_thread()
            .build()
            .unwrap();
        let app = runtime
            .block_on(Application::builder().container(Container::new()).build())
            .unwrap();

        let err = service.enable_shutdown_hooks(&app).unwrap_err();
        assert!(matches!(err, OrmLifecycleError::NoRuntime(_)));

        // A failed registration does not use up the service's one registration.
        let _guard = runtime.enter();
        let hook = service
            .enable_shutdown_hooks_with(&app, std::future::pending())
            .unwrap();
        hook.abort();
    }
}
