use super::{ConnectionState, DatabaseClient};
use crate::config::DatabaseConfig;
use crate::di::{Container, Injectable};
use async_trait::async_trait;
use sea_orm::{ConnectOptions, Database, DatabaseConnection, DbErr};
use tokio::sync::{Mutex, watch};

/// SeaORM-backed database client
///
/// Connects with [`sea_orm::Database::connect`] and closes the connection
/// with [`DatabaseConnection::close`]. Errors are SeaORM's `DbErr`, untouched.
pub struct SeaOrmClient {
    config: DatabaseConfig,
    connection: Mutex<Option<DatabaseConnection>>,
    state: watch::Sender<ConnectionState>,
}

impl SeaOrmClient {
    pub fn new(config: DatabaseConfig) -> Self {
        let (state, _) = watch::channel(ConnectionState::Disconnected);
        Self {
            config,
            connection: Mutex::new(None),
            state,
        }
    }

    pub fn config(&self) -> &DatabaseConfig {
        &self.config
    }

    /// A handle to the live connection, `None` while disconnected
    pub async fn connection(&self) -> Option<DatabaseConnection> {
        self.connection.lock().await.clone()
    }

    fn connect_options(&self) -> ConnectOptions {
        let mut options = ConnectOptions::new(self.config.url.clone());
        options
            .connect_timeout(self.config.connect_timeout)
            .sqlx_logging(self.config.sql_logging);
        if let Some(max) = self.config.max_connections {
            options.max_connections(max);
        }
        options
    }
}

#[async_trait]
impl DatabaseClient for SeaOrmClient {
    type Error = DbErr;

    async fn connect(&self) -> Result<(), DbErr> {
        let mut connection = self.connection.lock().await;
        if connection.is_some() {
            return Ok(());
        }

        tracing::debug!(url = %self.config.redacted_url(), "Opening SeaORM connection");
        self.state.send_replace(ConnectionState::Connecting);
        match Database::connect(self.connect_options()).await {
            Ok(conn) => {
                *connection = Some(conn);
                self.state.send_replace(ConnectionState::Connected);
                Ok(())
            }
            Err(e) => {
                self.state.send_replace(ConnectionState::Disconnected);
                Err(e)
            }
        }
    }

    async fn disconnect(&self) -> Result<(), DbErr> {
        let Some(conn) = self.connection.lock().await.take() else {
            return Ok(());
        };

        self.state.send_replace(ConnectionState::Disconnecting);
        let closed = conn.close().await;
        self.state.send_replace(ConnectionState::Disconnected);
        closed
    }

    fn state(&self) -> ConnectionState {
        *self.state.borrow()
    }

    fn subscribe(&self) -> watch::Receiver<ConnectionState> {
        self.state.subscribe()
    }
}

impl Injectable for SeaOrmClient {
    fn inject(container: &Container) -> crate::Result<Self> {
        let config = container.resolve::<DatabaseConfig>()?;
        Ok(Self::new(config.as_ref().clone()))
    }
}
