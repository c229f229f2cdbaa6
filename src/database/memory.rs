use super::{ConnectionState, DatabaseClient};
use crate::di::{Container, Injectable};
use async_trait::async_trait;
use std::sync::atomic::{AtomicUsize, Ordering};
use thiserror::Error;
use tokio::sync::watch;

#[derive(Debug, Error)]
pub enum MemoryClientError {
    #[error("Can't reach database server: {0}")]
    Unreachable(String),
}

/// In-process database client
///
/// Holds no data; it only tracks connection state, which makes it the
/// client of choice for tests and for running an application without a
/// database server.
pub struct MemoryClient {
    state: watch::Sender<ConnectionState>,
    unreachable: Option<String>,
    connects: AtomicUsize,
    disconnects: AtomicUsize,
}

impl Default for MemoryClient {
    fn default() -> Self {
        Self::new()
    }
}

impl MemoryClient {
    pub fn new() -> Self {
        let (state, _) = watch::channel(ConnectionState::Disconnected);
        Self {
            state,
            unreachable: None,
            connects: AtomicUsize::new(0),
            disconnects: AtomicUsize::new(0),
        }
    }

    /// A client whose every `connect` fails with [`MemoryClientError::Unreachable`]
    pub fn unreachable(reason: impl Into<String>) -> Self {
        Self {
            unreachable: Some(reason.into()),
            ..Self::new()
        }
    }

    /// Number of times the client went from disconnected to connected
    pub fn connect_count(&self) -> usize {
        self.connects.load(Ordering::Acquire)
    }

    /// Number of times the client released a live connection
    pub fn disconnect_count(&self) -> usize {
        self.disconnects.load(Ordering::Acquire)
    }

    /// Move `from` -> `to`; false if the client is in any other state
    fn begin(&self, from: ConnectionState, to: ConnectionState) -> bool {
        self.state.send_if_modified(|state| {
            if *state == from {
                *state = to;
                true
            } else {
                false
            }
        })
    }

    /// Wait out an in-flight transition and return the state it ended in
    async fn settle(&self) -> ConnectionState {
        let mut state = self.state.subscribe();
        // `self` owns the sender, so the channel stays open while we wait.
        state
            .wait_for(|state| {
                matches!(
                    state,
                    ConnectionState::Connected | ConnectionState::Disconnected
                )
            })
            .await
            .map(|state| *state)
            .unwrap_or(ConnectionState::Disconnected)
    }
}

#[async_trait]
impl DatabaseClient for MemoryClient {
    type Error = MemoryClientError;

    async fn connect(&self) -> Result<(), Self::Error> {
        while !self.begin(ConnectionState::Disconnected, ConnectionState::Connecting) {
            if self.settle().await == ConnectionState::Connected {
                return Ok(());
            }
        }

        tokio::task::yield_now().await;

        if let Some(reason) = &self.unreachable {
            self.state.send_replace(ConnectionState::Disconnected);
            return Err(MemoryClientError::Unreachable(reason.clone()));
        }

        self.connects.fetch_add(1, Ordering::AcqRel);
        self.state.send_replace(ConnectionState::Connected);
        Ok(())
    }

    async fn disconnect(&self) -> Result<(), Self::Error> {
        while !self.begin(ConnectionState::Connected, ConnectionState::Disconnecting) {
            if self.settle().await == ConnectionState::Disconnected {
                return Ok(());
            }
        }

        tokio::task::yield_now().await;

        self.disconnects.fetch_add(1, Ordering::AcqRel);
        self.state.send_replace(ConnectionState::Disconnected);
        Ok(())
    }

    fn state(&self) -> ConnectionState {
        *self.state.borrow()
    }

    fn subscribe(&self) -> watch::Receiver<ConnectionState> {
        self.state.subscribe()
    }
}

impl Injectable for MemoryClient {
    fn inject(_container: &Container) -> crate::Result<Self> {
        Ok(Self::new())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn connect_and_disconnect_are_idempotent() {
        let client = MemoryClient::new();

        client.connect().await.unwrap();
        client.connect().await.unwrap();
        assert_eq!(client.state(), ConnectionState::Connected);
        assert_eq!(client.connect_count(), 1);

        client.disconnect().await.unwrap();
        client.disconnect().await.unwrap();
        assert_eq!(client.state(), ConnectionState::Disconnected);
        assert_eq!(client.disconnect_count(), 1);
    }

    #[tokio::test]
    async fn unreachable_client_stays_disconnected() {
        let client = MemoryClient::unreachable("db.internal:5432");
        let err = client.connect().await.unwrap_err();
        assert_eq!(err.to_string(), "Can't reach database server: db.internal:5432");
        assert_eq!(client.state(), ConnectionState::Disconnected);
        assert_eq!(client.connect_count(), 0);
    }

    #[tokio::test]
    async fn concurrent_connect_waits_for_in_flight_connect() {
        let client = MemoryClient::new();

        let (first, (second, seen)) = tokio::join!(client.connect(), async {
            let result = client.connect().await;
            (result, client.state())
        });

        first.unwrap();
        second.unwrap();
        assert_eq!(seen, ConnectionState::Connected);
        assert_eq!(client.connect_count(), 1);
    }

    #[tokio::test]
    async fn concurrent_connect_to_unreachable_fails_too() {
        let client = MemoryClient::unreachable("db.internal:5432");

        let (first, second) = tokio::join!(client.connect(), client.connect());
        assert!(first.is_err());
        assert!(second.is_err());
        assert_eq!(client.state(), ConnectionState::Disconnected);
    }

    #[tokio::test]
    async fn disconnect_waits_for_in_flight_connect() {
        let client = MemoryClient::new();

        let (connected, disconnected) = tokio::join!(client.connect(), client.disconnect());
        connected.unwrap();
        disconnected.unwrap();
        assert_eq!(client.state(), ConnectionState::Disconnected);
        assert_eq!(client.disconnect_count(), 1);
    }

    #[tokio::test]
    async fn subscribers_see_transitions() {
        let client = MemoryClient::new();
        let mut rx = client.subscribe();

        client.connect().await.unwrap();
        rx.changed().await.unwrap();
        assert_eq!(*rx.borrow_and_update(), ConnectionState::Connected);
        assert_eq!(ConnectionState::Connected.to_string(), "connected");
    }
}
