use std::fmt;
use std::time::{Duration, Instant};

use async_trait::async_trait;
use thiserror::Error;
use tracing::{debug, error, warn};

use crate::config::ConnectionSettings;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{message}")]
pub struct BackendError {
    message: String,
}

impl BackendError {
    #[must_use]
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

#[async_trait]
pub trait ConnectionBackend {
    type Connection: Send;

    async fn connect(
        &self,
        settings: &ConnectionSettings,
    ) -> Result<Self::Connection, BackendError>;
    async fn ping(&self, connection: &mut Self::Connection) -> Result<(), BackendError>;
    async fn disconnect(&self, connection: Self::Connection) -> Result<(), BackendError>;
}

/// The database could not be reached or refused the credentials.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("failed to connect to {target}: {source}")]
pub struct ConnectionError {
    pub target: String,
    #[source]
    pub source: BackendError,
}

/// Opens one connection per render cycle with fixed settings. No retries.
#[derive(Debug)]
pub struct ConnectionProvider<B: ConnectionBackend> {
    backend: B,
    settings: ConnectionSettings,
}

impl<B: ConnectionBackend> ConnectionProvider<B> {
    #[must_use]
    pub fn new(backend: B, settings: ConnectionSettings) -> Self {
        Self { backend, settings }
    }

    #[must_use]
    pub fn backend(&self) -> &B {
        &self.backend
    }

    #[must_use]
    pub fn settings(&self) -> &ConnectionSettings {
        &self.settings
    }

    pub async fn acquire(&self) -> Result<ConnectionLease<'_, B>, ConnectionError> {
        let started_at = Instant::now();
        let mut handle = self
            .backend
            .connect(&self.settings)
            .await
            .map_err(|source| self.connection_error(source))?;

        if let Err(source) = self.backend.ping(&mut handle).await {
            if let Err(close_error) = self.backend.disconnect(handle).await {
                warn!(error = %close_error, "closing unhealthy connection failed");
            }
            return Err(self.connection_error(source));
        }

        let latency = started_at.elapsed();
        debug!(latency_ms = latency.as_millis(), "connection acquired");
        Ok(ConnectionLease {
            provider: self,
            handle: Some(handle),
            latency,
        })
    }

    fn connection_error(&self, source: BackendError) -> ConnectionError {
        let error = ConnectionError {
            target: self.settings.display_target(),
            source,
        };
        error!(%error, "connection attempt failed");
        error
    }
}

/// A connection borrowed for exactly one cycle.
///
/// Call [`ConnectionLease::release`] when done. A lease that is dropped
/// without being released hands the raw handle to the driver's own drop.
pub struct ConnectionLease<'p, B: ConnectionBackend> {
    provider: &'p ConnectionProvider<B>,
    handle: Option<B::Connection>,
    latency: Duration,
}

impl<'p, B: ConnectionBackend> ConnectionLease<'p, B> {
    #[must_use]
    pub fn latency(&self) -> Duration {
        self.latency
    }

    #[must_use]
    pub fn backend(&self) -> &'p B {
        let provider: &'p ConnectionProvider<B> = self.provider;
        &provider.backend
    }

    pub fn connection_mut(&mut self) -> Option<&mut B::Connection> {
        self.handle.as_mut()
    }

    /// Closes the connection. Failures closing an already dead connection are
    /// logged and otherwise ignored.
    pub async fn release(mut self) {
        let Some(handle) = self.handle.take() else {
            return;
        };
        match self.provider.backend.disconnect(handle).await {
            Ok(()) => debug!("connection released"),
            Err(error) => warn!(%error, "connection was already closed on release"),
        }
    }
}

impl<B: ConnectionBackend> fmt::Debug for ConnectionLease<'_, B> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ConnectionLease")
            .field("open", &self.handle.is_some())
            .field("latency", &self.latency)
            .finish_non_exhaustive()
    }
}

impl<B: ConnectionBackend> Drop for ConnectionLease<'_, B> {
    fn drop(&mut self) {
        if self.handle.take().is_some() {
            warn!("connection lease dropped without release");
        }
    }
}
