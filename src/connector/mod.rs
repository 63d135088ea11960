//! Access to the external connector service that talks to the fingerprint
//! devices.

pub mod client;

#[cfg(test)]
pub mod fake;

use async_trait::async_trait;
use thiserror::Error;

use crate::sync::normalize::UpstreamRecord;

pub use client::ConnectorClient;

#[derive(Debug, Error)]
pub enum ConnectorError {
    #[error("connector URL is not configured (set CONNECTOR_URL)")]
    NotConfigured,

    #[error("connector request to {endpoint} failed: {source}")]
    Transport {
        endpoint: &'static str,
        #[source]
        source: reqwest::Error,
    },

    #[error("connector {endpoint} returned HTTP {status}")]
    Http {
        endpoint: &'static str,
        status: u16,
        body: String,
    },

    #[error("connector {endpoint} sent an unreadable payload: {source}")]
    Decode {
        endpoint: &'static str,
        #[source]
        source: reqwest::Error,
    },
}

/// Reply of `GET /status`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConnectorStatus {
    /// False only when the connector explicitly says the device is
    /// unreachable.
    pub connected: bool,
}

/// Records returned by one of the `/sync/*` exports.
#[derive(Debug, Clone, Default)]
pub struct UpstreamBatch {
    pub records: Vec<UpstreamRecord>,
    pub count: usize,
}

#[async_trait]
pub trait Connector: Send + Sync {
    async fn status(&self) -> Result<ConnectorStatus, ConnectorError>;

    async fn sync_users(&self) -> Result<UpstreamBatch, ConnectorError>;

    async fn sync_logs(&self) -> Result<UpstreamBatch, ConnectorError>;
}
