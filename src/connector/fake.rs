//! Scripted connector for the sync tests.

use std::sync::atomic::{AtomicUsize, Ordering};

use async_trait::async_trait;
use serde_json::Value;

use super::{Connector, ConnectorError, ConnectorStatus, UpstreamBatch};
use crate::sync::normalize::UpstreamRecord;

#[derive(Default)]
pub struct FakeConnector {
    users: Vec<Value>,
    logs: Vec<Value>,
    /// Every endpoint answers with this HTTP status when set.
    failure: Option<u16>,
    unconfigured: bool,
    disconnected: bool,
    pub status_calls: AtomicUsize,
    pub user_calls: AtomicUsize,
    pub log_calls: AtomicUsize,
}

impl FakeConnector {
    pub fn with_users(users: Vec<Value>) -> Self {
        Self {
            users,
            ..Default::default()
        }
    }

    pub fn with_logs(logs: Vec<Value>) -> Self {
        Self {
            logs,
            ..Default::default()
        }
    }

    pub fn failing(status: u16) -> Self {
        Self {
            failure: Some(status),
            ..Default::default()
        }
    }

    pub fn unconfigured() -> Self {
        Self {
            unconfigured: true,
            ..Default::default()
        }
    }

    pub fn disconnected() -> Self {
        Self {
            disconnected: true,
            ..Default::default()
        }
    }

    fn check(&self, endpoint: &'static str) -> Result<(), ConnectorError> {
        if self.unconfigured {
            return Err(ConnectorError::NotConfigured);
        }
        match self.failure {
            Some(status) => Err(ConnectorError::Http {
                endpoint,
                status,
                body: String::new(),
            }),
            None => Ok(()),
        }
    }

    fn batch(items: &[Value]) -> UpstreamBatch {
        UpstreamBatch {
            records: items.iter().cloned().map(UpstreamRecord::from_value).collect(),
            count: items.len(),
        }
    }
}

#[async_trait]
impl Connector for FakeConnector {
    async fn status(&self) -> Result<ConnectorStatus, ConnectorError> {
        self.status_calls.fetch_add(1, Ordering::SeqCst);
        self.check("status")?;
        Ok(ConnectorStatus {
            connected: !self.disconnected,
        })
    }

    async fn sync_users(&self) -> Result<UpstreamBatch, ConnectorError> {
        self.user_calls.fetch_add(1, Ordering::SeqCst);
        self.check("sync/users")?;
        Ok(Self::batch(&self.users))
    }

    async fn sync_logs(&self) -> Result<UpstreamBatch, ConnectorError> {
        self.log_calls.fetch_add(1, Ordering::SeqCst);
        self.check("sync/logs")?;
        Ok(Self::batch(&self.logs))
    }
}
