//! Device-backed reconciliation: pulling users and punches from the
//! connector into the store without duplicating rows.

pub mod attendance;
pub mod employees;
pub mod normalize;
pub mod probe;

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use actix_web::{HttpResponse, ResponseError, http::StatusCode};
use chrono::Utc;
use serde_json::json;
use thiserror::Error;
use tracing::warn;

use crate::connector::ConnectorError;
use crate::model::device::{BiometricDevice, DeviceStatus};
use crate::store::{AttendanceStore, StoreError};

#[derive(Debug, Error)]
pub enum SyncError {
    #[error(transparent)]
    Connector(#[from] ConnectorError),

    #[error(transparent)]
    Store(#[from] StoreError),

    #[error("device {0} not found")]
    DeviceNotFound(u64),

    #[error("device {0} is not online; run a connection check first")]
    DeviceOffline(u64),

    #[error("another device sync is already running")]
    Busy,
}

impl SyncError {
    pub fn is_configuration(&self) -> bool {
        matches!(self, SyncError::Connector(ConnectorError::NotConfigured))
    }
}

impl ResponseError for SyncError {
    fn status_code(&self) -> StatusCode {
        match self {
            SyncError::Connector(ConnectorError::NotConfigured) => StatusCode::SERVICE_UNAVAILABLE,
            SyncError::Connector(_) => StatusCode::BAD_GATEWAY,
            SyncError::Store(_) => StatusCode::INTERNAL_SERVER_ERROR,
            SyncError::DeviceNotFound(_) => StatusCode::NOT_FOUND,
            SyncError::DeviceOffline(_) | SyncError::Busy => StatusCode::CONFLICT,
        }
    }

    fn error_response(&self) -> HttpResponse {
        HttpResponse::build(self.status_code()).json(json!({
            "message": self.to_string()
        }))
    }
}

/// Process-wide "currently syncing" flag. Only one sync or probe runs at a
/// time; a second caller is turned away rather than queued.
#[derive(Clone, Default)]
pub struct SyncGate {
    busy: Arc<AtomicBool>,
}

/// Held for the duration of one sync; releases the gate on drop.
pub struct SyncPermit {
    busy: Arc<AtomicBool>,
}

impl SyncGate {
    pub fn try_begin(&self) -> Result<SyncPermit, SyncError> {
        self.busy
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .map_err(|_| SyncError::Busy)?;
        Ok(SyncPermit {
            busy: Arc::clone(&self.busy),
        })
    }

    pub fn is_busy(&self) -> bool {
        self.busy.load(Ordering::Acquire)
    }
}

impl Drop for SyncPermit {
    fn drop(&mut self) {
        self.busy.store(false, Ordering::Release);
    }
}

pub(crate) async fn load_device(
    store: &dyn AttendanceStore,
    device_id: u64,
) -> Result<BiometricDevice, SyncError> {
    store
        .get_device(device_id)
        .await?
        .ok_or(SyncError::DeviceNotFound(device_id))
}

pub(crate) async fn require_online(
    store: &dyn AttendanceStore,
    device_id: u64,
) -> Result<BiometricDevice, SyncError> {
    let device = load_device(store, device_id).await?;
    if device.status != DeviceStatus::Online {
        return Err(SyncError::DeviceOffline(device_id));
    }
    Ok(device)
}

/// Marks the device offline after the connector failed to serve it. A
/// missing connector URL says nothing about the device and leaves it as is.
pub(crate) async fn device_unreachable(
    store: &dyn AttendanceStore,
    device_id: u64,
    err: ConnectorError,
) -> SyncError {
    if !matches!(err, ConnectorError::NotConfigured) {
        if let Err(store_err) = store.set_device_status(device_id, DeviceStatus::Offline).await {
            warn!(device_id, error = %store_err, "Could not mark device offline");
        }
    }
    SyncError::Connector(err)
}

/// Called as soon as the connector answered, before any row is written.
pub(crate) async fn stamp_last_sync(
    store: &dyn AttendanceStore,
    device_id: u64,
) -> Result<(), SyncError> {
    store.set_device_last_sync(device_id, Utc::now()).await?;
    Ok(())
}
