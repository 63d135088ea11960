use std::sync::Arc;

use crate::connector::Connector;
use crate::report::ReportGenerator;
use crate::store::AttendanceStore;
use crate::sync::SyncGate;

/// Shared handles every handler reaches through `web::Data<AppState>`.
#[derive(Clone)]
pub struct AppState {
    pub store: Arc<dyn AttendanceStore>,
    pub connector: Arc<dyn Connector>,
    pub reports: Arc<ReportGenerator>,
    pub sync_gate: SyncGate,
}

impl AppState {
    pub fn new(
        store: Arc<dyn AttendanceStore>,
        connector: Arc<dyn Connector>,
        reports: ReportGenerator,
    ) -> Self {
        Self {
            store,
            connector,
            reports: Arc::new(reports),
            sync_gate: SyncGate::default(),
        }
    }

    #[cfg(test)]
    pub fn for_tests(store: Arc<dyn AttendanceStore>, connector: Arc<dyn Connector>) -> Self {
        let reports = ReportGenerator::new(
            None,
            "test-model".into(),
            "http://127.0.0.1:9".into(),
            "English".into(),
        )
        .expect("report client");
        Self::new(store, connector, reports)
    }
}
