use std::sync::atomic::AtomicBool;
use std::sync::Arc;

use metrics_exporter_prometheus::PrometheusHandle;

use matricula::config::PortalConfig;
use matricula::workflows::enrollment::memory::{
    MemoryHistoryLedger, MemoryNotificationStore, MemoryStudentRepository,
    MemorySubmissionRepository,
};
use matricula::workflows::enrollment::EnrollmentPortal;

#[derive(Clone)]
pub(crate) struct AppState {
    pub(crate) readiness: Arc<AtomicBool>,
    pub(crate) metrics: Arc<PrometheusHandle>,
}

pub(crate) type MemoryPortal = EnrollmentPortal<
    MemorySubmissionRepository,
    MemoryStudentRepository,
    MemoryHistoryLedger,
    MemoryNotificationStore,
>;

pub(crate) struct PortalStores {
    pub(crate) portal: Arc<MemoryPortal>,
    pub(crate) students: Arc<MemoryStudentRepository>,
    pub(crate) notifications: Arc<MemoryNotificationStore>,
}

/// Wire the portal over the in-memory stores. A relational backend swaps in
/// here without touching the routes.
pub(crate) fn build_portal(policy: PortalConfig) -> PortalStores {
    let submissions = Arc::new(MemorySubmissionRepository::default());
    let students = Arc::new(MemoryStudentRepository::default());
    let history = Arc::new(MemoryHistoryLedger::default());
    let notifications = Arc::new(MemoryNotificationStore::default());

    let portal = Arc::new(EnrollmentPortal::new(
        submissions,
        students.clone(),
        history,
        notifications.clone(),
        policy,
    ));

    PortalStores {
        portal,
        students,
        notifications,
    }
}
