use std::sync::Arc;

use crate::config::PortalConfig;

use super::history::HistoryLedger;
use super::notifications::{NotificationDispatcher, NotificationStore};
use super::pipeline::StageMachine;
use super::repository::StudentRepository;
use super::submissions::repository::SubmissionRepository;
use super::submissions::service::ReviewService;

/// Facade wiring the review engine, stage machine, and notification
/// dispatcher over one set of stores. The HTTP router and the CLI both hang
/// off this.
pub struct EnrollmentPortal<R, S, H, N> {
    review: Arc<ReviewService<R, S, H, N>>,
    stages: Arc<StageMachine<R, S, H, N>>,
    notifications: Arc<NotificationDispatcher<N>>,
}

impl<R, S, H, N> EnrollmentPortal<R, S, H, N>
where
    R: SubmissionRepository + 'static,
    S: StudentRepository + 'static,
    H: HistoryLedger + 'static,
    N: NotificationStore + 'static,
{
    pub fn new(
        submissions: Arc<R>,
        students: Arc<S>,
        history: Arc<H>,
        notifications: Arc<N>,
        policy: PortalConfig,
    ) -> Self {
        let dispatcher = Arc::new(NotificationDispatcher::new(notifications));
        let stages = Arc::new(StageMachine::new(
            submissions.clone(),
            students.clone(),
            history,
            dispatcher.clone(),
        ));
        let review = Arc::new(ReviewService::new(
            submissions,
            students,
            stages.clone(),
            dispatcher.clone(),
            policy,
        ));

        Self {
            review,
            stages,
            notifications: dispatcher,
        }
    }

    pub fn review(&self) -> &ReviewService<R, S, H, N> {
        &self.review
    }

    pub fn stages(&self) -> &StageMachine<R, S, H, N> {
        &self.stages
    }

    pub fn notifications(&self) -> &NotificationDispatcher<N> {
        &self.notifications
    }
}
