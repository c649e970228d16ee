use serde::Serialize;

use super::domain::{DocumentKind, SubmissionId, SubmissionRecord};
use crate::workflows::enrollment::domain::StudentId;
use crate::workflows::enrollment::repository::RepositoryError;

/// Storage abstraction for submission records so the review engine can be
/// exercised in isolation.
pub trait SubmissionRepository: Send + Sync {
    fn insert(&self, record: SubmissionRecord) -> Result<SubmissionRecord, RepositoryError>;

    fn update(&self, record: SubmissionRecord) -> Result<(), RepositoryError>;

    fn fetch(&self, id: &SubmissionId) -> Result<Option<SubmissionRecord>, RepositoryError>;

    fn for_student(&self, id: &StudentId) -> Result<Vec<SubmissionRecord>, RepositoryError>;

    /// Document kinds with at least one approved record for the student.
    /// The stage machine reads this inside the same operation as the stage
    /// write, so the checklist cannot go stale between check and commit.
    fn approved_document_kinds(
        &self,
        id: &StudentId,
    ) -> Result<Vec<DocumentKind>, RepositoryError>;
}

/// Sanitized representation of a submission's exposed status.
#[derive(Debug, Clone, Serialize)]
pub struct SubmissionStatusView {
    pub submission_id: String,
    pub kind: &'static str,
    pub status: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub request_state: Option<&'static str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub rejection_reason: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reviewed_by: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub resubmission_of: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub superseded_by: Option<String>,
}

impl SubmissionRecord {
    pub fn status_view(&self) -> SubmissionStatusView {
        SubmissionStatusView {
            submission_id: self.id.0.clone(),
            kind: self.kind().label(),
            status: self.status.label(),
            request_state: self.request_state().map(|state| state.label()),
            rejection_reason: self.rejection_reason.clone(),
            reviewed_by: self.reviewed_by.clone(),
            resubmission_of: self.resubmission_of.as_ref().map(|id| id.0.clone()),
            superseded_by: self.superseded_by.as_ref().map(|id| id.0.clone()),
        }
    }
}
