use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use chrono::Utc;
use serde::{Deserialize, Serialize};

use super::domain::{
    ReviewStatus, SubmissionId, SubmissionKind, SubmissionPayload, SubmissionRecord,
};
use super::repository::{SubmissionRepository, SubmissionStatusView};
use crate::config::PortalConfig;
use crate::workflows::enrollment::domain::{Actor, StudentId};
use crate::workflows::enrollment::history::HistoryLedger;
use crate::workflows::enrollment::notifications::{
    NotificationDispatcher, NotificationError, NotificationKind, NotificationStore,
};
use crate::workflows::enrollment::pipeline::{StageError, StageMachine};
use crate::workflows::enrollment::repository::{RepositoryError, StudentRepository};

/// Error raised by the review engine.
#[derive(Debug, thiserror::Error)]
pub enum ReviewError {
    #[error("rejection requires a non-empty reason")]
    MissingRejectionReason,
    #[error("submission field '{0}' must not be empty")]
    EmptyField(&'static str),
    #[error("resubmission payload must keep the original kind '{expected}'")]
    KindMismatch { expected: &'static str },
    #[error("resubmission chain limit of {limit} reached")]
    ResubmissionLimitReached { limit: u8 },
    #[error("submission {id} is '{status}' and can no longer be reviewed")]
    NotReviewable { id: String, status: &'static str },
    #[error("submission {id} is '{status}'; only rejected submissions can be resubmitted")]
    NotRejected { id: String, status: &'static str },
    #[error("forbidden")]
    Forbidden,
    #[error("submission {0} not found")]
    NotFound(String),
    #[error("student {0} not found")]
    StudentNotFound(String),
    #[error(transparent)]
    Repository(#[from] RepositoryError),
    #[error(transparent)]
    Stage(#[from] StageError),
    #[error(transparent)]
    Notification(#[from] NotificationError),
}

/// Inbound submission command from the presentation boundary.
#[derive(Debug, Clone, Deserialize)]
pub struct NewSubmission {
    pub student_id: StudentId,
    pub payload: SubmissionPayload,
}

/// Staff verdict on a reviewable record.
#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "decision", rename_all = "snake_case")]
pub enum ReviewDecision {
    Approve {
        #[serde(default)]
        note: Option<String>,
    },
    Reject {
        reason: String,
    },
}

/// Aggregate read model for the student dashboard.
#[derive(Debug, Clone, Serialize)]
pub struct StudentStatusView {
    pub student_id: String,
    pub full_name: String,
    pub current_stage: &'static str,
    pub pending_count: usize,
    pub rejected_count: usize,
    pub outstanding_documents: Vec<&'static str>,
    pub submissions: Vec<SubmissionStatusView>,
}

static SUBMISSION_SEQUENCE: AtomicU64 = AtomicU64::new(1);

fn next_submission_id() -> SubmissionId {
    let id = SUBMISSION_SEQUENCE.fetch_add(1, Ordering::Relaxed);
    SubmissionId(format!("sub-{id:06}"))
}

/// Uniform lifecycle for documents, installment supports, and requests.
/// Approvals and rejections go through here and nowhere else.
pub struct ReviewService<R, S, H, N> {
    submissions: Arc<R>,
    students: Arc<S>,
    stages: Arc<StageMachine<R, S, H, N>>,
    dispatcher: Arc<NotificationDispatcher<N>>,
    policy: PortalConfig,
}

impl<R, S, H, N> ReviewService<R, S, H, N>
where
    R: SubmissionRepository + 'static,
    S: StudentRepository + 'static,
    H: HistoryLedger + 'static,
    N: NotificationStore + 'static,
{
    pub fn new(
        submissions: Arc<R>,
        students: Arc<S>,
        stages: Arc<StageMachine<R, S, H, N>>,
        dispatcher: Arc<NotificationDispatcher<N>>,
        policy: PortalConfig,
    ) -> Self {
        Self {
            submissions,
            students,
            stages,
            dispatcher,
            policy,
        }
    }

    /// Create a new record in `pending`. Students submit their own items;
    /// staff may file on a student's behalf (e.g. requests answered later).
    pub fn submit(
        &self,
        actor: &Actor,
        submission: NewSubmission,
    ) -> Result<SubmissionRecord, ReviewError> {
        if !actor.owns(&submission.student_id) && !actor.role.can_review() {
            return Err(ReviewError::Forbidden);
        }

        validate_payload(&submission.payload)?;

        if self.students.fetch(&submission.student_id)?.is_none() {
            return Err(ReviewError::StudentNotFound(submission.student_id.0.clone()));
        }

        let record = SubmissionRecord {
            id: next_submission_id(),
            student_id: submission.student_id,
            payload: submission.payload,
            status: ReviewStatus::Pending,
            rejection_reason: None,
            reviewed_by: None,
            reviewed_at: None,
            resubmission_of: None,
            superseded_by: None,
            created_at: Utc::now(),
        };

        Ok(self.submissions.insert(record)?)
    }

    /// Transient `pending -> in_review` step when staff opens an item.
    /// Re-opening an item already in review is a no-op.
    pub fn open_review(
        &self,
        actor: &Actor,
        id: &SubmissionId,
    ) -> Result<SubmissionRecord, ReviewError> {
        if !actor.role.can_review() {
            return Err(ReviewError::Forbidden);
        }

        let mut record = self.fetch_record(id)?;
        match record.status {
            ReviewStatus::InReview => Ok(record),
            ReviewStatus::Pending => {
                record.status = ReviewStatus::InReview;
                self.submissions.update(record.clone())?;
                Ok(record)
            }
            status => Err(ReviewError::NotReviewable {
                id: id.0.clone(),
                status: status.label(),
            }),
        }
    }

    /// Apply a staff verdict. Approving the final outstanding required
    /// document also attempts the `documentos_completos` advancement within
    /// the same call, so the checklist read and the stage write stay in one
    /// operation.
    pub fn review(
        &self,
        actor: &Actor,
        id: &SubmissionId,
        decision: ReviewDecision,
    ) -> Result<SubmissionRecord, ReviewError> {
        if !actor.role.can_review() {
            return Err(ReviewError::Forbidden);
        }

        let mut record = self.fetch_record(id)?;
        if !record.status.is_reviewable() {
            return Err(ReviewError::NotReviewable {
                id: id.0.clone(),
                status: record.status.label(),
            });
        }

        let note = match decision {
            ReviewDecision::Approve { note } => {
                record.status = ReviewStatus::Approved;
                note
            }
            ReviewDecision::Reject { reason } => {
                let reason = reason.trim().to_string();
                if reason.is_empty() {
                    return Err(ReviewError::MissingRejectionReason);
                }
                record.status = ReviewStatus::Rejected;
                record.rejection_reason = Some(reason);
                None
            }
        };

        record.reviewed_by = Some(actor.id.clone());
        record.reviewed_at = Some(Utc::now());
        self.submissions.update(record.clone())?;

        self.notify_outcome(&record, note)?;

        if record.status == ReviewStatus::Approved
            && record.kind() == SubmissionKind::Document
        {
            self.stages
                .attempt_documentos_completos(&record.student_id, actor)?;
        }

        Ok(record)
    }

    /// Replace a rejected record with a fresh one of the same kind. The
    /// origin keeps its rejection reason and reviewer fields; only its status
    /// flips to `resubmitted` and the chain links are set.
    pub fn resubmit(
        &self,
        actor: &Actor,
        origin_id: &SubmissionId,
        payload: SubmissionPayload,
    ) -> Result<SubmissionRecord, ReviewError> {
        let mut origin = self.fetch_record(origin_id)?;

        if !actor.owns(&origin.student_id) && !actor.role.can_review() {
            return Err(ReviewError::Forbidden);
        }

        if origin.status != ReviewStatus::Rejected {
            return Err(ReviewError::NotRejected {
                id: origin_id.0.clone(),
                status: origin.status.label(),
            });
        }

        if payload.kind() != origin.kind() {
            return Err(ReviewError::KindMismatch {
                expected: origin.kind().label(),
            });
        }
        validate_payload(&payload)?;

        let limit = self.policy.max_resubmissions;
        if self.chain_length(&origin)? >= usize::from(limit) {
            return Err(ReviewError::ResubmissionLimitReached { limit });
        }

        let replacement = SubmissionRecord {
            id: next_submission_id(),
            student_id: origin.student_id.clone(),
            payload,
            status: ReviewStatus::Pending,
            rejection_reason: None,
            reviewed_by: None,
            reviewed_at: None,
            resubmission_of: Some(origin.id.clone()),
            superseded_by: None,
            created_at: Utc::now(),
        };

        let stored = self.submissions.insert(replacement)?;

        origin.status = ReviewStatus::Resubmitted;
        origin.superseded_by = Some(stored.id.clone());
        self.submissions.update(origin)?;

        Ok(stored)
    }

    pub fn get(&self, id: &SubmissionId) -> Result<SubmissionRecord, ReviewError> {
        self.fetch_record(id)
    }

    pub fn submissions_for(
        &self,
        student_id: &StudentId,
    ) -> Result<Vec<SubmissionRecord>, ReviewError> {
        Ok(self.submissions.for_student(student_id)?)
    }

    /// Dashboard read model: current stage, open and rejected counts, and
    /// the outstanding document checklist.
    pub fn student_status(&self, student_id: &StudentId) -> Result<StudentStatusView, ReviewError> {
        let student = self
            .students
            .fetch(student_id)?
            .ok_or_else(|| ReviewError::StudentNotFound(student_id.0.clone()))?;

        let records = self.submissions.for_student(student_id)?;
        let pending_count = records
            .iter()
            .filter(|record| record.status.is_reviewable())
            .count();
        let rejected_count = records
            .iter()
            .filter(|record| record.status == ReviewStatus::Rejected)
            .count();
        let outstanding = self.stages.outstanding_documents(student_id)?;

        Ok(StudentStatusView {
            student_id: student.id.0,
            full_name: student.full_name,
            current_stage: student.stage.label(),
            pending_count,
            rejected_count,
            outstanding_documents: outstanding.iter().map(|kind| kind.label()).collect(),
            submissions: records.iter().map(SubmissionRecord::status_view).collect(),
        })
    }

    fn fetch_record(&self, id: &SubmissionId) -> Result<SubmissionRecord, ReviewError> {
        self.submissions
            .fetch(id)?
            .ok_or_else(|| ReviewError::NotFound(id.0.clone()))
    }

    /// Number of resubmissions already behind `record`, by walking the
    /// origin links backwards.
    fn chain_length(&self, record: &SubmissionRecord) -> Result<usize, ReviewError> {
        let mut length = 0;
        let mut cursor = record.resubmission_of.clone();
        while let Some(origin_id) = cursor {
            length += 1;
            cursor = self
                .submissions
                .fetch(&origin_id)?
                .and_then(|origin| origin.resubmission_of);
        }
        Ok(length)
    }

    fn notify_outcome(
        &self,
        record: &SubmissionRecord,
        note: Option<String>,
    ) -> Result<(), ReviewError> {
        let (kind, subject) = match record.kind() {
            SubmissionKind::Document => (
                NotificationKind::Document,
                record
                    .document_kind()
                    .map(|kind| kind.label().to_string())
                    .unwrap_or_else(|| "Documento".to_string()),
            ),
            SubmissionKind::Request => (NotificationKind::Request, "Tu solicitud".to_string()),
            SubmissionKind::InstallmentSupport => {
                (NotificationKind::General, "Tu soporte de pago".to_string())
            }
        };

        let (title, body) = match (&record.status, &record.rejection_reason) {
            (ReviewStatus::Approved, _) => {
                let mut body = format!("{subject} fue aprobado.");
                if let Some(note) = note {
                    body.push(' ');
                    body.push_str(&note);
                }
                ("Revisión aprobada".to_string(), body)
            }
            (ReviewStatus::Rejected, Some(reason)) => (
                "Revisión rechazada".to_string(),
                format!("{subject} fue rechazado: {reason}"),
            ),
            _ => return Ok(()),
        };

        self.dispatcher.dispatch(
            &record.student_id.0,
            kind,
            title,
            body,
            Some(format!("/enrollment/submissions/{}", record.id.0)),
        )?;
        Ok(())
    }
}

fn validate_payload(payload: &SubmissionPayload) -> Result<(), ReviewError> {
    match payload {
        SubmissionPayload::Document { file, .. } => {
            if file.0.trim().is_empty() {
                return Err(ReviewError::EmptyField("file"));
            }
        }
        SubmissionPayload::InstallmentSupport {
            amount_cents,
            receipt,
            ..
        } => {
            if receipt.0.trim().is_empty() {
                return Err(ReviewError::EmptyField("receipt"));
            }
            if *amount_cents == 0 {
                return Err(ReviewError::EmptyField("amount_cents"));
            }
        }
        SubmissionPayload::Request { subject, message } => {
            if subject.trim().is_empty() {
                return Err(ReviewError::EmptyField("subject"));
            }
            if message.trim().is_empty() {
                return Err(ReviewError::EmptyField("message"));
            }
        }
    }
    Ok(())
}
