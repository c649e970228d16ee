use std::sync::Arc;

use chrono::Utc;

use super::domain::{Actor, EnrollmentStage, StageHistoryEntry, StudentId, ValidationStatus};
use super::history::HistoryLedger;
use super::notifications::{NotificationDispatcher, NotificationError, NotificationStore};
use super::repository::{RepositoryError, StudentRepository};
use super::submissions::domain::DocumentKind;
use super::submissions::repository::SubmissionRepository;

/// Error raised by the stage machine.
#[derive(Debug, thiserror::Error)]
pub enum StageError {
    #[error("forbidden")]
    Forbidden,
    #[error("student {0} not found")]
    StudentNotFound(String),
    #[error("cannot move from '{}' to '{}' without a staff override", .current.label(), .requested.label())]
    OutOfOrderTransition {
        current: EnrollmentStage,
        requested: EnrollmentStage,
    },
    #[error("required documents still pending approval: {}", join_kinds(.missing))]
    PreconditionNotMet { missing: Vec<DocumentKind> },
    #[error(transparent)]
    Repository(#[from] RepositoryError),
    #[error(transparent)]
    Notification(#[from] NotificationError),
}

fn join_kinds(kinds: &[DocumentKind]) -> String {
    kinds
        .iter()
        .map(|kind| kind.label())
        .collect::<Vec<_>>()
        .join(", ")
}

/// Owns the single authoritative enrollment stage per student. Every commit
/// is a conditional update keyed on the previous stage, one ledger append,
/// and one stage notification.
pub struct StageMachine<R, S, H, N> {
    submissions: Arc<R>,
    students: Arc<S>,
    history: Arc<H>,
    dispatcher: Arc<NotificationDispatcher<N>>,
}

impl<R, S, H, N> StageMachine<R, S, H, N>
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
        dispatcher: Arc<NotificationDispatcher<N>>,
    ) -> Self {
        Self {
            submissions,
            students,
            history,
            dispatcher,
        }
    }

    /// Move a student to `target`. Staff may take the immediate next step;
    /// any other jump, forward or backward, requires the superuser override
    /// and is recorded as `overridden`. Backward moves additionally carry the
    /// `reverted` marker so the ledger stays forward-readable.
    pub fn advance(
        &self,
        student_id: &StudentId,
        target: EnrollmentStage,
        actor: &Actor,
        comments: Option<String>,
    ) -> Result<StageHistoryEntry, StageError> {
        if !actor.role.can_review() {
            return Err(StageError::Forbidden);
        }

        let student = self
            .students
            .fetch(student_id)?
            .ok_or_else(|| StageError::StudentNotFound(student_id.0.clone()))?;
        let current = student.stage;

        if target == current {
            return Err(StageError::OutOfOrderTransition {
                current,
                requested: target,
            });
        }

        let is_successor = current.next() == Some(target);
        let overridden = !is_successor;

        if overridden && !actor.role.can_override() {
            return Err(StageError::OutOfOrderTransition {
                current,
                requested: target,
            });
        }

        if !overridden && target == EnrollmentStage::DocumentosCompletos {
            let missing = self.outstanding_documents(student_id)?;
            if !missing.is_empty() {
                return Err(StageError::PreconditionNotMet { missing });
            }
        }

        self.students.transition_stage(student_id, current, target)?;

        let reverted = target.index() < current.index();
        let entry = StageHistoryEntry {
            student_id: student_id.clone(),
            previous_stage: current,
            new_stage: target,
            changed_by: actor.id.clone(),
            comments,
            validation_status: if overridden {
                ValidationStatus::Overridden
            } else {
                ValidationStatus::Approved
            },
            reverted,
            created_at: Utc::now(),
        };

        self.history.append(entry.clone())?;
        self.dispatcher.stage_changed(student_id, target, reverted)?;

        Ok(entry)
    }

    /// Called by the review engine after a document approval. Advances a
    /// student sitting at the pipeline start once the checklist is clear;
    /// students already past `documentos_completos` are left untouched.
    pub(crate) fn attempt_documentos_completos(
        &self,
        student_id: &StudentId,
        actor: &Actor,
    ) -> Result<Option<StageHistoryEntry>, StageError> {
        let student = self
            .students
            .fetch(student_id)?
            .ok_or_else(|| StageError::StudentNotFound(student_id.0.clone()))?;

        if student.stage != EnrollmentStage::Suscrito {
            return Ok(None);
        }

        if !self.outstanding_documents(student_id)?.is_empty() {
            return Ok(None);
        }

        let entry = self.advance(
            student_id,
            EnrollmentStage::DocumentosCompletos,
            actor,
            Some("Checklist de documentos completo".to_string()),
        )?;
        Ok(Some(entry))
    }

    /// Required document kinds the student has not yet gotten approved.
    pub fn outstanding_documents(
        &self,
        student_id: &StudentId,
    ) -> Result<Vec<DocumentKind>, StageError> {
        let approved = self.submissions.approved_document_kinds(student_id)?;
        Ok(DocumentKind::required()
            .iter()
            .copied()
            .filter(|kind| !approved.contains(kind))
            .collect())
    }

    pub fn current_stage(&self, student_id: &StudentId) -> Result<EnrollmentStage, StageError> {
        let student = self
            .students
            .fetch(student_id)?
            .ok_or_else(|| StageError::StudentNotFound(student_id.0.clone()))?;
        Ok(student.stage)
    }

    /// Ledger entries for the student, most recent first.
    pub fn history_for(
        &self,
        student_id: &StudentId,
    ) -> Result<Vec<StageHistoryEntry>, StageError> {
        Ok(self.history.for_student(student_id)?)
    }
}
