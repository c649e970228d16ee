use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use crate::workflows::enrollment::domain::{InstallmentId, StudentId};
use crate::workflows::enrollment::storage::FileReference;

/// Identifier wrapper for submission records of any kind.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SubmissionId(pub String);

/// The fixed checklist of document kinds a student must get approved before
/// the pipeline can reach `documentos_completos`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DocumentKind {
    Cedula,
    Diploma,
    Acta,
    Foto,
    Recibo,
    Formulario,
}

impl DocumentKind {
    pub const fn required() -> [Self; 6] {
        [
            Self::Cedula,
            Self::Diploma,
            Self::Acta,
            Self::Foto,
            Self::Recibo,
            Self::Formulario,
        ]
    }

    pub const fn label(self) -> &'static str {
        match self {
            Self::Cedula => "Cédula de identidad",
            Self::Diploma => "Diploma de bachiller",
            Self::Acta => "Acta de grado",
            Self::Foto => "Foto tipo documento",
            Self::Recibo => "Recibo de pago",
            Self::Formulario => "Formulario de inscripción",
        }
    }
}

/// Shared lifecycle status for every submission record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReviewStatus {
    Pending,
    InReview,
    Approved,
    Rejected,
    Resubmitted,
}

impl ReviewStatus {
    pub const fn label(self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::InReview => "in_review",
            Self::Approved => "approved",
            Self::Rejected => "rejected",
            Self::Resubmitted => "resubmitted",
        }
    }

    /// A record in one of these states may still be approved or rejected.
    pub const fn is_reviewable(self) -> bool {
        matches!(self, Self::Pending | Self::InReview)
    }
}

/// Boundary vocabulary for administrative requests. Stored state is always
/// the internal `ReviewStatus`; this enum only exists at the edge.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RequestState {
    Pendiente,
    EnProceso,
    Completada,
    Rechazada,
}

impl RequestState {
    pub const fn label(self) -> &'static str {
        match self {
            Self::Pendiente => "pendiente",
            Self::EnProceso => "en_proceso",
            Self::Completada => "completada",
            Self::Rechazada => "rechazada",
        }
    }

    pub const fn normalize(self) -> ReviewStatus {
        match self {
            Self::Pendiente => ReviewStatus::Pending,
            Self::EnProceso => ReviewStatus::InReview,
            Self::Completada => ReviewStatus::Approved,
            Self::Rechazada => ReviewStatus::Rejected,
        }
    }

    /// A replaced request still reads as rejected at the boundary; the
    /// replacement carries the pending state.
    pub const fn from_review(status: ReviewStatus) -> Self {
        match status {
            ReviewStatus::Pending => Self::Pendiente,
            ReviewStatus::InReview => Self::EnProceso,
            ReviewStatus::Approved => Self::Completada,
            ReviewStatus::Rejected | ReviewStatus::Resubmitted => Self::Rechazada,
        }
    }
}

/// Discriminant of the submission family.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SubmissionKind {
    Document,
    InstallmentSupport,
    Request,
}

impl SubmissionKind {
    pub const fn label(self) -> &'static str {
        match self {
            Self::Document => "document",
            Self::InstallmentSupport => "installment_support",
            Self::Request => "request",
        }
    }
}

/// Kind-specific payload. The review engine never matches on this beyond the
/// discriminant; lifecycle rules live on the shared sub-structure.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum SubmissionPayload {
    Document {
        kind: DocumentKind,
        file: FileReference,
    },
    InstallmentSupport {
        installment_id: InstallmentId,
        amount_cents: u64,
        due_date: NaiveDate,
        receipt: FileReference,
    },
    Request {
        subject: String,
        message: String,
    },
}

impl SubmissionPayload {
    pub const fn kind(&self) -> SubmissionKind {
        match self {
            Self::Document { .. } => SubmissionKind::Document,
            Self::InstallmentSupport { .. } => SubmissionKind::InstallmentSupport,
            Self::Request { .. } => SubmissionKind::Request,
        }
    }
}

/// One independently-lifecycled item attached to a student. A rejected
/// record may be replaced by exactly one successor; the links form an acyclic
/// chain, never a cycle.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SubmissionRecord {
    pub id: SubmissionId,
    pub student_id: StudentId,
    pub payload: SubmissionPayload,
    pub status: ReviewStatus,
    pub rejection_reason: Option<String>,
    pub reviewed_by: Option<String>,
    pub reviewed_at: Option<DateTime<Utc>>,
    pub resubmission_of: Option<SubmissionId>,
    pub superseded_by: Option<SubmissionId>,
    pub created_at: DateTime<Utc>,
}

impl SubmissionRecord {
    pub const fn kind(&self) -> SubmissionKind {
        self.payload.kind()
    }

    pub fn document_kind(&self) -> Option<DocumentKind> {
        match &self.payload {
            SubmissionPayload::Document { kind, .. } => Some(*kind),
            _ => None,
        }
    }

    /// Boundary status for request records; `None` for other kinds.
    pub fn request_state(&self) -> Option<RequestState> {
        match self.payload {
            SubmissionPayload::Request { .. } => Some(RequestState::from_review(self.status)),
            _ => None,
        }
    }
}
