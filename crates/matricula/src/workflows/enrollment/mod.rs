//! Enrollment lifecycle engine: the 9-stage pipeline, the shared submission
//! review workflow, the append-only stage ledger, and notification fan-out.

pub mod domain;
pub mod history;
pub mod memory;
pub mod notifications;
pub mod pipeline;
mod portal;
pub mod repository;
pub mod roster;
pub mod storage;
pub mod submissions;

pub use domain::{
    Actor, ActorRole, EnrollmentStage, Installment, InstallmentId, StageHistoryEntry, Student,
    StudentId, ValidationStatus,
};
pub use history::{HistoryLedger, StageHistoryView};
pub use notifications::{
    Notification, NotificationDispatcher, NotificationError, NotificationId, NotificationKind,
    NotificationStore,
};
pub use pipeline::{StageError, StageMachine};
pub use portal::EnrollmentPortal;
pub use repository::{InstallmentRepository, RepositoryError, StudentRepository};
pub use roster::{import_students, parse_roster, RosterImportError, StudentDraft};
pub use storage::{FileReference, FileStore, FileUpload, StorageError};
