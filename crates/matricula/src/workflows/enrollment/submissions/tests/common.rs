use std::sync::Arc;

use chrono::{NaiveDate, Utc};

use crate::config::PortalConfig;
use crate::workflows::enrollment::domain::{
    Actor, ActorRole, EnrollmentStage, InstallmentId, Student, StudentId,
};
use crate::workflows::enrollment::memory::{
    MemoryHistoryLedger, MemoryNotificationStore, MemoryStudentRepository,
    MemorySubmissionRepository,
};
use crate::workflows::enrollment::portal::EnrollmentPortal;
use crate::workflows::enrollment::repository::RepositoryError;
use crate::workflows::enrollment::storage::FileReference;
use crate::workflows::enrollment::submissions::domain::{
    DocumentKind, SubmissionId, SubmissionPayload, SubmissionRecord,
};
use crate::workflows::enrollment::submissions::repository::SubmissionRepository;
use crate::workflows::enrollment::submissions::service::NewSubmission;

pub(super) type MemoryPortal = EnrollmentPortal<
    MemorySubmissionRepository,
    MemoryStudentRepository,
    MemoryHistoryLedger,
    MemoryNotificationStore,
>;

pub(super) struct Harness {
    pub(super) portal: Arc<MemoryPortal>,
    pub(super) students: Arc<MemoryStudentRepository>,
    pub(super) notifications: Arc<MemoryNotificationStore>,
}

pub(super) fn harness() -> Harness {
    harness_with_policy(PortalConfig::default())
}

pub(super) fn harness_with_policy(policy: PortalConfig) -> Harness {
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

    Harness {
        portal,
        students,
        notifications,
    }
}

pub(super) fn enroll_student(harness: &Harness, id: &str) -> StudentId {
    enroll_student_at(harness, id, EnrollmentStage::Suscrito)
}

pub(super) fn enroll_student_at(
    harness: &Harness,
    id: &str,
    stage: EnrollmentStage,
) -> StudentId {
    use crate::workflows::enrollment::repository::StudentRepository;

    let student_id = StudentId(id.to_string());
    harness
        .students
        .insert(Student {
            id: student_id.clone(),
            full_name: "Ana María Pérez".to_string(),
            email: format!("{id}@ejemplo.edu"),
            stage,
            created_at: Utc::now(),
        })
        .expect("student inserts");
    student_id
}

pub(super) fn estudiante(id: &str) -> Actor {
    Actor::new(id, ActorRole::Estudiante)
}

pub(super) fn admin() -> Actor {
    Actor::new("admin-1", ActorRole::Admin)
}

pub(super) fn superuser() -> Actor {
    Actor::new("root-1", ActorRole::Superuser)
}

pub(super) fn document_payload(kind: DocumentKind) -> SubmissionPayload {
    SubmissionPayload::Document {
        kind,
        file: FileReference(format!("blob-{}", kind.label())),
    }
}

pub(super) fn request_payload() -> SubmissionPayload {
    SubmissionPayload::Request {
        subject: "Cambio de jornada".to_string(),
        message: "Solicito cambio a la jornada nocturna.".to_string(),
    }
}

pub(super) fn support_payload() -> SubmissionPayload {
    SubmissionPayload::InstallmentSupport {
        installment_id: InstallmentId("cuota-001".to_string()),
        amount_cents: 185_000,
        due_date: NaiveDate::from_ymd_opt(2026, 3, 15).expect("valid date"),
        receipt: FileReference("blob-recibo-001".to_string()),
    }
}

pub(super) fn submit_document(
    harness: &Harness,
    student_id: &StudentId,
    kind: DocumentKind,
) -> SubmissionRecord {
    harness
        .portal
        .review()
        .submit(
            &estudiante(&student_id.0),
            NewSubmission {
                student_id: student_id.clone(),
                payload: document_payload(kind),
            },
        )
        .expect("document submits")
}

/// Submission repository that always reports the backend as down.
pub(super) struct UnavailableSubmissionRepository;

impl SubmissionRepository for UnavailableSubmissionRepository {
    fn insert(&self, _: SubmissionRecord) -> Result<SubmissionRecord, RepositoryError> {
        Err(RepositoryError::Unavailable("connection refused".to_string()))
    }

    fn update(&self, _: SubmissionRecord) -> Result<(), RepositoryError> {
        Err(RepositoryError::Unavailable("connection refused".to_string()))
    }

    fn fetch(&self, _: &SubmissionId) -> Result<Option<SubmissionRecord>, RepositoryError> {
        Err(RepositoryError::Unavailable("connection refused".to_string()))
    }

    fn for_student(&self, _: &StudentId) -> Result<Vec<SubmissionRecord>, RepositoryError> {
        Err(RepositoryError::Unavailable("connection refused".to_string()))
    }

    fn approved_document_kinds(
        &self,
        _: &StudentId,
    ) -> Result<Vec<DocumentKind>, RepositoryError> {
        Err(RepositoryError::Unavailable("connection refused".to_string()))
    }
}

pub(super) fn unavailable_portal() -> (
    Arc<
        EnrollmentPortal<
            UnavailableSubmissionRepository,
            MemoryStudentRepository,
            MemoryHistoryLedger,
            MemoryNotificationStore,
        >,
    >,
    Arc<MemoryStudentRepository>,
) {
    let students = Arc::new(MemoryStudentRepository::default());
    let portal = Arc::new(EnrollmentPortal::new(
        Arc::new(UnavailableSubmissionRepository),
        students.clone(),
        Arc::new(MemoryHistoryLedger::default()),
        Arc::new(MemoryNotificationStore::default()),
        PortalConfig::default(),
    ));
    (portal, students)
}
