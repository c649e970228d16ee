use super::common::*;
use crate::config::PortalConfig;
use crate::workflows::enrollment::domain::EnrollmentStage;
use crate::workflows::enrollment::notifications::{NotificationKind, NotificationStore};
use crate::workflows::enrollment::submissions::domain::{DocumentKind, ReviewStatus};
use crate::workflows::enrollment::submissions::service::{ReviewDecision, ReviewError};

#[test]
fn open_review_marks_in_review_and_is_idempotent() {
    let harness = harness();
    let student_id = enroll_student(&harness, "est-100");
    let record = submit_document(&harness, &student_id, DocumentKind::Cedula);

    let opened = harness
        .portal
        .review()
        .open_review(&admin(), &record.id)
        .expect("opens");
    assert_eq!(opened.status, ReviewStatus::InReview);

    let reopened = harness
        .portal
        .review()
        .open_review(&admin(), &record.id)
        .expect("re-open is a no-op");
    assert_eq!(reopened.status, ReviewStatus::InReview);
}

#[test]
fn approve_sets_reviewer_metadata_and_notifies() {
    let harness = harness();
    let student_id = enroll_student(&harness, "est-100");
    let record = submit_document(&harness, &student_id, DocumentKind::Cedula);

    let approved = harness
        .portal
        .review()
        .review(&admin(), &record.id, ReviewDecision::Approve { note: None })
        .expect("approval applies");

    assert_eq!(approved.status, ReviewStatus::Approved);
    assert_eq!(approved.reviewed_by.as_deref(), Some("admin-1"));
    assert!(approved.reviewed_at.is_some());

    let inbox = harness
        .notifications
        .for_user("est-100")
        .expect("inbox reads");
    assert!(inbox
        .iter()
        .any(|row| row.kind == NotificationKind::Document && row.body.contains("aprobado")));
}

#[test]
fn reject_requires_a_non_empty_reason() {
    let harness = harness();
    let student_id = enroll_student(&harness, "est-100");
    let record = submit_document(&harness, &student_id, DocumentKind::Foto);

    let result = harness.portal.review().review(
        &admin(),
        &record.id,
        ReviewDecision::Reject {
            reason: "   ".to_string(),
        },
    );

    assert!(matches!(result, Err(ReviewError::MissingRejectionReason)));

    let unchanged = harness
        .portal
        .review()
        .get(&record.id)
        .expect("record still readable");
    assert_eq!(unchanged.status, ReviewStatus::Pending);
}

#[test]
fn reject_records_reason_and_embeds_it_in_the_notification() {
    let harness = harness();
    let student_id = enroll_student(&harness, "est-100");
    let record = submit_document(&harness, &student_id, DocumentKind::Foto);

    let rejected = harness
        .portal
        .review()
        .review(
            &admin(),
            &record.id,
            ReviewDecision::Reject {
                reason: "Foto borrosa".to_string(),
            },
        )
        .expect("rejection applies");

    assert_eq!(rejected.status, ReviewStatus::Rejected);
    assert_eq!(rejected.rejection_reason.as_deref(), Some("Foto borrosa"));
    assert_eq!(rejected.reviewed_by.as_deref(), Some("admin-1"));
    assert!(rejected.reviewed_at.is_some());

    let inbox = harness
        .notifications
        .for_user("est-100")
        .expect("inbox reads");
    let alert = inbox
        .iter()
        .find(|row| row.kind == NotificationKind::Document)
        .expect("document notification delivered");
    assert!(alert.body.contains("Foto borrosa"));
}

#[test]
fn terminal_records_cannot_be_reviewed_again() {
    let harness = harness();
    let student_id = enroll_student(&harness, "est-100");
    let record = submit_document(&harness, &student_id, DocumentKind::Cedula);

    harness
        .portal
        .review()
        .review(&admin(), &record.id, ReviewDecision::Approve { note: None })
        .expect("first review applies");

    let result = harness.portal.review().review(
        &admin(),
        &record.id,
        ReviewDecision::Reject {
            reason: "cambio de opinión".to_string(),
        },
    );

    assert!(matches!(result, Err(ReviewError::NotReviewable { .. })));
}

#[test]
fn students_cannot_review() {
    let harness = harness();
    let student_id = enroll_student(&harness, "est-100");
    let record = submit_document(&harness, &student_id, DocumentKind::Cedula);

    let result = harness.portal.review().review(
        &estudiante("est-100"),
        &record.id,
        ReviewDecision::Approve { note: None },
    );

    assert!(matches!(result, Err(ReviewError::Forbidden)));
}

#[test]
fn resubmit_creates_a_linked_pending_record_and_preserves_the_origin() {
    let harness = harness();
    let student_id = enroll_student(&harness, "est-100");
    let record = submit_document(&harness, &student_id, DocumentKind::Foto);

    harness
        .portal
        .review()
        .review(
            &admin(),
            &record.id,
            ReviewDecision::Reject {
                reason: "Foto borrosa".to_string(),
            },
        )
        .expect("rejection applies");

    let replacement = harness
        .portal
        .review()
        .resubmit(
            &estudiante("est-100"),
            &record.id,
            document_payload(DocumentKind::Foto),
        )
        .expect("resubmission accepted");

    assert_eq!(replacement.status, ReviewStatus::Pending);
    assert_eq!(replacement.resubmission_of, Some(record.id.clone()));
    assert_ne!(replacement.id, record.id);

    let origin = harness
        .portal
        .review()
        .get(&record.id)
        .expect("origin still queryable");
    assert_eq!(origin.status, ReviewStatus::Resubmitted);
    assert_eq!(origin.rejection_reason.as_deref(), Some("Foto borrosa"));
    assert_eq!(origin.reviewed_by.as_deref(), Some("admin-1"));
    assert_eq!(origin.superseded_by, Some(replacement.id.clone()));
}

#[test]
fn resubmit_requires_a_rejected_origin() {
    let harness = harness();
    let student_id = enroll_student(&harness, "est-100");
    let record = submit_document(&harness, &student_id, DocumentKind::Foto);

    let result = harness.portal.review().resubmit(
        &estudiante("est-100"),
        &record.id,
        document_payload(DocumentKind::Foto),
    );

    assert!(matches!(result, Err(ReviewError::NotRejected { .. })));
}

#[test]
fn resubmit_keeps_the_original_kind() {
    let harness = harness();
    let student_id = enroll_student(&harness, "est-100");
    let record = submit_document(&harness, &student_id, DocumentKind::Foto);

    harness
        .portal
        .review()
        .review(
            &admin(),
            &record.id,
            ReviewDecision::Reject {
                reason: "Foto borrosa".to_string(),
            },
        )
        .expect("rejection applies");

    let result = harness
        .portal
        .review()
        .resubmit(&estudiante("est-100"), &record.id, request_payload());

    assert!(matches!(result, Err(ReviewError::KindMismatch { .. })));
}

#[test]
fn resubmission_chain_is_capped() {
    let harness = harness_with_policy(PortalConfig {
        max_resubmissions: 1,
    });
    let student_id = enroll_student(&harness, "est-100");
    let record = submit_document(&harness, &student_id, DocumentKind::Foto);

    harness
        .portal
        .review()
        .review(
            &admin(),
            &record.id,
            ReviewDecision::Reject {
                reason: "Foto borrosa".to_string(),
            },
        )
        .expect("rejection applies");

    let replacement = harness
        .portal
        .review()
        .resubmit(
            &estudiante("est-100"),
            &record.id,
            document_payload(DocumentKind::Foto),
        )
        .expect("first resubmission fits the cap");

    harness
        .portal
        .review()
        .review(
            &admin(),
            &replacement.id,
            ReviewDecision::Reject {
                reason: "Sigue borrosa".to_string(),
            },
        )
        .expect("second rejection applies");

    let result = harness.portal.review().resubmit(
        &estudiante("est-100"),
        &replacement.id,
        document_payload(DocumentKind::Foto),
    );

    assert!(matches!(
        result,
        Err(ReviewError::ResubmissionLimitReached { limit: 1 })
    ));
}

#[test]
fn approving_the_final_required_document_advances_the_stage() {
    let harness = harness();
    let student_id = enroll_student(&harness, "est-100");

    for kind in DocumentKind::required() {
        let record = submit_document(&harness, &student_id, kind);
        harness
            .portal
            .review()
            .review(&admin(), &record.id, ReviewDecision::Approve { note: None })
            .expect("approval applies");
    }

    let stage = harness
        .portal
        .stages()
        .current_stage(&student_id)
        .expect("stage reads");
    assert_eq!(stage, EnrollmentStage::DocumentosCompletos);

    let history = harness
        .portal
        .stages()
        .history_for(&student_id)
        .expect("history reads");
    assert_eq!(history.len(), 1);
    assert_eq!(history[0].previous_stage, EnrollmentStage::Suscrito);
    assert_eq!(history[0].new_stage, EnrollmentStage::DocumentosCompletos);

    let inbox = harness
        .notifications
        .for_user("est-100")
        .expect("inbox reads");
    assert!(inbox
        .iter()
        .any(|row| row.kind == NotificationKind::Stage));
}

#[test]
fn partial_checklists_never_unlock_the_gate() {
    use crate::workflows::enrollment::pipeline::StageError;

    for approved in 0..DocumentKind::required().len() {
        let harness = harness();
        let student_id = enroll_student(&harness, "est-100");

        for kind in DocumentKind::required().into_iter().take(approved) {
            let record = submit_document(&harness, &student_id, kind);
            harness
                .portal
                .review()
                .review(&admin(), &record.id, ReviewDecision::Approve { note: None })
                .expect("approval applies");
        }

        let result = harness.portal.stages().advance(
            &student_id,
            EnrollmentStage::DocumentosCompletos,
            &admin(),
            None,
        );

        match result {
            Err(StageError::PreconditionNotMet { missing }) => {
                assert_eq!(missing.len(), DocumentKind::required().len() - approved);
            }
            other => panic!("expected precondition failure at {approved}/6, got {other:?}"),
        }
    }
}

#[test]
fn checklist_completion_leaves_students_past_the_gate_untouched() {
    let harness = harness();
    let student_id = enroll_student_at(&harness, "est-100", EnrollmentStage::RegistroValidado);

    for kind in DocumentKind::required() {
        let record = submit_document(&harness, &student_id, kind);
        harness
            .portal
            .review()
            .review(&admin(), &record.id, ReviewDecision::Approve { note: None })
            .expect("approval applies");
    }

    let stage = harness
        .portal
        .stages()
        .current_stage(&student_id)
        .expect("stage reads");
    assert_eq!(stage, EnrollmentStage::RegistroValidado);

    let history = harness
        .portal
        .stages()
        .history_for(&student_id)
        .expect("history reads");
    assert!(history.is_empty());
}
