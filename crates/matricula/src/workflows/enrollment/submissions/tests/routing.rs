use super::common::*;
use axum::body::Body;
use axum::http::{header, Request, StatusCode};
use serde_json::{json, Value};
use tower::ServiceExt;

use crate::workflows::enrollment::submissions::domain::DocumentKind;
use crate::workflows::enrollment::submissions::router::enrollment_router;
use crate::workflows::enrollment::submissions::service::ReviewDecision;

fn post_json(uri: &str, payload: Value) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri(uri)
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(payload.to_string()))
        .expect("request builds")
}

fn get(uri: &str) -> Request<Body> {
    Request::builder()
        .method("GET")
        .uri(uri)
        .body(Body::empty())
        .expect("request builds")
}

async fn body_json(response: axum::response::Response) -> Value {
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .expect("body reads");
    serde_json::from_slice(&bytes).expect("body is json")
}

#[tokio::test]
async fn submit_route_accepts_document_payloads() {
    let harness = harness();
    enroll_student(&harness, "est-100");
    let router = enrollment_router(harness.portal.clone());

    let request = post_json(
        "/api/v1/enrollment/students/est-100/submissions",
        json!({
            "actor": { "id": "est-100", "role": "estudiante" },
            "payload": { "type": "document", "kind": "cedula", "file": "blob-000001" },
        }),
    );

    let response = router.oneshot(request).await.expect("router responds");
    assert_eq!(response.status(), StatusCode::ACCEPTED);

    let body = body_json(response).await;
    assert_eq!(body["status"], "pending");
    assert_eq!(body["kind"], "document");
}

#[tokio::test]
async fn review_route_rejects_empty_reasons() {
    let harness = harness();
    let student_id = enroll_student(&harness, "est-100");
    let record = submit_document(&harness, &student_id, DocumentKind::Foto);
    let router = enrollment_router(harness.portal.clone());

    let request = post_json(
        &format!("/api/v1/enrollment/submissions/{}/review", record.id.0),
        json!({
            "actor": { "id": "admin-1", "role": "admin" },
            "decision": "reject",
            "reason": "",
        }),
    );

    let response = router.oneshot(request).await.expect("router responds");
    assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
}

#[tokio::test]
async fn advance_route_names_the_missing_documents() {
    let harness = harness();
    enroll_student(&harness, "est-100");
    let router = enrollment_router(harness.portal.clone());

    let request = post_json(
        "/api/v1/enrollment/students/est-100/advance",
        json!({
            "actor": { "id": "admin-1", "role": "admin" },
            "target": "documentos_completos",
        }),
    );

    let response = router.oneshot(request).await.expect("router responds");
    assert_eq!(response.status(), StatusCode::PRECONDITION_FAILED);

    let body = body_json(response).await;
    let missing = body["missing"].as_array().expect("missing list present");
    assert_eq!(missing.len(), 6);
}

#[tokio::test]
async fn mark_read_route_denies_foreign_actors() {
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

    use crate::workflows::enrollment::notifications::NotificationStore;
    let notification = harness
        .notifications
        .for_user("est-100")
        .expect("inbox reads")
        .into_iter()
        .next()
        .expect("notification delivered");

    let router = enrollment_router(harness.portal.clone());
    let request = post_json(
        &format!("/api/v1/enrollment/notifications/{}/read", notification.id.0),
        json!({
            "actor": { "id": "est-999", "role": "estudiante" },
        }),
    );

    let response = router.oneshot(request).await.expect("router responds");
    assert_eq!(response.status(), StatusCode::FORBIDDEN);

    let body = body_json(response).await;
    assert_eq!(body["error"], "forbidden");
}

#[tokio::test]
async fn status_route_reports_unknown_students() {
    let harness = harness();
    let router = enrollment_router(harness.portal.clone());

    let response = router
        .oneshot(get("/api/v1/enrollment/students/est-404"))
        .await
        .expect("router responds");
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}
