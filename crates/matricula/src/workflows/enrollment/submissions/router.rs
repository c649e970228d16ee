use std::sync::Arc;

use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
    Router,
};
use serde::Deserialize;
use serde_json::json;

use super::domain::{SubmissionId, SubmissionPayload};
use super::repository::SubmissionRepository;
use super::service::{NewSubmission, ReviewDecision, ReviewError};
use crate::workflows::enrollment::domain::{Actor, EnrollmentStage, StageHistoryEntry, StudentId};
use crate::workflows::enrollment::history::HistoryLedger;
use crate::workflows::enrollment::notifications::{NotificationError, NotificationId, NotificationStore};
use crate::workflows::enrollment::pipeline::StageError;
use crate::workflows::enrollment::portal::EnrollmentPortal;
use crate::workflows::enrollment::repository::{RepositoryError, StudentRepository};

#[derive(Debug, Deserialize)]
pub(crate) struct SubmitRequest {
    pub(crate) actor: Actor,
    pub(crate) payload: SubmissionPayload,
}

#[derive(Debug, Deserialize)]
pub(crate) struct ReviewRequest {
    pub(crate) actor: Actor,
    #[serde(flatten)]
    pub(crate) decision: ReviewDecision,
}

#[derive(Debug, Deserialize)]
pub(crate) struct ResubmitRequest {
    pub(crate) actor: Actor,
    pub(crate) payload: SubmissionPayload,
}

#[derive(Debug, Deserialize)]
pub(crate) struct AdvanceRequest {
    pub(crate) actor: Actor,
    pub(crate) target: EnrollmentStage,
    #[serde(default)]
    pub(crate) comments: Option<String>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct ActorRequest {
    pub(crate) actor: Actor,
}

/// Router builder exposing the enrollment commands and read models.
pub fn enrollment_router<R, S, H, N>(portal: Arc<EnrollmentPortal<R, S, H, N>>) -> Router
where
    R: SubmissionRepository + 'static,
    S: StudentRepository + 'static,
    H: HistoryLedger + 'static,
    N: NotificationStore + 'static,
{
    Router::new()
        .route(
            "/api/v1/enrollment/students/:student_id/submissions",
            post(submit_handler::<R, S, H, N>),
        )
        .route(
            "/api/v1/enrollment/students/:student_id",
            get(student_status_handler::<R, S, H, N>),
        )
        .route(
            "/api/v1/enrollment/students/:student_id/history",
            get(history_handler::<R, S, H, N>),
        )
        .route(
            "/api/v1/enrollment/students/:student_id/advance",
            post(advance_handler::<R, S, H, N>),
        )
        .route(
            "/api/v1/enrollment/submissions/:submission_id/open",
            post(open_review_handler::<R, S, H, N>),
        )
        .route(
            "/api/v1/enrollment/submissions/:submission_id/review",
            post(review_handler::<R, S, H, N>),
        )
        .route(
            "/api/v1/enrollment/submissions/:submission_id/resubmit",
            post(resubmit_handler::<R, S, H, N>),
        )
        .route(
            "/api/v1/enrollment/notifications/:user_id",
            get(inbox_handler::<R, S, H, N>),
        )
        .route(
            "/api/v1/enrollment/notifications/:user_id/unread",
            get(unread_count_handler::<R, S, H, N>),
        )
        .route(
            "/api/v1/enrollment/notifications/:notification_id/read",
            post(mark_read_handler::<R, S, H, N>),
        )
        .route(
            "/api/v1/enrollment/notifications/read-all",
            post(mark_all_read_handler::<R, S, H, N>),
        )
        .with_state(portal)
}

pub(crate) async fn submit_handler<R, S, H, N>(
    State(portal): State<Arc<EnrollmentPortal<R, S, H, N>>>,
    Path(student_id): Path<String>,
    axum::Json(request): axum::Json<SubmitRequest>,
) -> Response
where
    R: SubmissionRepository + 'static,
    S: StudentRepository + 'static,
    H: HistoryLedger + 'static,
    N: NotificationStore + 'static,
{
    let submission = NewSubmission {
        student_id: StudentId(student_id),
        payload: request.payload,
    };

    match portal.review().submit(&request.actor, submission) {
        Ok(record) => (StatusCode::ACCEPTED, axum::Json(record.status_view())).into_response(),
        Err(err) => review_error_response(err),
    }
}

pub(crate) async fn open_review_handler<R, S, H, N>(
    State(portal): State<Arc<EnrollmentPortal<R, S, H, N>>>,
    Path(submission_id): Path<String>,
    axum::Json(request): axum::Json<ActorRequest>,
) -> Response
where
    R: SubmissionRepository + 'static,
    S: StudentRepository + 'static,
    H: HistoryLedger + 'static,
    N: NotificationStore + 'static,
{
    let id = SubmissionId(submission_id);
    match portal.review().open_review(&request.actor, &id) {
        Ok(record) => (StatusCode::OK, axum::Json(record.status_view())).into_response(),
        Err(err) => review_error_response(err),
    }
}

pub(crate) async fn review_handler<R, S, H, N>(
    State(portal): State<Arc<EnrollmentPortal<R, S, H, N>>>,
    Path(submission_id): Path<String>,
    axum::Json(request): axum::Json<ReviewRequest>,
) -> Response
where
    R: SubmissionRepository + 'static,
    S: StudentRepository + 'static,
    H: HistoryLedger + 'static,
    N: NotificationStore + 'static,
{
    let id = SubmissionId(submission_id);
    match portal.review().review(&request.actor, &id, request.decision) {
        Ok(record) => (StatusCode::OK, axum::Json(record.status_view())).into_response(),
        Err(err) => review_error_response(err),
    }
}

pub(crate) async fn resubmit_handler<R, S, H, N>(
    State(portal): State<Arc<EnrollmentPortal<R, S, H, N>>>,
    Path(submission_id): Path<String>,
    axum::Json(request): axum::Json<ResubmitRequest>,
) -> Response
where
    R: SubmissionRepository + 'static,
    S: StudentRepository + 'static,
    H: HistoryLedger + 'static,
    N: NotificationStore + 'static,
{
    let id = SubmissionId(submission_id);
    match portal.review().resubmit(&request.actor, &id, request.payload) {
        Ok(record) => (StatusCode::ACCEPTED, axum::Json(record.status_view())).into_response(),
        Err(err) => review_error_response(err),
    }
}

pub(crate) async fn student_status_handler<R, S, H, N>(
    State(portal): State<Arc<EnrollmentPortal<R, S, H, N>>>,
    Path(student_id): Path<String>,
) -> Response
where
    R: SubmissionRepository + 'static,
    S: StudentRepository + 'static,
    H: HistoryLedger + 'static,
    N: NotificationStore + 'static,
{
    let id = StudentId(student_id);
    match portal.review().student_status(&id) {
        Ok(view) => (StatusCode::OK, axum::Json(view)).into_response(),
        Err(err) => review_error_response(err),
    }
}

pub(crate) async fn history_handler<R, S, H, N>(
    State(portal): State<Arc<EnrollmentPortal<R, S, H, N>>>,
    Path(student_id): Path<String>,
) -> Response
where
    R: SubmissionRepository + 'static,
    S: StudentRepository + 'static,
    H: HistoryLedger + 'static,
    N: NotificationStore + 'static,
{
    let id = StudentId(student_id);
    match portal.stages().history_for(&id) {
        Ok(entries) => {
            let views: Vec<_> = entries.iter().map(StageHistoryEntry::to_view).collect();
            (StatusCode::OK, axum::Json(views)).into_response()
        }
        Err(err) => stage_error_response(err),
    }
}

pub(crate) async fn advance_handler<R, S, H, N>(
    State(portal): State<Arc<EnrollmentPortal<R, S, H, N>>>,
    Path(student_id): Path<String>,
    axum::Json(request): axum::Json<AdvanceRequest>,
) -> Response
where
    R: SubmissionRepository + 'static,
    S: StudentRepository + 'static,
    H: HistoryLedger + 'static,
    N: NotificationStore + 'static,
{
    let id = StudentId(student_id);
    match portal
        .stages()
        .advance(&id, request.target, &request.actor, request.comments)
    {
        Ok(entry) => (StatusCode::OK, axum::Json(entry.to_view())).into_response(),
        Err(err) => stage_error_response(err),
    }
}

pub(crate) async fn inbox_handler<R, S, H, N>(
    State(portal): State<Arc<EnrollmentPortal<R, S, H, N>>>,
    Path(user_id): Path<String>,
) -> Response
where
    R: SubmissionRepository + 'static,
    S: StudentRepository + 'static,
    H: HistoryLedger + 'static,
    N: NotificationStore + 'static,
{
    match portal.notifications().inbox(&user_id) {
        Ok(rows) => (StatusCode::OK, axum::Json(rows)).into_response(),
        Err(err) => notification_error_response(err),
    }
}

pub(crate) async fn unread_count_handler<R, S, H, N>(
    State(portal): State<Arc<EnrollmentPortal<R, S, H, N>>>,
    Path(user_id): Path<String>,
) -> Response
where
    R: SubmissionRepository + 'static,
    S: StudentRepository + 'static,
    H: HistoryLedger + 'static,
    N: NotificationStore + 'static,
{
    match portal.notifications().unread_count(&user_id) {
        Ok(count) => (StatusCode::OK, axum::Json(json!({ "unread": count }))).into_response(),
        Err(err) => notification_error_response(err),
    }
}

pub(crate) async fn mark_read_handler<R, S, H, N>(
    State(portal): State<Arc<EnrollmentPortal<R, S, H, N>>>,
    Path(notification_id): Path<String>,
    axum::Json(request): axum::Json<ActorRequest>,
) -> Response
where
    R: SubmissionRepository + 'static,
    S: StudentRepository + 'static,
    H: HistoryLedger + 'static,
    N: NotificationStore + 'static,
{
    let id = NotificationId(notification_id);
    match portal.notifications().mark_as_read(&request.actor, &id) {
        Ok(()) => (StatusCode::OK, axum::Json(json!({ "read": true }))).into_response(),
        Err(err) => notification_error_response(err),
    }
}

pub(crate) async fn mark_all_read_handler<R, S, H, N>(
    State(portal): State<Arc<EnrollmentPortal<R, S, H, N>>>,
    axum::Json(request): axum::Json<ActorRequest>,
) -> Response
where
    R: SubmissionRepository + 'static,
    S: StudentRepository + 'static,
    H: HistoryLedger + 'static,
    N: NotificationStore + 'static,
{
    match portal.notifications().mark_all_as_read(&request.actor) {
        Ok(count) => (StatusCode::OK, axum::Json(json!({ "read": count }))).into_response(),
        Err(err) => notification_error_response(err),
    }
}

fn review_error_response(err: ReviewError) -> Response {
    match err {
        ReviewError::Forbidden => forbidden_response(),
        ReviewError::NotFound(_) | ReviewError::StudentNotFound(_) => {
            error_response(StatusCode::NOT_FOUND, &err)
        }
        ReviewError::MissingRejectionReason
        | ReviewError::EmptyField(_)
        | ReviewError::KindMismatch { .. }
        | ReviewError::ResubmissionLimitReached { .. } => {
            error_response(StatusCode::UNPROCESSABLE_ENTITY, &err)
        }
        ReviewError::NotReviewable { .. } | ReviewError::NotRejected { .. } => {
            error_response(StatusCode::CONFLICT, &err)
        }
        ReviewError::Stage(err) => stage_error_response(err),
        ReviewError::Notification(err) => notification_error_response(err),
        ReviewError::Repository(err) => repository_error_response(err),
    }
}

fn stage_error_response(err: StageError) -> Response {
    match err {
        StageError::Forbidden => forbidden_response(),
        StageError::StudentNotFound(_) => error_response(StatusCode::NOT_FOUND, &err),
        StageError::OutOfOrderTransition { .. } => error_response(StatusCode::CONFLICT, &err),
        StageError::PreconditionNotMet { ref missing } => {
            let payload = json!({
                "error": err.to_string(),
                "missing": missing.iter().map(|kind| kind.label()).collect::<Vec<_>>(),
            });
            (StatusCode::PRECONDITION_FAILED, axum::Json(payload)).into_response()
        }
        StageError::Notification(err) => notification_error_response(err),
        StageError::Repository(err) => repository_error_response(err),
    }
}

fn notification_error_response(err: NotificationError) -> Response {
    match err {
        NotificationError::Forbidden => forbidden_response(),
        NotificationError::NotFound(_) => error_response(StatusCode::NOT_FOUND, &err),
        NotificationError::Store(err) => repository_error_response(err),
    }
}

fn repository_error_response(err: RepositoryError) -> Response {
    let status = match err {
        RepositoryError::Conflict => StatusCode::CONFLICT,
        RepositoryError::NotFound => StatusCode::NOT_FOUND,
        RepositoryError::Unavailable(_) => StatusCode::SERVICE_UNAVAILABLE,
    };
    error_response(status, &err)
}

/// Generic denial; deliberately carries no detail about what was denied.
fn forbidden_response() -> Response {
    let payload = json!({ "error": "forbidden" });
    (StatusCode::FORBIDDEN, axum::Json(payload)).into_response()
}

fn error_response(status: StatusCode, err: &dyn std::fmt::Display) -> Response {
    let payload = json!({ "error": err.to_string() });
    (status, axum::Json(payload)).into_response()
}
