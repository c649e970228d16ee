use crate::config::ConfigError;
use crate::telemetry::TelemetryError;
use crate::workflows::enrollment::notifications::NotificationError;
use crate::workflows::enrollment::pipeline::StageError;
use crate::workflows::enrollment::repository::RepositoryError;
use crate::workflows::enrollment::roster::RosterImportError;
use crate::workflows::enrollment::storage::StorageError;
use crate::workflows::enrollment::submissions::service::ReviewError;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde_json::json;
use std::fmt;

#[derive(Debug)]
pub enum AppError {
    Config(ConfigError),
    Telemetry(TelemetryError),
    Io(std::io::Error),
    Server(axum::Error),
    Review(ReviewError),
    Stage(StageError),
    Notification(NotificationError),
    Roster(RosterImportError),
    Storage(StorageError),
    Repository(RepositoryError),
}

impl fmt::Display for AppError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AppError::Config(err) => write!(f, "configuration error: {}", err),
            AppError::Telemetry(err) => write!(f, "telemetry error: {}", err),
            AppError::Io(err) => write!(f, "io error: {}", err),
            AppError::Server(err) => write!(f, "server error: {}", err),
            AppError::Review(err) => write!(f, "review error: {}", err),
            AppError::Stage(err) => write!(f, "stage error: {}", err),
            AppError::Notification(err) => write!(f, "notification error: {}", err),
            AppError::Roster(err) => write!(f, "roster import error: {}", err),
            AppError::Storage(err) => write!(f, "storage error: {}", err),
            AppError::Repository(err) => write!(f, "persistence error: {}", err),
        }
    }
}

impl std::error::Error for AppError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            AppError::Config(err) => Some(err),
            AppError::Telemetry(err) => Some(err),
            AppError::Io(err) => Some(err),
            AppError::Server(err) => Some(err),
            AppError::Review(err) => Some(err),
            AppError::Stage(err) => Some(err),
            AppError::Notification(err) => Some(err),
            AppError::Roster(err) => Some(err),
            AppError::Storage(err) => Some(err),
            AppError::Repository(err) => Some(err),
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = match self {
            AppError::Review(_) | AppError::Stage(_) | AppError::Notification(_) => {
                StatusCode::BAD_REQUEST
            }
            AppError::Roster(_) | AppError::Storage(_) => StatusCode::UNPROCESSABLE_ENTITY,
            AppError::Repository(_) => StatusCode::SERVICE_UNAVAILABLE,
            AppError::Config(_)
            | AppError::Telemetry(_)
            | AppError::Io(_)
            | AppError::Server(_) => StatusCode::INTERNAL_SERVER_ERROR,
        };

        let body = Json(json!({ "error": self.to_string() }));
        (status, body).into_response()
    }
}

impl From<ConfigError> for AppError {
    fn from(value: ConfigError) -> Self {
        Self::Config(value)
    }
}

impl From<TelemetryError> for AppError {
    fn from(value: TelemetryError) -> Self {
        Self::Telemetry(value)
    }
}

impl From<std::io::Error> for AppError {
    fn from(value: std::io::Error) -> Self {
        Self::Io(value)
    }
}

impl From<axum::Error> for AppError {
    fn from(value: axum::Error) -> Self {
        Self::Server(value)
    }
}

impl From<ReviewError> for AppError {
    fn from(value: ReviewError) -> Self {
        Self::Review(value)
    }
}

impl From<StageError> for AppError {
    fn from(value: StageError) -> Self {
        Self::Stage(value)
    }
}

impl From<NotificationError> for AppError {
    fn from(value: NotificationError) -> Self {
        Self::Notification(value)
    }
}

impl From<RosterImportError> for AppError {
    fn from(value: RosterImportError) -> Self {
        Self::Roster(value)
    }
}

impl From<StorageError> for AppError {
    fn from(value: StorageError) -> Self {
        Self::Storage(value)
    }
}

impl From<RepositoryError> for AppError {
    fn from(value: RepositoryError) -> Self {
        Self::Repository(value)
    }
}
