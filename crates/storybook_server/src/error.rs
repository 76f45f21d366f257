//! Error responses.

use axum::Json;
use axum::extract::rejection::JsonRejection;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde_json::json;
use storybook_error::{
    DatabaseErrorKind, StorybookError, StorybookErrorKind, ValidationError,
};

/// A [`StorybookError`] rendered as `{"error": {"class", "message"}}`.
///
/// Client faults carry the offending field or reason. Server faults carry a
/// generic message; the detail goes to the log.
#[derive(Debug)]
pub struct AppError(pub StorybookError);

impl From<StorybookError> for AppError {
    fn from(err: StorybookError) -> Self {
        Self(err)
    }
}

impl From<JsonRejection> for AppError {
    #[track_caller]
    fn from(rejection: JsonRejection) -> Self {
        Self(ValidationError::new("body", rejection.body_text()).into())
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let class = self.0.class();
        let status =
            StatusCode::from_u16(class.status_code()).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);

        if class.is_client_fault() {
            tracing::info!(%class, error = %self.0, "Request rejected");
        } else {
            tracing::error!(%class, error = %self.0, "Request failed");
        }

        let body = json!({
            "error": {
                "class": class.to_string(),
                "message": public_message(&self.0),
            }
        });
        (status, Json(body)).into_response()
    }
}

fn public_message(err: &StorybookError) -> String {
    match err.root() {
        StorybookErrorKind::Validation(e) => format!("{}: {}", e.path, e.message),
        StorybookErrorKind::PipelineInput(e) => {
            format!("storybook {} is missing {}", e.storybook_id, e.field)
        }
        StorybookErrorKind::Service(e) => e.kind.to_string(),
        StorybookErrorKind::Auth(e) => e.kind.to_string(),
        StorybookErrorKind::Database(e) => match &e.kind {
            DatabaseErrorKind::NotFound(_) | DatabaseErrorKind::Conflict(_) => e.kind.to_string(),
            _ => "internal server error".to_string(),
        },
        StorybookErrorKind::Oracle(_) => "generation provider failed".to_string(),
        _ => "internal server error".to_string(),
    }
}
