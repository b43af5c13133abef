//! Application error type mapping to HTTP status codes and envelope format.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde_json::json;

use learnhub_types::error::{ResourceError, SkillError};

/// Application-level error that maps to HTTP responses.
#[derive(Debug)]
pub enum AppError {
    Skill(SkillError),
    Resource(ResourceError),
    /// Validation error raised by the HTTP layer itself (bad query or path).
    Validation(String),
    Internal(String),
}

impl From<SkillError> for AppError {
    fn from(e: SkillError) -> Self {
        AppError::Skill(e)
    }
}

impl From<ResourceError> for AppError {
    fn from(e: ResourceError) -> Self {
        AppError::Resource(e)
    }
}

impl AppError {
    /// Status, machine-readable code and message for the envelope.
    pub fn parts(&self) -> (StatusCode, &'static str, String) {
        match self {
            AppError::Skill(SkillError::NotFound) => (
                StatusCode::NOT_FOUND,
                "SKILL_NOT_FOUND",
                "Skill not found".to_string(),
            ),
            AppError::Skill(SkillError::NameConflict(name)) => (
                StatusCode::CONFLICT,
                "NAME_CONFLICT",
                format!("Skill '{name}' already exists"),
            ),
            AppError::Skill(SkillError::InvalidName(msg)) => {
                (StatusCode::BAD_REQUEST, "VALIDATION_ERROR", msg.clone())
            }
            AppError::Skill(e @ SkillError::HasActiveResources(_)) => {
                (StatusCode::CONFLICT, "HAS_ACTIVE_RESOURCES", e.to_string())
            }
            AppError::Skill(e) => (StatusCode::INTERNAL_SERVER_ERROR, "SKILL_ERROR", e.to_string()),
            AppError::Resource(ResourceError::NotFound) => (
                StatusCode::NOT_FOUND,
                "RESOURCE_NOT_FOUND",
                "Resource not found".to_string(),
            ),
            AppError::Resource(ResourceError::SkillNotFound) => (
                StatusCode::NOT_FOUND,
                "SKILL_NOT_FOUND",
                "Owning skill not found".to_string(),
            ),
            AppError::Resource(ResourceError::InvalidTitle(msg)) => {
                (StatusCode::BAD_REQUEST, "VALIDATION_ERROR", msg.clone())
            }
            AppError::Resource(e @ ResourceError::InvalidRating(_)) => {
                (StatusCode::BAD_REQUEST, "VALIDATION_ERROR", e.to_string())
            }
            AppError::Resource(e) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                "RESOURCE_ERROR",
                e.to_string(),
            ),
            AppError::Validation(msg) => {
                (StatusCode::BAD_REQUEST, "VALIDATION_ERROR", msg.clone())
            }
            AppError::Internal(msg) => {
                (StatusCode::INTERNAL_SERVER_ERROR, "INTERNAL_ERROR", msg.clone())
            }
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, code, message) = self.parts();

        if status.is_server_error() {
            tracing::error!(code, %message, "Request failed");
        }

        let body = json!({
            "data": null,
            "meta": {
                "request_id": uuid::Uuid::now_v7().to_string(),
                "timestamp": chrono::Utc::now().to_rfc3339(),
                "response_time_ms": 0
            },
            "errors": [{
                "code": code,
                "message": message,
            }]
        });

        (
            status,
            [(axum::http::header::CONTENT_TYPE, "application/json")],
            body.to_string(),
        )
            .into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_codes() {
        let (status, code, _) = AppError::from(SkillError::NotFound).parts();
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(code, "SKILL_NOT_FOUND");

        let (status, code, msg) =
            AppError::from(SkillError::NameConflict("Python".to_string())).parts();
        assert_eq!(status, StatusCode::CONFLICT);
        assert_eq!(code, "NAME_CONFLICT");
        assert!(msg.contains("Python"));

        let (status, code, _) = AppError::from(SkillError::HasActiveResources(2)).parts();
        assert_eq!(status, StatusCode::CONFLICT);
        assert_eq!(code, "HAS_ACTIVE_RESOURCES");

        let (status, code, _) = AppError::from(ResourceError::InvalidRating(7.0)).parts();
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(code, "VALIDATION_ERROR");

        let (status, _, _) =
            AppError::from(ResourceError::StorageError("disk".to_string())).parts();
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    }

    #[test]
    fn test_missing_owner_is_not_found() {
        let (status, code, _) = AppError::from(ResourceError::SkillNotFound).parts();
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(code, "SKILL_NOT_FOUND");
    }
}
