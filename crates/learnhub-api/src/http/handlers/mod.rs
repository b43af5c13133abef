//! HTTP request handlers for the REST API.

pub mod resource;
pub mod skill;
pub mod stats;
pub mod verify;

use axum::Json;

use crate::http::error::AppError;
use crate::http::response::ApiResponse;

pub(crate) type JsonResponse = Result<Json<ApiResponse<serde_json::Value>>, AppError>;

pub(crate) fn to_value<T: serde::Serialize>(value: &T) -> Result<serde_json::Value, AppError> {
    serde_json::to_value(value).map_err(|e| AppError::Internal(e.to_string()))
}
