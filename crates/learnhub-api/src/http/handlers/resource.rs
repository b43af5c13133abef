//! Resource handlers for the REST API (admin view).
//!
//! Mutations that verify a URL return the full outcome as `data`; a failed
//! verification is also surfaced as a `VERIFICATION_FAILED` entry in
//! `errors` while the request itself still succeeds.

use axum::Json;
use axum::extract::{Path, Query, State};
use serde::Deserialize;

use learnhub_core::service::resource::ResourceOutcome;
use learnhub_types::error::ResourceError;
use learnhub_types::resource::{CreateResourceRequest, ResourceId, UpdateResourceRequest};
use learnhub_types::skill::SkillId;

use crate::http::error::AppError;
use crate::http::extractors::query::ResourceListQuery;
use crate::http::handlers::{JsonResponse, to_value};
use crate::http::response::{ApiResponse, RequestClock};
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct RateBody {
    pub score: f64,
}

#[derive(Debug, Deserialize)]
pub struct MoveBody {
    pub skill_id: SkillId,
}

#[derive(Debug, Deserialize)]
pub struct BulkDeleteBody {
    pub ids: Vec<ResourceId>,
}

#[derive(Debug, Deserialize)]
pub struct BulkActiveBody {
    pub ids: Vec<ResourceId>,
    pub active: bool,
}

fn parse_id(raw: &str) -> Result<ResourceId, AppError> {
    raw.parse()
        .map_err(|_| AppError::Resource(ResourceError::NotFound))
}

fn self_link(id: &ResourceId) -> String {
    format!("/api/v1/resources/{id}")
}

fn outcome_response(
    clock: RequestClock,
    outcome: &ResourceOutcome,
) -> Result<ApiResponse<serde_json::Value>, AppError> {
    let resource = &outcome.resource;
    Ok(clock
        .finish(to_value(outcome)?)
        .with_warning("VERIFICATION_FAILED", outcome.warning.as_deref())
        .with_link("self", &self_link(&resource.id))
        .with_link("skill", &format!("/api/v1/skills/{}", resource.skill_id)))
}

/// POST /api/v1/resources - Create a resource; the URL is verified first.
pub async fn create_resource(
    State(state): State<AppState>,
    Json(body): Json<CreateResourceRequest>,
) -> JsonResponse {
    let clock = RequestClock::start();
    let outcome = state.resource_service.create_resource(body).await?;
    Ok(Json(outcome_response(clock, &outcome)?))
}

/// GET /api/v1/resources - List resources, including unverified ones.
pub async fn list_resources(
    State(state): State<AppState>,
    Query(query): Query<ResourceListQuery>,
) -> Result<Json<ApiResponse<Vec<serde_json::Value>>>, AppError> {
    let clock = RequestClock::start();

    let resources = state
        .resource_service
        .list_resources(Some(query.into_filter()?))
        .await?;

    let resources_json = resources
        .iter()
        .map(to_value)
        .collect::<Result<Vec<_>, _>>()?;
    let count = resources_json.len();

    let resp = clock
        .finish(resources_json)
        .with_count(count)
        .with_link("self", "/api/v1/resources");
    Ok(Json(resp))
}

/// GET /api/v1/resources/{id}
pub async fn get_resource(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> JsonResponse {
    let clock = RequestClock::start();

    let resource = state.resource_service.get_resource(&parse_id(&id)?).await?;

    let resp = clock
        .finish(to_value(&resource)?)
        .with_link("self", &self_link(&resource.id))
        .with_link("verify", &format!("{}/verify", self_link(&resource.id)))
        .with_link("skill", &format!("/api/v1/skills/{}", resource.skill_id));
    Ok(Json(resp))
}

/// PUT /api/v1/resources/{id} - Partial update. A new URL is re-verified.
pub async fn update_resource(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(body): Json<UpdateResourceRequest>,
) -> JsonResponse {
    let clock = RequestClock::start();
    let outcome = state
        .resource_service
        .update_resource(&parse_id(&id)?, body)
        .await?;
    Ok(Json(outcome_response(clock, &outcome)?))
}

/// DELETE /api/v1/resources/{id} - Soft delete.
pub async fn delete_resource(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> JsonResponse {
    let clock = RequestClock::start();

    let resource = state
        .resource_service
        .delete_resource(&parse_id(&id)?)
        .await?;

    let resp = clock.finish(serde_json::json!({
        "deleted": true,
        "id": resource.id,
        "skill_id": resource.skill_id,
    }));
    Ok(Json(resp))
}

/// POST /api/v1/resources/{id}/verify - Re-verify and overwrite the flag.
pub async fn verify_resource(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> JsonResponse {
    let clock = RequestClock::start();
    let outcome = state
        .resource_service
        .verify_resource(&parse_id(&id)?)
        .await?;
    Ok(Json(outcome_response(clock, &outcome)?))
}

/// POST /api/v1/resources/{id}/rate - Record a learner rating.
pub async fn rate_resource(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(body): Json<RateBody>,
) -> JsonResponse {
    let clock = RequestClock::start();

    let resource = state
        .resource_service
        .rate_resource(&parse_id(&id)?, body.score)
        .await?;

    let resp = clock
        .finish(to_value(&resource)?)
        .with_link("self", &self_link(&resource.id));
    Ok(Json(resp))
}

/// POST /api/v1/resources/{id}/move - Transfer to another skill.
pub async fn move_resource(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(body): Json<MoveBody>,
) -> JsonResponse {
    let clock = RequestClock::start();

    let resource = state
        .resource_service
        .move_resource(&parse_id(&id)?, &body.skill_id)
        .await?;

    let resp = clock
        .finish(to_value(&resource)?)
        .with_link("self", &self_link(&resource.id))
        .with_link("skill", &format!("/api/v1/skills/{}", resource.skill_id));
    Ok(Json(resp))
}

/// POST /api/v1/resources/bulk/delete
pub async fn bulk_delete(
    State(state): State<AppState>,
    Json(body): Json<BulkDeleteBody>,
) -> JsonResponse {
    let clock = RequestClock::start();
    let outcome = state.resource_service.bulk_delete(&body.ids).await?;
    Ok(Json(clock.finish(to_value(&outcome)?)))
}

/// POST /api/v1/resources/bulk/active
pub async fn bulk_set_active(
    State(state): State<AppState>,
    Json(body): Json<BulkActiveBody>,
) -> JsonResponse {
    let clock = RequestClock::start();
    let outcome = state
        .resource_service
        .bulk_set_active(&body.ids, body.active)
        .await?;
    Ok(Json(clock.finish(to_value(&outcome)?)))
}
