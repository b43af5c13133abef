//! Skill handlers for the REST API.
//!
//! `{id}` path segments accept either a skill UUID or its slug.

use axum::Json;
use axum::extract::{Path, Query, State};

use learnhub_types::skill::{CreateSkillRequest, UpdateSkillRequest};

use crate::http::error::AppError;
use crate::http::extractors::query::{ResourceListQuery, SkillListQuery};
use crate::http::handlers::{JsonResponse, to_value};
use crate::http::response::{ApiResponse, RequestClock};
use crate::state::AppState;

/// POST /api/v1/skills - Create a new skill.
pub async fn create_skill(
    State(state): State<AppState>,
    Json(body): Json<CreateSkillRequest>,
) -> JsonResponse {
    let clock = RequestClock::start();

    let skill = state.skill_service.create_skill(body).await?;

    let resp = clock
        .finish(to_value(&skill)?)
        .with_link("self", &format!("/api/v1/skills/{}", skill.slug))
        .with_link(
            "resources",
            &format!("/api/v1/skills/{}/resources", skill.slug),
        );
    Ok(Json(resp))
}

/// GET /api/v1/skills - List skills with filtering and sorting.
pub async fn list_skills(
    State(state): State<AppState>,
    Query(query): Query<SkillListQuery>,
) -> Result<Json<ApiResponse<Vec<serde_json::Value>>>, AppError> {
    let clock = RequestClock::start();

    let skills = state
        .skill_service
        .list_skills(Some(query.into_filter()?))
        .await?;

    let skills_json = skills
        .iter()
        .map(to_value)
        .collect::<Result<Vec<_>, _>>()?;
    let count = skills_json.len();

    let resp = clock
        .finish(skills_json)
        .with_count(count)
        .with_link("self", "/api/v1/skills");
    Ok(Json(resp))
}

/// GET /api/v1/skills/{id} - Get a skill by ID or slug.
pub async fn get_skill(
    State(state): State<AppState>,
    Path(id_or_slug): Path<String>,
) -> JsonResponse {
    let clock = RequestClock::start();

    let skill = state.skill_service.resolve_skill(&id_or_slug).await?;

    let resp = clock
        .finish(to_value(&skill)?)
        .with_link("self", &format!("/api/v1/skills/{}", skill.slug))
        .with_link(
            "resources",
            &format!("/api/v1/skills/{}/resources", skill.slug),
        );
    Ok(Json(resp))
}

/// PUT /api/v1/skills/{id} - Update a skill.
pub async fn update_skill(
    State(state): State<AppState>,
    Path(id_or_slug): Path<String>,
    Json(body): Json<UpdateSkillRequest>,
) -> JsonResponse {
    let clock = RequestClock::start();

    let skill = state.skill_service.resolve_skill(&id_or_slug).await?;
    let updated = state.skill_service.update_skill(&skill.id, body).await?;

    let resp = clock
        .finish(to_value(&updated)?)
        .with_link("self", &format!("/api/v1/skills/{}", updated.slug));
    Ok(Json(resp))
}

/// DELETE /api/v1/skills/{id} - Soft-delete a skill.
pub async fn delete_skill(
    State(state): State<AppState>,
    Path(id_or_slug): Path<String>,
) -> JsonResponse {
    let clock = RequestClock::start();

    let skill = state.skill_service.resolve_skill(&id_or_slug).await?;
    let deleted = state.skill_service.delete_skill(&skill.id).await?;

    let resp = clock.finish(serde_json::json!({
        "deleted": true,
        "id": deleted.id,
        "slug": deleted.slug,
    }));
    Ok(Json(resp))
}

/// POST /api/v1/skills/{id}/refresh - Recompute a skill's statistics.
pub async fn refresh_skill(
    State(state): State<AppState>,
    Path(id_or_slug): Path<String>,
) -> JsonResponse {
    let clock = RequestClock::start();

    let skill = state.skill_service.resolve_skill(&id_or_slug).await?;
    let statistics = state
        .resource_service
        .stats()
        .refresh_statistics(&skill.id)
        .await?;

    let resp = clock
        .finish(to_value(&statistics)?)
        .with_link("skill", &format!("/api/v1/skills/{}", skill.slug));
    Ok(Json(resp))
}

/// GET /api/v1/skills/{id}/resources - Learner-facing resource listing.
///
/// Only active, verified, non-deleted resources are returned regardless of
/// the flag parameters supplied.
pub async fn list_public_resources(
    State(state): State<AppState>,
    Path(id_or_slug): Path<String>,
    Query(query): Query<ResourceListQuery>,
) -> Result<Json<ApiResponse<Vec<serde_json::Value>>>, AppError> {
    let clock = RequestClock::start();

    let skill = state.skill_service.resolve_skill(&id_or_slug).await?;
    if !skill.is_active {
        return Err(AppError::Skill(learnhub_types::error::SkillError::NotFound));
    }

    let mut filter = query.into_public_filter()?;
    filter.skill_id = Some(skill.id.clone());
    let resources = state.resource_service.list_resources(Some(filter)).await?;

    let resources_json = resources
        .iter()
        .map(to_value)
        .collect::<Result<Vec<_>, _>>()?;
    let count = resources_json.len();

    let resp = clock
        .finish(resources_json)
        .with_count(count)
        .with_link("self", &format!("/api/v1/skills/{}/resources", skill.slug))
        .with_link("skill", &format!("/api/v1/skills/{}", skill.slug));
    Ok(Json(resp))
}
