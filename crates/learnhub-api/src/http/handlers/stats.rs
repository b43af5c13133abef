//! Dashboard statistics endpoint.
//!
//! GET /api/v1/stats - Aggregate counts for the admin dashboard.

use axum::Json;
use axum::extract::State;
use sqlx::Row;

use crate::http::error::AppError;
use crate::http::handlers::JsonResponse;
use crate::http::response::RequestClock;
use crate::state::AppState;

/// GET /api/v1/stats - Aggregate catalog statistics.
///
/// Uses COUNT/SUM queries directly on the reader pool rather than loading
/// every row through the services.
pub async fn get_stats(State(state): State<AppState>) -> JsonResponse {
    let clock = RequestClock::start();

    let skill_row = sqlx::query(
        r#"SELECT
            COUNT(*) as total_skills,
            COALESCE(SUM(CASE WHEN is_active = 1 THEN 1 ELSE 0 END), 0) as active_skills,
            COALESCE(MAX(popularity_score), 0.0) as top_popularity
        FROM skills"#,
    )
    .fetch_one(&state.db_pool.reader)
    .await
    .map_err(|e| AppError::Internal(format!("Failed to query skill stats: {e}")))?;

    let total_skills: i64 = skill_row.try_get("total_skills").unwrap_or(0);
    let active_skills: i64 = skill_row.try_get("active_skills").unwrap_or(0);
    let top_popularity: f64 = skill_row.try_get("top_popularity").unwrap_or(0.0);

    let resource_row = sqlx::query(
        r#"SELECT
            COUNT(*) as total_resources,
            COALESCE(SUM(CASE WHEN is_active = 1 AND verified = 1 THEN 1 ELSE 0 END), 0) as public_resources,
            COALESCE(SUM(CASE WHEN verified = 0 THEN 1 ELSE 0 END), 0) as unverified_resources,
            COALESCE(SUM(CASE WHEN is_active = 0 THEN 1 ELSE 0 END), 0) as inactive_resources,
            COALESCE(SUM(CASE WHEN is_active = 1 AND verified = 1 AND learning_type = 'free' THEN 1 ELSE 0 END), 0) as free_resources
        FROM resources
        WHERE deleted_at IS NULL"#,
    )
    .fetch_one(&state.db_pool.reader)
    .await
    .map_err(|e| AppError::Internal(format!("Failed to query resource stats: {e}")))?;

    let total_resources: i64 = resource_row.try_get("total_resources").unwrap_or(0);
    let public_resources: i64 = resource_row.try_get("public_resources").unwrap_or(0);
    let unverified_resources: i64 = resource_row.try_get("unverified_resources").unwrap_or(0);
    let inactive_resources: i64 = resource_row.try_get("inactive_resources").unwrap_or(0);
    let free_resources: i64 = resource_row.try_get("free_resources").unwrap_or(0);

    let data = serde_json::json!({
        "total_skills": total_skills,
        "active_skills": active_skills,
        "top_popularity": top_popularity,
        "total_resources": total_resources,
        "public_resources": public_resources,
        "free_resources": free_resources,
        "unverified_resources": unverified_resources,
        "inactive_resources": inactive_resources,
        "deployment_mode": state.config.deployment_mode,
    });

    let resp = clock
        .finish(data)
        .with_link("self", "/api/v1/stats")
        .with_link("skills", "/api/v1/skills")
        .with_link("unverified", "/api/v1/resources?verified=false");

    Ok(Json(resp))
}
