//! URL trust endpoints.

use axum::Json;
use axum::extract::{Query, State};
use serde::Deserialize;

use crate::http::error::AppError;
use crate::http::extractors::query::ResourceListQuery;
use crate::http::handlers::{JsonResponse, to_value};
use crate::http::response::RequestClock;
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct VerifyUrlBody {
    pub url: String,
}

/// POST /api/v1/verify-url - Check a URL without touching the catalog.
///
/// Reports the allow-list verdict alongside a live probe; the probe runs
/// even for trusted platforms so admins can see real reachability.
pub async fn verify_url(
    State(state): State<AppState>,
    Json(body): Json<VerifyUrlBody>,
) -> JsonResponse {
    let clock = RequestClock::start();

    let verifier = state.resource_service.verifier();
    let known = verifier.is_known_authentic_platform(&body.url);
    let check = verifier.verify_url(&body.url).await;

    let resp = clock.finish(serde_json::json!({
        "url": body.url,
        "known_platform": known,
        "check": check,
    }));
    Ok(Json(resp))
}

/// POST /api/v1/verify-all - Re-verify every matching resource.
///
/// Accepts the resource list query parameters to narrow the sweep.
pub async fn verify_all(
    State(state): State<AppState>,
    Query(query): Query<ResourceListQuery>,
) -> JsonResponse {
    let clock = RequestClock::start();

    let filter = query.into_filter()?;
    let report = state
        .resource_service
        .reverify_all(Some(filter))
        .await
        .map_err(AppError::from)?;

    Ok(Json(
        clock
            .finish(to_value(&report)?)
            .with_link("resources", "/api/v1/resources?verified=false"),
    ))
}
