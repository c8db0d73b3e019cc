use axum::{extract::State, Extension, Json};
use std::sync::Arc;

use crate::{
    error::AppResult,
    middleware::request_id::RequestId,
    models::{EnrichedRecommendations, RecommendationRequest},
    routes::AppState,
};

/// Handler for the recommendations endpoint
///
/// A guard refusal is a successful response carrying `error: true`.
pub async fn recommend(
    State(state): State<Arc<AppState>>,
    Extension(request_id): Extension<RequestId>,
    Json(request): Json<RecommendationRequest>,
) -> AppResult<Json<EnrichedRecommendations>> {
    tracing::info!(
        request_id = %request_id,
        has_context = request.user_context.is_some(),
        "Processing recommendation request"
    );

    let response = state.recommendations.recommend(request).await?;

    tracing::info!(
        request_id = %request_id,
        recommendations = response.recommendations.len(),
        refused = response.is_refusal(),
        "Recommendation request completed"
    );

    Ok(Json(response))
}
