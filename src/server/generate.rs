//! Generation endpoints
//!
//! Batch endpoints validate `count` up front (400 on a bad count) and
//! then answer 200 even when every item failed; callers read the
//! `errors` array.

use std::sync::Arc;

use axum::{
    extract::{Query, State},
    response::IntoResponse,
    Json,
};
use serde::Deserialize;
use serde_json::json;

use super::{ApiError, ApiJson, ApiState};
use crate::core::generation::{AdventurerRequest, AlienRequest, AnimePromptRequest};
use crate::database::PromptOps;

pub async fn generate_prompts(
    State(state): State<Arc<ApiState>>,
    ApiJson(request): ApiJson<AnimePromptRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let outcome = state.anime.generate_batch(&request).await?;
    Ok(Json(json!({
        "success": true,
        "image_prompts": outcome.items,
        "errors": outcome.errors,
    })))
}

pub async fn generate_adventurer(
    State(state): State<Arc<ApiState>>,
    ApiJson(request): ApiJson<AdventurerRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let adventurer = state.adventurer.generate(&request).await?;
    Ok(Json(json!({
        "success": true,
        "adventurer": adventurer,
    })))
}

#[derive(Debug, Deserialize)]
pub struct GenerateMultipleRequest {
    pub count: i64,
}

pub async fn generate_adventurers(
    State(state): State<Arc<ApiState>>,
    ApiJson(request): ApiJson<GenerateMultipleRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let outcome = state.adventurer.generate_multiple(request.count).await?;
    Ok(Json(json!({
        "success": true,
        "adventurers": outcome.items,
        "errors": outcome.errors,
    })))
}

pub async fn generate_aliens(
    State(state): State<Arc<ApiState>>,
    ApiJson(request): ApiJson<AlienRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let outcome = state.alien.generate_batch(&request).await?;
    Ok(Json(json!({
        "success": true,
        "image_prompts": outcome.items,
        "errors": outcome.errors,
    })))
}

#[derive(Debug, Deserialize)]
pub struct ListPromptsQuery {
    #[serde(default = "default_limit")]
    pub limit: i64,
}

fn default_limit() -> i64 {
    50
}

/// Recent persisted prompts, newest first.
pub async fn list_prompts(
    State(state): State<Arc<ApiState>>,
    Query(query): Query<ListPromptsQuery>,
) -> Result<impl IntoResponse, ApiError> {
    let limit = query.limit.clamp(1, 200);
    let prompts = state.db.list_recent_prompts(limit).await?;

    let prompts: Vec<_> = prompts
        .into_iter()
        .map(|p| {
            json!({
                "id": p.id,
                "title": p.title,
                "description": p.description,
                "negative_prompt": p.negative_prompt,
                "tags": p.tags(),
                "species_id": p.species_id,
                "prompt_type": p.prompt_type,
                "created_at": p.created_at,
            })
        })
        .collect();

    Ok(Json(json!({
        "success": true,
        "prompts": prompts,
    })))
}
