//! User session endpoints
//!
//! Sessions are created lazily on first touch, so every route accepts
//! an arbitrary `session_id` and never 404s on a fresh one.

use std::sync::Arc;

use axum::{
    extract::{Path, State},
    response::IntoResponse,
    Json,
};
use serde::Deserialize;
use serde_json::json;

use super::{ApiError, ApiJson, ApiState};
use crate::database::{SessionOps, UserSessionRecord};

#[derive(Debug, Deserialize)]
pub struct PromptRef {
    pub prompt_id: String,
}

fn session_body(session: &UserSessionRecord) -> serde_json::Value {
    json!({
        "success": true,
        "session": {
            "session_id": session.session_id,
            "favorites": session.favorites(),
            "history": session.history(),
            "preferences": session.preferences(),
            "created_at": session.created_at,
            "updated_at": session.updated_at,
        },
    })
}

pub async fn get_session(
    State(state): State<Arc<ApiState>>,
    Path(session_id): Path<String>,
) -> Result<impl IntoResponse, ApiError> {
    let session = state.db.get_or_create_session(&session_id).await?;
    Ok(Json(session_body(&session)))
}

pub async fn add_favorite(
    State(state): State<Arc<ApiState>>,
    Path(session_id): Path<String>,
    ApiJson(request): ApiJson<PromptRef>,
) -> Result<impl IntoResponse, ApiError> {
    let session = state.db.add_favorite(&session_id, &request.prompt_id).await?;
    Ok(Json(session_body(&session)))
}

pub async fn remove_favorite(
    State(state): State<Arc<ApiState>>,
    Path((session_id, prompt_id)): Path<(String, String)>,
) -> Result<impl IntoResponse, ApiError> {
    let session = state.db.remove_favorite(&session_id, &prompt_id).await?;
    Ok(Json(session_body(&session)))
}

pub async fn push_history(
    State(state): State<Arc<ApiState>>,
    Path(session_id): Path<String>,
    ApiJson(request): ApiJson<PromptRef>,
) -> Result<impl IntoResponse, ApiError> {
    let session = state.db.push_history(&session_id, &request.prompt_id).await?;
    Ok(Json(session_body(&session)))
}

pub async fn merge_preferences(
    State(state): State<Arc<ApiState>>,
    Path(session_id): Path<String>,
    ApiJson(updates): ApiJson<serde_json::Map<String, serde_json::Value>>,
) -> Result<impl IntoResponse, ApiError> {
    let session = state.db.merge_preferences(&session_id, updates).await?;
    Ok(Json(session_body(&session)))
}
