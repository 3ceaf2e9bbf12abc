//! Attribute catalog admin
//!
//! Categories are fixed by the seed data; writes against a category the
//! catalog does not know are rejected rather than silently creating a
//! new one.

use std::sync::Arc;

use axum::{
    extract::{Path, Query, State},
    response::IntoResponse,
    Json,
};
use serde::Deserialize;
use serde_json::json;

use super::{ApiError, ApiJson, ApiState};
use crate::core::template::GeneratorType;
use crate::database::{AttributeOps, AttributeOptionRecord};

#[derive(Debug, Deserialize)]
pub struct CreateAttributeRequest {
    pub name: String,
    #[serde(default)]
    pub value: Option<String>,
    #[serde(default)]
    pub weight: Option<i64>,
    #[serde(default)]
    pub is_active: Option<bool>,
}

#[derive(Debug, Default, Deserialize)]
pub struct UpdateAttributeRequest {
    pub name: Option<String>,
    pub value: Option<String>,
    pub weight: Option<i64>,
    pub is_active: Option<bool>,
}

async fn ensure_known_category(state: &ApiState, category: &str) -> Result<(), ApiError> {
    let categories = state.db.list_categories().await?;
    if categories.iter().any(|c| c == category) {
        Ok(())
    } else {
        Err(ApiError::NotFound(format!("Unknown category: {category}")))
    }
}

#[derive(Debug, Default, Deserialize)]
pub struct CategoriesQuery {
    /// Restrict to the categories one generator type draws from.
    pub generator_type: Option<String>,
}

pub async fn list_categories(
    State(state): State<Arc<ApiState>>,
    Query(query): Query<CategoriesQuery>,
) -> Result<impl IntoResponse, ApiError> {
    let categories = match query.generator_type.as_deref() {
        Some(generator_type) => {
            let parsed = GeneratorType::parse(generator_type).ok_or_else(|| {
                ApiError::Validation(format!("Unknown generator type '{generator_type}'"))
            })?;
            parsed
                .attribute_categories()
                .iter()
                .map(|c| c.to_string())
                .collect()
        }
        None => state.db.list_categories().await?,
    };
    Ok(Json(json!({
        "success": true,
        "categories": categories,
    })))
}

pub async fn list_attributes(
    State(state): State<Arc<ApiState>>,
    Path(category): Path<String>,
) -> Result<impl IntoResponse, ApiError> {
    ensure_known_category(&state, &category).await?;
    let options = state.db.get_by_category(&category).await?;
    Ok(Json(json!({
        "success": true,
        "category": category,
        "options": options,
    })))
}

pub async fn create_attribute(
    State(state): State<Arc<ApiState>>,
    Path(category): Path<String>,
    ApiJson(request): ApiJson<CreateAttributeRequest>,
) -> Result<impl IntoResponse, ApiError> {
    ensure_known_category(&state, &category).await?;
    if request.name.trim().is_empty() {
        return Err(ApiError::Validation("name must not be empty".to_string()));
    }

    let mut option = AttributeOptionRecord::new(category, request.name);
    option.value = request.value.filter(|v| !v.trim().is_empty());
    if let Some(weight) = request.weight {
        option.weight = weight;
    }
    if let Some(is_active) = request.is_active {
        option.is_active = is_active;
    }

    state.db.create_attribute(&option).await?;
    Ok(Json(json!({
        "success": true,
        "option": option,
    })))
}

pub async fn update_attribute(
    State(state): State<Arc<ApiState>>,
    Path((category, id)): Path<(String, String)>,
    ApiJson(request): ApiJson<UpdateAttributeRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let mut option = state
        .db
        .get_attribute(&id)
        .await?
        .filter(|o| o.category == category)
        .ok_or_else(|| {
            ApiError::NotFound(format!("Attribute not found in {category}: {id}"))
        })?;

    if let Some(name) = request.name {
        if name.trim().is_empty() {
            return Err(ApiError::Validation("name must not be empty".to_string()));
        }
        option.name = name;
    }
    if let Some(value) = request.value {
        option.value = Some(value).filter(|v| !v.trim().is_empty());
    }
    if let Some(weight) = request.weight {
        option.weight = weight;
    }
    if let Some(is_active) = request.is_active {
        option.is_active = is_active;
    }

    state.db.update_attribute(&option).await?;
    Ok(Json(json!({
        "success": true,
        "option": option,
    })))
}

pub async fn delete_attribute(
    State(state): State<Arc<ApiState>>,
    Path((category, id)): Path<(String, String)>,
) -> Result<impl IntoResponse, ApiError> {
    state
        .db
        .get_attribute(&id)
        .await?
        .filter(|o| o.category == category)
        .ok_or_else(|| {
            ApiError::NotFound(format!("Attribute not found in {category}: {id}"))
        })?;

    state.db.delete_attribute(&id).await?;
    Ok(Json(json!({ "success": true })))
}
