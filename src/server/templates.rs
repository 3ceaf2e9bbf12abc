//! Description-template CRUD
//!
//! Templates are validated against the generator type's placeholder
//! whitelist before any write. Setting `is_default` demotes the previous
//! default of the same type inside the store transaction.

use std::sync::Arc;

use axum::{
    extract::{Path, Query, State},
    response::IntoResponse,
    Json,
};
use serde::Deserialize;
use serde_json::json;

use super::{ApiError, ApiJson, ApiState};
use crate::core::template::{validate_template, GeneratorType};
use crate::database::{DescriptionTemplateRecord, TemplateOps};

#[derive(Debug, Default, Deserialize)]
pub struct TemplateQuery {
    pub generator_type: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct CreateTemplateRequest {
    pub name: String,
    pub generator_type: String,
    pub template: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub is_default: bool,
}

#[derive(Debug, Default, Deserialize)]
pub struct UpdateTemplateRequest {
    pub name: Option<String>,
    pub template: Option<String>,
    pub description: Option<String>,
    pub is_active: Option<bool>,
    pub is_default: Option<bool>,
}

/// Parse and whitelist-check, collapsing problems into one 400 message.
fn check_template(template: &str, generator_type: &str) -> Result<GeneratorType, ApiError> {
    let parsed = GeneratorType::parse(generator_type).ok_or_else(|| {
        ApiError::Validation(format!("Unknown generator type '{generator_type}'"))
    })?;

    let problems = validate_template(template, parsed);
    if !problems.is_empty() {
        return Err(ApiError::Validation(problems.join("; ")));
    }
    Ok(parsed)
}

pub async fn list_templates(
    State(state): State<Arc<ApiState>>,
    Query(query): Query<TemplateQuery>,
) -> Result<impl IntoResponse, ApiError> {
    let templates = state
        .db
        .list_templates(query.generator_type.as_deref())
        .await?;
    Ok(Json(json!({
        "success": true,
        "templates": templates,
    })))
}

pub async fn get_template(
    State(state): State<Arc<ApiState>>,
    Path(id): Path<String>,
) -> Result<impl IntoResponse, ApiError> {
    let template = state
        .db
        .get_template(&id)
        .await?
        .ok_or_else(|| ApiError::NotFound(format!("Template not found: {id}")))?;
    Ok(Json(json!({
        "success": true,
        "template": template,
    })))
}

pub async fn create_template(
    State(state): State<Arc<ApiState>>,
    ApiJson(request): ApiJson<CreateTemplateRequest>,
) -> Result<impl IntoResponse, ApiError> {
    check_template(&request.template, &request.generator_type)?;

    let mut record =
        DescriptionTemplateRecord::new(request.name, request.generator_type, request.template);
    record.description = request.description;
    record.is_default = request.is_default;

    state.db.create_template(&record).await?;
    Ok(Json(json!({
        "success": true,
        "template": record,
    })))
}

pub async fn update_template(
    State(state): State<Arc<ApiState>>,
    Path(id): Path<String>,
    ApiJson(request): ApiJson<UpdateTemplateRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let mut record = state
        .db
        .get_template(&id)
        .await?
        .ok_or_else(|| ApiError::NotFound(format!("Template not found: {id}")))?;

    if let Some(name) = request.name {
        record.name = name;
    }
    if let Some(template) = request.template {
        record.template = template;
    }
    if let Some(description) = request.description {
        record.description = Some(description);
    }
    if let Some(is_active) = request.is_active {
        record.is_active = is_active;
    }
    if let Some(is_default) = request.is_default {
        record.is_default = is_default;
    }
    check_template(&record.template, &record.generator_type)?;
    record.updated_at = chrono::Utc::now().to_rfc3339();

    state.db.update_template(&record).await?;
    Ok(Json(json!({
        "success": true,
        "template": record,
    })))
}

pub async fn delete_template(
    State(state): State<Arc<ApiState>>,
    Path(id): Path<String>,
) -> Result<impl IntoResponse, ApiError> {
    state.db.delete_template(&id).await?;
    Ok(Json(json!({ "success": true })))
}

/// Per-generator-type template counts and default coverage.
pub async fn generator_type_stats(
    State(state): State<Arc<ApiState>>,
) -> Result<impl IntoResponse, ApiError> {
    let stats = state.db.generator_type_stats().await?;
    Ok(Json(json!({
        "success": true,
        "generator_types": stats,
    })))
}
