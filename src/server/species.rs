//! Species catalog endpoints

use std::sync::Arc;

use axum::{
    extract::{Query, State},
    response::IntoResponse,
    Json,
};
use serde::{Deserialize, Serialize};
use serde_json::json;

use super::{ApiError, ApiState};
use crate::database::{SpeciesOps, SpeciesRecord};

#[derive(Debug, Default, Deserialize)]
pub struct SpeciesQuery {
    /// Optional generator-type filter ("anime", "alien", "adventurer").
    #[serde(rename = "type")]
    pub species_type: Option<String>,
}

/// Species row with JSON columns decoded for API consumers.
#[derive(Debug, Serialize)]
pub struct SpeciesView {
    pub id: String,
    pub name: String,
    pub species_type: String,
    pub features: Vec<String>,
    pub personality: Vec<String>,
    pub visual_descriptors: Vec<String>,
    pub ears: Option<String>,
    pub tail: Option<String>,
    pub wings: Option<String>,
    pub species_class: Option<String>,
    pub climate: Option<String>,
    pub negative_prompt: Option<String>,
    pub weight: i64,
    pub is_active: bool,
}

impl From<SpeciesRecord> for SpeciesView {
    fn from(record: SpeciesRecord) -> Self {
        Self {
            features: record.features(),
            personality: record.personality(),
            visual_descriptors: record.visual_descriptors(),
            id: record.id,
            name: record.name,
            species_type: record.species_type,
            ears: record.ears,
            tail: record.tail,
            wings: record.wings,
            species_class: record.species_class,
            climate: record.climate,
            negative_prompt: record.negative_prompt,
            weight: record.weight,
            is_active: record.is_active,
        }
    }
}

pub async fn list_species(
    State(state): State<Arc<ApiState>>,
    Query(query): Query<SpeciesQuery>,
) -> Result<impl IntoResponse, ApiError> {
    let records = match query.species_type.as_deref() {
        Some(species_type) => state.db.list_by_type(species_type).await?,
        None => state.db.list_all().await?,
    };

    let species: Vec<SpeciesView> = records.into_iter().map(SpeciesView::from).collect();
    Ok(Json(json!({
        "success": true,
        "species": species,
    })))
}

pub async fn list_species_types(
    State(state): State<Arc<ApiState>>,
) -> Result<impl IntoResponse, ApiError> {
    let types = state.db.all_types().await?;
    Ok(Json(json!({
        "success": true,
        "types": types,
    })))
}
