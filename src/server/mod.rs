//! REST API Server
//!
//! Serves the generation endpoints and catalog CRUD under `/api/v1` as
//! JSON. All origins are allowed; responses carry a `success` boolean,
//! and batch endpoints report per-item failures in an `errors` array on
//! an ordinary 200.

mod attributes;
mod error;
mod generate;
mod sessions;
mod species;
mod templates;

pub use error::{ApiError, ApiJson};

use std::net::SocketAddr;
use std::sync::Arc;

use axum::{
    extract::State,
    response::IntoResponse,
    routing::{delete, get, post, put},
    Json, Router,
};
use tower_http::cors::{Any, CorsLayer};
use tracing::info;

use crate::core::generation::{
    AdventurerGenerationService, AlienGenerationService, AnimeGenerationService,
};
use crate::database::Database;

/// Shared state for every handler: the database plus the per-type
/// generation services, injected at construction.
pub struct ApiState {
    pub db: Database,
    pub anime: AnimeGenerationService,
    pub alien: AlienGenerationService,
    pub adventurer: AdventurerGenerationService,
}

impl ApiState {
    pub fn new(db: Database) -> Self {
        Self {
            anime: AnimeGenerationService::new(db.clone()),
            alien: AlienGenerationService::new(db.clone()),
            adventurer: AdventurerGenerationService::new(db.clone()),
            db,
        }
    }
}

/// Build the full application router.
pub fn router(state: Arc<ApiState>) -> Router {
    let api = Router::new()
        .route("/health", get(health))
        .route("/prompts/generate", post(generate::generate_prompts))
        .route("/prompts", get(generate::list_prompts))
        .route("/adventurers/generate", post(generate::generate_adventurer))
        .route(
            "/adventurers/generate-multiple",
            post(generate::generate_adventurers),
        )
        .route("/aliens/generate", post(generate::generate_aliens))
        .route("/species", get(species::list_species))
        .route("/species/types", get(species::list_species_types))
        .route(
            "/description-templates",
            get(templates::list_templates).post(templates::create_template),
        )
        .route(
            "/description-templates/generator-types",
            get(templates::generator_type_stats),
        )
        .route(
            "/description-templates/:id",
            get(templates::get_template)
                .put(templates::update_template)
                .delete(templates::delete_template),
        )
        .route("/attributes/categories", get(attributes::list_categories))
        .route(
            "/attributes/:category",
            get(attributes::list_attributes).post(attributes::create_attribute),
        )
        .route(
            "/attributes/:category/:id",
            put(attributes::update_attribute).delete(attributes::delete_attribute),
        )
        .route("/sessions/:session_id", get(sessions::get_session))
        .route("/sessions/:session_id/favorites", post(sessions::add_favorite))
        .route(
            "/sessions/:session_id/favorites/:prompt_id",
            delete(sessions::remove_favorite),
        )
        .route("/sessions/:session_id/history", post(sessions::push_history))
        .route(
            "/sessions/:session_id/preferences",
            put(sessions::merge_preferences),
        );

    Router::new()
        .nest("/api/v1", api)
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any),
        )
        .with_state(state)
}

/// Bind and serve until ctrl-c.
pub async fn run(state: Arc<ApiState>, addr: SocketAddr) -> anyhow::Result<()> {
    let app = router(state);
    let listener = tokio::net::TcpListener::bind(addr).await?;
    info!("API server listening on http://{addr}");

    axum::serve(listener, app)
        .with_graceful_shutdown(async {
            let _ = tokio::signal::ctrl_c().await;
            info!("API server shutting down");
        })
        .await?;
    Ok(())
}

/// Health check endpoint
async fn health(State(_state): State<Arc<ApiState>>) -> impl IntoResponse {
    Json(serde_json::json!({
        "status": "healthy",
        "version": crate::VERSION,
        "timestamp": chrono::Utc::now().to_rfc3339(),
    }))
}
