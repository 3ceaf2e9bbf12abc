//! API integration tests
//!
//! Drives the full router against an in-memory database with seeded
//! catalog data, exercising the generation endpoints and the CRUD
//! surfaces end to end.

use std::sync::Arc;

use axum::body::Body;
use axum::http::{header, Method, Request, StatusCode};
use axum::Router;
use http_body_util::BodyExt;
use serde_json::{json, Value};
use tower::ServiceExt;

use promptforge::database::{Database, SpeciesOps};
use promptforge::server::{router, ApiState};

async fn test_app() -> (Router, Database) {
    let db = Database::in_memory().await.expect("in-memory database");
    let app = router(Arc::new(ApiState::new(db.clone())));
    (app, db)
}

async fn send(app: &Router, method: Method, uri: &str, body: Option<Value>) -> (StatusCode, Value) {
    let request = match body {
        Some(body) => Request::builder()
            .method(method)
            .uri(uri)
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(body.to_string()))
            .unwrap(),
        None => Request::builder()
            .method(method)
            .uri(uri)
            .body(Body::empty())
            .unwrap(),
    };

    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    let value = serde_json::from_slice(&bytes).unwrap_or(Value::Null);
    (status, value)
}

#[tokio::test]
async fn health_reports_version() {
    let (app, _db) = test_app().await;
    let (status, body) = send(&app, Method::GET, "/api/v1/health", None).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "healthy");
    assert!(body["version"].is_string());
}

#[tokio::test]
async fn prompt_batch_generates_requested_count() {
    let (app, _db) = test_app().await;
    let (status, body) = send(
        &app,
        Method::POST,
        "/api/v1/prompts/generate",
        Some(json!({ "count": 3, "type": "anime" })),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["success"], true);
    assert_eq!(body["image_prompts"].as_array().unwrap().len(), 3);
    assert!(body["errors"].as_array().unwrap().is_empty());

    let first = &body["image_prompts"][0];
    assert!(first["description"].as_str().unwrap().contains("hair"));
    assert!(!first["tags"].as_array().unwrap().is_empty());
}

#[tokio::test]
async fn prompt_batch_rejects_out_of_range_count() {
    let (app, _db) = test_app().await;
    for count in [0, 51] {
        let (status, body) = send(
            &app,
            Method::POST,
            "/api/v1/prompts/generate",
            Some(json!({ "count": count })),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["success"], false);
        assert!(body["error"].as_str().unwrap().contains("between 1 and 50"));
    }
}

#[tokio::test]
async fn malformed_body_gets_the_error_envelope() {
    let (app, _db) = test_app().await;

    // Missing required field.
    let (status, body) = send(
        &app,
        Method::POST,
        "/api/v1/prompts/generate",
        Some(json!({ "type": "anime" })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["success"], false);
    assert!(body["error"].as_str().unwrap().contains("count"));

    // Body that is not JSON at all.
    let request = Request::builder()
        .method(Method::POST)
        .uri("/api/v1/prompts/generate")
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from("not json"))
        .unwrap();
    let response = app.clone().oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    let body: Value = serde_json::from_slice(&bytes).unwrap();
    assert_eq!(body["success"], false);
}

#[tokio::test]
async fn named_species_batch_reports_indexed_failures() {
    let (app, _db) = test_app().await;
    let (status, body) = send(
        &app,
        Method::POST,
        "/api/v1/prompts/generate",
        Some(json!({ "count": 2, "species": "Nonexistent" })),
    )
    .await;

    // Per-item failures ride an ordinary 200 even with zero successes.
    assert_eq!(status, StatusCode::OK);
    assert!(body["image_prompts"].as_array().unwrap().is_empty());
    let errors = body["errors"].as_array().unwrap();
    assert_eq!(errors.len(), 2);
    assert!(errors[0].as_str().unwrap().starts_with("Item 1:"));
    assert!(errors[1].as_str().unwrap().starts_with("Item 2:"));
}

#[tokio::test]
async fn adventurer_single_honors_overrides() {
    let (app, _db) = test_app().await;
    let (status, body) = send(
        &app,
        Method::POST,
        "/api/v1/adventurers/generate",
        Some(json!({ "className": "Warrior", "race": "elf", "experience": "high" })),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    let adventurer = &body["adventurer"];
    let title = adventurer["title"].as_str().unwrap();
    assert!(title.contains("elf"));
    assert!(title.contains("Warrior"));
    assert!(title.starts_with("Legendary"));
}

#[tokio::test]
async fn adventurer_rejects_unknown_experience() {
    let (app, _db) = test_app().await;
    let (status, body) = send(
        &app,
        Method::POST,
        "/api/v1/adventurers/generate",
        Some(json!({ "experience": "epic" })),
    )
    .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["error"].as_str().unwrap().contains("epic"));
}

#[tokio::test]
async fn adventurer_batch_continues_past_failures() {
    let (app, db) = test_app().await;
    // Remove every adventurer class so each item fails.
    for class in db.list_by_type("adventurer").await.unwrap() {
        db.delete_species(&class.id).await.unwrap();
    }

    let (status, body) = send(
        &app,
        Method::POST,
        "/api/v1/adventurers/generate-multiple",
        Some(json!({ "count": 3 })),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert!(body["adventurers"].as_array().unwrap().is_empty());
    assert_eq!(body["errors"].as_array().unwrap().len(), 3);
}

#[tokio::test]
async fn alien_generation_persists_prompts() {
    let (app, _db) = test_app().await;
    let (status, body) = send(
        &app,
        Method::POST,
        "/api/v1/aliens/generate",
        Some(json!({ "count": 2, "gender": "male" })),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["image_prompts"].as_array().unwrap().len(), 2);

    let (status, listing) = send(&app, Method::GET, "/api/v1/prompts", None).await;
    assert_eq!(status, StatusCode::OK);
    let prompts = listing["prompts"].as_array().unwrap();
    assert_eq!(prompts.len(), 2);
    assert_eq!(prompts[0]["prompt_type"], "alien");
}

#[tokio::test]
async fn alien_batch_mixes_successes_and_indexed_failures() {
    let (app, db) = test_app().await;
    // Cap prompt storage at two rows so persistence fails mid-batch.
    sqlx::query(
        "CREATE TRIGGER prompt_storage_full BEFORE INSERT ON generated_prompts \
         WHEN (SELECT COUNT(*) FROM generated_prompts) >= 2 \
         BEGIN SELECT RAISE(ABORT, 'prompt storage full'); END",
    )
    .execute(db.pool())
    .await
    .unwrap();

    let (status, body) = send(
        &app,
        Method::POST,
        "/api/v1/aliens/generate",
        Some(json!({ "count": 4 })),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["success"], true);
    assert_eq!(body["image_prompts"].as_array().unwrap().len(), 2);
    let errors = body["errors"].as_array().unwrap();
    assert_eq!(errors.len(), 2);
    assert!(errors[0].as_str().unwrap().starts_with("Item 3:"));
    assert!(errors[1].as_str().unwrap().starts_with("Item 4:"));
}

#[tokio::test]
async fn species_listing_filters_by_type() {
    let (app, _db) = test_app().await;
    let (status, body) = send(&app, Method::GET, "/api/v1/species?type=alien", None).await;

    assert_eq!(status, StatusCode::OK);
    let species = body["species"].as_array().unwrap();
    assert!(!species.is_empty());
    assert!(species.iter().all(|s| s["species_type"] == "alien"));
    // JSON columns come back decoded, not as raw text.
    assert!(species[0]["features"].is_array());

    let (_, types) = send(&app, Method::GET, "/api/v1/species/types", None).await;
    let types: Vec<&str> = types["types"]
        .as_array()
        .unwrap()
        .iter()
        .map(|t| t.as_str().unwrap())
        .collect();
    assert_eq!(types, vec!["adventurer", "alien", "anime"]);
}

#[tokio::test]
async fn template_create_validates_placeholders() {
    let (app, _db) = test_app().await;
    let (status, body) = send(
        &app,
        Method::POST,
        "/api/v1/description-templates",
        Some(json!({
            "name": "Broken",
            "generator_type": "anime",
            "template": "A {bogus_token} portrait",
        })),
    )
    .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["error"].as_str().unwrap().contains("bogus_token"));
}

#[tokio::test]
async fn new_default_template_takes_over() {
    let (app, _db) = test_app().await;
    let (status, created) = send(
        &app,
        Method::POST,
        "/api/v1/description-templates",
        Some(json!({
            "name": "House style",
            "generator_type": "anime",
            "template": "{species} with {hair_color} hair",
            "is_default": true,
        })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    let id = created["template"]["id"].as_str().unwrap().to_string();

    let (_, listing) = send(
        &app,
        Method::GET,
        "/api/v1/description-templates?generator_type=anime",
        None,
    )
    .await;
    let defaults: Vec<&str> = listing["templates"]
        .as_array()
        .unwrap()
        .iter()
        .filter(|t| t["is_default"] == true)
        .map(|t| t["id"].as_str().unwrap())
        .collect();
    assert_eq!(defaults, vec![id.as_str()]);

    let (_, stats) = send(
        &app,
        Method::GET,
        "/api/v1/description-templates/generator-types",
        None,
    )
    .await;
    let anime = stats["generator_types"]
        .as_array()
        .unwrap()
        .iter()
        .find(|s| s["generator_type"] == "anime")
        .unwrap();
    assert_eq!(anime["has_default"], true);
    assert_eq!(anime["template_count"], 2);
}

#[tokio::test]
async fn template_delete_then_get_is_not_found() {
    let (app, _db) = test_app().await;
    let (_, created) = send(
        &app,
        Method::POST,
        "/api/v1/description-templates",
        Some(json!({
            "name": "Temp",
            "generator_type": "alien",
            "template": "{species} from a {climate} world",
        })),
    )
    .await;
    let id = created["template"]["id"].as_str().unwrap();

    let uri = format!("/api/v1/description-templates/{id}");
    let (status, _) = send(&app, Method::DELETE, &uri, None).await;
    assert_eq!(status, StatusCode::OK);

    let (status, body) = send(&app, Method::GET, &uri, None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["success"], false);
}

#[tokio::test]
async fn attribute_admin_rejects_unknown_category_and_duplicates() {
    let (app, _db) = test_app().await;

    let (status, _) = send(&app, Method::GET, "/api/v1/attributes/nonsense", None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (status, body) = send(
        &app,
        Method::GET,
        "/api/v1/attributes/categories?generator_type=adventurer",
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    let categories = body["categories"].as_array().unwrap();
    assert!(categories.contains(&json!("races")));
    assert!(!categories.contains(&json!("climates")));

    let (status, created) = send(
        &app,
        Method::POST,
        "/api/v1/attributes/hair_colors",
        Some(json!({ "name": "lavender", "weight": 2 })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(created["option"]["category"], "hair_colors");

    let (status, body) = send(
        &app,
        Method::POST,
        "/api/v1/attributes/hair_colors",
        Some(json!({ "name": "lavender" })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["error"].as_str().unwrap().contains("lavender"));
}

#[tokio::test]
async fn attribute_update_and_delete_check_category() {
    let (app, _db) = test_app().await;
    let (_, created) = send(
        &app,
        Method::POST,
        "/api/v1/attributes/poses",
        Some(json!({ "name": "crouching" })),
    )
    .await;
    let id = created["option"]["id"].as_str().unwrap();

    // Wrong category in the path does not reach the row.
    let wrong = format!("/api/v1/attributes/hair_colors/{id}");
    let (status, _) = send(&app, Method::DELETE, &wrong, None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let uri = format!("/api/v1/attributes/poses/{id}");
    let (status, updated) = send(
        &app,
        Method::PUT,
        &uri,
        Some(json!({ "weight": 5, "is_active": false })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(updated["option"]["weight"], 5);
    assert_eq!(updated["option"]["is_active"], false);

    let (status, _) = send(&app, Method::DELETE, &uri, None).await;
    assert_eq!(status, StatusCode::OK);
}

#[tokio::test]
async fn session_flow_tracks_favorites_history_preferences() {
    let (app, _db) = test_app().await;
    let base = "/api/v1/sessions/browser-1";

    let (status, body) = send(&app, Method::GET, base, None).await;
    assert_eq!(status, StatusCode::OK);
    assert!(body["session"]["favorites"].as_array().unwrap().is_empty());

    let favorites = format!("{base}/favorites");
    let (_, body) = send(
        &app,
        Method::POST,
        &favorites,
        Some(json!({ "prompt_id": "p1" })),
    )
    .await;
    assert_eq!(body["session"]["favorites"], json!(["p1"]));

    let (_, body) = send(
        &app,
        Method::POST,
        &format!("{base}/history"),
        Some(json!({ "prompt_id": "p1" })),
    )
    .await;
    assert_eq!(body["session"]["history"][0]["prompt_id"], "p1");

    let (_, body) = send(
        &app,
        Method::PUT,
        &format!("{base}/preferences"),
        Some(json!({ "theme": "dark" })),
    )
    .await;
    assert_eq!(body["session"]["preferences"]["theme"], "dark");

    let (_, body) = send(&app, Method::DELETE, &format!("{favorites}/p1"), None).await;
    assert!(body["session"]["favorites"].as_array().unwrap().is_empty());
}
