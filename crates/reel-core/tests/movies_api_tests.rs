use std::sync::Arc;

use reel_core::models::{Movie, MovieInput, MoviePatch};
use reel_core::store::{MovieStore, StoreError};
use reel_core::testing::{sample_movies, TestApp};
use serde_json::json;

fn test_movie() -> serde_json::Value {
    json!({
        "title": "Test Movie",
        "year": 2023,
        "director": "Test Director",
        "duration": 120,
        "poster": "http://example.com/poster.jpg",
        "genre": ["Action"],
        "rate": 5.0
    })
}

// ═══ GET /movies ═══

#[tokio::test]
async fn test_list_returns_all_movies() {
    let app = TestApp::new().await;
    let res = app.client.get(&app.url("/movies")).await;
    assert_eq!(res.status, 200);

    let movies = res.json();
    let movies = movies.as_array().expect("array body");
    assert_eq!(movies.len(), sample_movies().len());
    assert!(movies[0].get("genre").is_some());
    assert!(movies[0].get("rate").is_some());
}

#[tokio::test]
async fn test_list_filters_by_genre_case_insensitively() {
    let app = TestApp::new().await;

    let res = app.client.get(&app.url("/movies?genre=action")).await;
    assert_eq!(res.status, 200);
    let titles: Vec<String> = res
        .json()
        .as_array()
        .unwrap()
        .iter()
        .map(|m| m["title"].as_str().unwrap().to_string())
        .collect();
    assert_eq!(titles, vec!["The Dark Knight", "Inception"]);

    let res = app.client.get(&app.url("/movies?genre=DRAMA")).await;
    assert_eq!(res.json().as_array().unwrap().len(), 2);

    let res = app.client.get(&app.url("/movies?genre=Western")).await;
    assert_eq!(res.status, 200);
    assert_eq!(res.json(), json!([]));
}

#[tokio::test]
async fn test_list_blank_genre_is_unfiltered() {
    let app = TestApp::new().await;
    let res = app.client.get(&app.url("/movies?genre=")).await;
    assert_eq!(res.json().as_array().unwrap().len(), sample_movies().len());
}

// ═══ GET /movies/{id} ═══

#[tokio::test]
async fn test_list_bad_query_string_is_400_envelope() {
    let app = TestApp::new().await;
    let res = app.client.get(&app.url("/movies?genre=action&genre=drama")).await;
    assert_eq!(res.status, 400);

    let body = res.json();
    assert_eq!(body["success"], false);
    assert_eq!(body["statusCode"], 400);
    assert!(
        res.message().starts_with("Invalid query string:"),
        "unexpected message: {}",
        res.body
    );
}

#[tokio::test]
async fn test_get_by_id() {
    let app = TestApp::new().await;
    let expected = &sample_movies()[2];
    let res = app.client.get(&app.url(&format!("/movies/{}", expected.id))).await;
    assert_eq!(res.status, 200);
    assert_eq!(res.json()["title"], "Inception");
    assert_eq!(res.json()["genre"], json!(["Action", "Adventure", "Sci-Fi"]));
}

#[tokio::test]
async fn test_get_unknown_id_is_404() {
    let app = TestApp::new().await;
    let res = app.client.get(&app.url("/movies/invalid-id")).await;
    assert_eq!(res.status, 404);
    assert_eq!(res.json(), json!({ "message": "Movie not found" }));
}

// ═══ POST /movies ═══

#[tokio::test]
async fn test_create_movie() {
    let app = TestApp::new().await;
    let res = app
        .client
        .post(&app.url("/movies"), &test_movie().to_string())
        .await;
    assert_eq!(res.status, 201, "Create failed: {}", res.body);

    let body = res.json();
    assert_eq!(body["title"], "Test Movie");
    let id = body["id"].as_str().expect("minted id");
    assert!(uuid::Uuid::parse_str(id).is_ok());

    let res = app.client.get(&app.url(&format!("/movies/{id}"))).await;
    assert_eq!(res.status, 200);
    assert_eq!(res.json(), body);
}

#[tokio::test]
async fn test_create_incomplete_movie_is_400() {
    let app = TestApp::new().await;
    let res = app
        .client
        .post(&app.url("/movies"), &json!({ "title": "Test Movie" }).to_string())
        .await;
    assert_eq!(res.status, 400);

    let body = res.json();
    assert_eq!(body["success"], false);
    assert_eq!(body["statusCode"], 400);
    assert!(body["message"].as_str().unwrap().contains("duration: is required"));
}

#[tokio::test]
async fn test_create_ignores_client_id() {
    let app = TestApp::new().await;
    let mut movie = test_movie();
    movie["id"] = json!("chosen-by-client");
    let created = app.create_movie(&movie).await;
    assert_ne!(created["id"], "chosen-by-client");
}

#[tokio::test]
async fn test_malformed_json_is_400_envelope() {
    let app = TestApp::new().await;
    let res = app.client.post(&app.url("/movies"), "{not json").await;
    assert_eq!(res.status, 400);
    assert_eq!(res.json()["success"], false);
    assert!(res.message().starts_with("Invalid JSON"));
}

// ═══ PATCH /movies/{id} ═══

#[tokio::test]
async fn test_patch_merges_fields() {
    let app = TestApp::new().await;
    let created = app.create_movie(&test_movie()).await;
    let id = created["id"].as_str().unwrap();

    let res = app
        .client
        .patch(
            &app.url(&format!("/movies/{id}")),
            &json!({ "year": 2024, "genre": ["Drama", "drama", "Thriller"] }).to_string(),
        )
        .await;
    assert_eq!(res.status, 200, "Patch failed: {}", res.body);

    let body = res.json();
    assert_eq!(body["year"], 2024);
    assert_eq!(body["genre"], json!(["Drama", "Thriller"]));
    assert_eq!(body["title"], "Test Movie");
    assert_eq!(body["id"], created["id"]);
}

#[tokio::test]
async fn test_patch_invalid_field_is_400() {
    let app = TestApp::new().await;
    let id = &sample_movies()[0].id;
    let res = app
        .client
        .patch(&app.url(&format!("/movies/{id}")), &json!({ "rate": 11 }).to_string())
        .await;
    assert_eq!(res.status, 400);
    assert_eq!(res.message(), "rate: must be between 0 and 10");
}

#[tokio::test]
async fn test_patch_unknown_id_is_404() {
    let app = TestApp::new().await;
    let res = app
        .client
        .patch(&app.url("/movies/invalid-id"), &json!({ "year": 2000 }).to_string())
        .await;
    assert_eq!(res.status, 404);
    assert_eq!(res.message(), "Movie not found");
}

// ═══ DELETE /movies/{id} ═══

#[tokio::test]
async fn test_delete_then_delete_again() {
    let app = TestApp::new().await;
    let id = &sample_movies()[1].id;
    let url = app.url(&format!("/movies/{id}"));

    let res = app.client.delete(&url).await;
    assert_eq!(res.status, 200);
    assert_eq!(res.json(), json!({ "message": "Movie deleted" }));

    let res = app.client.delete(&url).await;
    assert_eq!(res.status, 404);
    assert_eq!(res.message(), "Movie not found");

    let res = app.client.get(&url).await;
    assert_eq!(res.status, 404);
}

// ═══ Fallback, docs, CORS ═══

#[tokio::test]
async fn test_unknown_route_is_404_envelope() {
    let app = TestApp::new().await;
    let res = app.client.get(&app.url("/actors")).await;
    assert_eq!(res.status, 404);
    assert_eq!(
        res.json(),
        json!({ "success": false, "statusCode": 404, "message": "Route not found" })
    );
}

#[tokio::test]
async fn test_unsupported_method_is_405_envelope() {
    let app = TestApp::new().await;
    let id = sample_movies()[0].id.clone();

    let res = app
        .client
        .put(&app.url(&format!("/movies/{id}")), &test_movie().to_string())
        .await;
    assert_eq!(res.status, 405);
    assert_eq!(
        res.json(),
        json!({ "success": false, "statusCode": 405, "message": "Method not allowed" })
    );

    let res = app.client.delete(&app.url("/movies")).await;
    assert_eq!(res.status, 405);
    assert_eq!(res.json()["statusCode"], 405);
}

#[tokio::test]
async fn test_welcome_endpoint() {
    let app = TestApp::new().await;
    let res = app.client.get(&app.url("/")).await;
    assert_eq!(res.status, 200);
    assert_eq!(res.json()["store"], "file");
}

#[tokio::test]
async fn test_openapi_json_endpoint() {
    let app = TestApp::new().await;
    let res = app.client.get(&app.url("/api-docs/openapi.json")).await;
    assert_eq!(res.status, 200);
    let json = res.json();
    assert!(json.get("openapi").is_some());
    assert!(json["paths"].get("/movies/{id}").is_some());
}

#[tokio::test]
async fn test_cors_allows_configured_origin_only() {
    let app = TestApp::new().await;
    let url = app.url("/movies");

    let res = app.client.get_with_origin(&url, "http://127.0.0.1:5500").await;
    assert_eq!(res.status, 200);
    assert_eq!(
        res.header("access-control-allow-origin"),
        Some("http://127.0.0.1:5500")
    );

    let res = app.client.get_with_origin(&url, "http://evil.example").await;
    assert_eq!(res.header("access-control-allow-origin"), None);

    let res = app.client.get(&url).await;
    assert_eq!(res.status, 200);
}

// ═══ Storage failures ═══

/// A backend whose every call fails, as if the database were down.
struct BrokenStore;

#[async_trait::async_trait]
impl MovieStore for BrokenStore {
    fn name(&self) -> &'static str {
        "broken"
    }

    async fn get_all(&self, _genre: Option<&str>) -> Result<Vec<Movie>, StoreError> {
        Err(StoreError::Unavailable("connection refused by 10.0.0.5".into()))
    }

    async fn get_by_id(&self, _id: &str) -> Result<Option<Movie>, StoreError> {
        Err(StoreError::Unavailable("connection refused by 10.0.0.5".into()))
    }

    async fn create(&self, _input: MovieInput) -> Result<Movie, StoreError> {
        Err(StoreError::Unavailable("connection refused by 10.0.0.5".into()))
    }

    async fn delete(&self, _id: &str) -> Result<bool, StoreError> {
        Err(StoreError::Unavailable("connection refused by 10.0.0.5".into()))
    }

    async fn update(&self, _id: &str, _patch: MoviePatch) -> Result<Option<Movie>, StoreError> {
        Err(StoreError::Unavailable("connection refused by 10.0.0.5".into()))
    }
}

#[tokio::test]
async fn test_storage_failure_is_500_envelope_without_detail() {
    let app = TestApp::with_store(Arc::new(BrokenStore)).await;
    let expected = json!({
        "success": false,
        "statusCode": 500,
        "message": "Something went wrong"
    });

    let responses = [
        app.client.get(&app.url("/movies")).await,
        app.client.get(&app.url("/movies/some-id")).await,
        app.client.post(&app.url("/movies"), &test_movie().to_string()).await,
        app.client.patch(&app.url("/movies/some-id"), r#"{"rate": 7.0}"#).await,
        app.client.delete(&app.url("/movies/some-id")).await,
    ];
    for res in responses {
        assert_eq!(res.status, 500, "body: {}", res.body);
        assert_eq!(res.json(), expected);
        assert!(!res.body.contains("10.0.0.5"));
    }
}

#[tokio::test]
async fn test_validation_runs_before_a_broken_store() {
    let app = TestApp::with_store(Arc::new(BrokenStore)).await;
    let res = app.client.post(&app.url("/movies"), r#"{"title": "Only a title"}"#).await;
    assert_eq!(res.status, 400);
    assert_eq!(res.json()["statusCode"], 400);
}
