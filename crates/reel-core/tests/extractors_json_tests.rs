use std::sync::Arc;

use axum::{
    body::Body,
    extract::FromRequest,
    http::{Request, StatusCode},
};
use http_body_util::BodyExt;
use serde_json::Value;
use tower::ServiceExt;

use reel_core::error::ApiError;
use reel_core::extractors::Json;
use reel_core::store::FileStore;
use reel_core::testing::{sample_movies, test_config};
use reel_core::{App, Config};

#[tokio::test]
async fn test_valid_json_extraction() {
    let req = Request::builder()
        .header("content-type", "application/json")
        .body(Body::from(r#"{"title": "Heat", "year": 1995}"#))
        .unwrap();

    let Json(value) = Json::<Value>::from_request(req, &()).await.unwrap();
    assert_eq!(value["title"], "Heat");
    assert_eq!(value["year"], 1995);
}

#[tokio::test]
async fn test_content_type_is_not_required() {
    let req = Request::builder().body(Body::from("[1, 2]")).unwrap();
    let Json(value) = Json::<Value>::from_request(req, &()).await.unwrap();
    assert_eq!(value, serde_json::json!([1, 2]));
}

#[tokio::test]
async fn test_invalid_json_is_bad_request() {
    let req = Request::builder()
        .header("content-type", "application/json")
        .body(Body::from("{invalid json}"))
        .unwrap();

    let err = Json::<Value>::from_request(req, &()).await.err().unwrap();
    assert!(matches!(err, ApiError::BadRequest(ref m) if m.starts_with("Invalid JSON")));
    assert_eq!(err.status_code(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_empty_body_is_bad_request() {
    let req = Request::builder().body(Body::empty()).unwrap();
    let err = Json::<Value>::from_request(req, &()).await.err().unwrap();
    assert_eq!(err.status_code(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_oversized_body_is_413_envelope() {
    let config = Config {
        max_body_size: 64,
        ..test_config()
    };
    let router = App::with_store(config, Arc::new(FileStore::from_movies(sample_movies()))).router();

    let big = format!(r#"{{"title": "{}"}}"#, "x".repeat(1024));
    let res = router
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/movies")
                .header("content-type", "application/json")
                .body(Body::from(big))
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(res.status(), StatusCode::PAYLOAD_TOO_LARGE);
    let bytes = res.into_body().collect().await.unwrap().to_bytes();
    let body: Value = serde_json::from_slice(&bytes).unwrap();
    assert_eq!(body["success"], false);
    assert_eq!(body["statusCode"], 413);
}
