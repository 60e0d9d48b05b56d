use std::net::SocketAddr;
use std::sync::Arc;

use axum::http::HeaderMap;
use tokio::net::TcpListener;

use crate::config::Config;
use crate::models::Movie;
use crate::service::MovieService;
use crate::store::{FileStore, MovieStore};

/// A test application for integration testing.
///
/// Spins up the real router on an ephemeral port, backed by an in-memory
/// [`FileStore`] seeded with [`sample_movies`] unless a store is supplied.
///
/// ```rust,ignore
/// #[tokio::test]
/// async fn test_get_unknown_movie() {
///     let app = TestApp::new().await;
///     let res = app.client.get(&app.url("/movies/invalid-id")).await;
///     assert_eq!(res.status, 404);
/// }
/// ```
pub struct TestApp {
    pub addr: SocketAddr,
    pub client: TestClient,
    pub movies: MovieService,
    pub config: Config,
}

impl TestApp {
    /// Test app over a seeded in-memory file store.
    pub async fn new() -> Self {
        Self::with_store(Arc::new(FileStore::from_movies(sample_movies()))).await
    }

    /// Test app over any backend.
    pub async fn with_store(store: Arc<dyn MovieStore>) -> Self {
        Self::with_config(test_config(), store).await
    }

    /// Test app with a custom config and backend.
    pub async fn with_config(config: Config, store: Arc<dyn MovieStore>) -> Self {
        let app = crate::App::with_store(config, store);
        let router = app.router();

        let listener = TcpListener::bind("127.0.0.1:0")
            .await
            .expect("Failed to bind test server");
        let addr = listener.local_addr().expect("Failed to get local addr");

        tokio::spawn(async move {
            axum::serve(listener, router).await.unwrap();
        });

        TestApp {
            addr,
            client: TestClient::new(addr),
            movies: app.movies,
            config: app.config,
        }
    }

    /// Absolute URL of `path` on the test server.
    pub fn url(&self, path: &str) -> String {
        format!("{}{}", self.client.base_url(), path)
    }

    /// Create a movie through the API and return the response body.
    pub async fn create_movie(&self, body: &serde_json::Value) -> serde_json::Value {
        let res = self.client.post(&self.url("/movies"), &body.to_string()).await;
        assert_eq!(res.status, 201, "Create failed: {}", res.body);
        res.json()
    }
}

/// Config used by [`TestApp`]: file store, random port, no dev middleware.
pub fn test_config() -> Config {
    Config {
        server_port: 0,
        environment: "test".to_string(),
        ..Config::default()
    }
}

/// Three movies with overlapping genres.
pub fn sample_movies() -> Vec<Movie> {
    let movie = |id: &str, title: &str, year: i32, director: &str, genres: &[&str], rating: f64| Movie {
        id: id.to_string(),
        title: title.to_string(),
        year,
        director: director.to_string(),
        duration: 120,
        poster: format!("https://img.example.com/{id}.jpg"),
        genres: genres.iter().map(|g| g.to_string()).collect(),
        rating,
    };

    vec![
        movie(
            "dcdd0fad-a94c-4810-8acc-5f108d3b18c3",
            "The Shawshank Redemption",
            1994,
            "Frank Darabont",
            &["Drama"],
            9.3,
        ),
        movie(
            "c8a7d63f-3b04-44d3-9d95-8782fd7dcfaf",
            "The Dark Knight",
            2008,
            "Christopher Nolan",
            &["Action", "Crime", "Drama"],
            9.0,
        ),
        movie(
            "5ad1a235-0d9c-410a-b32b-220d91689a08",
            "Inception",
            2010,
            "Christopher Nolan",
            &["Action", "Adventure", "Sci-Fi"],
            8.8,
        ),
    ]
}

/// A simple HTTP test client with helper methods.
#[derive(Clone)]
pub struct TestClient {
    inner: reqwest::Client,
    base_addr: SocketAddr,
}

impl TestClient {
    /// Create a new test client pointing at the given address.
    pub fn new(addr: SocketAddr) -> Self {
        TestClient {
            inner: reqwest::Client::new(),
            base_addr: addr,
        }
    }

    /// Send a GET request.
    pub async fn get(&self, url: &str) -> TestResponse {
        let res = self.inner.get(url).send().await.expect("GET request failed");
        TestResponse::from_response(res).await
    }

    /// Send a GET request with an `Origin` header.
    pub async fn get_with_origin(&self, url: &str, origin: &str) -> TestResponse {
        let res = self
            .inner
            .get(url)
            .header("Origin", origin)
            .send()
            .await
            .expect("GET request failed");
        TestResponse::from_response(res).await
    }

    /// Send a POST request with a JSON body.
    pub async fn post(&self, url: &str, body: &str) -> TestResponse {
        let res = self
            .inner
            .post(url)
            .header("Content-Type", "application/json")
            .body(body.to_string())
            .send()
            .await
            .expect("POST request failed");
        TestResponse::from_response(res).await
    }

    /// Send a PATCH request with a JSON body.
    pub async fn patch(&self, url: &str, body: &str) -> TestResponse {
        let res = self
            .inner
            .patch(url)
            .header("Content-Type", "application/json")
            .body(body.to_string())
            .send()
            .await
            .expect("PATCH request failed");
        TestResponse::from_response(res).await
    }

    /// Send a PUT request with a JSON body.
    pub async fn put(&self, url: &str, body: &str) -> TestResponse {
        let res = self
            .inner
            .put(url)
            .header("Content-Type", "application/json")
            .body(body.to_string())
            .send()
            .await
            .expect("PUT request failed");
        TestResponse::from_response(res).await
    }

    /// Send a DELETE request.
    pub async fn delete(&self, url: &str) -> TestResponse {
        let res = self.inner.delete(url).send().await.expect("DELETE request failed");
        TestResponse::from_response(res).await
    }

    /// Get the base URL.
    pub fn base_url(&self) -> String {
        format!("http://{}", self.base_addr)
    }
}

/// A simplified HTTP response for test assertions.
#[derive(Debug)]
pub struct TestResponse {
    pub status: u16,
    pub body: String,
    pub headers: HeaderMap,
}

impl TestResponse {
    async fn from_response(res: reqwest::Response) -> Self {
        let status = res.status().as_u16();
        let headers = res.headers().clone();
        let body = res.text().await.unwrap_or_default();
        TestResponse {
            status,
            body,
            headers,
        }
    }

    /// Parse the body as JSON.
    pub fn json(&self) -> serde_json::Value {
        serde_json::from_str(&self.body).expect("Failed to parse response as JSON")
    }

    /// The `message` field of the body.
    pub fn message(&self) -> String {
        self.json()["message"].as_str().unwrap_or_default().to_string()
    }

    /// Header value as a string, if present.
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers.get(name).and_then(|v| v.to_str().ok())
    }
}
