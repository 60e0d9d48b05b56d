use std::sync::Arc;

use axum::extract::{DefaultBodyLimit, State};
use axum::http::{header, HeaderValue, Method};
use axum::response::IntoResponse;
use axum::routing::get;
use axum::Router;
use serde::Serialize;
use tokio::net::TcpListener;
use tower_http::cors::{AllowOrigin, CorsLayer};
use tower_http::request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer};
use tower_http::trace::TraceLayer;
use utoipa::OpenApi;
use utoipa_scalar::{Scalar, Servable};

use crate::config::Config;
use crate::controllers::{self, AppState};
use crate::error::ApiError;
use crate::extractors::Json;
use crate::openapi::ApiDoc;
use crate::service::MovieService;
use crate::store::{build_store, MovieStore, StoreError};

const API_DOCS_PATH: &str = "/api-docs";
const OPENAPI_JSON_PATH: &str = "/api-docs/openapi.json";

/// The movie catalog application: configuration plus the service wired to
/// the chosen backend.
pub struct App {
    pub config: Config,
    pub movies: MovieService,
}

impl App {
    /// Load configuration from the environment and open the configured store.
    pub async fn new() -> Result<Self, Box<dyn std::error::Error>> {
        let config = Config::from_env()?;
        Ok(Self::from_config(config).await?)
    }

    /// Open the store selected by `config.store`.
    pub async fn from_config(config: Config) -> Result<Self, StoreError> {
        let store = build_store(&config).await?;
        Ok(Self::with_store(config, store))
    }

    /// Use an already-built store, e.g. a seeded [`FileStore`](crate::store::FileStore) in tests.
    pub fn with_store(config: Config, store: Arc<dyn MovieStore>) -> Self {
        App {
            config,
            movies: MovieService::new(store),
        }
    }

    /// Build the Axum router.
    pub fn router(&self) -> Router {
        let state = AppState {
            movies: self.movies.clone(),
        };

        let mut router = Router::new()
            .route("/", get(welcome))
            .merge(controllers::movies::routes())
            .method_not_allowed_fallback(method_not_allowed)
            .fallback(route_not_found)
            .with_state(state)
            .merge(Scalar::with_url(API_DOCS_PATH, ApiDoc::openapi()))
            .route(
                OPENAPI_JSON_PATH,
                get(|| async { axum::Json(ApiDoc::openapi()) }),
            )
            .layer(DefaultBodyLimit::max(self.config.max_body_size))
            .layer(cors_layer(&self.config.cors_allowed_origins));

        // Request tracing and ids only in development.
        if self.config.is_dev() {
            use tower_http::trace::{DefaultMakeSpan, DefaultOnRequest, DefaultOnResponse};
            use tower_http::LatencyUnit;

            let x_request_id = axum::http::HeaderName::from_static("x-request-id");
            router = router
                .layer(SetRequestIdLayer::new(x_request_id.clone(), MakeRequestUuid))
                .layer(PropagateRequestIdLayer::new(x_request_id))
                .layer(
                    TraceLayer::new_for_http()
                        .make_span_with(DefaultMakeSpan::new().level(tracing::Level::INFO))
                        .on_request(DefaultOnRequest::new().level(tracing::Level::INFO))
                        .on_response(
                            DefaultOnResponse::new()
                                .level(tracing::Level::INFO)
                                .latency_unit(LatencyUnit::Millis),
                        ),
                );
        }

        router
    }

    /// Serve until Ctrl-C, then close the store.
    pub async fn run(self) -> Result<(), Box<dyn std::error::Error>> {
        let addr = self.config.server_addr();
        let router = self.router();
        let listener = TcpListener::bind(&addr).await?;

        tracing::info!(
            "Reel server running on http://{} ({} store, docs at {})",
            addr,
            self.movies.store_name(),
            API_DOCS_PATH
        );

        axum::serve(listener, router)
            .with_graceful_shutdown(shutdown_signal())
            .await?;

        self.movies.shutdown().await?;
        tracing::info!("Reel server stopped");
        Ok(())
    }
}

/// Only listed origins get CORS headers. Requests without an `Origin`
/// header are unaffected.
fn cors_layer(origins: &[String]) -> CorsLayer {
    let allowed: Vec<HeaderValue> = origins
        .iter()
        .filter_map(|origin| match HeaderValue::from_str(origin) {
            Ok(value) => Some(value),
            Err(_) => {
                tracing::warn!("Ignoring invalid CORS origin '{}'", origin);
                None
            }
        })
        .collect();

    CorsLayer::new()
        .allow_origin(AllowOrigin::list(allowed))
        .allow_methods([Method::GET, Method::POST, Method::PATCH, Method::DELETE])
        .allow_headers([header::CONTENT_TYPE])
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("Failed to listen for Ctrl-C: {}", e);
        std::future::pending::<()>().await;
    }
    tracing::info!("Shutting down Reel server...");
}

#[derive(Serialize)]
struct WelcomeMessage {
    message: &'static str,
    docs: &'static str,
    store: &'static str,
}

/// Welcome page at `/`.
async fn welcome(State(state): State<AppState>) -> impl IntoResponse {
    Json(WelcomeMessage {
        message: "Welcome to the Reel movie catalog",
        docs: API_DOCS_PATH,
        store: state.movies.store_name(),
    })
}

async fn route_not_found() -> ApiError {
    ApiError::NotFound("Route not found".to_string())
}

async fn method_not_allowed() -> ApiError {
    ApiError::MethodNotAllowed("Method not allowed".to_string())
}
