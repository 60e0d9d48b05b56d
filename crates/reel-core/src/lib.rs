pub mod app;
pub mod config;
pub mod conformance;
pub mod controllers;
pub mod db;
pub mod error;
pub mod extractors;
pub mod logging;
pub mod models;
pub mod openapi;
pub mod service;
pub mod store;
pub mod testing;
pub mod validation;

pub use app::App;
pub use config::{Config, StoreKind};
pub use error::ApiError;
pub use logging::{init_logging, init_logging_json, init_logging_with_level};
pub use models::{Movie, MovieInput, MoviePatch};
pub use service::{CatalogError, MovieService};
pub use store::{MovieStore, StoreError};
pub use testing::{TestApp, TestClient, TestResponse};
