//! Storage backends for the movie catalog.
//!
//! Every backend implements [`MovieStore`], the one contract the service layer
//! knows about. The concrete backend is picked once at startup by
//! [`build_store`] and injected into [`crate::service::MovieService`] as an
//! `Arc<dyn MovieStore>`:
//!
//! | Backend | Medium | Selected by |
//! |---------|--------|-------------|
//! | [`FileStore`] | JSON array loaded into memory | `MOVIE_STORE=file` |
//! | [`SqlStore`] | MySQL / SQLite through sea-orm | `MOVIE_STORE=sql` |
//! | `MongoStore` | MongoDB collection (feature `mongodb`) | `MOVIE_STORE=mongodb` |
//!
//! Backends never retry. Medium failures surface as [`StoreError`] and travel
//! up to the HTTP boundary untouched.

use std::sync::Arc;

use thiserror::Error;

use crate::config::{Config, StoreKind};
use crate::models::{Movie, MovieInput, MoviePatch};

pub mod file;
#[cfg(feature = "mongodb")]
pub mod mongo;
pub mod sql;

pub use file::FileStore;
#[cfg(feature = "mongodb")]
pub use mongo::MongoStore;
pub use sql::SqlStore;

/// Failure of the underlying storage medium.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("Database error: {0}")]
    Database(#[from] sea_orm::DbErr),

    #[cfg(feature = "mongodb")]
    #[error("MongoDB error: {0}")]
    Mongo(#[from] mongodb::error::Error),

    #[error("I/O error on {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Corrupt record: {0}")]
    Corrupt(String),

    #[error("Backend not available: {0}")]
    Unavailable(String),
}

/// The data-access contract shared by every backend.
///
/// Absence is never an error: a missing id yields `Ok(None)` from
/// [`get_by_id`](Self::get_by_id) and [`update`](Self::update), and
/// `Ok(false)` from [`delete`](Self::delete).
#[async_trait::async_trait]
pub trait MovieStore: Send + Sync {
    /// Short backend label used in logs.
    fn name(&self) -> &'static str;

    /// All movies, or only those having a genre equal to `genre` (case-insensitive).
    async fn get_all(&self, genre: Option<&str>) -> Result<Vec<Movie>, StoreError>;

    /// Exact-id lookup.
    async fn get_by_id(&self, id: &str) -> Result<Option<Movie>, StoreError>;

    /// Persist a new movie under a freshly minted identifier.
    async fn create(&self, input: MovieInput) -> Result<Movie, StoreError>;

    /// Remove a movie. Returns whether a record was removed.
    async fn delete(&self, id: &str) -> Result<bool, StoreError>;

    /// Merge `patch` into an existing movie and return the result.
    async fn update(&self, id: &str, patch: MoviePatch) -> Result<Option<Movie>, StoreError>;

    /// Release connections held by the backend. Called once at shutdown.
    async fn close(&self) -> Result<(), StoreError> {
        Ok(())
    }
}

/// Mint a new movie identifier.
pub(crate) fn new_movie_id() -> String {
    uuid::Uuid::new_v4().to_string()
}

/// Open the backend named by `config.store`.
pub async fn build_store(config: &Config) -> Result<Arc<dyn MovieStore>, StoreError> {
    let store: Arc<dyn MovieStore> = match config.store {
        StoreKind::File => {
            Arc::new(FileStore::open(&config.movies_file, config.movies_file_persist).await?)
        }
        StoreKind::Sql => {
            let store = SqlStore::connect(config).await?;
            store.ensure_schema().await?;
            Arc::new(store)
        }
        StoreKind::Mongo => open_mongo(config).await?,
    };
    tracing::info!("Using {} movie store", store.name());
    Ok(store)
}

#[cfg(feature = "mongodb")]
async fn open_mongo(config: &Config) -> Result<Arc<dyn MovieStore>, StoreError> {
    let store = MongoStore::connect(&config.mongodb_uri, &config.mongodb_database).await?;
    Ok(Arc::new(store))
}

#[cfg(not(feature = "mongodb"))]
async fn open_mongo(_config: &Config) -> Result<Arc<dyn MovieStore>, StoreError> {
    Err(StoreError::Unavailable(
        "MOVIE_STORE=mongodb requires building with the `mongodb` feature".to_string(),
    ))
}
