use std::sync::Arc;

use serde_json::Value;
use thiserror::Error;

use crate::models::Movie;
use crate::store::{MovieStore, StoreError};
use crate::validation::{validate_create, validate_update};

/// Errors surfaced by catalog operations.
///
/// "Not found" is not an error here: lookups return `Option` and deletes
/// return `bool`, leaving the HTTP layer to pick the status.
#[derive(Debug, Error)]
pub enum CatalogError {
    /// The payload failed validation. The message is safe to show clients.
    #[error("{0}")]
    InvalidInput(String),

    #[error(transparent)]
    Storage(#[from] StoreError),
}

/// Catalog operations over whichever backend was injected at startup.
///
/// Cheap to clone; every clone shares the same store.
///
/// ```rust,ignore
/// let service = MovieService::new(Arc::new(FileStore::from_movies(vec![])));
/// let created = service.create_movie(&body).await?;
/// ```
#[derive(Clone)]
pub struct MovieService {
    store: Arc<dyn MovieStore>,
}

impl MovieService {
    pub fn new(store: Arc<dyn MovieStore>) -> Self {
        MovieService { store }
    }

    /// Name of the active backend (`file`, `sql` or `mongodb`).
    pub fn store_name(&self) -> &'static str {
        self.store.name()
    }

    /// All movies, or those tagged with `genre` (case-insensitive).
    /// A blank genre means no filter.
    pub async fn list_movies(&self, genre: Option<&str>) -> Result<Vec<Movie>, CatalogError> {
        let genre = genre.map(str::trim).filter(|g| !g.is_empty());
        let movies = self.store.get_all(genre).await?;
        tracing::debug!(
            store = self.store.name(),
            genre = genre.unwrap_or("*"),
            "Listed {} movies",
            movies.len()
        );
        Ok(movies)
    }

    pub async fn get_movie(&self, id: &str) -> Result<Option<Movie>, CatalogError> {
        Ok(self.store.get_by_id(id).await?)
    }

    /// Validate `body` as a full movie and store it under a fresh id.
    pub async fn create_movie(&self, body: &Value) -> Result<Movie, CatalogError> {
        let input = validate_create(body).map_err(|failure| {
            tracing::debug!("Rejected movie create: {}", failure);
            CatalogError::InvalidInput(failure.message)
        })?;

        let movie = self.store.create(input).await?;
        tracing::info!(store = self.store.name(), "Created movie {} ({})", movie.id, movie.title);
        Ok(movie)
    }

    /// Returns `false` when no movie has `id`.
    pub async fn delete_movie(&self, id: &str) -> Result<bool, CatalogError> {
        let deleted = self.store.delete(id).await?;
        if deleted {
            tracing::info!(store = self.store.name(), "Deleted movie {}", id);
        }
        Ok(deleted)
    }

    /// Validate `body` as a partial movie and merge it into movie `id`.
    ///
    /// Validation runs before the lookup, so an invalid body is rejected even
    /// for an unknown id.
    pub async fn update_movie(&self, id: &str, body: &Value) -> Result<Option<Movie>, CatalogError> {
        let patch = validate_update(body).map_err(|failure| {
            tracing::debug!("Rejected movie update for {}: {}", id, failure);
            CatalogError::InvalidInput(failure.message)
        })?;

        let updated = self.store.update(id, patch).await?;
        if updated.is_some() {
            tracing::info!(store = self.store.name(), "Updated movie {}", id);
        }
        Ok(updated)
    }

    /// Release the backend's resources. Called once on shutdown.
    pub async fn shutdown(&self) -> Result<(), CatalogError> {
        tracing::info!("Closing {} store", self.store.name());
        self.store.close().await?;
        Ok(())
    }
}
