use std::path::{Path, PathBuf};

use tokio::sync::RwLock;

use super::{new_movie_id, MovieStore, StoreError};
use crate::models::{Movie, MovieInput, MoviePatch};

/// Movies loaded from a JSON array file and kept in memory.
///
/// Each operation holds the lock for its whole read-modify-write, so a single
/// create/update/delete is atomic. Nothing spans requests: two clients
/// updating the same movie still race, and the last write wins.
///
/// With `persist` enabled every successful mutation rewrites the source file;
/// otherwise changes vanish when the process exits.
///
/// ```rust,ignore
/// let store = FileStore::open("./data/movies.json", false).await?;
/// let dramas = store.get_all(Some("drama")).await?;
/// ```
pub struct FileStore {
    movies: RwLock<Vec<Movie>>,
    path: Option<PathBuf>,
}

impl FileStore {
    /// Load the movie array from `path`.
    pub async fn open(path: impl AsRef<Path>, persist: bool) -> Result<Self, StoreError> {
        let path = path.as_ref();
        let raw = tokio::fs::read(path).await.map_err(|source| StoreError::Io {
            path: path.display().to_string(),
            source,
        })?;
        let movies: Vec<Movie> = serde_json::from_slice(&raw)?;
        tracing::info!("Loaded {} movies from {}", movies.len(), path.display());

        Ok(FileStore {
            movies: RwLock::new(movies),
            path: persist.then(|| path.to_path_buf()),
        })
    }

    /// An in-memory store seeded with `movies`. Never touches the filesystem.
    pub fn from_movies(movies: Vec<Movie>) -> Self {
        FileStore {
            movies: RwLock::new(movies),
            path: None,
        }
    }

    /// Whether mutations are written back to disk.
    pub fn is_persistent(&self) -> bool {
        self.path.is_some()
    }

    /// Rewrite the backing file, if any. Writes a sibling temp file first and
    /// renames it over the original so readers never see a torn array.
    async fn persist(&self, movies: &[Movie]) -> Result<(), StoreError> {
        let Some(path) = &self.path else {
            return Ok(());
        };

        let bytes = serde_json::to_vec_pretty(movies)?;
        let tmp = path.with_extension("json.tmp");
        let io_err = |source: std::io::Error| StoreError::Io {
            path: path.display().to_string(),
            source,
        };
        tokio::fs::write(&tmp, &bytes).await.map_err(io_err)?;
        tokio::fs::rename(&tmp, path).await.map_err(io_err)?;
        tracing::debug!("Persisted {} movies to {}", movies.len(), path.display());
        Ok(())
    }
}

#[async_trait::async_trait]
impl MovieStore for FileStore {
    fn name(&self) -> &'static str {
        "file"
    }

    async fn get_all(&self, genre: Option<&str>) -> Result<Vec<Movie>, StoreError> {
        let movies = self.movies.read().await;
        let found = match genre {
            Some(genre) => movies.iter().filter(|m| m.has_genre(genre)).cloned().collect(),
            None => movies.clone(),
        };
        Ok(found)
    }

    async fn get_by_id(&self, id: &str) -> Result<Option<Movie>, StoreError> {
        let movies = self.movies.read().await;
        Ok(movies.iter().find(|m| m.id == id).cloned())
    }

    async fn create(&self, input: MovieInput) -> Result<Movie, StoreError> {
        let movie = input.into_movie(new_movie_id());

        let mut movies = self.movies.write().await;
        movies.push(movie.clone());
        if let Err(e) = self.persist(&movies).await {
            movies.pop();
            return Err(e);
        }
        Ok(movie)
    }

    async fn delete(&self, id: &str) -> Result<bool, StoreError> {
        let mut movies = self.movies.write().await;
        let Some(index) = movies.iter().position(|m| m.id == id) else {
            return Ok(false);
        };

        let removed = movies.remove(index);
        if let Err(e) = self.persist(&movies).await {
            movies.insert(index, removed);
            return Err(e);
        }
        Ok(true)
    }

    async fn update(&self, id: &str, patch: MoviePatch) -> Result<Option<Movie>, StoreError> {
        let mut movies = self.movies.write().await;
        let Some(index) = movies.iter().position(|m| m.id == id) else {
            return Ok(None);
        };

        let previous = movies[index].clone();
        patch.apply_to(&mut movies[index]);
        let updated = movies[index].clone();
        if let Err(e) = self.persist(&movies).await {
            movies[index] = previous;
            return Err(e);
        }
        Ok(Some(updated))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn input(title: &str, genres: &[&str]) -> MovieInput {
        MovieInput {
            title: title.to_string(),
            year: 1999,
            director: "Someone".to_string(),
            duration: 100,
            poster: "https://example.com/p.jpg".to_string(),
            genres: genres.iter().map(|g| g.to_string()).collect(),
            rating: 7.5,
        }
    }

    #[tokio::test]
    async fn test_open_missing_file_is_io_error() {
        let path = std::env::temp_dir().join(format!("reel-missing-{}.json", uuid::Uuid::new_v4()));
        let err = FileStore::open(&path, false).await.err().unwrap();
        assert!(matches!(err, StoreError::Io { .. }));
    }

    #[tokio::test]
    async fn test_open_rejects_non_array() {
        let path = std::env::temp_dir().join(format!("reel-bad-{}.json", uuid::Uuid::new_v4()));
        tokio::fs::write(&path, br#"{"not":"an array"}"#).await.unwrap();
        let err = FileStore::open(&path, false).await.err().unwrap();
        assert!(matches!(err, StoreError::Json(_)));
        let _ = tokio::fs::remove_file(&path).await;
    }

    #[tokio::test]
    async fn test_persist_writes_mutations_back() {
        let path = std::env::temp_dir().join(format!("reel-persist-{}.json", uuid::Uuid::new_v4()));
        tokio::fs::write(&path, b"[]").await.unwrap();

        let store = FileStore::open(&path, true).await.unwrap();
        assert!(store.is_persistent());
        let created = store.create(input("Heat", &["Crime"])).await.unwrap();

        let reopened = FileStore::open(&path, false).await.unwrap();
        let all = reopened.get_all(None).await.unwrap();
        assert_eq!(all, vec![created.clone()]);

        assert!(store.delete(&created.id).await.unwrap());
        let reopened = FileStore::open(&path, false).await.unwrap();
        assert!(reopened.get_all(None).await.unwrap().is_empty());

        let _ = tokio::fs::remove_file(&path).await;
    }

    #[tokio::test]
    async fn test_without_persist_file_is_untouched() {
        let path = std::env::temp_dir().join(format!("reel-ro-{}.json", uuid::Uuid::new_v4()));
        tokio::fs::write(&path, b"[]").await.unwrap();

        let store = FileStore::open(&path, false).await.unwrap();
        assert!(!store.is_persistent());
        store.create(input("Heat", &["Crime"])).await.unwrap();

        let raw = tokio::fs::read_to_string(&path).await.unwrap();
        assert_eq!(raw, "[]");
        let _ = tokio::fs::remove_file(&path).await;
    }

    /// A persisting store whose target directory does not exist, so every
    /// write to disk fails.
    fn unwritable_store(movies: Vec<Movie>) -> FileStore {
        let dir = std::env::temp_dir().join(format!("reel-gone-{}", uuid::Uuid::new_v4()));
        FileStore {
            movies: RwLock::new(movies),
            path: Some(dir.join("movies.json")),
        }
    }

    #[tokio::test]
    async fn test_failed_persist_rolls_back_create() {
        let heat = input("Heat", &["Crime"]).into_movie("1".to_string());
        let store = unwritable_store(vec![heat.clone()]);

        let err = store.create(input("Alien", &["Horror"])).await.err().unwrap();
        assert!(matches!(err, StoreError::Io { .. }));
        assert_eq!(store.get_all(None).await.unwrap(), vec![heat]);
    }

    #[tokio::test]
    async fn test_failed_persist_rolls_back_update() {
        let heat = input("Heat", &["Crime"]).into_movie("1".to_string());
        let store = unwritable_store(vec![heat.clone()]);

        let patch = MoviePatch {
            title: Some("Heat (Director's Cut)".to_string()),
            genres: Some(vec!["Drama".to_string()]),
            ..Default::default()
        };
        assert!(store.update("1", patch).await.is_err());
        assert_eq!(store.get_by_id("1").await.unwrap(), Some(heat));
        assert!(store.get_all(Some("drama")).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_failed_persist_rolls_back_delete() {
        let heat = input("Heat", &["Crime"]).into_movie("1".to_string());
        let alien = input("Alien", &["Horror"]).into_movie("2".to_string());
        let store = unwritable_store(vec![heat.clone(), alien.clone()]);

        assert!(store.delete("1").await.is_err());
        assert_eq!(store.get_all(None).await.unwrap(), vec![heat, alien]);

        // Unknown ids never reach the disk.
        assert!(!store.delete("missing").await.unwrap());
    }

    #[tokio::test]
    async fn test_get_all_keeps_insertion_order() {
        let store = FileStore::from_movies(Vec::new());
        let a = store.create(input("A", &["Drama"])).await.unwrap();
        let b = store.create(input("B", &["Comedy"])).await.unwrap();
        let c = store.create(input("C", &["drama", "Crime"])).await.unwrap();

        assert_eq!(store.get_all(None).await.unwrap(), vec![a.clone(), b, c.clone()]);
        assert_eq!(store.get_all(Some("DRAMA")).await.unwrap(), vec![a, c]);
    }
}
