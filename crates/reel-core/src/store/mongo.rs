use futures::TryStreamExt;
use mongodb::bson::{doc, Document};
use mongodb::options::ReturnDocument;
use mongodb::{Client, Collection};

use super::{new_movie_id, MovieStore, StoreError};
use crate::models::{Movie, MovieInput, MoviePatch};

/// Collection holding one document per movie.
pub const COLLECTION: &str = "movies";

/// MongoDB backend.
///
/// Documents are keyed by our own `id` field (a UUID string); Mongo's `_id`
/// is left to the server and never exposed.
///
/// ```rust,ignore
/// let store = MongoStore::connect("mongodb://localhost:27017", "moviesdb").await?;
/// ```
#[derive(Clone)]
pub struct MongoStore {
    client: Client,
    movies: Collection<Movie>,
}

impl MongoStore {
    /// Connect, ping the server, and bind to the `movies` collection of `database`.
    ///
    /// The ping makes an unreachable server fail at startup instead of on the
    /// first request.
    pub async fn connect(uri: &str, database: &str) -> Result<Self, StoreError> {
        tracing::info!("Connecting to MongoDB database '{}'", database);
        let client = Client::with_uri_str(uri).await?;
        let db = client.database(database);
        db.run_command(doc! { "ping": 1 }).await?;
        tracing::info!("MongoDB connected; using collection '{}'", COLLECTION);

        Ok(MongoStore {
            movies: db.collection::<Movie>(COLLECTION),
            client,
        })
    }
}

/// Case-insensitive whole-value match against any element of `genre`.
fn genre_filter(genre: &str) -> Document {
    let pattern = format!("^{}$", regex::escape(genre));
    doc! { "genre": { "$elemMatch": { "$regex": pattern, "$options": "i" } } }
}

#[async_trait::async_trait]
impl MovieStore for MongoStore {
    fn name(&self) -> &'static str {
        "mongodb"
    }

    async fn get_all(&self, genre: Option<&str>) -> Result<Vec<Movie>, StoreError> {
        let filter = match genre {
            Some(genre) => genre_filter(genre),
            None => doc! {},
        };
        let movies: Vec<Movie> = self.movies.find(filter).await?.try_collect().await?;
        Ok(movies)
    }

    async fn get_by_id(&self, id: &str) -> Result<Option<Movie>, StoreError> {
        Ok(self.movies.find_one(doc! { "id": id }).await?)
    }

    async fn create(&self, input: MovieInput) -> Result<Movie, StoreError> {
        let movie = input.into_movie(new_movie_id());
        self.movies.insert_one(&movie).await?;
        Ok(movie)
    }

    async fn delete(&self, id: &str) -> Result<bool, StoreError> {
        let result = self.movies.delete_one(doc! { "id": id }).await?;
        Ok(result.deleted_count > 0)
    }

    async fn update(&self, id: &str, patch: MoviePatch) -> Result<Option<Movie>, StoreError> {
        if patch.is_empty() {
            return self.get_by_id(id).await;
        }

        let changes = mongodb::bson::to_document(&patch)
            .map_err(|e| StoreError::Corrupt(format!("cannot encode movie patch: {e}")))?;
        let updated = self
            .movies
            .find_one_and_update(doc! { "id": id }, doc! { "$set": changes })
            .return_document(ReturnDocument::After)
            .await?;
        Ok(updated)
    }

    async fn close(&self) -> Result<(), StoreError> {
        self.client.clone().shutdown().await;
        Ok(())
    }
}
