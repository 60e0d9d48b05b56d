use std::collections::HashMap;

use sea_orm::sea_query::{Expr, Func, OnConflict, SimpleExpr};
use sea_orm::{
    ColumnTrait, ConnectionTrait, DatabaseConnection, EntityTrait, QueryFilter,
    QueryOrder, Schema, Set, TransactionTrait,
};

use super::{new_movie_id, MovieStore, StoreError};
use crate::config::Config;
use crate::models::{Movie, MovieInput, MoviePatch};

pub mod entity;

use entity::{genre, movie, movie_genre};

/// Relational backend on top of sea-orm.
///
/// Runs against MySQL in production and SQLite in tests. Movie rows and their
/// genre links are written inside one transaction. Genre rows are shared and
/// created ahead of it. Insertion failures are returned to the caller, never
/// logged and skipped.
#[derive(Clone)]
pub struct SqlStore {
    db: DatabaseConnection,
}

impl SqlStore {
    /// Wrap an existing connection pool.
    pub fn new(db: DatabaseConnection) -> Self {
        SqlStore { db }
    }

    /// Open a pool from `config.database_url`.
    pub async fn connect(config: &Config) -> Result<Self, StoreError> {
        let db = crate::db::connect(config).await?;
        Ok(SqlStore::new(db))
    }

    /// Create the `movie`, `genre` and `movie_genres` tables when missing.
    ///
    /// Tables are derived from the entity definitions. Existing tables are
    /// left as they are; there is no migration history.
    pub async fn ensure_schema(&self) -> Result<(), StoreError> {
        let backend = self.db.get_database_backend();
        let schema = Schema::new(backend);

        let mut movies = schema.create_table_from_entity(movie::Entity);
        let mut genres = schema.create_table_from_entity(genre::Entity);
        let mut links = schema.create_table_from_entity(movie_genre::Entity);

        for stmt in [
            movies.if_not_exists(),
            genres.if_not_exists(),
            links.if_not_exists(),
        ] {
            self.db.execute(backend.build(&*stmt)).await?;
        }
        tracing::debug!("Movie schema ready");
        Ok(())
    }
}

#[async_trait::async_trait]
impl MovieStore for SqlStore {
    fn name(&self) -> &'static str {
        "sql"
    }

    async fn get_all(&self, genre: Option<&str>) -> Result<Vec<Movie>, StoreError> {
        let mut query = movie::Entity::find()
            .order_by_asc(movie::Column::Title)
            .order_by_asc(movie::Column::Id);

        if let Some(genre) = genre {
            let genre_ids: Vec<i32> = genre::Entity::find()
                .filter(lower_name_eq(genre))
                .all(&self.db)
                .await?
                .into_iter()
                .map(|g| g.id)
                .collect();
            if genre_ids.is_empty() {
                return Ok(Vec::new());
            }

            let movie_ids: Vec<String> = movie_genre::Entity::find()
                .filter(movie_genre::Column::GenreId.is_in(genre_ids))
                .all(&self.db)
                .await?
                .into_iter()
                .map(|link| link.movie_id)
                .collect();
            if movie_ids.is_empty() {
                return Ok(Vec::new());
            }
            query = query.filter(movie::Column::Id.is_in(movie_ids));
        }

        let rows = query.all(&self.db).await?;
        attach_genres(&self.db, rows).await
    }

    async fn get_by_id(&self, id: &str) -> Result<Option<Movie>, StoreError> {
        let Some(row) = movie::Entity::find_by_id(id.to_owned()).one(&self.db).await? else {
            return Ok(None);
        };
        Ok(attach_genres(&self.db, vec![row]).await?.into_iter().next())
    }

    async fn create(&self, input: MovieInput) -> Result<Movie, StoreError> {
        let movie = input.into_movie(new_movie_id());
        let genre_ids = resolve_genres(&self.db, &movie.genres).await?;

        let txn = self.db.begin().await?;
        movie::Entity::insert(row_from(&movie))
            .exec_without_returning(&txn)
            .await?;
        link_genres(&txn, &movie.id, &genre_ids).await?;
        txn.commit().await?;

        tracing::debug!("Inserted movie {}", movie.id);
        Ok(movie)
    }

    async fn delete(&self, id: &str) -> Result<bool, StoreError> {
        let txn = self.db.begin().await?;
        movie_genre::Entity::delete_many()
            .filter(movie_genre::Column::MovieId.eq(id))
            .exec(&txn)
            .await?;
        let result = movie::Entity::delete_by_id(id.to_owned()).exec(&txn).await?;
        txn.commit().await?;

        Ok(result.rows_affected > 0)
    }

    async fn update(&self, id: &str, patch: MoviePatch) -> Result<Option<Movie>, StoreError> {
        let genre_ids = match patch.genres.as_deref() {
            Some(names) => Some(resolve_genres(&self.db, names).await?),
            None => None,
        };

        let txn = self.db.begin().await?;
        let Some(row) = movie::Entity::find_by_id(id.to_owned()).one(&txn).await? else {
            return Ok(None);
        };
        let Some(mut movie) = attach_genres(&txn, vec![row]).await?.into_iter().next() else {
            return Ok(None);
        };

        patch.apply_to(&mut movie);

        movie::Entity::update_many()
            .set(row_from(&movie))
            .filter(movie::Column::Id.eq(id))
            .exec(&txn)
            .await?;

        if let Some(genre_ids) = genre_ids {
            movie_genre::Entity::delete_many()
                .filter(movie_genre::Column::MovieId.eq(id))
                .exec(&txn)
                .await?;
            link_genres(&txn, id, &genre_ids).await?;
        }
        txn.commit().await?;

        Ok(Some(movie))
    }

    async fn close(&self) -> Result<(), StoreError> {
        self.db.clone().close().await?;
        Ok(())
    }
}

/// `LOWER(genre.name) = lower(name)`
fn lower_name_eq(name: &str) -> SimpleExpr {
    Expr::expr(Func::lower(Expr::col(genre::Column::Name))).eq(name.to_lowercase())
}

fn row_from(movie: &Movie) -> movie::ActiveModel {
    movie::ActiveModel {
        id: Set(movie.id.clone()),
        title: Set(movie.title.clone()),
        year: Set(movie.year),
        director: Set(movie.director.clone()),
        duration: Set(i64::from(movie.duration)),
        poster: Set(movie.poster.clone()),
        rate: Set(movie.rating),
    }
}

fn movie_from(row: movie::Model, genres: Vec<String>) -> Result<Movie, StoreError> {
    let duration = u32::try_from(row.duration).map_err(|_| {
        StoreError::Corrupt(format!(
            "movie {} has out-of-range duration {}",
            row.id, row.duration
        ))
    })?;

    Ok(Movie {
        id: row.id,
        title: row.title,
        year: row.year,
        director: row.director,
        duration,
        poster: row.poster,
        genres,
        rating: row.rate,
    })
}

/// Load the genre names of `rows` and build domain movies, keeping row order.
async fn attach_genres<C: ConnectionTrait>(
    conn: &C,
    rows: Vec<movie::Model>,
) -> Result<Vec<Movie>, StoreError> {
    if rows.is_empty() {
        return Ok(Vec::new());
    }

    let ids: Vec<String> = rows.iter().map(|row| row.id.clone()).collect();
    let links = movie_genre::Entity::find()
        .filter(movie_genre::Column::MovieId.is_in(ids))
        .order_by_asc(movie_genre::Column::MovieId)
        .order_by_asc(movie_genre::Column::Position)
        .all(conn)
        .await?;

    let genre_ids: Vec<i32> = links.iter().map(|link| link.genre_id).collect();
    let names: HashMap<i32, String> = if genre_ids.is_empty() {
        HashMap::new()
    } else {
        genre::Entity::find()
            .filter(genre::Column::Id.is_in(genre_ids))
            .all(conn)
            .await?
            .into_iter()
            .map(|g| (g.id, g.name))
            .collect()
    };

    let mut by_movie: HashMap<String, Vec<String>> = HashMap::new();
    for link in links {
        let name = names.get(&link.genre_id).cloned().ok_or_else(|| {
            StoreError::Corrupt(format!(
                "movie {} links to missing genre {}",
                link.movie_id, link.genre_id
            ))
        })?;
        by_movie.entry(link.movie_id).or_default().push(name);
    }

    rows.into_iter()
        .map(|row| {
            let genres = by_movie.remove(&row.id).unwrap_or_default();
            movie_from(row, genres)
        })
        .collect()
}

/// Link `genre_ids` to `movie_id`, keeping their order.
async fn link_genres<C: ConnectionTrait>(
    conn: &C,
    movie_id: &str,
    genre_ids: &[i32],
) -> Result<(), StoreError> {
    for (position, genre_id) in genre_ids.iter().enumerate() {
        let link = movie_genre::ActiveModel {
            movie_id: Set(movie_id.to_owned()),
            genre_id: Set(*genre_id),
            position: Set(position as i32),
        };
        movie_genre::Entity::insert(link)
            .exec_without_returning(conn)
            .await?;
    }
    Ok(())
}

/// Ids of the genre rows for `names`, creating the missing ones.
///
/// Call outside the movie transaction: the re-read in
/// [`find_or_create_genre`] must see genres committed by other writers.
async fn resolve_genres<C: ConnectionTrait>(
    conn: &C,
    names: &[String],
) -> Result<Vec<i32>, StoreError> {
    let mut ids = Vec::with_capacity(names.len());
    for name in names {
        ids.push(find_or_create_genre(conn, name).await?);
    }
    Ok(ids)
}

/// Genre names match case-insensitively; the first spelling stored wins.
///
/// The insert ignores a conflict on the unique name, so two writers adding
/// the same new genre both end up reading the one row that landed.
async fn find_or_create_genre<C: ConnectionTrait>(conn: &C, name: &str) -> Result<i32, StoreError> {
    if let Some(existing) = find_genre(conn, name).await? {
        return Ok(existing);
    }

    genre::Entity::insert(genre::ActiveModel {
        name: Set(name.to_owned()),
        ..Default::default()
    })
    .on_conflict(
        OnConflict::column(genre::Column::Name)
            .do_nothing()
            .to_owned(),
    )
    .exec_without_returning(conn)
    .await?;

    find_genre(conn, name)
        .await?
        .ok_or_else(|| StoreError::Corrupt(format!("genre '{}' vanished after insert", name)))
}

async fn find_genre<C: ConnectionTrait>(conn: &C, name: &str) -> Result<Option<i32>, StoreError> {
    let found = genre::Entity::find()
        .filter(lower_name_eq(name))
        .order_by_asc(genre::Column::Id)
        .one(conn)
        .await?;
    Ok(found.map(|g| g.id))
}
