use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::get,
    Router,
};
use serde::Deserialize;
use serde_json::Value;
use utoipa::IntoParams;

use crate::error::{ApiError, ErrorEnvelope, MessageResponse};
use crate::extractors::{Json, Query};
use crate::models::{Movie, MovieInput, MoviePatch};

use super::AppState;

/// Body of every 404 for an unknown movie id.
pub const MOVIE_NOT_FOUND: &str = "Movie not found";

#[derive(Debug, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct GenreQuery {
    /// Only movies having this genre (case-insensitive, whole name).
    pub genre: Option<String>,
}

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/movies", get(list_movies).post(create_movie))
        .route(
            "/movies/{id}",
            get(get_movie).delete(delete_movie).patch(update_movie),
        )
}

fn not_found() -> Response {
    (StatusCode::NOT_FOUND, Json(MessageResponse::new(MOVIE_NOT_FOUND))).into_response()
}

/// List movies, optionally filtered by genre.
#[utoipa::path(
    get,
    path = "/movies",
    params(GenreQuery),
    responses(
        (status = 200, description = "Matching movies", body = Vec<Movie>),
        (status = 500, description = "Storage failure", body = ErrorEnvelope)
    ),
    tag = "movies"
)]
pub async fn list_movies(
    State(state): State<AppState>,
    Query(query): Query<GenreQuery>,
) -> Result<Json<Vec<Movie>>, ApiError> {
    let movies = state.movies.list_movies(query.genre.as_deref()).await?;
    Ok(Json(movies))
}

/// Fetch one movie by id.
#[utoipa::path(
    get,
    path = "/movies/{id}",
    params(("id" = String, Path, description = "Movie id")),
    responses(
        (status = 200, description = "The movie", body = Movie),
        (status = 404, description = "No movie with this id", body = MessageResponse),
        (status = 500, description = "Storage failure", body = ErrorEnvelope)
    ),
    tag = "movies"
)]
pub async fn get_movie(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Response, ApiError> {
    Ok(match state.movies.get_movie(&id).await? {
        Some(movie) => Json(movie).into_response(),
        None => not_found(),
    })
}

/// Create a movie. Every field except `id` is required.
#[utoipa::path(
    post,
    path = "/movies",
    request_body = MovieInput,
    responses(
        (status = 201, description = "Movie created", body = Movie),
        (status = 400, description = "Invalid payload", body = ErrorEnvelope),
        (status = 500, description = "Storage failure", body = ErrorEnvelope)
    ),
    tag = "movies"
)]
pub async fn create_movie(
    State(state): State<AppState>,
    Json(body): Json<Value>,
) -> Result<impl IntoResponse, ApiError> {
    let movie = state.movies.create_movie(&body).await?;
    Ok((StatusCode::CREATED, Json(movie)))
}

/// Delete a movie.
#[utoipa::path(
    delete,
    path = "/movies/{id}",
    params(("id" = String, Path, description = "Movie id")),
    responses(
        (status = 200, description = "Movie deleted", body = MessageResponse),
        (status = 404, description = "No movie with this id", body = MessageResponse),
        (status = 500, description = "Storage failure", body = ErrorEnvelope)
    ),
    tag = "movies"
)]
pub async fn delete_movie(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Response, ApiError> {
    Ok(if state.movies.delete_movie(&id).await? {
        Json(MessageResponse::new("Movie deleted")).into_response()
    } else {
        not_found()
    })
}

/// Update some fields of a movie.
#[utoipa::path(
    patch,
    path = "/movies/{id}",
    params(("id" = String, Path, description = "Movie id")),
    request_body = MoviePatch,
    responses(
        (status = 200, description = "Updated movie", body = Movie),
        (status = 400, description = "Invalid payload", body = ErrorEnvelope),
        (status = 404, description = "No movie with this id", body = MessageResponse),
        (status = 500, description = "Storage failure", body = ErrorEnvelope)
    ),
    tag = "movies"
)]
pub async fn update_movie(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(body): Json<Value>,
) -> Result<Response, ApiError> {
    Ok(match state.movies.update_movie(&id, &body).await? {
        Some(movie) => Json(movie).into_response(),
        None => not_found(),
    })
}
