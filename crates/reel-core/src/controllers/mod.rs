use crate::service::MovieService;

/// Shared application state available in all handlers.
#[derive(Clone)]
pub struct AppState {
    pub movies: MovieService,
}

pub mod movies;
