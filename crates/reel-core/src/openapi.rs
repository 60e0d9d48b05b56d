use utoipa::OpenApi;

use crate::error::{ErrorEnvelope, MessageResponse};
use crate::models::{Movie, MovieInput, MoviePatch};

/// OpenAPI document served at `/api-docs/openapi.json`.
#[derive(OpenApi)]
#[openapi(
    info(
        title = "Reel API",
        version = "0.1.0",
        description = "Movie catalog with interchangeable storage backends."
    ),
    paths(
        crate::controllers::movies::list_movies,
        crate::controllers::movies::get_movie,
        crate::controllers::movies::create_movie,
        crate::controllers::movies::delete_movie,
        crate::controllers::movies::update_movie,
    ),
    components(
        schemas(
            Movie,
            MovieInput,
            MoviePatch,
            MessageResponse,
            ErrorEnvelope,
        )
    ),
    tags(
        (name = "movies", description = "Movie catalog endpoints")
    )
)]
pub struct ApiDoc;
