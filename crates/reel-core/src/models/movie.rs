use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use validator::{Validate, ValidationError};

/// A movie as stored by a backend and returned to clients.
///
/// ```json
/// {
///   "id": "dcdd0fad-a94c-4810-8acc-5f108d3b18c3",
///   "title": "The Shawshank Redemption",
///   "year": 1994,
///   "director": "Frank Darabont",
///   "duration": 142,
///   "poster": "https://example.com/shawshank.jpg",
///   "genre": ["Drama"],
///   "rate": 9.3
/// }
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct Movie {
    /// Backend-minted identifier (UUID v4). Never changes after creation.
    pub id: String,
    pub title: String,
    pub year: i32,
    pub director: String,
    /// Running time in minutes.
    pub duration: u32,
    pub poster: String,
    #[serde(rename = "genre")]
    pub genres: Vec<String>,
    #[serde(rename = "rate")]
    pub rating: f64,
}

impl Movie {
    /// True when any of the movie's genres equals `genre`, ignoring case.
    pub fn has_genre(&self, genre: &str) -> bool {
        let wanted = genre.to_lowercase();
        self.genres.iter().any(|g| g.to_lowercase() == wanted)
    }
}

/// A fully validated create payload: every attribute except the identifier.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct MovieInput {
    pub title: String,
    pub year: i32,
    pub director: String,
    pub duration: u32,
    pub poster: String,
    #[serde(rename = "genre")]
    pub genres: Vec<String>,
    #[serde(rename = "rate")]
    pub rating: f64,
}

impl MovieInput {
    /// Attach a freshly minted identifier.
    pub fn into_movie(self, id: impl Into<String>) -> Movie {
        Movie {
            id: id.into(),
            title: self.title,
            year: self.year,
            director: self.director,
            duration: self.duration,
            poster: self.poster,
            genres: self.genres,
            rating: self.rating,
        }
    }
}

/// A partial update. `None` fields are left untouched by [`MoviePatch::apply_to`].
///
/// The same field rules back both create and update validation; see
/// [`crate::validation`].
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, Validate, ToSchema)]
pub struct MoviePatch {
    #[serde(skip_serializing_if = "Option::is_none")]
    #[validate(length(min = 1, message = "must not be blank"))]
    pub title: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    #[validate(range(min = 1888, max = 2100, message = "must be between 1888 and 2100"))]
    pub year: Option<i32>,

    #[serde(skip_serializing_if = "Option::is_none")]
    #[validate(length(min = 1, message = "must not be blank"))]
    pub director: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    #[validate(range(min = 1, message = "must be a positive number of minutes"))]
    pub duration: Option<u32>,

    #[serde(skip_serializing_if = "Option::is_none")]
    #[validate(url(message = "must be a valid URL"))]
    pub poster: Option<String>,

    #[serde(rename = "genre", skip_serializing_if = "Option::is_none")]
    #[validate(
        length(min = 1, message = "must contain at least one genre"),
        custom(function = "validate_genres")
    )]
    pub genres: Option<Vec<String>>,

    #[serde(rename = "rate", skip_serializing_if = "Option::is_none")]
    #[validate(range(min = 0.0, max = 10.0, message = "must be between 0 and 10"))]
    pub rating: Option<f64>,
}

impl MoviePatch {
    /// Overwrite the provided fields of `movie`; the identifier is never touched.
    pub fn apply_to(self, movie: &mut Movie) {
        if let Some(title) = self.title {
            movie.title = title;
        }
        if let Some(year) = self.year {
            movie.year = year;
        }
        if let Some(director) = self.director {
            movie.director = director;
        }
        if let Some(duration) = self.duration {
            movie.duration = duration;
        }
        if let Some(poster) = self.poster {
            movie.poster = poster;
        }
        if let Some(genres) = self.genres {
            movie.genres = genres;
        }
        if let Some(rating) = self.rating {
            movie.rating = rating;
        }
    }

    /// True when no field is set.
    pub fn is_empty(&self) -> bool {
        self.title.is_none()
            && self.year.is_none()
            && self.director.is_none()
            && self.duration.is_none()
            && self.poster.is_none()
            && self.genres.is_none()
            && self.rating.is_none()
    }
}

impl From<MovieInput> for MoviePatch {
    fn from(input: MovieInput) -> Self {
        MoviePatch {
            title: Some(input.title),
            year: Some(input.year),
            director: Some(input.director),
            duration: Some(input.duration),
            poster: Some(input.poster),
            genres: Some(input.genres),
            rating: Some(input.rating),
        }
    }
}

fn validate_genres(genres: &[String]) -> Result<(), ValidationError> {
    if genres.iter().any(|g| g.trim().is_empty()) {
        let mut err = ValidationError::new("blank_genre");
        err.message = Some("must not contain blank genres".into());
        return Err(err);
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> Movie {
        Movie {
            id: "m-1".to_string(),
            title: "Inception".to_string(),
            year: 2010,
            director: "Christopher Nolan".to_string(),
            duration: 148,
            poster: "https://example.com/inception.jpg".to_string(),
            genres: vec!["Action".to_string(), "Sci-Fi".to_string()],
            rating: 8.8,
        }
    }

    #[test]
    fn test_has_genre_ignores_case() {
        let movie = sample();
        assert!(movie.has_genre("action"));
        assert!(movie.has_genre("SCI-FI"));
        assert!(!movie.has_genre("Drama"));
        assert!(!movie.has_genre("Act"));
    }

    #[test]
    fn test_apply_to_only_overwrites_provided_fields() {
        let mut movie = sample();
        let patch = MoviePatch {
            year: Some(2011),
            rating: Some(9.0),
            ..Default::default()
        };
        patch.apply_to(&mut movie);

        let mut expected = sample();
        expected.year = 2011;
        expected.rating = 9.0;
        assert_eq!(movie, expected);
    }

    #[test]
    fn test_empty_patch_is_noop() {
        let mut movie = sample();
        let patch = MoviePatch::default();
        assert!(patch.is_empty());
        patch.apply_to(&mut movie);
        assert_eq!(movie, sample());
    }

    #[test]
    fn test_wire_names() {
        let json = serde_json::to_value(sample()).unwrap();
        assert_eq!(json["genre"][1], "Sci-Fi");
        assert_eq!(json["rate"], 8.8);
        assert!(json.get("genres").is_none());
        assert!(json.get("rating").is_none());
    }
}
