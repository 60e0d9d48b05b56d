//! Request-body validation for movie writes.
//!
//! Both entry points take the raw JSON body and return either normalized,
//! typed data or a [`ValidationFailure`] carrying a client-facing message.
//! They are pure: no I/O, and the same input always yields the same result.
//!
//! - [`validate_create`] requires every movie attribute except `id`.
//! - [`validate_update`] applies the same per-field rules to whichever
//!   fields are present.
//!
//! Normalization trims string fields and each genre, then drops genres that
//! repeat an earlier one ignoring case.

use std::fmt;

use serde::Deserialize;
use serde_json::Value;
use validator::Validate;

use crate::error::FieldError;
use crate::models::{MovieInput, MoviePatch};

/// Why a payload was rejected.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationFailure {
    /// Human-readable summary, e.g. `"duration: is required; year: must be between 1888 and 2100"`.
    pub message: String,
    /// Per-field detail, sorted by field name. Empty for malformed payloads.
    pub fields: Vec<FieldError>,
}

impl ValidationFailure {
    fn from_fields(mut fields: Vec<FieldError>) -> Self {
        fields.sort_by(|a, b| (&a.field, &a.message).cmp(&(&b.field, &b.message)));
        let message = fields
            .iter()
            .map(|f| format!("{}: {}", f.field, f.message))
            .collect::<Vec<_>>()
            .join("; ");
        ValidationFailure { message, fields }
    }

    fn malformed(reason: impl fmt::Display) -> Self {
        ValidationFailure {
            message: format!("Invalid movie payload: {reason}"),
            fields: Vec::new(),
        }
    }
}

impl fmt::Display for ValidationFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.message)
    }
}

impl std::error::Error for ValidationFailure {}

/// Validate a full create payload.
pub fn validate_create(candidate: &Value) -> Result<MovieInput, ValidationFailure> {
    let patch = parse(candidate)?;
    let mut fields = field_errors(&patch);

    let MoviePatch {
        title,
        year,
        director,
        duration,
        poster,
        genres,
        rating,
    } = patch;

    match (title, year, director, duration, poster, genres, rating) {
        (
            Some(title),
            Some(year),
            Some(director),
            Some(duration),
            Some(poster),
            Some(genres),
            Some(rating),
        ) if fields.is_empty() => Ok(MovieInput {
            title,
            year,
            director,
            duration,
            poster,
            genres,
            rating,
        }),
        (title, year, director, duration, poster, genres, rating) => {
            let present = [
                ("title", title.is_some()),
                ("year", year.is_some()),
                ("director", director.is_some()),
                ("duration", duration.is_some()),
                ("poster", poster.is_some()),
                ("genre", genres.is_some()),
                ("rate", rating.is_some()),
            ];
            fields.extend(
                present
                    .iter()
                    .filter(|(_, is_present)| !is_present)
                    .map(|(name, _)| FieldError::with_code(*name, "is required", "required")),
            );
            Err(ValidationFailure::from_fields(fields))
        }
    }
}

/// Validate a partial update payload. Absent fields are not checked.
pub fn validate_update(candidate: &Value) -> Result<MoviePatch, ValidationFailure> {
    let patch = parse(candidate)?;
    let fields = field_errors(&patch);
    if fields.is_empty() {
        Ok(patch)
    } else {
        Err(ValidationFailure::from_fields(fields))
    }
}

/// Decode the body into the all-optional shape and normalize it.
fn parse(candidate: &Value) -> Result<MoviePatch, ValidationFailure> {
    if !candidate.is_object() {
        return Err(ValidationFailure::malformed("expected a JSON object"));
    }
    let mut patch = MoviePatch::deserialize(candidate).map_err(ValidationFailure::malformed)?;
    normalize(&mut patch);
    Ok(patch)
}

fn normalize(patch: &mut MoviePatch) {
    for text in [&mut patch.title, &mut patch.director, &mut patch.poster]
        .into_iter()
        .flatten()
    {
        let trimmed = text.trim();
        if trimmed.len() != text.len() {
            *text = trimmed.to_string();
        }
    }

    if let Some(genres) = patch.genres.take() {
        let mut seen: Vec<String> = Vec::with_capacity(genres.len());
        let mut unique = Vec::with_capacity(genres.len());
        for genre in genres {
            let genre = genre.trim().to_string();
            let key = genre.to_lowercase();
            if !genre.is_empty() && seen.contains(&key) {
                continue;
            }
            seen.push(key);
            unique.push(genre);
        }
        patch.genres = Some(unique);
    }
}

fn field_errors(patch: &MoviePatch) -> Vec<FieldError> {
    let mut fields = Vec::new();
    if let Err(errors) = patch.validate() {
        for (field, errs) in errors.field_errors() {
            let name = wire_name(&field);
            for err in errs.iter() {
                let message = err
                    .message
                    .as_ref()
                    .map(|m| m.to_string())
                    .unwrap_or_else(|| err.code.to_string());
                fields.push(FieldError::with_code(name.clone(), message, err.code.to_string()));
            }
        }
    }
    fields
}

/// JSON key for a struct field name.
fn wire_name(field: &str) -> String {
    match field {
        "genres" => "genre".to_string(),
        "rating" => "rate".to_string(),
        other => other.to_string(),
    }
}
