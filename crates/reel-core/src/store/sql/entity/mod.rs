//! sea-orm entities backing [`SqlStore`](super::SqlStore).
//!
//! Genres are normalized into their own table and linked through
//! `movie_genres`, whose `position` column preserves the order genres were
//! given in.

pub mod genre;
pub mod movie;
pub mod movie_genre;
