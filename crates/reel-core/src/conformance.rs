//! Conformance suite for [`MovieStore`] implementations.
//!
//! Every backend runs the same checks so that swapping `MOVIE_STORE` never
//! changes observable catalog behavior. The checks tolerate records already
//! present in the store: genre names are made unique per call and counts are
//! taken relative to the starting state.
//!
//! ```rust,ignore
//! #[tokio::test]
//! async fn file_store_conformance() {
//!     conformance::run_all(Arc::new(FileStore::from_movies(vec![]))).await;
//! }
//! ```
//!
//! | Category | Contract aspect |
//! |----------|-----------------|
//! | Lookup | `get_by_id` / `delete` / `update` on unknown ids are sentinels, not errors |
//! | Create | minted ids, round-trip through `get_by_id` |
//! | Filter | case-insensitive whole-name genre match |
//! | Update | merge semantics, genre replacement |
//! | Delete | second delete reports not-found |
//! | Concurrent | parallel creates all land |

use std::collections::HashSet;
use std::sync::Arc;

use crate::models::{Movie, MovieInput, MoviePatch};
use crate::store::MovieStore;

/// A valid create payload with the given title and genres.
pub fn movie_input(title: &str, genres: &[&str]) -> MovieInput {
    MovieInput {
        title: title.to_string(),
        year: 1999,
        director: "Lana Wachowski".to_string(),
        duration: 136,
        poster: "https://img.example.com/matrix.jpg".to_string(),
        genres: genres.iter().map(|g| g.to_string()).collect(),
        rating: 8.7,
    }
}

fn unique_tag(prefix: &str) -> String {
    let id = uuid::Uuid::new_v4().simple().to_string();
    format!("{}{}", prefix, &id[..8])
}

fn ids(movies: &[Movie]) -> HashSet<String> {
    movies.iter().map(|m| m.id.clone()).collect()
}

// ============================================================================
// Lookup
// ============================================================================

/// Unknown ids yield `None` / `false`, never an error.
pub async fn unknown_id_is_not_found<S: MovieStore + ?Sized>(store: &S) {
    let id = "00000000-0000-4000-8000-000000000000";
    assert_eq!(store.get_by_id(id).await.expect("get_by_id"), None);
    assert!(!store.delete(id).await.expect("delete"));

    let patch = MoviePatch {
        title: Some("Ghost".to_string()),
        ..Default::default()
    };
    assert_eq!(store.update(id, patch).await.expect("update"), None);
}

// ============================================================================
// Create
// ============================================================================

/// `create` then `get_by_id` returns the input plus the minted id.
pub async fn create_then_get_round_trips<S: MovieStore + ?Sized>(store: &S) {
    let input = movie_input("The Matrix", &["Action", "Sci-Fi"]);
    let created = store.create(input.clone()).await.expect("create");

    assert!(
        uuid::Uuid::parse_str(&created.id).is_ok(),
        "minted id should be a UUID: {}",
        created.id
    );
    assert_eq!(created, input.clone().into_movie(created.id.clone()));

    let fetched = store.get_by_id(&created.id).await.expect("get_by_id");
    assert_eq!(fetched, Some(input.into_movie(created.id.clone())));
}

/// Two creates with identical payloads get distinct ids.
pub async fn create_mints_distinct_ids<S: MovieStore + ?Sized>(store: &S) {
    let a = store.create(movie_input("Twin", &["Drama"])).await.expect("create a");
    let b = store.create(movie_input("Twin", &["Drama"])).await.expect("create b");
    assert_ne!(a.id, b.id);
}

// ============================================================================
// Filter
// ============================================================================

/// `get_all(None)` includes every created movie.
pub async fn get_all_returns_every_movie<S: MovieStore + ?Sized>(store: &S) {
    let before = store.get_all(None).await.expect("get_all").len();
    let a = store.create(movie_input("Alpha", &["Drama"])).await.expect("create");
    let b = store.create(movie_input("Beta", &["Comedy"])).await.expect("create");

    let all = store.get_all(None).await.expect("get_all");
    assert_eq!(all.len(), before + 2);
    let all_ids = ids(&all);
    assert!(all_ids.contains(&a.id) && all_ids.contains(&b.id));
}

/// Genre filtering ignores case and matches any of a movie's genres.
pub async fn get_all_filters_by_genre_ignoring_case<S: MovieStore + ?Sized>(store: &S) {
    let genre = unique_tag("Noir");
    let other = unique_tag("Western");

    let first = store
        .create(movie_input("Chinatown", &["Crime", genre.as_str()]))
        .await
        .expect("create");
    let second = store
        .create(movie_input("Double Indemnity", &[genre.to_uppercase().as_str()]))
        .await
        .expect("create");
    let _unrelated = store
        .create(movie_input("Unforgiven", &[other.as_str()]))
        .await
        .expect("create");

    for query in [genre.clone(), genre.to_lowercase(), genre.to_uppercase()] {
        let found = store.get_all(Some(query.as_str())).await.expect("get_all");
        assert_eq!(
            ids(&found),
            HashSet::from([first.id.clone(), second.id.clone()]),
            "filter {query:?}"
        );
        assert!(found.iter().all(|m| m.has_genre(&genre)));
    }
}

/// A genre is matched as a whole name, not as a substring.
pub async fn get_all_genre_is_not_a_substring_match<S: MovieStore + ?Sized>(store: &S) {
    let genre = unique_tag("Space");
    store
        .create(movie_input("Alien", &[format!("{genre} Horror").as_str()]))
        .await
        .expect("create");

    let found = store.get_all(Some(genre.as_str())).await.expect("get_all");
    assert!(found.is_empty(), "substring should not match: {found:?}");
}

/// An unknown genre yields an empty list.
pub async fn get_all_unknown_genre_is_empty<S: MovieStore + ?Sized>(store: &S) {
    let found = store
        .get_all(Some(unique_tag("Nonexistent").as_str()))
        .await
        .expect("get_all");
    assert!(found.is_empty());
}

// ============================================================================
// Update
// ============================================================================

/// `update` overwrites exactly the provided fields.
pub async fn update_merges_provided_fields<S: MovieStore + ?Sized>(store: &S) {
    let created = store
        .create(movie_input("Heat", &["Crime", "Drama"]))
        .await
        .expect("create");

    let patch = MoviePatch {
        year: Some(1995),
        rating: Some(8.3),
        ..Default::default()
    };
    let updated = store
        .update(&created.id, patch)
        .await
        .expect("update")
        .expect("movie exists");

    let mut expected = created.clone();
    expected.year = 1995;
    expected.rating = 8.3;
    assert_eq!(updated, expected);
    assert_eq!(store.get_by_id(&created.id).await.expect("get"), Some(expected));
}

/// Provided genres replace the old list, in the given order.
pub async fn update_replaces_genres<S: MovieStore + ?Sized>(store: &S) {
    let old = unique_tag("Old");
    let created = store
        .create(movie_input("Solaris", &[old.as_str(), "Drama"]))
        .await
        .expect("create");

    let patch = MoviePatch {
        genres: Some(vec!["Sci-Fi".to_string(), "Mystery".to_string()]),
        ..Default::default()
    };
    let updated = store
        .update(&created.id, patch)
        .await
        .expect("update")
        .expect("movie exists");
    assert_eq!(updated.genres, vec!["Sci-Fi".to_string(), "Mystery".to_string()]);

    let fetched = store.get_by_id(&created.id).await.expect("get").expect("exists");
    assert_eq!(fetched.genres, updated.genres);
    assert!(store.get_all(Some(old.as_str())).await.expect("get_all").is_empty());
}

/// An empty patch leaves the record unchanged and still reports it found.
pub async fn empty_update_returns_unchanged<S: MovieStore + ?Sized>(store: &S) {
    let created = store.create(movie_input("Stalker", &["Drama"])).await.expect("create");
    let updated = store
        .update(&created.id, MoviePatch::default())
        .await
        .expect("update");
    assert_eq!(updated, Some(created));
}

// ============================================================================
// Delete
// ============================================================================

/// First delete removes, second reports not-found.
pub async fn delete_twice_reports_not_found<S: MovieStore + ?Sized>(store: &S) {
    let created = store.create(movie_input("Ran", &["Drama"])).await.expect("create");

    assert!(store.delete(&created.id).await.expect("first delete"));
    assert!(!store.delete(&created.id).await.expect("second delete"));
    assert_eq!(store.get_by_id(&created.id).await.expect("get"), None);
    assert!(!ids(&store.get_all(None).await.expect("get_all")).contains(&created.id));
}

// ============================================================================
// Concurrent
// ============================================================================

/// Parallel creates all succeed with distinct ids.
pub async fn concurrent_creates_all_land(store: Arc<dyn MovieStore>) {
    let genre = unique_tag("Parallel");
    let mut handles = Vec::new();
    for i in 0..8 {
        let store = Arc::clone(&store);
        let genre = genre.clone();
        handles.push(tokio::spawn(async move {
            store
                .create(movie_input(&format!("Movie {i}"), &[genre.as_str()]))
                .await
                .expect("create")
        }));
    }

    let mut created = HashSet::new();
    for handle in handles {
        created.insert(handle.await.expect("task").id);
    }
    assert_eq!(created.len(), 8);

    let found = store.get_all(Some(genre.as_str())).await.expect("get_all");
    assert_eq!(ids(&found), created);
}

/// Run every check in sequence against one store.
/// Parallel writers introducing the same new genres all succeed and share
/// one genre each, whatever order they list them in.
pub async fn concurrent_creates_share_new_genres(store: Arc<dyn MovieStore>) {
    let first = unique_tag("Shared");
    let second = unique_tag("Shared");
    let mut handles = Vec::new();
    for i in 0..8 {
        let store = Arc::clone(&store);
        let genres = if i % 2 == 0 {
            [first.clone(), second.clone()]
        } else {
            [second.clone(), first.clone()]
        };
        handles.push(tokio::spawn(async move {
            let genres = [genres[0].as_str(), genres[1].as_str()];
            store
                .create(movie_input(&format!("Shared {i}"), &genres))
                .await
                .expect("create")
        }));
    }

    let mut created = HashSet::new();
    for handle in handles {
        let movie = handle.await.expect("task");
        assert_eq!(movie.genres.len(), 2);
        created.insert(movie.id);
    }
    assert_eq!(created.len(), 8);

    for genre in [&first, &second] {
        let found = store.get_all(Some(genre.to_lowercase().as_str())).await.expect("get_all");
        assert_eq!(ids(&found), created, "genre {genre}");
    }
}

pub async fn run_all(store: Arc<dyn MovieStore>) {
    unknown_id_is_not_found(store.as_ref()).await;
    create_then_get_round_trips(store.as_ref()).await;
    create_mints_distinct_ids(store.as_ref()).await;
    get_all_returns_every_movie(store.as_ref()).await;
    get_all_filters_by_genre_ignoring_case(store.as_ref()).await;
    get_all_genre_is_not_a_substring_match(store.as_ref()).await;
    get_all_unknown_genre_is_empty(store.as_ref()).await;
    update_merges_provided_fields(store.as_ref()).await;
    update_replaces_genres(store.as_ref()).await;
    empty_update_returns_unchanged(store.as_ref()).await;
    delete_twice_reports_not_found(store.as_ref()).await;
    concurrent_creates_all_land(Arc::clone(&store)).await;
    concurrent_creates_share_new_genres(store).await;
}
