use std::path::PathBuf;

use reel_core::store::{FileStore, MovieStore};

fn seed_path() -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("../../data/movies.json")
}

#[tokio::test]
async fn test_seed_file_loads() {
    let store = FileStore::open(seed_path(), false).await.expect("seed file should parse");
    assert!(!store.is_persistent());

    let movies = store.get_all(None).await.unwrap();
    assert!(movies.len() >= 10);
    for movie in &movies {
        assert!(uuid::Uuid::parse_str(&movie.id).is_ok(), "bad id {}", movie.id);
        assert!(!movie.genres.is_empty(), "{} has no genres", movie.title);
        assert!((0.0..=10.0).contains(&movie.rating));
    }
}

#[tokio::test]
async fn test_seed_file_genre_filter() {
    let store = FileStore::open(seed_path(), false).await.unwrap();
    let scifi = store.get_all(Some("sci-fi")).await.unwrap();
    assert!(scifi.iter().any(|m| m.title == "Inception"));
    assert!(scifi.iter().all(|m| m.has_genre("Sci-Fi")));
}
