mod common;

use common::{exercise_repository_contract, new_item};
use newsfeed_bot::config::Settings;
use newsfeed_bot::error::FeedResult;
use newsfeed_bot::storage::{self, NewsRepository, SqliteNewsRepository};

#[tokio::test]
async fn test_in_memory_contract() -> FeedResult<()> {
    let repo = SqliteNewsRepository::in_memory().await?;
    repo.init().await?;
    exercise_repository_contract(&repo).await
}

#[tokio::test]
async fn test_file_backed_contract() -> FeedResult<()> {
    let dir = tempfile::tempdir().expect("failed to create temp dir");
    let path = dir.path().join("news.db");
    let repo = SqliteNewsRepository::open(&path.to_string_lossy()).await?;
    repo.init().await?;
    exercise_repository_contract(&repo).await
}

#[tokio::test]
async fn test_init_twice_preserves_data() -> FeedResult<()> {
    let dir = tempfile::tempdir().expect("failed to create temp dir");
    let path = dir.path().join("news.db").to_string_lossy().to_string();

    let repo = SqliteNewsRepository::open(&path).await?;
    repo.init().await?;
    let id = repo.add(new_item("kept", &[])).await?;
    repo.init().await?;
    assert_eq!(repo.list(10).await?.len(), 1);
    drop(repo);

    // Reopening the same file sees the same data
    let reopened = SqliteNewsRepository::open(&path).await?;
    reopened.init().await?;
    let item = reopened.get(id).await?.expect("item should survive reopen");
    assert_eq!(item.title, "kept");
    Ok(())
}

#[tokio::test]
async fn test_connect_selects_sqlite_without_database_url() -> FeedResult<()> {
    let dir = tempfile::tempdir().expect("failed to create temp dir");
    let settings = Settings {
        sqlite_path: dir.path().join("feed.db").to_string_lossy().to_string(),
        database_url: None,
        ..Settings::default()
    };

    let repo = storage::connect(&settings).await?;
    let id = repo.add(new_item("via connect", &[])).await?;
    assert_eq!(repo.list(5).await?[0].id, id);
    Ok(())
}

#[tokio::test]
async fn test_zero_limit_returns_nothing() -> FeedResult<()> {
    let repo = SqliteNewsRepository::in_memory().await?;
    repo.init().await?;
    repo.add(new_item("one", &[])).await?;
    assert!(repo.list(0).await?.is_empty());
    Ok(())
}

#[tokio::test]
async fn test_init_upgrades_store_without_photo_column() -> FeedResult<()> {
    let dir = tempfile::tempdir().expect("failed to create temp dir");
    let path = dir.path().join("news.db").to_string_lossy().to_string();

    let repo = SqliteNewsRepository::open(&path).await?;
    sqlx::query(
        r#"
        CREATE TABLE news (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            title TEXT NOT NULL,
            description TEXT NOT NULL,
            date_text TEXT NOT NULL,
            created_at TEXT NOT NULL DEFAULT (datetime('now'))
        )
        "#,
    )
    .execute(repo.pool())
    .await?;
    sqlx::query(
        "INSERT INTO news (title, description, date_text) VALUES ('Launch', 'We are live', '01.02.2025')",
    )
    .execute(repo.pool())
    .await?;

    repo.init().await?;

    let items = repo.list(10).await?;
    assert_eq!(items.len(), 1);
    assert_eq!(items[0].title, "Launch");
    assert_eq!(items[0].date_text, "01.02.2025");
    assert!(items[0].photo_file_ids.is_empty());

    let id = repo.add(new_item("After upgrade", &["AgAC"])).await?;
    let stored = repo.get(id).await?.expect("new item should exist");
    assert_eq!(stored.photo_file_ids, vec!["AgAC".to_string()]);
    assert_eq!(repo.list(10).await?.len(), 2);
    Ok(())
}
