#![allow(dead_code)]

use newsfeed_bot::error::FeedResult;
use newsfeed_bot::storage::{NewNewsItem, NewsRepository};

pub fn new_item(title: &str, photos: &[&str]) -> NewNewsItem {
    NewNewsItem {
        title: title.to_string(),
        description: format!("{title} body"),
        date_text: "01.01.2030".to_string(),
        photo_file_ids: photos.iter().map(ToString::to_string).collect(),
    }
}

/// Behaviour every backend must share. Expects an initialized, empty store.
pub async fn exercise_repository_contract(repo: &dyn NewsRepository) -> FeedResult<()> {
    assert!(repo.list(10).await?.is_empty());
    assert_eq!(repo.get(1).await?, None);
    assert!(!repo.delete(1).await?);

    let first = repo.add(new_item("first", &[])).await?;
    let second = repo.add(new_item("second", &["AgACAgIAAx0"])).await?;
    let third = repo.add(new_item("third", &[])).await?;
    assert!(first < second && second < third);

    // Newest first
    let ids: Vec<i64> = repo.list(10).await?.iter().map(|i| i.id).collect();
    assert_eq!(ids, vec![third, second, first]);

    let limited = repo.list(2).await?;
    assert_eq!(limited.len(), 2);
    assert_eq!(limited[0].id, third);

    let stored = repo.get(second).await?.expect("second item should exist");
    assert_eq!(stored.title, "second");
    assert_eq!(stored.description, "second body");
    assert_eq!(stored.date_text, "01.01.2030");
    assert_eq!(stored.photo_file_ids, vec!["AgACAgIAAx0".to_string()]);

    assert!(repo.delete(second).await?);
    assert!(!repo.delete(second).await?);
    assert_eq!(repo.get(second).await?, None);

    let fourth = repo.add(new_item("fourth", &[])).await?;
    assert!(fourth > third, "identifiers must never be reused");

    repo.check_connection().await
}
