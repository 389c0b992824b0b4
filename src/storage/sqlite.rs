use super::{rows_to_items, sql_limit, NewNewsItem, NewsItem, NewsRepository, NewsRow};
use crate::error::FeedResult;
use async_trait::async_trait;
use chrono::Utc;
use sqlx::sqlite::{SqliteConnectOptions, SqlitePoolOptions};
use sqlx::SqlitePool;
use std::str::FromStr;
use tracing::{error, info};

const CREATE_TABLE: &str = r#"
    CREATE TABLE IF NOT EXISTS news (
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        title TEXT NOT NULL,
        description TEXT NOT NULL,
        date_text TEXT NOT NULL,
        photo_file_ids TEXT NOT NULL DEFAULT '[]',
        created_at TEXT NOT NULL
    )
"#;

const ADD_PHOTOS_COLUMN: &str =
    "ALTER TABLE news ADD COLUMN photo_file_ids TEXT NOT NULL DEFAULT '[]'";

const SELECT_COLUMNS: &str = "SELECT id, title, description, date_text, photo_file_ids, created_at FROM news";

/// SQLite-backed news repository
#[derive(Clone)]
pub struct SqliteNewsRepository {
    pool: SqlitePool,
}

impl SqliteNewsRepository {
    /// Open (and create if missing) a database file.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be opened.
    pub async fn open(path: &str) -> FeedResult<Self> {
        let options = SqliteConnectOptions::new()
            .filename(path)
            .create_if_missing(true);
        let pool = SqlitePoolOptions::new()
            .max_connections(4)
            .connect_with(options)
            .await?;
        Ok(Self { pool })
    }

    /// Open a private in-memory database.
    ///
    /// Every connection to `:memory:` is a separate database, so the pool is
    /// pinned to one connection that never expires.
    ///
    /// # Errors
    ///
    /// Returns an error if SQLite cannot be initialized.
    pub async fn in_memory() -> FeedResult<Self> {
        let options = SqliteConnectOptions::from_str("sqlite::memory:")?;
        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .min_connections(1)
            .idle_timeout(None)
            .max_lifetime(None)
            .connect_with(options)
            .await?;
        Ok(Self { pool })
    }

    /// Underlying connection pool
    #[must_use]
    pub const fn pool(&self) -> &SqlitePool {
        &self.pool
    }
}

#[async_trait]
impl NewsRepository for SqliteNewsRepository {
    async fn init(&self) -> FeedResult<()> {
        sqlx::query(CREATE_TABLE).execute(&self.pool).await?;

        // Tables created before photo support lack the column
        let has_photos = sqlx::query_scalar::<_, i64>(
            "SELECT COUNT(*) FROM pragma_table_info('news') WHERE name = 'photo_file_ids'",
        )
        .fetch_one(&self.pool)
        .await?;
        if has_photos == 0 {
            sqlx::query(ADD_PHOTOS_COLUMN).execute(&self.pool).await?;
            info!("Added photo_file_ids column to existing SQLite news table.");
        }

        info!("SQLite news table ready.");
        Ok(())
    }

    async fn add(&self, item: NewNewsItem) -> FeedResult<i64> {
        let photos = serde_json::to_string(&item.photo_file_ids)?;
        let id = sqlx::query_scalar::<_, i64>(
            r#"
            INSERT INTO news (title, description, date_text, photo_file_ids, created_at)
            VALUES (?, ?, ?, ?, ?)
            RETURNING id
            "#,
        )
        .bind(&item.title)
        .bind(&item.description)
        .bind(&item.date_text)
        .bind(&photos)
        .bind(Utc::now())
        .fetch_one(&self.pool)
        .await?;
        Ok(id)
    }

    async fn list(&self, limit: usize) -> FeedResult<Vec<NewsItem>> {
        let rows = sqlx::query_as::<_, NewsRow>(&format!(
            "{SELECT_COLUMNS} ORDER BY id DESC LIMIT ?"
        ))
        .bind(sql_limit(limit))
        .fetch_all(&self.pool)
        .await?;
        rows_to_items(rows)
    }

    async fn get(&self, id: i64) -> FeedResult<Option<NewsItem>> {
        let row = sqlx::query_as::<_, NewsRow>(&format!("{SELECT_COLUMNS} WHERE id = ?"))
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        row.map(NewsItem::try_from).transpose()
    }

    async fn delete(&self, id: i64) -> FeedResult<bool> {
        let result = sqlx::query("DELETE FROM news WHERE id = ?")
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    async fn check_connection(&self) -> FeedResult<()> {
        match sqlx::query("SELECT 1").execute(&self.pool).await {
            Ok(_) => {
                info!("Successfully connected to SQLite storage.");
                Ok(())
            }
            Err(e) => {
                error!("SQLite connectivity test failed: {e}");
                Err(e.into())
            }
        }
    }
}
