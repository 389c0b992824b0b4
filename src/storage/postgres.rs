use super::{rows_to_items, sql_limit, NewNewsItem, NewsItem, NewsRepository, NewsRow};
use crate::error::FeedResult;
use async_trait::async_trait;
use chrono::Utc;
use sqlx::postgres::PgPoolOptions;
use sqlx::PgPool;
use std::collections::HashMap;
use std::time::Duration;
use tracing::{error, info};

const CREATE_TABLE: &str = r#"
    CREATE TABLE IF NOT EXISTS news (
        id BIGSERIAL PRIMARY KEY,
        title TEXT NOT NULL,
        description TEXT NOT NULL,
        date_text TEXT NOT NULL,
        photo_file_ids TEXT NOT NULL DEFAULT '[]',
        created_at TIMESTAMPTZ NOT NULL
    )
"#;

const SELECT_COLUMNS: &str = "SELECT id, title, description, date_text, photo_file_ids, created_at FROM news";

/// PostgreSQL-backed news repository
#[derive(Clone)]
pub struct PostgresNewsRepository {
    pool: PgPool,
}

impl PostgresNewsRepository {
    /// Connect to a PostgreSQL server.
    ///
    /// # Errors
    ///
    /// Returns an error if the server cannot be reached.
    pub async fn connect(url: &str) -> FeedResult<Self> {
        let pool = PgPoolOptions::new()
            .max_connections(5)
            .acquire_timeout(Duration::from_secs(10))
            .connect(url)
            .await?;
        Ok(Self { pool })
    }

    /// Underlying connection pool
    #[must_use]
    pub const fn pool(&self) -> &PgPool {
        &self.pool
    }
}

#[async_trait]
impl NewsRepository for PostgresNewsRepository {
    async fn init(&self) -> FeedResult<()> {
        let mut tx = self.pool.begin().await?;
        sqlx::query(CREATE_TABLE).execute(&mut *tx).await?;

        // Tables created before photo support use SERIAL ids, naive
        // timestamps and have no photo column
        let columns: HashMap<String, String> = sqlx::query_as::<_, (String, String)>(
            r#"
            SELECT column_name::TEXT, data_type::TEXT
            FROM information_schema.columns
            WHERE table_schema = current_schema() AND table_name = 'news'
            "#,
        )
        .fetch_all(&mut *tx)
        .await?
        .into_iter()
        .collect();

        if !columns.contains_key("photo_file_ids") {
            sqlx::query("ALTER TABLE news ADD COLUMN photo_file_ids TEXT NOT NULL DEFAULT '[]'")
                .execute(&mut *tx)
                .await?;
            info!("Added photo_file_ids column to existing PostgreSQL news table.");
        }
        if columns.get("id").is_some_and(|t| t == "integer") {
            sqlx::query("ALTER TABLE news ALTER COLUMN id TYPE BIGINT")
                .execute(&mut *tx)
                .await?;
            sqlx::query("ALTER SEQUENCE IF EXISTS news_id_seq AS BIGINT")
                .execute(&mut *tx)
                .await?;
            info!("Widened news.id to BIGINT.");
        }
        if columns
            .get("created_at")
            .is_some_and(|t| t == "timestamp without time zone")
        {
            sqlx::query(
                "ALTER TABLE news ALTER COLUMN created_at TYPE TIMESTAMPTZ USING created_at AT TIME ZONE 'UTC'",
            )
            .execute(&mut *tx)
            .await?;
            info!("Converted news.created_at to TIMESTAMPTZ.");
        }

        tx.commit().await?;
        info!("PostgreSQL news table ready.");
        Ok(())
    }

    async fn add(&self, item: NewNewsItem) -> FeedResult<i64> {
        let photos = serde_json::to_string(&item.photo_file_ids)?;
        let id = sqlx::query_scalar::<_, i64>(
            r#"
            INSERT INTO news (title, description, date_text, photo_file_ids, created_at)
            VALUES ($1, $2, $3, $4, $5)
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
            "{SELECT_COLUMNS} ORDER BY id DESC LIMIT $1"
        ))
        .bind(sql_limit(limit))
        .fetch_all(&self.pool)
        .await?;
        rows_to_items(rows)
    }

    async fn get(&self, id: i64) -> FeedResult<Option<NewsItem>> {
        let row = sqlx::query_as::<_, NewsRow>(&format!("{SELECT_COLUMNS} WHERE id = $1"))
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        row.map(NewsItem::try_from).transpose()
    }

    async fn delete(&self, id: i64) -> FeedResult<bool> {
        let result = sqlx::query("DELETE FROM news WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    async fn check_connection(&self) -> FeedResult<()> {
        match sqlx::query("SELECT 1").execute(&self.pool).await {
            Ok(_) => {
                info!("Successfully connected to PostgreSQL storage.");
                Ok(())
            }
            Err(e) => {
                error!("PostgreSQL connectivity test failed: {e}");
                Err(e.into())
            }
        }
    }
}
