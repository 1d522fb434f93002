//! News repository implementation

use sqlx::PgPool;
use chrono::Utc;
use crate::models::news::{News, CreateNewsRequest, UpdateNewsRequest};
use crate::utils::errors::RunRaceError;

const NEWS_COLUMNS: &str = "id, title, content, image_url, created_by, created_at, updated_at";

#[derive(Clone)]
#[derive(Debug)]
pub struct NewsRepository {
    pool: PgPool,
}

impl NewsRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub async fn create(&self, request: CreateNewsRequest) -> Result<News, RunRaceError> {
        let news = sqlx::query_as::<_, News>(&format!(
            r#"
            INSERT INTO news (title, content, image_url, created_by, created_at, updated_at)
            VALUES ($1, $2, $3, $4, $5, $6)
            RETURNING {}
            "#,
            NEWS_COLUMNS
        ))
        .bind(request.title)
        .bind(request.content)
        .bind(request.image_url)
        .bind(request.created_by)
        .bind(Utc::now())
        .bind(Utc::now())
        .fetch_one(&self.pool)
        .await?;

        Ok(news)
    }

    pub async fn find_by_id(&self, id: i64) -> Result<Option<News>, RunRaceError> {
        let news = sqlx::query_as::<_, News>(&format!("SELECT {} FROM news WHERE id = $1", NEWS_COLUMNS))
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        Ok(news)
    }

    /// Update an article, leaving absent fields untouched
    pub async fn update(&self, id: i64, request: UpdateNewsRequest) -> Result<News, RunRaceError> {
        let news = sqlx::query_as::<_, News>(&format!(
            r#"
            UPDATE news
            SET title = COALESCE($2, title),
                content = COALESCE($3, content),
                image_url = CASE WHEN $5 THEN NULL ELSE COALESCE($4, image_url) END,
                updated_at = $6
            WHERE id = $1
            RETURNING {}
            "#,
            NEWS_COLUMNS
        ))
        .bind(id)
        .bind(request.title)
        .bind(request.content)
        .bind(request.image_url)
        .bind(request.clear_image)
        .bind(Utc::now())
        .fetch_optional(&self.pool)
        .await?;

        news.ok_or(RunRaceError::NewsNotFound { news_id: id })
    }

    /// Returns whether a row was removed
    pub async fn delete(&self, id: i64) -> Result<bool, RunRaceError> {
        let result = sqlx::query("DELETE FROM news WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }

    /// Newest first
    pub async fn list_recent(&self, limit: i64) -> Result<Vec<News>, RunRaceError> {
        let news = sqlx::query_as::<_, News>(&format!(
            "SELECT {} FROM news ORDER BY created_at DESC, id DESC LIMIT $1",
            NEWS_COLUMNS
        ))
        .bind(limit)
        .fetch_all(&self.pool)
        .await?;

        Ok(news)
    }

    pub async fn count(&self) -> Result<i64, RunRaceError> {
        let count: (i64,) = sqlx::query_as("SELECT COUNT(*) FROM news")
            .fetch_one(&self.pool)
            .await?;

        Ok(count.0)
    }
}
