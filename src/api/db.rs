use async_trait::async_trait;
use log::{log, Level};
use sqlx::{query_as, Pool, Postgres};
use thiserror::Error;

use crate::{
    api::pagination::Page,
    schema::db::{LikeCount, Quote},
};

#[derive(Error, Debug)]
pub enum StoreError {
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),
}

/// Storage backend for quotes.
#[async_trait]
pub trait QuoteStore: Send + Sync {
    /// Quotes joined with author and book, newest first.
    async fn list(&self, page: Page) -> Result<Vec<Quote>, StoreError>;

    /// Adds one like and returns the new count, or `None` when the quote does
    /// not exist. Must be atomic with respect to concurrent calls.
    async fn like(&self, id: i32) -> Result<Option<i32>, StoreError>;
}

pub struct PgQuoteStore {
    db: Pool<Postgres>,
}

impl PgQuoteStore {
    pub fn new(db: Pool<Postgres>) -> Self {
        Self { db }
    }

    pub fn pool(&self) -> &Pool<Postgres> {
        &self.db
    }
}

fn log_query<T>(query: Result<T, sqlx::Error>) -> Result<T, StoreError> {
    query.map_err(|e| {
        log!(Level::Warn, "DB Query failed: {}", e);
        StoreError::Database(e)
    })
}

#[async_trait]
impl QuoteStore for PgQuoteStore {
    async fn list(&self, page: Page) -> Result<Vec<Quote>, StoreError> {
        log_query(
            query_as::<_, Quote>(
                "SELECT q.id, q.text, a.name AS author_name, b.title AS book_title,
                q.likes, q.created_at
                FROM quotes q
                JOIN authors a ON a.id = q.author_id
                JOIN books b ON b.id = q.book_id
                ORDER BY q.created_at DESC, q.id DESC
                LIMIT $1 OFFSET $2",
            )
            .bind(page.limit())
            .bind(page.offset())
            .fetch_all(&self.db)
            .await,
        )
    }

    async fn like(&self, id: i32) -> Result<Option<i32>, StoreError> {
        // Single statement so the increment is serialized by Postgres.
        let row = log_query(
            query_as::<_, LikeCount>(
                "UPDATE quotes SET likes = likes + 1 WHERE id = $1 RETURNING likes",
            )
            .bind(id)
            .fetch_optional(&self.db)
            .await,
        )?;
        Ok(row.map(|r| r.likes))
    }
}
