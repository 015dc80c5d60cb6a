use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// A quote joined with its author and book.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, sqlx::FromRow, ToSchema)]
pub struct Quote {
    pub id: i32, // SERIAL value
    pub text: String,
    pub author_name: String,
    pub book_title: String,
    pub likes: i32,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, sqlx::FromRow)]
pub struct LikeCount {
    pub likes: i32,
}
