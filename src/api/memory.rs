use std::sync::Mutex;

use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};

use crate::{
    api::{
        db::{QuoteStore, StoreError},
        pagination::Page,
    },
    schema::db::Quote,
};

/// In-process quote store. Ordering and increment semantics match
/// [`PgQuoteStore`](crate::api::db::PgQuoteStore).
#[derive(Default)]
pub struct MemoryQuoteStore {
    quotes: Mutex<Vec<Quote>>,
}

impl MemoryQuoteStore {
    pub fn new(quotes: Vec<Quote>) -> Self {
        Self {
            quotes: Mutex::new(quotes),
        }
    }

    /// Builds `count` quotes with ids `1..=count`, the highest id being the newest.
    pub fn with_generated(count: i32) -> Self {
        let base: DateTime<Utc> = Utc::now() - Duration::days(1);
        Self::new(
            (1..=count)
                .map(|id| Quote {
                    id,
                    text: format!("Quote number {id}"),
                    author_name: format!("Author {id}"),
                    book_title: format!("Book {id}"),
                    likes: 0,
                    created_at: base + Duration::seconds(id.into()),
                })
                .collect(),
        )
    }

    pub fn likes(&self, id: i32) -> Option<i32> {
        self.quotes
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .iter()
            .find(|q| q.id == id)
            .map(|q| q.likes)
    }
}

#[async_trait]
impl QuoteStore for MemoryQuoteStore {
    async fn list(&self, page: Page) -> Result<Vec<Quote>, StoreError> {
        let mut quotes = self
            .quotes
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .clone();
        quotes.sort_by(|a, b| b.created_at.cmp(&a.created_at).then(b.id.cmp(&a.id)));
        let offset = usize::try_from(page.offset()).unwrap_or(usize::MAX);
        let limit = usize::try_from(page.limit()).unwrap_or(0);
        Ok(quotes.into_iter().skip(offset).take(limit).collect())
    }

    async fn like(&self, id: i32) -> Result<Option<i32>, StoreError> {
        let mut quotes = self.quotes.lock().unwrap_or_else(|e| e.into_inner());
        Ok(quotes.iter_mut().find(|q| q.id == id).map(|q| {
            q.likes += 1;
            q.likes
        }))
    }
}
