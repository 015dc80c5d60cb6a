use async_trait::async_trait;
use chrono::{DateTime, Utc};
use isahc::{AsyncReadResponseExt, HttpClient, Request};
use log::{log, Level};
use serde::{de::DeserializeOwned, Deserialize};

use crate::{
    schema::{api::LikeResponse, db::Quote},
    viewer::error::ViewerError,
};

/// Offset added to a third-party quote's position to form its id, keeping it
/// clear of ids issued by the quote service.
pub const EXTERNAL_ID_OFFSET: i32 = 1000;

/// A quote as served by the third-party feed.
#[derive(Deserialize, Debug, Clone, PartialEq)]
pub struct ExternalQuote {
    #[serde(default)]
    pub quote: String,
    #[serde(default)]
    pub author: String,
    #[serde(default)]
    pub book: String,
    #[serde(rename = "createdAt", default)]
    pub created_at: Option<String>,
}

impl ExternalQuote {
    /// Maps the quote at `index` of the feed into the local shape.
    pub fn into_quote(self, index: usize, likes: i32) -> Quote {
        let id = i32::try_from(index)
            .unwrap_or(i32::MAX - EXTERNAL_ID_OFFSET)
            .saturating_add(EXTERNAL_ID_OFFSET);
        let created_at = self
            .created_at
            .as_deref()
            .and_then(|s| DateTime::parse_from_rfc3339(s).ok())
            .map(|t| t.with_timezone(&Utc))
            .unwrap_or_else(Utc::now);
        Quote {
            id,
            text: self.quote,
            author_name: self.author,
            book_title: self.book,
            likes,
            created_at,
        }
    }
}

#[derive(Deserialize)]
struct LocalPage {
    #[serde(default)]
    items: Vec<Quote>,
}

#[derive(Deserialize)]
struct ExternalPage {
    quotes: Vec<ExternalQuote>,
}

/// Where the viewer gets its quotes and sends its likes.
#[async_trait]
pub trait QuoteFeed: Send + Sync {
    async fn fetch_local(&self, page: i64, limit: i64) -> Result<Vec<Quote>, ViewerError>;
    async fn fetch_external(&self) -> Result<Vec<ExternalQuote>, ViewerError>;
    /// Increments a local quote's like count, returning the stored value.
    async fn like(&self, id: i32) -> Result<i32, ViewerError>;
}

pub struct HttpQuoteFeed {
    client: HttpClient,
    api_base: String,
    recite_api_base: String,
}

impl HttpQuoteFeed {
    pub fn new(api_base: &str, recite_api_base: &str) -> Result<Self, ViewerError> {
        Ok(Self {
            client: HttpClient::new()?,
            api_base: api_base.trim_end_matches('/').to_string(),
            recite_api_base: recite_api_base.trim_end_matches('/').to_string(),
        })
    }

    async fn send<T: DeserializeOwned>(&self, request: Request<()>) -> Result<T, ViewerError> {
        let uri = request.uri().to_string();
        let mut response = self.client.send_async(request).await?;
        if !response.status().is_success() {
            log!(Level::Warn, "{uri} answered {}", response.status());
            return Err(ViewerError::Upstream(format!(
                "{uri} answered {}",
                response.status()
            )));
        }
        let body = response
            .text()
            .await
            .map_err(|e| ViewerError::Upstream(e.to_string()))?;
        Ok(serde_json::from_str(&body)?)
    }
}

#[async_trait]
impl QuoteFeed for HttpQuoteFeed {
    async fn fetch_local(&self, page: i64, limit: i64) -> Result<Vec<Quote>, ViewerError> {
        let request = Request::get(format!(
            "{}/quotes?page={page}&limit={limit}",
            self.api_base
        ))
        .body(())?;
        let page: LocalPage = self.send(request).await?;
        Ok(page.items)
    }

    async fn fetch_external(&self) -> Result<Vec<ExternalQuote>, ViewerError> {
        let request = Request::get(format!("{}/quotes", self.recite_api_base)).body(())?;
        let page: ExternalPage = self.send(request).await?;
        Ok(page.quotes)
    }

    async fn like(&self, id: i32) -> Result<i32, ViewerError> {
        let request =
            Request::post(format!("{}/quotes/{id}/like", self.api_base)).body(())?;
        let response: LikeResponse = self.send(request).await?;
        Ok(response.likes)
    }
}
