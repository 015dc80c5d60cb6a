use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ViewerError {
    #[error("likes unavailable for external quotes")]
    LikesUnavailable,
    #[error("quote {0} is not loaded")]
    UnknownQuote(i32),
    #[error("upstream request failed: {0}")]
    Upstream(String),
    #[error("like storage failed: {0}")]
    Storage(String),
}

impl From<isahc::Error> for ViewerError {
    fn from(e: isahc::Error) -> Self {
        ViewerError::Upstream(e.to_string())
    }
}

impl From<isahc::http::Error> for ViewerError {
    fn from(e: isahc::http::Error) -> Self {
        ViewerError::Upstream(e.to_string())
    }
}

impl From<serde_json::Error> for ViewerError {
    fn from(e: serde_json::Error) -> Self {
        ViewerError::Upstream(format!("malformed response: {e}"))
    }
}
