use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};

use crate::schema::db::Quote;

/// Raw pagination parameters. Kept as strings so malformed values fall back
/// to defaults instead of rejecting the request.
#[derive(Deserialize, Debug, Default, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct FetchParams {
    /// Page number, starting at 1
    pub page: Option<String>,
    /// Items per page, clamped to 1..=100
    pub limit: Option<String>,
}

#[derive(Serialize, Deserialize, Debug, ToSchema)]
pub struct QuotePageResponse {
    pub page: i64,
    pub limit: i64,
    pub items: Vec<Quote>,
}

#[derive(Serialize, Deserialize, Debug, ToSchema)]
pub struct LikeResponse {
    pub likes: i32,
}

#[derive(Serialize, Deserialize, Debug, ToSchema)]
pub struct ErrorResponse {
    pub error: String,
}

#[derive(Serialize, Deserialize, Debug, ToSchema)]
pub struct HealthResponse {
    pub status: String,
}

#[derive(Serialize, Debug, ToSchema)]
pub struct RootResponse {
    pub message: String,
    pub docs: String,
}

#[derive(Serialize, Debug, ToSchema)]
pub struct ApiIndexResponse {
    pub message: String,
    pub endpoints: Vec<String>,
    pub version: VersionResponse,
}

#[derive(Serialize, Debug, ToSchema)]
pub struct VersionResponse {
    pub build_date: String,
    pub revision: String,
}
