use actix_web::{
    get, post,
    web::{self, Data, Json, Path},
    HttpResponse, Responder,
};
use log::{log, Level};

use crate::{
    api::pagination::Page,
    app::AppState,
    error::ApiError,
    schema::api::{
        ApiIndexResponse, ErrorResponse, FetchParams, HealthResponse, LikeResponse,
        QuotePageResponse, RootResponse, VersionResponse,
    },
    utils::parse_quote_id,
};

#[utoipa::path(
    context_path = "/api",
    params(FetchParams),
    responses(
        (status = 200, description = "Newest quotes first", body = QuotePageResponse),
        (status = 500, description = "Store failure", body = ErrorResponse)
    )
)]
#[get("/quotes")]
pub async fn get_quotes(
    state: Data<AppState>,
    params: web::Query<FetchParams>,
) -> Result<Json<QuotePageResponse>, ApiError> {
    let page = Page::from(&params.into_inner());
    log!(
        Level::Info,
        "GET /api/quotes page={} limit={}",
        page.page(),
        page.limit()
    );

    let items = state
        .store
        .list(page)
        .await
        .map_err(ApiError::store("Failed to fetch quotes"))?;

    Ok(Json(QuotePageResponse {
        page: page.page(),
        limit: page.limit(),
        items,
    }))
}

#[utoipa::path(
    context_path = "/api",
    params(("id" = String, Path, description = "Quote id, digits only")),
    responses(
        (status = 200, description = "New like count", body = LikeResponse),
        (status = 404, description = "Quote not found", body = ErrorResponse),
        (status = 500, description = "Store failure", body = ErrorResponse)
    )
)]
#[post("/quotes/{id}/like")]
pub async fn like_quote(
    state: Data<AppState>,
    path: Path<(String,)>,
) -> Result<Json<LikeResponse>, ApiError> {
    let (id,) = path.into_inner();
    log!(Level::Info, "POST /api/quotes/{id}/like");

    let Some(id) = parse_quote_id(&id) else {
        log!(Level::Warn, "Invalid quote id");
        return Err(ApiError::NotFound("Quote not found"));
    };

    match state
        .store
        .like(id)
        .await
        .map_err(ApiError::store("Failed to like quote"))?
    {
        Some(likes) => Ok(Json(LikeResponse { likes })),
        None => Err(ApiError::NotFound("Quote not found")),
    }
}

#[utoipa::path(
    context_path = "/api",
    responses((status = 200, description = "Endpoint index", body = ApiIndexResponse))
)]
#[get("")]
pub async fn get_index() -> impl Responder {
    HttpResponse::Ok().json(ApiIndexResponse {
        message: "API root".to_string(),
        endpoints: vec![
            "/api/quotes".to_string(),
            "/api/quotes/:id/like".to_string(),
            "/health".to_string(),
        ],
        version: VersionResponse {
            build_date: option_env!("VERGEN_BUILD_TIMESTAMP")
                .unwrap_or("unknown")
                .to_string(),
            revision: option_env!("VERGEN_GIT_SHA")
                .unwrap_or("unknown")
                .to_string(),
        },
    })
}

#[utoipa::path(responses((status = 200, description = "Liveness", body = HealthResponse)))]
#[get("/health")]
pub async fn health() -> impl Responder {
    HttpResponse::Ok().json(HealthResponse {
        status: "ok".to_string(),
    })
}

#[get("/")]
pub async fn root() -> impl Responder {
    HttpResponse::Ok().json(RootResponse {
        message: "Book Quotes API".to_string(),
        docs: "/api".to_string(),
    })
}

pub async fn not_found() -> impl Responder {
    HttpResponse::NotFound().json(ErrorResponse {
        error: "Not Found".to_string(),
    })
}
