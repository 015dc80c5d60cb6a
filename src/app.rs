use std::{sync::Arc, time::Duration};

use actix_cors::Cors;
use actix_web::{
    get,
    http::header,
    web::{self, scope, Data},
    HttpResponse, Responder,
};
use anyhow::Context;
use log::{log, Level};
use sqlx::{postgres::PgPoolOptions, Pool, Postgres};
use utoipa::OpenApi;

use crate::{
    api::{
        db::{PgQuoteStore, QuoteStore},
        endpoints::*,
    },
    config::Config,
    schema::{api::*, db::Quote},
};

pub struct AppState {
    pub store: Arc<dyn QuoteStore>,
}

#[derive(OpenApi)]
#[openapi(
    paths(get_quotes, like_quote, get_index, health),
    components(schemas(
        Quote,
        QuotePageResponse,
        LikeResponse,
        ErrorResponse,
        HealthResponse,
        ApiIndexResponse,
        VersionResponse
    )),
    tags(
        (name = "Book Quotes", description = "Book Quotes API")
    ),
)]
pub struct ApiDoc;

#[get("/openapi.json")]
pub async fn get_openapi() -> impl Responder {
    HttpResponse::Ok().json(ApiDoc::openapi())
}

pub fn cors(frontend_origin: &str) -> Cors {
    Cors::default()
        .allowed_origin(frontend_origin)
        .allowed_methods(vec!["GET", "POST"])
        .allowed_headers(vec![header::CONTENT_TYPE, header::ACCEPT])
        .max_age(3600)
}

pub fn configure_app(cfg: &mut web::ServiceConfig) {
    cfg.service(
        scope("/api")
            .service(get_index)
            .service(get_openapi)
            .service(get_quotes)
            .service(like_quote),
    )
    .service(health)
    .service(root)
    .default_service(web::to(not_found));
}

pub async fn connect(config: &Config) -> anyhow::Result<Pool<Postgres>> {
    let options = config
        .database
        .connect_options()
        .context("Invalid database connection settings")?;
    let db = PgPoolOptions::new()
        .acquire_timeout(Duration::from_secs(5))
        .connect_with(options)
        .await
        .context("Could not connect to database")?;
    sqlx::migrate!("./migrations")
        .run(&db)
        .await
        .context("Failed to run migrations")?;
    log!(Level::Info, "Successfully connected to database");
    Ok(db)
}

pub async fn get_app_data(config: &Config) -> anyhow::Result<Data<AppState>> {
    let db = connect(config).await?;
    Ok(Data::new(AppState {
        store: Arc::new(PgQuoteStore::new(db)),
    }))
}
