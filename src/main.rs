use actix_web::{self, middleware::Logger, App, HttpServer};
use anyhow::Context;
use book_quotes::{
    app::{configure_app, cors, get_app_data},
    config::Config,
};
use dotenv::dotenv;
use log::{log, Level};

#[actix_web::main]
async fn main() -> anyhow::Result<()> {
    dotenv().ok();
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let config = Config::from_env().context("Invalid configuration")?;
    let app_data = get_app_data(&config).await?;
    let origin = config.frontend_origin.clone();

    log!(
        Level::Info,
        "Backend listening on http://{}:{}",
        config.bind_address,
        config.port
    );
    HttpServer::new(move || {
        App::new()
            .wrap(cors(&origin))
            .wrap(Logger::new(
                "%a \"%r\" %s %b \"%{Referer}i\" \"%{User-Agent}i\" %T",
            ))
            .configure(configure_app)
            .app_data(app_data.clone())
    })
    .bind((config.bind_address.as_str(), config.port))?
    .run()
    .await?;
    Ok(())
}
