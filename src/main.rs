use actix_cors::Cors;
use actix_web::{web, App, HttpServer};
use dotenv::dotenv;
use gatekeeper_server::{configure, AppError, AppState, Settings};
use tracing::info;
use tracing_subscriber::EnvFilter;

fn build_cors(config: &Settings) -> Cors {
    if !config.cors.enabled {
        return Cors::default();
    }

    let cors = if config.cors.allow_any_origin {
        Cors::default()
            .allow_any_origin()
            .allow_any_method()
            .allow_any_header()
            .expose_any_header()
    } else {
        config
            .cors
            .allowed_origins
            .iter()
            .fold(Cors::default(), |cors, origin| cors.allowed_origin(origin))
            .allowed_methods(vec!["GET", "POST", "DELETE"])
            .allowed_headers(vec!["Authorization", "Content-Type"])
            .supports_credentials()
    };

    cors.max_age(config.cors.max_age as usize)
}

#[actix_web::main]
async fn main() -> gatekeeper_server::Result<()> {
    dotenv().ok();

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_target(false)
        .with_thread_ids(true)
        .with_file(true)
        .with_line_number(true)
        .init();

    let config = Settings::new()?;
    info!("Configuration loaded for environment: {}", config.environment);

    let state = web::Data::new(AppState::new(config.clone()).await?);

    let bind_addr = (config.server.host.clone(), config.server.port);
    let workers = config.server.workers as usize;
    info!("Starting {} at {}:{}", config.app_name, bind_addr.0, bind_addr.1);

    HttpServer::new(move || {
        App::new()
            .wrap(build_cors(&config))
            .app_data(state.clone())
            .configure(configure)
    })
    .bind(bind_addr)?
    .workers(workers)
    .run()
    .await
    .map_err(|e| AppError::InternalError(e.to_string()))?;

    Ok(())
}
