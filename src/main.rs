// src/main.rs
use actix_cors::Cors;
use actix_web::{middleware::Logger, web, App, HttpServer};
use chart_analyzer::config::{setup_logging, AppConfig};
use chart_analyzer::handlers::{configure, AppState};

#[actix_web::main]
async fn main() -> std::io::Result<()> {
    setup_logging("log4rs.yaml");

    let config = match AppConfig::from_env() {
        Ok(config) => config,
        Err(e) => {
            log::error!("{}", e);
            return Err(std::io::Error::new(std::io::ErrorKind::InvalidInput, e.to_string()));
        }
    };
    let host = config.host.clone();
    let port = config.port;
    let cors_origin = config.cors_origin.clone();
    let max_upload_bytes = config.max_upload_bytes;

    let state = match AppState::new(config) {
        Ok(state) => web::Data::new(state),
        Err(e) => {
            log::error!("{}", e);
            return Err(std::io::Error::new(std::io::ErrorKind::Other, e.to_string()));
        }
    };
    if !state.settings.lock().is_available() {
        log::warn!("🤖 OPENAI_API_KEY not set, suggestions are rule-based only");
    }

    log::info!("Starting server on http://{}:{}", host, port);
    println!("Available endpoints:");
    println!("  POST http://{}:{}/analyze?timeframe=1h", host, port);
    println!("  POST http://{}:{}/suggest", host, port);
    println!("  GET  http://{}:{}/health", host, port);

    HttpServer::new(move || {
        let cors = Cors::default()
            .allowed_origin(&cors_origin)
            .allowed_methods(vec!["GET", "POST"])
            .allowed_headers(vec![actix_web::http::header::CONTENT_TYPE])
            .max_age(3600);
        App::new()
            .wrap(Logger::default())
            .wrap(cors)
            .app_data(state.clone())
            .configure(|cfg| configure(cfg, max_upload_bytes))
    })
    .bind((host.as_str(), port))?
    .run()
    .await
}
