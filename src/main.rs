use std::io;

use actix_cors::Cors;
use actix_web::{http::header, middleware::Logger, web, App, HttpServer};
use env_logger::Env;
use log::{error, info};

use event_booking_api::{config::AppConfig, db, routes, services::account_service};

fn cors(origin: &str) -> Cors {
    Cors::default()
        .allowed_origin(origin)
        .allowed_methods(vec!["GET", "POST", "PUT", "DELETE"])
        .allowed_headers(vec![header::CONTENT_TYPE, header::AUTHORIZATION])
        .max_age(3600)
}

#[actix_web::main]
async fn main() -> io::Result<()> {
    if cfg!(debug_assertions) {
        dotenv::dotenv().ok();
    }

    env_logger::init_from_env(Env::default().default_filter_or("info"));
    info!("Application starting...");

    let config = AppConfig::from_env().map_err(|e| {
        error!("Configuration error: {}", e);
        io::Error::new(io::ErrorKind::InvalidInput, e)
    })?;
    info!("Pricing policy: {}", config.pricing_policy);

    let client = db::mongo::create_mongo_client(&config.mongo_uri, &config.database)
        .await
        .map_err(|e| {
            error!("Failed to create MongoDB client: {}", e);
            io::Error::new(io::ErrorKind::Other, e)
        })?;

    if let Err(e) = db::mongo::ensure_indexes(&client, &config).await {
        error!("Failed to create indexes: {}", e);
    }
    if let Err(e) = account_service::ensure_admin_account(&client, &config).await {
        error!("Failed to seed administrator account: {}", e);
    }

    let bind = (config.host.clone(), config.port);
    info!("Starting HTTP server on {}:{}", bind.0, bind.1);

    let config = web::Data::new(config);
    let client = web::Data::new(client);

    HttpServer::new(move || {
        App::new()
            .wrap(cors(&config.cors_origin))
            .wrap(Logger::default())
            .app_data(client.clone())
            .app_data(config.clone())
            .configure(routes::config)
    })
    .bind(bind)?
    .run()
    .await
}
