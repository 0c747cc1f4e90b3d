// src/main.rs
use actix_web::{App, HttpServer, middleware::Logger, web};
use subscription_mailing_service::{app, config, db};
use tracing_subscriber::{EnvFilter, FmtSubscriber};

#[actix_web::main]
async fn main() -> std::io::Result<()> {
    let subscriber = FmtSubscriber::builder()
        .with_env_filter(EnvFilter::from_default_env())
        .finish();
    tracing::subscriber::set_global_default(subscriber).expect("Failed to set tracing subscriber");

    tracing::info!("Starting subscription mailing service");

    dotenv::dotenv().ok();
    let config = config::Config::from_env().map_err(|e| {
        tracing::error!("Failed to load config from environment: {}", e);
        std::io::Error::other(e)
    })?;

    let pool = db::open(&config).await.map_err(|e| {
        tracing::error!("Failed to initialize database: {}", e);
        std::io::Error::other(e)
    })?;

    let repositories = app::Repositories::postgres(&pool);
    let server_config = config.clone();
    let server_pool = pool.clone();

    let server = HttpServer::new(move || {
        App::new()
            .app_data(web::Data::new(server_pool.clone()))
            .app_data(web::Data::new(server_config.clone()))
            .wrap(Logger::default())
            .configure(|cfg| repositories.configure(cfg))
            .configure(app::init_health)
    })
    .bind(config.server_address.as_str());

    // The pool is released whether the server fails to bind, fails while
    // running or shuts down cleanly.
    let result = match server {
        Ok(server) => {
            tracing::info!(address = %config.server_address, "Listening");
            server.run().await
        }
        Err(e) => {
            tracing::error!("Failed to bind {}: {}", config.server_address, e);
            Err(e)
        }
    };

    db::close(&pool).await;
    result
}
