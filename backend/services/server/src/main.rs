use actix_web::{web, App, HttpServer};
use dotenvy::dotenv;
use engine::spawn_market_actor;
use log::{info, warn};
use redis_client::RedisManager;

use server::config::ServerConfig;
use server::configure_routes;

async fn run() -> std::io::Result<()> {
    dotenv().ok();
    env_logger::init();

    let config = ServerConfig::from_env()
        .map_err(|e| std::io::Error::new(std::io::ErrorKind::InvalidInput, e))?;

    match config.redis_url.as_deref() {
        Some(redis_url) => match RedisManager::init_global(redis_url) {
            Ok(manager) => match manager.connect().await {
                Ok(()) => info!("Connected to Redis, publishing store events"),
                Err(e) => warn!("Redis connection failed, store events disabled: {}", e),
            },
            Err(e) => warn!("Invalid REDIS_URL, store events disabled: {}", e),
        },
        None => info!("REDIS_URL not set, store events disabled"),
    }

    if config.admin_addresses.is_empty() {
        warn!("ADMIN_ADDRESSES is empty; admin routes will reject every wallet");
    }

    let store = spawn_market_actor(config.command_buffer);
    let bind_addr = config.bind_addr.clone();
    let store_data = web::Data::new(store);
    let config_data = web::Data::new(config);

    info!("Listening on {}", bind_addr);
    HttpServer::new(move || {
        App::new()
            .app_data(store_data.clone())
            .app_data(config_data.clone())
            .configure(configure_routes)
    })
    .bind(bind_addr)?
    .run()
    .await
}

fn main() -> std::io::Result<()> {
    let runtime = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()?;
    runtime.block_on(run())
}
