// src/main.rs
use std::sync::Arc;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use deedee_importer::config::{load_config, Config};
use deedee_importer::database::create_db_pool;
use deedee_importer::identity::HttpIdentityClient;
use deedee_importer::models::Result;
use deedee_importer::server::build_rocket;

#[tokio::main]
async fn main() -> Result<()> {
    dotenv::dotenv().ok();

    // Load configuration
    let config = match load_config("config.yml").await {
        Ok(config) => config,
        Err(e) => {
            warn!("Failed to load config.yml: {}. Using defaults.", e);
            Config::default()
        }
    };

    // Setup logging
    std::env::set_var("RUST_LOG", "deedee_importer=info,hyper=warn,rocket=warn");
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::from_default_env().add_directive("deedee_importer=info".parse().unwrap()),
        )
        .with_max_level(tracing::Level::INFO)
        .init();

    // Initialize database
    info!("Initializing database...");
    let db_pool = create_db_pool(&config.database.path).await?;

    // Identity service client
    let service_key = match std::env::var(&config.identity.service_key_env) {
        Ok(key) => key,
        Err(_) => {
            warn!(
                "{} not set; identity calls will be unauthenticated",
                config.identity.service_key_env
            );
            String::new()
        }
    };
    let identity = Arc::new(HttpIdentityClient::new(
        &config.identity.base_url,
        &service_key,
        config.identity.request_timeout_seconds,
    )?);

    info!("🚀 Starting DeeDee importer API...");
    let _ = build_rocket(config, db_pool, identity).launch().await?;

    Ok(())
}
