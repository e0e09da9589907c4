use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct Config {
    pub import: ImportConfig,
    pub identity: IdentityConfig,
    pub database: DatabaseConfig,
    pub logging: LoggingConfig,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ImportConfig {
    /// Pause between rows; same-batch firm reuse does not depend on it, this
    /// only throttles calls against the identity service.
    pub row_delay_ms: u64,
    pub max_batch_size: usize,
    pub default_source: String,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct IdentityConfig {
    pub base_url: String,
    /// Name of the env var holding the admin service key.
    pub service_key_env: String,
    pub request_timeout_seconds: u64,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct DatabaseConfig {
    pub path: String,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct LoggingConfig {
    pub level: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            import: ImportConfig {
                row_delay_ms: 150,
                max_batch_size: 500,
                default_source: "deedee".to_string(),
            },
            identity: IdentityConfig {
                base_url: "http://localhost:9999".to_string(),
                service_key_env: "IDENTITY_SERVICE_KEY".to_string(),
                request_timeout_seconds: 10,
            },
            database: DatabaseConfig {
                path: "data/deedee.db".to_string(),
            },
            logging: LoggingConfig {
                level: "info".to_string(),
            },
        }
    }
}

pub async fn load_config(
    path: &str,
) -> std::result::Result<Config, Box<dyn std::error::Error + Send + Sync>> {
    let content = tokio::fs::read_to_string(path).await?;
    let config: Config = serde_yaml::from_str(&content)?;
    Ok(config)
}
