use std::env;
use anyhow::{bail, Context, Result};

/// Connection settings for the Spanner-backed store
#[derive(Debug, Clone, PartialEq)]
pub struct SpannerConfig {
    pub emulator_host: Option<String>,
    pub project: String,
    pub instance: String,
    pub database: String,
}

impl SpannerConfig {
    pub fn database_path(&self) -> String {
        format!(
            "projects/{}/instances/{}/databases/{}",
            self.project, self.instance, self.database
        )
    }
}

/// Which persistence gateway backs the todo routes
#[derive(Debug, Clone, PartialEq)]
pub enum StoreConfig {
    Spanner(SpannerConfig),
    Memory,
}

#[derive(Debug, Clone)]
pub struct Config {
    pub store: StoreConfig,
    pub service_port: u16,
    pub service_host: String,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        let store = match env::var("TODO_STORE")
            .unwrap_or_else(|_| "spanner".to_string())
            .as_str()
        {
            "spanner" => StoreConfig::Spanner(spanner_from_env()?),
            "memory" => StoreConfig::Memory,
            other => bail!("TODO_STORE must be one of: spanner, memory, got '{}'", other),
        };

        let service_port = env::var("SERVICE_PORT")
            .unwrap_or_else(|_| "3000".to_string())
            .parse::<u16>()
            .context("SERVICE_PORT must be a valid port number (0-65535)")?;

        let service_host = env::var("SERVICE_HOST")
            .unwrap_or_else(|_| "0.0.0.0".to_string());

        Ok(Config {
            store,
            service_port,
            service_host,
        })
    }

    pub fn log_startup(&self) {
        tracing::info!("Configuration loaded:");
        match &self.store {
            StoreConfig::Spanner(spanner) => {
                tracing::info!("  Store: spanner");
                tracing::info!("  Spanner emulator: {}",
                    spanner.emulator_host.as_deref().unwrap_or("disabled (using production)"));
                tracing::info!("  Spanner project: {}", spanner.project);
                tracing::info!("  Spanner instance: {}", spanner.instance);
                tracing::info!("  Spanner database: {}", spanner.database);
            }
            StoreConfig::Memory => {
                tracing::info!("  Store: memory (data is lost on restart)");
            }
        }
        tracing::info!("  Service listening on: {}:{}", self.service_host, self.service_port);
    }
}

fn spanner_from_env() -> Result<SpannerConfig> {
    let emulator_host = env::var("SPANNER_EMULATOR_HOST").ok();

    let project = env::var("SPANNER_PROJECT")
        .context("SPANNER_PROJECT environment variable is required")?;

    let instance = env::var("SPANNER_INSTANCE")
        .context("SPANNER_INSTANCE environment variable is required")?;

    let database = env::var("SPANNER_DATABASE")
        .context("SPANNER_DATABASE environment variable is required")?;

    Ok(SpannerConfig {
        emulator_host,
        project,
        instance,
        database,
    })
}

/// Serializes tests that mutate process-wide environment variables
#[cfg(test)]
pub(crate) static ENV_LOCK: std::sync::Mutex<()> = std::sync::Mutex::new(());
