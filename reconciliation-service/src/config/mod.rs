//! Configuration module for reconciliation-service.

use service_core::config as core_config;
use service_core::error::AppError;
use std::env;

#[derive(Debug, Clone)]
pub struct ReconciliationConfig {
    pub common: core_config::Config,
    pub service_name: String,
    pub service_version: String,
    pub log_level: String,
    pub otlp_endpoint: Option<String>,
    pub limits: LimitsConfig,
}

#[derive(Debug, Clone)]
pub struct LimitsConfig {
    /// Upper bound on records accepted per dataset in a single request.
    pub max_records_per_dataset: usize,
    /// Upper bound on a request body, sized so a full-cap request of both
    /// datasets still fits.
    pub max_body_bytes: usize,
}

impl Default for LimitsConfig {
    fn default() -> Self {
        Self {
            max_records_per_dataset: 50_000,
            max_body_bytes: 64 * 1024 * 1024,
        }
    }
}

impl ReconciliationConfig {
    pub fn from_env() -> Result<Self, AppError> {
        let common = core_config::Config::load()?;

        let defaults = LimitsConfig::default();
        let max_records_per_dataset =
            limit_from_env("MAX_RECORDS_PER_DATASET", defaults.max_records_per_dataset)?;
        let max_body_bytes = limit_from_env("MAX_BODY_BYTES", defaults.max_body_bytes)?;

        Ok(Self {
            common,
            service_name: env::var("SERVICE_NAME")
                .unwrap_or_else(|_| "reconciliation-service".to_string()),
            service_version: env::var("SERVICE_VERSION")
                .unwrap_or_else(|_| env!("CARGO_PKG_VERSION").to_string()),
            log_level: env::var("LOG_LEVEL").unwrap_or_else(|_| "info".to_string()),
            otlp_endpoint: env::var("OTLP_ENDPOINT").ok().filter(|s| !s.is_empty()),
            limits: LimitsConfig {
                max_records_per_dataset,
                max_body_bytes,
            },
        })
    }
}

fn limit_from_env(name: &str, default: usize) -> Result<usize, AppError> {
    match env::var(name) {
        Ok(raw) => raw.parse::<usize>().map_err(|e| {
            AppError::ConfigError(anyhow::anyhow!("{} must be a positive integer: {}", name, e))
        }),
        Err(_) => Ok(default),
    }
}
