// order-service/src/config.rs

use crate::errors::{AppError, Result}; // Use AppError specific Result
use dotenvy::dotenv;
use order_core::StockPolicy;
use std::env;
use std::str::FromStr;

/// Where orders are kept.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StoreBackend {
  Postgres,
  /// Process-local store; contents are lost on restart.
  Memory,
}

impl FromStr for StoreBackend {
  type Err = AppError;

  fn from_str(s: &str) -> Result<Self> {
    match s.trim().to_ascii_lowercase().as_str() {
      "postgres" | "postgresql" => Ok(StoreBackend::Postgres),
      "memory" => Ok(StoreBackend::Memory),
      other => Err(AppError::Config(format!(
        "Invalid ORDER_STORE '{}': expected 'postgres' or 'memory'",
        other
      ))),
    }
  }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogFormat {
  Pretty,
  Json,
}

#[derive(Debug, Clone)]
pub struct AppConfig {
  pub server_host: String,
  pub server_port: u16,
  pub store_backend: StoreBackend,
  pub database_url: Option<String>,
  pub database_max_connections: u32,
  pub stock_policy: StockPolicy,
  pub log_format: LogFormat,

  // Insert demo products on startup
  pub seed_db: bool,
}

impl AppConfig {
  pub fn from_env() -> Result<Self> {
    dotenv().ok(); // Load .env file if present
    Self::from_lookup(|name| env::var(name).ok())
  }

  /// Builds the configuration from any variable source; `from_env` passes the process environment.
  pub fn from_lookup<F>(lookup: F) -> Result<Self>
  where
    F: Fn(&str) -> Option<String>,
  {
    let get_or = |name: &str, default: &str| lookup(name).unwrap_or_else(|| default.to_string());

    let server_host = get_or("SERVER_HOST", "127.0.0.1");
    let server_port = get_or("SERVER_PORT", "8080")
      .parse::<u16>()
      .map_err(|e| AppError::Config(format!("Invalid SERVER_PORT: {}", e)))?;

    let store_backend = get_or("ORDER_STORE", "postgres").parse::<StoreBackend>()?;
    let database_url = lookup("DATABASE_URL").filter(|url| !url.trim().is_empty());
    if store_backend == StoreBackend::Postgres && database_url.is_none() {
      return Err(AppError::Config(
        "Missing environment variable 'DATABASE_URL' (required when ORDER_STORE=postgres)".to_string(),
      ));
    }
    let database_max_connections = get_or("DATABASE_MAX_CONNECTIONS", "5")
      .parse::<u32>()
      .map_err(|e| AppError::Config(format!("Invalid DATABASE_MAX_CONNECTIONS: {}", e)))?;

    let stock_policy = get_or("STOCK_POLICY", "check_only")
      .parse::<StockPolicy>()
      .map_err(|e| AppError::Config(format!("Invalid STOCK_POLICY: {}", e)))?;

    let log_format = match get_or("LOG_FORMAT", "pretty").to_ascii_lowercase().as_str() {
      "json" => LogFormat::Json,
      "pretty" | "text" => LogFormat::Pretty,
      other => return Err(AppError::Config(format!("Invalid LOG_FORMAT: {}", other))),
    };

    let seed_db = get_or("SEED_DB", "false")
      .parse::<bool>()
      .map_err(|e| AppError::Config(format!("Invalid SEED_DB value: {}", e)))?;

    Ok(Self {
      server_host,
      server_port,
      store_backend,
      database_url,
      database_max_connections,
      stock_policy,
      log_format,
      seed_db,
    })
  }

  pub fn server_address(&self) -> String {
    format!("{}:{}", self.server_host, self.server_port)
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use std::collections::HashMap;

  fn config_from(vars: &[(&str, &str)]) -> Result<AppConfig> {
    let vars: HashMap<String, String> = vars.iter().map(|(k, v)| (k.to_string(), v.to_string())).collect();
    AppConfig::from_lookup(|name| vars.get(name).cloned())
  }

  #[test]
  fn defaults_apply_with_only_a_database_url() {
    let config = config_from(&[("DATABASE_URL", "postgres://localhost/orders")]).unwrap();
    assert_eq!(config.server_address(), "127.0.0.1:8080");
    assert_eq!(config.store_backend, StoreBackend::Postgres);
    assert_eq!(config.database_max_connections, 5);
    assert_eq!(config.stock_policy, StockPolicy::CheckOnly);
    assert_eq!(config.log_format, LogFormat::Pretty);
    assert!(!config.seed_db);
  }

  #[test]
  fn postgres_backend_requires_database_url() {
    assert!(matches!(config_from(&[]), Err(AppError::Config(_))));
  }

  #[test]
  fn memory_backend_needs_no_database() {
    let config = config_from(&[
      ("ORDER_STORE", "memory"),
      ("STOCK_POLICY", "reserve"),
      ("SERVER_PORT", "9090"),
      ("SEED_DB", "true"),
    ])
    .unwrap();
    assert_eq!(config.store_backend, StoreBackend::Memory);
    assert_eq!(config.stock_policy, StockPolicy::Reserve);
    assert_eq!(config.server_port, 9090);
    assert!(config.seed_db);
  }

  #[test]
  fn invalid_values_are_config_errors() {
    for vars in [
      vec![("ORDER_STORE", "memory"), ("SERVER_PORT", "eighty")],
      vec![("ORDER_STORE", "redis")],
      vec![("ORDER_STORE", "memory"), ("STOCK_POLICY", "hold")],
      vec![("ORDER_STORE", "memory"), ("SEED_DB", "maybe")],
      vec![("ORDER_STORE", "memory"), ("LOG_FORMAT", "xml")],
    ] {
      assert!(matches!(config_from(&vars), Err(AppError::Config(_))), "{:?}", vars);
    }
  }
}
