//! Gateway config loader (strict parsing).

pub mod schema;

use std::fs;

use wsplex_core::error::{Result, WsPlexError};

pub use schema::{AuthSection, ConsumerSection, GatewayConfig, GatewaySection, LayerSection};

/// Environment variable overriding the config path.
pub const CONFIG_ENV: &str = "WSPLEX_CONFIG";
pub const DEFAULT_PATH: &str = "wsplex.yaml";

/// Config path from `WSPLEX_CONFIG`, falling back to `wsplex.yaml`.
pub fn path_from_env() -> String {
    std::env::var(CONFIG_ENV).unwrap_or_else(|_| DEFAULT_PATH.to_string())
}

pub fn load_from_file(path: &str) -> Result<GatewayConfig> {
    let s = fs::read_to_string(path)
        .map_err(|e| WsPlexError::Configuration(format!("read config {path} failed: {e}")))?;
    load_from_str(&s)
}

pub fn load_from_str(s: &str) -> Result<GatewayConfig> {
    let cfg: GatewayConfig = serde_yaml::from_str(s)
        .map_err(|e| WsPlexError::Configuration(format!("invalid yaml: {e}")))?;
    cfg.validate()?;
    Ok(cfg)
}
