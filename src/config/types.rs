//! Root configuration types.

use super::assets::AssetsConfig;
use super::defaults::{default_host, default_port};
use super::logging::LoggingConfig;
use super::relay::RelayConfig;
use super::security::SecurityConfig;
use serde::{Deserialize, Serialize};

/// Root configuration struct for the relay.
#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct Config {
    #[serde(default = "default_host")]
    pub host: String,
    #[serde(default = "default_port")]
    pub port: u16,
    #[serde(default)]
    pub relay: RelayConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
    #[serde(default)]
    pub security: SecurityConfig,
    #[serde(default)]
    pub assets: AssetsConfig,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            relay: RelayConfig::default(),
            logging: LoggingConfig::default(),
            security: SecurityConfig::default(),
            assets: AssetsConfig::default(),
        }
    }
}
