//! Configuration for the relay.
//!
//! Sources are layered as JSON documents (files, stdin, environment) over
//! compiled defaults, then individual fields may be overridden through
//! `SIGNAL_RELAY__*` variables. See [`loader::load`].
//!
//! # Module Structure
//!
//! - [`types`]: Root `Config` struct
//! - [`relay`]: Relay behaviour (status cadence, duplicates, limits)
//! - [`security`]: TLS material
//! - [`assets`]: Static file serving
//! - [`logging`]: Logging configuration
//! - [`loader`]: Configuration loading functions
//! - [`validation`]: Startup validation
//! - [`defaults`]: Default value functions

pub mod assets;
pub mod defaults;
pub mod loader;
pub mod logging;
pub mod relay;
pub mod security;
pub mod types;
pub mod validation;

pub use assets::AssetsConfig;

pub use loader::load;

pub use logging::{LogFormat, LogLevel, LoggingConfig};

pub use relay::RelayConfig;

pub use security::{SecurityConfig, TlsServerConfig};

pub use types::Config;

pub use validation::validate_config;

#[cfg(test)]
mod tests {
    use super::*;
    use crate::registry::DuplicatePolicy;

    #[test]
    fn test_config_defaults() {
        let config = Config::default();

        assert_eq!(config.host, "0.0.0.0");
        assert_eq!(config.port, 8443);

        assert_eq!(config.relay.status_interval_secs, 2);
        assert_eq!(config.relay.duplicate_policy, DuplicatePolicy::RejectNew);
        assert_eq!(config.relay.max_message_size, 65536);
        assert_eq!(config.relay.outbound_queue_capacity, 64);
        assert_eq!(config.relay.shutdown_grace_secs, 5);
        assert_eq!(config.relay.ping_interval_secs, 20);
        assert_eq!(config.relay.ping_timeout_secs, 20);

        assert_eq!(config.logging.dir, "logs");
        assert_eq!(config.logging.filename, "signal-relay.log");
        assert_eq!(config.logging.rotation, "daily");
        assert_eq!(config.logging.format, LogFormat::Json);

        assert!(config.security.tls.certificate_path.is_none());
        assert!(config.assets.www_path.is_none());
    }

    #[test]
    fn test_config_serialization() {
        let mut config = Config::default();
        config.relay.duplicate_policy = DuplicatePolicy::EvictExisting;
        config.security.tls.certificate_path = Some("cert.pem".to_string());

        let json = serde_json::to_string_pretty(&config).unwrap();
        let deserialized: Config = serde_json::from_str(&json).unwrap();

        assert_eq!(config.port, deserialized.port);
        assert_eq!(
            deserialized.relay.duplicate_policy,
            DuplicatePolicy::EvictExisting
        );
        assert_eq!(
            deserialized.security.tls.certificate_path.as_deref(),
            Some("cert.pem")
        );
    }

    #[test]
    fn test_partial_document_fills_defaults() {
        let config: Config = serde_json::from_str(r#"{"relay": {"max_message_size": 1024}}"#).unwrap();
        assert_eq!(config.relay.max_message_size, 1024);
        assert_eq!(config.relay.status_interval_secs, 2);
        assert_eq!(config.port, 8443);
    }

    #[test]
    fn test_log_level_display() {
        assert_eq!(LogLevel::Trace.to_string(), "trace");
        assert_eq!(LogLevel::Debug.to_string(), "debug");
        assert_eq!(LogLevel::Info.to_string(), "info");
        assert_eq!(LogLevel::Warn.to_string(), "warn");
        assert_eq!(LogLevel::Error.to_string(), "error");
    }
}
