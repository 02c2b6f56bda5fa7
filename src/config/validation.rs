//! Configuration validation functions.

use super::Config;
use std::path::Path;

/// Reject configurations the relay cannot start with.
///
/// TLS material is mandatory: both paths must be set and point at existing files.
pub fn validate_config(config: &Config) -> anyhow::Result<()> {
    let tls = &config.security.tls;
    let cert_path = required_path(
        tls.certificate_path.as_deref(),
        "security.tls.certificate_path",
    )?;
    if !Path::new(cert_path).is_file() {
        anyhow::bail!("TLS certificate file not found at {cert_path}");
    }

    let key_path = required_path(
        tls.private_key_path.as_deref(),
        "security.tls.private_key_path",
    )?;
    if !Path::new(key_path).is_file() {
        anyhow::bail!("TLS private key file not found at {key_path}");
    }

    let relay = &config.relay;
    if relay.status_interval_secs == 0 {
        anyhow::bail!("relay.status_interval_secs must be at least 1");
    }
    if relay.outbound_queue_capacity == 0 {
        anyhow::bail!("relay.outbound_queue_capacity must be at least 1");
    }
    if relay.ping_interval_secs == 0 || relay.ping_timeout_secs == 0 {
        anyhow::bail!("relay.ping_interval_secs and relay.ping_timeout_secs must be at least 1");
    }
    if relay.max_message_size == 0 {
        anyhow::bail!("relay.max_message_size must be greater than 0");
    }

    if let Some(www) = config.assets.www_path.as_deref() {
        if !Path::new(www).is_dir() {
            anyhow::bail!("assets.www_path '{www}' is not a directory");
        }
    }

    Ok(())
}

fn required_path<'a>(value: Option<&'a str>, field: &str) -> anyhow::Result<&'a str> {
    value
        .map(str::trim)
        .filter(|p| !p.is_empty())
        .ok_or_else(|| anyhow::anyhow!("{field} must be provided; the relay only serves TLS"))
}
