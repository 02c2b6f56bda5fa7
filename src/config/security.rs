//! Transport security configuration.

use serde::{Deserialize, Serialize};

/// Security configuration.
#[derive(Debug, Deserialize, Serialize, Clone, Default)]
pub struct SecurityConfig {
    /// TLS material for the listener. The relay never serves plaintext.
    #[serde(default)]
    pub tls: TlsServerConfig,
}

/// TLS server configuration.
#[derive(Debug, Deserialize, Serialize, Clone, Default)]
pub struct TlsServerConfig {
    /// Path to the PEM-encoded certificate chain presented to clients.
    #[serde(default)]
    pub certificate_path: Option<String>,
    /// Path to the PEM-encoded private key corresponding to the certificate chain.
    #[serde(default)]
    pub private_key_path: Option<String>,
}
