use std::fs;
use std::path::Path;
use std::sync::Arc;

use anyhow::{anyhow, Context, Result};
use axum_server::tls_rustls::RustlsConfig;
use rustls::ServerConfig as RustlsServerConfig;
use rustls_pemfile::{certs, read_one, Item};
use rustls_pki_types::{CertificateDer, PrivateKeyDer};

use crate::config::TlsServerConfig;

/// Build the listener's TLS configuration from the configured PEM files.
///
/// Clients are not asked for certificates. ALPN advertises HTTP/1.1 only,
/// since WebSocket upgrades ride on it.
pub fn build_rustls_config(tls: &TlsServerConfig) -> Result<RustlsConfig> {
    let server = Arc::new(build_server_config(tls)?);
    Ok(RustlsConfig::from_config(server))
}

fn build_server_config(tls: &TlsServerConfig) -> Result<RustlsServerConfig> {
    let cert_path = tls
        .certificate_path
        .as_deref()
        .ok_or_else(|| anyhow!("security.tls.certificate_path must be set"))?;
    let key_path = tls
        .private_key_path
        .as_deref()
        .ok_or_else(|| anyhow!("security.tls.private_key_path must be set"))?;

    let cert_chain = load_cert_chain(Path::new(cert_path))?;
    let private_key = load_private_key(Path::new(key_path))?;

    let mut config = RustlsServerConfig::builder()
        .with_no_client_auth()
        .with_single_cert(cert_chain, private_key)
        .map_err(|err| anyhow!("invalid TLS certificate/private key pair: {err}"))?;

    config.alpn_protocols = vec![b"http/1.1".to_vec()];

    Ok(config)
}

fn load_cert_chain(path: &Path) -> Result<Vec<CertificateDer<'static>>> {
    let data = fs::read(path)
        .with_context(|| format!("failed to read TLS certificate chain at {}", path.display()))?;
    let mut reader = data.as_slice();
    let chain = certs(&mut reader)
        .collect::<Result<Vec<_>, _>>()
        .with_context(|| format!("failed to parse TLS certificate chain at {}", path.display()))?;

    if chain.is_empty() {
        anyhow::bail!("no certificates were found in {}", path.display());
    }

    Ok(chain)
}

/// First PKCS#8, PKCS#1 or SEC1 key in the file wins; other PEM sections are skipped.
fn load_private_key(path: &Path) -> Result<PrivateKeyDer<'static>> {
    let key_bytes = fs::read(path)
        .with_context(|| format!("failed to read TLS private key at {}", path.display()))?;

    let mut reader = key_bytes.as_slice();
    while let Some(item) = read_one(&mut reader)
        .with_context(|| format!("failed to parse PEM entry in {}", path.display()))?
    {
        match item {
            Item::Pkcs8Key(key) => return Ok(key.into()),
            Item::Pkcs1Key(key) => return Ok(key.into()),
            Item::Sec1Key(key) => return Ok(key.into()),
            _ => {}
        }
    }

    anyhow::bail!(
        "no supported private key (pkcs8/pkcs1/sec1) was found in {}",
        path.display()
    );
}
