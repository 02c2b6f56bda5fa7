#![cfg_attr(not(test), deny(clippy::panic))]

use anyhow::Context;
use clap::Parser;
use signal_relay::config::{self, Config, LogLevel};
use signal_relay::server::{listen_for_interrupt, RelayServer, RelayServerConfig, ShutdownFlag};
use signal_relay::{assets, logging, security, websocket};
use std::net::{IpAddr, SocketAddr};
use std::time::Duration;

/// Signal Relay -- WebSocket signaling relay for peer-to-peer session setup
#[derive(Parser, Debug)]
#[command(name = "signal-relay")]
#[command(about = "A TLS WebSocket relay that forwards signaling envelopes between peers")]
#[command(version)]
struct Cli {
    /// Validate configuration and exit without starting the relay.
    #[arg(long, short = 'c', conflicts_with = "print_config")]
    validate_config: bool,

    /// Print the loaded configuration to stdout (as JSON) and exit.
    #[arg(long, conflicts_with = "validate_config")]
    print_config: bool,

    /// Address to listen on
    #[arg(long)]
    host: Option<String>,

    /// Port to listen on
    #[arg(long, short = 'p')]
    port: Option<u16>,

    /// PEM certificate chain
    #[arg(long)]
    cert_file: Option<String>,

    /// PEM private key
    #[arg(long)]
    key_file: Option<String>,

    /// Directory served for non-relay paths
    #[arg(long)]
    www_path: Option<String>,

    /// Log at debug level
    #[arg(long, short = 'v')]
    verbose: bool,
}

impl Cli {
    fn apply_overrides(&self, cfg: &mut Config) {
        if let Some(host) = &self.host {
            cfg.host.clone_from(host);
        }
        if let Some(port) = self.port {
            cfg.port = port;
        }
        if let Some(cert) = &self.cert_file {
            cfg.security.tls.certificate_path = Some(cert.clone());
        }
        if let Some(key) = &self.key_file {
            cfg.security.tls.private_key_path = Some(key.clone());
        }
        if let Some(www) = &self.www_path {
            cfg.assets.www_path = Some(www.clone());
        }
        if self.verbose {
            cfg.logging.level = Some(LogLevel::Debug);
        }
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let mut cfg = config::load();
    cli.apply_overrides(&mut cfg);

    if cli.print_config {
        let json = serde_json::to_string_pretty(&cfg)
            .map_err(|e| anyhow::anyhow!("Failed to serialize config: {e}"))?;
        println!("{json}");
        return Ok(());
    }

    let validation_result = config::validate_config(&cfg);

    if cli.validate_config {
        match validation_result {
            Ok(()) => {
                println!("Configuration validation passed");
                println!();
                println!("Configuration summary:");
                println!("  Listen: {}:{}", cfg.host, cfg.port);
                println!("  Status interval: {}s", cfg.relay.status_interval_secs);
                println!("  Duplicate policy: {:?}", cfg.relay.duplicate_policy);
                println!("  Max message size: {}", cfg.relay.max_message_size);
                println!(
                    "  Static assets: {}",
                    cfg.assets.www_path.as_deref().unwrap_or("disabled")
                );
                return Ok(());
            }
            Err(e) => {
                eprintln!("Configuration validation failed:\n{e}");
                std::process::exit(1);
            }
        }
    }

    validation_result?;

    let _log_guard = logging::init_with_config(&cfg.logging);

    let ip: IpAddr = cfg
        .host
        .parse()
        .with_context(|| format!("invalid listen host '{}'", cfg.host))?;
    let addr = SocketAddr::new(ip, cfg.port);

    let tls_config = security::build_rustls_config(&cfg.security.tls)
        .context("failed to initialize TLS configuration")?;

    let shutdown = ShutdownFlag::new();
    let server = RelayServer::new(RelayServerConfig::from(&cfg.relay), shutdown.clone());

    let mut router = websocket::create_router();
    if let Some(www) = &cfg.assets.www_path {
        router = router.fallback_service(assets::router(www));
    }
    let make_service = router
        .with_state(server.clone())
        .into_make_service_with_connect_info::<SocketAddr>();

    tokio::spawn(listen_for_interrupt(shutdown));

    let handle = axum_server::Handle::new();
    let grace = Duration::from_secs(cfg.relay.shutdown_grace_secs);
    let status_server = server.clone();
    let status_handle = handle.clone();
    tokio::spawn(async move {
        status_server.status_task().await;
        tracing::info!(grace_secs = grace.as_secs(), "Shutting down");
        status_handle.graceful_shutdown(Some(grace));
    });

    tracing::info!(
        %addr,
        www_path = cfg.assets.www_path.as_deref().unwrap_or("-"),
        "Relay listening over TLS - WebSocket: /websocket/{{peer_id}}, Metrics: /metrics"
    );

    axum_server::bind_rustls(addr, tls_config)
        .handle(handle)
        .serve(make_service)
        .await?;

    tracing::info!("Relay stopped");
    Ok(())
}
