/// Transport security for the listener.
pub mod tls;

pub use tls::build_rustls_config;
