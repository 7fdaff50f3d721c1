//! # Cascade
//!
//! Values resolved by producer sections (and the server config) that other
//! sections inherit. A cascade is collected once, after producers applied
//! their defaults, and handed to every section through
//! [`Section::inherit`](crate::sections::Section::inherit).

use crate::sections::metrics::{GlobalConfig, MetricsConfig};
use crate::sections::server::ServerConfig;

#[derive(Debug, Clone, Default, PartialEq)]
pub struct Cascade {
    pub grpc_listen_port: u16,
    pub http_listen_port: u16,
    pub http_listen_address: String,
    /// True when the HTTP server has both a certificate and a key.
    pub server_using_tls: bool,
    /// Resolved metrics global config, including its remote write list.
    pub global: GlobalConfig
}

impl Cascade {
    pub fn collect(server: &ServerConfig, metrics: &MetricsConfig) -> Self {
        Self {
            grpc_listen_port: server.grpc_listen_port,
            http_listen_port: server.http_listen_port,
            http_listen_address: server.http_listen_address.clone(),
            server_using_tls: server.http_tls_config.enabled(),
            global: metrics.global.clone()
        }
    }
}
