//! # Server Configuration
//!
//! Settings of the agent's HTTP and gRPC servers. The servers themselves are
//! out of scope for this crate; their listen settings feed the cascade into
//! the metrics and integrations sections.

use crate::flags::{self, RegisterFlags};
use clap::{Arg, ArgAction, ArgMatches, Command};
use serde::{Deserialize, Serialize};
use std::time::Duration;
use strum::{AsRefStr, Display, EnumString};

/// Log level of the agent.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, Display, EnumString, AsRefStr,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum LogLevel {
    Debug,
    #[default]
    Info,
    Warn,
    Error
}

/// TLS settings of the HTTP server.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(default, deny_unknown_fields)]
pub struct TlsConfig {
    pub cert_file: String,
    pub key_file: String
}

impl TlsConfig {
    /// TLS is served only when both a certificate and a key are set.
    pub fn enabled(&self) -> bool {
        !self.cert_file.is_empty() && !self.key_file.is_empty()
    }
}

/// HTTP and gRPC server configuration.
///
/// ## Fields
/// - `http_listen_address` / `http_listen_port`: HTTP endpoint (default: all
///   interfaces, port 80)
/// - `grpc_listen_address` / `grpc_listen_port`: gRPC endpoint (default: all
///   interfaces, port 9095)
/// - `http_tls_config`: certificate and key of the HTTP server
/// - `graceful_shutdown_timeout`: time to drain servers (default: 30s)
/// - `register_instrumentation`: expose `/metrics` (default: true)
/// - `log_level`: agent log level (default: info)
/// - `metrics_namespace`: prefix of the agent's own metrics, not settable
///   from the document
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default, deny_unknown_fields)]
pub struct ServerConfig {
    pub http_listen_address: String,
    pub http_listen_port: u16,
    pub grpc_listen_address: String,
    pub grpc_listen_port: u16,
    pub http_tls_config: TlsConfig,
    #[serde(with = "humantime_serde")]
    pub graceful_shutdown_timeout: Duration,
    pub register_instrumentation: bool,
    pub log_level: LogLevel,
    #[serde(skip)]
    pub metrics_namespace: String
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            http_listen_address: String::new(),
            http_listen_port: 80,
            grpc_listen_address: String::new(),
            grpc_listen_port: 9095,
            http_tls_config: TlsConfig::default(),
            graceful_shutdown_timeout: Duration::from_secs(30),
            register_instrumentation: true,
            log_level: LogLevel::Info,
            metrics_namespace: "agent".to_string()
        }
    }
}

impl RegisterFlags for ServerConfig {
    fn register_flags(&self, cmd: Command) -> Command {
        cmd.arg(flags::string_flag(
            "server.http-listen-address",
            "HTTP server listen address.",
            self.http_listen_address.clone()
        ))
        .arg(flags::port_flag(
            "server.http-listen-port",
            "HTTP server listen port.",
            self.http_listen_port
        ))
        .arg(flags::string_flag(
            "server.grpc-listen-address",
            "gRPC server listen address.",
            self.grpc_listen_address.clone()
        ))
        .arg(flags::port_flag(
            "server.grpc-listen-port",
            "gRPC server listen port.",
            self.grpc_listen_port
        ))
        .arg(flags::string_flag(
            "server.http-tls-cert-path",
            "HTTP server certificate path.",
            self.http_tls_config.cert_file.clone()
        ))
        .arg(flags::string_flag(
            "server.http-tls-key-path",
            "HTTP server key path.",
            self.http_tls_config.key_file.clone()
        ))
        .arg(flags::duration_flag(
            "server.graceful-shutdown-timeout",
            "Timeout for graceful shutdowns.",
            self.graceful_shutdown_timeout
        ))
        .arg(flags::bool_flag(
            "server.register-instrumentation",
            "Register the instrumentation handlers (/metrics etc).",
            self.register_instrumentation
        ))
        .arg(
            Arg::new("log.level")
                .long("log.level")
                .help("Only log messages with the given severity or above. Valid levels: [debug, info, warn, error]")
                .value_name("level")
                .default_value(self.log_level.to_string())
                .value_parser(|s: &str| s.parse::<LogLevel>())
                .action(ArgAction::Set)
        )
    }

    fn apply_flags(&mut self, matches: &ArgMatches) {
        if let Some(v) = flags::explicit(matches, "server.http-listen-address") {
            self.http_listen_address = v;
        }
        if let Some(v) = flags::explicit(matches, "server.http-listen-port") {
            self.http_listen_port = v;
        }
        if let Some(v) = flags::explicit(matches, "server.grpc-listen-address") {
            self.grpc_listen_address = v;
        }
        if let Some(v) = flags::explicit(matches, "server.grpc-listen-port") {
            self.grpc_listen_port = v;
        }
        if let Some(v) = flags::explicit(matches, "server.http-tls-cert-path") {
            self.http_tls_config.cert_file = v;
        }
        if let Some(v) = flags::explicit(matches, "server.http-tls-key-path") {
            self.http_tls_config.key_file = v;
        }
        if let Some(v) = flags::explicit(matches, "server.graceful-shutdown-timeout") {
            self.graceful_shutdown_timeout = v;
        }
        if let Some(v) = flags::explicit(matches, "server.register-instrumentation") {
            self.register_instrumentation = v;
        }
        if let Some(v) = flags::explicit(matches, "log.level") {
            self.log_level = v;
        }
    }
}
