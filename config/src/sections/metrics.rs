//! # Metrics Configuration
//!
//! The `prometheus` section: global scrape settings, the write-ahead log,
//! the clustered scraping service and the list of scrape instances.
//!
//! The metrics section is a producer in the cascade: its resolved global
//! settings seed the integrations section.

use crate::cascade::Cascade;
use crate::error::SectionError;
use crate::flags::{self, RegisterFlags};
use crate::sections::remote_write::RemoteWriteConfig;
use crate::sections::{Section, check_unique_names};
use clap::{ArgMatches, Command};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::PathBuf;
use std::time::Duration;
use validator::Validate;

/// Name of the section in the document.
pub const SECTION: &str = "prometheus";

/// Metrics subsystem configuration.
///
/// ## Fields
/// - `wal_directory`: base directory of the write-ahead log, required once
///   `configs` is not empty
/// - `wal_cleanup_age`: age of abandoned WALs eligible for removal
///   (default: 12h)
/// - `wal_cleanup_period`: interval between WAL cleanups (default: 30m)
/// - `global`: settings shared by every instance
/// - `scraping_service`: clustered scraping mode
/// - `configs`: scrape instances
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default, deny_unknown_fields)]
pub struct MetricsConfig {
    pub wal_directory: PathBuf,
    #[serde(with = "humantime_serde")]
    pub wal_cleanup_age: Duration,
    #[serde(with = "humantime_serde")]
    pub wal_cleanup_period: Duration,
    pub global: GlobalConfig,
    pub scraping_service: ScrapingServiceConfig,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub configs: Vec<InstanceConfig>
}

impl Default for MetricsConfig {
    fn default() -> Self {
        Self {
            wal_directory: PathBuf::new(),
            wal_cleanup_age: Duration::from_secs(12 * 60 * 60),
            wal_cleanup_period: Duration::from_secs(30 * 60),
            global: GlobalConfig::default(),
            scraping_service: ScrapingServiceConfig::default(),
            configs: Vec::new()
        }
    }
}

/// Settings shared by every metrics instance.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default, deny_unknown_fields)]
pub struct GlobalConfig {
    #[serde(with = "humantime_serde")]
    pub scrape_interval: Duration,
    #[serde(with = "humantime_serde")]
    pub scrape_timeout: Duration,
    #[serde(with = "humantime_serde")]
    pub evaluation_interval: Duration,
    #[serde(skip_serializing_if = "BTreeMap::is_empty")]
    pub external_labels: BTreeMap<String, String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub remote_write: Vec<RemoteWriteConfig>
}

impl Default for GlobalConfig {
    fn default() -> Self {
        Self {
            scrape_interval: Duration::from_secs(60),
            scrape_timeout: Duration::from_secs(10),
            evaluation_interval: Duration::from_secs(60),
            external_labels: BTreeMap::new(),
            remote_write: Vec::new()
        }
    }
}

/// Clustered scraping mode, where instances are sharded across agents.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default, deny_unknown_fields)]
pub struct ScrapingServiceConfig {
    pub enabled: bool,
    #[serde(with = "humantime_serde")]
    pub reshard_interval: Duration,
    pub lifecycler: LifecyclerConfig
}

impl Default for ScrapingServiceConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            reshard_interval: Duration::from_secs(60),
            lifecycler: LifecyclerConfig::default()
        }
    }
}

/// Ring membership settings of the scraping service.
///
/// `listen_port` is not read from the document; it is the gRPC listen port
/// of the server, copied in by the cascade.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default, deny_unknown_fields)]
pub struct LifecyclerConfig {
    pub num_tokens: u32,
    #[serde(with = "humantime_serde")]
    pub heartbeat_period: Duration,
    pub interface_names: Vec<String>,
    #[serde(skip)]
    pub listen_port: u16
}

impl Default for LifecyclerConfig {
    fn default() -> Self {
        Self {
            num_tokens: 128,
            heartbeat_period: Duration::from_secs(5),
            interface_names: vec!["eth0".to_string(), "en0".to_string()],
            listen_port: 0
        }
    }
}

/// A metrics instance: a set of scrape jobs with their own WAL and remote
/// write destinations.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct InstanceConfig {
    pub name: String,
    #[serde(default)]
    pub host_filter: bool,
    #[serde(
        default,
        with = "humantime_serde",
        skip_serializing_if = "Option::is_none"
    )]
    pub wal_truncate_frequency: Option<Duration>,
    #[serde(
        default,
        with = "humantime_serde",
        skip_serializing_if = "Option::is_none"
    )]
    pub remote_flush_deadline: Option<Duration>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub remote_write: Vec<RemoteWriteConfig>,
    /// Scrape jobs, passed through to the scraper untouched.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub scrape_configs: Vec<serde_yaml::Value>
}

const DEFAULT_WAL_TRUNCATE_FREQUENCY: Duration = Duration::from_secs(60);
const DEFAULT_REMOTE_FLUSH_DEADLINE: Duration = Duration::from_secs(60);

impl InstanceConfig {
    fn apply_defaults(&mut self) -> Result<(), SectionError> {
        self.wal_truncate_frequency
            .get_or_insert(DEFAULT_WAL_TRUNCATE_FREQUENCY);
        self.remote_flush_deadline
            .get_or_insert(DEFAULT_REMOTE_FLUSH_DEADLINE);

        for rw in &self.remote_write {
            rw.validate()?;
        }
        Ok(())
    }
}

impl Section for MetricsConfig {
    fn name(&self) -> &'static str {
        SECTION
    }

    fn apply_defaults(&mut self) -> Result<(), SectionError> {
        if self.global.scrape_timeout > self.global.scrape_interval {
            return Err(SectionError::Invalid(format!(
                "global scrape timeout {} greater than scrape interval {}",
                humantime::format_duration(self.global.scrape_timeout),
                humantime::format_duration(self.global.scrape_interval)
            )));
        }
        for rw in &self.global.remote_write {
            rw.validate()?;
        }

        if !self.configs.is_empty() && self.wal_directory.as_os_str().is_empty() {
            return Err(SectionError::Invalid(
                "no wal_directory configured".to_string()
            ));
        }

        check_unique_names("instance", self.configs.iter().map(|c| c.name.as_str()))?;
        for instance in &mut self.configs {
            instance.apply_defaults()?;
        }

        Ok(())
    }

    fn inherit(&mut self, cascade: &Cascade) {
        self.scraping_service.lifecycler.listen_port = cascade.grpc_listen_port;
    }

    fn entity_names(&self) -> Vec<&str> {
        self.configs.iter().map(|c| c.name.as_str()).collect()
    }
}

impl RegisterFlags for MetricsConfig {
    fn register_flags(&self, cmd: Command) -> Command {
        cmd.arg(flags::string_flag(
            "prometheus.wal-directory",
            "base directory to store the WAL in",
            self.wal_directory.display().to_string()
        ))
        .arg(flags::duration_flag(
            "prometheus.wal-cleanup-age",
            "remove abandoned (unused) WALs older than this",
            self.wal_cleanup_age
        ))
        .arg(flags::duration_flag(
            "prometheus.wal-cleanup-period",
            "how often to check for abandoned WALs",
            self.wal_cleanup_period
        ))
    }

    fn apply_flags(&mut self, matches: &ArgMatches) {
        if let Some(v) = flags::explicit::<String>(matches, "prometheus.wal-directory") {
            self.wal_directory = PathBuf::from(v);
        }
        if let Some(v) = flags::explicit(matches, "prometheus.wal-cleanup-age") {
            self.wal_cleanup_age = v;
        }
        if let Some(v) = flags::explicit(matches, "prometheus.wal-cleanup-period") {
            self.wal_cleanup_period = v;
        }
    }
}
