//! # Integrations Configuration
//!
//! The `integrations` section configures the integrations manager and its
//! catalog of embedded exporters.
//!
//! The manager is a consumer in the cascade: it learns the agent's HTTP
//! endpoint, whether the server uses TLS, and the metrics global settings
//! from the other sections. Its remote write list falls back to the metrics
//! global remote write list only while it is empty.

pub mod blackbox;

use crate::cascade::Cascade;
use crate::error::SectionError;
use crate::sections::Section;
use crate::sections::metrics::GlobalConfig;
use crate::sections::remote_write::RemoteWriteConfig;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use validator::Validate;

pub use blackbox::BlackboxConfig;

/// Name of the section in the document.
pub const SECTION: &str = "integrations";

/// Integrations manager configuration.
///
/// ## Fields
/// - `scrape_integrations`: scrape every enabled integration (default: true)
/// - `use_hostname_label` / `replace_instance_label`: label rewriting of
///   integration metrics (default: true)
/// - `integration_restart_backoff`: delay before restarting a failed
///   integration (default: 5s)
/// - `prometheus_remote_write`: where integration metrics are sent; falls
///   back to the metrics global remote write list
/// - `agent`, `blackbox_exporter`: catalog entries
///
/// `listen_port`, `listen_host`, `server_using_tls` and
/// `prometheus_global_config` are not read from the document; the cascade
/// sets them.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default, deny_unknown_fields)]
pub struct IntegrationsConfig {
    pub scrape_integrations: bool,
    pub use_hostname_label: bool,
    pub replace_instance_label: bool,
    #[serde(with = "humantime_serde")]
    pub integration_restart_backoff: Duration,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub prometheus_remote_write: Vec<RemoteWriteConfig>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub agent: Option<CommonConfig>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub blackbox_exporter: Option<BlackboxConfig>,

    #[serde(skip)]
    pub listen_port: u16,
    #[serde(skip)]
    pub listen_host: String,
    #[serde(skip)]
    pub server_using_tls: bool,
    #[serde(skip)]
    pub prometheus_global_config: GlobalConfig
}

impl Default for IntegrationsConfig {
    fn default() -> Self {
        Self {
            scrape_integrations: true,
            use_hostname_label: true,
            replace_instance_label: true,
            integration_restart_backoff: Duration::from_secs(5),
            prometheus_remote_write: Vec::new(),
            agent: None,
            blackbox_exporter: None,
            listen_port: 0,
            listen_host: String::new(),
            server_using_tls: false,
            prometheus_global_config: GlobalConfig::default()
        }
    }
}

/// Settings every integration understands. The `agent` integration, which
/// scrapes the agent's own metrics, has no other settings.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(default, deny_unknown_fields)]
pub struct CommonConfig {
    pub enabled: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub instance: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub scrape_integration: Option<bool>,
    #[serde(with = "humantime_serde", skip_serializing_if = "Option::is_none")]
    pub scrape_interval: Option<Duration>,
    #[serde(with = "humantime_serde", skip_serializing_if = "Option::is_none")]
    pub scrape_timeout: Option<Duration>
}

impl CommonConfig {
    /// Fill unset scrape settings from the metrics global config.
    fn apply_defaults(&mut self, name: &str, global: &GlobalConfig) -> Result<(), SectionError> {
        let interval = *self.scrape_interval.get_or_insert(global.scrape_interval);
        let timeout = *self.scrape_timeout.get_or_insert(global.scrape_timeout);
        if timeout > interval {
            return Err(SectionError::Invalid(format!(
                "integration {name}: scrape timeout {} greater than scrape interval {}",
                humantime::format_duration(timeout),
                humantime::format_duration(interval)
            )));
        }
        Ok(())
    }
}

impl IntegrationsConfig {
    /// Catalog entries present in the document, by integration name.
    pub fn catalog_mut(&mut self) -> Vec<(&'static str, &mut CommonConfig)> {
        let mut entries = Vec::new();
        if let Some(agent) = &mut self.agent {
            entries.push(("agent", agent));
        }
        if let Some(blackbox) = &mut self.blackbox_exporter {
            entries.push((blackbox::NAME, &mut blackbox.common));
        }
        entries
    }

    /// Whether any catalog entry is enabled.
    pub fn any_enabled(&self) -> bool {
        self.agent.as_ref().is_some_and(|a| a.enabled)
            || self
                .blackbox_exporter
                .as_ref()
                .is_some_and(|b| b.common.enabled)
    }
}

impl Section for IntegrationsConfig {
    fn name(&self) -> &'static str {
        SECTION
    }

    fn apply_defaults(&mut self) -> Result<(), SectionError> {
        for rw in &self.prometheus_remote_write {
            rw.validate()?;
        }

        let global = self.prometheus_global_config.clone();
        for (name, common) in self.catalog_mut() {
            common.apply_defaults(name, &global)?;
        }

        if let Some(blackbox) = &mut self.blackbox_exporter {
            blackbox.apply_defaults()?;
        }
        Ok(())
    }

    fn inherit(&mut self, cascade: &Cascade) {
        self.listen_port = cascade.http_listen_port;
        self.listen_host.clone_from(&cascade.http_listen_address);
        self.server_using_tls = cascade.server_using_tls;

        if self.prometheus_remote_write.is_empty() {
            self.prometheus_remote_write
                .clone_from(&cascade.global.remote_write);
        }
        self.prometheus_global_config.clone_from(&cascade.global);
    }
}
