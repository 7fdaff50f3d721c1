//! Configuration of the embedded blackbox exporter integration.
//!
//! Only the settings are handled here; probing is done by the exporter.

use super::CommonConfig;
use crate::error::SectionError;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::time::Duration;

/// Name of the integration in the catalog.
pub const NAME: &str = "blackbox_exporter";

/// Probers the exporter knows about.
pub const PROBERS: &[&str] = &["http", "tcp", "icmp", "dns"];

/// Module used when the document defines none.
pub const DEFAULT_MODULE: &str = "http_2xx";

/// Blackbox exporter settings.
///
/// In the document the common integration settings sit next to `modules`
/// and `targets`.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(from = "BlackboxDocument", into = "BlackboxDocument")]
pub struct BlackboxConfig {
    pub common: CommonConfig,
    pub modules: BTreeMap<String, Module>,
    pub targets: Vec<Target>
}

/// How a target is probed.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct Module {
    pub prober: String,
    #[serde(default = "default_probe_timeout", with = "humantime_serde")]
    pub timeout: Duration
}

fn default_probe_timeout() -> Duration {
    Duration::from_secs(5)
}

/// A probed endpoint and the module used to probe it.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct Target {
    pub name: String,
    pub address: String,
    pub module: String,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub labels: BTreeMap<String, String>
}

/// Flat document layout of [`BlackboxConfig`].
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
struct BlackboxDocument {
    enabled: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    instance: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    scrape_integration: Option<bool>,
    #[serde(with = "humantime_serde", skip_serializing_if = "Option::is_none")]
    scrape_interval: Option<Duration>,
    #[serde(with = "humantime_serde", skip_serializing_if = "Option::is_none")]
    scrape_timeout: Option<Duration>,
    modules: BTreeMap<String, Module>,
    targets: Vec<Target>
}

impl From<BlackboxDocument> for BlackboxConfig {
    fn from(doc: BlackboxDocument) -> Self {
        Self {
            common: CommonConfig {
                enabled: doc.enabled,
                instance: doc.instance,
                scrape_integration: doc.scrape_integration,
                scrape_interval: doc.scrape_interval,
                scrape_timeout: doc.scrape_timeout
            },
            modules: doc.modules,
            targets: doc.targets
        }
    }
}

impl From<BlackboxConfig> for BlackboxDocument {
    fn from(config: BlackboxConfig) -> Self {
        Self {
            enabled: config.common.enabled,
            instance: config.common.instance,
            scrape_integration: config.common.scrape_integration,
            scrape_interval: config.common.scrape_interval,
            scrape_timeout: config.common.scrape_timeout,
            modules: config.modules,
            targets: config.targets
        }
    }
}

impl BlackboxConfig {
    pub(super) fn apply_defaults(&mut self) -> Result<(), SectionError> {
        if self.modules.is_empty() {
            self.modules.insert(
                DEFAULT_MODULE.to_string(),
                Module {
                    prober: "http".to_string(),
                    timeout: default_probe_timeout()
                }
            );
        }

        for (name, module) in &self.modules {
            if !PROBERS.contains(&module.prober.as_str()) {
                return Err(SectionError::Invalid(format!(
                    "{NAME}: module {name} uses unknown prober {}",
                    module.prober
                )));
            }
        }

        for target in &self.targets {
            if !self.modules.contains_key(&target.module) {
                return Err(SectionError::Invalid(format!(
                    "{NAME}: target {} references undefined module {}",
                    target.name, target.module
                )));
            }
        }
        Ok(())
    }
}
