//! # Traces Configuration
//!
//! The `tempo` section: trace pipelines. Two features of a trace instance
//! name entities owned by other sections:
//!
//! - `automatic_logging` with the `logs_instance` backend writes spans to a
//!   logs instance
//! - `spanmetrics` writes span metrics through a metrics instance
//!
//! Those names are checked by the cross-section validator once every
//! section applied its defaults.

use crate::error::SectionError;
use crate::sections::{Reference, Section, check_unique_names};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use tracing::warn;

/// Name of the section in the document.
pub const SECTION: &str = "tempo";

/// Automatic logging backend writing to a logs instance.
pub const BACKEND_LOGS_INSTANCE: &str = "logs_instance";
/// Automatic logging backend writing to the agent's stdout.
pub const BACKEND_STDOUT: &str = "stdout";
/// Deprecated name of [`BACKEND_LOGS_INSTANCE`].
pub const BACKEND_LOKI: &str = "loki";

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(default, deny_unknown_fields)]
pub struct TracesConfig {
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub configs: Vec<TracesInstance>
}

/// A trace pipeline.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct TracesInstance {
    pub name: String,
    /// Receiver settings, passed through to the trace processor untouched.
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub receivers: BTreeMap<String, serde_yaml::Value>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub remote_write: Vec<TracesRemoteWrite>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub automatic_logging: Option<AutomaticLoggingConfig>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub spanmetrics: Option<SpanMetricsConfig>
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct TracesRemoteWrite {
    pub endpoint: String,
    #[serde(default)]
    pub insecure: bool
}

/// Logs spans, roots and processes as log lines.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(default, deny_unknown_fields)]
pub struct AutomaticLoggingConfig {
    pub backend: String,
    pub logs_instance_name: String,
    /// Deprecated: use `logs_instance_name`.
    #[serde(skip_serializing_if = "String::is_empty")]
    pub loki_name: String,
    pub spans: bool,
    pub roots: bool,
    pub processes: bool
}

/// Generates metrics from spans and writes them through a metrics instance.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(default, deny_unknown_fields)]
pub struct SpanMetricsConfig {
    pub metrics_instance: String,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub dimensions: Vec<String>
}

impl AutomaticLoggingConfig {
    fn apply_defaults(&mut self, instance: &str) -> Result<(), SectionError> {
        match self.backend.as_str() {
            "" => self.backend = BACKEND_STDOUT.to_string(),
            BACKEND_LOKI => {
                warn!(
                    instance,
                    "DEPRECATION NOTICE: automatic_logging backend `loki` is deprecated in favor of \
                     `logs_instance`"
                );
                self.backend = BACKEND_LOGS_INSTANCE.to_string();
                if self.logs_instance_name.is_empty() {
                    self.logs_instance_name = std::mem::take(&mut self.loki_name);
                }
            }
            BACKEND_LOGS_INSTANCE | BACKEND_STDOUT => {}
            other => {
                return Err(SectionError::Invalid(format!(
                    "unknown automatic_logging backend {other} for tempo config {instance}"
                )));
            }
        }
        Ok(())
    }
}

impl Section for TracesConfig {
    fn name(&self) -> &'static str {
        SECTION
    }

    fn apply_defaults(&mut self) -> Result<(), SectionError> {
        check_unique_names(SECTION, self.configs.iter().map(|c| c.name.as_str()))?;

        for instance in &mut self.configs {
            if let Some(logging) = &mut instance.automatic_logging {
                logging.apply_defaults(&instance.name)?;
            }
        }
        Ok(())
    }

    fn references(&self) -> Vec<Reference> {
        let mut refs = Vec::new();
        for instance in &self.configs {
            if let Some(logging) = &instance.automatic_logging {
                if logging.backend == BACKEND_LOGS_INSTANCE {
                    refs.push(Reference {
                        feature: "automatic_logging",
                        owner: SECTION,
                        instance: instance.name.clone(),
                        target_subsystem: super::logs::SECTION,
                        target: logging.logs_instance_name.clone()
                    });
                }
            }
            if let Some(spanmetrics) = &instance.spanmetrics {
                refs.push(Reference {
                    feature: "spanmetrics",
                    owner: SECTION,
                    instance: instance.name.clone(),
                    target_subsystem: super::metrics::SECTION,
                    target: spanmetrics.metrics_instance.clone()
                });
            }
        }
        refs
    }
}
