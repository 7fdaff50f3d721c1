//! # Logs Configuration
//!
//! The `logs` section (formerly `loki`): log shipping instances, each with
//! its own positions file and push clients.

use crate::error::SectionError;
use crate::sections::{Section, check_unique_names};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use validator::Validate;

/// Name of the section in the document.
pub const SECTION: &str = "logs";

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(default, deny_unknown_fields)]
pub struct LogsConfig {
    /// Directory used for positions files of instances that do not set one.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub positions_directory: Option<PathBuf>,
    pub configs: Vec<LogsInstance>
}

/// A log shipping instance.
#[derive(Debug, Clone, Serialize, Deserialize, Validate, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct LogsInstance {
    pub name: String,
    #[serde(default)]
    pub positions: PositionsConfig,
    #[serde(default)]
    #[validate(length(min = 1, message = "at least one client is required"))]
    pub clients: Vec<ClientConfig>,
    /// Scrape jobs, passed through to the shipper untouched.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub scrape_configs: Vec<serde_yaml::Value>
}

/// Where an instance records how far it has read each file.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(default, deny_unknown_fields)]
pub struct PositionsConfig {
    pub filename: PathBuf
}

/// A push endpoint for log entries.
#[derive(Debug, Clone, Serialize, Deserialize, Validate, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct ClientConfig {
    #[validate(url)]
    pub url: String
}

impl LogsConfig {
    /// Find an instance by name.
    pub fn instance(&self, name: &str) -> Option<&LogsInstance> {
        self.configs.iter().find(|c| c.name == name)
    }
}

impl Section for LogsConfig {
    fn name(&self) -> &'static str {
        SECTION
    }

    fn apply_defaults(&mut self) -> Result<(), SectionError> {
        check_unique_names(SECTION, self.configs.iter().map(|c| c.name.as_str()))?;

        for instance in &mut self.configs {
            instance.validate()?;
            for client in &instance.clients {
                client.validate()?;
            }

            if instance.positions.filename.as_os_str().is_empty() {
                let Some(dir) = &self.positions_directory else {
                    return Err(SectionError::Invalid(format!(
                        "could not generate a positions file for logs config {}: \
                         positions_directory is unset",
                        instance.name
                    )));
                };
                instance.positions.filename = dir.join(format!("{}.yml", instance.name));
            }
        }

        Ok(())
    }

    fn entity_names(&self) -> Vec<&str> {
        self.configs.iter().map(|c| c.name.as_str()).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::decode::decode_yaml;

    #[test]
    fn test_logs_positions_from_directory() {
        let mut logs: LogsConfig = decode_yaml(
            r#"
positions_directory: /var/lib/agent
configs:
  - name: default
    clients:
      - url: http://loki:3100/loki/api/v1/push
  - name: explicit
    positions:
      filename: /tmp/positions.yaml
    clients:
      - url: http://loki:3100/loki/api/v1/push
"#
        )
        .unwrap();
        logs.apply_defaults().unwrap();

        assert_eq!(
            logs.configs[0].positions.filename,
            PathBuf::from("/var/lib/agent/default.yml")
        );
        assert_eq!(
            logs.configs[1].positions.filename,
            PathBuf::from("/tmp/positions.yaml")
        );
        assert_eq!(logs.entity_names(), vec!["default", "explicit"]);
    }

    #[test]
    fn test_logs_missing_positions() {
        let mut logs: LogsConfig = decode_yaml(
            r#"
configs:
  - name: default
    clients:
      - url: http://loki:3100/loki/api/v1/push
"#
        )
        .unwrap();
        let err = logs.apply_defaults().unwrap_err();
        assert_eq!(
            err.to_string(),
            "could not generate a positions file for logs config default: positions_directory is \
             unset"
        );
    }

    #[test]
    fn test_logs_duplicate_names() {
        let mut logs: LogsConfig = decode_yaml(
            r#"
positions_directory: /tmp
configs:
  - name: a
    clients: [{url: "http://loki:3100/loki/api/v1/push"}]
  - name: a
    clients: [{url: "http://loki:3100/loki/api/v1/push"}]
"#
        )
        .unwrap();
        let err = logs.apply_defaults().unwrap_err();
        assert_eq!(err.to_string(), "found multiple logs configs with name a");
    }

    #[test]
    fn test_logs_requires_client() {
        let mut logs: LogsConfig =
            decode_yaml("positions_directory: /tmp\nconfigs:\n  - name: a\n").unwrap();
        assert!(matches!(
            logs.apply_defaults(),
            Err(SectionError::Validation(_))
        ));
    }

    #[test]
    fn test_logs_invalid_client_url() {
        let mut logs: LogsConfig = decode_yaml(
            "positions_directory: /tmp\nconfigs:\n  - name: a\n    clients:\n      - url: nope\n"
        )
        .unwrap();
        assert!(matches!(
            logs.apply_defaults(),
            Err(SectionError::Validation(_))
        ));
    }

    #[test]
    fn test_logs_unknown_field() {
        let result: Result<LogsConfig, _> =
            decode_yaml("configs:\n  - name: a\n    positons:\n      filename: /tmp/p.yml\n");
        assert!(result.is_err());
    }
}
