//! # Configuration Tree
//!
//! The agent's configuration: one section per subsystem plus a few
//! agent-wide settings that only come from flags.
//!
//! [`Config::default`] holds the compiled defaults. Every resolution starts
//! from a fresh copy of them, so resolving twice gives equal trees.

use crate::cascade::Cascade;
use crate::error::ResolveError;
use crate::flags::{self, RegisterFlags};
use crate::loader::Stage;
use crate::migration;
use crate::sections::Section;
use crate::sections::integrations::IntegrationsConfig;
use crate::sections::logs::LogsConfig;
use crate::sections::metrics::MetricsConfig;
use crate::sections::server::ServerConfig;
use crate::sections::traces::TracesConfig;
use crate::validator::validate_references;
use clap::{ArgMatches, Command};
use serde::{Deserialize, Serialize};
use tracing::debug;

/// Default address of the reload listener.
pub const DEFAULT_RELOAD_ADDRESS: &str = "127.0.0.1";

/// Top-level agent configuration.
///
/// ## Fields
/// - `server`: HTTP and gRPC servers
/// - `metrics` (`prometheus` in the document): metrics subsystem
/// - `integrations`: integrations manager
/// - `traces` (`tempo` in the document): trace pipelines
/// - `logs`: log shipping, absent unless configured
/// - `loki`: deprecated name of `logs`, moved into `logs` while resolving
///
/// `used_deprecated_loki`, `reload_address` and `reload_port` are not read
/// from the document. A `reload_port` of 0 disables the reload listener.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default, deny_unknown_fields)]
pub struct Config {
    pub server: ServerConfig,
    #[serde(rename = "prometheus")]
    pub metrics: MetricsConfig,
    pub integrations: IntegrationsConfig,
    #[serde(rename = "tempo")]
    pub traces: TracesConfig,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub logs: Option<LogsConfig>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub loki: Option<LogsConfig>,

    #[serde(skip)]
    pub used_deprecated_loki: bool,
    #[serde(skip)]
    pub reload_address: String,
    #[serde(skip)]
    pub reload_port: u16
}

impl Default for Config {
    fn default() -> Self {
        Self {
            server: ServerConfig::default(),
            metrics: MetricsConfig::default(),
            integrations: IntegrationsConfig::default(),
            traces: TracesConfig::default(),
            logs: None,
            loki: None,
            used_deprecated_loki: false,
            reload_address: DEFAULT_RELOAD_ADDRESS.to_string(),
            reload_port: 0
        }
    }
}

impl Config {
    /// Resolve the tree once the document and flags are merged.
    ///
    /// Deprecated aliases are migrated, producer sections apply their
    /// defaults, the cascade is handed to every section, consumer sections
    /// apply their defaults and finally cross-section references are
    /// checked. Errors raised by a section are returned unchanged.
    pub fn apply_defaults(&mut self) -> Result<(), ResolveError> {
        migration::migrate_aliases(self)?;
        debug!(stage = %Stage::Migrated, "deprecated aliases migrated");

        for section in self.producers_mut() {
            section.apply_defaults()?;
        }

        let cascade = Cascade::collect(&self.server, &self.metrics);
        for section in self.sections_mut() {
            section.inherit(&cascade);
        }
        for section in self.consumers_mut() {
            section.apply_defaults()?;
        }
        debug!(stage = %Stage::CascadeApplied, "section defaults applied");

        validate_references(self)?;
        debug!(stage = %Stage::Validated, "cross-section references validated");
        Ok(())
    }

    /// Log a notice for every deprecated name the document used.
    pub fn log_deprecations(&self) {
        migration::log_deprecations(self);
    }

    /// Every section present in the tree, producers first.
    pub fn sections(&self) -> Vec<&dyn Section> {
        let mut sections: Vec<&dyn Section> = vec![&self.metrics as &dyn Section];
        if let Some(logs) = &self.logs {
            sections.push(logs);
        }
        sections.push(&self.traces);
        sections.push(&self.integrations);
        sections
    }

    /// Sections whose resolved values feed the cascade.
    fn producers_mut(&mut self) -> Vec<&mut dyn Section> {
        vec![&mut self.metrics as &mut dyn Section]
    }

    /// Sections resolved after the cascade, in resolution order.
    fn consumers_mut(&mut self) -> Vec<&mut dyn Section> {
        let mut sections: Vec<&mut dyn Section> = Vec::new();
        if let Some(logs) = &mut self.logs {
            sections.push(logs);
        }
        sections.push(&mut self.traces);
        sections.push(&mut self.integrations);
        sections
    }

    fn sections_mut(&mut self) -> Vec<&mut dyn Section> {
        let mut sections: Vec<&mut dyn Section> = vec![&mut self.metrics as &mut dyn Section];
        if let Some(logs) = &mut self.logs {
            sections.push(logs);
        }
        sections.push(&mut self.traces);
        sections.push(&mut self.integrations);
        sections
    }
}

impl RegisterFlags for Config {
    fn register_flags(&self, cmd: Command) -> Command {
        let cmd = cmd
            .arg(flags::string_flag(
                "reload-addr",
                "address the reload endpoint listens on",
                self.reload_address.clone()
            ))
            .arg(flags::port_flag(
                "reload-port",
                "port the reload endpoint listens on, 0 disables it",
                self.reload_port
            ));
        let cmd = self.server.register_flags(cmd);
        self.metrics.register_flags(cmd)
    }

    fn apply_flags(&mut self, matches: &ArgMatches) {
        if let Some(v) = flags::explicit(matches, "reload-addr") {
            self.reload_address = v;
        }
        if let Some(v) = flags::explicit(matches, "reload-port") {
            self.reload_port = v;
        }
        self.server.apply_flags(matches);
        self.metrics.apply_flags(matches);
    }
}
