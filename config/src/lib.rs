//! # Agent Configuration
//!
//! Layered configuration resolution for the telemetry agent.
//!
//! A configuration is built from compiled defaults, a YAML (or TOML)
//! document and command-line flags, in that order of precedence. The
//! document text can reference environment variables as `${NAME}`.
//! Once merged, the tree is resolved:
//!
//! - deprecated section names are migrated (`loki` becomes `logs`)
//! - each subsystem section applies its own defaults
//! - values shared across subsystems are cascaded from the sections that
//!   own them
//! - references between sections are checked
//!
//! Decoding is strict: unknown fields, duplicate keys and malformed
//! documents are rejected.
//!
//! The entry point is [`load`]; [`load_with`] takes a custom document
//! loader.

pub mod cascade;
pub mod config;
pub mod decode;
pub mod envsubst;
pub mod error;
pub mod flags;
pub mod loader;
pub mod migration;
pub mod sections;
pub mod validator;

pub use cascade::Cascade;
pub use config::Config;
pub use decode::{DocumentFormat, load_bytes, load_document, load_file};
pub use error::{FileError, LoadError, ResolveError, SectionError, SubstitutionError};
pub use flags::RegisterFlags;
pub use loader::{FlagPass, LoadOutcome, Stage, load, load_with, version_info};
pub use migration::{DEPRECATED_ALIASES, Migration, SectionAlias};
pub use sections::integrations::{BlackboxConfig, CommonConfig, IntegrationsConfig};
pub use sections::logs::LogsConfig;
pub use sections::metrics::{GlobalConfig, MetricsConfig};
pub use sections::remote_write::RemoteWriteConfig;
pub use sections::server::{LogLevel, ServerConfig};
pub use sections::traces::TracesConfig;
pub use sections::{Reference, Section};
pub use validator::validate_references;
