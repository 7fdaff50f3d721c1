//! # Configuration Errors
//!
//! Every stage of the resolution pipeline has its own error type so callers
//! can tell a bad invocation apart from bad configuration content.
//!
//! - [`LoadError`]: top-level error returned by [`crate::load`], prefixed
//!   with the stage that failed
//! - [`FileError`]: reading, substituting or decoding a document
//! - [`SubstitutionError`]: malformed `${...}` placeholder
//! - [`ResolveError`]: migration, subsystem defaults and cross-references
//! - [`SectionError`]: raised by a subsystem's own `apply_defaults`

use std::path::PathBuf;
use thiserror::Error;

use crate::loader::Stage;

/// Error returned by the resolution pipeline.
#[derive(Debug, Error)]
pub enum LoadError {
    #[error("error parsing flags: {0}")]
    Flags(#[source] clap::Error),

    #[error("-config.file flag required")]
    MissingConfigFile,

    #[error("error loading config file {}: {source}", path.display())]
    File {
        path: PathBuf,
        #[source]
        source: FileError
    },

    #[error("error in config file: {0}")]
    Config(#[from] ResolveError)
}

impl LoadError {
    /// The pipeline stage that produced this error.
    pub fn stage(&self) -> Stage {
        match self {
            Self::Flags(_) | Self::MissingConfigFile => Stage::FlagsRegistered,
            Self::File { .. } => Stage::DocumentLoaded,
            Self::Config(ResolveError::AliasConflict { .. }) => Stage::Migrated,
            Self::Config(ResolveError::Section(_)) => Stage::CascadeApplied,
            Self::Config(ResolveError::MissingReference { .. }) => Stage::Validated
        }
    }
}

/// Error produced while turning a document into a configuration tree.
#[derive(Debug, Error)]
pub enum FileError {
    #[error("error reading config file: {0}")]
    Read(#[from] std::io::Error),

    #[error("config file is not valid UTF-8: {0}")]
    Utf8(#[from] std::str::Utf8Error),

    #[error("unable to substitute config with environment variables: {0}")]
    Substitution(#[from] SubstitutionError),

    #[error(transparent)]
    Yaml(#[from] serde_yaml::Error),

    #[error(transparent)]
    Toml(#[from] toml::de::Error)
}

/// Malformed placeholder in a document. Offsets are byte offsets of the
/// `$` that starts the placeholder.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum SubstitutionError {
    #[error("unterminated placeholder at offset {offset}")]
    Unterminated { offset: usize },

    #[error("empty variable name at offset {offset}")]
    EmptyName { offset: usize },

    #[error("invalid character {found:?} in variable name at offset {offset}")]
    InvalidName { offset: usize, found: char },

    #[error(
        "unsupported modifier {modifier:?} at offset {offset}: only ${{NAME}}, ${{NAME:-default}} \
         and ${{NAME-default}} are supported"
    )]
    UnsupportedModifier { offset: usize, modifier: String }
}

/// Error raised after merging, while migrating, cascading and validating.
#[derive(Debug, Error)]
pub enum ResolveError {
    #[error("at most one of {legacy} and {current} should be specified")]
    AliasConflict {
        legacy: &'static str,
        current: &'static str
    },

    #[error(transparent)]
    Section(#[from] SectionError),

    #[error(
        "failed to validate {feature} for {owner} config {instance}: specified {target_subsystem} \
         config {target} not found in agent config"
    )]
    MissingReference {
        feature: &'static str,
        owner: &'static str,
        instance: String,
        target_subsystem: &'static str,
        target: String
    }
}

/// Error raised by a subsystem section while applying its own defaults.
#[derive(Debug, Error)]
pub enum SectionError {
    #[error(transparent)]
    Validation(#[from] validator::ValidationErrors),

    #[error("found multiple {kind} configs with name {name}")]
    DuplicateName { kind: &'static str, name: String },

    #[error("{kind} config name must not be empty")]
    EmptyName { kind: &'static str },

    #[error("{0}")]
    Invalid(String)
}
