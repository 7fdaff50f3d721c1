//! # Cross-Section Validation
//!
//! Checks the references one section makes to entities owned by another,
//! e.g. a trace pipeline writing spans to a logs instance.
//!
//! Runs once, after every section applied its defaults, so references are
//! checked against final names.
//!
//! ## Usage
//! ```rust,no_run
//! use agent_config::{Config, validate_references};
//!
//! let mut config = Config::default();
//! config.apply_defaults().unwrap();
//! assert!(validate_references(&config).is_ok());
//! ```

use crate::config::Config;
use crate::error::ResolveError;
use std::collections::{BTreeMap, BTreeSet};

/// Check every reference declared by the sections of `config`.
///
/// Fails on the first reference whose target is not defined by the target
/// section. A target section that is absent from the document defines no
/// entities.
pub fn validate_references(config: &Config) -> Result<(), ResolveError> {
    let sections = config.sections();

    let mut entities: BTreeMap<&'static str, BTreeSet<&str>> = BTreeMap::new();
    for section in &sections {
        entities
            .entry(section.name())
            .or_default()
            .extend(section.entity_names());
    }

    for section in &sections {
        for reference in section.references() {
            let found = entities
                .get(reference.target_subsystem)
                .is_some_and(|names| names.contains(reference.target.as_str()));
            if !found {
                return Err(ResolveError::MissingReference {
                    feature: reference.feature,
                    owner: reference.owner,
                    instance: reference.instance,
                    target_subsystem: reference.target_subsystem,
                    target: reference.target
                });
            }
        }
    }

    Ok(())
}
