//! # Deprecated Section Aliases
//!
//! Sections that were renamed keep accepting their legacy name. The
//! mapping is a table: adding an alias means adding a row to
//! [`DEPRECATED_ALIASES`].
//!
//! # Rules
//! - legacy and current both set: the document is rejected
//! - only legacy set: its value moves to the current slot, the legacy slot
//!   is cleared and the usage flag is raised
//! - otherwise nothing happens

use crate::config::Config;
use crate::error::ResolveError;
use crate::sections::logs::LogsConfig;
use tracing::{debug, warn};

/// A legacy-to-current section rename.
pub trait Migration: Sync {
    fn legacy(&self) -> &'static str;
    fn current(&self) -> &'static str;

    /// Move the legacy section into the current slot if needed.
    fn migrate(&self, config: &mut Config) -> Result<(), ResolveError>;

    /// Whether the legacy name was used by the loaded document.
    fn used(&self, config: &Config) -> bool;
}

/// Legacy slot, current slot and usage flag of an alias.
type Slots<'a, T> = (&'a mut Option<T>, &'a mut Option<T>, &'a mut bool);

/// Alias between two optional sections of the same type.
pub struct SectionAlias<T: 'static> {
    pub legacy: &'static str,
    pub current: &'static str,
    slots: for<'a> fn(&'a mut Config) -> Slots<'a, T>,
    usage: fn(&Config) -> bool
}

impl<T: 'static> Migration for SectionAlias<T> {
    fn legacy(&self) -> &'static str {
        self.legacy
    }

    fn current(&self) -> &'static str {
        self.current
    }

    fn migrate(&self, config: &mut Config) -> Result<(), ResolveError> {
        let (legacy, current, used) = (self.slots)(config);
        match (legacy.is_some(), current.is_some()) {
            (true, true) => Err(ResolveError::AliasConflict {
                legacy: self.legacy,
                current: self.current
            }),
            (true, false) => {
                debug!(legacy = self.legacy, current = self.current, "migrating deprecated section");
                *current = legacy.take();
                *used = true;
                Ok(())
            }
            _ => Ok(())
        }
    }

    fn used(&self, config: &Config) -> bool {
        (self.usage)(config)
    }
}

fn loki_slots(config: &mut Config) -> Slots<'_, LogsConfig> {
    (
        &mut config.loki,
        &mut config.logs,
        &mut config.used_deprecated_loki
    )
}

fn loki_used(config: &Config) -> bool {
    config.used_deprecated_loki
}

static LOKI_ALIAS: SectionAlias<LogsConfig> = SectionAlias {
    legacy: "loki",
    current: "logs",
    slots: loki_slots,
    usage: loki_used
};

/// Every deprecated section alias, applied in order.
pub static DEPRECATED_ALIASES: &[&dyn Migration] = &[&LOKI_ALIAS];

/// Apply every alias of [`DEPRECATED_ALIASES`] to `config`.
pub fn migrate_aliases(config: &mut Config) -> Result<(), ResolveError> {
    for alias in DEPRECATED_ALIASES {
        alias.migrate(config)?;
    }
    Ok(())
}

/// Log a deprecation notice for every legacy name the document used.
pub fn log_deprecations(config: &Config) {
    for alias in DEPRECATED_ALIASES {
        if alias.used(config) {
            warn!(
                "DEPRECATION NOTICE: `{}` is deprecated in favor of `{}`",
                alias.legacy(),
                alias.current()
            );
        }
    }
}
