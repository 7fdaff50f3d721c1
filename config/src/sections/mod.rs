//! # Subsystem Sections
//!
//! Each subsystem of the agent owns one section of the configuration tree.
//! The resolution pipeline does not know the concrete section types; it
//! works with collections of [`Section`] values.
//!
//! A section decodes itself through its `serde::Deserialize` impl (every
//! section denies unknown fields) and resolves itself through
//! [`Section::apply_defaults`].

pub mod integrations;
pub mod logs;
pub mod metrics;
pub mod remote_write;
pub mod server;
pub mod traces;

use crate::cascade::Cascade;
use crate::error::SectionError;
use std::collections::BTreeSet;

/// Capabilities the pipeline needs from a subsystem section.
pub trait Section {
    /// Name of the section in the document, used in error messages.
    fn name(&self) -> &'static str;

    /// Fill in defaults that depend on other settings of this section and
    /// reject invalid combinations.
    fn apply_defaults(&mut self) -> Result<(), SectionError>;

    /// Receive values resolved by other subsystems.
    fn inherit(&mut self, _cascade: &Cascade) {}

    /// Names of the entities other sections may refer to.
    fn entity_names(&self) -> Vec<&str> {
        Vec::new()
    }

    /// References this section makes to entities of other sections.
    fn references(&self) -> Vec<Reference> {
        Vec::new()
    }
}

/// A named dependency of one section's entity on another section's entity.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Reference {
    /// Feature of the owner that declares the dependency.
    pub feature: &'static str,
    /// Section that owns the referencing instance.
    pub owner: &'static str,
    /// Name of the referencing instance.
    pub instance: String,
    /// Section expected to hold the target.
    pub target_subsystem: &'static str,
    /// Name of the target entity.
    pub target: String
}

/// Check that instance names are set and unique.
pub(crate) fn check_unique_names<'a, I>(kind: &'static str, names: I) -> Result<(), SectionError>
where
    I: IntoIterator<Item = &'a str>
{
    let mut seen = BTreeSet::new();
    for name in names {
        if name.is_empty() {
            return Err(SectionError::EmptyName { kind });
        }
        if !seen.insert(name) {
            return Err(SectionError::DuplicateName {
                kind,
                name: name.to_string()
            });
        }
    }
    Ok(())
}
