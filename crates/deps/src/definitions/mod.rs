//! Built-in dependency definitions
//!
//! Each definition pairs a [`Dependency`] with the build it needs. Adding a
//! dependency means adding a module here and listing it in
//! [`Registry::builtin`].

use tpb_errors::{BuildError, Error};

use crate::builder::BuilderInterface;
use crate::dependency::{BuildGroup, Dependency};

mod libcds;

pub use libcds::LibCdsDependency;

/// A dependency together with its build recipe
pub trait DependencyDefinition: Send + Sync {
    /// Metadata of the dependency
    fn dependency(&self) -> &Dependency;

    /// Ask `builder` to build the dependency
    ///
    /// # Errors
    ///
    /// Returns whatever error the builder reports.
    fn build(&self, builder: &mut dyn BuilderInterface) -> Result<(), Error>;

    fn name(&self) -> &str {
        &self.dependency().name
    }
}

/// Lookup table of dependency definitions
pub struct Registry {
    definitions: Vec<Box<dyn DependencyDefinition>>,
}

impl Registry {
    /// Create an empty registry
    #[must_use]
    pub fn new() -> Self {
        Self {
            definitions: Vec::new(),
        }
    }

    /// Registry with every built-in definition
    #[must_use]
    pub fn builtin() -> Self {
        let mut registry = Self::new();
        registry.register(Box::new(LibCdsDependency::new()));
        registry
    }

    /// Add a definition, replacing any existing one with the same name
    pub fn register(&mut self, definition: Box<dyn DependencyDefinition>) {
        self.definitions
            .retain(|d| !d.name().eq_ignore_ascii_case(definition.name()));
        self.definitions.push(definition);
    }

    /// Find a definition by name, ignoring case
    ///
    /// # Errors
    ///
    /// Returns [`BuildError::UnknownDependency`] if there is no such
    /// definition.
    pub fn get(&self, name: &str) -> Result<&dyn DependencyDefinition, BuildError> {
        self.definitions
            .iter()
            .find(|d| d.name().eq_ignore_ascii_case(name))
            .map(|d| &**d)
            .ok_or_else(|| BuildError::UnknownDependency {
                name: name.to_string(),
            })
    }

    /// All definitions, sorted by name
    #[must_use]
    pub fn all(&self) -> Vec<&dyn DependencyDefinition> {
        let mut all: Vec<&dyn DependencyDefinition> =
            self.definitions.iter().map(|d| &**d).collect();
        all.sort_by(|a, b| a.name().cmp(b.name()));
        all
    }

    /// Definitions in `group`, sorted by name
    #[must_use]
    pub fn in_group(&self, group: BuildGroup) -> Vec<&dyn DependencyDefinition> {
        self.all()
            .into_iter()
            .filter(|d| d.dependency().build_group == group)
            .collect()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.definitions.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.definitions.is_empty()
    }
}

impl Default for Registry {
    fn default() -> Self {
        Self::builtin()
    }
}
