//! Form registry loading with builder pattern and fallback chains.
//!
//! ```no_run
//! use flatland_defs::SchemaRegistry;
//!
//! // Every *.yml, *.yaml and *.json file in a directory
//! let registry = SchemaRegistry::from_dir("forms/").unwrap();
//! let schema = registry.schema("signup").unwrap();
//!
//! // First source that loads wins
//! let registry = SchemaRegistry::builder()
//!     .from_dir("/etc/app/forms/")
//!     .from_file("signup.yml")
//!     .build()
//!     .unwrap();
//! ```

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use flatland_core::Schema;
use tracing::debug;

use crate::definition::FormDefinition;
use crate::error::{DefinitionError, Result};

const EXTENSIONS: [&str; 3] = ["yml", "yaml", "json"];

/// Where a [`SchemaRegistry`] was loaded from.
#[derive(Debug, Clone)]
pub enum RegistrySource {
    /// A directory of definition files.
    Directory(PathBuf),
    /// A single definition file.
    File(PathBuf),
    /// A fallback chain; the registry came from the first source that
    /// loaded.
    Multiple(Vec<RegistrySource>),
}

/// Form definitions keyed by name.
///
/// A definition's name is its root schema name, or the file stem when the
/// root is anonymous.
#[derive(Debug)]
pub struct SchemaRegistry {
    forms: HashMap<String, FormDefinition>,
    source: RegistrySource,
}

impl SchemaRegistry {
    /// Returns a new [`RegistryBuilder`].
    pub fn builder() -> RegistryBuilder {
        RegistryBuilder::new()
    }

    /// Loads every definition file in `path`. Other files are skipped.
    ///
    /// # Errors
    ///
    /// Returns [`IoError`](DefinitionError::IoError) if the directory or a
    /// file cannot be read, or a parse error for a malformed file.
    pub fn from_dir(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let mut forms = HashMap::new();

        let mut files: Vec<PathBuf> = std::fs::read_dir(path)?
            .map(|entry| entry.map(|e| e.path()))
            .collect::<std::io::Result<_>>()?;
        files.sort();

        for file_path in files {
            let extension = file_path.extension().and_then(|e| e.to_str());
            if !extension.is_some_and(|e| EXTENSIONS.contains(&e)) {
                debug!(path = %file_path.display(), "skipping non-definition file");
                continue;
            }
            let definition = FormDefinition::load(&file_path)?;
            let name = registry_name(&definition, &file_path);
            debug!(form = %name, path = %file_path.display(), "loaded form definition");
            forms.insert(name, definition);
        }

        Ok(Self {
            forms,
            source: RegistrySource::Directory(path.to_path_buf()),
        })
    }

    /// Loads a single definition file.
    ///
    /// # Errors
    ///
    /// As [`FormDefinition::load`].
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let definition = FormDefinition::load(path)?;
        let mut forms = HashMap::new();
        forms.insert(registry_name(&definition, path), definition);
        Ok(Self {
            forms,
            source: RegistrySource::File(path.to_path_buf()),
        })
    }

    /// Looks up a definition by name.
    pub fn get(&self, name: &str) -> Option<&FormDefinition> {
        self.forms.get(name)
    }

    /// Compiles the named definition.
    ///
    /// # Errors
    ///
    /// Returns [`UnknownForm`](DefinitionError::UnknownForm) if nothing is
    /// registered under `name`, or any compile error.
    pub fn schema(&self, name: &str) -> Result<Schema> {
        self.get(name)
            .ok_or_else(|| DefinitionError::UnknownForm(name.to_string()))?
            .to_schema()
    }

    /// Registers a definition, replacing any with the same name.
    pub fn insert(&mut self, name: impl Into<String>, definition: FormDefinition) {
        self.forms.insert(name.into(), definition);
    }

    pub fn contains(&self, name: &str) -> bool {
        self.forms.contains_key(name)
    }

    pub fn len(&self) -> usize {
        self.forms.len()
    }

    pub fn is_empty(&self) -> bool {
        self.forms.is_empty()
    }

    /// Registered names, sorted.
    pub fn names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.forms.keys().map(String::as_str).collect();
        names.sort_unstable();
        names
    }

    pub fn source(&self) -> &RegistrySource {
        &self.source
    }
}

fn registry_name(definition: &FormDefinition, path: &Path) -> String {
    if definition.name().is_empty() {
        path.file_stem()
            .and_then(|s| s.to_str())
            .unwrap_or_default()
            .to_string()
    } else {
        definition.name().to_string()
    }
}

/// Builds a [`SchemaRegistry`] from the first source that loads.
///
/// Sources are tried in the order they were added. If all fail,
/// [`DefinitionError::NoSourcesAvailable`] is returned.
#[derive(Debug, Default)]
pub struct RegistryBuilder {
    sources: Vec<RegistrySource>,
}

impl RegistryBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a directory of definition files as a source.
    pub fn from_dir(mut self, path: impl Into<PathBuf>) -> Self {
        self.sources.push(RegistrySource::Directory(path.into()));
        self
    }

    /// Adds a single definition file as a source.
    pub fn from_file(mut self, path: impl Into<PathBuf>) -> Self {
        self.sources.push(RegistrySource::File(path.into()));
        self
    }

    /// Loads the first source that succeeds.
    ///
    /// # Errors
    ///
    /// Returns [`DefinitionError::NoSourcesAvailable`] when no source loads.
    pub fn build(self) -> Result<SchemaRegistry> {
        for source in &self.sources {
            let result = match source {
                RegistrySource::Directory(path) => SchemaRegistry::from_dir(path),
                RegistrySource::File(path) => SchemaRegistry::from_file(path),
                RegistrySource::Multiple(_) => continue,
            };
            match result {
                Ok(mut registry) => {
                    registry.source = RegistrySource::Multiple(self.sources.clone());
                    return Ok(registry);
                }
                Err(err) => debug!(source = ?source, error = %err, "registry source failed"),
            }
        }
        Err(DefinitionError::NoSourcesAvailable)
    }
}
