//! # Metadata Providers
//!
//! A [`MetadataProvider`] answers "what does class X declare?". It is the only source of
//! class structure the rest of the crate sees, which keeps readers pure functions of the
//! descriptors they are handed.
//!
//! [`ClassRegistry`] is the standard provider: an in-memory table of
//! [`ClassDescriptor`]s, filled in code or loaded from a class file:
//!
//! ```text
//! { "classes": [ { "name": "Basic", "properties": [ ... ] } ] }
//! ```
//!
//! Files ending in `.toml` are read as TOML, everything else as JSON.

use crate::class::ClassDescriptor;
use crate::error::{AccessError, Result};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fs;
use std::path::Path;

/// Source of class descriptors. Must answer identically for the whole process run.
pub trait MetadataProvider: Send + Sync {
    fn class(&self, name: &str) -> Option<&ClassDescriptor>;
}

/// Returns the ancestor chain of `class`, most-derived first.
///
/// Fails with [`AccessError::UnknownClass`] when the class or one of its ancestors is not
/// provided, and with a configuration error when the parent chain loops.
pub fn lineage<'a>(
    provider: &'a dyn MetadataProvider,
    class: &str,
) -> Result<Vec<&'a ClassDescriptor>> {
    let mut chain: Vec<&ClassDescriptor> = Vec::new();
    let mut next = Some(class.to_string());

    while let Some(name) = next {
        if chain.iter().any(|c| c.name == name) {
            return Err(AccessError::Configuration(format!(
                "Class {} inherits from itself.",
                name
            )));
        }
        let descriptor = provider
            .class(&name)
            .ok_or_else(|| AccessError::UnknownClass(name.clone()))?;
        next = descriptor.parent.clone();
        chain.push(descriptor);
    }

    Ok(chain)
}

#[derive(Debug, Default, Serialize, Deserialize)]
struct ClassFile {
    #[serde(default)]
    classes: Vec<ClassDescriptor>,
}

/// In-memory class table.
#[derive(Debug, Default, Clone)]
pub struct ClassRegistry {
    classes: HashMap<String, ClassDescriptor>,
}

impl ClassRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a class, replacing any previous descriptor with the same name.
    pub fn register(&mut self, class: ClassDescriptor) -> &mut Self {
        self.classes.insert(class.name.clone(), class);
        self
    }

    pub fn with(mut self, class: ClassDescriptor) -> Self {
        self.register(class);
        self
    }

    pub fn len(&self) -> usize {
        self.classes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.classes.is_empty()
    }

    pub fn class_names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.classes.keys().map(String::as_str).collect();
        names.sort_unstable();
        names
    }

    pub fn from_json(content: &str) -> Result<Self> {
        let file: ClassFile = serde_json::from_str(content)?;
        Ok(Self::from_file(file))
    }

    pub fn from_toml(content: &str) -> Result<Self> {
        let file: ClassFile = toml::from_str(content)?;
        Ok(Self::from_file(file))
    }

    /// Load a class file, picking the format from the extension.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let content = fs::read_to_string(path)?;
        let is_toml = path
            .extension()
            .is_some_and(|ext| ext.eq_ignore_ascii_case("toml"));
        if is_toml {
            Self::from_toml(&content)
        } else {
            Self::from_json(&content)
        }
    }

    fn from_file(file: ClassFile) -> Self {
        let mut registry = Self::new();
        for class in file.classes {
            registry.register(class);
        }
        registry
    }
}

impl MetadataProvider for ClassRegistry {
    fn class(&self, name: &str) -> Option<&ClassDescriptor> {
        self.classes.get(name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn family() -> ClassRegistry {
        ClassRegistry::new()
            .with(ClassDescriptor::new("Base"))
            .with(ClassDescriptor::new("Middle").extends("Base"))
            .with(ClassDescriptor::new("Derived").extends("Middle"))
    }

    #[test]
    fn test_lineage_is_most_derived_first() {
        let registry = family();
        let names: Vec<_> = lineage(&registry, "Derived")
            .unwrap()
            .into_iter()
            .map(|c| c.name.as_str())
            .collect();
        assert_eq!(names, vec!["Derived", "Middle", "Base"]);
    }

    #[test]
    fn test_lineage_reports_missing_ancestor() {
        let registry = ClassRegistry::new().with(ClassDescriptor::new("Orphan").extends("Gone"));
        let err = lineage(&registry, "Orphan").unwrap_err();
        assert!(matches!(err, AccessError::UnknownClass(name) if name == "Gone"));
    }

    #[test]
    fn test_lineage_rejects_cycles() {
        let registry = ClassRegistry::new()
            .with(ClassDescriptor::new("A").extends("B"))
            .with(ClassDescriptor::new("B").extends("A"));
        let err = lineage(&registry, "A").unwrap_err();
        assert!(matches!(err, AccessError::Configuration(_)));
    }

    #[test]
    fn test_loads_toml_class_files() {
        let registry = ClassRegistry::from_toml(
            r#"
            [[classes]]
            name = "Basic"

            [[classes.properties]]
            name = "foo"
            access = ["get", "set"]
            initialize = "foo"
            "#,
        )
        .unwrap();
        assert_eq!(registry.class_names(), vec!["Basic"]);
        let foo = registry.class("Basic").unwrap().find_property("foo").unwrap();
        assert_eq!(foo.initialize.as_ref().and_then(|v| v.as_str()), Some("foo"));
    }

    #[test]
    fn test_loads_json_class_file_from_disk() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("classes.json");
        fs::write(
            &path,
            r#"{"classes": [{"name": "Basic"}, {"name": "Other", "parent": "Basic"}]}"#,
        )
        .unwrap();
        let registry = ClassRegistry::load(&path).unwrap();
        assert_eq!(registry.len(), 2);
        assert_eq!(
            registry.class("Other").unwrap().parent.as_deref(),
            Some("Basic")
        );
    }
}
