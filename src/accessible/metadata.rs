//! Derived per-class metadata.
//!
//! [`ClassMetadata`] is what the readers compute from a class lineage and what the
//! [`MetadataCache`](crate::cache::MetadataCache) keeps for the lifetime of the process.
//! Every part is serializable so it can be mirrored to a persistent cache.

use crate::class::{Behavior, Initializer, Operation};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};

/// Allowed accessor operations per property.
///
/// A property missing from the map allows nothing.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AccessRights(BTreeMap<String, BTreeSet<Operation>>);

impl AccessRights {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, property: impl Into<String>, operations: BTreeSet<Operation>) {
        self.0.insert(property.into(), operations);
    }

    pub fn allows(&self, property: &str, operation: Operation) -> bool {
        self.0
            .get(property)
            .is_some_and(|operations| operations.contains(&operation))
    }

    pub fn operations(&self, property: &str) -> Option<&BTreeSet<Operation>> {
        self.0.get(property)
    }
}

/// How a collection property is reached through `addX`/`removeX`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CollectionDescriptor {
    pub property: String,
    pub item_name: String,
    pub behavior: Behavior,
    pub methods: BTreeSet<Operation>,
}

impl CollectionDescriptor {
    pub fn allows(&self, operation: Operation) -> bool {
        self.methods.contains(&operation)
    }
}

/// Collection descriptors indexed both ways.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Collections {
    by_item_name: BTreeMap<String, CollectionDescriptor>,
    by_property: BTreeMap<String, CollectionDescriptor>,
}

impl Collections {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a descriptor to both indexes. Returns the descriptor already registered under
    /// the same item name, if any, and leaves the indexes untouched in that case.
    pub fn insert(&mut self, descriptor: CollectionDescriptor) -> Option<&CollectionDescriptor> {
        if self.by_item_name.contains_key(&descriptor.item_name) {
            return self.by_item_name.get(&descriptor.item_name);
        }
        self.by_property
            .insert(descriptor.property.clone(), descriptor.clone());
        self.by_item_name
            .insert(descriptor.item_name.clone(), descriptor);
        None
    }

    pub fn by_item_name(&self, item_name: &str) -> Option<&CollectionDescriptor> {
        self.by_item_name.get(item_name)
    }

    pub fn by_property(&self, property: &str) -> Option<&CollectionDescriptor> {
        self.by_property.get(property)
    }

    pub fn len(&self) -> usize {
        self.by_property.len()
    }

    pub fn is_empty(&self) -> bool {
        self.by_property.is_empty()
    }
}

/// Everything the dispatcher needs to know about one class.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClassMetadata {
    pub class: String,
    /// Class names, most-derived first.
    pub lineage: Vec<String>,
    /// Every declared property, including inherited ones.
    pub properties: Vec<String>,
    pub access_rights: AccessRights,
    pub collections: Collections,
    pub construct_arguments: Vec<String>,
    pub initial_values: BTreeMap<String, Initializer>,
    pub validation_enabled: bool,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn descriptor(property: &str, item_name: &str) -> CollectionDescriptor {
        CollectionDescriptor {
            property: property.to_string(),
            item_name: item_name.to_string(),
            behavior: Behavior::List,
            methods: [Operation::Add, Operation::Remove].into_iter().collect(),
        }
    }

    #[test]
    fn test_missing_property_allows_nothing() {
        let mut rights = AccessRights::new();
        rights.insert("foo", [Operation::Get].into_iter().collect());
        assert!(rights.allows("foo", Operation::Get));
        assert!(!rights.allows("foo", Operation::Set));
        assert!(!rights.allows("bar", Operation::Get));
    }

    #[test]
    fn test_collections_are_indexed_both_ways() {
        let mut collections = Collections::new();
        assert!(collections.insert(descriptor("items", "item")).is_none());
        assert_eq!(
            collections.by_item_name("item").unwrap().property,
            "items"
        );
        assert_eq!(
            collections.by_property("items").unwrap().item_name,
            "item"
        );
    }

    #[test]
    fn test_duplicate_item_name_is_reported() {
        let mut collections = Collections::new();
        collections.insert(descriptor("items", "item"));
        let existing = collections.insert(descriptor("itemList", "item")).cloned();
        assert_eq!(existing.map(|d| d.property), Some("items".to_string()));
        assert!(collections.by_property("itemList").is_none());
        assert_eq!(collections.len(), 1);
    }
}
