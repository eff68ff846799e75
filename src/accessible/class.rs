//! Declarative class metadata.
//!
//! A [`ClassDescriptor`] is the side-table a type registers to describe its accessible
//! properties: which accessor operations each property allows, which properties behave
//! as collections, which properties the constructor takes, and which properties start
//! with a default value. Descriptors are plain data: they can be built in code with the
//! chained builder methods or loaded from JSON/TOML through
//! [`ClassRegistry`](crate::registry::ClassRegistry).
//!
//! ```
//! use accessible::class::{ClassDescriptor, Operation, PropertyDescriptor};
//!
//! let basic = ClassDescriptor::new("Basic")
//!     .property(PropertyDescriptor::new("foo").access([Operation::Get, Operation::Set]))
//!     .property(PropertyDescriptor::new("items").access([Operation::Add]).list());
//! assert_eq!(basic.properties.len(), 2);
//! ```

use crate::value::Value;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fmt;

/// An accessor operation, as spelled in the method name prefix.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Operation {
    Get,
    Set,
    Is,
    Has,
    Add,
    Remove,
}

impl Operation {
    pub const ALL: [Operation; 6] = [
        Operation::Get,
        Operation::Set,
        Operation::Is,
        Operation::Has,
        Operation::Add,
        Operation::Remove,
    ];

    pub fn prefix(&self) -> &'static str {
        match self {
            Operation::Get => "get",
            Operation::Set => "set",
            Operation::Is => "is",
            Operation::Has => "has",
            Operation::Add => "add",
            Operation::Remove => "remove",
        }
    }

    pub fn from_prefix(prefix: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|op| op.prefix() == prefix)
    }

    /// Whether this operation goes through a collection mutator.
    pub fn is_collection(&self) -> bool {
        matches!(self, Operation::Add | Operation::Remove)
    }
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.prefix())
    }
}

/// How `add`/`remove` treat a collection property.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Behavior {
    List,
    Map,
    Set,
}

impl fmt::Display for Behavior {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Behavior::List => f.write_str("list"),
            Behavior::Map => f.write_str("map"),
            Behavior::Set => f.write_str("set"),
        }
    }
}

/// Parameters of a list/map/set annotation.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CollectionSpec {
    /// Singular name used in `addX`/`removeX`. Derived from the property name when absent.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub item_name: Option<String>,

    /// Restricts the mutators; `{add, remove}` when absent.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub methods: Option<BTreeSet<Operation>>,
}

impl CollectionSpec {
    pub fn item_name(mut self, item_name: impl Into<String>) -> Self {
        self.item_name = Some(item_name.into());
        self
    }

    pub fn methods(mut self, methods: impl IntoIterator<Item = Operation>) -> Self {
        self.methods = Some(methods.into_iter().collect());
        self
    }
}

/// A resolved default for a property, applied before constructor arguments.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Initializer {
    /// A literal value, cloned into every new object.
    Value(Value),
    /// A fresh instance of the named class, built with no constructor arguments.
    Object { class: String },
}

/// Metadata attached to one declared field.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PropertyDescriptor {
    pub name: String,

    /// Allowed accessor operations. `None` means no accessor reaches this field.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub access: Option<BTreeSet<Operation>>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub list: Option<CollectionSpec>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub map: Option<CollectionSpec>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub set: Option<CollectionSpec>,

    /// Literal default value.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub initialize: Option<Value>,

    /// Class to instantiate as the default value.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub initialize_object: Option<String>,
}

impl PropertyDescriptor {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            access: None,
            list: None,
            map: None,
            set: None,
            initialize: None,
            initialize_object: None,
        }
    }

    pub fn access(mut self, operations: impl IntoIterator<Item = Operation>) -> Self {
        self.access = Some(operations.into_iter().collect());
        self
    }

    pub fn list(self) -> Self {
        self.list_with(CollectionSpec::default())
    }

    pub fn list_with(mut self, spec: CollectionSpec) -> Self {
        self.list = Some(spec);
        self
    }

    pub fn map(self) -> Self {
        self.map_with(CollectionSpec::default())
    }

    pub fn map_with(mut self, spec: CollectionSpec) -> Self {
        self.map = Some(spec);
        self
    }

    pub fn set(self) -> Self {
        self.set_with(CollectionSpec::default())
    }

    pub fn set_with(mut self, spec: CollectionSpec) -> Self {
        self.set = Some(spec);
        self
    }

    pub fn initialize(mut self, value: impl Into<Value>) -> Self {
        self.initialize = Some(value.into());
        self
    }

    pub fn initialize_object(mut self, class: impl Into<String>) -> Self {
        self.initialize_object = Some(class.into());
        self
    }

    /// Collection annotations in priority order: list, map, set.
    pub fn collection_annotations(&self) -> Vec<(Behavior, &CollectionSpec)> {
        [
            (Behavior::List, self.list.as_ref()),
            (Behavior::Map, self.map.as_ref()),
            (Behavior::Set, self.set.as_ref()),
        ]
        .into_iter()
        .filter_map(|(behavior, spec)| spec.map(|spec| (behavior, spec)))
        .collect()
    }

    /// Whether an accessor method name can ever resolve to this property.
    pub fn is_reachable(&self) -> bool {
        self.access.as_ref().is_some_and(|ops| !ops.is_empty())
            || !self.collection_annotations().is_empty()
    }
}

/// Metadata attached to one class.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClassDescriptor {
    pub name: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub parent: Option<String>,

    #[serde(default)]
    pub properties: Vec<PropertyDescriptor>,

    /// Ordered constructor argument property names.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub construct: Option<Vec<String>>,

    /// `Some(false)` disables constraint validation, `Some(true)` re-enables it for a
    /// subclass, `None` inherits.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub constraints_validation: Option<bool>,
}

impl ClassDescriptor {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            parent: None,
            properties: Vec::new(),
            construct: None,
            constraints_validation: None,
        }
    }

    pub fn extends(mut self, parent: impl Into<String>) -> Self {
        self.parent = Some(parent.into());
        self
    }

    pub fn property(mut self, property: PropertyDescriptor) -> Self {
        self.properties.push(property);
        self
    }

    pub fn construct<S: Into<String>>(mut self, arguments: impl IntoIterator<Item = S>) -> Self {
        self.construct = Some(arguments.into_iter().map(Into::into).collect());
        self
    }

    pub fn disable_constraints_validation(mut self) -> Self {
        self.constraints_validation = Some(false);
        self
    }

    pub fn enable_constraints_validation(mut self) -> Self {
        self.constraints_validation = Some(true);
        self
    }

    pub fn find_property(&self, name: &str) -> Option<&PropertyDescriptor> {
        self.properties.iter().find(|p| p.name == name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_prefixes_round_trip() {
        for op in Operation::ALL {
            assert_eq!(Operation::from_prefix(op.prefix()), Some(op));
        }
        assert_eq!(Operation::from_prefix("put"), None);
    }

    #[test]
    fn test_collection_annotations_follow_priority_order() {
        let property = PropertyDescriptor::new("tags").set().list();
        let behaviors: Vec<_> = property
            .collection_annotations()
            .into_iter()
            .map(|(b, _)| b)
            .collect();
        assert_eq!(behaviors, vec![Behavior::List, Behavior::Set]);
    }

    #[test]
    fn test_unannotated_property_is_unreachable() {
        assert!(!PropertyDescriptor::new("secret").is_reachable());
        assert!(!PropertyDescriptor::new("secret").access([]).is_reachable());
        assert!(PropertyDescriptor::new("items").map().is_reachable());
    }

    #[test]
    fn test_descriptor_deserializes_from_json() {
        let json = r#"{
            "name": "Coll",
            "construct": ["owner"],
            "properties": [
                {"name": "owner", "access": ["get"]},
                {"name": "items", "access": ["get", "add", "remove"],
                 "list": {"item_name": "item"}, "initialize": []}
            ]
        }"#;
        let class: ClassDescriptor = serde_json::from_str(json).unwrap();
        assert_eq!(class.construct, Some(vec!["owner".to_string()]));
        let items = class.find_property("items").unwrap();
        assert_eq!(items.list.as_ref().unwrap().item_name.as_deref(), Some("item"));
        assert_eq!(items.initialize, Some(Value::List(vec![])));
        assert!(items.access.as_ref().unwrap().contains(&Operation::Remove));
    }
}
