//! # Accessible Objects
//!
//! The dispatcher never touches fields directly. It goes through three capability
//! traits, so the same dispatch logic serves hand-written structs and the dynamic
//! [`Instance`]:
//!
//! - [`Readable`]: read a declared field
//! - [`Writable`]: replace a declared field
//! - [`CollectionMutable`]: borrow a collection field for in-place mutation
//!
//! [`Accessible`] ties them together with the class name and the per-instance metadata
//! memo.

use crate::error::{AccessError, Result};
use crate::metadata::ClassMetadata;
use crate::value::Value;
use once_cell::sync::OnceCell;
use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;

pub trait Readable {
    /// The current value of `property`, or `None` if the field is not declared.
    fn read(&self, property: &str) -> Option<&Value>;
}

pub trait Writable {
    /// Replace the value of `property`. Fails if the field is not declared.
    fn write(&mut self, property: &str, value: Value) -> Result<()>;
}

pub trait CollectionMutable {
    /// Mutable access to a collection field, or `None` if the field is not declared.
    fn collection_mut(&mut self, property: &str) -> Option<&mut Value>;
}

/// An object whose fields are reached through accessor calls.
pub trait Accessible: Readable + Writable + CollectionMutable {
    fn class_name(&self) -> &str;

    fn instance_metadata(&self) -> &InstanceMetadata;
}

/// Per-instance memo of the class metadata.
///
/// Filled on the first accessor call and kept for the instance's lifetime, so later
/// calls skip the cache lookup entirely.
#[derive(Clone, Default)]
pub struct InstanceMetadata {
    cell: OnceCell<Arc<ClassMetadata>>,
}

impl InstanceMetadata {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self) -> Option<&Arc<ClassMetadata>> {
        self.cell.get()
    }

    pub fn get_or_try_init<F>(&self, init: F) -> Result<&Arc<ClassMetadata>>
    where
        F: FnOnce() -> Result<Arc<ClassMetadata>>,
    {
        self.cell.get_or_try_init(init)
    }

    /// Seed the memo; ignored if it is already set.
    pub(crate) fn prime(&self, metadata: Arc<ClassMetadata>) {
        let _ = self.cell.set(metadata);
    }
}

impl fmt::Debug for InstanceMetadata {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("InstanceMetadata")
            .field("loaded", &self.cell.get().is_some())
            .finish()
    }
}

/// A dynamically shaped object: a class name plus a field table.
///
/// Built by [`Dispatcher::construct`](crate::dispatch::Dispatcher::construct), which
/// declares every property of the class and applies initializers and constructor
/// arguments.
#[derive(Debug, Clone)]
pub struct Instance {
    class: String,
    fields: BTreeMap<String, Value>,
    metadata: InstanceMetadata,
}

impl Instance {
    /// An instance with the given fields declared and set to `Null`.
    pub fn new<S: Into<String>>(class: impl Into<String>, fields: impl IntoIterator<Item = S>) -> Self {
        Self {
            class: class.into(),
            fields: fields
                .into_iter()
                .map(|name| (name.into(), Value::Null))
                .collect(),
            metadata: InstanceMetadata::new(),
        }
    }

    pub(crate) fn from_metadata(metadata: Arc<ClassMetadata>) -> Self {
        let instance = Self::new(metadata.class.clone(), metadata.properties.iter().cloned());
        instance.metadata.prime(metadata);
        instance
    }

    pub fn class(&self) -> &str {
        &self.class
    }

    pub fn fields(&self) -> &BTreeMap<String, Value> {
        &self.fields
    }

    pub fn field(&self, name: &str) -> Option<&Value> {
        self.fields.get(name)
    }

    pub fn to_json(&self) -> serde_json::Value {
        let fields: serde_json::Map<String, serde_json::Value> = self
            .fields
            .iter()
            .map(|(k, v)| (k.clone(), v.clone().into()))
            .collect();
        serde_json::json!({
            "class": self.class,
            "fields": fields,
        })
    }
}

/// Two instances are equal when they have the same class and the same field values.
impl PartialEq for Instance {
    fn eq(&self, other: &Self) -> bool {
        self.class == other.class && self.fields == other.fields
    }
}

impl Readable for Instance {
    fn read(&self, property: &str) -> Option<&Value> {
        self.fields.get(property)
    }
}

impl Writable for Instance {
    fn write(&mut self, property: &str, value: Value) -> Result<()> {
        match self.fields.get_mut(property) {
            Some(slot) => {
                *slot = value;
                Ok(())
            }
            None => Err(AccessError::UnknownProperty(format!(
                "{}::{}",
                self.class, property
            ))),
        }
    }
}

impl CollectionMutable for Instance {
    fn collection_mut(&mut self, property: &str) -> Option<&mut Value> {
        self.fields.get_mut(property)
    }
}

impl Accessible for Instance {
    fn class_name(&self) -> &str {
        &self.class
    }

    fn instance_metadata(&self) -> &InstanceMetadata {
        &self.metadata
    }
}
