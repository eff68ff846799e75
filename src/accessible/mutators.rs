//! Collection mutators behind `addX` / `removeX`.
//!
//! | Behavior | Backing value | `add` | `remove` |
//! |----------|---------------|-------|----------|
//! | list | `Value::List` | `add(item)` appends | `remove(item)` drops the first equal item |
//! | map | `Value::Map` | `add(key, value)` inserts or overwrites | `remove(key)` drops the entry |
//! | set | `Value::List` | `add(item)` appends unless present | `remove(item)` drops it |
//!
//! A `Null` backing field counts as an empty collection. Removing something absent is a
//! no-op for every behavior. Arity is checked by the dispatcher through
//! [`CollectionMutator::arity`] before a mutator runs.

use crate::class::{Behavior, Operation};
use crate::error::{AccessError, Result};
use crate::value::Value;
use std::collections::BTreeMap;

pub trait CollectionMutator: Sync {
    fn behavior(&self) -> Behavior;

    /// Number of call arguments `operation` takes.
    fn arity(&self, operation: Operation) -> usize;

    fn add(&self, property: &str, collection: &mut Value, args: Vec<Value>) -> Result<()>;

    fn remove(&self, property: &str, collection: &mut Value, args: Vec<Value>) -> Result<()>;
}

pub struct ListMutator;
pub struct MapMutator;
pub struct SetMutator;

/// The stateless mutator for `behavior`.
pub fn mutator_for(behavior: Behavior) -> &'static dyn CollectionMutator {
    match behavior {
        Behavior::List => &ListMutator,
        Behavior::Map => &MapMutator,
        Behavior::Set => &SetMutator,
    }
}

impl CollectionMutator for ListMutator {
    fn behavior(&self) -> Behavior {
        Behavior::List
    }

    fn arity(&self, _operation: Operation) -> usize {
        1
    }

    fn add(&self, property: &str, collection: &mut Value, args: Vec<Value>) -> Result<()> {
        let items = list_mut(property, Behavior::List, collection)?;
        items.extend(args.into_iter().take(1));
        Ok(())
    }

    fn remove(&self, property: &str, collection: &mut Value, args: Vec<Value>) -> Result<()> {
        let items = list_mut(property, Behavior::List, collection)?;
        if let Some(item) = args.first() {
            if let Some(position) = items.iter().position(|existing| existing == item) {
                items.remove(position);
            }
        }
        Ok(())
    }
}

impl CollectionMutator for MapMutator {
    fn behavior(&self) -> Behavior {
        Behavior::Map
    }

    fn arity(&self, operation: Operation) -> usize {
        match operation {
            Operation::Add => 2,
            _ => 1,
        }
    }

    fn add(&self, property: &str, collection: &mut Value, args: Vec<Value>) -> Result<()> {
        let mut args = args.into_iter();
        let (Some(key), Some(value)) = (args.next(), args.next()) else {
            return Ok(());
        };
        let key = map_key(property, &key)?;
        map_mut(property, collection)?.insert(key, value);
        Ok(())
    }

    fn remove(&self, property: &str, collection: &mut Value, args: Vec<Value>) -> Result<()> {
        let Some(key) = args.first() else {
            return Ok(());
        };
        let key = map_key(property, key)?;
        map_mut(property, collection)?.remove(&key);
        Ok(())
    }
}

impl CollectionMutator for SetMutator {
    fn behavior(&self) -> Behavior {
        Behavior::Set
    }

    fn arity(&self, _operation: Operation) -> usize {
        1
    }

    fn add(&self, property: &str, collection: &mut Value, args: Vec<Value>) -> Result<()> {
        let items = list_mut(property, Behavior::Set, collection)?;
        for item in args.into_iter().take(1) {
            if !items.contains(&item) {
                items.push(item);
            }
        }
        Ok(())
    }

    fn remove(&self, property: &str, collection: &mut Value, args: Vec<Value>) -> Result<()> {
        let items = list_mut(property, Behavior::Set, collection)?;
        if let Some(item) = args.first() {
            items.retain(|existing| existing != item);
        }
        Ok(())
    }
}

fn list_mut<'a>(
    property: &str,
    behavior: Behavior,
    collection: &'a mut Value,
) -> Result<&'a mut Vec<Value>> {
    if collection.is_null() {
        *collection = Value::List(Vec::new());
    }
    match collection {
        Value::List(items) => Ok(items),
        _ => Err(AccessError::CollectionShape {
            property: property.to_string(),
            expected: behavior,
        }),
    }
}

fn map_mut<'a>(property: &str, collection: &'a mut Value) -> Result<&'a mut BTreeMap<String, Value>> {
    if collection.is_null() {
        *collection = Value::Map(BTreeMap::new());
    }
    match collection {
        Value::Map(entries) => Ok(entries),
        _ => Err(AccessError::CollectionShape {
            property: property.to_string(),
            expected: Behavior::Map,
        }),
    }
}

fn map_key(property: &str, key: &Value) -> Result<String> {
    match key {
        Value::Str(s) => Ok(s.clone()),
        Value::Int(i) => Ok(i.to_string()),
        other => Err(AccessError::InvalidKey {
            property: property.to_string(),
            key: serde_json::Value::from(other.clone()).to_string(),
        }),
    }
}
