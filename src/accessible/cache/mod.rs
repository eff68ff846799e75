//! # Metadata Cache
//!
//! Reading class metadata means walking the hierarchy and running every reader, so the
//! result is computed once per class and kept for the life of the cache.
//!
//! ## Layers
//!
//! ```text
//! metadata("Coll")
//!   │
//!   ├─ in-memory cell for "Coll" ── initialized? ──▶ Arc<ClassMetadata>
//!   │
//!   └─ first request: for each metadata kind
//!        ├─ PersistentCache::fetch(sha256("<kind>:Coll"))  ── hit ──▶ decode
//!        └─ miss: run the reader, then PersistentCache::save
//! ```
//!
//! The in-memory layer holds one `OnceCell` per class, so concurrent first requests for
//! the same class run the readers once. A reader error is not stored: the next request
//! runs the readers again and fails the same way.
//!
//! The cache is never invalidated. Changing a class descriptor after its metadata was
//! requested is outside the contract.

use crate::error::Result;
use crate::metadata::ClassMetadata;
use crate::reader::{access, collections, construct, effective_properties};
use crate::registry::{lineage, MetadataProvider};
use once_cell::sync::OnceCell;
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use tracing::{debug, trace, warn};

mod persistent;

pub use persistent::{cache_key, FsCache, MemoryCache, PersistentCache};

type Slot = Arc<OnceCell<Arc<ClassMetadata>>>;

/// Process-lifetime cache of [`ClassMetadata`], keyed by class name.
pub struct MetadataCache {
    provider: Arc<dyn MetadataProvider>,
    persistent: Option<Arc<dyn PersistentCache>>,
    slots: Mutex<HashMap<String, Slot>>,
}

impl MetadataCache {
    pub fn new(provider: Arc<dyn MetadataProvider>) -> Self {
        Self {
            provider,
            persistent: None,
            slots: Mutex::new(HashMap::new()),
        }
    }

    /// Mirror every computed metadata kind to `persistent`.
    pub fn with_persistent(mut self, persistent: Arc<dyn PersistentCache>) -> Self {
        self.persistent = Some(persistent);
        self
    }

    /// Metadata for `class`, computed on first request.
    pub fn metadata(&self, class: &str) -> Result<Arc<ClassMetadata>> {
        let slot = self.slot(class);
        if let Some(metadata) = slot.get() {
            trace!(class, "metadata cache hit");
            return Ok(Arc::clone(metadata));
        }
        slot.get_or_try_init(|| self.resolve(class).map(Arc::new))
            .map(Arc::clone)
    }

    /// Whether metadata for `class` has been computed successfully.
    pub fn is_cached(&self, class: &str) -> bool {
        let slots = self
            .slots
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        slots.get(class).is_some_and(|slot| slot.get().is_some())
    }

    fn slot(&self, class: &str) -> Slot {
        let mut slots = self
            .slots
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        Arc::clone(slots.entry(class.to_string()).or_default())
    }

    fn resolve(&self, class: &str) -> Result<ClassMetadata> {
        let lineage = lineage(self.provider.as_ref(), class)?;
        debug!(class, depth = lineage.len(), "resolving class metadata");

        let access_rights =
            self.layered("accessRights", class, || access::read_access_rights(&lineage))?;
        let collections =
            self.layered("collections", class, || collections::read_collections(&lineage))?;
        let construct_arguments = self.layered("constructArguments", class, || {
            construct::read_construct_arguments(&lineage)
        })?;
        let initial_values = self.layered("propertiesToInitialize", class, || {
            construct::read_initial_values(&lineage)
        })?;
        let validation_enabled = self.layered("validationEnabled", class, || {
            Ok(access::read_validation_enabled(&lineage))
        })?;

        Ok(ClassMetadata {
            class: class.to_string(),
            lineage: lineage.iter().map(|c| c.name.clone()).collect(),
            properties: effective_properties(&lineage)
                .into_iter()
                .map(|p| p.name.clone())
                .collect(),
            access_rights,
            collections,
            construct_arguments,
            initial_values,
            validation_enabled,
        })
    }

    /// Runs `compute` unless the persistent layer already has the answer.
    ///
    /// A computed value is persisted only if it decodes back to itself, so a warm cache
    /// never yields different metadata than a cold one.
    fn layered<T, F>(&self, kind: &str, class: &str, compute: F) -> Result<T>
    where
        T: Serialize + DeserializeOwned + PartialEq,
        F: FnOnce() -> Result<T>,
    {
        let Some(persistent) = &self.persistent else {
            return compute();
        };
        let key = cache_key(kind, class);

        match persistent.fetch(&key) {
            Ok(Some(bytes)) => match serde_json::from_slice(&bytes) {
                Ok(value) => {
                    trace!(class, kind, "loaded metadata from persistent cache");
                    return Ok(value);
                }
                Err(e) => warn!(class, kind, error = %e, "discarding undecodable cache entry"),
            },
            Ok(None) => {}
            Err(e) => warn!(class, kind, error = %e, "persistent cache read failed"),
        }

        let value = compute()?;
        match serde_json::to_vec(&value) {
            Ok(bytes) => {
                let lossless =
                    serde_json::from_slice::<T>(&bytes).is_ok_and(|decoded| decoded == value);
                if !lossless {
                    debug!(class, kind, "metadata does not survive encoding, not persisted");
                } else if let Err(e) = persistent.save(&key, &bytes) {
                    warn!(class, kind, error = %e, "persistent cache write failed");
                }
            }
            Err(e) => warn!(class, kind, error = %e, "could not encode metadata for caching"),
        }
        Ok(value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::class::{ClassDescriptor, Initializer, Operation, PropertyDescriptor};
    use crate::error::ErrorKind;
    use crate::object::Instance;
    use crate::registry::ClassRegistry;
    use crate::value::Value;

    fn registry() -> ClassRegistry {
        ClassRegistry::new()
            .with(
                ClassDescriptor::new("Basic")
                    .property(PropertyDescriptor::new("foo").access([Operation::Get, Operation::Set])),
            )
            .with(
                ClassDescriptor::new("Broken").property(
                    PropertyDescriptor::new("x")
                        .initialize(1)
                        .initialize_object("Basic"),
                ),
            )
    }

    #[test]
    fn test_metadata_is_computed_once() {
        let cache = MetadataCache::new(Arc::new(registry()));
        assert!(!cache.is_cached("Basic"));
        let first = cache.metadata("Basic").unwrap();
        let second = cache.metadata("Basic").unwrap();
        assert!(Arc::ptr_eq(&first, &second));
        assert!(cache.is_cached("Basic"));
        assert_eq!(first.lineage, vec!["Basic"]);
        assert_eq!(first.properties, vec!["foo"]);
        assert!(first.validation_enabled);
    }

    #[test]
    fn test_configuration_errors_recur() {
        let cache = MetadataCache::new(Arc::new(registry()));
        let first = cache.metadata("Broken").unwrap_err();
        let second = cache.metadata("Broken").unwrap_err();
        assert_eq!(first.kind(), ErrorKind::Configuration);
        assert_eq!(first.to_string(), second.to_string());
        assert!(!cache.is_cached("Broken"));
    }

    #[test]
    fn test_unknown_class_is_an_error() {
        let cache = MetadataCache::new(Arc::new(registry()));
        assert!(cache.metadata("Missing").is_err());
    }

    #[test]
    fn test_every_kind_is_mirrored_to_the_persistent_layer() {
        let persistent = Arc::new(MemoryCache::new());
        let cache = MetadataCache::new(Arc::new(registry())).with_persistent(persistent.clone());
        cache.metadata("Basic").unwrap();
        assert_eq!(persistent.len(), 5);
        assert!(persistent
            .fetch(&cache_key("accessRights", "Basic"))
            .unwrap()
            .is_some());
    }

    #[test]
    fn test_persistent_entries_are_preferred_over_recomputation() {
        let persistent = Arc::new(MemoryCache::new());
        persistent
            .save(&cache_key("accessRights", "Basic"), br#"{"foo":["get"]}"#)
            .unwrap();
        let cache = MetadataCache::new(Arc::new(registry())).with_persistent(persistent);
        let metadata = cache.metadata("Basic").unwrap();
        assert!(metadata.access_rights.allows("foo", Operation::Get));
        assert!(!metadata.access_rights.allows("foo", Operation::Set));
    }

    #[test]
    fn test_undecodable_entries_fall_back_to_readers() {
        let persistent = Arc::new(MemoryCache::new());
        persistent
            .save(&cache_key("accessRights", "Basic"), b"not json")
            .unwrap();
        let cache = MetadataCache::new(Arc::new(registry())).with_persistent(persistent.clone());
        let metadata = cache.metadata("Basic").unwrap();
        assert!(metadata.access_rights.allows("foo", Operation::Set));
        let repaired = persistent
            .fetch(&cache_key("accessRights", "Basic"))
            .unwrap()
            .unwrap();
        assert_ne!(repaired, b"not json".to_vec());
    }

    #[test]
    fn test_concurrent_first_requests_agree() {
        let cache = Arc::new(MetadataCache::new(Arc::new(registry())));
        let handles: Vec<_> = (0..8)
            .map(|_| {
                let cache = Arc::clone(&cache);
                std::thread::spawn(move || cache.metadata("Basic").unwrap())
            })
            .collect();
        let results: Vec<_> = handles.into_iter().map(|h| h.join().unwrap()).collect();
        for metadata in &results[1..] {
            assert!(Arc::ptr_eq(&results[0], metadata));
        }
    }

    #[test]
    fn test_lossy_initial_values_are_not_persisted() {
        let registry = ClassRegistry::new().with(
            ClassDescriptor::new("Cfg")
                .property(PropertyDescriptor::new("limit").initialize(f64::INFINITY))
                .property(PropertyDescriptor::new("pet").initialize(Instance::new("Pet", ["name"]))),
        );
        let registry: Arc<ClassRegistry> = Arc::new(registry);
        let persistent = Arc::new(MemoryCache::new());

        let cold = MetadataCache::new(registry.clone())
            .with_persistent(persistent.clone())
            .metadata("Cfg")
            .unwrap();
        assert!(persistent
            .fetch(&cache_key("propertiesToInitialize", "Cfg"))
            .unwrap()
            .is_none());
        assert_eq!(persistent.len(), 4);

        let warm = MetadataCache::new(registry)
            .with_persistent(persistent)
            .metadata("Cfg")
            .unwrap();
        assert_eq!(cold.initial_values, warm.initial_values);
        assert!(matches!(
            warm.initial_values.get("pet"),
            Some(Initializer::Value(Value::Object(_)))
        ));
    }
}
