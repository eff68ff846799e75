use super::{check_property_name, effective_properties};
use crate::class::{ClassDescriptor, Operation};
use crate::error::{AccessError, Result};
use crate::inflector::singularize;
use crate::metadata::{CollectionDescriptor, Collections};
use std::collections::BTreeSet;

/// Reads the list/map/set descriptors of every effective property.
///
/// A property may carry at most one collection annotation, item names must be unique
/// within the class, and a `methods` restriction must be a non-empty subset of
/// `{add, remove}`.
pub fn read_collections(lineage: &[&ClassDescriptor]) -> Result<Collections> {
    let class = lineage.first().map(|c| c.name.as_str()).unwrap_or_default();
    let mut collections = Collections::new();

    for property in effective_properties(lineage) {
        let annotations = property.collection_annotations();
        let (behavior, spec) = match annotations.as_slice() {
            [] => continue,
            [single] => *single,
            [..] => {
                let kinds: Vec<String> = annotations.iter().map(|(b, _)| b.to_string()).collect();
                return Err(AccessError::Configuration(format!(
                    "Property {}::{} declares several collection behaviors ({}).",
                    class,
                    property.name,
                    kinds.join(", ")
                )));
            }
        };

        check_property_name(class, &property.name)?;

        let item_name = spec
            .item_name
            .clone()
            .unwrap_or_else(|| singularize(&property.name));
        check_property_name(class, &item_name)?;

        let methods = match &spec.methods {
            None => default_methods(),
            Some(methods) => {
                if methods.is_empty() || methods.iter().any(|m| !m.is_collection()) {
                    return Err(AccessError::Configuration(format!(
                        "Property {}::{} restricts its collection methods to {:?}; \
                         only add and remove are allowed.",
                        class, property.name, methods
                    )));
                }
                methods.clone()
            }
        };

        let descriptor = CollectionDescriptor {
            property: property.name.clone(),
            item_name,
            behavior,
            methods,
        };
        if let Some(existing) = collections.insert(descriptor) {
            return Err(AccessError::Configuration(format!(
                "Properties {}::{} and {}::{} share the item name {}.",
                class, existing.property, class, property.name, existing.item_name
            )));
        }
    }

    Ok(collections)
}

fn default_methods() -> BTreeSet<Operation> {
    [Operation::Add, Operation::Remove].into_iter().collect()
}
