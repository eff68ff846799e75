//! Constructor metadata.
//!
//! Both readers walk the hierarchy base-most class first. For construct arguments the
//! first class declaring a list wins; for initializers the first value resolved for a
//! property wins, so an ancestor's default cannot be replaced further down.

use super::effective_properties;
use crate::class::{ClassDescriptor, Initializer};
use crate::error::{AccessError, Result};
use std::collections::BTreeMap;

/// The ordered property names the constructor expects. Empty when nothing is declared.
pub fn read_construct_arguments(lineage: &[&ClassDescriptor]) -> Result<Vec<String>> {
    let arguments = lineage
        .iter()
        .rev()
        .find_map(|class| class.construct.clone())
        .unwrap_or_default();

    let class = lineage.first().map(|c| c.name.as_str()).unwrap_or_default();
    let properties = effective_properties(lineage);
    for argument in &arguments {
        if !properties.iter().any(|p| &p.name == argument) {
            return Err(AccessError::Configuration(format!(
                "Constructor argument {} of class {} is not a declared property.",
                argument, class
            )));
        }
    }

    Ok(arguments)
}

/// The initializer of every property that declares one, anywhere in the hierarchy.
pub fn read_initial_values(lineage: &[&ClassDescriptor]) -> Result<BTreeMap<String, Initializer>> {
    let mut values = BTreeMap::new();

    for class in lineage.iter().rev() {
        for property in &class.properties {
            let initializer = match (&property.initialize, &property.initialize_object) {
                (Some(_), Some(_)) => {
                    return Err(AccessError::Configuration(format!(
                        "Two initial values are given for property {}.",
                        property.name
                    )))
                }
                (Some(value), None) => Initializer::Value(value.clone()),
                (None, Some(object_class)) => {
                    if object_class == &class.name {
                        return Err(AccessError::Configuration(format!(
                            "Property {}::{} cannot be initialized with an instance of its own class.",
                            class.name, property.name
                        )));
                    }
                    Initializer::Object {
                        class: object_class.clone(),
                    }
                }
                (None, None) => continue,
            };
            values.entry(property.name.clone()).or_insert(initializer);
        }
    }

    Ok(values)
}
