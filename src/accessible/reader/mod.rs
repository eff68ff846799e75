//! # Metadata Readers
//!
//! Readers turn a class lineage (as returned by [`registry::lineage`](crate::registry::lineage),
//! most-derived first) into one part of [`ClassMetadata`](crate::metadata::ClassMetadata).
//! They are pure: the same lineage always yields the same result or the same error, which
//! is what lets the cache store results without ever invalidating them.
//!
//! - [`access`]: per-property access rights and the class validation flag
//! - [`collections`]: list/map/set descriptors, indexed by item name and by property
//! - [`construct`]: constructor argument list and property initializers

use crate::class::{ClassDescriptor, PropertyDescriptor};
use crate::error::{AccessError, Result};
use std::collections::HashSet;

pub mod access;
pub mod collections;
pub mod construct;

/// The properties an instance of the most-derived class actually has.
///
/// A property redeclared lower in the hierarchy shadows the ancestor's declaration.
/// Base properties come first, in declaration order.
pub fn effective_properties<'a>(lineage: &[&'a ClassDescriptor]) -> Vec<&'a PropertyDescriptor> {
    let mut seen = HashSet::new();
    let mut ordered: Vec<&'a PropertyDescriptor> = Vec::new();
    for &class in lineage.iter().rev() {
        for property in &class.properties {
            if seen.insert(property.name.as_str()) {
                ordered.push(nearest_declaration(lineage, &property.name).unwrap_or(property));
            }
        }
    }
    ordered
}

/// The declaration of `name` closest to the most-derived class.
fn nearest_declaration<'a>(
    lineage: &[&'a ClassDescriptor],
    name: &str,
) -> Option<&'a PropertyDescriptor> {
    lineage.iter().find_map(|&class| class.find_property(name))
}

/// Checks that a property reachable through method names survives the round trip
/// `fooBar` -> `getFooBar` -> `fooBar`.
pub(crate) fn check_property_name(class: &str, property: &str) -> Result<()> {
    let mut chars = property.chars();
    let valid = match chars.next() {
        Some(first) => {
            first.is_ascii_lowercase() && chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
        }
        None => false,
    };
    if valid {
        Ok(())
    } else {
        Err(AccessError::Configuration(format!(
            "Property {}::{} cannot be reached through accessor methods; \
             accessible property names must be lowerCamelCase.",
            class, property
        )))
    }
}
