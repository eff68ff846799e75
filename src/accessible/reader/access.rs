use super::{check_property_name, effective_properties};
use crate::class::ClassDescriptor;
use crate::error::Result;
use crate::metadata::AccessRights;
use std::collections::BTreeSet;

/// Reads the access rights of every effective property.
///
/// Properties without an access declaration get an empty set.
pub fn read_access_rights(lineage: &[&ClassDescriptor]) -> Result<AccessRights> {
    let class = lineage.first().map(|c| c.name.as_str()).unwrap_or_default();
    let mut rights = AccessRights::new();

    for property in effective_properties(lineage) {
        if property.is_reachable() {
            check_property_name(class, &property.name)?;
        }
        let operations = property.access.clone().unwrap_or_else(BTreeSet::new);
        rights.insert(property.name.clone(), operations);
    }

    Ok(rights)
}

/// Whether constraint validation runs for instances of the most-derived class.
///
/// The nearest class declaring a flag decides; validation is on by default.
pub fn read_validation_enabled(lineage: &[&ClassDescriptor]) -> bool {
    lineage
        .iter()
        .find_map(|class| class.constraints_validation)
        .unwrap_or(true)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::class::{Operation, PropertyDescriptor};

    fn basic() -> ClassDescriptor {
        ClassDescriptor::new("Basic")
            .property(PropertyDescriptor::new("foo").access([Operation::Get, Operation::Set]))
            .property(PropertyDescriptor::new("bar").access([Operation::Is]))
            .property(PropertyDescriptor::new("baz").access([Operation::Has]))
            .property(PropertyDescriptor::new("notAccessibleProperty"))
    }

    #[test]
    fn test_reads_declared_operations() {
        let class = basic();
        let rights = read_access_rights(&[&class]).unwrap();
        assert!(rights.allows("foo", Operation::Get));
        assert!(rights.allows("foo", Operation::Set));
        assert!(!rights.allows("foo", Operation::Is));
        assert!(rights.allows("bar", Operation::Is));
        assert!(rights.allows("baz", Operation::Has));
    }

    #[test]
    fn test_undeclared_access_is_an_empty_entry() {
        let class = basic();
        let rights = read_access_rights(&[&class]).unwrap();
        let ops = rights.operations("notAccessibleProperty").unwrap();
        assert!(ops.is_empty());
    }

    #[test]
    fn test_inherited_properties_are_included() {
        let base = basic();
        let derived = ClassDescriptor::new("Derived")
            .extends("Basic")
            .property(PropertyDescriptor::new("foo").access([Operation::Get]));
        let rights = read_access_rights(&[&derived, &base]).unwrap();
        assert!(rights.allows("bar", Operation::Is));
        assert!(!rights.allows("foo", Operation::Set));
    }

    #[test]
    fn test_capitalized_accessible_property_is_rejected() {
        let class = ClassDescriptor::new("Bad")
            .property(PropertyDescriptor::new("Foo").access([Operation::Get]))
            .property(PropertyDescriptor::new("_hidden"));
        let err = read_access_rights(&[&class]).unwrap_err();
        assert!(err.to_string().contains("Bad::Foo"));
    }

    #[test]
    fn test_validation_flag_is_inherited_unless_overridden() {
        let base = ClassDescriptor::new("Base").disable_constraints_validation();
        let child = ClassDescriptor::new("Child").extends("Base");
        let grandchild = ClassDescriptor::new("GrandChild")
            .extends("Child")
            .enable_constraints_validation();

        assert!(read_validation_enabled(&[&basic()]));
        assert!(!read_validation_enabled(&[&base]));
        assert!(!read_validation_enabled(&[&child, &base]));
        assert!(read_validation_enabled(&[&grandchild, &child, &base]));
    }
}
