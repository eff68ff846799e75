//! Constraint validation hook.
//!
//! The dispatcher does not interpret rules. Before writing a value it asks a
//! [`ConstraintValidator`] for violations and refuses the write if there are any.
//! Validators are plain trait objects, so a closure works:
//!
//! ```
//! use accessible::validation::{ConstraintValidator, ValidationTarget, Violation};
//! use accessible::value::Value;
//!
//! let no_empty_strings = |_: &ValidationTarget<'_>, value: &Value| match value.as_str() {
//!     Some("") => vec![Violation::new("This value should not be blank.")],
//!     _ => Vec::new(),
//! };
//! # fn takes(_: &dyn ConstraintValidator) {}
//! # takes(&no_empty_strings);
//! ```

use crate::object::Readable;
use crate::value::Value;
use std::collections::HashMap;
use std::fmt;

/// One failed constraint.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Violation {
    pub message: String,
}

impl Violation {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

impl fmt::Display for Violation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.message)
    }
}

/// What is being validated: the current object and the property about to change.
pub struct ValidationTarget<'a> {
    pub object: &'a dyn Readable,
    pub class: &'a str,
    /// Class names, most-derived first.
    pub lineage: &'a [String],
    pub property: &'a str,
}

pub trait ConstraintValidator: Send + Sync {
    /// Violations for writing `value` to the target property. Empty means valid.
    fn validate(&self, target: &ValidationTarget<'_>, value: &Value) -> Vec<Violation>;
}

impl<F> ConstraintValidator for F
where
    F: Fn(&ValidationTarget<'_>, &Value) -> Vec<Violation> + Send + Sync,
{
    fn validate(&self, target: &ValidationTarget<'_>, value: &Value) -> Vec<Violation> {
        self(target, value)
    }
}

/// Accepts everything.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoopValidator;

impl ConstraintValidator for NoopValidator {
    fn validate(&self, _target: &ValidationTarget<'_>, _value: &Value) -> Vec<Violation> {
        Vec::new()
    }
}

type Check = Box<dyn Fn(&Value) -> Option<String> + Send + Sync>;

/// Per-property checks registered by class.
///
/// Checks declared on an ancestor apply to every subclass. Each check returns `Some`
/// message when the value is invalid; all failing checks are reported, in lineage order
/// (most-derived class first) and then registration order.
#[derive(Default)]
pub struct PropertyConstraints {
    checks: HashMap<(String, String), Vec<Check>>,
}

impl PropertyConstraints {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn constrain<F>(
        mut self,
        class: impl Into<String>,
        property: impl Into<String>,
        check: F,
    ) -> Self
    where
        F: Fn(&Value) -> Option<String> + Send + Sync + 'static,
    {
        self.checks
            .entry((class.into(), property.into()))
            .or_default()
            .push(Box::new(check));
        self
    }
}

impl ConstraintValidator for PropertyConstraints {
    fn validate(&self, target: &ValidationTarget<'_>, value: &Value) -> Vec<Violation> {
        target
            .lineage
            .iter()
            .filter_map(|class| {
                self.checks
                    .get(&(class.clone(), target.property.to_string()))
            })
            .flatten()
            .filter_map(|check| check(value))
            .map(Violation::new)
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::object::Instance;

    fn not_blank(value: &Value) -> Option<String> {
        match value.as_str() {
            Some(s) if !s.trim().is_empty() => None,
            _ => Some("This value should not be blank.".to_string()),
        }
    }

    fn validate(validator: &dyn ConstraintValidator, lineage: &[String], value: Value) -> Vec<Violation> {
        let object = Instance::new(lineage[0].clone(), ["name"]);
        let target = ValidationTarget {
            object: &object,
            class: &lineage[0],
            lineage,
            property: "name",
        };
        validator.validate(&target, &value)
    }

    #[test]
    fn test_noop_accepts_everything() {
        assert!(validate(&NoopValidator, &["A".to_string()], Value::Null).is_empty());
    }

    #[test]
    fn test_closures_are_validators() {
        let reject_all = |_: &ValidationTarget<'_>, _: &Value| vec![Violation::new("nope")];
        let violations = validate(&reject_all, &["A".to_string()], Value::Int(1));
        assert_eq!(violations, vec![Violation::new("nope")]);
    }

    #[test]
    fn test_ancestor_constraints_apply_to_subclasses() {
        let constraints = PropertyConstraints::new()
            .constrain("Base", "name", not_blank)
            .constrain("Derived", "name", |v| {
                (v.as_str().map(str::len).unwrap_or(0) > 5).then(|| "Too long.".to_string())
            });
        let lineage = vec!["Derived".to_string(), "Base".to_string()];

        assert!(validate(&constraints, &lineage, "bob".into()).is_empty());

        let messages: Vec<String> = validate(&constraints, &lineage, "        ".into())
            .into_iter()
            .map(|v| v.message)
            .collect();
        assert_eq!(messages, vec!["Too long.", "This value should not be blank."]);
    }

    #[test]
    fn test_unrelated_classes_are_not_checked() {
        let constraints = PropertyConstraints::new().constrain("Other", "name", not_blank);
        assert!(validate(&constraints, &["A".to_string()], Value::Null).is_empty());
    }
}
