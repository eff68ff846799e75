use crate::class::Behavior;
use thiserror::Error;

/// Broad classes of failure, independent of the concrete variant.
///
/// Callers that only care about *why* a call was refused (rather than the exact
/// message) should match on this instead of on [`AccessError`] variants.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// The method is not an accessor, or is not authorized for the property.
    UnknownMethod,
    /// Wrong number of arguments for an accessor or a constructor.
    Arity,
    /// The validator rejected a value.
    InvalidValue,
    /// The class metadata is inconsistent. Not recoverable at runtime.
    Configuration,
    /// File, serialization or cache backend failure.
    Io,
}

#[derive(Error, Debug)]
pub enum AccessError {
    #[error("Method {0} does not exist.")]
    UnknownMethod(String),

    #[error("Property {0} is not declared.")]
    UnknownProperty(String),

    #[error("Method {method} expects {expected} argument(s), {given} given.")]
    WrongArgumentCount {
        method: String,
        expected: usize,
        given: usize,
    },

    #[error(
        "Wrong number of arguments given to the constructor of {class}: expected {expected}, got {given}."
    )]
    WrongConstructorArgumentCount {
        class: String,
        expected: usize,
        given: usize,
    },

    #[error(
        "{context}; its constraints validation failed with the following messages: {}.",
        quote_join(.messages)
    )]
    InvalidValue {
        context: String,
        messages: Vec<String>,
    },

    #[error("Key {key} given for property {property} must be a string or an integer.")]
    InvalidKey { property: String, key: String },

    #[error("Configuration error: {0}")]
    Configuration(String),

    #[error("Class {0} is not registered.")]
    UnknownClass(String),

    #[error("Property {property} does not hold a {expected} collection.")]
    CollectionShape { property: String, expected: Behavior },

    #[error("Config error: {0}")]
    Config(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("TOML error: {0}")]
    Toml(#[from] toml::de::Error),

    #[error("Cache error: {0}")]
    Cache(String),
}

impl AccessError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            AccessError::UnknownMethod(_) | AccessError::UnknownProperty(_) => {
                ErrorKind::UnknownMethod
            }
            AccessError::WrongArgumentCount { .. }
            | AccessError::WrongConstructorArgumentCount { .. } => ErrorKind::Arity,
            AccessError::InvalidValue { .. } | AccessError::InvalidKey { .. } => {
                ErrorKind::InvalidValue
            }
            AccessError::Configuration(_)
            | AccessError::UnknownClass(_)
            | AccessError::CollectionShape { .. }
            | AccessError::Config(_) => ErrorKind::Configuration,
            AccessError::Io(_)
            | AccessError::Serialization(_)
            | AccessError::Toml(_)
            | AccessError::Cache(_) => ErrorKind::Io,
        }
    }
}

/// Renders violation messages the way they appear in error text: `"a", "b"`.
fn quote_join(messages: &[String]) -> String {
    messages
        .iter()
        .map(|m| format!("\"{}\"", m))
        .collect::<Vec<_>>()
        .join(", ")
}

pub type Result<T> = std::result::Result<T, AccessError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_invalid_value_lists_every_message() {
        let err = AccessError::InvalidValue {
            context: "Argument given for method setFoo is invalid".to_string(),
            messages: vec!["too short".to_string(), "not a word".to_string()],
        };
        assert_eq!(
            err.to_string(),
            "Argument given for method setFoo is invalid; its constraints validation failed \
             with the following messages: \"too short\", \"not a word\"."
        );
        assert_eq!(err.kind(), ErrorKind::InvalidValue);
    }

    #[test]
    fn test_unknown_method_message() {
        let err = AccessError::UnknownMethod("isFoo".to_string());
        assert_eq!(err.to_string(), "Method isFoo does not exist.");
        assert_eq!(err.kind(), ErrorKind::UnknownMethod);
    }

    #[test]
    fn test_both_arity_variants_share_a_kind() {
        let setter = AccessError::WrongArgumentCount {
            method: "setFoo".to_string(),
            expected: 1,
            given: 0,
        };
        let ctor = AccessError::WrongConstructorArgumentCount {
            class: "Basic".to_string(),
            expected: 2,
            given: 1,
        };
        assert_eq!(setter.kind(), ErrorKind::Arity);
        assert_eq!(ctor.kind(), ErrorKind::Arity);
        assert!(ctor.to_string().starts_with("Wrong number of arguments"));
    }
}
