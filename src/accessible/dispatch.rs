//! # Accessor Dispatch
//!
//! [`Dispatcher`] is the runtime entry point. Given an object and an accessor call it:
//!
//! 1. loads the class metadata (memoized on the instance, cached per class),
//! 2. parses the method name (`getFoo` -> `get` + `foo`),
//! 3. maps `addX`/`removeX` item names to their backing collection property,
//! 4. checks the operation against the property's access rights (and, for collections,
//!    against the collection's allowed methods),
//! 5. reads, validates and writes, or runs a collection mutator.
//!
//! Writes always happen after validation succeeds, so a refused call leaves the object
//! untouched.
//!
//! ```
//! use std::sync::Arc;
//! use accessible::class::{ClassDescriptor, Operation, PropertyDescriptor};
//! use accessible::dispatch::Dispatcher;
//! use accessible::registry::ClassRegistry;
//! use accessible::validation::NoopValidator;
//! use accessible::value::Value;
//!
//! let registry = ClassRegistry::new().with(
//!     ClassDescriptor::new("Basic")
//!         .property(PropertyDescriptor::new("foo").access([Operation::Get, Operation::Set])),
//! );
//! let dispatcher = Dispatcher::new(Arc::new(registry), Arc::new(NoopValidator));
//! let mut basic = dispatcher.construct("Basic", vec![]).unwrap();
//!
//! let foo = dispatcher
//!     .bind(&mut basic)
//!     .call("setFoo", vec!["x".into()])
//!     .unwrap()
//!     .get("getFoo")
//!     .unwrap();
//! assert_eq!(foo, Value::from("x"));
//! ```

use crate::cache::{FsCache, MetadataCache};
use crate::class::{Initializer, Operation};
use crate::config::AccessibleConfig;
use crate::error::{AccessError, Result};
use crate::metadata::ClassMetadata;
use crate::mutators::mutator_for;
use crate::object::{Accessible, Instance};
use crate::registry::MetadataProvider;
use crate::validation::{ConstraintValidator, ValidationTarget};
use crate::value::Value;
use once_cell::sync::Lazy;
use regex::Regex;
use std::sync::Arc;
use tracing::{debug, trace, warn};

static ACCESSOR_PATTERN: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^(get|set|is|has|add|remove)([A-Z].*)$").expect("accessor pattern is valid")
});

/// A parsed accessor method name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MethodCall {
    pub operation: Operation,
    /// Property name, or item name for `add`/`remove`, with its first letter lowered.
    pub name: String,
}

impl MethodCall {
    pub fn parse(method: &str) -> Result<Self> {
        let captures = ACCESSOR_PATTERN
            .captures(method)
            .ok_or_else(|| AccessError::UnknownMethod(method.to_string()))?;
        let operation = Operation::from_prefix(&captures[1])
            .ok_or_else(|| AccessError::UnknownMethod(method.to_string()))?;
        Ok(Self {
            operation,
            name: lower_first(&captures[2]),
        })
    }

    /// The conventional method name, e.g. `setFoo`.
    pub fn method_name(operation: Operation, name: &str) -> String {
        format!("{}{}", operation.prefix(), upper_first(name))
    }
}

fn lower_first(s: &str) -> String {
    let mut chars = s.chars();
    match chars.next() {
        Some(first) => first.to_lowercase().chain(chars).collect(),
        None => String::new(),
    }
}

fn upper_first(s: &str) -> String {
    let mut chars = s.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

/// Result of an accessor call.
#[derive(Debug, Clone, PartialEq)]
pub enum Outcome {
    /// A getter returned this value.
    Value(Value),
    /// A setter or mutator ran; the call returns the object itself.
    Chained,
}

impl Outcome {
    pub fn into_value(self) -> Option<Value> {
        match self {
            Outcome::Value(value) => Some(value),
            Outcome::Chained => None,
        }
    }
}

/// Authorizes and executes accessor calls from class metadata.
pub struct Dispatcher {
    cache: Arc<MetadataCache>,
    validator: Arc<dyn ConstraintValidator>,
    validation: bool,
}

impl Dispatcher {
    pub fn new(
        provider: Arc<dyn MetadataProvider>,
        validator: Arc<dyn ConstraintValidator>,
    ) -> Self {
        Self::with_cache(Arc::new(MetadataCache::new(provider)), validator)
    }

    /// Share one metadata cache between several dispatchers.
    pub fn with_cache(cache: Arc<MetadataCache>, validator: Arc<dyn ConstraintValidator>) -> Self {
        Self {
            cache,
            validator,
            validation: true,
        }
    }

    /// Wire a dispatcher from configuration: a filesystem cache when `cache_dir` is set,
    /// and the global validation switch.
    pub fn from_config(
        config: &AccessibleConfig,
        provider: Arc<dyn MetadataProvider>,
        validator: Arc<dyn ConstraintValidator>,
    ) -> Result<Self> {
        let mut cache = MetadataCache::new(provider);
        if let Some(dir) = &config.cache_dir {
            debug!(dir = %dir.display(), "using persistent metadata cache");
            cache = cache.with_persistent(Arc::new(FsCache::new(dir)?));
        }
        let mut dispatcher = Self::with_cache(Arc::new(cache), validator);
        dispatcher.validation = config.validation;
        Ok(dispatcher)
    }

    pub fn cache(&self) -> &MetadataCache {
        &self.cache
    }

    /// The class metadata of `object`, memoized on the instance.
    pub fn metadata_of<O: Accessible + ?Sized>(&self, object: &O) -> Result<Arc<ClassMetadata>> {
        object
            .instance_metadata()
            .get_or_try_init(|| self.cache.metadata(object.class_name()))
            .map(Arc::clone)
    }

    /// Handle for chaining calls on one object.
    pub fn bind<'a, O: Accessible>(&'a self, object: &'a mut O) -> Bound<'a, O> {
        Bound {
            dispatcher: self,
            object,
        }
    }

    /// Dispatch a call by method name, e.g. `call(&mut obj, "addItem", vec!["a".into()])`.
    pub fn call<O: Accessible>(&self, object: &mut O, method: &str, args: Vec<Value>) -> Result<Outcome> {
        // Metadata first: a broken class fails every call, even malformed ones.
        self.metadata_of(object)?;
        let call = MethodCall::parse(method)?;
        self.dispatch(object, method, call.operation, &call.name, args)
    }

    /// Dispatch an already parsed call. `name` is the property name, or the item name
    /// for `add`/`remove`.
    pub fn invoke<O: Accessible>(
        &self,
        object: &mut O,
        operation: Operation,
        name: &str,
        args: Vec<Value>,
    ) -> Result<Outcome> {
        let method = MethodCall::method_name(operation, name);
        self.dispatch(object, &method, operation, name, args)
    }

    fn dispatch<O: Accessible>(
        &self,
        object: &mut O,
        method: &str,
        operation: Operation,
        name: &str,
        args: Vec<Value>,
    ) -> Result<Outcome> {
        let metadata = self.metadata_of(object)?;
        trace!(class = %metadata.class, method, "dispatching accessor call");
        let unknown = || AccessError::UnknownMethod(method.to_string());

        let collection = if operation.is_collection() {
            let descriptor = metadata.collections.by_item_name(name).ok_or_else(unknown)?;
            if !descriptor.allows(operation) {
                return Err(unknown());
            }
            Some(descriptor)
        } else {
            None
        };
        let property = collection.map_or(name, |c| c.property.as_str());

        if !metadata.access_rights.allows(property, operation) {
            return Err(unknown());
        }

        match (operation, collection) {
            (Operation::Get | Operation::Is | Operation::Has, _) => {
                expect_args(method, 0, &args)?;
                let value = object.read(property).cloned().ok_or_else(unknown)?;
                Ok(Outcome::Value(value))
            }
            (Operation::Set, _) => {
                expect_args(method, 1, &args)?;
                let Some(value) = args.into_iter().next() else {
                    return Err(unknown());
                };
                self.check(
                    &metadata,
                    object,
                    property,
                    &value,
                    || format!("Argument given for method {} is invalid", method),
                )?;
                object.write(property, value)?;
                Ok(Outcome::Chained)
            }
            (Operation::Add | Operation::Remove, Some(descriptor)) => {
                let mutator = mutator_for(descriptor.behavior);
                expect_args(method, mutator.arity(operation), &args)?;
                let apply = |collection: &mut Value, args: Vec<Value>| match operation {
                    Operation::Add => mutator.add(property, collection, args),
                    _ => mutator.remove(property, collection, args),
                };

                if self.validates(&metadata) {
                    let mut candidate = object.read(property).cloned().ok_or_else(unknown)?;
                    apply(&mut candidate, args)?;
                    self.check(&metadata, object, property, &candidate, || {
                        format!("Argument given for method {} is invalid", method)
                    })?;
                    let collection = object.collection_mut(property).ok_or_else(unknown)?;
                    *collection = candidate;
                } else {
                    let collection = object.collection_mut(property).ok_or_else(unknown)?;
                    apply(collection, args)?;
                }
                Ok(Outcome::Chained)
            }
            (Operation::Add | Operation::Remove, None) => Err(AccessError::Configuration(format!(
                "{} resolved to a collection operation without a collection descriptor.",
                method
            ))),
        }
    }

    /// Build a new instance of `class`: declare its properties, apply initializers, then
    /// validate and assign the constructor arguments. No instance escapes on failure.
    pub fn construct(&self, class: &str, args: Vec<Value>) -> Result<Instance> {
        self.construct_nested(class, args, &mut Vec::new())
    }

    /// Apply initializers and constructor arguments to an existing object.
    ///
    /// Every argument is validated before any is assigned. On failure every field the
    /// call touched is put back, so the object is left as it was.
    pub fn initialize<O: Accessible>(&self, object: &mut O, args: Vec<Value>) -> Result<()> {
        let mut chain = vec![object.class_name().to_string()];
        self.initialize_nested(object, args, &mut chain)
    }

    fn construct_nested(&self, class: &str, args: Vec<Value>, chain: &mut Vec<String>) -> Result<Instance> {
        if chain.iter().any(|c| c == class) {
            return Err(AccessError::Configuration(format!(
                "Object initializers form a cycle: {} -> {}.",
                chain.join(" -> "),
                class
            )));
        }
        let metadata = self.cache.metadata(class)?;
        let mut instance = Instance::from_metadata(metadata);
        chain.push(class.to_string());
        let initialized = self.initialize_nested(&mut instance, args, chain);
        chain.pop();
        initialized.map(|()| instance)
    }

    fn initialize_nested<O: Accessible>(
        &self,
        object: &mut O,
        args: Vec<Value>,
        chain: &mut Vec<String>,
    ) -> Result<()> {
        let metadata = self.metadata_of(object)?;
        let expected = metadata.construct_arguments.len();
        if args.len() != expected {
            return Err(AccessError::WrongConstructorArgumentCount {
                class: metadata.class.clone(),
                expected,
                given: args.len(),
            });
        }

        let mut initial = Vec::with_capacity(metadata.initial_values.len());
        for (property, initializer) in &metadata.initial_values {
            let value = match initializer {
                Initializer::Value(value) => value.clone(),
                Initializer::Object { class } => {
                    trace!(property = %property, class = %class, "constructing initial object");
                    Value::from(self.construct_nested(class, Vec::new(), chain)?)
                }
            };
            initial.push((property.as_str(), value));
        }

        let touched: Vec<(&str, Option<Value>)> = initial
            .iter()
            .map(|(property, _)| *property)
            .chain(metadata.construct_arguments.iter().map(String::as_str))
            .map(|property| (property, object.read(property).cloned()))
            .collect();

        let applied = self.apply_initialization(&metadata, object, initial, args);
        if applied.is_err() {
            for (property, prior) in touched.into_iter().rev() {
                if let Some(prior) = prior {
                    if let Err(e) = object.write(property, prior) {
                        warn!(property, error = %e, "could not restore field after failed initialization");
                    }
                }
            }
        }
        applied
    }

    /// Initializers first, so validators see them; arguments are only written once all
    /// of them passed.
    fn apply_initialization<O: Accessible>(
        &self,
        metadata: &ClassMetadata,
        object: &mut O,
        initial: Vec<(&str, Value)>,
        args: Vec<Value>,
    ) -> Result<()> {
        for (property, value) in initial {
            object.write(property, value)?;
        }

        for (property, value) in metadata.construct_arguments.iter().zip(&args) {
            self.check(metadata, object, property, value, || {
                format!(
                    "Object initialization failed; argument given for the property {} is invalid",
                    property
                )
            })?;
        }

        for (property, value) in metadata.construct_arguments.iter().zip(args) {
            object.write(property, value)?;
        }
        debug!(class = %metadata.class, "object initialized");
        Ok(())
    }

    fn validates(&self, metadata: &ClassMetadata) -> bool {
        self.validation && metadata.validation_enabled
    }

    fn check<O, F>(
        &self,
        metadata: &ClassMetadata,
        object: &O,
        property: &str,
        value: &Value,
        context: F,
    ) -> Result<()>
    where
        O: Accessible,
        F: FnOnce() -> String,
    {
        if !self.validates(metadata) {
            return Ok(());
        }
        let target = ValidationTarget {
            object,
            class: &metadata.class,
            lineage: &metadata.lineage,
            property,
        };
        let violations = self.validator.validate(&target, value);
        if violations.is_empty() {
            return Ok(());
        }
        Err(AccessError::InvalidValue {
            context: context(),
            messages: violations.into_iter().map(|v| v.message).collect(),
        })
    }
}

fn expect_args(method: &str, expected: usize, args: &[Value]) -> Result<()> {
    if args.len() == expected {
        Ok(())
    } else {
        Err(AccessError::WrongArgumentCount {
            method: method.to_string(),
            expected,
            given: args.len(),
        })
    }
}

/// An object bound to a dispatcher, for fluent call chains.
pub struct Bound<'a, O: Accessible> {
    dispatcher: &'a Dispatcher,
    object: &'a mut O,
}

impl<'a, O: Accessible> Bound<'a, O> {
    /// Run a setter or mutator and keep chaining. A getter's value is discarded.
    pub fn call(&mut self, method: &str, args: Vec<Value>) -> Result<&mut Self> {
        self.dispatcher.call(self.object, method, args)?;
        Ok(self)
    }

    /// Run a getter and return its value.
    pub fn get(&mut self, method: &str) -> Result<Value> {
        match self.dispatcher.call(self.object, method, Vec::new())? {
            Outcome::Value(value) => Ok(value),
            Outcome::Chained => Err(AccessError::UnknownMethod(method.to_string())),
        }
    }
}
