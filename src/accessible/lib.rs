//! # Accessible Architecture
//!
//! `accessible` gives objects **declared accessors**. A class states, in a side table of
//! metadata, which of its properties may be read (`get`/`is`/`has`), written (`set`) or
//! mutated as collections (`add`/`remove`), which properties its constructor takes, and
//! what values they start with. A single dispatcher then serves every accessor call from
//! that metadata. No per-property code is written.
//!
//! ## Layers
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │  CLI (main.rs, args.rs)                                     │
//! │  - Loads class files and config, prints JSON results        │
//! └─────────────────────────────────────────────────────────────┘
//!                              │
//!                              ▼
//! ┌─────────────────────────────────────────────────────────────┐
//! │  Dispatch (dispatch.rs, mutators.rs, validation.rs)         │
//! │  - Parses `getFoo`/`addItem`, authorizes, validates, writes │
//! │  - Constructs and initializes objects                       │
//! └─────────────────────────────────────────────────────────────┘
//!                              │
//!                              ▼
//! ┌─────────────────────────────────────────────────────────────┐
//! │  Metadata cache (cache/)                                    │
//! │  - One resolution per class, shared across threads          │
//! │  - Optional persistent layer (FsCache, MemoryCache)         │
//! └─────────────────────────────────────────────────────────────┘
//!                              │
//!                              ▼
//! ┌─────────────────────────────────────────────────────────────┐
//! │  Readers (reader/) over descriptors (class.rs, registry.rs) │
//! │  - Walk the class lineage and merge declarations            │
//! └─────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Inheritance
//!
//! Classes form single-inheritance lineages. Access rights and collection annotations use
//! the nearest declaration of each property. Constructor arguments come from the first
//! class, base first, that declares them. Initial values are merged across the whole
//! lineage, base first, and the first one found for a property wins.
//!
//! ## Failure Model
//!
//! Every refused call leaves the object untouched: arguments are validated before any
//! write, and collection mutations are validated on a copy. Metadata errors are never
//! cached, so a broken class fails identically on every call.
//!
//! ## Module Overview
//!
//! - [`class`]: Class and property descriptors (the declarations)
//! - [`registry`]: Descriptor lookup and lineage walking
//! - [`reader`]: Metadata readers (access rights, collections, constructor)
//! - [`metadata`]: Resolved per-class metadata
//! - [`cache`]: Per-class metadata cache and persistent layers
//! - [`object`]: Accessor capability traits and the dynamic [`Instance`](object::Instance)
//! - [`dispatch`]: The accessor dispatcher
//! - [`mutators`]: List, map and set collection behaviors
//! - [`validation`]: Constraint validation seam
//! - [`inflector`]: Item name derivation (`items` -> `item`)
//! - [`value`]: Dynamic field values
//! - [`config`]: Configuration management
//! - [`error`]: Error types

pub mod cache;
pub mod class;
pub mod config;
pub mod dispatch;
pub mod error;
pub mod inflector;
pub mod metadata;
pub mod mutators;
pub mod object;
pub mod reader;
pub mod registry;
pub mod validation;
pub mod value;

pub use class::{Behavior, ClassDescriptor, CollectionSpec, Operation, PropertyDescriptor};
pub use dispatch::{Dispatcher, Outcome};
pub use error::{AccessError, ErrorKind, Result};
pub use object::{Accessible, Instance};
pub use registry::{ClassRegistry, MetadataProvider};
pub use value::Value;
