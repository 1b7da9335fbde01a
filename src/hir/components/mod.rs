//! Component extraction from the semantic tree, as pure functions that return
//! architecture components.
//!
//! # Module structure
//!
//! - [`types`]: Component types (`ArchitectureComponent` and its variants)
//! - [`context`]: ExtractionContext: bindings, collector, and id allocation
//! - [`extract`]: Extractor capability, file entry point and dispatch
//! - [`extract_service`]: Services and the listeners they attach inline
//! - [`extract_listener`]: Module-level listener declarations
//! - [`extract_entity`]: Records, enums, and classes
//! - [`extract_function`]: Function entry points
//! - [`extract_connection`]: Client connections and call summaries

mod context;
mod extract;
mod extract_connection;
mod extract_entity;
mod extract_function;
mod extract_listener;
mod extract_service;
mod types;


pub use extract::extract_file;
pub use extract_connection::{CallEvent, CallGraph, ClientUse};
pub use types::{
    ArchitectureComponent, ClientScope, ComponentId, ComponentKind, Connection, ConnectionTarget,
    Entity, EntityField, EntityKind, FileExtraction, FunctionEntryKind, FunctionEntryPoint,
    InteractionKind, KeyValue, Listener, ListenerKind, ListenerRef, NamedFunction,
    ObjectFieldInfo, ResourceFunction, Service,
};
