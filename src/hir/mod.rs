//! High-level IR (HIR): the architecture model.
//!
//! Everything here is pure with respect to the project: extraction reads a
//! file's semantic tree and bindings and returns components plus
//! diagnostics; the registry stores what was extracted and diffs snapshots.
//!
//! ## Key Types
//!
//! - [`ArchitectureComponent`]: One extracted service, listener, entity,
//!   connection, or function entry point
//! - [`CallGraph`]: Per-member summary of client uses and calls
//! - [`ArtifactRegistry`]: Ordered `member → file → id → artifact` store
//! - [`ArtifactDiff`]: Added, updated, and removed artifacts between snapshots
//!
//! ## Layers
//!
//! ```text
//! SourceFile + SymbolTable  ← INPUT: semantic tree from the front end
//!     │
//!     ▼
//! CallGraph::build(member)  ← client uses per function (per-member)
//!     │
//!     ▼
//! extract_file(file)        ← components + diagnostics (per-file)
//!     │
//!     ▼
//! ArtifactRegistry::upsert  ← committed artifacts
//!     │
//!     ▼
//! diff(prev, curr)          ← change notification payload
//! ```

mod components;
mod diagnostics;
mod options;
mod registry;

pub use components::{
    ArchitectureComponent, CallEvent, CallGraph, ClientScope, ClientUse, ComponentId,
    ComponentKind, Connection, ConnectionTarget, Entity, EntityField, EntityKind, FileExtraction,
    FunctionEntryKind, FunctionEntryPoint, InteractionKind, KeyValue, Listener, ListenerKind,
    ListenerRef, NamedFunction, ObjectFieldInfo, ResourceFunction, Service, extract_file,
};
pub use diagnostics::{Diagnostic, DiagnosticCollector, Severity, codes};
pub use options::GeneratorOptions;
pub use registry::{
    Artifact, ArtifactDiff, ArtifactRegistry, ArtifactTree, FileArtifacts, RegistryError, diff,
};
