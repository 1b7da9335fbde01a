//! # archgen-base
//!
//! Core library for extracting an architecture model (services, listeners,
//! entities, connections, entry points) from analyzed source projects and
//! keeping it in sync as files change.
//!
//! ## Module Structure (dependency order)
//!
//! ```text
//! ide       → Project hosts, model responses, field/listener mutations
//!   ↓
//! hir       → Component extraction, artifact registry and diff
//!   ↓
//! syntax    → Semantic tree delivered by the front end, symbol tables
//!   ↓
//! base      → Primitives (Position, Span, SourceLocation, TextRange)
//! ```

// ============================================================================
// MODULES (dependency order: base → syntax → hir → ide)
// ============================================================================

/// Foundation types: positions, spans, source locations
pub mod base;

/// Syntax: semantic tree nodes, project layout, symbol tables
pub mod syntax;

/// High-level IR: architecture components, extraction, registry
pub mod hir;

/// Requests: project hosts, model composition, mutations
pub mod ide;

// Re-export foundation types
pub use base::{Position, SourceLocation, Span, TextRange, TextSize};
