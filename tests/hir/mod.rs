//! HIR tests
//!
//! Tests for:
//! - File extraction through the public entry point
//! - Id stability across renames and moves
//! - Registry snapshots and diffs

pub mod tests_extraction;
pub mod tests_registry;
