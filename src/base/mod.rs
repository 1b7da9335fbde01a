//! Foundation types for the archgen toolchain.
//!
//! This module provides fundamental types used throughout the crate:
//! - [`Position`], [`Span`] - Line/column positions for tree nodes
//! - [`SourceLocation`] - Line/column plus byte offsets, totally ordered
//!
//! This module has NO dependencies on other archgen modules.

mod location;
mod position;

pub use location::SourceLocation;
pub use position::{Position, Span};

// Re-export text-size types for convenience
pub use text_size::{self, TextRange, TextSize};
