//! Request tests
//!
//! Tests for:
//! - Model generation and change notifications
//! - Cancellation and project lifecycle
//! - Field and listener mutations

pub mod tests_host;
pub mod tests_mutation;
