//! Diagnostics for extraction error reporting.
//!
//! Extraction never fails as a whole: unresolved references and malformed
//! constructs become diagnostics attached to a precise source location,
//! and the pass continues with the rest of the file.

use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::base::SourceLocation;

// ============================================================================
// DIAGNOSTIC TYPES
// ============================================================================

/// Severity level of a diagnostic.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Severity {
    Error,
    Warning,
    Info,
}

impl Severity {
    /// Convert to LSP severity number.
    pub fn to_lsp(&self) -> u32 {
        match self {
            Severity::Error => 1,
            Severity::Warning => 2,
            Severity::Info => 3,
        }
    }
}

/// A diagnostic message with location.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Diagnostic {
    /// The file containing this diagnostic.
    pub file: Arc<str>,
    pub location: SourceLocation,
    pub severity: Severity,
    /// Diagnostic code (e.g., "W0101").
    pub code: Arc<str>,
    pub message: Arc<str>,
}

impl Diagnostic {
    pub fn new(
        file: impl Into<Arc<str>>,
        location: SourceLocation,
        severity: Severity,
        code: &str,
        message: impl Into<Arc<str>>,
    ) -> Self {
        Self {
            file: file.into(),
            location,
            severity,
            code: Arc::from(code),
            message: message.into(),
        }
    }

    /// Create a new error diagnostic.
    pub fn error(
        file: impl Into<Arc<str>>,
        location: SourceLocation,
        code: &str,
        message: impl Into<Arc<str>>,
    ) -> Self {
        Self::new(file, location, Severity::Error, code, message)
    }

    /// Create a new warning diagnostic.
    pub fn warning(
        file: impl Into<Arc<str>>,
        location: SourceLocation,
        code: &str,
        message: impl Into<Arc<str>>,
    ) -> Self {
        Self::new(file, location, Severity::Warning, code, message)
    }

    pub fn is_error(&self) -> bool {
        self.severity == Severity::Error
    }
}

// ============================================================================
// DIAGNOSTIC CODES
// ============================================================================

/// Diagnostic codes reported by extraction and mutation handlers.
///
/// ## Code Ranges
///
/// - **E0101-E0199**: Errors (malformed constructs, invalid requests)
/// - **W0101-W0199**: Warnings (unresolved references, duplicates)
pub mod codes {
    // ========================================================================
    // ERRORS (E0101-E0199)
    // ========================================================================

    /// Construct is missing a required part and was skipped.
    pub const MALFORMED_CONSTRUCT: &str = "E0101";
    /// Registry invariant violated while committing a pass.
    pub const INTERNAL_CONSISTENCY: &str = "E0102";
    /// Mutation target is missing or of the wrong kind.
    pub const INVALID_MUTATION_TARGET: &str = "E0103";

    // ========================================================================
    // WARNINGS (W0101-W0199)
    // ========================================================================

    /// Service attach expression does not resolve to a listener.
    pub const UNRESOLVED_LISTENER: &str = "W0101";
    /// Client expression does not resolve to a known client.
    pub const UNRESOLVED_CLIENT: &str = "W0102";
    /// Two constructs in one file share a qualified name.
    pub const DUPLICATE_COMPONENT: &str = "W0104";
}

// ============================================================================
// DIAGNOSTIC COLLECTOR
// ============================================================================

/// Collects diagnostics for one file in traversal order.
#[derive(Clone, Debug, Default)]
pub struct DiagnosticCollector {
    file: Arc<str>,
    diagnostics: Vec<Diagnostic>,
}

impl DiagnosticCollector {
    /// Create a collector for diagnostics in `file`.
    pub fn new(file: impl Into<Arc<str>>) -> Self {
        Self {
            file: file.into(),
            diagnostics: Vec::new(),
        }
    }

    pub fn file(&self) -> &Arc<str> {
        &self.file
    }

    /// Add a diagnostic.
    pub fn add(&mut self, diagnostic: Diagnostic) {
        self.diagnostics.push(diagnostic);
    }

    pub fn report(
        &mut self,
        location: SourceLocation,
        severity: Severity,
        code: &str,
        message: impl Into<Arc<str>>,
    ) {
        let diagnostic = Diagnostic::new(self.file.clone(), location, severity, code, message);
        tracing::trace!(
            file = %diagnostic.file,
            code = %diagnostic.code,
            message = %diagnostic.message,
            "diagnostic reported"
        );
        self.add(diagnostic);
    }

    /// Report a construct that was skipped.
    pub fn malformed(&mut self, location: SourceLocation, what: &str, reason: &str) {
        self.report(
            location,
            Severity::Error,
            codes::MALFORMED_CONSTRUCT,
            format!("malformed {}: {}", what, reason),
        );
    }

    pub fn unresolved_listener(&mut self, location: SourceLocation, expr: &str) {
        self.report(
            location,
            Severity::Warning,
            codes::UNRESOLVED_LISTENER,
            format!("unresolved listener reference: '{}'", expr),
        );
    }

    pub fn unresolved_client(&mut self, location: SourceLocation, expr: &str) {
        self.report(
            location,
            Severity::Warning,
            codes::UNRESOLVED_CLIENT,
            format!("unresolved client reference: '{}'", expr),
        );
    }

    pub fn duplicate_component(&mut self, location: SourceLocation, name: &str) {
        self.report(
            location,
            Severity::Warning,
            codes::DUPLICATE_COMPONENT,
            format!("duplicate definition: '{}' is already defined in this file", name),
        );
    }

    /// Get all diagnostics.
    pub fn diagnostics(&self) -> &[Diagnostic] {
        &self.diagnostics
    }

    /// Get the number of errors.
    pub fn error_count(&self) -> usize {
        self.diagnostics
            .iter()
            .filter(|d| d.severity == Severity::Error)
            .count()
    }

    /// Get the number of warnings.
    pub fn warning_count(&self) -> usize {
        self.diagnostics
            .iter()
            .filter(|d| d.severity == Severity::Warning)
            .count()
    }

    /// Check if there are any errors.
    pub fn has_errors(&self) -> bool {
        self.diagnostics.iter().any(Diagnostic::is_error)
    }

    /// Take all diagnostics, leaving the collector empty.
    pub fn drain(&mut self) -> Vec<Diagnostic> {
        std::mem::take(&mut self.diagnostics)
    }
}
