//! Extraction context: tracks file, bindings, and used ids during extraction.

use std::sync::Arc;

use rustc_hash::FxHashMap;

use crate::hir::GeneratorOptions;
use crate::hir::diagnostics::DiagnosticCollector;
use crate::syntax::{DeclKind, RawRange, SymbolTable};

use super::extract_connection::CallGraph;
use super::types::{ComponentId, ComponentKind};

/// Extraction state passed through all extraction functions.
pub(super) struct ExtractionContext<'a> {
    pub member: &'a str,
    pub file: &'a Arc<str>,
    pub symbols: &'a SymbolTable,
    pub calls: &'a CallGraph,
    pub options: &'a GeneratorOptions,
    pub diagnostics: DiagnosticCollector,
    /// Occurrences of each base id emitted so far in this file
    used_ids: FxHashMap<String, usize>,
}

impl<'a> ExtractionContext<'a> {
    pub fn new(
        member: &'a str,
        file: &'a Arc<str>,
        symbols: &'a SymbolTable,
        calls: &'a CallGraph,
        options: &'a GeneratorOptions,
    ) -> Self {
        Self {
            member,
            file,
            symbols,
            calls,
            options,
            diagnostics: DiagnosticCollector::new(file.clone()),
            used_ids: FxHashMap::default(),
        }
    }

    /// `member:name`
    pub fn qualified_name(&self, name: &str) -> String {
        format!("{}:{}", self.member, name)
    }

    /// Id for a declaration as seen from any file of the member.
    ///
    /// Used for references: it names the declaration in its first declaring
    /// file.
    pub fn reference_id(&self, kind: ComponentKind, name: &str) -> ComponentId {
        Arc::from(format!("{}:{}", kind.tag(), self.qualified_name(name)))
    }

    /// Allocate the id of a component declared in the current file.
    ///
    /// Adds the file as discriminator when the name is also declared in an
    /// earlier file, and an ordinal when it repeats within this file.
    pub fn declare_id(
        &mut self,
        kind: ComponentKind,
        decl: Option<DeclKind>,
        name: &str,
        range: RawRange,
    ) -> ComponentId {
        let mut base = format!("{}:{}", kind.tag(), self.qualified_name(name));
        let shadowed = decl
            .and_then(|decl| self.symbols.lookup(decl, name))
            .is_some_and(|symbol| {
                symbol.is_declared_in_many() && symbol.first_file() != Some(self.file)
            });
        if shadowed {
            base = format!("{}@{}", base, self.file);
        }

        let seen = self.used_ids.entry(base.clone()).or_insert(0);
        let ordinal = *seen;
        *seen += 1;
        if ordinal == 0 {
            Arc::from(base)
        } else {
            self.diagnostics.duplicate_component(range.location(), name);
            Arc::from(format!("{}#{}", base, ordinal))
        }
    }

    /// Id for a component owned by another one, e.g. an inline listener.
    pub fn child_id(&mut self, parent: &str, segment: &str) -> ComponentId {
        let base = format!("{}/{}", parent, segment);
        let seen = self.used_ids.entry(base.clone()).or_insert(0);
        let ordinal = *seen;
        *seen += 1;
        if ordinal == 0 {
            Arc::from(base)
        } else {
            Arc::from(format!("{}#{}", base, ordinal))
        }
    }
}
