//! Unified extraction entry point and module member dispatch.

use std::sync::Arc;

use crate::hir::GeneratorOptions;
use crate::syntax::{ModuleMember, SourceFile, SymbolTable};

use super::context::ExtractionContext;
use super::extract_connection::{CallGraph, ConnectionExtractor};
use super::extract_entity::EntityExtractor;
use super::extract_function::FunctionExtractor;
use super::extract_listener::ListenerExtractor;
use super::extract_service::ServiceExtractor;
use super::types::{ArchitectureComponent, FileExtraction};

/// Capability shared by the per-construct extractors.
pub(super) trait Extractor {
    /// Whether this extractor handles `member`.
    fn matches(&self, member: &ModuleMember) -> bool;

    /// Append the components of `member` to `out`, reporting problems to
    /// the context's collector.
    fn extract(
        &self,
        member: &ModuleMember,
        ctx: &mut ExtractionContext,
        out: &mut Vec<ArchitectureComponent>,
    );
}

/// Extract all components from one file of a project member.
///
/// Pure: reads the tree and bindings, returns components and diagnostics in
/// traversal order.
pub fn extract_file(
    member: &str,
    file: &SourceFile,
    symbols: &SymbolTable,
    calls: &CallGraph,
    options: &GeneratorOptions,
) -> FileExtraction {
    let path: &Arc<str> = &file.path;
    let mut ctx = ExtractionContext::new(member, path, symbols, calls, options);
    let mut components = Vec::new();

    for item in &file.members {
        extract_from_member(&mut components, &mut ctx, item);
    }

    tracing::debug!(
        member,
        file = %file.path,
        components = components.len(),
        diagnostics = ctx.diagnostics.diagnostics().len(),
        "file extracted"
    );
    FileExtraction {
        components,
        diagnostics: ctx.diagnostics.drain(),
    }
}

/// Dispatch extraction for a single module member on its tag.
pub(super) fn extract_from_member(
    out: &mut Vec<ArchitectureComponent>,
    ctx: &mut ExtractionContext,
    member: &ModuleMember,
) {
    let extractor: &dyn Extractor = match member {
        ModuleMember::Service(_) => &ServiceExtractor,
        ModuleMember::Listener(_) => &ListenerExtractor,
        ModuleMember::Type(_) | ModuleMember::Class(_) => &EntityExtractor,
        ModuleMember::Function(_) => &FunctionExtractor,
        ModuleMember::Variable(_) => &ConnectionExtractor,
        ModuleMember::Import(_) => return,
        ModuleMember::Unknown { range } => {
            ctx.diagnostics.malformed(
                range.location(),
                member.display(),
                "the front end could not classify this member",
            );
            return;
        }
    };
    if extractor.matches(member) {
        extractor.extract(member, ctx, out);
    }
}
