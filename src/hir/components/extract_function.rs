//! Function entry point extraction.

use std::sync::Arc;

use crate::syntax::{
    DeclKind, FunctionBody, FunctionDefinition, FunctionKind, ModuleMember, display_label,
};

use super::context::ExtractionContext;
use super::extract::Extractor;
use super::extract_connection::extract_connections;
use super::types::{ArchitectureComponent, ComponentKind, FunctionEntryKind, FunctionEntryPoint};

pub(super) struct FunctionExtractor;

impl Extractor for FunctionExtractor {
    fn matches(&self, member: &ModuleMember) -> bool {
        matches!(member, ModuleMember::Function(f) if f.kind == FunctionKind::Function)
    }

    fn extract(
        &self,
        member: &ModuleMember,
        ctx: &mut ExtractionContext,
        out: &mut Vec<ArchitectureComponent>,
    ) {
        if let ModuleMember::Function(function) = member {
            extract_function_from_def(out, ctx, function);
        }
    }
}

fn extract_function_from_def(
    out: &mut Vec<ArchitectureComponent>,
    ctx: &mut ExtractionContext,
    function: &FunctionDefinition,
) {
    let location = function.range.location();
    let Some(name) = &function.name else {
        ctx.diagnostics
            .malformed(location, "function definition", "missing name");
        return;
    };

    let kind = if name.text.as_ref() == ctx.options.main_function {
        FunctionEntryKind::Automation
    } else if matches!(function.body, FunctionBody::Expr { .. }) {
        FunctionEntryKind::DataMapper
    } else {
        FunctionEntryKind::Function
    };
    if kind == FunctionEntryKind::DataMapper && !ctx.options.include_data_mappers {
        return;
    }

    let display_name = match kind {
        FunctionEntryKind::Automation => display_label(&function.annotations)
            .unwrap_or_else(|| Arc::from(ctx.options.automation_name.as_str())),
        _ => display_label(&function.annotations).unwrap_or_else(|| name.text.clone()),
    };

    let params = function
        .params
        .iter()
        .map(|param| {
            let ty = param
                .type_desc
                .as_ref()
                .map(|t| t.signature())
                .unwrap_or_else(|| "any".to_string());
            match &param.name {
                Some(param_name) => Arc::from(format!("{} {}", ty, param_name.text)),
                None => Arc::from(ty),
            }
        })
        .collect();

    let id = ctx.declare_id(
        ComponentKind::FunctionEntryPoint,
        Some(DeclKind::Function),
        &name.text,
        function.range,
    );
    out.push(ArchitectureComponent::FunctionEntryPoint(FunctionEntryPoint {
        id: id.clone(),
        name: name.text.clone(),
        kind,
        display_name,
        params,
        file: ctx.file.clone(),
        location,
    }));

    extract_connections(out, ctx, &id, &name.text, &[], std::iter::once(function));
}
