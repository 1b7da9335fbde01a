//! Service extraction, including the listeners a service attaches to.

use std::sync::Arc;

use smol_str::SmolStr;

use crate::syntax::{
    DeclKind, Expr, FunctionKind, ModuleMember, ServiceDecl, TypeDesc, display_label,
};

use super::context::ExtractionContext;
use super::extract::Extractor;
use super::extract_connection::extract_connections;
use super::extract_listener::listener_args;
use super::types::{
    ArchitectureComponent, ComponentKind, Listener, ListenerKind, ListenerRef, NamedFunction,
    ObjectFieldInfo, ResourceFunction, Service,
};

pub(super) struct ServiceExtractor;

impl Extractor for ServiceExtractor {
    fn matches(&self, member: &ModuleMember) -> bool {
        matches!(member, ModuleMember::Service(_))
    }

    fn extract(
        &self,
        member: &ModuleMember,
        ctx: &mut ExtractionContext,
        out: &mut Vec<ArchitectureComponent>,
    ) {
        if let ModuleMember::Service(service) = member {
            extract_service_from_decl(out, ctx, service);
        }
    }
}

fn extract_service_from_decl(
    out: &mut Vec<ArchitectureComponent>,
    ctx: &mut ExtractionContext,
    service: &ServiceDecl,
) {
    let location = service.range.location();
    if service.attach_points.is_empty() {
        ctx.diagnostics
            .malformed(location, "service declaration", "no listener to attach to");
        return;
    }
    let Some(name) = service.derived_name() else {
        ctx.diagnostics.malformed(
            location,
            "service declaration",
            "cannot derive a name from type, base path or listener",
        );
        return;
    };

    let id = ctx.declare_id(
        ComponentKind::Service,
        Some(DeclKind::Service),
        &name,
        service.range,
    );
    tracing::trace!(service = %id, "extracting service");

    // Inline listeners follow their service in the output
    let mut attached = Vec::new();
    let mut listeners = Vec::with_capacity(service.attach_points.len());
    let mut service_type = None;
    for (index, expr) in service.attach_points.iter().enumerate() {
        let (reference, listener_type) =
            resolve_attach_point(ctx, &id, &name, index, expr, &mut attached);
        if index == 0 {
            service_type = listener_type.as_deref().and_then(service_type_for);
        }
        listeners.push(reference);
    }

    let mut connections = Vec::new();
    let per_function = extract_connections(
        &mut connections,
        ctx,
        &id,
        &name,
        &service.fields,
        service.functions.iter(),
    );

    let mut resource_functions = Vec::new();
    let mut remote_functions = Vec::new();
    let mut other_functions = Vec::new();
    for (function, function_connections) in service.functions.iter().zip(per_function) {
        let function_location = function.range.location();
        match function.kind {
            FunctionKind::Resource => {
                let Some(accessor) = &function.accessor else {
                    ctx.diagnostics.malformed(
                        function_location,
                        "resource function",
                        "missing accessor",
                    );
                    continue;
                };
                resource_functions.push(ResourceFunction {
                    accessor: SmolStr::new(&accessor.text),
                    path: Arc::from(function.path_text()),
                    location: function_location,
                    connections: function_connections,
                });
            }
            FunctionKind::Remote | FunctionKind::Method | FunctionKind::Function => {
                let Some(function_name) = &function.name else {
                    ctx.diagnostics
                        .malformed(function_location, "service method", "missing name");
                    continue;
                };
                let entry = NamedFunction {
                    name: function_name.text.clone(),
                    location: function_location,
                    connections: function_connections,
                };
                if function.kind == FunctionKind::Remote {
                    remote_functions.push(entry);
                } else {
                    other_functions.push(entry);
                }
            }
        }
    }

    let fields = service
        .fields
        .iter()
        .filter_map(|field| {
            let field_name = field.name.as_ref()?;
            Some(ObjectFieldInfo {
                name: field_name.text.clone(),
                type_signature: field.effective_type().map(|t| Arc::from(t.signature())),
            })
        })
        .collect();

    let name: Arc<str> = Arc::from(name);
    out.push(ArchitectureComponent::Service(Service {
        id: id.clone(),
        display_name: display_label(&service.annotations).unwrap_or_else(|| name.clone()),
        name: name.clone(),
        base_path: service.base_path.clone(),
        service_type,
        listeners,
        resource_functions,
        remote_functions,
        other_functions,
        fields,
        file: ctx.file.clone(),
        location,
    }));
    out.extend(attached);
    out.extend(connections);
}

/// Resolve one attach expression, emitting a Listener for inline and
/// imported forms. Returns the reference and the listener's type signature.
fn resolve_attach_point(
    ctx: &mut ExtractionContext,
    service_id: &str,
    service_name: &str,
    index: usize,
    expr: &Expr,
    attached: &mut Vec<ArchitectureComponent>,
) -> (ListenerRef, Option<String>) {
    match expr.strip_check() {
        Expr::Name { name, range } => match ctx.symbols.lookup(DeclKind::Listener, name) {
            Some(symbol) => (
                ListenerRef::Resolved(ctx.reference_id(ComponentKind::Listener, name)),
                symbol.type_signature.as_deref().map(str::to_string),
            ),
            None => {
                ctx.diagnostics.unresolved_listener(range.location(), name);
                (ListenerRef::Unresolved(name.clone()), None)
            }
        },
        Expr::New {
            type_desc, args, ..
        } => {
            let signature = type_desc.as_ref().map(TypeDesc::signature);
            let id = ctx.child_id(service_id, &format!("listener#{}", index));
            let (args, port) = listener_args(ctx, signature.as_deref(), args);
            attached.push(ArchitectureComponent::Listener(Listener {
                id: id.clone(),
                name: Arc::from(
                    signature
                        .clone()
                        .unwrap_or_else(|| format!("{} listener", service_name)),
                ),
                kind: ListenerKind::Anonymous,
                type_signature: signature.as_deref().map(Arc::from),
                args,
                port,
                file: ctx.file.clone(),
                location: expr.range().location(),
            }));
            (ListenerRef::Resolved(id), signature)
        }
        Expr::QualifiedName { module, name, .. } => {
            let qualified = format!("{}:{}", module, name);
            let signature = ctx
                .symbols
                .lookup(DeclKind::Listener, &qualified)
                .and_then(|symbol| symbol.type_signature.as_deref())
                .map(str::to_string);
            let id = ctx.child_id(service_id, &format!("listener#{}", index));
            attached.push(ArchitectureComponent::Listener(Listener {
                id: id.clone(),
                name: Arc::from(qualified),
                kind: ListenerKind::Imported,
                type_signature: signature.as_deref().map(Arc::from),
                args: Vec::new(),
                port: None,
                file: ctx.file.clone(),
                location: expr.range().location(),
            }));
            (ListenerRef::Resolved(id), signature)
        }
        other => {
            let text = other.source_text();
            let label = if text.is_empty() { "<missing>" } else { &text };
            ctx.diagnostics
                .unresolved_listener(other.range().location(), label);
            (ListenerRef::Unresolved(Arc::from(label)), None)
        }
    }
}

/// `http:Listener` → `http:Service`
fn service_type_for(listener_type: &str) -> Option<Arc<str>> {
    let (module, _) = listener_type.split_once(':')?;
    Some(Arc::from(format!("{}:Service", module)))
}
