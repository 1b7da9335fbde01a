//! Listener declaration extraction.

use std::sync::Arc;

use crate::syntax::{Arg, DeclKind, Expr, ListenerDecl, ModuleMember};

use super::context::ExtractionContext;
use super::extract::Extractor;
use super::types::{ArchitectureComponent, ComponentKind, KeyValue, Listener, ListenerKind};

pub(super) struct ListenerExtractor;

impl Extractor for ListenerExtractor {
    fn matches(&self, member: &ModuleMember) -> bool {
        matches!(member, ModuleMember::Listener(_))
    }

    fn extract(
        &self,
        member: &ModuleMember,
        ctx: &mut ExtractionContext,
        out: &mut Vec<ArchitectureComponent>,
    ) {
        if let ModuleMember::Listener(listener) = member {
            extract_listener_from_decl(out, ctx, listener);
        }
    }
}

fn extract_listener_from_decl(
    out: &mut Vec<ArchitectureComponent>,
    ctx: &mut ExtractionContext,
    listener: &ListenerDecl,
) {
    let location = listener.range.location();
    let Some(name) = &listener.name else {
        ctx.diagnostics
            .malformed(location, "listener declaration", "missing name");
        return;
    };
    if listener.init.is_missing() {
        ctx.diagnostics
            .malformed(location, "listener declaration", "missing initializer");
        return;
    }

    let signature = listener.effective_type().map(|t| t.signature());
    let (args, port) = match listener.init.strip_check() {
        Expr::New { args, .. } => listener_args(ctx, signature.as_deref(), args),
        _ => (Vec::new(), None),
    };

    let id = ctx.declare_id(
        ComponentKind::Listener,
        Some(DeclKind::Listener),
        &name.text,
        listener.range,
    );
    out.push(ArchitectureComponent::Listener(Listener {
        id,
        name: name.text.clone(),
        kind: ListenerKind::Named,
        type_signature: signature.map(Arc::from),
        args,
        port,
        file: ctx.file.clone(),
        location,
    }));
}

/// Key/value pairs of a listener constructor call plus the derived port.
///
/// Positional arguments take the name of the matching `init` parameter when
/// the type is known, else `arg{index}`. The port is the `port` argument, or
/// the first positional argument when the type's parameters are unknown.
pub(super) fn listener_args(
    ctx: &ExtractionContext,
    signature: Option<&str>,
    args: &[Arg],
) -> (Vec<KeyValue>, Option<u16>) {
    let params = signature
        .and_then(|sig| ctx.symbols.lookup_type(sig))
        .map(|t| t.init_params.as_slice())
        .unwrap_or_default();

    let mut pairs = Vec::with_capacity(args.len());
    let mut port = None;
    for (index, arg) in args.iter().enumerate() {
        let key: Arc<str> = match (&arg.name, params.get(index)) {
            (Some(name), _) => name.clone(),
            (None, Some(param)) => param.clone(),
            (None, None) => Arc::from(format!("arg{}", index)),
        };
        let value = arg.value.source_text();
        let is_port_arg =
            key.as_ref() == "port" || (index == 0 && params.is_empty() && arg.name.is_none());
        if is_port_arg && port.is_none() {
            port = value.trim().parse::<u16>().ok();
        }
        pairs.push(KeyValue {
            key,
            value: Arc::from(value),
        });
    }
    (pairs, port)
}
