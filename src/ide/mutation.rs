//! Structural edits behind `addField` and `modifyListener`.
//!
//! Each edit renders source text, computes the [`TextEdit`] a client applies
//! to its buffer, and mirrors the change in the in-memory tree so the file
//! can be re-extracted without a round trip through the front end.
//!
//! Every range after the edit point, in the edited member and in the members
//! that follow it, is moved by the inserted text so repeated edits to the
//! same file stay anchored.

use std::sync::Arc;

use crate::base::Position;
use crate::hir::{ComponentKind, GeneratorOptions};
use crate::syntax::{
    Arg, Expr, Ident, ModuleMember, ObjectField, RawRange, RecordField, SourceFile, TextShift,
    TypeDesc, TypeDescriptor,
};

use super::edits::{CodeLocation, FieldSpec, ListenerSpec, TextEdit};

/// Where an applied edit landed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(super) struct AppliedEdit {
    pub edit: TextEdit,
    /// Kind of the component the edited member extracts to.
    pub kind: ComponentKind,
    /// Start offset of the edited member, stable across the edit.
    pub start_offset: u32,
}

/// Index of the top-level member whose range encloses `at`.
pub(super) fn find_member(file: &SourceFile, at: &CodeLocation) -> Option<usize> {
    let target = at.span();
    file.members
        .iter()
        .position(|member| member.range().location().span().encloses(&target))
}

/// Add a field to the record, class, or service at `index`.
///
/// Returns the reason when the member cannot take a field.
pub(super) fn add_field(
    file: &mut SourceFile,
    index: usize,
    spec: &FieldSpec,
    options: &GeneratorOptions,
) -> Result<AppliedEdit, &'static str> {
    let indent = options.indent(1);
    let member = file
        .members
        .get(index)
        .ok_or("no construct at this location")?;
    let start_offset = member.range().start_offset;

    let (kind, text, anchor) = match member {
        ModuleMember::Type(def) => match &def.descriptor {
            TypeDescriptor::Record { fields, open_brace } => (
                ComponentKind::Entity,
                spec.render_record_field(),
                fields.last().map(|f| f.range).unwrap_or(*open_brace),
            ),
            _ => return Err("fields can only be added to record types"),
        },
        ModuleMember::Class(class) => (
            ComponentKind::Entity,
            spec.render_object_field(),
            class
                .fields
                .last()
                .map(|f| f.range)
                .unwrap_or(class.open_brace),
        ),
        ModuleMember::Service(service) => (
            ComponentKind::Service,
            spec.render_object_field(),
            service
                .fields
                .last()
                .map(|f| f.range)
                .unwrap_or(service.open_brace),
        ),
        _ => return Err("target is not a record, class, or service"),
    };

    let new_text = format!("\n{}{}", indent, text);
    // The anchor ends exactly at the insertion point and stays put
    file.shift(&TextShift::insert(
        anchor.end_line,
        anchor.end_column,
        anchor.end_offset,
        &new_text,
    ));

    let range = inserted_range(anchor, &indent, &text);
    match file.members.get_mut(index) {
        Some(ModuleMember::Type(def)) => {
            if let TypeDescriptor::Record { fields, .. } = &mut def.descriptor {
                fields.push(RecordField {
                    name: Some(Ident::new(spec.name.clone(), range)),
                    type_desc: Some(parse_type(&spec.type_signature).with_range(range)),
                    optional: spec.optional,
                    readonly: spec.readonly,
                    range,
                });
            }
        }
        Some(ModuleMember::Class(class)) => class.fields.push(object_field(spec, range)),
        Some(ModuleMember::Service(service)) => service.fields.push(object_field(spec, range)),
        _ => {}
    }

    Ok(AppliedEdit {
        edit: TextEdit::insert(Position::new(anchor.end_line, anchor.end_column), new_text),
        kind,
        start_offset,
    })
}

/// Replace the listener declaration at `index` with `spec`.
///
/// Returns the edit and the listener's previous name.
pub(super) fn modify_listener(
    file: &mut SourceFile,
    index: usize,
    spec: &ListenerSpec,
) -> Result<(AppliedEdit, Option<Arc<str>>), &'static str> {
    let Some(ModuleMember::Listener(decl)) = file.members.get(index) else {
        return Err("target is not a listener declaration");
    };

    let text = spec.render();
    let edit = TextEdit::replace(decl.range.location().span(), text.clone());
    let shift = TextShift::replace(decl.range, &text);
    let range = shift.inserted(decl.range);

    for (i, member) in file.members.iter_mut().enumerate() {
        if i != index {
            member.shift(&shift);
        }
    }

    let Some(ModuleMember::Listener(decl)) = file.members.get_mut(index) else {
        return Err("target is not a listener declaration");
    };
    let type_desc = spec.type_desc().with_range(range);
    let args = spec
        .args
        .iter()
        .map(|arg| {
            let value = Expr::Literal {
                value: arg.value.clone(),
                range,
            };
            match &arg.name {
                Some(name) => Arg::named(name.clone(), value),
                None => Arg::positional(value),
            }
        })
        .collect();

    let previous = decl.name.as_ref().map(|n| n.text.clone());
    decl.name = Some(Ident::new(spec.name.clone(), range));
    decl.type_desc = Some(type_desc);
    decl.init = Expr::New {
        type_desc: None,
        args,
        range,
    };
    decl.range = range;

    Ok((
        AppliedEdit {
            edit,
            kind: ComponentKind::Listener,
            start_offset: range.start_offset,
        },
        previous,
    ))
}

/// Range of a line inserted after `anchor` with the given indentation.
fn inserted_range(anchor: RawRange, indent: &str, text: &str) -> RawRange {
    let column = indent.len() as u32;
    let start_offset = anchor.end_offset + 1 + column;
    RawRange::new(
        anchor.end_line + 1,
        column,
        anchor.end_line + 1,
        column + text.len() as u32,
        start_offset,
        start_offset + text.len() as u32,
    )
}

fn object_field(spec: &FieldSpec, range: RawRange) -> ObjectField {
    ObjectField {
        name: Some(Ident::new(spec.name.clone(), range)),
        type_desc: Some(parse_type(&spec.type_signature).with_range(range)),
        init: spec.default_value.as_ref().map(|value| Expr::Literal {
            value: value.clone(),
            range,
        }),
        is_final: spec.readonly,
        range,
    }
}

/// `http:Client` → qualified, anything else → local.
fn parse_type(signature: &str) -> TypeDesc {
    match signature.split_once(':') {
        Some((module, name))
            if !module.is_empty() && module.chars().all(|c| c.is_alphanumeric() || c == '_') =>
        {
            TypeDesc::qualified(module, name)
        }
        _ => TypeDesc::local(signature),
    }
}
