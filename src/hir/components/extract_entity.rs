//! Entity extraction from record, enum, and class definitions.

use std::sync::Arc;

use crate::syntax::{
    ClassDefinition, DeclKind, ModuleMember, TypeDefinition, TypeDesc, TypeDescriptor, TypeKind,
};

use super::context::ExtractionContext;
use super::extract::Extractor;
use super::types::{ArchitectureComponent, ComponentKind, Entity, EntityField, EntityKind};

pub(super) struct EntityExtractor;

impl Extractor for EntityExtractor {
    fn matches(&self, member: &ModuleMember) -> bool {
        match member {
            ModuleMember::Class(_) => true,
            ModuleMember::Type(def) => !matches!(def.descriptor, TypeDescriptor::Other { .. }),
            _ => false,
        }
    }

    fn extract(
        &self,
        member: &ModuleMember,
        ctx: &mut ExtractionContext,
        out: &mut Vec<ArchitectureComponent>,
    ) {
        match member {
            ModuleMember::Type(def) => extract_entity_from_type(out, ctx, def),
            ModuleMember::Class(class) => extract_entity_from_class(out, ctx, class),
            _ => {}
        }
    }
}

fn extract_entity_from_type(
    out: &mut Vec<ArchitectureComponent>,
    ctx: &mut ExtractionContext,
    def: &TypeDefinition,
) {
    let location = def.range.location();
    let Some(name) = &def.name else {
        ctx.diagnostics
            .malformed(location, "type definition", "missing name");
        return;
    };

    let view: &ExtractionContext = ctx;
    let (kind, fields, members) = match &def.descriptor {
        TypeDescriptor::Record { fields, .. } => {
            let fields = fields
                .iter()
                .filter_map(|field| {
                    let field_name = field.name.as_ref()?;
                    Some(entity_field(
                        view,
                        &field_name.text,
                        field.type_desc.as_ref(),
                        field.optional,
                        field.readonly,
                    ))
                })
                .collect();
            (EntityKind::Record, fields, Vec::new())
        }
        TypeDescriptor::Enum { members } => (
            EntityKind::Enum,
            Vec::new(),
            members.iter().map(|m| m.text.clone()).collect(),
        ),
        TypeDescriptor::Other { .. } => return,
    };

    let id = ctx.declare_id(ComponentKind::Entity, Some(DeclKind::Type), &name.text, def.range);
    out.push(ArchitectureComponent::Entity(Entity {
        id,
        name: name.text.clone(),
        kind,
        fields,
        members,
        file: ctx.file.clone(),
        location,
    }));
}

fn extract_entity_from_class(
    out: &mut Vec<ArchitectureComponent>,
    ctx: &mut ExtractionContext,
    class: &ClassDefinition,
) {
    let location = class.range.location();
    let Some(name) = &class.name else {
        ctx.diagnostics
            .malformed(location, "class definition", "missing name");
        return;
    };

    let view: &ExtractionContext = ctx;
    let fields = class
        .fields
        .iter()
        .filter_map(|field| {
            let field_name = field.name.as_ref()?;
            Some(entity_field(
                view,
                &field_name.text,
                field.effective_type(),
                false,
                field.is_final,
            ))
        })
        .collect();

    let id = ctx.declare_id(
        ComponentKind::Entity,
        Some(DeclKind::Class),
        &name.text,
        class.range,
    );
    out.push(ArchitectureComponent::Entity(Entity {
        id,
        name: name.text.clone(),
        kind: EntityKind::Class,
        fields,
        members: Vec::new(),
        file: ctx.file.clone(),
        location,
    }));
}

fn entity_field(
    ctx: &ExtractionContext,
    name: &Arc<str>,
    type_desc: Option<&TypeDesc>,
    optional: bool,
    readonly: bool,
) -> EntityField {
    // Only member-local types can be entities
    let reference = type_desc
        .filter(|t| t.module.is_none())
        .filter(|t| {
            matches!(
                ctx.symbols.type_kind(&t.name),
                Some(TypeKind::Record | TypeKind::Enum | TypeKind::Class | TypeKind::Client)
            )
        })
        .map(|t| ctx.reference_id(ComponentKind::Entity, &t.name));
    EntityField {
        name: name.clone(),
        type_signature: type_desc.map(|t| Arc::from(t.signature())),
        optional,
        readonly,
        reference,
    }
}
