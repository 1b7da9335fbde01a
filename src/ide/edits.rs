//! Edit payloads for the mutation requests and their source rendering.

use std::collections::BTreeMap;
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::base::{Position, Span};
use crate::hir::{Artifact, Diagnostic};
use crate::syntax::TypeDesc;

// ============================================================================
// REQUEST PAYLOADS
// ============================================================================

/// Line/column range of the construct a mutation targets.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CodeLocation {
    pub start: Position,
    pub end: Position,
}

impl CodeLocation {
    pub fn new(start: Position, end: Position) -> Self {
        Self { start, end }
    }

    pub fn from_coords(start_line: u32, start_col: u32, end_line: u32, end_col: u32) -> Self {
        Self {
            start: Position::new(start_line, start_col),
            end: Position::new(end_line, end_col),
        }
    }

    pub fn span(&self) -> Span {
        Span::new(self.start, self.end)
    }
}

/// Field to add to a record, class, or service.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FieldSpec {
    pub name: Arc<str>,
    /// `int`, `string`, `http:Client`, ...
    pub type_signature: Arc<str>,
    #[serde(default)]
    pub optional: bool,
    /// `readonly` on record fields, `final` on object fields.
    #[serde(default)]
    pub readonly: bool,
    #[serde(default)]
    pub default_value: Option<Arc<str>>,
}

impl FieldSpec {
    pub fn new(name: impl Into<Arc<str>>, type_signature: impl Into<Arc<str>>) -> Self {
        Self {
            name: name.into(),
            type_signature: type_signature.into(),
            optional: false,
            readonly: false,
            default_value: None,
        }
    }

    pub fn with_optional(mut self, optional: bool) -> Self {
        self.optional = optional;
        self
    }

    pub fn with_readonly(mut self, readonly: bool) -> Self {
        self.readonly = readonly;
        self
    }

    pub fn with_default(mut self, value: impl Into<Arc<str>>) -> Self {
        self.default_value = Some(value.into());
        self
    }

    /// Field as a record member: `readonly int id?;`
    pub fn render_record_field(&self) -> String {
        let mut text = String::new();
        if self.readonly {
            text.push_str("readonly ");
        }
        text.push_str(&format!("{} {}", self.type_signature, self.name));
        if self.optional {
            text.push('?');
        }
        if let Some(value) = &self.default_value {
            text.push_str(&format!(" = {}", value));
        }
        text.push(';');
        text
    }

    /// Field as an object member: `final http:Client db = check new ("...");`
    pub fn render_object_field(&self) -> String {
        let mut text = String::new();
        if self.readonly {
            text.push_str("final ");
        }
        text.push_str(&format!("{} {}", self.type_signature, self.name));
        if let Some(value) = &self.default_value {
            text.push_str(&format!(" = {}", value));
        }
        text.push(';');
        text
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ListenerArg {
    #[serde(default)]
    pub name: Option<Arc<str>>,
    pub value: Arc<str>,
}

impl ListenerArg {
    pub fn positional(value: impl Into<Arc<str>>) -> Self {
        Self {
            name: None,
            value: value.into(),
        }
    }

    pub fn named(name: impl Into<Arc<str>>, value: impl Into<Arc<str>>) -> Self {
        Self {
            name: Some(name.into()),
            value: value.into(),
        }
    }
}

/// New shape of a listener declaration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ListenerSpec {
    pub name: Arc<str>,
    /// Module prefix of the listener type, e.g. `http`.
    #[serde(default)]
    pub module: Option<Arc<str>>,
    /// Type name, e.g. `Listener`.
    pub type_name: Arc<str>,
    #[serde(default)]
    pub args: Vec<ListenerArg>,
}

impl ListenerSpec {
    pub fn new(name: impl Into<Arc<str>>, type_desc: &TypeDesc) -> Self {
        Self {
            name: name.into(),
            module: type_desc.module.clone(),
            type_name: type_desc.name.clone(),
            args: Vec::new(),
        }
    }

    pub fn with_arg(mut self, arg: ListenerArg) -> Self {
        self.args.push(arg);
        self
    }

    pub fn type_desc(&self) -> TypeDesc {
        match &self.module {
            Some(module) => TypeDesc::qualified(module.clone(), self.type_name.clone()),
            None => TypeDesc::local(self.type_name.clone()),
        }
    }

    /// `listener http:Listener ep = new (port = 9090);`
    pub fn render(&self) -> String {
        let args: Vec<String> = self
            .args
            .iter()
            .map(|arg| match &arg.name {
                Some(name) => format!("{} = {}", name, arg.value),
                None => arg.value.to_string(),
            })
            .collect();
        format!(
            "listener {} {} = new ({});",
            self.type_desc().signature(),
            self.name,
            args.join(", ")
        )
    }
}

// ============================================================================
// RESPONSE PAYLOADS
// ============================================================================

/// A replacement of `range` by `new_text`; an insertion has an empty range.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TextEdit {
    pub range: Span,
    pub new_text: String,
}

impl TextEdit {
    pub fn insert(at: Position, text: impl Into<String>) -> Self {
        Self {
            range: Span::new(at, at),
            new_text: text.into(),
        }
    }

    pub fn replace(range: Span, text: impl Into<String>) -> Self {
        Self {
            range,
            new_text: text.into(),
        }
    }
}

/// Result of a successful mutation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdatedArtifact {
    pub artifact: Artifact,
    pub text_edits: BTreeMap<Arc<str>, Vec<TextEdit>>,
    pub diagnostics: Vec<Diagnostic>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "outcome", content = "value")]
pub enum MutationOutcome {
    Updated(UpdatedArtifact),
    /// Nothing changed; the diagnostics say why.
    Rejected(Vec<Diagnostic>),
}

impl MutationOutcome {
    pub fn updated(&self) -> Option<&UpdatedArtifact> {
        match self {
            MutationOutcome::Updated(updated) => Some(updated),
            MutationOutcome::Rejected(_) => None,
        }
    }

    pub fn diagnostics(&self) -> &[Diagnostic] {
        match self {
            MutationOutcome::Updated(updated) => &updated.diagnostics,
            MutationOutcome::Rejected(diagnostics) => diagnostics,
        }
    }
}
