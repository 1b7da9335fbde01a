//! Semantic tree nodes delivered by the front end.
//!
//! Every node is owned, serde-deserializable and carries a [`RawRange`].
//! The tree is already analyzed: names are bound through the member's
//! [`SymbolTable`](super::SymbolTable), so nodes only hold the text the
//! extractors need.

use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::base::SourceLocation;

// ============================================================================
// RANGES AND LEAVES
// ============================================================================

/// Raw line/column and byte-offset coordinates as produced by the front end.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct RawRange {
    pub start_line: u32,
    pub start_column: u32,
    pub end_line: u32,
    pub end_column: u32,
    pub start_offset: u32,
    pub end_offset: u32,
}

impl RawRange {
    pub fn new(
        start_line: u32,
        start_column: u32,
        end_line: u32,
        end_column: u32,
        start_offset: u32,
        end_offset: u32,
    ) -> Self {
        Self {
            start_line,
            start_column,
            end_line,
            end_column,
            start_offset,
            end_offset,
        }
    }

    pub fn location(&self) -> SourceLocation {
        SourceLocation::from(*self)
    }
}

impl From<RawRange> for SourceLocation {
    fn from(raw: RawRange) -> Self {
        SourceLocation::new(
            raw.start_line,
            raw.start_column,
            raw.end_line,
            raw.end_column,
            raw.start_offset,
            raw.end_offset,
        )
    }
}

/// An identifier token.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Ident {
    pub text: Arc<str>,
    pub range: RawRange,
}

impl Ident {
    pub fn new(text: impl Into<Arc<str>>, range: RawRange) -> Self {
        Self {
            text: text.into(),
            range,
        }
    }
}

/// A type reference, optionally module-qualified (`http:Listener`).
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TypeDesc {
    pub module: Option<Arc<str>>,
    pub name: Arc<str>,
    #[serde(default)]
    pub range: RawRange,
}

impl TypeDesc {
    pub fn local(name: impl Into<Arc<str>>) -> Self {
        Self {
            module: None,
            name: name.into(),
            range: RawRange::default(),
        }
    }

    pub fn qualified(module: impl Into<Arc<str>>, name: impl Into<Arc<str>>) -> Self {
        Self {
            module: Some(module.into()),
            name: name.into(),
            range: RawRange::default(),
        }
    }

    pub fn with_range(mut self, range: RawRange) -> Self {
        self.range = range;
        self
    }

    /// Source form of the type, `module:Name` or `Name`.
    pub fn signature(&self) -> String {
        match &self.module {
            Some(module) => format!("{}:{}", module, self.name),
            None => self.name.to_string(),
        }
    }
}

/// An annotation attachment such as `@display { label: "Orders" }`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Annotation {
    pub name: Arc<str>,
    #[serde(default)]
    pub fields: Vec<(Arc<str>, Arc<str>)>,
    #[serde(default)]
    pub range: RawRange,
}

impl Annotation {
    pub fn field(&self, key: &str) -> Option<&str> {
        self.fields
            .iter()
            .find(|(k, _)| k.as_ref() == key)
            .map(|(_, v)| v.as_ref())
    }
}

/// Label of the `display` annotation, if any.
pub fn display_label(annotations: &[Annotation]) -> Option<Arc<str>> {
    annotations
        .iter()
        .find(|a| a.name.as_ref() == "display")
        .and_then(|a| a.field("label"))
        .map(Arc::from)
}

// ============================================================================
// MODULE MEMBERS
// ============================================================================

/// A top-level member of a source file.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "member")]
pub enum ModuleMember {
    Import(ImportDecl),
    Listener(ListenerDecl),
    Service(ServiceDecl),
    Type(TypeDefinition),
    Class(ClassDefinition),
    Variable(ModuleVariable),
    Function(FunctionDefinition),
    /// A member the front end recovered from but could not classify.
    Unknown { range: RawRange },
}

impl ModuleMember {
    pub fn range(&self) -> RawRange {
        match self {
            ModuleMember::Import(m) => m.range,
            ModuleMember::Listener(m) => m.range,
            ModuleMember::Service(m) => m.range,
            ModuleMember::Type(m) => m.range,
            ModuleMember::Class(m) => m.range,
            ModuleMember::Variable(m) => m.range,
            ModuleMember::Function(m) => m.range,
            ModuleMember::Unknown { range } => *range,
        }
    }

    /// Human-readable construct name, used in diagnostics.
    pub fn display(&self) -> &'static str {
        match self {
            ModuleMember::Import(_) => "import",
            ModuleMember::Listener(_) => "listener declaration",
            ModuleMember::Service(_) => "service declaration",
            ModuleMember::Type(_) => "type definition",
            ModuleMember::Class(_) => "class definition",
            ModuleMember::Variable(_) => "module variable",
            ModuleMember::Function(_) => "function definition",
            ModuleMember::Unknown { .. } => "unrecognized construct",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImportDecl {
    pub org: Option<Arc<str>>,
    pub module: Arc<str>,
    pub prefix: Option<Arc<str>>,
    pub range: RawRange,
}

/// `listener http:Listener name = new (8080);`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ListenerDecl {
    pub name: Option<Ident>,
    pub type_desc: Option<TypeDesc>,
    pub init: Expr,
    pub range: RawRange,
}

impl ListenerDecl {
    /// Declared type, falling back to the type of an explicit `new`.
    pub fn effective_type(&self) -> Option<&TypeDesc> {
        self.type_desc
            .as_ref()
            .or_else(|| self.init.constructed_type())
    }
}

/// `service /api on ep { ... }`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ServiceDecl {
    #[serde(default)]
    pub annotations: Vec<Annotation>,
    pub type_desc: Option<TypeDesc>,
    /// Absolute resource path, e.g. `/api/v1`.
    pub base_path: Option<Arc<str>>,
    pub attach_points: Vec<Expr>,
    #[serde(default)]
    pub fields: Vec<ObjectField>,
    #[serde(default)]
    pub functions: Vec<FunctionDefinition>,
    pub open_brace: RawRange,
    pub range: RawRange,
}

impl ServiceDecl {
    /// Name of the service: the service type, else the base path, else the
    /// source of the first attach expression.
    pub fn derived_name(&self) -> Option<String> {
        if let Some(type_desc) = &self.type_desc {
            return Some(type_desc.signature());
        }
        if let Some(path) = self.base_path.as_deref().filter(|p| !p.is_empty()) {
            return Some(path.to_string());
        }
        self.attach_points
            .first()
            .map(Expr::source_text)
            .filter(|text| !text.is_empty())
    }
}

/// A field of a service or class body.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ObjectField {
    pub name: Option<Ident>,
    pub type_desc: Option<TypeDesc>,
    pub init: Option<Expr>,
    #[serde(default)]
    pub is_final: bool,
    pub range: RawRange,
}

impl ObjectField {
    pub fn effective_type(&self) -> Option<&TypeDesc> {
        self.type_desc
            .as_ref()
            .or_else(|| self.init.as_ref().and_then(Expr::constructed_type))
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TypeDefinition {
    pub name: Option<Ident>,
    pub descriptor: TypeDescriptor,
    pub range: RawRange,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "shape")]
pub enum TypeDescriptor {
    Record {
        fields: Vec<RecordField>,
        open_brace: RawRange,
    },
    Enum {
        members: Vec<Ident>,
    },
    Other {
        text: Arc<str>,
    },
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RecordField {
    pub name: Option<Ident>,
    pub type_desc: Option<TypeDesc>,
    #[serde(default)]
    pub optional: bool,
    #[serde(default)]
    pub readonly: bool,
    pub range: RawRange,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClassDefinition {
    pub name: Option<Ident>,
    #[serde(default)]
    pub is_client: bool,
    #[serde(default)]
    pub fields: Vec<ObjectField>,
    #[serde(default)]
    pub methods: Vec<FunctionDefinition>,
    pub open_brace: RawRange,
    pub range: RawRange,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModuleVariable {
    pub name: Option<Ident>,
    pub type_desc: Option<TypeDesc>,
    pub init: Option<Expr>,
    #[serde(default)]
    pub is_final: bool,
    pub range: RawRange,
}

impl ModuleVariable {
    pub fn effective_type(&self) -> Option<&TypeDesc> {
        self.type_desc
            .as_ref()
            .or_else(|| self.init.as_ref().and_then(Expr::constructed_type))
    }
}

// ============================================================================
// FUNCTIONS
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum FunctionKind {
    /// Module-level function.
    Function,
    /// `resource function get path()` inside a service or client class.
    Resource,
    /// `remote function name()` inside a service or client class.
    Remote,
    /// Plain object method.
    Method,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FunctionDefinition {
    pub kind: FunctionKind,
    pub name: Option<Ident>,
    /// Resource accessor (`get`, `post`, ...), resource functions only.
    pub accessor: Option<Ident>,
    #[serde(default)]
    pub resource_path: Vec<Arc<str>>,
    #[serde(default)]
    pub annotations: Vec<Annotation>,
    #[serde(default)]
    pub params: Vec<Param>,
    pub return_type: Option<TypeDesc>,
    pub body: FunctionBody,
    pub range: RawRange,
}

impl FunctionDefinition {
    pub fn name_text(&self) -> Option<&str> {
        self.name.as_ref().map(|n| n.text.as_ref())
    }

    /// Resource path joined with `/`, `.` for the root path.
    pub fn path_text(&self) -> String {
        if self.resource_path.is_empty() {
            ".".to_string()
        } else {
            self.resource_path.join("/")
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Param {
    pub name: Option<Ident>,
    pub type_desc: Option<TypeDesc>,
    pub range: RawRange,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "body")]
pub enum FunctionBody {
    Block { statements: Vec<Stmt> },
    /// `=> expr;`
    Expr { expr: Expr },
    External,
}

// ============================================================================
// STATEMENTS
// ============================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "stmt")]
pub enum Stmt {
    Local {
        name: Option<Ident>,
        type_desc: Option<TypeDesc>,
        init: Option<Expr>,
        range: RawRange,
    },
    Assign {
        target: Expr,
        value: Expr,
        range: RawRange,
    },
    Expr {
        expr: Expr,
    },
    Return {
        value: Option<Expr>,
        range: RawRange,
    },
    If {
        condition: Expr,
        then_branch: Vec<Stmt>,
        #[serde(default)]
        else_branch: Vec<Stmt>,
        range: RawRange,
    },
    While {
        condition: Expr,
        body: Vec<Stmt>,
        range: RawRange,
    },
    Foreach {
        variable: Option<Ident>,
        collection: Expr,
        body: Vec<Stmt>,
        range: RawRange,
    },
    Block {
        body: Vec<Stmt>,
        range: RawRange,
    },
}

// ============================================================================
// EXPRESSIONS
// ============================================================================

/// A call argument, named (`port = 8080`) or positional.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Arg {
    pub name: Option<Arc<str>>,
    pub value: Expr,
}

impl Arg {
    pub fn positional(value: Expr) -> Self {
        Self { name: None, value }
    }

    pub fn named(name: impl Into<Arc<str>>, value: Expr) -> Self {
        Self {
            name: Some(name.into()),
            value,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum Expr {
    Name {
        name: Arc<str>,
        range: RawRange,
    },
    QualifiedName {
        module: Arc<str>,
        name: Arc<str>,
        range: RawRange,
    },
    /// `new T(args)`; an implicit `new (args)` has no type.
    New {
        type_desc: Option<TypeDesc>,
        #[serde(default)]
        args: Vec<Arg>,
        range: RawRange,
    },
    Call {
        callee: Box<Expr>,
        #[serde(default)]
        args: Vec<Arg>,
        range: RawRange,
    },
    /// `client->method(args)`
    RemoteCall {
        client: Box<Expr>,
        method: Arc<str>,
        #[serde(default)]
        args: Vec<Arg>,
        range: RawRange,
    },
    /// `client->/path/to.get(args)`
    ResourceAccess {
        client: Box<Expr>,
        #[serde(default)]
        path: Vec<Arc<str>>,
        method: Option<Arc<str>>,
        #[serde(default)]
        args: Vec<Arg>,
        range: RawRange,
    },
    FieldAccess {
        target: Box<Expr>,
        field: Arc<str>,
        range: RawRange,
    },
    Check {
        expr: Box<Expr>,
        range: RawRange,
    },
    Literal {
        value: Arc<str>,
        range: RawRange,
    },
    Other {
        #[serde(default)]
        children: Vec<Expr>,
        range: RawRange,
    },
    /// Placeholder inserted by the front end for a missing expression.
    Missing {
        range: RawRange,
    },
}

impl Expr {
    pub fn range(&self) -> RawRange {
        match self {
            Expr::Name { range, .. }
            | Expr::QualifiedName { range, .. }
            | Expr::New { range, .. }
            | Expr::Call { range, .. }
            | Expr::RemoteCall { range, .. }
            | Expr::ResourceAccess { range, .. }
            | Expr::FieldAccess { range, .. }
            | Expr::Check { range, .. }
            | Expr::Literal { range, .. }
            | Expr::Other { range, .. }
            | Expr::Missing { range } => *range,
        }
    }

    /// Remove any `check`/`checkpanic` wrappers.
    pub fn strip_check(&self) -> &Expr {
        let mut expr = self;
        while let Expr::Check { expr: inner, .. } = expr {
            expr = inner;
        }
        expr
    }

    pub fn is_missing(&self) -> bool {
        matches!(self, Expr::Missing { .. })
    }

    /// Whether the expression (possibly under `check`) constructs an object.
    pub fn is_construction(&self) -> bool {
        matches!(self.strip_check(), Expr::New { .. })
    }

    /// Type named by an explicit `new T(...)`, possibly under `check`.
    pub fn constructed_type(&self) -> Option<&TypeDesc> {
        match self.strip_check() {
            Expr::New { type_desc, .. } => type_desc.as_ref(),
            _ => None,
        }
    }

    /// Direct sub-expressions in source order.
    pub fn children(&self) -> Vec<&Expr> {
        match self {
            Expr::Name { .. }
            | Expr::QualifiedName { .. }
            | Expr::Literal { .. }
            | Expr::Missing { .. } => Vec::new(),
            Expr::New { args, .. } => args.iter().map(|a| &a.value).collect(),
            Expr::Call { callee, args, .. } => std::iter::once(callee.as_ref())
                .chain(args.iter().map(|a| &a.value))
                .collect(),
            Expr::RemoteCall { client, args, .. } | Expr::ResourceAccess { client, args, .. } => {
                std::iter::once(client.as_ref())
                    .chain(args.iter().map(|a| &a.value))
                    .collect()
            }
            Expr::FieldAccess { target, .. } => vec![target.as_ref()],
            Expr::Check { expr, .. } => vec![expr.as_ref()],
            Expr::Other { children, .. } => children.iter().collect(),
        }
    }

    /// Approximate source text for naming purposes.
    pub fn source_text(&self) -> String {
        match self {
            Expr::Name { name, .. } => name.to_string(),
            Expr::QualifiedName { module, name, .. } => format!("{}:{}", module, name),
            Expr::Literal { value, .. } => value.to_string(),
            Expr::New {
                type_desc, args, ..
            } => {
                let args = args
                    .iter()
                    .map(|a| match &a.name {
                        Some(name) => format!("{} = {}", name, a.value.source_text()),
                        None => a.value.source_text(),
                    })
                    .collect::<Vec<_>>()
                    .join(", ");
                match type_desc {
                    Some(t) => format!("new {}({})", t.signature(), args),
                    None => format!("new ({})", args),
                }
            }
            Expr::FieldAccess { target, field, .. } => {
                format!("{}.{}", target.source_text(), field)
            }
            Expr::Check { expr, .. } => format!("check {}", expr.source_text()),
            Expr::Call { callee, .. } => format!("{}()", callee.source_text()),
            Expr::RemoteCall { client, method, .. } => {
                format!("{}->{}()", client.source_text(), method)
            }
            Expr::ResourceAccess { client, path, .. } => {
                format!("{}->/{}", client.source_text(), path.join("/"))
            }
            Expr::Other { .. } | Expr::Missing { .. } => String::new(),
        }
    }
}
