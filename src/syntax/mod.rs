//! Semantic tree interface.
//!
//! The source parser and semantic analyzer live outside this crate. They
//! hand over an owned tree per file ([`SourceFile`]) plus per-member
//! bindings ([`SymbolTable`]); everything here is plain data with serde
//! derives so a front end can deliver it as JSON.

mod nodes;
mod project;
mod shift;
mod symbols;

pub use nodes::{
    Annotation, Arg, ClassDefinition, Expr, FunctionBody, FunctionDefinition, FunctionKind, Ident,
    ImportDecl, ListenerDecl, ModuleMember, ModuleVariable, ObjectField, Param, RawRange,
    RecordField, ServiceDecl, Stmt, TypeDefinition, TypeDesc, TypeDescriptor, display_label,
};
pub use project::{Project, ProjectMember, SourceFile};
pub use shift::TextShift;
pub use symbols::{DeclKind, Symbol, SymbolTable, TypeKind, TypeSymbol};

// Re-export Position and Span from base for convenience
pub use crate::base::{Position, Span};
