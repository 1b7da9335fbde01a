//! Per-member symbol bindings.
//!
//! The front end resolves names; the [`SymbolTable`] is how the extractors
//! see those resolutions. Declarations are keyed by kind and name, type
//! symbols by their signature (`http:Client`, `Person`).

use std::collections::BTreeSet;
use std::sync::Arc;

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use super::nodes::{ModuleMember, TypeDescriptor};
use super::project::SourceFile;

/// Kind of a module-level declaration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum DeclKind {
    Listener,
    Service,
    Type,
    Class,
    Variable,
    Function,
}

/// A module-level declaration and the files declaring it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Symbol {
    pub name: Arc<str>,
    pub kind: DeclKind,
    pub type_signature: Option<Arc<str>>,
    /// Declaring files in path order.
    pub files: BTreeSet<Arc<str>>,
}

impl Symbol {
    /// The file whose declaration keeps the undecorated id.
    pub fn first_file(&self) -> Option<&Arc<str>> {
        self.files.iter().next()
    }

    pub fn is_declared_in_many(&self) -> bool {
        self.files.len() > 1
    }
}

/// Classification of a type as far as architecture extraction cares.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TypeKind {
    Listener,
    Client,
    Record,
    Enum,
    Class,
    Other,
}

/// A resolved type symbol.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TypeSymbol {
    pub signature: Arc<str>,
    pub kind: TypeKind,
    /// Owning module; `None` for types declared in the member itself.
    pub module: Option<Arc<str>>,
    /// Parameter names of the type's `init` method, in order.
    #[serde(default)]
    pub init_params: Vec<Arc<str>>,
}

impl TypeSymbol {
    pub fn new(signature: impl Into<Arc<str>>, kind: TypeKind) -> Self {
        Self {
            signature: signature.into(),
            kind,
            module: None,
            init_params: Vec::new(),
        }
    }

    pub fn with_module(mut self, module: impl Into<Arc<str>>) -> Self {
        self.module = Some(module.into());
        self
    }

    pub fn with_init_params<I, S>(mut self, params: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<Arc<str>>,
    {
        self.init_params = params.into_iter().map(Into::into).collect();
        self
    }
}

/// Bindings for one project member.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SymbolTable {
    #[serde(default)]
    declarations: IndexMap<DeclKind, IndexMap<Arc<str>, Symbol>>,
    #[serde(default)]
    types: IndexMap<Arc<str>, TypeSymbol>,
}

impl SymbolTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a type symbol (typically from an imported module).
    pub fn insert_type(&mut self, symbol: TypeSymbol) {
        self.types.insert(symbol.signature.clone(), symbol);
    }

    pub fn with_type(mut self, symbol: TypeSymbol) -> Self {
        self.insert_type(symbol);
        self
    }

    pub fn lookup(&self, kind: DeclKind, name: &str) -> Option<&Symbol> {
        self.declarations.get(&kind).and_then(|m| m.get(name))
    }

    pub fn lookup_type(&self, signature: &str) -> Option<&TypeSymbol> {
        self.types.get(signature)
    }

    pub fn type_kind(&self, signature: &str) -> Option<TypeKind> {
        self.lookup_type(signature).map(|t| t.kind)
    }

    pub fn declarations(&self, kind: DeclKind) -> impl Iterator<Item = &Symbol> {
        self.declarations.get(&kind).into_iter().flat_map(|m| m.values())
    }

    /// Record a declaration of `name` in `file`.
    pub fn declare(
        &mut self,
        kind: DeclKind,
        name: &str,
        type_signature: Option<String>,
        file: &Arc<str>,
    ) {
        let symbols = self.declarations.entry(kind).or_default();
        let symbol = symbols.entry(Arc::from(name)).or_insert_with(|| Symbol {
            name: Arc::from(name),
            kind,
            type_signature: None,
            files: BTreeSet::new(),
        });
        if symbol.type_signature.is_none() {
            symbol.type_signature = type_signature.map(Arc::from);
        }
        symbol.files.insert(file.clone());
    }

    /// Index every declaration in `file`.
    pub fn index_file(&mut self, file: &SourceFile) {
        for member in &file.members {
            match member {
                ModuleMember::Listener(listener) => {
                    if let Some(name) = &listener.name {
                        let signature = listener.effective_type().map(|t| t.signature());
                        self.declare(DeclKind::Listener, &name.text, signature, &file.path);
                    }
                }
                ModuleMember::Service(service) => {
                    if let Some(name) = service.derived_name() {
                        self.declare(DeclKind::Service, &name, None, &file.path);
                    }
                }
                ModuleMember::Type(def) => {
                    if let Some(name) = &def.name {
                        self.declare(DeclKind::Type, &name.text, None, &file.path);
                        let kind = match def.descriptor {
                            TypeDescriptor::Record { .. } => TypeKind::Record,
                            TypeDescriptor::Enum { .. } => TypeKind::Enum,
                            TypeDescriptor::Other { .. } => TypeKind::Other,
                        };
                        self.insert_type(TypeSymbol::new(name.text.clone(), kind));
                    }
                }
                ModuleMember::Class(class) => {
                    if let Some(name) = &class.name {
                        self.declare(DeclKind::Class, &name.text, None, &file.path);
                        let kind = if class.is_client {
                            TypeKind::Client
                        } else {
                            TypeKind::Class
                        };
                        self.insert_type(TypeSymbol::new(name.text.clone(), kind));
                    }
                }
                ModuleMember::Variable(var) => {
                    if let Some(name) = &var.name {
                        let signature = var.effective_type().map(|t| t.signature());
                        self.declare(DeclKind::Variable, &name.text, signature, &file.path);
                    }
                }
                ModuleMember::Function(func) => {
                    if let Some(name) = func.name_text() {
                        self.declare(DeclKind::Function, name, None, &file.path);
                    }
                }
                ModuleMember::Import(_) | ModuleMember::Unknown { .. } => {}
            }
        }
    }

    /// Forget every declaration contributed by `path`.
    ///
    /// Local type symbols stay until a later `index_file` overwrites them;
    /// their kind does not depend on which file declared them.
    pub fn remove_file(&mut self, path: &str) {
        for symbols in self.declarations.values_mut() {
            symbols.retain(|_, symbol| {
                symbol.files.remove(path);
                !symbol.files.is_empty()
            });
        }
    }
}
