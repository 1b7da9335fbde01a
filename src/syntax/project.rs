//! Project layout as delivered by the project loader.

use std::sync::Arc;

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use super::nodes::ModuleMember;
use super::symbols::SymbolTable;

/// One analyzed source file.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SourceFile {
    pub path: Arc<str>,
    pub members: Vec<ModuleMember>,
}

impl SourceFile {
    pub fn new(path: impl Into<Arc<str>>, members: Vec<ModuleMember>) -> Self {
        Self {
            path: path.into(),
            members,
        }
    }
}

/// A module of the project with its files and bindings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProjectMember {
    pub name: Arc<str>,
    #[serde(default)]
    pub files: IndexMap<Arc<str>, SourceFile>,
    #[serde(default)]
    pub symbols: SymbolTable,
}

impl ProjectMember {
    pub fn new(name: impl Into<Arc<str>>) -> Self {
        Self {
            name: name.into(),
            files: IndexMap::new(),
            symbols: SymbolTable::new(),
        }
    }

    pub fn with_symbols(mut self, symbols: SymbolTable) -> Self {
        self.symbols = symbols;
        self
    }

    pub fn with_file(mut self, file: SourceFile) -> Self {
        self.set_file(file);
        self
    }

    /// Insert or replace a file, re-indexing its declarations. Returns the
    /// file it replaced.
    pub fn set_file(&mut self, file: SourceFile) -> Option<SourceFile> {
        self.symbols.remove_file(&file.path);
        self.symbols.index_file(&file);
        self.files.insert(file.path.clone(), file)
    }

    /// Remove a file and its declarations. Returns the removed file.
    pub fn remove_file(&mut self, path: &str) -> Option<SourceFile> {
        self.symbols.remove_file(path);
        self.files.shift_remove(path)
    }

    pub fn file(&self, path: &str) -> Option<&SourceFile> {
        self.files.get(path)
    }
}

/// A whole project: ordered members keyed by name.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Project {
    pub uri: Arc<str>,
    #[serde(default)]
    pub members: IndexMap<Arc<str>, ProjectMember>,
}

impl Project {
    pub fn new(uri: impl Into<Arc<str>>) -> Self {
        Self {
            uri: uri.into(),
            members: IndexMap::new(),
        }
    }

    pub fn with_member(mut self, member: ProjectMember) -> Self {
        self.members.insert(member.name.clone(), member);
        self
    }

    /// Name of the member owning `path`.
    pub fn member_of(&self, path: &str) -> Option<&Arc<str>> {
        self.members
            .values()
            .find(|m| m.files.contains_key(path))
            .map(|m| &m.name)
    }

    pub fn member_mut(&mut self, name: &str) -> Option<&mut ProjectMember> {
        self.members.get_mut(name)
    }
}
