//! Response payloads built from registry snapshots.

use std::collections::BTreeSet;
use std::sync::Arc;

use serde::Serialize;

use crate::hir::{
    ArchitectureComponent, ArtifactDiff, ArtifactRegistry, ArtifactTree, ComponentId, Diagnostic,
};

/// Full model of a project.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ModelResponse {
    pub diagnostics: Vec<Diagnostic>,
    /// Every component, ordered by id.
    pub model: Vec<ArchitectureComponent>,
}

impl ModelResponse {
    pub fn compose(registry: &ArtifactRegistry, diagnostics: Vec<Diagnostic>) -> Self {
        let mut model: Vec<ArchitectureComponent> =
            registry.iter().map(|a| a.payload.clone()).collect();
        model.sort_by(|a, b| a.id().cmp(b.id()));
        Self { diagnostics, model }
    }

    pub fn component(&self, id: &str) -> Option<&ArchitectureComponent> {
        self.model.iter().find(|c| c.id().as_ref() == id)
    }

    pub fn ids(&self) -> Vec<&str> {
        self.model.iter().map(|c| c.id().as_ref()).collect()
    }

    pub fn to_json(&self) -> serde_json::Result<serde_json::Value> {
        serde_json::to_value(self)
    }
}

/// Artifacts changed since the previous notification for a project.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ArtifactsChangeNotification {
    pub project_uri: Arc<str>,
    pub added: ArtifactTree,
    pub updated: ArtifactTree,
    pub removed: BTreeSet<ComponentId>,
}

impl ArtifactsChangeNotification {
    pub fn new(project_uri: Arc<str>, diff: ArtifactDiff) -> Self {
        Self {
            project_uri,
            added: diff.added,
            updated: diff.updated,
            removed: diff.removed,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.added.is_empty() && self.updated.is_empty() && self.removed.is_empty()
    }

    pub fn added_ids(&self) -> BTreeSet<&str> {
        tree_ids(&self.added)
    }

    pub fn updated_ids(&self) -> BTreeSet<&str> {
        tree_ids(&self.updated)
    }

    pub fn removed_ids(&self) -> BTreeSet<&str> {
        self.removed.iter().map(|id| id.as_ref()).collect()
    }

    pub fn to_json(&self) -> serde_json::Result<serde_json::Value> {
        serde_json::to_value(self)
    }
}

fn tree_ids(tree: &ArtifactTree) -> BTreeSet<&str> {
    tree.values()
        .flat_map(|files| files.values())
        .flat_map(|artifacts| artifacts.keys())
        .map(|id| id.as_ref())
        .collect()
}
