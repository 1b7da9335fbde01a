//! Artifact registry: the project's published components, keyed by
//! member, file, and id.
//!
//! The registry is the unit of incremental synchronization: a pass commits
//! its components into a clone of the live registry, and [`diff`] between
//! two snapshots yields exactly the artifacts a client must re-render.

use std::collections::{BTreeMap, BTreeSet};
use std::sync::Arc;

use rustc_hash::FxHashSet;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use super::components::{ArchitectureComponent, ComponentId, ComponentKind};

// ============================================================================
// ARTIFACT
// ============================================================================

/// A component as published to clients.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Artifact {
    pub id: ComponentId,
    pub kind: ComponentKind,
    pub category: Arc<str>,
    pub payload: ArchitectureComponent,
    /// Registry generation in which the payload last changed.
    pub last_modified: u64,
}

impl Artifact {
    pub fn new(payload: ArchitectureComponent, generation: u64) -> Self {
        Self {
            id: payload.id().clone(),
            kind: payload.kind(),
            category: Arc::from(payload.category()),
            payload,
            last_modified: generation,
        }
    }

    pub fn file(&self) -> &Arc<str> {
        self.payload.file()
    }
}

// last_modified is bookkeeping; artifacts with the same payload are equal
impl PartialEq for Artifact {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
            && self.kind == other.kind
            && self.category == other.category
            && self.payload == other.payload
    }
}

impl Eq for Artifact {}

/// `file → id → artifact`
pub type FileArtifacts = BTreeMap<Arc<str>, BTreeMap<ComponentId, Artifact>>;

/// `member → file → id → artifact`, the shape of registry listings and
/// of the added/updated halves of a diff.
pub type ArtifactTree = BTreeMap<Arc<str>, FileArtifacts>;

// ============================================================================
// ERRORS
// ============================================================================

/// Registry invariant violations.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RegistryError {
    /// Artifact declared in one file was committed under another file key.
    #[error("artifact '{id}' belongs to '{declared}' but was committed under '{key}'")]
    FileMismatch {
        id: ComponentId,
        declared: Arc<str>,
        key: Arc<str>,
    },

    /// Two files produced the same id in one pass.
    #[error("artifact '{id}' produced by both '{first}' and '{second}'")]
    DuplicateId {
        id: ComponentId,
        first: Arc<str>,
        second: Arc<str>,
    },
}

impl RegistryError {
    pub fn id(&self) -> &ComponentId {
        match self {
            RegistryError::FileMismatch { id, .. } | RegistryError::DuplicateId { id, .. } => id,
        }
    }
}

// ============================================================================
// REGISTRY
// ============================================================================

/// Ordered `member → file → id → artifact` store for one project.
///
/// Invariants: every artifact's declared file equals its file key, and an
/// id appears under at most one file key per member.
#[derive(Debug, Clone, Default, Serialize)]
pub struct ArtifactRegistry {
    members: ArtifactTree,
    #[serde(skip)]
    generation: u64,
}

// Generation is bookkeeping; two registries with the same artifacts are equal
impl PartialEq for ArtifactRegistry {
    fn eq(&self, other: &Self) -> bool {
        self.members == other.members
    }
}

impl Eq for ArtifactRegistry {}

impl ArtifactRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn generation(&self) -> u64 {
        self.generation
    }

    /// Start a new generation; subsequent upserts stamp changed payloads
    /// with it.
    pub fn begin_generation(&mut self) -> u64 {
        self.generation += 1;
        self.generation
    }

    pub fn tree(&self) -> &ArtifactTree {
        &self.members
    }

    pub fn is_empty(&self) -> bool {
        self.members.values().all(|files| files.values().all(BTreeMap::is_empty))
    }

    pub fn len(&self) -> usize {
        self.iter().count()
    }

    /// All artifacts in member, file, id order.
    pub fn iter(&self) -> impl Iterator<Item = &Artifact> {
        self.members
            .values()
            .flat_map(|files| files.values())
            .flat_map(|artifacts| artifacts.values())
    }

    pub fn files(&self, member: &str) -> impl Iterator<Item = &Arc<str>> {
        self.members.get(member).into_iter().flat_map(|f| f.keys())
    }

    pub fn file_artifacts(
        &self,
        member: &str,
        file: &str,
    ) -> Option<&BTreeMap<ComponentId, Artifact>> {
        self.members.get(member).and_then(|files| files.get(file))
    }

    pub fn get(&self, id: &str) -> Option<&Artifact> {
        self.members
            .values()
            .flat_map(|files| files.values())
            .find_map(|artifacts| artifacts.get(id))
    }

    /// Insert or replace `component` under `member`/`file`.
    ///
    /// An id found under another file of the member is moved. An equal
    /// payload keeps its `last_modified` marker.
    pub fn upsert(
        &mut self,
        member: &str,
        file: &str,
        component: ArchitectureComponent,
    ) -> Result<(), RegistryError> {
        if component.file().as_ref() != file {
            return Err(RegistryError::FileMismatch {
                id: component.id().clone(),
                declared: component.file().clone(),
                key: Arc::from(file),
            });
        }

        let generation = self.generation;
        let files = self.members.entry(Arc::from(member)).or_default();
        let id = component.id().clone();

        let mut previous = None;
        for (key, artifacts) in files.iter_mut() {
            if key.as_ref() != file {
                if let Some(moved) = artifacts.remove(&id) {
                    tracing::trace!(id = %id, from = %key, to = file, "artifact moved");
                    previous = Some(moved);
                }
            }
        }
        files.retain(|key, artifacts| key.as_ref() == file || !artifacts.is_empty());

        let artifacts = files.entry(Arc::from(file)).or_default();
        let previous = artifacts.remove(&id).or(previous);
        let artifact = match previous {
            Some(prev) if prev.payload == component => prev,
            _ => Artifact::new(component, generation),
        };
        artifacts.insert(id, artifact);
        Ok(())
    }

    /// Remove the artifacts of `file` whose ids are not in `surviving`.
    /// Returns the removed ids.
    pub fn remove_missing(
        &mut self,
        member: &str,
        file: &str,
        surviving: &FxHashSet<ComponentId>,
    ) -> Vec<ComponentId> {
        let Some(artifacts) = self
            .members
            .get_mut(member)
            .and_then(|files| files.get_mut(file))
        else {
            return Vec::new();
        };
        let removed: Vec<ComponentId> = artifacts
            .keys()
            .filter(|id| !surviving.contains(*id))
            .cloned()
            .collect();
        for id in &removed {
            artifacts.remove(id);
        }
        removed
    }

    /// Drop a file key and everything under it.
    pub fn remove_file(&mut self, member: &str, file: &str) -> Vec<ComponentId> {
        let Some(files) = self.members.get_mut(member) else {
            return Vec::new();
        };
        let removed = files
            .remove(file)
            .map(|artifacts| artifacts.into_keys().collect())
            .unwrap_or_default();
        if files.is_empty() {
            self.members.remove(member);
        }
        removed
    }

    /// Drop a member and everything under it.
    pub fn remove_member(&mut self, member: &str) {
        self.members.remove(member);
    }

    pub fn members(&self) -> impl Iterator<Item = &Arc<str>> {
        self.members.keys()
    }

    /// Apply a diff computed against this registry's contents.
    pub fn apply(&mut self, diff: &ArtifactDiff) {
        for files in self.members.values_mut() {
            for artifacts in files.values_mut() {
                artifacts.retain(|id, _| !diff.removed.contains(id));
            }
        }
        for tree in [&diff.added, &diff.updated] {
            for (member, files) in tree {
                for (file, artifacts) in files {
                    for artifact in artifacts.values() {
                        self.insert_artifact(member, file, artifact.clone());
                    }
                }
            }
        }
        self.prune();
    }

    /// Insert an artifact verbatim, moving it out of other files.
    fn insert_artifact(&mut self, member: &Arc<str>, file: &Arc<str>, artifact: Artifact) {
        let files = self.members.entry(member.clone()).or_default();
        for (key, artifacts) in files.iter_mut() {
            if key != file {
                artifacts.remove(&artifact.id);
            }
        }
        files
            .entry(file.clone())
            .or_default()
            .insert(artifact.id.clone(), artifact);
    }

    /// Drop empty file and member keys.
    pub fn prune(&mut self) {
        for files in self.members.values_mut() {
            files.retain(|_, artifacts| !artifacts.is_empty());
        }
        self.members.retain(|_, files| !files.is_empty());
    }
}

// ============================================================================
// DIFF
// ============================================================================

/// Changes between two registry snapshots.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ArtifactDiff {
    pub added: ArtifactTree,
    pub updated: ArtifactTree,
    pub removed: BTreeSet<ComponentId>,
}

impl ArtifactDiff {
    pub fn is_empty(&self) -> bool {
        self.added.is_empty() && self.updated.is_empty() && self.removed.is_empty()
    }

    pub fn added_ids(&self) -> BTreeSet<&ComponentId> {
        tree_ids(&self.added)
    }

    pub fn updated_ids(&self) -> BTreeSet<&ComponentId> {
        tree_ids(&self.updated)
    }
}

fn tree_ids(tree: &ArtifactTree) -> BTreeSet<&ComponentId> {
    tree.values()
        .flat_map(|files| files.values())
        .flat_map(|artifacts| artifacts.keys())
        .collect()
}

/// `member → id → (file, artifact)`
fn index_by_id(registry: &ArtifactRegistry) -> BTreeMap<&Arc<str>, BTreeMap<&ComponentId, (&Arc<str>, &Artifact)>> {
    let mut index: BTreeMap<_, BTreeMap<_, _>> = BTreeMap::new();
    for (member, files) in &registry.members {
        let ids = index.entry(member).or_default();
        for (file, artifacts) in files {
            for (id, artifact) in artifacts {
                ids.insert(id, (file, artifact));
            }
        }
    }
    index
}

fn insert_into(tree: &mut ArtifactTree, member: &Arc<str>, file: &Arc<str>, artifact: &Artifact) {
    tree.entry(member.clone())
        .or_default()
        .entry(file.clone())
        .or_default()
        .insert(artifact.id.clone(), artifact.clone());
}

/// Compute what changed from `prev` to `curr`.
///
/// An id present in both is updated when its payload or its file differs;
/// `lastModified` alone never makes an update.
pub fn diff(prev: &ArtifactRegistry, curr: &ArtifactRegistry) -> ArtifactDiff {
    let before = index_by_id(prev);
    let after = index_by_id(curr);
    let mut result = ArtifactDiff::default();

    for (member, ids) in &after {
        let old = before.get(member);
        for (id, (file, artifact)) in ids {
            match old.and_then(|old| old.get(id)) {
                None => insert_into(&mut result.added, member, file, artifact),
                Some((old_file, old_artifact)) => {
                    if old_file != file || old_artifact.payload != artifact.payload {
                        insert_into(&mut result.updated, member, file, artifact);
                    }
                }
            }
        }
    }

    for (member, ids) in &before {
        let new = after.get(member);
        for id in ids.keys() {
            if !new.is_some_and(|new| new.contains_key(id)) {
                result.removed.insert((*id).clone());
            }
        }
    }

    result
}
