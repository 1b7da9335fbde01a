//! ProjectHost and DesignModelHost: state management for model requests.
//!
//! A `ProjectHost` owns one project's semantic tree, its artifact registry
//! and the snapshot last published to clients. `DesignModelHost` keeps one
//! `ProjectHost` per open project and routes requests to it.
//!
//! ## Usage
//!
//! ```ignore
//! let host = DesignModelHost::new(|uri: &str| load_project(uri));
//!
//! let model = host.generate_model("file:///app", &CancellationToken::new())?;
//! let changes = host.notify_artifacts_changed("file:///app", &CancellationToken::new())?;
//! ```

use std::sync::Arc;

use parking_lot::{Mutex, RwLock};
use rayon::prelude::*;
use rustc_hash::{FxHashMap, FxHashSet};
use tokio_util::sync::CancellationToken;

use crate::base::SourceLocation;
use crate::hir::{
    ArchitectureComponent, Artifact, ArtifactRegistry, ArtifactTree, CallGraph, ComponentId,
    Diagnostic, FileExtraction, GeneratorOptions, RegistryError, codes, diff, extract_file,
};
use crate::syntax::{Project, ProjectMember, SourceFile};

use super::compose::{ArtifactsChangeNotification, ModelResponse};
use super::edits::{CodeLocation, FieldSpec, ListenerSpec, MutationOutcome, UpdatedArtifact};
use super::error::{HostError, HostResult};
use super::mutation::{self, AppliedEdit};

// ============================================================================
// PROJECT LOADER
// ============================================================================

/// Source of analyzed projects, keyed by URI.
pub trait ProjectLoader: Send + Sync {
    fn load(&self, uri: &str) -> Option<Project>;
}

impl<F> ProjectLoader for F
where
    F: Fn(&str) -> Option<Project> + Send + Sync,
{
    fn load(&self, uri: &str) -> Option<Project> {
        self(uri)
    }
}

// ============================================================================
// PROJECT HOST
// ============================================================================

/// Owns all mutable state of one open project.
///
/// Every pass works on a clone of the registry; the clone replaces the live
/// registry only when the pass finishes uncancelled.
pub struct ProjectHost {
    project: Project,
    registry: ArtifactRegistry,
    /// Registry as of the last change notification
    published: ArtifactRegistry,
    call_graphs: FxHashMap<Arc<str>, CallGraph>,
    options: GeneratorOptions,
    /// Whether a pass has ever committed
    generated: bool,
}

impl ProjectHost {
    pub fn new(project: Project, options: GeneratorOptions) -> Self {
        Self {
            project,
            registry: ArtifactRegistry::new(),
            published: ArtifactRegistry::new(),
            call_graphs: FxHashMap::default(),
            options,
            generated: false,
        }
    }

    pub fn uri(&self) -> &Arc<str> {
        &self.project.uri
    }

    pub fn project(&self) -> &Project {
        &self.project
    }

    pub fn registry(&self) -> &ArtifactRegistry {
        &self.registry
    }

    pub fn options(&self) -> &GeneratorOptions {
        &self.options
    }

    /// Run a full pass and return the whole model.
    pub fn generate_model(&mut self, cancel: &CancellationToken) -> HostResult<ModelResponse> {
        let diagnostics = self.refresh(cancel)?;
        Ok(ModelResponse::compose(&self.registry, diagnostics))
    }

    /// Run a full pass and report what changed since the last notification.
    pub fn notify_artifacts_changed(
        &mut self,
        cancel: &CancellationToken,
    ) -> HostResult<ArtifactsChangeNotification> {
        self.refresh(cancel)?;
        let delta = diff(&self.published, &self.registry);
        self.published = self.registry.clone();
        tracing::debug!(
            project = %self.project.uri,
            added = delta.added_ids().len(),
            updated = delta.updated_ids().len(),
            removed = delta.removed.len(),
            "artifacts changed"
        );
        Ok(ArtifactsChangeNotification::new(self.project.uri.clone(), delta))
    }

    /// Registry-shaped listing of every artifact, running a first pass if
    /// none has committed yet.
    pub fn artifacts(&mut self, cancel: &CancellationToken) -> HostResult<ArtifactTree> {
        if !self.generated {
            self.refresh(cancel)?;
        }
        Ok(self.registry.tree().clone())
    }

    /// Replace (or add) a file delivered by the front end. Takes effect on
    /// the next pass.
    pub fn update_file(&mut self, member: &str, file: SourceFile) -> HostResult<()> {
        let owner = self
            .project
            .member_mut(member)
            .ok_or_else(|| HostError::MemberNotFound(Arc::from(member)))?;
        tracing::trace!(member, file = %file.path, "file updated");
        owner.set_file(file);
        Ok(())
    }

    /// Forget a file. Its artifacts disappear on the next pass.
    pub fn remove_file(&mut self, path: &str) -> HostResult<()> {
        let member = self
            .project
            .member_of(path)
            .cloned()
            .ok_or_else(|| HostError::file_not_found(path))?;
        if let Some(owner) = self.project.member_mut(&member) {
            owner.remove_file(path);
        }
        tracing::trace!(member = %member, file = path, "file removed");
        Ok(())
    }

    pub fn owns_file(&self, path: &str) -> bool {
        self.project.member_of(path).is_some()
    }

    /// Add a field to the record, class, or service at `at`.
    pub fn add_field(
        &mut self,
        path: &str,
        spec: &FieldSpec,
        at: &CodeLocation,
    ) -> HostResult<MutationOutcome> {
        tracing::debug!(file = path, field = %spec.name, "add field requested");
        let options = self.options.clone();
        self.mutate(path, at, |file, index| {
            mutation::add_field(file, index, spec, &options)
        })
    }

    /// Rewrite the listener declaration at `at`.
    pub fn modify_listener(
        &mut self,
        path: &str,
        spec: &ListenerSpec,
        at: &CodeLocation,
    ) -> HostResult<MutationOutcome> {
        tracing::debug!(file = path, listener = %spec.name, "modify listener requested");
        self.mutate(path, at, |file, index| {
            mutation::modify_listener(file, index, spec).map(|(applied, previous)| {
                if previous.as_deref() != Some(spec.name.as_ref()) {
                    tracing::trace!(from = ?previous, to = %spec.name, "listener renamed");
                }
                applied
            })
        })
    }

    /// Apply a structural edit to the owning file, re-extract that file
    /// alone, and keep the edit only if the edited construct still yields a
    /// component with an id no other file holds.
    fn mutate<F>(&mut self, path: &str, at: &CodeLocation, edit: F) -> HostResult<MutationOutcome>
    where
        F: FnOnce(&mut SourceFile, usize) -> Result<AppliedEdit, &'static str>,
    {
        let member_name = self
            .project
            .member_of(path)
            .cloned()
            .ok_or_else(|| HostError::file_not_found(path))?;
        let Some(member) = self.project.members.get_mut(&member_name) else {
            return Err(HostError::file_not_found(path));
        };
        let Some(original) = member.file(path) else {
            return Err(HostError::file_not_found(path));
        };

        let target = code_location(at);
        let Some(index) = mutation::find_member(original, at) else {
            return Ok(reject(path, target, "no construct at this location"));
        };
        let mut edited = original.clone();
        let applied = match edit(&mut edited, index) {
            Ok(applied) => applied,
            Err(reason) => return Ok(reject(path, target, reason)),
        };

        let calls = self
            .call_graphs
            .entry(member_name.clone())
            .or_insert_with(|| CallGraph::build(member));
        let Some(original) = swap_file(member, calls, edited) else {
            return Err(HostError::file_not_found(path));
        };
        let Some(file) = member.file(path) else {
            return Err(HostError::file_not_found(path));
        };
        let file_path = file.path.clone();
        let FileExtraction {
            components,
            mut diagnostics,
        } = extract_file(&member_name, file, &member.symbols, calls, &self.options);

        let mut seen = member_ids_outside(&self.registry, &member_name, path);
        let edited_component = components.iter().find(|c| is_edited(c, &applied)).cloned();
        let accepted = match edited_component {
            None => {
                diagnostics.push(Diagnostic::error(
                    path,
                    target,
                    codes::INVALID_MUTATION_TARGET,
                    "edited construct no longer yields a component",
                ));
                None
            }
            Some(component) => match seen.get(component.id()) {
                Some(first) => {
                    let err = RegistryError::DuplicateId {
                        id: component.id().clone(),
                        first: first.clone(),
                        second: file_path.clone(),
                    };
                    report_violation(&mut diagnostics, &file_path, *component.location(), &err);
                    None
                }
                None => Some(component),
            },
        };
        let Some(component) = accepted else {
            swap_file(member, calls, original);
            tracing::debug!(file = path, "mutation rejected after re-extraction");
            return Ok(MutationOutcome::Rejected(diagnostics));
        };

        self.registry.begin_generation();
        commit_file(
            &mut self.registry,
            &member_name,
            &file_path,
            components,
            &mut seen,
            &mut diagnostics,
        );
        let artifact = self
            .registry
            .file_artifacts(&member_name, path)
            .and_then(|artifacts| artifacts.get(component.id()))
            .cloned()
            .unwrap_or_else(|| Artifact::new(component, self.registry.generation()));

        tracing::debug!(file = path, artifact = %artifact.id, "mutation committed");
        Ok(MutationOutcome::Updated(UpdatedArtifact {
            artifact,
            text_edits: [(file_path, vec![applied.edit])].into_iter().collect(),
            diagnostics,
        }))
    }

    /// One extraction pass over every file, committed atomically.
    fn refresh(&mut self, cancel: &CancellationToken) -> HostResult<Vec<Diagnostic>> {
        if cancel.is_cancelled() {
            return Err(HostError::Cancelled);
        }
        tracing::debug!(project = %self.project.uri, "extraction pass started");

        let graphs: FxHashMap<Arc<str>, CallGraph> = self
            .project
            .members
            .iter()
            .map(|(name, member)| (name.clone(), CallGraph::build(member)))
            .collect();

        let jobs: Vec<(&ProjectMember, &SourceFile)> = self
            .project
            .members
            .values()
            .flat_map(|member| member.files.values().map(move |file| (member, file)))
            .collect();

        let options = &self.options;
        let results: Vec<Option<FileExtraction>> = jobs
            .par_iter()
            .map(|(member, file)| {
                if cancel.is_cancelled() {
                    return None;
                }
                let calls = graphs.get(&member.name)?;
                Some(extract_file(
                    &member.name,
                    file,
                    &member.symbols,
                    calls,
                    options,
                ))
            })
            .collect();

        if cancel.is_cancelled() {
            tracing::debug!(project = %self.project.uri, "extraction pass cancelled");
            return Err(HostError::Cancelled);
        }

        let mut next = self.registry.clone();
        next.begin_generation();
        let mut diagnostics = Vec::new();
        let mut seen: FxHashMap<Arc<str>, FxHashMap<ComponentId, Arc<str>>> =
            FxHashMap::default();

        for ((member, file), extraction) in jobs.iter().zip(results) {
            let Some(extraction) = extraction else {
                return Err(HostError::Cancelled);
            };
            diagnostics.extend(extraction.diagnostics);
            commit_file(
                &mut next,
                &member.name,
                &file.path,
                extraction.components,
                seen.entry(member.name.clone()).or_default(),
                &mut diagnostics,
            );
        }

        // Files and members the project no longer has
        let stale: Vec<(Arc<str>, Arc<str>)> = next
            .members()
            .flat_map(|member| next.files(member).map(move |file| (member.clone(), file.clone())))
            .filter(|(member, file)| {
                !self
                    .project
                    .members
                    .get(member)
                    .is_some_and(|m| m.files.contains_key(file))
            })
            .collect();
        for (member, file) in stale {
            next.remove_file(&member, &file);
        }
        next.prune();

        if cancel.is_cancelled() {
            return Err(HostError::Cancelled);
        }

        tracing::debug!(
            project = %self.project.uri,
            artifacts = next.len(),
            diagnostics = diagnostics.len(),
            generation = next.generation(),
            "extraction pass committed"
        );
        self.registry = next;
        self.call_graphs = graphs;
        self.generated = true;
        Ok(diagnostics)
    }
}

/// Upsert one file's components and drop the file's artifacts that did not
/// survive. `seen` maps ids already committed in this pass to their file.
fn commit_file(
    registry: &mut ArtifactRegistry,
    member: &Arc<str>,
    file: &Arc<str>,
    components: Vec<ArchitectureComponent>,
    seen: &mut FxHashMap<ComponentId, Arc<str>>,
    diagnostics: &mut Vec<Diagnostic>,
) {
    let mut surviving = FxHashSet::default();
    for component in components {
        let id = component.id().clone();
        let location = *component.location();

        if let Some(first) = seen.get(&id) {
            if first != file {
                let err = RegistryError::DuplicateId {
                    id: id.clone(),
                    first: first.clone(),
                    second: file.clone(),
                };
                report_violation(diagnostics, file, location, &err);
                continue;
            }
        }

        match registry.upsert(member, file, component) {
            Ok(()) => {
                seen.insert(id.clone(), file.clone());
                surviving.insert(id);
            }
            Err(err) => report_violation(diagnostics, file, location, &err),
        }
    }

    let removed = registry.remove_missing(member, file, &surviving);
    if !removed.is_empty() {
        tracing::trace!(member = %member, file = %file, removed = removed.len(), "stale artifacts dropped");
    }
}

fn report_violation(
    diagnostics: &mut Vec<Diagnostic>,
    file: &Arc<str>,
    location: SourceLocation,
    err: &RegistryError,
) {
    tracing::error!(id = %err.id(), "registry invariant violated: {}", err);
    diagnostics.push(Diagnostic::error(
        file.clone(),
        location,
        codes::INTERNAL_CONSISTENCY,
        err.to_string(),
    ));
}

/// Ids committed under the member's other files.
fn member_ids_outside(
    registry: &ArtifactRegistry,
    member: &str,
    path: &str,
) -> FxHashMap<ComponentId, Arc<str>> {
    let mut ids = FxHashMap::default();
    for file in registry.files(member) {
        if file.as_ref() == path {
            continue;
        }
        if let Some(artifacts) = registry.file_artifacts(member, file) {
            for id in artifacts.keys() {
                ids.insert(id.clone(), file.clone());
            }
        }
    }
    ids
}

/// Install `file` in `member` and bring the member's symbols and call graph
/// up to date for it. Returns the file it replaced.
fn swap_file(
    member: &mut ProjectMember,
    calls: &mut CallGraph,
    file: SourceFile,
) -> Option<SourceFile> {
    let previous = member.set_file(file)?;
    calls.update_file(member, &previous);
    Some(previous)
}

fn is_edited(component: &ArchitectureComponent, applied: &AppliedEdit) -> bool {
    component.kind() == applied.kind && component.location().start_offset() == applied.start_offset
}

fn code_location(at: &CodeLocation) -> SourceLocation {
    SourceLocation::new(at.start.line, at.start.column, at.end.line, at.end.column, 0, 0)
}

fn reject(path: &str, location: SourceLocation, reason: &str) -> MutationOutcome {
    tracing::debug!(file = path, reason, "mutation rejected");
    MutationOutcome::Rejected(vec![Diagnostic::error(
        path,
        location,
        codes::INVALID_MUTATION_TARGET,
        reason,
    )])
}

// ============================================================================
// MULTI-PROJECT HOST
// ============================================================================

/// Open projects keyed by URI, plus the file ownership index that routes
/// path-addressed requests.
#[derive(Default)]
struct OpenProjects {
    hosts: FxHashMap<Arc<str>, Arc<Mutex<ProjectHost>>>,
    /// File path → URIs of the open projects owning it, in open order
    owners: FxHashMap<Arc<str>, Vec<Arc<str>>>,
}

impl OpenProjects {
    fn index_file(&mut self, path: &Arc<str>, uri: &Arc<str>) {
        if !self.hosts.contains_key(uri) {
            return;
        }
        let owners = self.owners.entry(path.clone()).or_default();
        if !owners.contains(uri) {
            owners.push(uri.clone());
        }
    }

    fn unindex_file(&mut self, path: &str, uri: &str) {
        if let Some(owners) = self.owners.get_mut(path) {
            owners.retain(|owner| owner.as_ref() != uri);
            if owners.is_empty() {
                self.owners.remove(path);
            }
        }
    }

    fn close(&mut self, uri: &str) -> bool {
        if self.hosts.remove(uri).is_none() {
            return false;
        }
        self.owners.retain(|_, owners| {
            owners.retain(|owner| owner.as_ref() != uri);
            !owners.is_empty()
        });
        true
    }

    fn owner_of(&self, path: &str) -> Option<Arc<Mutex<ProjectHost>>> {
        self.owners
            .get(path)?
            .iter()
            .find_map(|uri| self.hosts.get(uri))
            .cloned()
    }
}

/// Open projects keyed by URI.
///
/// Requests for different projects run in parallel; requests for one
/// project are serialized on its `ProjectHost`. Path-addressed requests
/// find their project through a file index and never lock other projects.
pub struct DesignModelHost {
    projects: RwLock<OpenProjects>,
    loader: Box<dyn ProjectLoader>,
    options: GeneratorOptions,
}

impl DesignModelHost {
    pub fn new(loader: impl ProjectLoader + 'static) -> Self {
        Self {
            projects: RwLock::new(OpenProjects::default()),
            loader: Box::new(loader),
            options: GeneratorOptions::default(),
        }
    }

    pub fn with_options(mut self, options: GeneratorOptions) -> Self {
        self.options = options;
        self
    }

    /// Host of `uri`, loading the project on first request.
    pub fn open_project(&self, uri: &str) -> HostResult<Arc<Mutex<ProjectHost>>> {
        if let Some(host) = self.projects.read().hosts.get(uri) {
            return Ok(host.clone());
        }
        let project = self
            .loader
            .load(uri)
            .ok_or_else(|| HostError::project_not_found(uri))?;

        let mut projects = self.projects.write();
        if let Some(host) = projects.hosts.get(uri) {
            return Ok(host.clone());
        }
        tracing::debug!(project = uri, members = project.members.len(), "project opened");
        let uri: Arc<str> = Arc::from(uri);
        let paths: Vec<Arc<str>> = project
            .members
            .values()
            .flat_map(|member| member.files.keys().cloned())
            .collect();
        let host = Arc::new(Mutex::new(ProjectHost::new(project, self.options.clone())));
        projects.hosts.insert(uri.clone(), host.clone());
        for path in &paths {
            projects.index_file(path, &uri);
        }
        Ok(host)
    }

    /// Discard a project and its registry. Returns whether it was open.
    pub fn close_project(&self, uri: &str) -> bool {
        let closed = self.projects.write().close(uri);
        if closed {
            tracing::debug!(project = uri, "project closed");
        }
        closed
    }

    pub fn is_open(&self, uri: &str) -> bool {
        self.projects.read().hosts.contains_key(uri)
    }

    pub fn generate_model(
        &self,
        uri: &str,
        cancel: &CancellationToken,
    ) -> HostResult<ModelResponse> {
        let host = self.open_project(uri)?;
        let mut host = host.lock();
        host.generate_model(cancel)
    }

    pub fn notify_artifacts_changed(
        &self,
        uri: &str,
        cancel: &CancellationToken,
    ) -> HostResult<ArtifactsChangeNotification> {
        let host = self.open_project(uri)?;
        let mut host = host.lock();
        host.notify_artifacts_changed(cancel)
    }

    pub fn artifacts(&self, uri: &str, cancel: &CancellationToken) -> HostResult<ArtifactTree> {
        let host = self.open_project(uri)?;
        let mut host = host.lock();
        host.artifacts(cancel)
    }

    pub fn update_file(&self, uri: &str, member: &str, file: SourceFile) -> HostResult<()> {
        let host = self.open_project(uri)?;
        let path = file.path.clone();
        host.lock().update_file(member, file)?;
        self.projects.write().index_file(&path, &Arc::from(uri));
        Ok(())
    }

    pub fn remove_file(&self, uri: &str, path: &str) -> HostResult<()> {
        let host = self.open_project(uri)?;
        let still_owned = {
            let mut host = host.lock();
            host.remove_file(path)?;
            host.owns_file(path)
        };
        if !still_owned {
            self.projects.write().unindex_file(path, uri);
        }
        Ok(())
    }

    pub fn add_field(
        &self,
        path: &str,
        spec: &FieldSpec,
        at: &CodeLocation,
    ) -> HostResult<MutationOutcome> {
        let host = self.owner_of(path)?;
        let mut host = host.lock();
        host.add_field(path, spec, at)
    }

    pub fn modify_listener(
        &self,
        path: &str,
        spec: &ListenerSpec,
        at: &CodeLocation,
    ) -> HostResult<MutationOutcome> {
        let host = self.owner_of(path)?;
        let mut host = host.lock();
        host.modify_listener(path, spec, at)
    }

    /// Look up a single artifact of an open project.
    pub fn artifact(&self, uri: &str, id: &str) -> Option<Artifact> {
        let host = self.projects.read().hosts.get(uri).cloned()?;
        let host = host.lock();
        host.registry().get(id).cloned()
    }

    /// Open project owning `path`. The first project opened wins when
    /// several own the same path.
    fn owner_of(&self, path: &str) -> HostResult<Arc<Mutex<ProjectHost>>> {
        self.projects
            .read()
            .owner_of(path)
            .ok_or_else(|| HostError::file_not_found(path))
    }
}
