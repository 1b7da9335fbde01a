//! Connection extraction.
//!
//! A connection is a remote-method call or resource access on a client,
//! seen from the Service or FunctionEntryPoint that makes it. Calls to
//! module-level functions contribute the callee's connections, using the
//! per-function summaries in [`CallGraph`].

use std::sync::Arc;

use indexmap::IndexMap;
use rustc_hash::{FxHashMap, FxHashSet};

use crate::base::SourceLocation;
use crate::hir::GeneratorOptions;
use crate::syntax::{
    DeclKind, Expr, FunctionBody, FunctionDefinition, FunctionKind, ModuleMember, ObjectField,
    ProjectMember, SourceFile, Stmt, SymbolTable, TypeDesc, TypeKind,
};

use super::context::ExtractionContext;
use super::extract::Extractor;
use super::types::{
    ArchitectureComponent, ClientScope, ComponentId, ComponentKind, Connection, ConnectionTarget,
    InteractionKind,
};

// ============================================================================
// CALL SUMMARIES
// ============================================================================

/// A single call on a resolved client.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientUse {
    pub target: ConnectionTarget,
    pub interaction: InteractionKind,
    pub location: SourceLocation,
}

/// Client uses and module-function calls of a body, in source order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CallEvent {
    Use(ClientUse),
    Call {
        callee: Arc<str>,
        location: SourceLocation,
    },
}

/// Summaries of every module-level function of one project member.
#[derive(Debug, Clone, Default)]
pub struct CallGraph {
    functions: FxHashMap<Arc<str>, Vec<CallEvent>>,
}

impl CallGraph {
    /// Summarize every module-level function of `member`.
    pub fn build(member: &ProjectMember) -> Self {
        let mut graph = Self::default();
        for file in member.files.values() {
            graph.summarize_file(member, file);
        }
        tracing::trace!(
            member = %member.name,
            functions = graph.functions.len(),
            "call graph built"
        );
        graph
    }

    /// Replace the summaries contributed by `previous` with those of the
    /// file now stored under the same path in `member`.
    ///
    /// `member` must already hold the new file and its symbols.
    pub fn update_file(&mut self, member: &ProjectMember, previous: &SourceFile) {
        for function in module_functions(previous) {
            if let Some(name) = &function.name {
                self.functions.remove(&name.text);
            }
        }
        if let Some(current) = member.file(&previous.path) {
            self.summarize_file(member, current);
        }
        tracing::trace!(
            member = %member.name,
            file = %previous.path,
            functions = self.functions.len(),
            "call graph updated"
        );
    }

    fn summarize_file(&mut self, member: &ProjectMember, file: &SourceFile) {
        for function in module_functions(file) {
            let Some(name) = function.name.as_ref() else {
                continue;
            };
            let mut scanner = ClientScanner::new(&member.name, &name.text, &member.symbols, &[]);
            scanner.scan_function(function);
            self.functions.insert(name.text.clone(), scanner.events);
        }
    }

    pub fn events(&self, function: &str) -> Option<&[CallEvent]> {
        self.functions.get(function).map(Vec::as_slice)
    }

    pub fn len(&self) -> usize {
        self.functions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.functions.is_empty()
    }

    /// All client uses reachable from `function`, following calls.
    pub fn reachable_uses(&self, function: &str) -> Vec<ClientUse> {
        let mut visited = FxHashSet::default();
        let mut uses = Vec::new();
        self.collect_reachable(function, &mut visited, &mut uses);
        uses
    }

    fn collect_reachable<'g>(
        &'g self,
        function: &'g str,
        visited: &mut FxHashSet<&'g str>,
        uses: &mut Vec<ClientUse>,
    ) {
        if !visited.insert(function) {
            return;
        }
        let Some(events) = self.functions.get(function) else {
            return;
        };
        for event in events {
            match event {
                CallEvent::Use(client_use) => uses.push(client_use.clone()),
                CallEvent::Call { callee, .. } => self.collect_reachable(callee, visited, uses),
            }
        }
    }
}

/// Module-level functions of a file; methods and service functions are
/// summarized where they are declared.
fn module_functions(file: &SourceFile) -> impl Iterator<Item = &FunctionDefinition> {
    file.members.iter().filter_map(|item| match item {
        ModuleMember::Function(function) if function.kind == FunctionKind::Function => {
            Some(function)
        }
        _ => None,
    })
}

// ============================================================================
// CLIENT SCANNER
// ============================================================================

enum Resolution {
    Client(ConnectionTarget),
    NotClient,
    Unknown,
}

/// Walks a body, binding locals and resolving client expressions.
struct ClientScanner<'a> {
    member: &'a str,
    /// Name of the enclosing construct, used to scope local and field ids
    owner: &'a str,
    symbols: &'a SymbolTable,
    fields: &'a [ObjectField],
    params: FxHashSet<Arc<str>>,
    locals: FxHashMap<Arc<str>, Option<ConnectionTarget>>,
    events: Vec<CallEvent>,
    unresolved: Vec<(SourceLocation, String)>,
}

impl<'a> ClientScanner<'a> {
    fn new(
        member: &'a str,
        owner: &'a str,
        symbols: &'a SymbolTable,
        fields: &'a [ObjectField],
    ) -> Self {
        Self {
            member,
            owner,
            symbols,
            fields,
            params: FxHashSet::default(),
            locals: FxHashMap::default(),
            events: Vec::new(),
            unresolved: Vec::new(),
        }
    }

    fn scan_function(&mut self, function: &FunctionDefinition) {
        self.locals.clear();
        self.params = function
            .params
            .iter()
            .filter_map(|p| p.name.as_ref().map(|n| n.text.clone()))
            .collect();
        match &function.body {
            FunctionBody::Block { statements } => self.scan_stmts(statements),
            FunctionBody::Expr { expr } => self.scan_expr(expr),
            FunctionBody::External => {}
        }
    }

    fn scan_stmts(&mut self, statements: &[Stmt]) {
        for stmt in statements {
            self.scan_stmt(stmt);
        }
    }

    fn scan_stmt(&mut self, stmt: &Stmt) {
        match stmt {
            Stmt::Local {
                name,
                type_desc,
                init,
                ..
            } => {
                if let Some(init) = init {
                    self.scan_expr(init);
                }
                if let Some(name) = name {
                    let binding = init
                        .as_ref()
                        .filter(|init| init.is_construction())
                        .and_then(|init| type_desc.as_ref().or_else(|| init.constructed_type()))
                        .and_then(|ty| {
                            let id = format!("{}.{}", self.owner, name.text);
                            self.client_target(&id, &name.text, ty, ClientScope::Local)
                        });
                    self.locals.insert(name.text.clone(), binding);
                }
            }
            Stmt::Assign { target, value, .. } => {
                self.scan_expr(target);
                self.scan_expr(value);
            }
            Stmt::Expr { expr } => self.scan_expr(expr),
            Stmt::Return { value, .. } => {
                if let Some(value) = value {
                    self.scan_expr(value);
                }
            }
            Stmt::If {
                condition,
                then_branch,
                else_branch,
                ..
            } => {
                self.scan_expr(condition);
                self.scan_stmts(then_branch);
                self.scan_stmts(else_branch);
            }
            Stmt::While {
                condition, body, ..
            } => {
                self.scan_expr(condition);
                self.scan_stmts(body);
            }
            Stmt::Foreach {
                variable,
                collection,
                body,
                ..
            } => {
                self.scan_expr(collection);
                if let Some(variable) = variable {
                    self.locals.insert(variable.text.clone(), None);
                }
                self.scan_stmts(body);
            }
            Stmt::Block { body, .. } => self.scan_stmts(body),
        }
    }

    fn scan_expr(&mut self, expr: &Expr) {
        match expr {
            Expr::RemoteCall { client, range, .. } => {
                self.record_use(client, InteractionKind::RemoteCall, range.location());
            }
            Expr::ResourceAccess { client, range, .. } => {
                self.record_use(client, InteractionKind::ResourceAccess, range.location());
            }
            Expr::Call { callee, range, .. } => {
                if let Expr::Name { name, .. } = callee.as_ref() {
                    let is_module_function = !self.locals.contains_key(name)
                        && self.symbols.lookup(DeclKind::Function, name).is_some();
                    if is_module_function {
                        self.events.push(CallEvent::Call {
                            callee: name.clone(),
                            location: range.location(),
                        });
                    }
                }
            }
            _ => {}
        }
        for child in expr.children() {
            self.scan_expr(child);
        }
    }

    fn record_use(&mut self, client: &Expr, interaction: InteractionKind, location: SourceLocation) {
        match self.resolve_client(client) {
            Resolution::Client(target) => self.events.push(CallEvent::Use(ClientUse {
                target,
                interaction,
                location,
            })),
            Resolution::NotClient => {}
            Resolution::Unknown => {
                self.unresolved
                    .push((client.range().location(), client.source_text()));
            }
        }
    }

    fn resolve_client(&self, expr: &Expr) -> Resolution {
        match expr.strip_check() {
            Expr::Name { name, .. } => {
                if let Some(binding) = self.locals.get(name) {
                    return match binding {
                        Some(target) => Resolution::Client(target.clone()),
                        None => Resolution::NotClient,
                    };
                }
                if self.params.contains(name) {
                    return Resolution::NotClient;
                }
                if let Some(symbol) = self.symbols.lookup(DeclKind::Variable, name) {
                    let target = symbol.type_signature.as_deref().and_then(|sig| {
                        self.client_target_for_signature(name, name, sig, ClientScope::Global)
                    });
                    return match target {
                        Some(target) => Resolution::Client(target),
                        None => Resolution::NotClient,
                    };
                }
                if self.symbols.lookup(DeclKind::Listener, name).is_some() {
                    return Resolution::NotClient;
                }
                Resolution::Unknown
            }
            Expr::FieldAccess { target, field, .. }
                if matches!(target.as_ref(), Expr::Name { name, .. } if name.as_ref() == "self") =>
            {
                let Some(object_field) = self
                    .fields
                    .iter()
                    .find(|f| f.name.as_ref().is_some_and(|n| n.text == *field))
                else {
                    return Resolution::Unknown;
                };
                let id = format!("{}.{}", self.owner, field);
                match object_field
                    .effective_type()
                    .and_then(|ty| self.client_target(&id, field, ty, ClientScope::Object))
                {
                    Some(target) => Resolution::Client(target),
                    None => Resolution::NotClient,
                }
            }
            _ => Resolution::NotClient,
        }
    }

    fn client_target(
        &self,
        id: &str,
        name: &str,
        ty: &TypeDesc,
        scope: ClientScope,
    ) -> Option<ConnectionTarget> {
        self.client_target_for_signature(id, name, &ty.signature(), scope)
    }

    /// Target for a client of type `signature`, or `None` if the type is not
    /// a client. A client class declared in the member is its own target.
    fn client_target_for_signature(
        &self,
        id: &str,
        name: &str,
        signature: &str,
        scope: ClientScope,
    ) -> Option<ConnectionTarget> {
        if self.symbols.type_kind(signature) != Some(TypeKind::Client) {
            return None;
        }
        let declared_class = !signature.contains(':')
            && self.symbols.lookup(DeclKind::Class, signature).is_some();
        let target = if declared_class {
            ConnectionTarget {
                id: Arc::from(format!(
                    "{}:{}:{}",
                    ComponentKind::Entity.tag(),
                    self.member,
                    signature
                )),
                name: Arc::from(signature),
                type_signature: Some(Arc::from(signature)),
                scope,
            }
        } else {
            ConnectionTarget {
                id: Arc::from(format!("client:{}:{}", self.member, id)),
                name: Arc::from(name),
                type_signature: Some(Arc::from(signature)),
                scope,
            }
        };
        Some(target)
    }
}

// ============================================================================
// CONNECTION EXTRACTION
// ============================================================================

/// Module-level client declarations, emitted as connections without a
/// source whether or not anything calls them.
pub(super) struct ConnectionExtractor;

impl Extractor for ConnectionExtractor {
    fn matches(&self, member: &ModuleMember) -> bool {
        matches!(member, ModuleMember::Variable(_))
    }

    fn extract(
        &self,
        member: &ModuleMember,
        ctx: &mut ExtractionContext,
        out: &mut Vec<ArchitectureComponent>,
    ) {
        let ModuleMember::Variable(variable) = member else {
            return;
        };
        let (Some(name), Some(ty)) = (&variable.name, variable.effective_type()) else {
            return;
        };
        let scanner = ClientScanner::new(ctx.member, &name.text, ctx.symbols, &[]);
        let Some(target) = scanner.client_target(&name.text, &name.text, ty, ClientScope::Global)
        else {
            return;
        };

        let id = ctx.declare_id(
            ComponentKind::Connection,
            Some(DeclKind::Variable),
            &name.text,
            variable.range,
        );
        tracing::trace!(connection = %id, "module client declared");
        out.push(ArchitectureComponent::Connection(Connection {
            id,
            source: None,
            target,
            interaction: InteractionKind::Declared,
            call_count: 0,
            file: ctx.file.clone(),
            location: variable.range.location(),
        }));
    }
}

/// Emit the collapsed connections of `source` across `functions`.
///
/// Returns, for each function in order, the ids of the connections it
/// makes.
pub(super) fn extract_connections<'f>(
    out: &mut Vec<ArchitectureComponent>,
    ctx: &mut ExtractionContext,
    source: &ComponentId,
    owner: &str,
    fields: &[ObjectField],
    functions: impl IntoIterator<Item = &'f FunctionDefinition>,
) -> Vec<Vec<ComponentId>> {
    let mut scanner = ClientScanner::new(ctx.member, owner, ctx.symbols, fields);
    let mut bounds = Vec::new();
    for function in functions {
        let start = scanner.events.len();
        scanner.scan_function(function);
        bounds.push(start..scanner.events.len());
    }
    for (location, text) in std::mem::take(&mut scanner.unresolved) {
        ctx.diagnostics.unresolved_client(location, &text);
    }

    let mut collapsed: IndexMap<ComponentId, (ClientUse, usize)> = IndexMap::new();
    let mut per_function = Vec::with_capacity(bounds.len());
    for bound in bounds {
        let events = scanner.events[bound].iter().cloned();
        let mut ids: Vec<ComponentId> = Vec::new();
        for client_use in expand_calls(events, ctx.calls, ctx.options) {
            let id: ComponentId = Arc::from(format!(
                "{}:{}->{}",
                ComponentKind::Connection.tag(),
                source,
                client_use.target.id
            ));
            if !ids.contains(&id) {
                ids.push(id.clone());
            }
            collapsed
                .entry(id)
                .and_modify(|(_, count)| *count += 1)
                .or_insert((client_use, 1));
        }
        per_function.push(ids);
    }

    for (id, (first, call_count)) in collapsed {
        out.push(ArchitectureComponent::Connection(Connection {
            id,
            source: Some(source.clone()),
            target: first.target,
            interaction: first.interaction,
            call_count,
            file: ctx.file.clone(),
            location: first.location,
        }));
    }
    per_function
}

/// Replace call events by the uses they reach, located at the call site.
fn expand_calls(
    events: impl IntoIterator<Item = CallEvent>,
    calls: &CallGraph,
    options: &GeneratorOptions,
) -> Vec<ClientUse> {
    let mut uses = Vec::new();
    for event in events {
        match event {
            CallEvent::Use(client_use) => uses.push(client_use),
            CallEvent::Call { callee, location } => {
                if !options.follow_function_calls {
                    continue;
                }
                for reached in calls.reachable_uses(&callee) {
                    uses.push(ClientUse {
                        location,
                        ..reached
                    });
                }
            }
        }
    }
    uses
}
