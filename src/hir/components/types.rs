//! Architecture component types.
//!
//! [`ArchitectureComponent`] is a closed sum over the five component kinds.
//! Components reference each other by [`ComponentId`] only.

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use smol_str::SmolStr;

use crate::base::SourceLocation;

/// Stable logical identifier of a component.
pub type ComponentId = Arc<str>;

// ============================================================================
// COMPONENT KIND
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum ComponentKind {
    Service,
    Listener,
    Entity,
    Connection,
    FunctionEntryPoint,
}

impl ComponentKind {
    /// Tag used as the first segment of component ids.
    pub fn tag(&self) -> &'static str {
        match self {
            ComponentKind::Service => "service",
            ComponentKind::Listener => "listener",
            ComponentKind::Entity => "entity",
            ComponentKind::Connection => "connection",
            ComponentKind::FunctionEntryPoint => "function",
        }
    }
}

// ============================================================================
// VARIANT ATTRIBUTES
// ============================================================================

/// A service's reference to a listener it is attached to.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "status", content = "value")]
pub enum ListenerRef {
    Resolved(ComponentId),
    /// Attach expression that named no known listener.
    Unresolved(Arc<str>),
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResourceFunction {
    pub accessor: SmolStr,
    pub path: Arc<str>,
    pub location: SourceLocation,
    /// Ids of the service connections this function makes, in call order.
    #[serde(default)]
    pub connections: Vec<ComponentId>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NamedFunction {
    pub name: Arc<str>,
    pub location: SourceLocation,
    #[serde(default)]
    pub connections: Vec<ComponentId>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ObjectFieldInfo {
    pub name: Arc<str>,
    pub type_signature: Option<Arc<str>>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Service {
    pub id: ComponentId,
    pub name: Arc<str>,
    pub display_name: Arc<str>,
    pub base_path: Option<Arc<str>>,
    /// e.g. `http:Service`, derived from the first attached listener.
    pub service_type: Option<Arc<str>>,
    pub listeners: Vec<ListenerRef>,
    pub resource_functions: Vec<ResourceFunction>,
    pub remote_functions: Vec<NamedFunction>,
    pub other_functions: Vec<NamedFunction>,
    pub fields: Vec<ObjectFieldInfo>,
    pub file: Arc<str>,
    pub location: SourceLocation,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ListenerKind {
    /// `listener T name = ...` at module level.
    Named,
    /// Inline `new T(...)` in a service's attach list.
    Anonymous,
    /// Module-qualified reference such as `mod:defaultListener`.
    Imported,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct KeyValue {
    pub key: Arc<str>,
    pub value: Arc<str>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Listener {
    pub id: ComponentId,
    pub name: Arc<str>,
    pub kind: ListenerKind,
    pub type_signature: Option<Arc<str>>,
    pub args: Vec<KeyValue>,
    pub port: Option<u16>,
    pub file: Arc<str>,
    pub location: SourceLocation,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum EntityKind {
    Record,
    Enum,
    Class,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EntityField {
    pub name: Arc<str>,
    pub type_signature: Option<Arc<str>>,
    pub optional: bool,
    pub readonly: bool,
    /// Id of the entity this field's type names, when it is one.
    pub reference: Option<ComponentId>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Entity {
    pub id: ComponentId,
    pub name: Arc<str>,
    pub kind: EntityKind,
    pub fields: Vec<EntityField>,
    pub members: Vec<Arc<str>>,
    pub file: Arc<str>,
    pub location: SourceLocation,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ClientScope {
    /// Module-level client variable.
    Global,
    /// Field of the enclosing service or class.
    Object,
    /// Local variable of a function body.
    Local,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum InteractionKind {
    RemoteCall,
    ResourceAccess,
    /// A module-level client declaration, independent of any call.
    Declared,
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ConnectionTarget {
    pub id: ComponentId,
    pub name: Arc<str>,
    pub type_signature: Option<Arc<str>>,
    pub scope: ClientScope,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Connection {
    pub id: ComponentId,
    /// Calling service or function; `None` for a module-level client.
    pub source: Option<ComponentId>,
    pub target: ConnectionTarget,
    pub interaction: InteractionKind,
    /// Number of call sites collapsed into this connection.
    pub call_count: usize,
    pub file: Arc<str>,
    pub location: SourceLocation,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum FunctionEntryKind {
    Automation,
    DataMapper,
    Function,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FunctionEntryPoint {
    pub id: ComponentId,
    pub name: Arc<str>,
    pub kind: FunctionEntryKind,
    pub display_name: Arc<str>,
    /// Parameter signatures, `type name`.
    pub params: Vec<Arc<str>>,
    pub file: Arc<str>,
    pub location: SourceLocation,
}

// ============================================================================
// ARCHITECTURE COMPONENT
// ============================================================================

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "component")]
pub enum ArchitectureComponent {
    Service(Service),
    Listener(Listener),
    Entity(Entity),
    Connection(Connection),
    FunctionEntryPoint(FunctionEntryPoint),
}

impl ArchitectureComponent {
    pub fn id(&self) -> &ComponentId {
        match self {
            ArchitectureComponent::Service(c) => &c.id,
            ArchitectureComponent::Listener(c) => &c.id,
            ArchitectureComponent::Entity(c) => &c.id,
            ArchitectureComponent::Connection(c) => &c.id,
            ArchitectureComponent::FunctionEntryPoint(c) => &c.id,
        }
    }

    /// Display name shown to the user.
    pub fn name(&self) -> &Arc<str> {
        match self {
            ArchitectureComponent::Service(c) => &c.display_name,
            ArchitectureComponent::Listener(c) => &c.name,
            ArchitectureComponent::Entity(c) => &c.name,
            ArchitectureComponent::Connection(c) => &c.target.name,
            ArchitectureComponent::FunctionEntryPoint(c) => &c.display_name,
        }
    }

    pub fn kind(&self) -> ComponentKind {
        match self {
            ArchitectureComponent::Service(_) => ComponentKind::Service,
            ArchitectureComponent::Listener(_) => ComponentKind::Listener,
            ArchitectureComponent::Entity(_) => ComponentKind::Entity,
            ArchitectureComponent::Connection(_) => ComponentKind::Connection,
            ArchitectureComponent::FunctionEntryPoint(_) => ComponentKind::FunctionEntryPoint,
        }
    }

    pub fn file(&self) -> &Arc<str> {
        match self {
            ArchitectureComponent::Service(c) => &c.file,
            ArchitectureComponent::Listener(c) => &c.file,
            ArchitectureComponent::Entity(c) => &c.file,
            ArchitectureComponent::Connection(c) => &c.file,
            ArchitectureComponent::FunctionEntryPoint(c) => &c.file,
        }
    }

    pub fn location(&self) -> &SourceLocation {
        match self {
            ArchitectureComponent::Service(c) => &c.location,
            ArchitectureComponent::Listener(c) => &c.location,
            ArchitectureComponent::Entity(c) => &c.location,
            ArchitectureComponent::Connection(c) => &c.location,
            ArchitectureComponent::FunctionEntryPoint(c) => &c.location,
        }
    }

    /// UI category the component is listed under.
    pub fn category(&self) -> &'static str {
        match self {
            ArchitectureComponent::Service(_) => "Entry Points",
            ArchitectureComponent::Listener(_) => "Listeners",
            ArchitectureComponent::Entity(_) => "Types",
            ArchitectureComponent::Connection(_) => "Connections",
            ArchitectureComponent::FunctionEntryPoint(f) => match f.kind {
                FunctionEntryKind::Automation => "Entry Points",
                FunctionEntryKind::DataMapper => "Data Mappers",
                FunctionEntryKind::Function => "Functions",
            },
        }
    }

    pub fn as_service(&self) -> Option<&Service> {
        match self {
            ArchitectureComponent::Service(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_listener(&self) -> Option<&Listener> {
        match self {
            ArchitectureComponent::Listener(l) => Some(l),
            _ => None,
        }
    }

    pub fn as_entity(&self) -> Option<&Entity> {
        match self {
            ArchitectureComponent::Entity(e) => Some(e),
            _ => None,
        }
    }

    pub fn as_connection(&self) -> Option<&Connection> {
        match self {
            ArchitectureComponent::Connection(c) => Some(c),
            _ => None,
        }
    }

    pub fn as_function(&self) -> Option<&FunctionEntryPoint> {
        match self {
            ArchitectureComponent::FunctionEntryPoint(f) => Some(f),
            _ => None,
        }
    }
}

/// Result of extracting one file.
#[derive(Debug, Clone, Default)]
pub struct FileExtraction {
    pub components: Vec<ArchitectureComponent>,
    pub diagnostics: Vec<crate::hir::Diagnostic>,
}
