//! Model requests: high-level APIs for the design-model transport.
//!
//! This module provides the interface between the architecture model (HIR)
//! and the editor transport. Each public method of [`DesignModelHost`]
//! corresponds to one request.
//!
//! ## Design Principles
//!
//! 1. **Atomic passes**: A request either commits a whole new registry or
//!    leaves the old one in place
//! 2. **No transport types**: Payloads are our own serde types
//! 3. **Isolated projects**: One `ProjectHost` per open project, nothing shared
//!
//! ## Usage
//!
//! ```ignore
//! use archgen::ide::DesignModelHost;
//!
//! let host = DesignModelHost::new(|uri: &str| loader.load(uri));
//! let model = host.generate_model("file:///app", &CancellationToken::new())?;
//! ```

mod compose;
mod edits;
mod error;
mod host;
mod mutation;

pub use compose::{ArtifactsChangeNotification, ModelResponse};
pub use edits::{
    CodeLocation, FieldSpec, ListenerArg, ListenerSpec, MutationOutcome, TextEdit,
    UpdatedArtifact,
};
pub use error::{HostError, HostResult};
pub use host::{DesignModelHost, ProjectHost, ProjectLoader};
