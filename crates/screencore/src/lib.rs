//! Core abstractions for the screening workflow engine
//!
//! This crate provides the fundamental types and traits that all other
//! components depend on: the shared state and its deltas, the node contract,
//! the capabilities nodes may call, and the workflow definition with its
//! structural validation.

mod capability;
mod error;
pub mod events;
mod node;
mod state;
mod workflow;

pub use capability::{DocumentKind, DocumentStore, TextGenerator};
pub use error::{CapabilityError, FlowError, NodeError, WorkflowError};
pub use events::*;
pub use node::{FnNode, Node, NodeContext};
pub use state::{State, StateDelta, MESSAGES_KEY};
pub use workflow::{Edge, EntryPolicy, Workflow};

/// Result type for flow operations
pub type Result<T> = std::result::Result<T, FlowError>;
