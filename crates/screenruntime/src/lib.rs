//! Workflow execution runtime
//!
//! This crate provides the scheduler that runs validated workflows, the
//! result stream it produces, the node registry and the workflow file loader.

mod executor;
mod loader;
mod registry;
mod runtime;
mod stream;

pub use executor::{ErrorHandling, WorkflowExecutor};
pub use loader::{NodeSpec, WorkflowSpec};
pub use registry::{NodeFactory, NodeMetadata, NodeRegistry};
pub use runtime::{FlowRuntime, RuntimeConfig};
pub use stream::{ResultEvent, ResultStream, RunReport};
