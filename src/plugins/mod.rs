//! Scoring plugins: discovery, loading and contract-checked dispatch.

pub mod contract;
pub mod dispatcher;
pub mod loader;
pub mod metadata;
pub mod registry;

pub use contract::{CommitEvaluator, EvaluateFuture, EvaluatorConfig, ScanPlugin};
pub use dispatcher::{DispatchRequest, Dispatcher};
pub use loader::{ExecutableLoader, PluginLoader};
pub use metadata::FlatMetadata;
pub use registry::{PluginDescriptor, PluginRegistry, PluginSet};
