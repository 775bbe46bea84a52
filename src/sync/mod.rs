//! Incremental sync of repository commit history into a durable local index.

pub mod engine;
pub mod index;
pub mod state;

pub use engine::{SyncEngine, SyncOptions, SyncOutcome, SyncReport, SyncStatus};
pub use index::{AuthorSummary, CommitIndex};
pub use state::SyncState;
