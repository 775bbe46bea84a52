pub mod dispatch;

pub use dispatch::{build_orchestrator, dispatch};
