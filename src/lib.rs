#![warn(clippy::all, clippy::pedantic)]
#![allow(
    clippy::missing_errors_doc,
    clippy::missing_panics_doc,
    clippy::module_name_repetitions,
    clippy::struct_field_names,
    clippy::must_use_candidate,
    clippy::new_without_default,
    clippy::return_self_not_must_use,
    clippy::cast_precision_loss
)]

pub mod alias;
pub mod app;
pub mod cache;
pub mod cli;
pub mod collectors;
pub mod config;
pub mod error;
pub mod evaluation;
pub mod orchestrator;
pub mod plugins;
pub mod store;
pub mod sync;
pub mod utils;

pub use config::Config;
pub use error::ScoreError;
pub use orchestrator::{CompareRequest, ComparisonResult, Orchestrator};
