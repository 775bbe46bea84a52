mod env_overrides;
mod loader;
#[cfg(test)]
mod test_env;
mod types;

pub use loader::{HOME_ENV, resolve_home};
pub use types::{
    Config, DEFAULT_LLM_MODEL, EvaluationConfig, LlmConfig, PathsConfig, PlatformsConfig,
};
