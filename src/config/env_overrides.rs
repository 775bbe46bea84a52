use super::Config;
use std::path::PathBuf;

fn non_empty(name: &str) -> Option<String> {
    std::env::var(name)
        .ok()
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

impl Config {
    pub fn apply_env_overrides(&mut self) {
        if let Some(dir) = non_empty("CONTRIBSCORE_DATA_DIR") {
            self.paths.data_dir = Some(PathBuf::from(dir));
        }

        if let Some(dir) = non_empty("CONTRIBSCORE_EVALUATIONS_DIR") {
            self.paths.evaluations_dir = Some(PathBuf::from(dir));
        }

        if let Some(dir) = non_empty("CONTRIBSCORE_PLUGINS_DIR") {
            self.paths.plugins_dir = Some(PathBuf::from(dir));
        }

        if let Some(token) = non_empty("GITHUB_TOKEN") {
            self.platforms.github_token = Some(token);
        }

        if let Some(token) = non_empty("GITEE_TOKEN") {
            self.platforms.gitee_token = Some(token);
        }

        if let Some(key) = non_empty("CONTRIBSCORE_LLM_API_KEY")
            .or_else(|| non_empty("OPENAI_API_KEY"))
            .or_else(|| non_empty("OPEN_ROUTER_KEY"))
        {
            self.llm.api_key = Some(key);
        }

        if let Some(base) = non_empty("CONTRIBSCORE_LLM_BASE_URL") {
            self.llm.base_url = base;
        }

        if let Some(model) = non_empty("CONTRIBSCORE_LLM_MODEL") {
            self.llm.default_model = model;
        }

        if let Ok(raw) = std::env::var("CONTRIBSCORE_CONCURRENCY")
            && let Ok(limit) = raw.trim().parse::<usize>()
        {
            self.evaluation.concurrency = limit;
        }
    }
}
