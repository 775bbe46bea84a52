use super::Config;
use crate::error::ConfigError;
use anyhow::{Context, Result};
use directories::UserDirs;
use std::fs;
use std::path::{Path, PathBuf};

pub const HOME_ENV: &str = "CONTRIBSCORE_HOME";

/// `$CONTRIBSCORE_HOME`, else `~/.contribscore`.
pub fn resolve_home() -> Result<PathBuf> {
    if let Ok(home) = std::env::var(HOME_ENV)
        && !home.trim().is_empty()
    {
        return Ok(PathBuf::from(home.trim()));
    }
    let home = UserDirs::new()
        .map(|u| u.home_dir().to_path_buf())
        .context("Could not find home directory")?;
    Ok(home.join(".contribscore"))
}

impl Config {
    pub fn load_or_init() -> Result<Self> {
        Self::load_or_init_at(&resolve_home()?)
    }

    /// Read `home/config.toml`, writing defaults on first run.
    pub fn load_or_init_at(home: &Path) -> Result<Self> {
        let config_path = home.join("config.toml");

        if !home.exists() {
            fs::create_dir_all(home).context("Failed to create contribscore home directory")?;
        }

        if config_path.exists() {
            let contents =
                fs::read_to_string(&config_path).context("Failed to read config file")?;
            let mut config: Config =
                toml::from_str(&contents).context("Failed to parse config file")?;
            config.config_path = config_path;
            config.home_dir = home.to_path_buf();
            Ok(config)
        } else {
            let config = Self::with_home(home);
            config.save()?;
            tracing::info!(path = %config.config_path.display(), "Wrote default config");
            Ok(config)
        }
    }

    pub fn save(&self) -> Result<()> {
        let toml_str = toml::to_string_pretty(self).context("Failed to serialize config")?;
        fs::write(&self.config_path, toml_str).context("Failed to write config file")?;
        Ok(())
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        let evaluation = &self.evaluation;
        if evaluation.concurrency == 0 {
            return Err(ConfigError::Validation(
                "evaluation.concurrency must be at least 1".into(),
            ));
        }
        if evaluation.max_repos == 0 {
            return Err(ConfigError::Validation(
                "evaluation.max_repos must be at least 1".into(),
            ));
        }
        if evaluation.repo_timeout_secs == 0 {
            return Err(ConfigError::Validation(
                "evaluation.repo_timeout_secs must be greater than 0".into(),
            ));
        }
        if evaluation.max_commits_per_evaluation == 0 {
            return Err(ConfigError::Validation(
                "evaluation.max_commits_per_evaluation must be at least 1".into(),
            ));
        }
        if self.platforms.request_timeout_secs == 0 {
            return Err(ConfigError::Validation(
                "platforms.request_timeout_secs must be greater than 0".into(),
            ));
        }
        if !(0.0..=2.0).contains(&self.llm.synthesis_temperature) {
            return Err(ConfigError::Validation(format!(
                "llm.synthesis_temperature must be within 0.0..=2.0, got {}",
                self.llm.synthesis_temperature
            )));
        }
        Ok(())
    }
}
