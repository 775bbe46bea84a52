use crate::alias::{AliasGroup, AliasMerger, LlmSynthesizer};
use crate::cache::EvaluationCache;
use crate::cli::{Cli, Commands, EvaluateArgs};
use crate::collectors::{CollectorSet, GitHubCollector, GiteeCollector, RepoIdentity};
use crate::config::Config;
use crate::orchestrator::{CompareRequest, Orchestrator};
use crate::plugins::{Dispatcher, ExecutableLoader, PluginRegistry};
use crate::sync::{SyncEngine, SyncOptions};
use crate::utils::text::mask_secret;
use anyhow::{Context, Result, anyhow};
use serde::Serialize;
use serde_json::json;
use std::sync::Arc;

/// Wire every component from configuration.
pub fn build_orchestrator(config: &Config) -> Orchestrator {
    let platforms = &config.platforms;
    let llm = &config.llm;
    tracing::debug!(
        github_token = %mask_secret(platforms.github_token.as_deref()),
        gitee_token = %mask_secret(platforms.gitee_token.as_deref()),
        llm_api_key = %mask_secret(llm.api_key.as_deref()),
        plugins_dir = %config.plugins_dir().display(),
        "Building orchestrator"
    );

    let layout = config.store_layout();
    let collectors = CollectorSet::new()
        .with(Arc::new(GitHubCollector::new(
            &platforms.github_api_base,
            platforms.github_token.as_deref(),
            platforms.request_timeout_secs,
        )))
        .with(Arc::new(GiteeCollector::new(
            &platforms.gitee_api_base,
            platforms.gitee_token.as_deref(),
            platforms.request_timeout_secs,
        )));

    let sync = SyncEngine::new(layout.clone(), collectors, platforms.max_commits);
    let registry = PluginRegistry::new(config.plugins_dir());
    let dispatcher = Dispatcher::new(
        Arc::new(ExecutableLoader),
        config.data_dir(),
        llm.api_key.clone(),
        Some(llm.default_model.clone()),
    );
    let cache = EvaluationCache::new(layout);
    let merger = AliasMerger::new(Arc::new(LlmSynthesizer::new(
        &llm.base_url,
        llm.api_key.as_deref(),
        &llm.default_model,
        llm.synthesis_temperature,
        llm.synthesis_max_tokens,
    )));

    Orchestrator::new(
        sync,
        registry,
        dispatcher,
        cache,
        merger,
        config.evaluation.orchestrator_settings(),
    )
}

fn compare_request(
    config: &Config,
    contributor: &str,
    repos: Vec<RepoIdentity>,
    options: EvaluateArgs,
) -> CompareRequest {
    CompareRequest {
        contributor: contributor.to_string(),
        repos,
        aliases: options
            .aliases
            .as_deref()
            .map(|list| AliasGroup::from_list(contributor, list)),
        plugin: options.plugin,
        use_cache: config.evaluation.use_cache && !options.no_cache,
        model: options.model,
    }
}

fn print_json<T: Serialize + ?Sized>(value: &T) -> Result<()> {
    let rendered = serde_json::to_string_pretty(value).context("Failed to render output")?;
    println!("{rendered}");
    Ok(())
}

pub async fn dispatch(cli: Cli, config: Config) -> Result<()> {
    let orchestrator = build_orchestrator(&config);

    match cli.command {
        Commands::Plugins => {
            let plugins = orchestrator.registry().discover();
            let listed: Vec<_> = plugins.iter().collect();
            print_json(&json!({
                "root": orchestrator.registry().root().display().to_string(),
                "default": plugins.default_plugin().map(|p| p.id.clone()),
                "plugins": listed,
            }))
        }

        Commands::Sync { repos, full } => {
            let report = orchestrator
                .sync_many(&repos, SyncOptions { force_full: full })
                .await
                .map_err(|e| anyhow!(e.reason()))?;
            print_json(&report)?;
            if report.all_failed() {
                return Err(anyhow!("no repository could be synced"));
            }
            Ok(())
        }

        Commands::Contributors { repos, aliases } => {
            let group = aliases.as_deref().and_then(AliasGroup::from_names);
            let common = orchestrator
                .common_contributors(&repos, group.as_ref())
                .map_err(|e| anyhow!(e.reason()))?;
            print_json(&common)
        }

        Commands::Authors { repo } => {
            let engine = orchestrator.sync_engine();
            let index = match engine.load_index(&repo)? {
                Some(index) => index,
                None => {
                    tracing::info!(repo = %repo, "No local index, syncing first");
                    engine
                        .sync(&repo, SyncOptions::default())
                        .await
                        .map_err(|e| anyhow!(e.reason()))?
                        .index
                }
            };
            print_json(&json!({
                "repo": repo.to_string(),
                "total_commits": index.len(),
                "authors": index.authors(),
            }))
        }

        Commands::Evaluate {
            repo,
            author,
            options,
        } => {
            let request = compare_request(&config, &author, Vec::new(), options);
            let comparison = orchestrator
                .evaluate(repo, &request)
                .await
                .map_err(|e| anyhow!(e.reason()))?;
            print_json(&comparison)
        }

        Commands::Compare {
            contributor,
            repos,
            options,
        } => {
            let request = compare_request(&config, &contributor, repos, options);
            let result = orchestrator
                .compare(&request)
                .await
                .map_err(|e| anyhow!(e.reason()))?;
            print_json(&result)
        }
    }
}
