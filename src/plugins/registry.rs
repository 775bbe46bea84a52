use super::metadata::{FlatMetadata, METADATA_FILE};
use crate::error::PluginError;
use serde::Serialize;
use std::collections::HashSet;
use std::path::{Path, PathBuf};

pub const DEFAULT_SCAN_ENTRY: &str = "scan/__init__";
const DEFAULT_VIEW_SINGLE_ENTRY: &str = "view/single_repo.tsx";
const DEFAULT_VIEW_COMPARE_ENTRY: &str = "view/multi_repo_compare.tsx";
const DEFAULT_VIEW_ENTRY: &str = "view/index.tsx";

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PluginDescriptor {
    pub id: String,
    pub name: String,
    pub version: String,
    pub description: String,
    pub default: bool,
    pub plugin_dir: PathBuf,
    pub scan_entry: String,
    pub view_single_entry: String,
    pub view_compare_entry: String,
    /// Legacy single-view entry.
    pub view_entry: String,
}

impl PluginDescriptor {
    pub fn from_metadata(meta: &FlatMetadata, plugin_dir: &Path) -> Self {
        let dir_name = plugin_dir
            .file_name()
            .and_then(|n| n.to_str())
            .unwrap_or("plugin");
        let id = meta
            .text("id")
            .or_else(|| meta.text("plugin_id"))
            .unwrap_or(dir_name)
            .to_string();
        let text_or = |key: &str, fallback: &str| meta.text(key).unwrap_or(fallback).to_string();

        Self {
            name: text_or("name", &id),
            version: text_or("version", "0.0.0"),
            description: text_or("description", ""),
            default: meta.flag("default"),
            plugin_dir: plugin_dir.to_path_buf(),
            scan_entry: text_or("scan_entry", DEFAULT_SCAN_ENTRY),
            view_single_entry: text_or("view_single_entry", DEFAULT_VIEW_SINGLE_ENTRY),
            view_compare_entry: text_or("view_compare_entry", DEFAULT_VIEW_COMPARE_ENTRY),
            view_entry: text_or("view_entry", DEFAULT_VIEW_ENTRY),
            id,
        }
    }

    /// Scan entry inside the plugin's own directory (not yet canonicalized).
    pub fn scan_path(&self) -> PathBuf {
        self.plugin_dir.join(&self.scan_entry)
    }
}

/// Plugins found by one directory scan, in discovery order.
#[derive(Debug, Clone, Default)]
pub struct PluginSet {
    root: PathBuf,
    plugins: Vec<PluginDescriptor>,
    default_index: Option<usize>,
}

impl PluginSet {
    pub fn is_empty(&self) -> bool {
        self.plugins.is_empty()
    }

    pub fn len(&self) -> usize {
        self.plugins.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = &PluginDescriptor> {
        self.plugins.iter()
    }

    pub fn ids(&self) -> Vec<String> {
        self.plugins.iter().map(|p| p.id.clone()).collect()
    }

    pub fn get(&self, id: &str) -> Option<&PluginDescriptor> {
        self.plugins.iter().find(|p| p.id == id)
    }

    pub fn default_plugin(&self) -> Option<&PluginDescriptor> {
        self.default_index.and_then(|i| self.plugins.get(i))
    }

    /// Fails when nothing can serve a request without an explicit id.
    pub fn ensure_usable(&self) -> Result<(), PluginError> {
        if self.plugins.is_empty() {
            return Err(PluginError::NoPlugins {
                root: self.root.display().to_string(),
            });
        }
        if self.default_plugin().is_none() {
            return Err(PluginError::NoDefault);
        }
        Ok(())
    }

    /// The requested plugin, or the default when none is requested.
    ///
    /// An unknown id is reported with the available ids and never falls back
    /// to the default.
    pub fn resolve(&self, requested: Option<&str>) -> Result<&PluginDescriptor, PluginError> {
        match requested.map(str::trim).filter(|id| !id.is_empty()) {
            Some(id) => self.get(id).ok_or_else(|| PluginError::NotFound {
                requested: id.to_string(),
                available: self.ids(),
            }),
            None => {
                self.ensure_usable()?;
                self.default_plugin().ok_or(PluginError::NoDefault)
            }
        }
    }
}

/// Directory-convention plugin discovery. Every query rescans the root, so
/// added or deleted plugin directories are reflected immediately.
#[derive(Debug, Clone)]
pub struct PluginRegistry {
    root: PathBuf,
}

impl PluginRegistry {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn discover(&self) -> PluginSet {
        let mut set = PluginSet {
            root: self.root.clone(),
            ..PluginSet::default()
        };

        let Ok(entries) = std::fs::read_dir(&self.root) else {
            tracing::warn!(root = %self.root.display(), "Plugins directory is not readable");
            return set;
        };

        let mut dirs: Vec<PathBuf> = entries
            .flatten()
            .map(|entry| entry.path())
            .filter(|path| path.is_dir())
            .collect();
        dirs.sort();

        let mut seen: HashSet<String> = HashSet::new();
        for dir in dirs {
            let index = dir.join(METADATA_FILE);
            let raw = match std::fs::read_to_string(&index) {
                Ok(raw) => raw,
                Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                    tracing::debug!(dir = %dir.display(), "Skipping directory without plugin metadata");
                    continue;
                }
                Err(e) => {
                    tracing::warn!(path = %index.display(), error = %e, "Skipping unreadable plugin metadata");
                    continue;
                }
            };

            let descriptor = PluginDescriptor::from_metadata(&FlatMetadata::parse(&raw), &dir);
            if !seen.insert(descriptor.id.clone()) {
                tracing::warn!(
                    plugin = %descriptor.id,
                    dir = %dir.display(),
                    "Skipping plugin with duplicate id"
                );
                continue;
            }

            if descriptor.default {
                if let Some(existing) = set.default_plugin() {
                    tracing::warn!(
                        plugin = %descriptor.id,
                        default = %existing.id,
                        "Multiple plugins claim default; keeping the first"
                    );
                } else {
                    set.default_index = Some(set.plugins.len());
                }
            }
            set.plugins.push(descriptor);
        }

        if set.default_index.is_none() && !set.plugins.is_empty() {
            set.default_index = Some(0);
        }

        tracing::debug!(root = %self.root.display(), count = set.len(), "Discovered plugins");
        set
    }

    pub fn resolve(&self, requested: Option<&str>) -> Result<PluginDescriptor, PluginError> {
        self.discover().resolve(requested).cloned()
    }
}
