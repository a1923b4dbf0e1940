use crate::discovery::StaticDiscoverer;
use crate::overlay::Node;
use figment::{Figment, providers::{Env, Format, Yaml}};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::Path;

/// Top-level seed configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SeedConfig {
    #[serde(default)]
    pub log: LogConfig,
    #[serde(default)]
    pub sync: SyncConfig,
    #[serde(default)]
    pub discovery: DiscoveryConfig,
}

/// Logging settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LogConfig {
    /// Default filter when `RUST_LOG` is not set.
    #[serde(default = "default_log_level")]
    pub level: String,
    /// Emit JSON lines instead of human-readable output.
    #[serde(default)]
    pub json: bool,
}

/// Sync behaviour.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SyncConfig {
    /// Leave entities whose raw input already pinned upstream nodes alone.
    #[serde(default)]
    pub respect_pinned_nodes: bool,
    /// Abort on the first failed entity instead of logging and moving on.
    #[serde(default)]
    pub fail_fast: bool,
}

/// Static discovery table: discovery type → service name → nodes.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct DiscoveryConfig {
    pub services: HashMap<String, HashMap<String, Vec<Node>>>,
}

// ── Defaults ──────────────────────────────────────────────────

fn default_log_level() -> String { "info".into() }

// ── Impls ─────────────────────────────────────────────────────

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            json: false,
        }
    }
}

impl DiscoveryConfig {
    pub fn discoverer(&self) -> StaticDiscoverer {
        StaticDiscoverer::new(self.services.clone())
    }
}

impl SeedConfig {
    /// Load configuration from YAML file + env overrides.
    ///
    /// Env keys use `__` as the nesting separator, e.g. `SEED_SYNC__FAIL_FAST=true`.
    pub fn load(path: &Path) -> anyhow::Result<Self> {
        let config: SeedConfig = Figment::new()
            .merge(Yaml::file(path))
            .merge(Env::prefixed("SEED_").split("__"))
            .extract()?;
        Ok(config)
    }
}
