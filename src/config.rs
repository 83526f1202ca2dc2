//! Engine configuration.
//!
//! Values come from, lowest priority first: built-in defaults, a TOML file,
//! `DRAUGHTS_*` environment variables, and finally the command line.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::Deserialize;
use tracing::{debug, info, warn};

use crate::error::{EngineError, EngineResult};
use crate::evaluation::{EvalWeights, Evaluator};
use crate::movegen::{MoveGenerator, Rules};
use crate::search::{Search, DEFAULT_DEPTH};

/// Environment variable naming an explicit config file.
pub const CONFIG_ENV: &str = "DRAUGHTS_CONFIG";

/// File looked up in the working directory when nothing else is given.
pub const DEFAULT_CONFIG_FILE: &str = "draughts.toml";

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct SearchConfig {
    pub depth: u32,
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            depth: DEFAULT_DEPTH,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    pub log_level: String,
    pub search: SearchConfig,
    pub evaluation: EvalWeights,
    pub rules: Rules,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            search: SearchConfig::default(),
            evaluation: EvalWeights::default(),
            rules: Rules::default(),
        }
    }
}

impl EngineConfig {
    pub fn from_toml_str(content: &str) -> EngineResult<Self> {
        toml::from_str(content).map_err(|e| EngineError::InvalidConfig(e.to_string()))
    }

    pub fn validate(&self) -> EngineResult<()> {
        if self.search.depth == 0 {
            return Err(EngineError::InvalidConfig(
                "search.depth must be at least 1".to_string(),
            ));
        }
        self.evaluation.validate()
    }

    pub fn move_generator(&self) -> MoveGenerator {
        MoveGenerator::with_rules(self.rules)
    }

    /// A search wired with these weights, rules and depth.
    pub fn build_search(&self) -> EngineResult<Search> {
        let generator = self.move_generator();
        let evaluator = Evaluator::with_weights(self.evaluation.clone(), generator.clone())?;
        let mut search = Search::with_evaluator(evaluator, generator);
        search.set_max_depth(self.search.depth);
        Ok(search)
    }
}

/// Loads the configuration.
///
/// Looks at `explicit` first, then `DRAUGHTS_CONFIG`, then `draughts.toml`
/// in the working directory; falls back to defaults. Environment overrides
/// are applied on top and the result is validated.
pub fn load_config(explicit: Option<&Path>) -> Result<EngineConfig> {
    let path = match explicit {
        Some(path) => Some(path.to_path_buf()),
        None => discover_config_path(),
    };

    let config = match path {
        Some(path) => {
            info!("Loading config from {}", path.display());
            load_from_path(&path)?
        }
        None => {
            debug!("No config file found, using built-in defaults");
            EngineConfig::default()
        }
    };

    let config = apply_env_overrides(config, |key| std::env::var(key).ok());
    config.validate()?;
    Ok(config)
}

fn discover_config_path() -> Option<PathBuf> {
    if let Ok(path) = std::env::var(CONFIG_ENV) {
        let path = PathBuf::from(&path);
        if path.exists() {
            return Some(path);
        }
        warn!(
            "{}={} not found, searching defaults",
            CONFIG_ENV,
            path.display()
        );
    }

    let path = PathBuf::from(DEFAULT_CONFIG_FILE);
    path.exists().then_some(path)
}

pub fn load_from_path(path: &Path) -> Result<EngineConfig> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read {}", path.display()))?;
    let config = EngineConfig::from_toml_str(&content)
        .with_context(|| format!("failed to parse {}", path.display()))?;
    Ok(config)
}

/// Applies `DRAUGHTS_SEARCH_DEPTH` and `DRAUGHTS_LOG_LEVEL` as seen through `lookup`.
pub fn apply_env_overrides<F>(mut config: EngineConfig, lookup: F) -> EngineConfig
where
    F: Fn(&str) -> Option<String>,
{
    if let Some(value) = lookup("DRAUGHTS_SEARCH_DEPTH") {
        match value.parse() {
            Ok(depth) => config.search.depth = depth,
            Err(_) => warn!("Ignoring DRAUGHTS_SEARCH_DEPTH={}: not a depth", value),
        }
    }
    if let Some(value) = lookup("DRAUGHTS_LOG_LEVEL") {
        config.log_level = value;
    }
    config
}

/// Log filter to run with while the config file is still being read:
/// `--log-level`, then `DRAUGHTS_LOG_LEVEL`, then the default.
pub fn bootstrap_log_level<F>(cli: Option<&str>, lookup: F) -> String
where
    F: Fn(&str) -> Option<String>,
{
    cli.map(str::to_string)
        .or_else(|| lookup("DRAUGHTS_LOG_LEVEL"))
        .unwrap_or_else(|| EngineConfig::default().log_level)
}
