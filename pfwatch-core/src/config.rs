use anyhow::{Context, Result};
use serde::Deserialize;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use rules::RegexBudget;

#[derive(Debug, Clone, Default, Deserialize)]
pub struct CoreConfig {
    #[serde(default)]
    pub system: SystemConfig,
    #[serde(default)]
    pub matcher: MatcherConfig,
    #[serde(default)]
    pub ledger: LedgerConfig,
    #[serde(default)]
    pub state: StateConfig,
    #[serde(default)]
    pub logbook: LogbookConfig,
}

impl CoreConfig {
    pub fn load(root: &Path) -> Result<Self> {
        let path = root.join("config.toml");
        let mut cfg = if path.exists() {
            let text = fs::read_to_string(&path)
                .with_context(|| format!("reading config file {}", path.display()))?;
            toml::from_str::<CoreConfig>(&text)
                .with_context(|| format!("parsing config file {}", path.display()))?
        } else {
            tracing::info!(
                "No config file found at {}. Using CoreConfig::default().",
                path.display()
            );
            CoreConfig::default()
        };
        cfg.resolve_paths(root);
        Ok(cfg)
    }

    fn resolve_paths(&mut self, root: &Path) {
        self.state.path = absolutize(root, &self.state.path);
        self.logbook.path = absolutize(root, &self.logbook.path);
    }
}

/// Resolve the pfwatch root. Allow override via PFWATCH_ROOT (tests/venvs).
pub fn default_root() -> PathBuf {
    std::env::var_os("PFWATCH_ROOT")
        .map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from(".pfwatch"))
}

#[derive(Debug, Clone, Deserialize)]
pub struct SystemConfig {
    #[serde(default = "SystemConfig::default_name")]
    pub name: String,
}

impl SystemConfig {
    fn default_name() -> String {
        "pfwatch".to_string()
    }
}

impl Default for SystemConfig {
    fn default() -> Self {
        Self {
            name: Self::default_name(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct MatcherConfig {
    #[serde(default = "MatcherConfig::default_regex_timeout_ms")]
    pub regex_timeout_ms: u64,
    #[serde(default = "MatcherConfig::default_regex_backtrack_limit")]
    pub regex_backtrack_limit: usize,
    #[serde(default = "MatcherConfig::default_regex_max_input_bytes")]
    pub regex_max_input_bytes: usize,
}

impl MatcherConfig {
    fn default_regex_timeout_ms() -> u64 {
        75
    }

    fn default_regex_backtrack_limit() -> usize {
        200_000
    }

    fn default_regex_max_input_bytes() -> usize {
        4096
    }

    pub fn budget(&self) -> RegexBudget {
        RegexBudget {
            timeout: Duration::from_millis(self.regex_timeout_ms),
            backtrack_limit: self.regex_backtrack_limit,
            max_input_bytes: self.regex_max_input_bytes,
        }
    }
}

impl Default for MatcherConfig {
    fn default() -> Self {
        Self {
            regex_timeout_ms: Self::default_regex_timeout_ms(),
            regex_backtrack_limit: Self::default_regex_backtrack_limit(),
            regex_max_input_bytes: Self::default_regex_max_input_bytes(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct LedgerConfig {
    #[serde(default = "LedgerConfig::default_capacity")]
    pub capacity: usize,
    #[serde(default = "LedgerConfig::default_notification_budget")]
    pub notification_budget: usize,
}

impl LedgerConfig {
    fn default_capacity() -> usize {
        500
    }

    fn default_notification_budget() -> usize {
        4
    }
}

impl Default for LedgerConfig {
    fn default() -> Self {
        Self {
            capacity: Self::default_capacity(),
            notification_budget: Self::default_notification_budget(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct StateConfig {
    #[serde(default = "StateConfig::default_path")]
    pub path: PathBuf,
}

impl StateConfig {
    fn default_path() -> PathBuf {
        PathBuf::from("rules.json")
    }
}

impl Default for StateConfig {
    fn default() -> Self {
        Self {
            path: Self::default_path(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct LogbookConfig {
    #[serde(default = "LogbookConfig::default_path")]
    pub path: PathBuf,
}

impl LogbookConfig {
    fn default_path() -> PathBuf {
        PathBuf::from("logbook/reports.jsonl")
    }
}

impl Default for LogbookConfig {
    fn default() -> Self {
        Self {
            path: Self::default_path(),
        }
    }
}

fn absolutize(root: &Path, value: &Path) -> PathBuf {
    if value.is_absolute() {
        value.to_path_buf()
    } else {
        root.join(value)
    }
}
