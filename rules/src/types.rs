use serde::{Deserialize, Serialize};
use uuid::Uuid;

pub type RuleId = Uuid;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RuleMode {
    /// Normalized (then compacted) case-insensitive substring search.
    #[default]
    #[serde(alias = "contains", alias = "Contains", alias = "Literal")]
    Literal,
    /// Case-insensitive regular expression against the raw text.
    #[serde(alias = "Regex")]
    Regex,
}

impl RuleMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            RuleMode::Literal => "literal",
            RuleMode::Regex => "regex",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Rule {
    // Missing ids load as nil and are reassigned by migration.
    #[serde(default)]
    pub id: RuleId,
    #[serde(default)]
    pub pattern: String,
    #[serde(default)]
    pub mode: RuleMode,
    #[serde(default = "default_enabled")]
    pub enabled: bool,
}

fn default_enabled() -> bool {
    true
}

impl Rule {
    /// New enabled rule with a fresh id.
    pub fn new(pattern: impl Into<String>, mode: RuleMode) -> Self {
        Self {
            id: Uuid::new_v4(),
            pattern: pattern.into(),
            mode,
            enabled: true,
        }
    }

    pub fn literal(pattern: impl Into<String>) -> Self {
        Self::new(pattern, RuleMode::Literal)
    }

    pub fn regex(pattern: impl Into<String>) -> Self {
        Self::new(pattern, RuleMode::Regex)
    }

    pub fn disabled(mut self) -> Self {
        self.enabled = false;
        self
    }
}

/// What matched, and by which rule.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MatchResult {
    pub rule_id: RuleId,
    pub rule_pattern: String,
    /// The normalized or compacted pattern for literal rules; the matched span for regex rules.
    pub matched_value: String,
}
