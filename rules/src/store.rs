//! Rule collection owner: CRUD, schema migration and deduplication.
//!
//! Every structural change goes through [`RuleStore::migrate_and_normalize`], which is
//! idempotent and never fails: malformed rules are dropped, not reported.

use std::collections::HashSet;

use serde::de::{Deserializer, IgnoredAny};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::normalize::literal_key;
use crate::types::{Rule, RuleId, RuleMode};

/// Schema version stamped by migration.
pub const CURRENT_VERSION: u32 = 5;

/// Built-in literal rules seeded on first run and backfilled for pre-5 states.
pub const DEFAULT_PATTERNS: [&str; 2] = ["Grand Dice", "granddice"];

pub const DEFAULT_REPORT_TEMPLATE: &str = "Name: {name}\nWorld: {world}\n\n\"{description}\"\n";

/// Persisted rule-set blob. Loading is lenient: bad entries are dropped one by one.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RuleSetState {
    #[serde(default)]
    pub version: u32,
    /// Flat list of literal patterns kept for readers of the pre-rules format.
    #[serde(default, deserialize_with = "lenient_vec")]
    pub legacy_terms: Vec<String>,
    #[serde(default, deserialize_with = "lenient_vec")]
    pub rules: Vec<Rule>,
    #[serde(default = "default_template")]
    pub report_template: String,
}

fn default_template() -> String {
    DEFAULT_REPORT_TEMPLATE.to_string()
}

impl Default for RuleSetState {
    fn default() -> Self {
        Self {
            version: 0,
            legacy_terms: Vec::new(),
            rules: Vec::new(),
            report_template: default_template(),
        }
    }
}

#[derive(Deserialize)]
#[serde(untagged)]
enum Lenient<T> {
    Value(T),
    Malformed(IgnoredAny),
}

fn lenient_vec<'de, D, T>(deserializer: D) -> Result<Vec<T>, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de>,
{
    let items = Option::<Vec<Lenient<T>>>::deserialize(deserializer)?.unwrap_or_default();
    Ok(items
        .into_iter()
        .filter_map(|item| match item {
            Lenient::Value(v) => Some(v),
            Lenient::Malformed(_) => None,
        })
        .collect())
}

#[derive(Debug, Clone)]
pub struct RuleStore {
    state: RuleSetState,
}

impl Default for RuleStore {
    fn default() -> Self {
        Self::new()
    }
}

impl RuleStore {
    /// Fresh store with the first-run defaults.
    pub fn new() -> Self {
        Self::from_state(RuleSetState::default())
    }

    /// Adopt a loaded state and bring it to the current schema.
    pub fn from_state(state: RuleSetState) -> Self {
        let mut store = Self { state };
        store.migrate_and_normalize();
        store
    }

    pub fn state(&self) -> &RuleSetState {
        &self.state
    }

    pub fn into_state(self) -> RuleSetState {
        self.state
    }

    pub fn version(&self) -> u32 {
        self.state.version
    }

    pub fn len(&self) -> usize {
        self.state.rules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.state.rules.is_empty()
    }

    pub fn get(&self, id: RuleId) -> Option<Rule> {
        self.state.rules.iter().find(|r| r.id == id).cloned()
    }

    /// Copies of every rule, in stored order.
    pub fn all_rules(&self) -> Vec<Rule> {
        self.state.rules.clone()
    }

    /// Copies of the enabled rules, in stored order.
    pub fn get_enabled_rules(&self) -> Vec<Rule> {
        self.state.rules.iter().filter(|r| r.enabled).cloned().collect()
    }

    /// Insert or replace by id. Blank patterns are ignored; a nil id gets a fresh one.
    /// Returns the id the rule is stored under, or `None` if nothing was stored.
    pub fn upsert(&mut self, rule: Rule) -> Option<RuleId> {
        let pattern = rule.pattern.trim();
        if pattern.is_empty() {
            return None;
        }
        let id = if rule.id.is_nil() { Uuid::new_v4() } else { rule.id };
        let sanitized = Rule {
            id,
            pattern: pattern.to_string(),
            mode: rule.mode,
            enabled: rule.enabled,
        };

        match self.state.rules.iter_mut().find(|r| r.id == id) {
            Some(slot) => *slot = sanitized,
            None => self.state.rules.push(sanitized),
        }
        self.migrate_and_normalize();

        // Dedup may have folded the rule into an earlier equivalent.
        self.state.rules.iter().any(|r| r.id == id).then_some(id)
    }

    /// Remove by id. Returns whether a rule was removed.
    pub fn delete(&mut self, id: RuleId) -> bool {
        let before = self.state.rules.len();
        self.state.rules.retain(|r| r.id != id);
        let removed = self.state.rules.len() != before;
        if removed {
            // Refresh the projection first so the deleted pattern is not re-imported.
            self.project_legacy_terms();
        }
        self.migrate_and_normalize();
        removed
    }

    /// Toggle a rule. Returns `false` if no rule has this id.
    pub fn set_enabled(&mut self, id: RuleId, enabled: bool) -> bool {
        let Some(rule) = self.state.rules.iter_mut().find(|r| r.id == id) else {
            return false;
        };
        rule.enabled = enabled;
        self.migrate_and_normalize();
        true
    }

    pub fn report_template(&self) -> &str {
        &self.state.report_template
    }

    /// Store a new report template; blank input restores the default.
    pub fn set_report_template(&mut self, template: &str) {
        self.state.report_template = if template.trim().is_empty() {
            default_template()
        } else {
            template.to_string()
        };
    }

    /// Bring the rule set to the current schema and repair it. Idempotent.
    pub fn migrate_and_normalize(&mut self) {
        let loaded_version = self.state.version;

        // blank rules must not hide an otherwise empty list from import and seeding
        self.state.rules.retain(|r| !r.pattern.trim().is_empty());

        if self.state.rules.is_empty() {
            let imported: Vec<Rule> = self
                .state
                .legacy_terms
                .iter()
                .map(|t| t.trim())
                .filter(|t| !t.is_empty())
                .map(Rule::literal)
                .collect();
            if !imported.is_empty() {
                tracing::info!(count = imported.len(), "imported legacy terms as literal rules");
            }
            self.state.rules = imported;
        }

        if self.state.rules.is_empty() {
            self.state.rules = DEFAULT_PATTERNS.iter().map(|p| Rule::literal(*p)).collect();
        } else if loaded_version < CURRENT_VERSION {
            for pattern in DEFAULT_PATTERNS {
                self.ensure_literal_rule(pattern);
            }
        }

        let mut seen_literal: HashSet<String> = HashSet::new();
        let mut seen_regex: HashSet<String> = HashSet::new();
        let mut cleaned = Vec::with_capacity(self.state.rules.len());

        for mut rule in std::mem::take(&mut self.state.rules) {
            let pattern = rule.pattern.trim();
            if pattern.is_empty() {
                continue;
            }
            rule.pattern = pattern.to_string();
            if rule.id.is_nil() {
                rule.id = Uuid::new_v4();
            }

            let fresh = match rule.mode {
                RuleMode::Literal => match literal_key(&rule.pattern) {
                    Some(key) => seen_literal.insert(key),
                    None => false,
                },
                RuleMode::Regex => seen_regex.insert(rule.pattern.clone()),
            };
            if fresh {
                cleaned.push(rule);
            }
        }

        self.state.rules = cleaned;
        self.project_legacy_terms();

        if self.state.report_template.trim().is_empty() {
            self.state.report_template = default_template();
        }
        self.state.version = CURRENT_VERSION;
    }

    fn ensure_literal_rule(&mut self, pattern: &str) {
        let Some(target) = literal_key(pattern) else {
            return;
        };
        let present = self
            .state
            .rules
            .iter()
            .filter(|r| r.mode == RuleMode::Literal)
            .any(|r| literal_key(&r.pattern).as_deref() == Some(target.as_str()));
        if !present {
            self.state.rules.push(Rule::literal(pattern));
        }
    }

    fn project_legacy_terms(&mut self) {
        self.state.legacy_terms = self
            .state
            .rules
            .iter()
            .filter(|r| r.mode == RuleMode::Literal)
            .map(|r| r.pattern.clone())
            .collect();
    }
}
