//! First-match evaluation of listing text against an ordered rule list.
//!
//! Literal rules run against the normalized text, falling back to the compacted view.
//! Regex rules run against the raw text under a [`RegexBudget`]; any compile error,
//! runtime abort or overrun only disqualifies that rule.

use std::time::{Duration, Instant};

use fancy_regex::{Regex, RegexBuilder};
use thiserror::Error;

use crate::normalize::{compact, normalize};
use crate::types::{MatchResult, Rule, RuleMode};

pub const REGEX_TIMEOUT: Duration = Duration::from_millis(75);
pub const REGEX_BACKTRACK_LIMIT: usize = 200_000;
/// Listing descriptions are a few hundred bytes at most.
pub const REGEX_MAX_INPUT_BYTES: usize = 4096;

/// Evaluation bound for a single regex rule.
///
/// A search cannot be interrupted, so the wall-clock bound comes from bounding the work
/// up front: inputs over `max_input_bytes` are refused before searching, and the
/// backtrack limit caps the backtracking engine (patterns without backreferences or
/// lookaround run on a linear-time engine). `timeout` is measured after the search
/// returns; an overrun disqualifies the rule but does not cut the search short.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RegexBudget {
    pub timeout: Duration,
    pub backtrack_limit: usize,
    pub max_input_bytes: usize,
}

impl Default for RegexBudget {
    fn default() -> Self {
        Self {
            timeout: REGEX_TIMEOUT,
            backtrack_limit: REGEX_BACKTRACK_LIMIT,
            max_input_bytes: REGEX_MAX_INPUT_BYTES,
        }
    }
}

/// Why a regex rule contributed nothing.
#[derive(Debug, Error)]
pub enum RegexSkip {
    #[error("pattern failed to compile: {0}")]
    Compile(String),
    #[error("evaluation aborted: {0}")]
    Runtime(String),
    #[error("evaluation took {elapsed_ms} ms (budget {budget_ms} ms)")]
    Timeout { elapsed_ms: u128, budget_ms: u128 },
    #[error("input is {len} bytes (limit {limit})")]
    Oversized { len: usize, limit: usize },
}

/// Precomputed views of the text being screened.
struct Subject<'a> {
    raw: &'a str,
    folded: String,
    compact: String,
}

impl<'a> Subject<'a> {
    fn new(raw: &'a str) -> Self {
        let normalized = normalize(raw);
        Self {
            raw,
            folded: normalized.to_lowercase(),
            compact: compact(&normalized),
        }
    }
}

/// Return the first enabled rule (in order) that matches `text`.
pub fn find_match(text: &str, rules: &[Rule]) -> Option<MatchResult> {
    find_match_with(text, rules, &RegexBudget::default())
}

/// [`find_match`] with an explicit regex budget.
pub fn find_match_with(text: &str, rules: &[Rule], budget: &RegexBudget) -> Option<MatchResult> {
    if rules.is_empty() || text.trim().is_empty() {
        return None;
    }
    let subject = Subject::new(text);

    for rule in rules.iter().filter(|r| r.enabled) {
        let hit = match rule.mode {
            RuleMode::Literal => literal_match(rule, &subject),
            RuleMode::Regex => match regex_match(&rule.pattern, subject.raw, budget) {
                Ok(found) => found,
                Err(skip) => {
                    tracing::debug!(rule_id = %rule.id, pattern = %rule.pattern, "regex rule skipped: {skip}");
                    None
                }
            },
        };
        if let Some(matched_value) = hit {
            return Some(MatchResult {
                rule_id: rule.id,
                rule_pattern: rule.pattern.clone(),
                matched_value,
            });
        }
    }
    None
}

fn literal_match(rule: &Rule, subject: &Subject<'_>) -> Option<String> {
    let normalized = normalize(&rule.pattern);
    let pattern = normalized.trim();
    if pattern.is_empty() {
        return None;
    }

    if subject.folded.contains(&pattern.to_lowercase()) {
        return Some(pattern.to_string());
    }

    let compacted = compact(pattern);
    if !compacted.is_empty() && subject.compact.contains(&compacted) {
        return Some(compacted);
    }
    None
}

/// Compile `pattern` case-insensitively under the given budget.
pub fn compile_regex(pattern: &str, budget: &RegexBudget) -> Result<Regex, RegexSkip> {
    RegexBuilder::new(&format!("(?i){pattern}"))
        .backtrack_limit(budget.backtrack_limit)
        .build()
        .map_err(|e| RegexSkip::Compile(e.to_string()))
}

/// Search `text` with a user regex. `Ok(None)` is a clean miss.
pub fn regex_match(pattern: &str, text: &str, budget: &RegexBudget) -> Result<Option<String>, RegexSkip> {
    if text.len() > budget.max_input_bytes {
        return Err(RegexSkip::Oversized {
            len: text.len(),
            limit: budget.max_input_bytes,
        });
    }
    let regex = compile_regex(pattern, budget)?;

    let started = Instant::now();
    let found = regex
        .find(text)
        .map_err(|e| RegexSkip::Runtime(e.to_string()))?;
    let elapsed = started.elapsed();
    if elapsed > budget.timeout {
        return Err(RegexSkip::Timeout {
            elapsed_ms: elapsed.as_millis(),
            budget_ms: budget.timeout.as_millis(),
        });
    }

    Ok(found.map(|m| m.as_str().to_string()))
}
