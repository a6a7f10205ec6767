//! services/report.rs
//! Report text rendering and ledger search.

use rules::{find_match_with, MatchResult, RegexBudget, Rule};

use crate::services::ledger::FilteredListingEntry;

/// Placeholders understood by [`render`], matched case-insensitively.
pub const PLACEHOLDERS: [&str; 6] = ["{name}", "{world}", "{rule}", "{matched}", "{description}", "{time}"];

/// Fill a report template from a ledger entry. Unknown `{...}` tokens are kept verbatim.
pub fn render(template: &str, entry: &FilteredListingEntry) -> String {
    let time = entry.seen_at.format("%Y-%m-%d %H:%M:%S").to_string();
    let values = [
        entry.name.as_str(),
        entry.world.as_str(),
        entry.matched_rule_pattern.as_str(),
        entry.matched_value.as_str(),
        entry.description.as_str(),
        time.as_str(),
    ];

    let mut out = template.to_string();
    for (placeholder, value) in PLACEHOLDERS.iter().zip(values) {
        out = replace_ci(&out, placeholder, value);
    }
    out
}

/// Replace every ASCII-case-insensitive occurrence of `needle`.
fn replace_ci(haystack: &str, needle: &str, with: &str) -> String {
    let hay_lower = haystack.to_ascii_lowercase();
    let needle_lower = needle.to_ascii_lowercase();
    let mut out = String::with_capacity(haystack.len());
    let mut cursor = 0usize;
    while let Some(pos) = hay_lower[cursor..].find(&needle_lower) {
        let start = cursor + pos;
        out.push_str(&haystack[cursor..start]);
        out.push_str(with);
        cursor = start + needle.len();
    }
    out.push_str(&haystack[cursor..]);
    out
}

/// Case-insensitive filter over name, world, rule pattern and description.
pub fn matches_search(entry: &FilteredListingEntry, query: &str) -> bool {
    let q = query.trim();
    if q.is_empty() {
        return true;
    }
    let q = q.to_lowercase();
    [
        &entry.name,
        &entry.world,
        &entry.matched_rule_pattern,
        &entry.description,
    ]
    .iter()
    .any(|field| field.to_lowercase().contains(&q))
}

/// Run an ad-hoc match test and describe the result the way the rules editor shows it.
pub fn describe_match_test(text: &str, rules: &[Rule], budget: &RegexBudget) -> (Option<MatchResult>, String) {
    match find_match_with(text, rules, budget) {
        Some(m) => {
            let line = format!("Matched: {} | Value: {}", m.rule_pattern, m.matched_value);
            (Some(m), line)
        }
        None => (None, "No match.".to_string()),
    }
}
