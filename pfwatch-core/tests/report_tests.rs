use chrono::{TimeZone, Utc};
use pfwatch_core::services::ledger::FilteredListingEntry;
use pfwatch_core::services::report::{matches_search, render};
use rules::{RegexBudget, Rule, DEFAULT_REPORT_TEMPLATE};
use uuid::Uuid;

fn entry() -> FilteredListingEntry {
    FilteredListingEntry {
        listing_id: 42,
        name: "Wol Light".to_string(),
        world: "Ultros".to_string(),
        description: "Grand Dice 100k buy-in".to_string(),
        matched_rule_id: Uuid::new_v4(),
        matched_rule_pattern: "Grand Dice".to_string(),
        matched_value: "grand dice".to_string(),
        seen_at: Utc.with_ymd_and_hms(2026, 1, 2, 3, 4, 5).unwrap(),
    }
}

#[test]
fn test_default_template_renders() {
    let out = render(DEFAULT_REPORT_TEMPLATE, &entry());
    assert_eq!(out, "Name: Wol Light\nWorld: Ultros\n\n\"Grand Dice 100k buy-in\"\n");
}

#[test]
fn test_placeholders_are_case_insensitive() {
    let out = render("{NAME} / {World} / {time}", &entry());
    assert_eq!(out, "Wol Light / Ultros / 2026-01-02 03:04:05");
}

#[test]
fn test_unknown_placeholders_are_kept() {
    let out = render("{name} {zone}", &entry());
    assert_eq!(out, "Wol Light {zone}");
}

#[test]
fn test_rule_and_matched_placeholders() {
    let out = render("{rule} -> {matched}", &entry());
    assert_eq!(out, "Grand Dice -> grand dice");
}

#[test]
fn test_search_covers_name_world_rule_and_description() {
    let e = entry();
    assert!(matches_search(&e, ""));
    assert!(matches_search(&e, "wol"));
    assert!(matches_search(&e, "ULTROS"));
    assert!(matches_search(&e, "grand"));
    assert!(matches_search(&e, "buy-in"));
    assert!(!matches_search(&e, "cactpot"));
}

#[test]
fn test_match_test_description() {
    let rules = vec![Rule::literal("cactpot")];
    let (m, line) = pfwatch_core::services::report::describe_match_test(
        "Mini CACTPOT tips",
        &rules,
        &RegexBudget::default(),
    );
    assert!(m.is_some());
    assert_eq!(line, "Matched: cactpot | Value: cactpot");
}
