use std::fs;
use std::time::Duration;

use pfwatch_core::services::{Listing, ListingLedger, NullSink};
use pfwatch_core::utils::duration::{format_duration, parse_disable_duration};
use pfwatch_core::utils::logbook::export_entries;
use pfwatch_core::utils::state::{load_state, save_state};
use pfwatch_core::CoreConfig;
use rules::{Rule, RuleStore, CURRENT_VERSION};
use tempfile::tempdir;

#[test]
fn test_parse_disable_duration_forms() {
    assert_eq!(parse_disable_duration("300"), Some(Duration::from_secs(300)));
    assert_eq!(parse_disable_duration("5m"), Some(Duration::from_secs(300)));
    assert_eq!(parse_disable_duration("5 minutes"), Some(Duration::from_secs(300)));
    assert_eq!(parse_disable_duration(" 2H "), Some(Duration::from_secs(7200)));
    assert_eq!(parse_disable_duration("1 day"), Some(Duration::from_secs(86_400)));
    assert_eq!(parse_disable_duration("45sec"), Some(Duration::from_secs(45)));
}

#[test]
fn test_parse_disable_duration_rejects_garbage() {
    assert_eq!(parse_disable_duration(""), None);
    assert_eq!(parse_disable_duration("soon"), None);
    assert_eq!(parse_disable_duration("5 fortnights"), None);
    assert_eq!(parse_disable_duration("m5"), None);
    assert_eq!(parse_disable_duration("18446744073709551615d"), None);
}

#[test]
fn test_parse_disable_duration_rejects_zero() {
    assert_eq!(parse_disable_duration("0"), None);
    assert_eq!(parse_disable_duration("0m"), None);
    assert_eq!(parse_disable_duration("0 hours"), None);
    assert_eq!(parse_disable_duration("1s"), Some(Duration::from_secs(1)));
}

#[test]
fn test_format_duration_picks_largest_unit() {
    assert_eq!(format_duration(Duration::from_secs(30)), "30s");
    assert_eq!(format_duration(Duration::from_secs(300)), "5m");
    assert_eq!(format_duration(Duration::from_secs(7200)), "2h");
    assert_eq!(format_duration(Duration::from_secs(172_800)), "2d");
}

#[test]
fn test_config_defaults_without_file() {
    let dir = tempdir().unwrap();
    let cfg = CoreConfig::load(dir.path()).unwrap();
    assert_eq!(cfg.system.name, "pfwatch");
    assert_eq!(cfg.matcher.regex_timeout_ms, 75);
    assert_eq!(cfg.ledger.capacity, 500);
    assert_eq!(cfg.ledger.notification_budget, 4);
    assert_eq!(cfg.state.path, dir.path().join("rules.json"));
    assert_eq!(cfg.logbook.path, dir.path().join("logbook/reports.jsonl"));
}

#[test]
fn test_config_file_overrides_and_partial_sections() {
    let dir = tempdir().unwrap();
    fs::write(
        dir.path().join("config.toml"),
        "[ledger]\ncapacity = 10\n\n[matcher]\nregex_timeout_ms = 20\n",
    )
    .unwrap();
    let cfg = CoreConfig::load(dir.path()).unwrap();
    assert_eq!(cfg.ledger.capacity, 10);
    assert_eq!(cfg.ledger.notification_budget, 4);
    assert_eq!(cfg.matcher.budget().timeout, Duration::from_millis(20));
    assert_eq!(cfg.matcher.regex_backtrack_limit, 200_000);
    assert_eq!(cfg.matcher.budget().max_input_bytes, 4096);
}

#[test]
fn test_config_parse_error_is_reported() {
    let dir = tempdir().unwrap();
    fs::write(dir.path().join("config.toml"), "[ledger\ncapacity = ").unwrap();
    let err = CoreConfig::load(dir.path()).unwrap_err();
    assert!(format!("{err:#}").contains("parsing config file"));
}

#[test]
fn test_state_missing_file_is_fresh() {
    let dir = tempdir().unwrap();
    let state = load_state(&dir.path().join("rules.json")).unwrap();
    assert_eq!(state.version, 0);
    assert!(state.rules.is_empty());
}

#[test]
fn test_state_save_then_load_keeps_rules() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("nested/rules.json");

    let mut store = RuleStore::new();
    let id = store.upsert(Rule::regex(r"mgp\s+farm")).unwrap();
    save_state(&path, store.state()).unwrap();
    assert!(!path.with_extension("tmp").exists());

    let reloaded = RuleStore::from_state(load_state(&path).unwrap());
    assert_eq!(reloaded.version(), CURRENT_VERSION);
    assert_eq!(reloaded.get(id).map(|r| r.pattern), Some(r"mgp\s+farm".to_string()));
    assert_eq!(reloaded.len(), store.len());
}

#[test]
fn test_export_appends_jsonl() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("logbook/reports.jsonl");
    let mut ledger = ListingLedger::default();
    let m = rules::find_match("grand dice", &RuleStore::new().get_enabled_rules()).unwrap();
    for id in 0..2u64 {
        let listing = Listing {
            id,
            name: "p".into(),
            world: "w".into(),
            description: format!("grand dice {id}"),
        };
        ledger.record(&listing, &m, &mut NullSink);
    }

    assert_eq!(export_entries(&path, ledger.entries(), "2026-01-01T00:00:00Z").unwrap(), 2);
    assert_eq!(export_entries(&path, ledger.entries(), "2026-01-02T00:00:00Z").unwrap(), 2);

    let text = fs::read_to_string(&path).unwrap();
    let lines: Vec<&str> = text.lines().collect();
    assert_eq!(lines.len(), 4);
    let first: serde_json::Value = serde_json::from_str(lines[0]).unwrap();
    assert_eq!(first["exported_at"], "2026-01-01T00:00:00Z");
    assert_eq!(first["listing_id"], 0);
    assert_eq!(first["matched_rule_pattern"], "Grand Dice");
}
