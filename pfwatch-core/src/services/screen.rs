//! services/screen.rs
//! The screening pipeline: clock gate -> matcher -> ledger.
//!
//! `Screen` owns the rule store plus a snapshot of its enabled rules. The snapshot is
//! refreshed after every rule mutation so matching never sees a half-migrated set.

use chrono::{DateTime, Utc};
use rules::{find_match_with, MatchResult, RegexBudget, Rule, RuleId, RuleSetState, RuleStore};

use crate::config::CoreConfig;
use crate::services::clock::{ReportingClock, SessionSignal, Tick};
use crate::services::ledger::{Listing, ListingLedger, NotificationSink};
use crate::services::report;

pub struct Screen {
    store: RuleStore,
    enabled_rules: Vec<Rule>,
    ledger: ListingLedger,
    clock: ReportingClock,
    budget: RegexBudget,
}

impl Screen {
    pub fn new(store: RuleStore, ledger: ListingLedger, budget: RegexBudget) -> Self {
        let mut screen = Self {
            store,
            enabled_rules: Vec::new(),
            ledger,
            clock: ReportingClock::new(),
            budget,
        };
        screen.reload_rules();
        screen
    }

    /// Build from a loaded rule-set state using the configured limits.
    pub fn from_config(cfg: &CoreConfig, state: RuleSetState) -> Self {
        Self::new(
            RuleStore::from_state(state),
            ListingLedger::new(cfg.ledger.capacity, cfg.ledger.notification_budget),
            cfg.matcher.budget(),
        )
    }

    /// Re-run migration and refresh the enabled snapshot.
    pub fn reload_rules(&mut self) {
        self.store.migrate_and_normalize();
        self.enabled_rules = self.store.get_enabled_rules();
        tracing::info!(
            total = self.store.len(),
            enabled = self.enabled_rules.len(),
            "rules reloaded"
        );
    }

    /// Screen one listing. Returns the match only when the ledger stored a new entry.
    pub fn process(
        &mut self,
        listing: &Listing,
        session: &dyn SessionSignal,
        sink: &mut dyn NotificationSink,
    ) -> Option<MatchResult> {
        self.process_at(Utc::now(), listing, session, sink)
    }

    /// [`Screen::process`] with an explicit poll time.
    pub fn process_at(
        &mut self,
        now: DateTime<Utc>,
        listing: &Listing,
        session: &dyn SessionSignal,
        sink: &mut dyn NotificationSink,
    ) -> Option<MatchResult> {
        if let Tick::Suspended = self.clock.poll_at(now, session) {
            return None;
        }
        let matched = find_match_with(&listing.description, &self.enabled_rules, &self.budget)?;
        if self.ledger.record(listing, &matched, sink) {
            tracing::debug!(listing_id = listing.id, rule = %matched.rule_pattern, "listing flagged");
            Some(matched)
        } else {
            None
        }
    }

    /// Match test against the enabled rules, or against a single ad-hoc rule.
    pub fn test_match(&self, text: &str, only: Option<&Rule>) -> (Option<MatchResult>, String) {
        match only {
            Some(rule) => {
                let mut rule = rule.clone();
                rule.enabled = true;
                report::describe_match_test(text, std::slice::from_ref(&rule), &self.budget)
            }
            None => report::describe_match_test(text, &self.enabled_rules, &self.budget),
        }
    }

    pub fn upsert_rule(&mut self, rule: Rule) -> Option<RuleId> {
        let id = self.store.upsert(rule);
        self.reload_rules();
        id
    }

    pub fn delete_rule(&mut self, id: RuleId) -> bool {
        let removed = self.store.delete(id);
        self.reload_rules();
        removed
    }

    pub fn set_rule_enabled(&mut self, id: RuleId, enabled: bool) -> bool {
        let found = self.store.set_enabled(id, enabled);
        self.reload_rules();
        found
    }

    pub fn set_report_template(&mut self, template: &str) {
        self.store.set_report_template(template);
    }

    /// Render the stored template for a ledger entry.
    pub fn render_report(&self, listing_id: u64) -> Option<String> {
        self.ledger
            .get(listing_id)
            .map(|entry| report::render(self.store.report_template(), entry))
    }

    pub fn clear_ledger(&mut self) {
        self.ledger.clear();
    }

    pub fn enabled_rules(&self) -> &[Rule] {
        &self.enabled_rules
    }

    pub fn store(&self) -> &RuleStore {
        &self.store
    }

    pub fn ledger(&self) -> &ListingLedger {
        &self.ledger
    }

    pub fn clock(&self) -> &ReportingClock {
        &self.clock
    }

    pub fn clock_mut(&mut self) -> &mut ReportingClock {
        &mut self.clock
    }
}
