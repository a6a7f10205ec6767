//! services/ledger.rs
//! Bounded history of flagged listings.
//!
//! - Dedup by listing id and by a blake3 hash of (name, world, description).
//! - FIFO eviction back down to capacity; seen-sets outlive eviction.
//! - A per-process announcement budget gates notices, never storage.

use std::collections::{HashSet, VecDeque};

use chrono::{DateTime, Utc};
use rules::{MatchResult, RuleId};
use serde::{Deserialize, Serialize};

pub const DEFAULT_CAPACITY: usize = 500;
pub const DEFAULT_NOTIFICATION_BUDGET: usize = 4;

/// A listing as delivered by the text source. Only `description` is screened.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Listing {
    pub id: u64,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub world: String,
    #[serde(default)]
    pub description: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FilteredListingEntry {
    pub listing_id: u64,
    pub name: String,
    pub world: String,
    pub description: String,
    pub matched_rule_id: RuleId,
    pub matched_rule_pattern: String,
    pub matched_value: String,
    pub seen_at: DateTime<Utc>,
}

/// Outward announcement for a freshly flagged listing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notice {
    pub listing_id: u64,
    pub name: String,
    pub world: String,
    pub matched_pattern: String,
}

/// Receives notices while the ledger's budget allows.
pub trait NotificationSink {
    fn announce(&mut self, notice: Notice);
}

impl NotificationSink for Vec<Notice> {
    fn announce(&mut self, notice: Notice) {
        self.push(notice);
    }
}

/// Drops every notice.
pub struct NullSink;

impl NotificationSink for NullSink {
    fn announce(&mut self, _notice: Notice) {}
}

pub struct ListingLedger {
    entries: VecDeque<FilteredListingEntry>,
    seen_ids: HashSet<u64>,
    seen_hashes: HashSet<[u8; 32]>,
    capacity: usize,
    notification_budget: usize,
    announcements_used: usize,
}

impl Default for ListingLedger {
    fn default() -> Self {
        Self::new(DEFAULT_CAPACITY, DEFAULT_NOTIFICATION_BUDGET)
    }
}

impl ListingLedger {
    pub fn new(capacity: usize, notification_budget: usize) -> Self {
        Self {
            entries: VecDeque::new(),
            seen_ids: HashSet::new(),
            seen_hashes: HashSet::new(),
            capacity,
            notification_budget,
            announcements_used: 0,
        }
    }

    /// Store a match unless the listing (by id or content) was already seen.
    /// Returns whether an entry was inserted.
    pub fn record(
        &mut self,
        listing: &Listing,
        matched: &MatchResult,
        sink: &mut dyn NotificationSink,
    ) -> bool {
        if self.seen_ids.contains(&listing.id) {
            tracing::debug!(listing_id = listing.id, "ledger: duplicate listing id");
            return false;
        }
        let hash = content_hash(&listing.name, &listing.world, &listing.description);
        if self.seen_hashes.contains(&hash) {
            tracing::debug!(listing_id = listing.id, "ledger: duplicate listing content");
            return false;
        }

        self.seen_ids.insert(listing.id);
        self.seen_hashes.insert(hash);
        self.entries.push_back(FilteredListingEntry {
            listing_id: listing.id,
            name: listing.name.clone(),
            world: listing.world.clone(),
            description: listing.description.clone(),
            matched_rule_id: matched.rule_id,
            matched_rule_pattern: matched.rule_pattern.clone(),
            matched_value: matched.matched_value.clone(),
            seen_at: Utc::now(),
        });

        if self.entries.len() > self.capacity {
            let excess = self.entries.len() - self.capacity;
            self.entries.drain(..excess);
            tracing::debug!(evicted = excess, "ledger: evicted oldest entries");
        }

        if self.announcements_used < self.notification_budget {
            self.announcements_used += 1;
            sink.announce(Notice {
                listing_id: listing.id,
                name: listing.name.clone(),
                world: listing.world.clone(),
                matched_pattern: matched.rule_pattern.clone(),
            });
            if self.announcements_used == self.notification_budget {
                tracing::info!(
                    budget = self.notification_budget,
                    "notification budget exhausted; further matches are stored silently"
                );
            }
        }
        true
    }

    /// Drop entries, both seen-sets and the announcement count together.
    pub fn clear(&mut self) {
        self.entries.clear();
        self.seen_ids.clear();
        self.seen_hashes.clear();
        self.announcements_used = 0;
    }

    /// Entries in insertion order (oldest first).
    pub fn entries(&self) -> impl Iterator<Item = &FilteredListingEntry> {
        self.entries.iter()
    }

    pub fn newest_first(&self) -> Vec<&FilteredListingEntry> {
        let mut out: Vec<&FilteredListingEntry> = self.entries.iter().rev().collect();
        out.sort_by(|a, b| b.seen_at.cmp(&a.seen_at));
        out
    }

    pub fn get(&self, listing_id: u64) -> Option<&FilteredListingEntry> {
        self.entries.iter().find(|e| e.listing_id == listing_id)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn announcements_used(&self) -> usize {
        self.announcements_used
    }

    pub fn notification_budget(&self) -> usize {
        self.notification_budget
    }
}

// Length-prefixed so ("ab", "c") and ("a", "bc") hash differently.
fn content_hash(name: &str, world: &str, description: &str) -> [u8; 32] {
    let mut hasher = blake3::Hasher::new();
    for field in [name, world, description] {
        hasher.update(&(field.len() as u64).to_le_bytes());
        hasher.update(field.as_bytes());
    }
    *hasher.finalize().as_bytes()
}
