// src/services/mod.rs

pub mod clock;        // suspend/resume gate, polled before each pass
pub mod ledger;       // bounded dedup history + notification budget
pub mod report;       // template rendering and search
pub mod screen;       // clock -> matcher -> ledger

// Public API
pub use clock::{DisableState, ReportingClock, ResumeCause, SessionSignal, Tick};
pub use ledger::{FilteredListingEntry, Listing, ListingLedger, Notice, NotificationSink, NullSink};
pub use screen::Screen;
