//! services/clock.rs
//! Suspend/resume gate for the screening pipeline.
//!
//! Timed and session-bound suspensions clear lazily, on the first poll that observes
//! the condition; there is no timer. Until-restart only clears via [`ReportingClock::enable`].

use std::time::Duration;

use chrono::{DateTime, Utc};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DisableState {
    #[default]
    Active,
    SuspendedUntilTime(DateTime<Utc>),
    SuspendedUntilRestart,
    SuspendedUntilSessionEnd,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResumeCause {
    DeadlineReached,
    SessionEnded,
}

/// Outcome of one poll.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Tick {
    Active,
    /// Was suspended, and this poll lifted it.
    Resumed(ResumeCause),
    Suspended,
}

impl Tick {
    pub fn is_active(&self) -> bool {
        !matches!(self, Tick::Suspended)
    }
}

/// "Is a play session currently active?"
pub trait SessionSignal {
    fn session_active(&self) -> bool;
}

impl SessionSignal for bool {
    fn session_active(&self) -> bool {
        *self
    }
}

#[derive(Debug, Clone, Default)]
pub struct ReportingClock {
    state: DisableState,
}

impl ReportingClock {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn state(&self) -> DisableState {
        self.state
    }

    pub fn enable(&mut self) {
        if self.state != DisableState::Active {
            tracing::info!("reporting enabled");
        }
        self.state = DisableState::Active;
    }

    pub fn disable_until_restart(&mut self) {
        tracing::info!("reporting disabled until restart");
        self.state = DisableState::SuspendedUntilRestart;
    }

    pub fn disable_until_session_end(&mut self) {
        tracing::info!("reporting disabled until the session ends");
        self.state = DisableState::SuspendedUntilSessionEnd;
    }

    pub fn disable_for(&mut self, duration: Duration) {
        self.disable_for_at(Utc::now(), duration);
    }

    /// Suspend until `now + duration`. A deadline past the calendar range suspends until restart.
    pub fn disable_for_at(&mut self, now: DateTime<Utc>, duration: Duration) {
        let deadline = chrono::Duration::from_std(duration)
            .ok()
            .and_then(|d| now.checked_add_signed(d));
        match deadline {
            Some(deadline) => self.disable_until(deadline),
            None => self.disable_until_restart(),
        }
    }

    pub fn disable_until(&mut self, deadline: DateTime<Utc>) {
        tracing::info!(%deadline, "reporting disabled until deadline");
        self.state = DisableState::SuspendedUntilTime(deadline);
    }

    pub fn poll(&mut self, session: &dyn SessionSignal) -> Tick {
        self.poll_at(Utc::now(), session)
    }

    /// Refresh the state once; call before each processing pass.
    pub fn poll_at(&mut self, now: DateTime<Utc>, session: &dyn SessionSignal) -> Tick {
        match self.state {
            DisableState::Active => Tick::Active,
            DisableState::SuspendedUntilTime(deadline) if now >= deadline => {
                self.state = DisableState::Active;
                tracing::info!("reporting re-enabled");
                Tick::Resumed(ResumeCause::DeadlineReached)
            }
            DisableState::SuspendedUntilSessionEnd if !session.session_active() => {
                self.state = DisableState::Active;
                tracing::info!("reporting re-enabled after logout");
                Tick::Resumed(ResumeCause::SessionEnded)
            }
            _ => Tick::Suspended,
        }
    }

    pub fn is_active(&self) -> bool {
        self.state == DisableState::Active
    }

    pub fn status_text(&self) -> String {
        match self.state {
            DisableState::Active => "Enabled".to_string(),
            DisableState::SuspendedUntilRestart => "Disabled until restart".to_string(),
            DisableState::SuspendedUntilSessionEnd => "Disabled until logout".to_string(),
            DisableState::SuspendedUntilTime(deadline) => {
                format!("Disabled until {} UTC", deadline.format("%Y-%m-%d %H:%M:%S"))
            }
        }
    }
}
