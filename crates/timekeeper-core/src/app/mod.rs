//! Daily check-in state machine.
//!
//! The controller is pure: Wi-Fi events and clock samples come in as plain
//! values, and every side effect the board must perform (commit, deauth,
//! display update) comes back out as an outcome value. The caller owns the
//! store, the radio, and the panel.

use log::{debug, info};

use crate::{
    clock::{self, ClockReading},
    render::{self, DisplayFrame, Phase},
    state::{Mac, PersistedState},
};

/// 9 h 15 min, the daily target.
pub const DAILY_TARGET_SECS: i32 = 33_300;
/// Delay between an accepted association and the forcible disconnect.
pub const DEAUTH_DELAY_MS: u64 = 4_000;

/// Largest wall-clock delta one tick may consume, in seconds. Bounds catch-up
/// after clock jumps, suspends, and slow ticks.
const DELTA_CLAMP_SECS: i64 = 60;
/// Minimum wall-clock spacing between throttled commits.
const SAVE_THROTTLE_SECS: i64 = 60;

/// When the access point forcibly disconnects an accepted station.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum DeauthPolicy {
    /// After every accepted association.
    Always,
    /// Only after the association that performed today's check-in.
    OnFirstConnect,
    /// Never.
    Never,
}

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct TimekeeperConfig {
    pub daily_target_secs: i32,
    pub deauth_policy: DeauthPolicy,
    /// Accept an unknown address before today's check-in and rebind to it.
    /// Tolerates phones with randomized addresses; see DESIGN.md for the
    /// stranger-binds-first hazard this accepts.
    pub relearn_mac_daily: bool,
    pub deauth_delay_ms: u64,
}

impl Default for TimekeeperConfig {
    fn default() -> Self {
        Self {
            daily_target_secs: DAILY_TARGET_SECS,
            deauth_policy: DeauthPolicy::OnFirstConnect,
            relearn_mac_daily: true,
            deauth_delay_ms: DEAUTH_DELAY_MS,
        }
    }
}

/// How an association was classified, for the caller's log line.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum ConnectDecision {
    /// Unbound device after today's check-in; no state change.
    Ignored,
    /// This association performed today's check-in.
    CheckedIn {
        /// The bound address changed to reach this decision.
        relearned: bool,
    },
    /// Bound phone reconnected after today's check-in.
    AlreadyCheckedIn,
}

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct ConnectOutcome {
    pub decision: ConnectDecision,
    /// Commit the persisted state now, bypassing the throttle.
    pub save: bool,
    /// Deadline for the delayed deauth, if one was armed.
    pub deauth_at_ms: Option<u64>,
}

/// Commit request attached to a tick.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum SaveKind {
    None,
    /// Minute-boundary save; already filtered through the 60 s throttle.
    Throttled,
    /// Rollover save; resets the throttle window.
    Immediate,
}

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct TickOutcome {
    pub frame: DisplayFrame,
    pub phase: Phase,
    pub save: SaveKind,
    /// This tick crossed the local-midnight boundary.
    pub rolled_over: bool,
}

pub struct TimekeeperApp {
    config: TimekeeperConfig,
    state: PersistedState,
    last_epoch: Option<i64>,
    last_save_epoch: Option<i64>,
    deauth_pending: bool,
    deauth_aid: u16,
    deauth_mac: Mac,
    deauth_due_ms: Option<u64>,
}

impl TimekeeperApp {
    /// Restores from a loaded record (or defaults) and normalizes invariants.
    /// A stale `day` is left as-is; the first tick applies the rollover.
    pub fn new(config: TimekeeperConfig, loaded: Option<PersistedState>) -> Self {
        let mut state = loaded.unwrap_or(PersistedState::fresh(config.daily_target_secs));
        state.sanitize(config.daily_target_secs);
        Self {
            config,
            state,
            last_epoch: None,
            last_save_epoch: None,
            deauth_pending: false,
            deauth_aid: 0,
            deauth_mac: [0; 6],
            deauth_due_ms: None,
        }
    }

    pub fn state(&self) -> &PersistedState {
        &self.state
    }

    /// Snapshot for the caller to commit.
    pub fn persisted(&self) -> PersistedState {
        self.state
    }

    pub fn phase(&self) -> Phase {
        if !self.state.started {
            Phase::Wait
        } else if self.state.remaining > 0 {
            Phase::Run
        } else {
            Phase::Done
        }
    }

    /// Deadline of the armed deauth, if any; lets the dispatcher sleep
    /// no longer than it should.
    pub fn deauth_deadline_ms(&self) -> Option<u64> {
        self.deauth_due_ms
    }

    fn note_save(&mut self, epoch: Option<i64>) {
        if epoch.is_some() {
            self.last_save_epoch = epoch;
        }
    }

    fn throttle_open(&self, epoch: i64) -> bool {
        self.last_save_epoch
            .is_none_or(|last| epoch - last >= SAVE_THROTTLE_SECS)
    }
}

include!("events.rs");
include!("runtime.rs");
