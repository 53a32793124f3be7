//! Election identity, network timing parameters and derived windows.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::Nanotons;

/// Network-assigned election id. By convention it is the unix time at which
/// the elected validator set takes over.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct ElectionId(u64);

impl ElectionId {
    pub fn new(id: u64) -> Self {
        Self(id)
    }

    /// Map the elector's "no election" sentinel (0) to `None`.
    pub fn from_active(raw: u64) -> Option<Self> {
        (raw != 0).then_some(Self(raw))
    }

    pub fn as_u64(&self) -> u64 {
        self.0
    }

    /// `self + secs`, used for key expiry times.
    pub fn offset(&self, secs: u64) -> u64 {
        self.0.saturating_add(secs)
    }
}

impl fmt::Display for ElectionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Election timing parameters (network config param 15), all in seconds.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ElectionTiming {
    pub validators_elected_for: u64,
    pub elections_start_before: u64,
    pub elections_end_before: u64,
    pub stake_held_for: u64,
}

/// Stake limits (network config param 17).
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct StakeBounds {
    pub min_stake: Nanotons,
    pub max_stake: Nanotons,
    pub min_total_stake: Nanotons,
    /// Fixed-point factor, 65536 = 1.0.
    pub max_stake_factor: u32,
}

impl StakeBounds {
    /// The network max stake factor as a plain multiplier.
    pub fn max_factor(&self) -> f64 {
        self.max_stake_factor as f64 / 65536.0
    }
}

/// The persisted timing snapshot of one election.
///
/// Computed once, at first observation of the election id, and never
/// re-derived afterwards.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ElectionWindow {
    pub election_id: ElectionId,
    pub start_at: u64,
    pub close_at: u64,
    pub next_elections_at: u64,
}

impl ElectionWindow {
    pub fn derive(election_id: ElectionId, timing: &ElectionTiming) -> Self {
        let id = election_id.as_u64();
        Self {
            election_id,
            start_at: id.saturating_sub(timing.elections_start_before),
            close_at: id.saturating_sub(timing.elections_end_before),
            next_elections_at: id.saturating_add(timing.elections_start_before),
        }
    }

    /// Whether bids are still accepted at unix time `now`.
    pub fn is_open_at(&self, now: u64) -> bool {
        now >= self.start_at && now < self.close_at
    }
}
