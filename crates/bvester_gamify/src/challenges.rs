//! Time-boxed challenges
//!
//! A challenge pairs a metric with a numeric target inside a
//! `[starts_at, ends_at)` window. Joining is validated against the window;
//! progress only moves for joined, incomplete participants; completion
//! fires exactly once per user per challenge.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use crate::error::GamifyError;

/// Static challenge definition.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChallengeDef {
    pub id: String,
    pub name: String,
    /// Metric name reported by the platform, e.g. "investments".
    pub metric: String,
    pub target: u64,
    pub point_reward: u64,
    pub starts_at: DateTime<Utc>,
    pub ends_at: DateTime<Utc>,
}

impl ChallengeDef {
    /// Active while `starts_at <= now < ends_at`.
    pub fn is_active_at(&self, now: DateTime<Utc>) -> bool {
        self.starts_at <= now && now < self.ends_at
    }
}

/// Per-participant progress record.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ChallengeProgress {
    pub progress: u64,
    pub completed: bool,
    pub completed_at: Option<DateTime<Utc>>,
}

impl ChallengeProgress {
    /// 0.0..=1.0 fraction for display bars.
    pub fn fraction(&self, target: u64) -> f64 {
        if self.completed || target == 0 {
            1.0
        } else {
            (self.progress as f64 / target as f64).min(1.0)
        }
    }
}

/// A challenge definition plus its live participant state.
#[derive(Debug, Clone)]
pub struct ChallengeState {
    pub def: ChallengeDef,
    pub participants: HashMap<String, ChallengeProgress>,
    /// How many participants have completed, across all users.
    pub completions: u64,
}

impl ChallengeState {
    pub fn new(def: ChallengeDef) -> Self {
        Self {
            def,
            participants: HashMap::new(),
            completions: 0,
        }
    }

    /// Enroll a user. Re-joining is a no-op that preserves progress.
    pub fn join(&mut self, user_id: &str, now: DateTime<Utc>) -> Result<(), GamifyError> {
        if !self.def.is_active_at(now) {
            return Err(GamifyError::ChallengeInactive(self.def.id.clone()));
        }
        self.participants
            .entry(user_id.to_string())
            .or_default();
        Ok(())
    }

    /// Apply a metric increment for a joined participant. Returns true if
    /// this call completed the challenge for the user.
    pub fn record(&mut self, user_id: &str, amount: u64, now: DateTime<Utc>) -> bool {
        let Some(entry) = self.participants.get_mut(user_id) else {
            return false;
        };
        if entry.completed {
            return false;
        }

        entry.progress += amount;
        if entry.progress >= self.def.target {
            entry.completed = true;
            entry.completed_at = Some(now);
            self.completions += 1;
            return true;
        }
        false
    }

    pub fn progress_of(&self, user_id: &str) -> Option<&ChallengeProgress> {
        self.participants.get(user_id)
    }
}
