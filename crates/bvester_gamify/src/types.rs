//! Shared progression types
//!
//! `UserProgress` is the per-user mutable record; `ProgressContext` is the
//! read-only snapshot of platform stats an event carries into the matcher.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

use crate::levels::LevelProgress;

/// Per-user progression record. Created on first point award, mutated only
/// through engine methods, never deleted.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UserProgress {
    pub user_id: String,
    pub total_points: u64,
    pub level: u32,
    /// Unlocked achievement ids. Ordering carries no meaning.
    pub achievements: BTreeSet<String>,
    pub current_streak: u32,
    pub longest_streak: u32,
    pub last_active: Option<DateTime<Utc>>,
}

impl UserProgress {
    pub fn new(user_id: impl Into<String>) -> Self {
        Self {
            user_id: user_id.into(),
            total_points: 0,
            level: 1,
            achievements: BTreeSet::new(),
            current_streak: 0,
            longest_streak: 0,
            last_active: None,
        }
    }

    pub fn has_achievement(&self, id: &str) -> bool {
        self.achievements.contains(id)
    }
}

/// Stats snapshot carried by a platform event into achievement matching.
///
/// Every field is optional; an absent field never matches a criterion.
/// `login_streak` is filled in by the streak tracker, the rest by the
/// hosting service from its own records.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProgressContext {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub action: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub action_count: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub readiness_score: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub total_funding: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub portfolio_size: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub referral_count: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub login_streak: Option<u32>,
}

impl ProgressContext {
    /// Context for a single named platform action.
    pub fn for_action(action: impl Into<String>) -> Self {
        Self {
            action: Some(action.into()),
            ..Self::default()
        }
    }

    /// Context carrying only a login streak length.
    pub fn for_login_streak(streak: u32) -> Self {
        Self {
            login_streak: Some(streak),
            ..Self::default()
        }
    }

    pub fn with_action_count(mut self, count: u64) -> Self {
        self.action_count = Some(count);
        self
    }

    pub fn with_readiness_score(mut self, score: u32) -> Self {
        self.readiness_score = Some(score);
        self
    }

    pub fn with_total_funding(mut self, funding: u64) -> Self {
        self.total_funding = Some(funding);
        self
    }

    pub fn with_portfolio_size(mut self, size: u32) -> Self {
        self.portfolio_size = Some(size);
        self
    }

    pub fn with_referral_count(mut self, count: u32) -> Self {
        self.referral_count = Some(count);
        self
    }
}

/// Read model returned by `GamificationEngine::user_stats`.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UserStats {
    pub user_id: String,
    pub total_points: u64,
    pub level: u32,
    pub next_level_progress: LevelProgress,
    pub achievements: Vec<String>,
    pub current_streak: u32,
    pub longest_streak: u32,
    pub last_active: Option<DateTime<Utc>>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_user_starts_blank() {
        let user = UserProgress::new("u1");
        assert_eq!(user.total_points, 0);
        assert_eq!(user.level, 1);
        assert_eq!(user.current_streak, 0);
        assert!(user.achievements.is_empty());
        assert!(user.last_active.is_none());
    }

    #[test]
    fn test_context_builders() {
        let ctx = ProgressContext::for_action("investmentMade").with_action_count(3);
        assert_eq!(ctx.action.as_deref(), Some("investmentMade"));
        assert_eq!(ctx.action_count, Some(3));
        assert!(ctx.login_streak.is_none());

        let ctx = ProgressContext::for_login_streak(7);
        assert_eq!(ctx.login_streak, Some(7));
        assert!(ctx.action.is_none());
    }

    #[test]
    fn test_context_json_field_names_are_camel_case() {
        let ctx = ProgressContext::for_action("completeProfile").with_readiness_score(80);
        let json = serde_json::to_value(&ctx).unwrap();
        assert!(json.get("readinessScore").is_some());
        assert!(json.get("readiness_score").is_none());
    }
}
