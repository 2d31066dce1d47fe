//! Achievement definitions and the unlock matcher
//!
//! Criteria are a closed set of typed checks rather than free-form
//! predicates, matched exhaustively. Each definition declares its own
//! combinator: `Any` unlocks when a single criterion matches, `All`
//! requires every criterion to match in the same context.

use serde::{Deserialize, Serialize};

use crate::types::{ProgressContext, UserProgress};

/// One unlock criterion evaluated against a `ProgressContext`.
///
/// An absent context field never matches; callers only pay for the stats
/// they actually carry on an event.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Criterion {
    /// The named action occurred, optionally at least `count` times.
    ActionCount {
        action: String,
        #[serde(default = "one")]
        count: u64,
    },
    /// Business readiness score (0-100) reached `min`.
    ReadinessScore { min: u32 },
    /// Cumulative funding raised reached `min`.
    TotalFunding { min: u64 },
    /// Investor portfolio holds at least `min` businesses.
    PortfolioSize { min: u32 },
    /// At least `min` referred users joined.
    ReferralCount { min: u32 },
    /// Consecutive-day login streak reached `min`.
    LoginStreak { min: u32 },
}

fn one() -> u64 {
    1
}

impl Criterion {
    pub fn matches(&self, ctx: &ProgressContext) -> bool {
        match self {
            Criterion::ActionCount { action, count } => {
                ctx.action.as_deref() == Some(action.as_str())
                    && ctx.action_count.unwrap_or(1) >= *count
            }
            Criterion::ReadinessScore { min } => {
                ctx.readiness_score.map(|s| s >= *min).unwrap_or(false)
            }
            Criterion::TotalFunding { min } => {
                ctx.total_funding.map(|f| f >= *min).unwrap_or(false)
            }
            Criterion::PortfolioSize { min } => {
                ctx.portfolio_size.map(|p| p >= *min).unwrap_or(false)
            }
            Criterion::ReferralCount { min } => {
                ctx.referral_count.map(|r| r >= *min).unwrap_or(false)
            }
            Criterion::LoginStreak { min } => {
                ctx.login_streak.map(|s| s >= *min).unwrap_or(false)
            }
        }
    }
}

/// How a definition combines its criteria.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Combinator {
    /// Any single matching criterion unlocks.
    #[default]
    Any,
    /// Every criterion must match in the same context.
    All,
}

/// Static achievement definition, loaded at engine construction.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AchievementDef {
    pub id: String,
    pub name: String,
    pub point_reward: u64,
    #[serde(default)]
    pub combinator: Combinator,
    pub criteria: Vec<Criterion>,
}

impl AchievementDef {
    /// Does this context satisfy the definition?
    pub fn is_met(&self, ctx: &ProgressContext) -> bool {
        match self.combinator {
            Combinator::Any => self.criteria.iter().any(|c| c.matches(ctx)),
            Combinator::All => {
                !self.criteria.is_empty() && self.criteria.iter().all(|c| c.matches(ctx))
            }
        }
    }
}

/// Evaluate the catalog for a user and return the definitions newly
/// satisfied by `ctx`, skipping anything already unlocked. The caller owns
/// recording the unlock and paying the reward.
pub fn match_unlocks<'a>(
    catalog: &'a [AchievementDef],
    user: &UserProgress,
    ctx: &ProgressContext,
) -> Vec<&'a AchievementDef> {
    catalog
        .iter()
        .filter(|def| !user.has_achievement(&def.id))
        .filter(|def| def.is_met(ctx))
        .collect()
}
