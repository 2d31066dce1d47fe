//! Consecutive-day activity streaks
//!
//! The streak advances on calendar-day boundaries, not 24h windows: any
//! activity on the day after the last active day extends it, a missed day
//! breaks it back to 1, repeat activity on the same day changes nothing.

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::types::UserProgress;

/// Streak length that earns the weekly bonus (every multiple).
pub const WEEKLY_BONUS_EVERY: u32 = 7;
/// Streak length that earns the monthly bonus (every multiple).
pub const MONTHLY_BONUS_EVERY: u32 = 30;

/// What a streak update did.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum StreakChange {
    /// First-ever activity for this user.
    Started,
    /// Activity on the day after the last active day.
    Extended,
    /// Repeat activity on an already-counted day. No-op re-affirmation.
    SameDay,
    /// A gap of more than one day broke the streak back to 1.
    Reset,
}

/// Outcome of one streak update.
#[derive(Debug, Clone, Copy, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StreakUpdate {
    pub change: StreakChange,
    pub current_streak: u32,
    pub longest_streak: u32,
    pub weekly_bonus: bool,
    pub monthly_bonus: bool,
}

/// Advance a user's streak for activity at `now`.
///
/// Both bonuses can fire on the same update (streak 210 is a multiple of
/// 7 and of 30). `longest_streak` is a running max and never decreases.
pub fn advance(user: &mut UserProgress, now: DateTime<Utc>) -> StreakUpdate {
    let today = now.date_naive();

    let change = match user.last_active {
        None => {
            user.current_streak = 1;
            StreakChange::Started
        }
        Some(last) => {
            let gap = (today - last.date_naive()).num_days();
            if gap <= 0 {
                // Same day, or a clock that moved backwards. Count nothing.
                StreakChange::SameDay
            } else if gap == 1 {
                user.current_streak += 1;
                StreakChange::Extended
            } else {
                user.current_streak = 1;
                StreakChange::Reset
            }
        }
    };

    if change != StreakChange::SameDay || user.last_active.map(|l| l < now).unwrap_or(true) {
        user.last_active = Some(now);
    }
    user.longest_streak = user.longest_streak.max(user.current_streak);

    // A started or reset streak of 1 never sits on a bonus multiple, so
    // bonuses can only fire on an extension.
    let extended = change == StreakChange::Extended;
    StreakUpdate {
        change,
        current_streak: user.current_streak,
        longest_streak: user.longest_streak,
        weekly_bonus: extended && user.current_streak % WEEKLY_BONUS_EVERY == 0,
        monthly_bonus: extended && user.current_streak % MONTHLY_BONUS_EVERY == 0,
    }
}
