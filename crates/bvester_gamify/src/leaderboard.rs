//! Period-keyed leaderboard snapshots
//!
//! Every point change upserts the user's total into three buckets: the
//! current ISO week, the current calendar month, and all-time. Past
//! week/month buckets are retained until the hosting service prunes them;
//! unbounded retention grows with platform age, so long-lived deployments
//! should call `prune_periods` on a schedule.

use chrono::{DateTime, Datelike, Utc};
use serde::Serialize;
use std::collections::HashMap;

/// The permanent bucket key.
pub const ALL_TIME_KEY: &str = "all-time";

/// ISO-week bucket key, e.g. "week-32-2026".
pub fn week_key(at: DateTime<Utc>) -> String {
    let iso = at.iso_week();
    format!("week-{:02}-{}", iso.week(), iso.year())
}

/// Calendar-month bucket key, e.g. "month-08-2026".
pub fn month_key(at: DateTime<Utc>) -> String {
    format!("month-{:02}-{}", at.month(), at.year())
}

/// Medal or star shown next to the top ranks.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum RankBadge {
    Gold,
    Silver,
    Bronze,
    Star,
}

impl RankBadge {
    /// Badge for a 1-based rank: medals for the podium, a star through
    /// rank 10, nothing below that.
    pub fn for_rank(rank: u32) -> Option<Self> {
        match rank {
            1 => Some(RankBadge::Gold),
            2 => Some(RankBadge::Silver),
            3 => Some(RankBadge::Bronze),
            4..=10 => Some(RankBadge::Star),
            _ => None,
        }
    }

    pub fn symbol(&self) -> &'static str {
        match self {
            RankBadge::Gold => "🥇",
            RankBadge::Silver => "🥈",
            RankBadge::Bronze => "🥉",
            RankBadge::Star => "⭐",
        }
    }
}

/// One ranked row, annotated for display.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LeaderboardEntry {
    pub rank: u32,
    pub user_id: String,
    pub points: u64,
    pub level: u32,
    pub achievement_count: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub badge: Option<RankBadge>,
}

/// All period buckets, each mapping user id to point total.
#[derive(Debug, Clone, Default)]
pub struct LeaderboardSnapshots {
    boards: HashMap<String, HashMap<String, u64>>,
}

impl LeaderboardSnapshots {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a user's new total in the week, month, and all-time buckets
    /// for `at`. Totals are absolute, not deltas.
    pub fn upsert(&mut self, user_id: &str, total_points: u64, at: DateTime<Utc>) {
        for key in [week_key(at), month_key(at), ALL_TIME_KEY.to_string()] {
            self.boards
                .entry(key)
                .or_default()
                .insert(user_id.to_string(), total_points);
        }
    }

    /// Top `limit` (user, points) pairs for a period, descending by
    /// points. Order among tied totals is unspecified.
    pub fn top(&self, period: &str, limit: usize) -> Vec<(String, u64)> {
        let Some(board) = self.boards.get(period) else {
            return Vec::new();
        };
        let mut rows: Vec<(String, u64)> = board
            .iter()
            .map(|(user, points)| (user.clone(), *points))
            .collect();
        rows.sort_by(|a, b| b.1.cmp(&a.1));
        rows.truncate(limit);
        rows
    }

    pub fn periods(&self) -> Vec<&str> {
        self.boards.keys().map(String::as_str).collect()
    }

    /// Drop every bucket not named in `keep`. The all-time bucket is
    /// always kept.
    pub fn prune_periods(&mut self, keep: &[String]) -> usize {
        let before = self.boards.len();
        self.boards
            .retain(|key, _| key == ALL_TIME_KEY || keep.iter().any(|k| k == key));
        before - self.boards.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn at() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 8, 4, 12, 0, 0).unwrap()
    }

    #[test]
    fn test_period_keys() {
        assert_eq!(week_key(at()), "week-32-2026");
        assert_eq!(month_key(at()), "month-08-2026");
    }

    #[test]
    fn test_iso_week_year_rollover() {
        // 2024-12-30 belongs to ISO week 1 of 2025.
        let ts = Utc.with_ymd_and_hms(2024, 12, 30, 0, 0, 0).unwrap();
        assert_eq!(week_key(ts), "week-01-2025");
        assert_eq!(month_key(ts), "month-12-2024");
    }

    #[test]
    fn test_upsert_fills_all_three_buckets() {
        let mut boards = LeaderboardSnapshots::new();
        boards.upsert("u1", 50, at());
        assert_eq!(boards.top(&week_key(at()), 10).len(), 1);
        assert_eq!(boards.top(&month_key(at()), 10).len(), 1);
        assert_eq!(boards.top(ALL_TIME_KEY, 10).len(), 1);
    }

    #[test]
    fn test_upsert_overwrites_with_new_total() {
        let mut boards = LeaderboardSnapshots::new();
        boards.upsert("u1", 50, at());
        boards.upsert("u1", 110, at());
        assert_eq!(boards.top(ALL_TIME_KEY, 10), vec![("u1".to_string(), 110)]);
    }

    #[test]
    fn test_top_sorts_descending_and_truncates() {
        let mut boards = LeaderboardSnapshots::new();
        boards.upsert("u1", 500, at());
        boards.upsert("u2", 300, at());
        boards.upsert("u3", 300, at());
        boards.upsert("u4", 10, at());

        let top = boards.top(ALL_TIME_KEY, 3);
        assert_eq!(top.len(), 3);
        assert_eq!(top[0], ("u1".to_string(), 500));
        assert_eq!(top[1].1, 300);
        assert_eq!(top[2].1, 300);
    }

    #[test]
    fn test_unknown_period_is_empty() {
        let boards = LeaderboardSnapshots::new();
        assert!(boards.top("week-01-1999", 5).is_empty());
    }

    #[test]
    fn test_badges() {
        assert_eq!(RankBadge::for_rank(1), Some(RankBadge::Gold));
        assert_eq!(RankBadge::for_rank(2), Some(RankBadge::Silver));
        assert_eq!(RankBadge::for_rank(3), Some(RankBadge::Bronze));
        assert_eq!(RankBadge::for_rank(7), Some(RankBadge::Star));
        assert_eq!(RankBadge::for_rank(11), None);
    }

    #[test]
    fn test_prune_keeps_all_time() {
        let mut boards = LeaderboardSnapshots::new();
        boards.upsert("u1", 50, at());
        let dropped = boards.prune_periods(&[]);
        assert_eq!(dropped, 2);
        assert_eq!(boards.top(ALL_TIME_KEY, 10).len(), 1);
    }
}
