//! The progression engine
//!
//! One `GamificationEngine` owns every map; its methods are the only
//! mutation path. The engine is synchronous and does no I/O of its own.
//! State is process-lifetime only: the hosting service owns persistence,
//! and must serialize access per user if it handles requests concurrently.
//!
//! Time-sensitive operations come in pairs: the plain method stamps
//! `Utc::now()`, the `_at` variant takes an explicit instant so callers
//! and tests stay deterministic.

use chrono::{DateTime, Utc};
use serde::Serialize;
use std::collections::{BTreeMap, HashMap};
use tracing::{debug, info};

use crate::achievements::{match_unlocks, AchievementDef};
use crate::challenges::{ChallengeDef, ChallengeState};
use crate::config::EngineCatalog;
use crate::error::GamifyError;
use crate::events::{EventLog, EventRecord, ProgressEvent};
use crate::leaderboard::{LeaderboardEntry, LeaderboardSnapshots, RankBadge};
use crate::levels::LevelTable;
use crate::points::{ActionPoints, AwardOutcome};
use crate::streaks::{self, StreakUpdate};
use crate::types::{ProgressContext, UserProgress, UserStats};

/// Result of a streak update: the streak arithmetic plus any achievements
/// the new streak length unlocked.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StreakReport {
    #[serde(flatten)]
    pub streak: StreakUpdate,
    pub unlocked: Vec<String>,
}

pub struct GamificationEngine {
    levels: LevelTable,
    actions: ActionPoints,
    achievements: Vec<AchievementDef>,
    challenges: BTreeMap<String, ChallengeState>,
    users: HashMap<String, UserProgress>,
    boards: LeaderboardSnapshots,
    events: EventLog,
}

impl GamificationEngine {
    /// Build an engine from a validated catalog.
    pub fn new(catalog: EngineCatalog) -> Result<Self, GamifyError> {
        catalog.validate()?;
        let levels = LevelTable::new(catalog.levels)?;
        let challenges = catalog
            .challenges
            .into_iter()
            .map(|def| (def.id.clone(), ChallengeState::new(def)))
            .collect();

        Ok(Self {
            levels,
            actions: ActionPoints::from_map(catalog.actions),
            achievements: catalog.achievements,
            challenges,
            users: HashMap::new(),
            boards: LeaderboardSnapshots::new(),
            events: EventLog::new(),
        })
    }

    /// Engine over the built-in catalog.
    pub fn seeded() -> Self {
        Self::new(EngineCatalog::seeded()).expect("seeded catalog is valid")
    }

    /// Install a fire-and-forget notification callback. Operations still
    /// return their full results either way.
    pub fn set_event_callback<F>(&mut self, callback: F)
    where
        F: Fn(&EventRecord) + Send + Sync + 'static,
    {
        self.events.set_callback(callback);
    }

    // ------------------------------------------------------------------
    // Point ledger
    // ------------------------------------------------------------------

    /// Award points for a platform action. `explicit` overrides the
    /// action table. A zero-point result is a no-op returning `None`;
    /// unknown actions degrade to that rather than erroring.
    pub fn award_points(
        &mut self,
        user_id: &str,
        action: &str,
        explicit: Option<u64>,
    ) -> Option<AwardOutcome> {
        self.award_points_at(user_id, action, explicit, Utc::now())
    }

    pub fn award_points_at(
        &mut self,
        user_id: &str,
        action: &str,
        explicit: Option<u64>,
        now: DateTime<Utc>,
    ) -> Option<AwardOutcome> {
        let amount = explicit.unwrap_or_else(|| self.actions.value_of(action));
        if amount == 0 {
            debug!(user_id, action, "zero-point action, skipping");
            return None;
        }
        Some(self.credit(user_id, action, amount, now))
    }

    /// Apply a non-zero point credit: bump the total, recompute the
    /// level, refresh the leaderboards, emit events.
    fn credit(&mut self, user_id: &str, action: &str, amount: u64, now: DateTime<Utc>) -> AwardOutcome {
        let user = self
            .users
            .entry(user_id.to_string())
            .or_insert_with(|| UserProgress::new(user_id));

        let previous_level = self.levels.level_for(user.total_points);
        user.total_points += amount;
        let total = user.total_points;
        let level = self.levels.level_for(total);
        user.level = level;
        let leveled_up = level > previous_level;

        self.boards.upsert(user_id, total, now);
        self.events.emit(
            ProgressEvent::PointsAwarded {
                user_id: user_id.to_string(),
                action: action.to_string(),
                points: amount,
                total_points: total,
            },
            now,
        );
        debug!(user_id, action, amount, total, "points awarded");

        if leveled_up {
            info!(user_id, level, previous_level, "level up");
            self.events.emit(
                ProgressEvent::LevelUp {
                    user_id: user_id.to_string(),
                    level,
                    previous_level,
                },
                now,
            );
        }

        AwardOutcome {
            points_awarded: amount,
            total_points: total,
            level,
            leveled_up,
            next_level_progress: self.levels.progress_toward_next(total),
        }
    }

    // ------------------------------------------------------------------
    // Achievements
    // ------------------------------------------------------------------

    /// Evaluate the achievement catalog against `ctx` and unlock whatever
    /// newly matches. Rewards flow back through the point ledger, so a
    /// single unlock can also level the user up. Returns the ids unlocked
    /// by this call; re-invocation with the same context returns nothing.
    pub fn check_achievements(&mut self, user_id: &str, ctx: &ProgressContext) -> Vec<String> {
        self.check_achievements_at(user_id, ctx, Utc::now())
    }

    pub fn check_achievements_at(
        &mut self,
        user_id: &str,
        ctx: &ProgressContext,
        now: DateTime<Utc>,
    ) -> Vec<String> {
        let user = self
            .users
            .entry(user_id.to_string())
            .or_insert_with(|| UserProgress::new(user_id));

        let newly: Vec<(String, u64)> = match_unlocks(&self.achievements, user, ctx)
            .into_iter()
            .map(|def| (def.id.clone(), def.point_reward))
            .collect();

        for (id, _) in &newly {
            user.achievements.insert(id.clone());
        }

        for (id, reward) in &newly {
            info!(user_id, achievement = id.as_str(), reward, "achievement unlocked");
            self.events.emit(
                ProgressEvent::AchievementUnlocked {
                    user_id: user_id.to_string(),
                    achievement_id: id.clone(),
                    point_reward: *reward,
                },
                now,
            );
            if *reward > 0 {
                self.credit(user_id, &format!("achievement:{}", id), *reward, now);
            }
        }

        newly.into_iter().map(|(id, _)| id).collect()
    }

    // ------------------------------------------------------------------
    // Streaks
    // ------------------------------------------------------------------

    /// Record daily activity: advance the streak, pay any weekly/monthly
    /// bonus through the ledger, then run the achievement matcher with
    /// the fresh streak length. The matcher always sees the streak value
    /// set by this call, never the previous day's.
    pub fn update_streak(&mut self, user_id: &str) -> StreakReport {
        self.update_streak_at(user_id, Utc::now())
    }

    pub fn update_streak_at(&mut self, user_id: &str, now: DateTime<Utc>) -> StreakReport {
        let user = self
            .users
            .entry(user_id.to_string())
            .or_insert_with(|| UserProgress::new(user_id));
        let update = streaks::advance(user, now);
        debug!(
            user_id,
            change = ?update.change,
            streak = update.current_streak,
            "streak updated"
        );

        if update.weekly_bonus {
            self.award_points_at(user_id, "weeklyStreakBonus", None, now);
        }
        if update.monthly_bonus {
            self.award_points_at(user_id, "monthlyStreakBonus", None, now);
        }

        let unlocked = self.check_achievements_at(
            user_id,
            &ProgressContext::for_login_streak(update.current_streak),
            now,
        );

        StreakReport {
            streak: update,
            unlocked,
        }
    }

    // ------------------------------------------------------------------
    // Challenges
    // ------------------------------------------------------------------

    /// Enroll a user in a challenge. Fails for an unknown id or a
    /// challenge outside its active window; re-joining is a no-op.
    pub fn join_challenge(&mut self, user_id: &str, challenge_id: &str) -> Result<(), GamifyError> {
        self.join_challenge_at(user_id, challenge_id, Utc::now())
    }

    pub fn join_challenge_at(
        &mut self,
        user_id: &str,
        challenge_id: &str,
        now: DateTime<Utc>,
    ) -> Result<(), GamifyError> {
        let state = self
            .challenges
            .get_mut(challenge_id)
            .ok_or_else(|| GamifyError::ChallengeNotFound(challenge_id.to_string()))?;
        state.join(user_id, now)?;
        info!(user_id, challenge_id, "joined challenge");
        Ok(())
    }

    /// Apply a metric increment across every active challenge the user
    /// has joined and not yet completed. A single update can complete
    /// several challenges sharing the metric. Returns the ids completed
    /// by this call, rewards already paid.
    pub fn update_challenge_progress(
        &mut self,
        user_id: &str,
        metric: &str,
        amount: u64,
    ) -> Vec<String> {
        self.update_challenge_progress_at(user_id, metric, amount, Utc::now())
    }

    pub fn update_challenge_progress_at(
        &mut self,
        user_id: &str,
        metric: &str,
        amount: u64,
        now: DateTime<Utc>,
    ) -> Vec<String> {
        let mut completed: Vec<(String, u64)> = Vec::new();
        for state in self.challenges.values_mut() {
            if state.def.metric != metric {
                continue;
            }
            // The target has to be reached inside the window; increments
            // after the window lapses no longer count.
            if !state.def.is_active_at(now) {
                continue;
            }
            if state.record(user_id, amount, now) {
                completed.push((state.def.id.clone(), state.def.point_reward));
            }
        }

        for (id, reward) in &completed {
            info!(user_id, challenge = id.as_str(), reward, "challenge completed");
            self.events.emit(
                ProgressEvent::ChallengeCompleted {
                    user_id: user_id.to_string(),
                    challenge_id: id.clone(),
                    point_reward: *reward,
                },
                now,
            );
            if *reward > 0 {
                self.credit(user_id, &format!("challenge:{}", id), *reward, now);
            }
        }

        completed.into_iter().map(|(id, _)| id).collect()
    }

    // ------------------------------------------------------------------
    // Read models
    // ------------------------------------------------------------------

    pub fn user_stats(&self, user_id: &str) -> Option<UserStats> {
        let user = self.users.get(user_id)?;
        Some(UserStats {
            user_id: user.user_id.clone(),
            total_points: user.total_points,
            level: user.level,
            next_level_progress: self.levels.progress_toward_next(user.total_points),
            achievements: user.achievements.iter().cloned().collect(),
            current_streak: user.current_streak,
            longest_streak: user.longest_streak,
            last_active: user.last_active,
        })
    }

    /// Ranked, annotated top `limit` for a period key. Ties keep an
    /// unspecified relative order.
    pub fn leaderboard(&self, period: &str, limit: usize) -> Vec<LeaderboardEntry> {
        self.boards
            .top(period, limit)
            .into_iter()
            .enumerate()
            .map(|(index, (user_id, points))| {
                let rank = index as u32 + 1;
                let (level, achievement_count) = self
                    .users
                    .get(&user_id)
                    .map(|u| (u.level, u.achievements.len()))
                    .unwrap_or((1, 0));
                LeaderboardEntry {
                    rank,
                    user_id,
                    points,
                    level,
                    achievement_count,
                    badge: RankBadge::for_rank(rank),
                }
            })
            .collect()
    }

    pub fn recent_events(&self, count: usize) -> Vec<EventRecord> {
        self.events.recent(count)
    }

    pub fn achievement_catalog(&self) -> &[AchievementDef] {
        &self.achievements
    }

    /// Catalog entries the user has not unlocked yet.
    pub fn achievements_available(&self, user_id: &str) -> Vec<&AchievementDef> {
        let unlocked = self.users.get(user_id).map(|u| &u.achievements);
        self.achievements
            .iter()
            .filter(|def| unlocked.map(|set| !set.contains(&def.id)).unwrap_or(true))
            .collect()
    }

    pub fn challenge_defs(&self) -> impl Iterator<Item = &ChallengeDef> {
        self.challenges.values().map(|s| &s.def)
    }

    pub fn challenge_state(&self, challenge_id: &str) -> Option<&ChallengeState> {
        self.challenges.get(challenge_id)
    }

    pub fn action_points(&self) -> &ActionPoints {
        &self.actions
    }

    pub fn level_table(&self) -> &LevelTable {
        &self.levels
    }

    pub fn user_count(&self) -> usize {
        self.users.len()
    }

    /// Drop stale week/month leaderboard buckets. The all-time bucket
    /// always survives. Returns how many buckets were removed.
    pub fn prune_periods(&mut self, keep: &[String]) -> usize {
        self.boards.prune_periods(keep)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 8, 4, 12, 0, 0).unwrap()
    }

    fn engine() -> GamificationEngine {
        GamificationEngine::new(EngineCatalog::seeded_at(now())).unwrap()
    }

    #[test]
    fn test_award_creates_user_and_returns_outcome() {
        let mut e = engine();
        let outcome = e.award_points_at("u1", "completeProfile", None, now()).unwrap();
        assert_eq!(outcome.points_awarded, 50);
        assert_eq!(outcome.total_points, 50);
        assert_eq!(outcome.level, 1);
        assert!(!outcome.leveled_up);
        assert_eq!(e.user_stats("u1").unwrap().total_points, 50);
    }

    #[test]
    fn test_unknown_action_is_a_noop() {
        let mut e = engine();
        assert!(e.award_points_at("u1", "notAThing", None, now()).is_none());
        assert!(e.user_stats("u1").is_none(), "no-op must not create the user");
        assert!(e.recent_events(10).is_empty());
    }

    #[test]
    fn test_explicit_amount_overrides_table() {
        let mut e = engine();
        let outcome = e.award_points_at("u1", "manualAdjustment", Some(60), now()).unwrap();
        assert_eq!(outcome.points_awarded, 60);
    }

    #[test]
    fn test_level_up_fires_once_across_threshold() {
        let mut e = engine();
        e.award_points_at("u1", "completeProfile", None, now()).unwrap();
        let outcome = e.award_points_at("u1", "bonus", Some(60), now()).unwrap();
        assert_eq!(outcome.total_points, 110);
        assert_eq!(outcome.level, 2);
        assert!(outcome.leveled_up);
        // Progress now points at the level-3 threshold of 300.
        assert_eq!(outcome.next_level_progress.next_level.unwrap().min_points, 300);

        let events = e.recent_events(10);
        let level_ups = events
            .iter()
            .filter(|r| matches!(r.event, ProgressEvent::LevelUp { .. }))
            .count();
        assert_eq!(level_ups, 1);
    }

    #[test]
    fn test_achievement_unlock_pays_reward_and_is_idempotent() {
        let mut e = engine();
        let ctx = ProgressContext::default().with_readiness_score(85);

        let first = e.check_achievements_at("u1", &ctx, now());
        assert_eq!(first, vec!["ready_to_raise".to_string()]);
        // 100-point reward flowed through the ledger.
        assert_eq!(e.user_stats("u1").unwrap().total_points, 100);

        let second = e.check_achievements_at("u1", &ctx, now());
        assert!(second.is_empty());
        assert_eq!(e.user_stats("u1").unwrap().total_points, 100);

        let available = e.achievements_available("u1");
        assert_eq!(available.len(), e.achievement_catalog().len() - 1);
        assert!(available.iter().all(|d| d.id != "ready_to_raise"));
    }

    #[test]
    fn test_streak_bonus_and_achievement_on_day_seven() {
        let mut e = engine();
        let base = now();
        for n in 0..7 {
            e.update_streak_at("u2", base + chrono::Duration::days(n));
        }
        let stats = e.user_stats("u2").unwrap();
        assert_eq!(stats.current_streak, 7);
        // 50 weekly bonus + 100 week_warrior reward.
        assert_eq!(stats.total_points, 150);
        assert!(stats.achievements.contains(&"week_warrior".to_string()));
    }

    #[test]
    fn test_streak_report_lists_unlocks() {
        let mut e = engine();
        let base = now();
        let mut last = None;
        for n in 0..7 {
            last = Some(e.update_streak_at("u2", base + chrono::Duration::days(n)));
        }
        let report = last.unwrap();
        assert!(report.streak.weekly_bonus);
        assert_eq!(report.unlocked, vec!["week_warrior".to_string()]);
    }

    #[test]
    fn test_join_unknown_challenge() {
        let mut e = engine();
        let err = e.join_challenge_at("u1", "nope", now()).unwrap_err();
        assert!(matches!(err, GamifyError::ChallengeNotFound(_)));
    }

    #[test]
    fn test_challenge_completion_pays_once() {
        let mut e = engine();
        e.join_challenge_at("u3", "weekly_investor", now()).unwrap();

        assert!(e.update_challenge_progress_at("u3", "investments", 1, now()).is_empty());
        assert!(e.update_challenge_progress_at("u3", "investments", 1, now()).is_empty());
        let done = e.update_challenge_progress_at("u3", "investments", 1, now());
        assert_eq!(done, vec!["weekly_investor".to_string()]);

        let total_after = e.user_stats("u3").unwrap().total_points;
        assert_eq!(total_after, 200);

        // Fourth update is a no-op for the completed challenge.
        assert!(e.update_challenge_progress_at("u3", "investments", 1, now()).is_empty());
        assert_eq!(e.user_stats("u3").unwrap().total_points, total_after);
        assert_eq!(e.challenge_state("weekly_investor").unwrap().completions, 1);
    }

    #[test]
    fn test_one_metric_update_can_complete_multiple_challenges() {
        let mut e = engine();
        e.join_challenge_at("u4", "weekly_investor", now()).unwrap();
        e.join_challenge_at("u4", "monthly_backer", now()).unwrap();

        let done = e.update_challenge_progress_at("u4", "investments", 10, now());
        assert_eq!(done.len(), 2, "both investment challenges complete");
    }

    #[test]
    fn test_leaderboard_ranks_and_badges() {
        let mut e = engine();
        e.award_points_at("u1", "x", Some(500), now());
        e.award_points_at("u2", "x", Some(300), now());
        e.award_points_at("u3", "x", Some(300), now());
        e.award_points_at("u4", "x", Some(10), now());

        let board = e.leaderboard(crate::leaderboard::ALL_TIME_KEY, 3);
        assert_eq!(board.len(), 3);
        assert_eq!(board[0].user_id, "u1");
        assert_eq!(board[0].rank, 1);
        assert_eq!(board[0].badge, Some(RankBadge::Gold));
        assert_eq!(board[1].points, 300);
        assert_eq!(board[2].points, 300);
    }

    #[test]
    fn test_event_callback_receives_emissions() {
        use std::sync::{Arc, Mutex};
        let seen = Arc::new(Mutex::new(0usize));
        let sink = seen.clone();

        let mut e = engine();
        e.set_event_callback(move |_| {
            *sink.lock().unwrap() += 1;
        });
        e.award_points_at("u1", "completeProfile", None, now());
        assert_eq!(*seen.lock().unwrap(), 1);
    }
}
