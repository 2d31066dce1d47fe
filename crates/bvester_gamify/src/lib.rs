//! Bvester Gamification - progression engine for the Bvester platform
//!
//! Points, levels, achievements, challenges, streaks and leaderboards for
//! SME and investor activity. Pure in-process state and synchronous
//! execution: the hosting service owns persistence, notification
//! delivery, and per-user serialization of concurrent requests.

pub mod achievements;
pub mod challenges;
pub mod config;
pub mod engine;
pub mod error;
pub mod events;
pub mod leaderboard;
pub mod levels;
pub mod points;
pub mod streaks;
pub mod types;

pub use achievements::{AchievementDef, Combinator, Criterion};
pub use challenges::{ChallengeDef, ChallengeProgress};
pub use config::EngineCatalog;
pub use engine::{GamificationEngine, StreakReport};
pub use error::GamifyError;
pub use events::{EventRecord, ProgressEvent};
pub use leaderboard::{LeaderboardEntry, RankBadge, ALL_TIME_KEY};
pub use levels::{LevelProgress, LevelThreshold};
pub use points::AwardOutcome;
pub use streaks::{StreakChange, StreakUpdate};
pub use types::{ProgressContext, UserProgress, UserStats};
