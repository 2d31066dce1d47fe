//! Catalog loading and the seeded defaults
//!
//! The engine is constructed from an `EngineCatalog`: action point values,
//! level thresholds, achievement definitions, and challenge definitions.
//! Deployments ship a TOML file; the seeded catalog keeps development and
//! tests running without one.

use anyhow::{Context, Result};
use chrono::{DateTime, Datelike, Duration, NaiveDate, TimeZone, Utc};
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};
use std::fs;
use std::path::Path;
use tracing::info;

use crate::achievements::{AchievementDef, Combinator, Criterion};
use crate::challenges::ChallengeDef;
use crate::error::GamifyError;
use crate::levels::{LevelTable, LevelThreshold};

/// Everything injected into the engine at construction.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EngineCatalog {
    #[serde(default)]
    pub actions: HashMap<String, u64>,
    #[serde(default)]
    pub levels: Vec<LevelThreshold>,
    #[serde(default)]
    pub achievements: Vec<AchievementDef>,
    #[serde(default)]
    pub challenges: Vec<ChallengeDef>,
}

impl EngineCatalog {
    /// The built-in catalog, with recurring challenges anchored to the
    /// current week and month.
    pub fn seeded() -> Self {
        Self::seeded_at(Utc::now())
    }

    pub fn seeded_at(now: DateTime<Utc>) -> Self {
        Self {
            actions: seeded_actions(),
            levels: seeded_levels(),
            achievements: seeded_achievements(),
            challenges: seeded_challenges_at(now),
        }
    }

    /// Load and validate a catalog from a TOML file.
    pub fn load(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path)
            .with_context(|| format!("failed to read catalog file: {}", path.display()))?;

        let catalog: EngineCatalog =
            toml::from_str(&content).context("failed to parse catalog TOML")?;
        catalog.validate().context("catalog failed validation")?;

        info!(
            "catalog loaded: {} actions, {} levels, {} achievements, {} challenges",
            catalog.actions.len(),
            catalog.levels.len(),
            catalog.achievements.len(),
            catalog.challenges.len()
        );
        Ok(catalog)
    }

    /// Check cross-cutting invariants. Called by `load` and by engine
    /// construction.
    pub fn validate(&self) -> std::result::Result<(), GamifyError> {
        LevelTable::new(self.levels.clone())?;

        let mut seen = HashSet::new();
        for def in &self.achievements {
            if !seen.insert(def.id.as_str()) {
                return Err(GamifyError::InvalidCatalog(format!(
                    "duplicate achievement id '{}'",
                    def.id
                )));
            }
            if def.criteria.is_empty() {
                return Err(GamifyError::InvalidCatalog(format!(
                    "achievement '{}' has no criteria",
                    def.id
                )));
            }
        }

        let mut seen = HashSet::new();
        for def in &self.challenges {
            if !seen.insert(def.id.as_str()) {
                return Err(GamifyError::InvalidCatalog(format!(
                    "duplicate challenge id '{}'",
                    def.id
                )));
            }
            if def.starts_at >= def.ends_at {
                return Err(GamifyError::InvalidCatalog(format!(
                    "challenge '{}' window is empty",
                    def.id
                )));
            }
            if def.target == 0 {
                return Err(GamifyError::InvalidCatalog(format!(
                    "challenge '{}' target must be positive",
                    def.id
                )));
            }
        }

        Ok(())
    }
}

/// Point values for platform actions. Keys use the platform's event
/// names verbatim.
pub fn seeded_actions() -> HashMap<String, u64> {
    let mut values = HashMap::new();
    values.insert("completeProfile".to_string(), 50);
    values.insert("dailyLogin".to_string(), 5);
    values.insert("kycVerified".to_string(), 35);
    values.insert("businessProfileCreated".to_string(), 25);
    values.insert("readinessAssessment".to_string(), 30);
    values.insert("documentUploaded".to_string(), 10);
    values.insert("investmentMade".to_string(), 75);
    values.insert("referralJoined".to_string(), 40);
    values.insert("campaignShared".to_string(), 15);
    values.insert("weeklyStreakBonus".to_string(), 50);
    values.insert("monthlyStreakBonus".to_string(), 200);
    values
}

pub fn seeded_levels() -> Vec<LevelThreshold> {
    let row = |level, min_points, perks: &[&str]| LevelThreshold {
        level,
        min_points,
        perks: perks.iter().map(|p| p.to_string()).collect(),
    };
    vec![
        row(1, 0, &["Starter badge"]),
        row(2, 100, &["Profile spotlight eligibility"]),
        row(3, 300, &["Priority support queue"]),
        row(4, 600, &["Early access to new campaigns"]),
        row(5, 1_000, &["Reduced platform fees"]),
        row(6, 1_500, &["Investor matchmaking boost"]),
        row(7, 2_500, &["Quarterly growth report"]),
        row(8, 4_000, &["Dedicated account reviews"]),
        row(9, 6_000, &["Partner event invitations"]),
        row(10, 10_000, &["Ambassador status"]),
    ]
}

pub fn seeded_achievements() -> Vec<AchievementDef> {
    let action = |id: &str, name: &str, reward, action: &str, count| AchievementDef {
        id: id.to_string(),
        name: name.to_string(),
        point_reward: reward,
        combinator: Combinator::Any,
        criteria: vec![Criterion::ActionCount {
            action: action.to_string(),
            count,
        }],
    };
    let single = |id: &str, name: &str, reward, criterion| AchievementDef {
        id: id.to_string(),
        name: name.to_string(),
        point_reward: reward,
        combinator: Combinator::Any,
        criteria: vec![criterion],
    };
    vec![
        action("profile_pro", "Profile Pro", 25, "completeProfile", 1),
        action("first_investment", "First Investment", 50, "investmentMade", 1),
        action("serial_investor", "Serial Investor", 150, "investmentMade", 10),
        single("week_warrior", "Week Warrior", 100, Criterion::LoginStreak { min: 7 }),
        single(
            "monthly_regular",
            "Monthly Regular",
            300,
            Criterion::LoginStreak { min: 30 },
        ),
        single(
            "ready_to_raise",
            "Ready to Raise",
            100,
            Criterion::ReadinessScore { min: 80 },
        ),
        single(
            "capital_magnet",
            "Capital Magnet",
            200,
            Criterion::TotalFunding { min: 10_000 },
        ),
        single(
            "portfolio_builder",
            "Portfolio Builder",
            150,
            Criterion::PortfolioSize { min: 5 },
        ),
        single(
            "super_connector",
            "Super Connector",
            120,
            Criterion::ReferralCount { min: 10 },
        ),
    ]
}

/// Recurring challenges anchored to the week and month containing `now`.
pub fn seeded_challenges_at(now: DateTime<Utc>) -> Vec<ChallengeDef> {
    let (week_start, week_end) = week_window(now);
    let (month_start, month_end) = month_window(now);
    vec![
        ChallengeDef {
            id: "weekly_investor".to_string(),
            name: "Weekly Investor".to_string(),
            metric: "investments".to_string(),
            target: 3,
            point_reward: 200,
            starts_at: week_start,
            ends_at: week_end,
        },
        ChallengeDef {
            id: "weekly_networker".to_string(),
            name: "Weekly Networker".to_string(),
            metric: "referrals".to_string(),
            target: 5,
            point_reward: 150,
            starts_at: week_start,
            ends_at: week_end,
        },
        ChallengeDef {
            id: "monthly_backer".to_string(),
            name: "Monthly Backer".to_string(),
            metric: "investments".to_string(),
            target: 10,
            point_reward: 500,
            starts_at: month_start,
            ends_at: month_end,
        },
    ]
}

/// Monday 00:00 UTC through the following Monday.
fn week_window(now: DateTime<Utc>) -> (DateTime<Utc>, DateTime<Utc>) {
    let days_from_monday = now.weekday().num_days_from_monday() as i64;
    let monday = now.date_naive() - Duration::days(days_from_monday);
    let start = Utc.from_utc_datetime(&monday.and_hms_opt(0, 0, 0).unwrap());
    (start, start + Duration::days(7))
}

/// First of the month 00:00 UTC through the first of the next month.
fn month_window(now: DateTime<Utc>) -> (DateTime<Utc>, DateTime<Utc>) {
    let first = NaiveDate::from_ymd_opt(now.year(), now.month(), 1).unwrap();
    let next = if now.month() == 12 {
        NaiveDate::from_ymd_opt(now.year() + 1, 1, 1).unwrap()
    } else {
        NaiveDate::from_ymd_opt(now.year(), now.month() + 1, 1).unwrap()
    };
    (
        Utc.from_utc_datetime(&first.and_hms_opt(0, 0, 0).unwrap()),
        Utc.from_utc_datetime(&next.and_hms_opt(0, 0, 0).unwrap()),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use std::io::Write;

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 8, 4, 15, 30, 0).unwrap()
    }

    #[test]
    fn test_seeded_catalog_is_valid() {
        EngineCatalog::seeded_at(now()).validate().unwrap();
    }

    #[test]
    fn test_week_window_covers_now() {
        let (start, end) = week_window(now());
        assert!(start <= now() && now() < end);
        assert_eq!(end - start, Duration::days(7));
        assert_eq!(start.weekday(), chrono::Weekday::Mon);
    }

    #[test]
    fn test_month_window_december_rollover() {
        let december = Utc.with_ymd_and_hms(2026, 12, 15, 0, 0, 0).unwrap();
        let (start, end) = month_window(december);
        assert_eq!(start, Utc.with_ymd_and_hms(2026, 12, 1, 0, 0, 0).unwrap());
        assert_eq!(end, Utc.with_ymd_and_hms(2027, 1, 1, 0, 0, 0).unwrap());
    }

    #[test]
    fn test_validate_rejects_duplicate_achievement_ids() {
        let mut catalog = EngineCatalog::seeded_at(now());
        let dup = catalog.achievements[0].clone();
        catalog.achievements.push(dup);
        assert!(catalog.validate().is_err());
    }

    #[test]
    fn test_validate_rejects_empty_challenge_window() {
        let mut catalog = EngineCatalog::seeded_at(now());
        catalog.challenges[0].ends_at = catalog.challenges[0].starts_at;
        assert!(catalog.validate().is_err());
    }

    #[test]
    fn test_load_round_trip_through_toml_file() {
        let catalog = EngineCatalog::seeded_at(now());
        let text = toml::to_string_pretty(&catalog).unwrap();

        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(text.as_bytes()).unwrap();

        let loaded = EngineCatalog::load(file.path()).unwrap();
        assert_eq!(loaded.actions, catalog.actions);
        assert_eq!(loaded.levels.len(), catalog.levels.len());
        assert_eq!(loaded.achievements.len(), catalog.achievements.len());
        assert_eq!(loaded.challenges.len(), catalog.challenges.len());
    }

    #[test]
    fn test_load_rejects_bad_catalog() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        // Level table with no zero floor.
        file.write_all(b"[[levels]]\nlevel = 1\nmin_points = 10\n")
            .unwrap();
        assert!(EngineCatalog::load(file.path()).is_err());
    }
}
