//! Level thresholds and the level calculator
//!
//! A user's level is never stored authoritatively; it is always
//! `max { level : min_points <= total_points }` over the threshold table
//! and recomputed on every point change.

use serde::{Deserialize, Serialize};

use crate::error::GamifyError;

/// One row of the level table.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LevelThreshold {
    pub level: u32,
    pub min_points: u64,
    #[serde(default)]
    pub perks: Vec<String>,
}

/// Progress toward the next level, for display surfaces.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LevelProgress {
    /// 0..=100, rounded. 100 at the top level.
    pub percentage: u8,
    pub points_needed: u64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub next_level: Option<LevelThreshold>,
}

/// Validated, ascending level table.
#[derive(Debug, Clone)]
pub struct LevelTable {
    thresholds: Vec<LevelThreshold>,
}

impl LevelTable {
    /// Build a table from rows, sorting by level and validating the
    /// invariants: non-empty, unique levels, `min_points` strictly
    /// increasing, and a zero-point floor so every user holds a level.
    pub fn new(mut thresholds: Vec<LevelThreshold>) -> Result<Self, GamifyError> {
        if thresholds.is_empty() {
            return Err(GamifyError::InvalidCatalog(
                "level table must not be empty".to_string(),
            ));
        }

        thresholds.sort_by_key(|t| t.level);

        for pair in thresholds.windows(2) {
            if pair[0].level == pair[1].level {
                return Err(GamifyError::InvalidCatalog(format!(
                    "duplicate level {}",
                    pair[0].level
                )));
            }
            if pair[0].min_points >= pair[1].min_points {
                return Err(GamifyError::InvalidCatalog(format!(
                    "min_points must be strictly increasing (level {} -> {})",
                    pair[0].level, pair[1].level
                )));
            }
        }

        if thresholds[0].min_points != 0 {
            return Err(GamifyError::InvalidCatalog(format!(
                "lowest level {} must start at 0 points",
                thresholds[0].level
            )));
        }

        Ok(Self { thresholds })
    }

    /// Level for a point total. Scans highest first, falls back to the
    /// lowest level. Pure lookup, monotonic in `points`.
    pub fn level_for(&self, points: u64) -> u32 {
        self.thresholds
            .iter()
            .rev()
            .find(|t| t.min_points <= points)
            .map(|t| t.level)
            .unwrap_or_else(|| self.thresholds[0].level)
    }

    /// Distance to the next threshold. At the top level the percentage is
    /// pinned to 100 with nothing left to earn.
    pub fn progress_toward_next(&self, points: u64) -> LevelProgress {
        let current = self.level_for(points);
        let next = self.thresholds.iter().find(|t| t.level > current);

        match next {
            Some(next) => {
                let floor = self
                    .thresholds
                    .iter()
                    .find(|t| t.level == current)
                    .map(|t| t.min_points)
                    .unwrap_or(0);
                let span = next.min_points - floor;
                let into = points.saturating_sub(floor);
                let percentage = (((into as f64) / (span as f64)) * 100.0).round() as u8;

                LevelProgress {
                    percentage: percentage.min(100),
                    points_needed: next.min_points.saturating_sub(points),
                    next_level: Some(next.clone()),
                }
            }
            None => LevelProgress {
                percentage: 100,
                points_needed: 0,
                next_level: None,
            },
        }
    }

    pub fn max_level(&self) -> u32 {
        self.thresholds.last().map(|t| t.level).unwrap_or(1)
    }

    pub fn threshold(&self, level: u32) -> Option<&LevelThreshold> {
        self.thresholds.iter().find(|t| t.level == level)
    }

    pub fn rows(&self) -> &[LevelThreshold] {
        &self.thresholds
    }
}
