//! Event stream replay
//!
//! Input is one JSON object per line, in the order the platform recorded
//! them. Four shapes are understood: logins (streaks), actions (points +
//! achievement matching), challenge joins, and metric updates.

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use serde::Deserialize;
use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;

use bvester_gamify::{GamificationEngine, ProgressContext};

#[derive(Debug, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum ReplayEvent {
    /// Daily-activity ping; drives the streak tracker.
    #[serde(rename_all = "camelCase")]
    Login { user: String, at: DateTime<Utc> },

    /// Point-earning platform action, with optional matcher context.
    #[serde(rename_all = "camelCase")]
    Action {
        user: String,
        action: String,
        at: DateTime<Utc>,
        #[serde(default)]
        points: Option<u64>,
        #[serde(default)]
        context: Option<ProgressContext>,
    },

    #[serde(rename_all = "camelCase")]
    JoinChallenge {
        user: String,
        challenge: String,
        at: DateTime<Utc>,
    },

    #[serde(rename_all = "camelCase")]
    Metric {
        user: String,
        metric: String,
        #[serde(default = "one")]
        amount: u64,
        at: DateTime<Utc>,
    },
}

fn one() -> u64 {
    1
}

pub fn load_events(path: &Path) -> Result<Vec<ReplayEvent>> {
    let file = File::open(path)
        .with_context(|| format!("failed to open event file: {}", path.display()))?;

    let mut events = Vec::new();
    for (index, line) in BufReader::new(file).lines().enumerate() {
        let line = line.context("failed to read event file")?;
        if line.trim().is_empty() {
            continue;
        }
        let event: ReplayEvent = serde_json::from_str(&line)
            .with_context(|| format!("bad event on line {}", index + 1))?;
        events.push(event);
    }
    Ok(events)
}

#[derive(Debug, Default)]
pub struct ReplayReport {
    pub processed: usize,
    /// Join failures, collected as messages instead of aborting the run.
    pub skipped: Vec<String>,
}

pub fn drive(engine: &mut GamificationEngine, events: &[ReplayEvent]) -> ReplayReport {
    let mut report = ReplayReport::default();

    for event in events {
        match event {
            ReplayEvent::Login { user, at } => {
                engine.update_streak_at(user, *at);
            }
            ReplayEvent::Action {
                user,
                action,
                at,
                points,
                context,
            } => {
                engine.award_points_at(user, action, *points, *at);
                let mut ctx = context
                    .clone()
                    .unwrap_or_else(|| ProgressContext::for_action(action.clone()));
                if ctx.action.is_none() {
                    ctx.action = Some(action.clone());
                }
                engine.check_achievements_at(user, &ctx, *at);
            }
            ReplayEvent::JoinChallenge { user, challenge, at } => {
                if let Err(err) = engine.join_challenge_at(user, challenge, *at) {
                    report.skipped.push(format!("{}: {}", user, err));
                }
            }
            ReplayEvent::Metric {
                user,
                metric,
                amount,
                at,
            } => {
                engine.update_challenge_progress_at(user, metric, *amount, *at);
            }
        }
        report.processed += 1;
    }

    report
}

#[cfg(test)]
mod tests {
    use super::*;
    use bvester_gamify::EngineCatalog;
    use chrono::TimeZone;
    use std::io::Write;

    fn start() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 8, 4, 9, 0, 0).unwrap()
    }

    #[test]
    fn test_parses_all_event_shapes() {
        let lines = [
            r#"{"type":"login","user":"u1","at":"2026-08-04T09:00:00Z"}"#,
            r#"{"type":"action","user":"u1","action":"completeProfile","at":"2026-08-04T09:01:00Z"}"#,
            r#"{"type":"action","user":"u1","action":"readinessAssessment","at":"2026-08-04T09:02:00Z","context":{"readinessScore":82}}"#,
            r#"{"type":"joinChallenge","user":"u1","challenge":"weekly_investor","at":"2026-08-04T09:03:00Z"}"#,
            r#"{"type":"metric","user":"u1","metric":"investments","at":"2026-08-04T09:04:00Z"}"#,
        ];

        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "{}", lines.join("\n")).unwrap();

        let events = load_events(file.path()).unwrap();
        assert_eq!(events.len(), 5);
        assert!(matches!(events[0], ReplayEvent::Login { .. }));
        assert!(matches!(events[4], ReplayEvent::Metric { amount: 1, .. }));
    }

    #[test]
    fn test_drive_applies_points_and_achievements() {
        let mut engine =
            GamificationEngine::new(EngineCatalog::seeded_at(start())).unwrap();
        let events = vec![
            ReplayEvent::Login {
                user: "u1".to_string(),
                at: start(),
            },
            ReplayEvent::Action {
                user: "u1".to_string(),
                action: "completeProfile".to_string(),
                at: start(),
                points: None,
                context: None,
            },
        ];

        let report = drive(&mut engine, &events);
        assert_eq!(report.processed, 2);
        assert!(report.skipped.is_empty());

        let stats = engine.user_stats("u1").unwrap();
        // 50 for the action plus 25 for the profile_pro unlock.
        assert_eq!(stats.total_points, 75);
        assert_eq!(stats.current_streak, 1);
        assert!(stats.achievements.contains(&"profile_pro".to_string()));
    }

    #[test]
    fn test_drive_survives_bad_join() {
        let mut engine =
            GamificationEngine::new(EngineCatalog::seeded_at(start())).unwrap();
        let events = vec![ReplayEvent::JoinChallenge {
            user: "u1".to_string(),
            challenge: "ghost".to_string(),
            at: start(),
        }];

        let report = drive(&mut engine, &events);
        assert_eq!(report.processed, 1);
        assert_eq!(report.skipped.len(), 1);
    }
}
