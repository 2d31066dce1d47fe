//! Progression Simulator - deterministic multi-user scenarios
//!
//! Usage:
//!   progression_sim --users 8 --days 45 --scenario steady
//!   progression_sim --users 8 --days 45 --scenario churny
//!   progression_sim --users 8 --days 45 --scenario whale
//!
//! Outputs machine-readable JSON reports to ./artifacts/simulations/

use chrono::{DateTime, Duration, TimeZone, Utc};
use serde::Serialize;
use std::fs;
use std::path::PathBuf;
use std::sync::{Arc, Mutex};

use bvester_gamify::{
    EngineCatalog, GamificationEngine, ProgressEvent, ALL_TIME_KEY,
};

// ============================================================================
// REPORT TYPES
// ============================================================================

#[derive(Debug, Clone, Serialize)]
struct TopEntry {
    user_id: String,
    points: u64,
    level: u32,
    achievement_count: usize,
}

#[derive(Debug, Clone, Serialize)]
struct SimulationReport {
    scenario: String,
    user_count: usize,
    days: i64,
    points_events: usize,
    level_ups: usize,
    achievements_unlocked: usize,
    challenges_completed: usize,
    longest_streak_seen: u32,
    top_entries: Vec<TopEntry>,
    success: bool,
    notes: String,
}

#[derive(Debug, Default)]
struct EventCounters {
    points_events: usize,
    level_ups: usize,
    achievements_unlocked: usize,
    challenges_completed: usize,
}

// ============================================================================
// SIMULATOR LOGIC
// ============================================================================

/// Monday, 2026-01-05. Fixed so every run produces identical output.
fn epoch() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2026, 1, 5, 10, 0, 0).unwrap()
}

fn counting_engine(counters: Arc<Mutex<EventCounters>>) -> GamificationEngine {
    let mut engine =
        GamificationEngine::new(EngineCatalog::seeded_at(epoch())).expect("seeded catalog");
    engine.set_event_callback(move |record| {
        let mut counters = counters.lock().unwrap();
        match record.event {
            ProgressEvent::PointsAwarded { .. } => counters.points_events += 1,
            ProgressEvent::LevelUp { .. } => counters.level_ups += 1,
            ProgressEvent::AchievementUnlocked { .. } => counters.achievements_unlocked += 1,
            ProgressEvent::ChallengeCompleted { .. } => counters.challenges_completed += 1,
        }
    });
    engine
}

fn finish_report(
    scenario: &str,
    engine: &GamificationEngine,
    counters: &EventCounters,
    user_count: usize,
    days: i64,
    notes: String,
) -> SimulationReport {
    let top_entries: Vec<TopEntry> = engine
        .leaderboard(ALL_TIME_KEY, 5)
        .into_iter()
        .map(|entry| TopEntry {
            user_id: entry.user_id,
            points: entry.points,
            level: entry.level,
            achievement_count: entry.achievement_count,
        })
        .collect();

    let longest_streak_seen = (0..user_count)
        .filter_map(|i| engine.user_stats(&format!("user_{:03}", i)))
        .map(|s| s.longest_streak)
        .max()
        .unwrap_or(0);

    // Sanity checks every scenario must satisfy.
    let ranked_descending = top_entries.windows(2).all(|w| w[0].points >= w[1].points);
    let success = ranked_descending && counters.points_events > 0;

    SimulationReport {
        scenario: scenario.to_string(),
        user_count,
        days,
        points_events: counters.points_events,
        level_ups: counters.level_ups,
        achievements_unlocked: counters.achievements_unlocked,
        challenges_completed: counters.challenges_completed,
        longest_streak_seen,
        top_entries,
        success,
        notes,
    }
}

/// Everyone logs in daily and invests every third day. Exercises streak
/// bonuses, streak achievements, and the seeded investment challenges.
fn simulate_steady(user_count: usize, days: i64) -> SimulationReport {
    let counters = Arc::new(Mutex::new(EventCounters::default()));
    let mut engine = counting_engine(counters.clone());

    for i in 0..user_count {
        let user = format!("user_{:03}", i);
        engine
            .join_challenge_at(&user, "weekly_investor", epoch())
            .expect("challenge window covers the epoch");
        engine
            .join_challenge_at(&user, "monthly_backer", epoch())
            .expect("challenge window covers the epoch");
    }

    for day in 0..days {
        let now = epoch() + Duration::days(day);
        for i in 0..user_count {
            let user = format!("user_{:03}", i);
            engine.update_streak_at(&user, now);
            engine.award_points_at(&user, "dailyLogin", None, now);
            if day % 3 == i as i64 % 3 {
                engine.award_points_at(&user, "investmentMade", None, now);
                engine.update_challenge_progress_at(&user, "investments", 1, now);
            }
        }
    }

    let counters = counters.lock().unwrap();
    let notes = format!(
        "Every user logged in daily for {} days and invested every third day.",
        days
    );
    finish_report("steady", &engine, &counters, user_count, days, notes)
}

/// Users miss days on a staggered cadence, so streaks break and rebuild.
fn simulate_churny(user_count: usize, days: i64) -> SimulationReport {
    let counters = Arc::new(Mutex::new(EventCounters::default()));
    let mut engine = counting_engine(counters.clone());

    for day in 0..days {
        let now = epoch() + Duration::days(day);
        for i in 0..user_count {
            // User i skips every (i % 4 + 3)rd day.
            let cadence = (i % 4 + 3) as i64;
            if day % cadence == 0 && day > 0 {
                continue;
            }
            let user = format!("user_{:03}", i);
            engine.update_streak_at(&user, now);
            engine.award_points_at(&user, "dailyLogin", None, now);
        }
    }

    let counters = counters.lock().unwrap();
    let notes = "Staggered skip days: streaks break, longest-streak high-water marks survive."
        .to_string();
    finish_report("churny", &engine, &counters, user_count, days, notes)
}

/// One user does everything; the rest barely show up. Exercises the
/// leaderboard spread and badge assignment.
fn simulate_whale(user_count: usize, days: i64) -> SimulationReport {
    let counters = Arc::new(Mutex::new(EventCounters::default()));
    let mut engine = counting_engine(counters.clone());

    let whale = "user_000";
    engine
        .join_challenge_at(whale, "weekly_investor", epoch())
        .expect("challenge window covers the epoch");

    for day in 0..days {
        let now = epoch() + Duration::days(day);

        engine.update_streak_at(whale, now);
        engine.award_points_at(whale, "investmentMade", None, now);
        engine.update_challenge_progress_at(whale, "investments", 1, now);

        // Everyone else logs in once a week.
        for i in 1..user_count {
            if day % 7 == 0 {
                let user = format!("user_{:03}", i);
                engine.update_streak_at(&user, now);
                engine.award_points_at(&user, "dailyLogin", None, now);
            }
        }
    }

    let counters = counters.lock().unwrap();
    let notes = format!("{} invested daily; everyone else logged in weekly.", whale);
    finish_report("whale", &engine, &counters, user_count, days, notes)
}

// ============================================================================
// MAIN
// ============================================================================

fn main() {
    let args: Vec<String> = std::env::args().collect();

    let mut users = 8usize;
    let mut days = 45i64;
    let mut scenario = "steady".to_string();

    let mut i = 1;
    while i < args.len() {
        match args[i].as_str() {
            "--users" => {
                if i + 1 < args.len() {
                    users = args[i + 1].parse().unwrap_or(8);
                    i += 2;
                } else {
                    eprintln!("Error: --users requires a value");
                    std::process::exit(1);
                }
            }
            "--days" => {
                if i + 1 < args.len() {
                    days = args[i + 1].parse().unwrap_or(45);
                    i += 2;
                } else {
                    eprintln!("Error: --days requires a value");
                    std::process::exit(1);
                }
            }
            "--scenario" => {
                if i + 1 < args.len() {
                    scenario = args[i + 1].clone();
                    i += 2;
                } else {
                    eprintln!("Error: --scenario requires a value");
                    std::process::exit(1);
                }
            }
            "--help" | "-h" => {
                println!("Progression Simulator");
                println!();
                println!("Usage:");
                println!("  progression_sim --users <N> --days <D> --scenario <scenario>");
                println!();
                println!("Options:");
                println!("  --users <N>           Number of users (2-50, default: 8)");
                println!("  --days <D>            Simulated days (7-365, default: 45)");
                println!("  --scenario <scenario> Scenario: steady, churny, whale");
                std::process::exit(0);
            }
            _ => {
                eprintln!("Error: Unknown argument: {}", args[i]);
                eprintln!("Run with --help for usage");
                std::process::exit(1);
            }
        }
    }

    if !(2..=50).contains(&users) {
        eprintln!("Error: users must be between 2 and 50");
        std::process::exit(1);
    }
    if !(7..=365).contains(&days) {
        eprintln!("Error: days must be between 7 and 365");
        std::process::exit(1);
    }

    let report = match scenario.as_str() {
        "steady" => simulate_steady(users, days),
        "churny" => simulate_churny(users, days),
        "whale" => simulate_whale(users, days),
        _ => {
            eprintln!("Error: Unknown scenario: {}", scenario);
            eprintln!("Valid scenarios: steady, churny, whale");
            std::process::exit(1);
        }
    };

    let output_dir = PathBuf::from("./artifacts/simulations");
    fs::create_dir_all(&output_dir).unwrap();

    let output_file = output_dir.join(format!("{}.json", scenario));
    let json = serde_json::to_string_pretty(&report).unwrap();
    fs::write(&output_file, json).unwrap();

    println!("Scenario:     {}", report.scenario);
    println!("Users/days:   {}/{}", report.user_count, report.days);
    println!("Point events: {}", report.points_events);
    println!("Level-ups:    {}", report.level_ups);
    println!("Unlocks:      {}", report.achievements_unlocked);
    println!("Completions:  {}", report.challenges_completed);
    println!("Best streak:  {}", report.longest_streak_seen);
    println!("Report:       {}", output_file.display());

    if !report.success {
        eprintln!("Simulation failed its sanity checks");
        std::process::exit(1);
    }
}
