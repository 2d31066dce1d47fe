//! Subcommand implementations

use anyhow::Result;
use owo_colors::OwoColorize;
use std::path::Path;

use bvester_gamify::{
    EngineCatalog, GamificationEngine, ProgressEvent, ALL_TIME_KEY,
};

use crate::replay;

fn load_catalog(path: Option<&Path>) -> Result<EngineCatalog> {
    match path {
        Some(path) => EngineCatalog::load(path),
        None => Ok(EngineCatalog::seeded()),
    }
}

pub fn catalog(path: Option<&Path>) -> Result<()> {
    let catalog = load_catalog(path)?;

    println!("{}", "Actions".bold());
    let mut actions: Vec<_> = catalog.actions.iter().collect();
    actions.sort();
    for (action, points) in actions {
        println!("  {:<28} {:>6} pts", action, points);
    }

    println!("\n{}", "Levels".bold());
    for row in &catalog.levels {
        println!(
            "  level {:>2}  {:>6}+ pts  {}",
            row.level,
            row.min_points,
            row.perks.join(", ").dimmed()
        );
    }

    println!("\n{}", "Achievements".bold());
    for def in &catalog.achievements {
        println!(
            "  {:<20} {:<24} {:>6} pts  {:?} of {} criteria",
            def.id,
            def.name,
            def.point_reward,
            def.combinator,
            def.criteria.len()
        );
    }

    println!("\n{}", "Challenges".bold());
    for def in &catalog.challenges {
        println!(
            "  {:<20} {:<10} target {:>4}  {:>6} pts  {} .. {}",
            def.id,
            def.metric,
            def.target,
            def.point_reward,
            def.starts_at.format("%Y-%m-%d"),
            def.ends_at.format("%Y-%m-%d")
        );
    }

    Ok(())
}

pub fn replay(
    catalog_path: Option<&Path>,
    file: &Path,
    user: Option<&str>,
    period: Option<&str>,
    limit: usize,
    json: bool,
) -> Result<()> {
    let catalog = load_catalog(catalog_path)?;
    let mut engine = GamificationEngine::new(catalog)?;

    let events = replay::load_events(file)?;
    let report = replay::drive(&mut engine, &events);

    let mut emitted = engine.recent_events(usize::MAX);
    emitted.reverse();

    if json {
        for record in &emitted {
            println!("{}", serde_json::to_string(record)?);
        }
        return Ok(());
    }

    println!(
        "{} {} events, {} users",
        "Replayed".bold(),
        report.processed,
        engine.user_count()
    );
    for skipped in &report.skipped {
        println!("  {} {}", "skipped:".yellow(), skipped);
    }

    for record in &emitted {
        match &record.event {
            ProgressEvent::LevelUp { user_id, level, .. } => {
                println!("  {} {} reached level {}", "level-up".green(), user_id, level);
            }
            ProgressEvent::AchievementUnlocked {
                user_id,
                achievement_id,
                point_reward,
            } => {
                println!(
                    "  {} {} unlocked '{}' (+{} pts)",
                    "unlock".cyan(),
                    user_id,
                    achievement_id,
                    point_reward
                );
            }
            ProgressEvent::ChallengeCompleted {
                user_id,
                challenge_id,
                point_reward,
            } => {
                println!(
                    "  {} {} completed '{}' (+{} pts)",
                    "challenge".magenta(),
                    user_id,
                    challenge_id,
                    point_reward
                );
            }
            ProgressEvent::PointsAwarded { .. } => {}
        }
    }

    if let Some(user_id) = user {
        println!();
        match engine.user_stats(user_id) {
            Some(stats) => {
                println!("{} {}", "Stats for".bold(), user_id);
                println!(
                    "  {} pts, level {} ({}% to next), streak {} (best {})",
                    stats.total_points,
                    stats.level,
                    stats.next_level_progress.percentage,
                    stats.current_streak,
                    stats.longest_streak
                );
                if !stats.achievements.is_empty() {
                    println!("  achievements: {}", stats.achievements.join(", "));
                }
            }
            None => println!("{} no such user in this replay", "warning:".yellow()),
        }
    }

    let period = period.unwrap_or(ALL_TIME_KEY);
    let board = engine.leaderboard(period, limit);
    println!("\n{} ({})", "Leaderboard".bold(), period);
    if board.is_empty() {
        println!("  empty");
    }
    for entry in board {
        let badge = entry.badge.map(|b| b.symbol()).unwrap_or(" ");
        println!(
            "  {:>3}. {} {:<16} {:>7} pts  level {:>2}  {} achievements",
            entry.rank,
            badge,
            entry.user_id,
            entry.points,
            entry.level,
            entry.achievement_count
        );
    }

    Ok(())
}
