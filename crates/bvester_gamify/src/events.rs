//! Emitted progression events
//!
//! Operations return explicit result structs; events are a secondary
//! channel for callers that want fire-and-forget notification fan-out
//! (push, email, WhatsApp are all the hosting service's problem). The log
//! keeps a bounded history of recent events for inspection and replay
//! tooling.

use chrono::{DateTime, Utc};
use serde::Serialize;
use std::collections::VecDeque;

/// Events kept in the in-memory history.
const MAX_EVENT_HISTORY: usize = 1000;

/// Something the engine did that a user might want to hear about.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "event", rename_all = "camelCase")]
pub enum ProgressEvent {
    #[serde(rename_all = "camelCase")]
    PointsAwarded {
        user_id: String,
        action: String,
        points: u64,
        total_points: u64,
    },
    #[serde(rename_all = "camelCase")]
    LevelUp {
        user_id: String,
        level: u32,
        previous_level: u32,
    },
    #[serde(rename_all = "camelCase")]
    AchievementUnlocked {
        user_id: String,
        achievement_id: String,
        point_reward: u64,
    },
    #[serde(rename_all = "camelCase")]
    ChallengeCompleted {
        user_id: String,
        challenge_id: String,
        point_reward: u64,
    },
}

impl ProgressEvent {
    pub fn user_id(&self) -> &str {
        match self {
            ProgressEvent::PointsAwarded { user_id, .. }
            | ProgressEvent::LevelUp { user_id, .. }
            | ProgressEvent::AchievementUnlocked { user_id, .. }
            | ProgressEvent::ChallengeCompleted { user_id, .. } => user_id,
        }
    }
}

/// An event stamped with an id and emission time.
#[derive(Debug, Clone, Serialize)]
pub struct EventRecord {
    pub id: String,
    pub at: DateTime<Utc>,
    #[serde(flatten)]
    pub event: ProgressEvent,
}

impl EventRecord {
    fn new(event: ProgressEvent, at: DateTime<Utc>) -> Self {
        Self {
            id: format!("{}-{}", at.timestamp(), uuid::Uuid::new_v4()),
            at,
            event,
        }
    }
}

type EventCallback = Box<dyn Fn(&EventRecord) + Send + Sync>;

/// Bounded event history plus an optional caller-supplied callback.
#[derive(Default)]
pub struct EventLog {
    history: VecDeque<EventRecord>,
    callback: Option<EventCallback>,
}

impl EventLog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Install the notification callback. Replaces any previous one.
    pub fn set_callback<F>(&mut self, callback: F)
    where
        F: Fn(&EventRecord) + Send + Sync + 'static,
    {
        self.callback = Some(Box::new(callback));
    }

    pub fn emit(&mut self, event: ProgressEvent, at: DateTime<Utc>) {
        let record = EventRecord::new(event, at);
        if let Some(callback) = &self.callback {
            callback(&record);
        }
        self.history.push_back(record);
        if self.history.len() > MAX_EVENT_HISTORY {
            self.history.pop_front();
        }
    }

    /// The most recent `count` events, newest first.
    pub fn recent(&self, count: usize) -> Vec<EventRecord> {
        self.history.iter().rev().take(count).cloned().collect()
    }

    pub fn len(&self) -> usize {
        self.history.len()
    }

    pub fn is_empty(&self) -> bool {
        self.history.is_empty()
    }
}

impl std::fmt::Debug for EventLog {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EventLog")
            .field("history", &self.history.len())
            .field("callback", &self.callback.is_some())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::{Arc, Mutex};

    fn sample(user: &str) -> ProgressEvent {
        ProgressEvent::PointsAwarded {
            user_id: user.to_string(),
            action: "dailyLogin".to_string(),
            points: 5,
            total_points: 5,
        }
    }

    #[test]
    fn test_emit_records_history_newest_first() {
        let mut log = EventLog::new();
        log.emit(sample("u1"), Utc::now());
        log.emit(sample("u2"), Utc::now());

        let recent = log.recent(10);
        assert_eq!(recent.len(), 2);
        assert_eq!(recent[0].event.user_id(), "u2");
        assert_eq!(recent[1].event.user_id(), "u1");
    }

    #[test]
    fn test_history_is_bounded() {
        let mut log = EventLog::new();
        for i in 0..(MAX_EVENT_HISTORY + 50) {
            log.emit(sample(&format!("u{}", i)), Utc::now());
        }
        assert_eq!(log.len(), MAX_EVENT_HISTORY);
        // The earliest events were dropped.
        let oldest = log.history.front().unwrap();
        assert_eq!(oldest.event.user_id(), "u50");
    }

    #[test]
    fn test_callback_sees_every_event() {
        let seen = Arc::new(Mutex::new(Vec::new()));
        let sink = seen.clone();

        let mut log = EventLog::new();
        log.set_callback(move |record| {
            sink.lock().unwrap().push(record.event.user_id().to_string());
        });
        log.emit(sample("u1"), Utc::now());
        log.emit(sample("u2"), Utc::now());

        assert_eq!(*seen.lock().unwrap(), vec!["u1", "u2"]);
    }

    #[test]
    fn test_event_json_uses_platform_names() {
        let json = serde_json::to_value(sample("u1")).unwrap();
        assert_eq!(json.get("event").unwrap(), "pointsAwarded");
        assert!(json.get("totalPoints").is_some());

        let level_up = ProgressEvent::LevelUp {
            user_id: "u1".to_string(),
            level: 2,
            previous_level: 1,
        };
        let json = serde_json::to_value(level_up).unwrap();
        assert_eq!(json.get("event").unwrap(), "levelUp");
    }
}
