//! Due-date reminders.
//!
//! Each threshold is a half-open window `(lower, upper]` of hours before the
//! due date. A task fires a threshold at most once; fired thresholds are kept
//! in a [`ReminderState`] until the task disappears or is completed.
//!
//! A poll that runs at a fixed interval cannot skip a window as long as the
//! interval is shorter than [`SMALLEST_WINDOW`].

use crate::domain::task::{Task, TaskId};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::{
    collections::{BTreeMap, BTreeSet},
    fmt,
    time::Duration,
};

/// Width of the narrowest threshold window
pub const SMALLEST_WINDOW: Duration = Duration::from_secs(60 * 60);

const MILLIS_PER_HOUR: f64 = 3_600_000.0;

/// Reminder thresholds, stored as their tags
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum ReminderThreshold {
    #[serde(rename = "1d")]
    OneDay,
    #[serde(rename = "1h")]
    OneHour,
}

impl ReminderThreshold {
    pub const ALL: [ReminderThreshold; 2] = [Self::OneDay, Self::OneHour];

    pub fn tag(&self) -> &'static str {
        match self {
            Self::OneDay => "1d",
            Self::OneHour => "1h",
        }
    }

    /// Exclusive lower and inclusive upper bound, in hours until due
    pub fn window(&self) -> (f64, f64) {
        match self {
            Self::OneDay => (23.0, 24.0),
            Self::OneHour => (0.0, 1.0),
        }
    }

    pub fn contains(&self, hours_until_due: f64) -> bool {
        let (lower, upper) = self.window();
        hours_until_due > lower && hours_until_due <= upper
    }

    /// Notification title for this threshold
    pub fn title(&self) -> &'static str {
        match self {
            Self::OneDay => "Reminder: Task due in 1 day",
            Self::OneHour => "Reminder: Task due in 1 hour",
        }
    }
}

impl fmt::Display for ReminderThreshold {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.tag())
    }
}

/// Fired thresholds per task
pub type ReminderState = BTreeMap<TaskId, BTreeSet<ReminderThreshold>>;

/// A notification the caller should hand to the notification sink
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NotificationRequest {
    pub task_id: TaskId,
    pub threshold: ReminderThreshold,
    pub title: String,
    pub body: String,
}

/// Result of one reminder pass
#[derive(Debug, Clone, Default)]
pub struct ReminderCheck {
    pub firings: Vec<NotificationRequest>,
    pub state: ReminderState,
    /// Whether `state` differs from the input and needs persisting
    pub changed: bool,
}

/// Signed hours from `now` until `due`; positive when due is in the future
pub fn hours_until(due: DateTime<Utc>, now: DateTime<Utc>) -> f64 {
    (due - now).num_milliseconds() as f64 / MILLIS_PER_HOUR
}

/// Computes which reminders fire at `now` and the resulting reminder state.
///
/// Completed and undated tasks never fire. Entries for tasks that are gone
/// or completed are dropped from the returned state.
pub fn check_reminders(tasks: &[Task], state: &ReminderState, now: DateTime<Utc>) -> ReminderCheck {
    let mut next = state.clone();
    let mut firings = Vec::new();

    for task in tasks {
        if task.completed {
            continue;
        }
        let Some(due) = task.date else {
            continue;
        };

        let hours = hours_until(due, now);
        let fired = next.get(&task.id);
        let threshold = ReminderThreshold::ALL.into_iter().find(|threshold| {
            threshold.contains(hours) && !fired.is_some_and(|tags| tags.contains(threshold))
        });

        if let Some(threshold) = threshold {
            firings.push(NotificationRequest {
                task_id: task.id.clone(),
                threshold,
                title: threshold.title().to_string(),
                body: task.title.clone(),
            });
            next.entry(task.id.clone()).or_default().insert(threshold);
        }
    }

    next.retain(|id, _| {
        tasks
            .iter()
            .find(|t| &t.id == id)
            .is_some_and(|t| !t.completed)
    });

    let changed = &next != state;
    ReminderCheck {
        firings,
        state: next,
        changed,
    }
}
