use chrono::{Duration, NaiveDate};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use uuid::Uuid;

use crate::error::{OmniDoError, Result};

/// Days shown before today when a habit's start date cannot be parsed
const FALLBACK_HEATMAP_DAYS: i64 = 30;

/// A daily habit with a per-day goal and a progress history.
///
/// `progress` is the running count shown on the card; `history` records the
/// count reached on each local calendar day an increment happened.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Habit {
    pub id: String,
    pub title: String,
    #[serde(default)]
    pub streak: u32,
    pub goal: u32,
    #[serde(default)]
    pub progress: u32,
    /// `YYYY-MM-DD`; kept as text so a malformed value does not break the list
    #[serde(default)]
    pub start_date: String,
    #[serde(default)]
    pub history: BTreeMap<NaiveDate, u32>,
}

impl Habit {
    /// Creates a habit starting on `today` with a fresh ID
    pub fn new(title: impl Into<String>, goal: u32, today: NaiveDate) -> Result<Self> {
        validate_goal(goal)?;
        Ok(Self {
            id: Uuid::new_v4().simple().to_string(),
            title: title.into(),
            streak: 0,
            goal,
            progress: 0,
            start_date: today.format("%Y-%m-%d").to_string(),
            history: BTreeMap::new(),
        })
    }

    /// Changes title and goal; progress and history are kept
    pub fn edit(&mut self, title: impl Into<String>, goal: u32) -> Result<()> {
        validate_goal(goal)?;
        self.title = title.into();
        self.goal = goal;
        Ok(())
    }

    /// Records one step of progress on `today` and returns the new count.
    ///
    /// A single-step habit toggles between done and not done. Otherwise
    /// progress grows by one and stops at the goal.
    pub fn increment(&mut self, today: NaiveDate) -> u32 {
        self.progress = if self.goal == 1 {
            if self.progress == 1 {
                0
            } else {
                1
            }
        } else if self.progress < self.goal {
            self.progress + 1
        } else {
            self.progress
        };
        self.history.insert(today, self.progress);
        self.progress
    }

    pub fn is_completed(&self) -> bool {
        self.progress >= self.goal
    }

    /// Progress towards the goal in percent, capped at 100
    pub fn progress_percent(&self) -> f64 {
        (f64::from(self.progress) / f64::from(self.goal.max(1)) * 100.0).min(100.0)
    }

    /// Heatmap intensity for `date`: 0 for no progress, 1 to 4 by share of
    /// the goal reached (below half, half, three quarters, all)
    pub fn level_on(&self, date: NaiveDate) -> u8 {
        let progress = self.history.get(&date).copied().unwrap_or(0);
        if progress == 0 {
            return 0;
        }
        let share = f64::from(progress) / f64::from(self.goal.max(1));
        if share >= 1.0 {
            4
        } else if share >= 0.75 {
            3
        } else if share >= 0.5 {
            2
        } else {
            1
        }
    }

    /// Every day from the start date through `today`, inclusive.
    ///
    /// An unparseable start date shows the last 30 days; a start date in the
    /// future shows only `today`.
    pub fn heatmap_days(&self, today: NaiveDate) -> Vec<NaiveDate> {
        let start = NaiveDate::parse_from_str(self.start_date.trim(), "%Y-%m-%d")
            .unwrap_or_else(|_| today - Duration::days(FALLBACK_HEATMAP_DAYS))
            .min(today);
        start.iter_days().take_while(|day| *day <= today).collect()
    }
}

fn validate_goal(goal: u32) -> Result<()> {
    if goal == 0 {
        return Err(OmniDoError::InvalidGoal(goal));
    }
    Ok(())
}

/// Summary figures for the habits page header
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct HabitStats {
    pub total: usize,
    /// Habits whose progress has reached the goal
    pub completed_today: usize,
    /// Mean streak rounded to the nearest whole day; 0 without habits
    pub avg_streak: u32,
}

impl HabitStats {
    pub fn compute(habits: &[Habit]) -> Self {
        let total = habits.len();
        let completed_today = habits.iter().filter(|h| h.is_completed()).count();
        let avg_streak = if total == 0 {
            0
        } else {
            let sum: u64 = habits.iter().map(|h| u64::from(h.streak)).sum();
            (sum as f64 / total as f64).round() as u32
        };
        Self {
            total,
            completed_today,
            avg_streak,
        }
    }
}
