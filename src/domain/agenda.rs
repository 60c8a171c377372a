use crate::domain::{sorting::is_same_day, task::Task};
use chrono::{DateTime, TimeZone, Utc};

/// Counters shown above the global task list
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TaskStats {
    pub total: usize,
    pub remaining: usize,
    /// Completed tasks whose due date falls on today
    pub completed_today: usize,
    /// Open tasks whose due date has passed
    pub overdue: usize,
}

impl TaskStats {
    pub fn compute<Tz: TimeZone>(tasks: &[Task], now: &DateTime<Tz>) -> Self {
        let now_utc = now.with_timezone(&Utc);
        Self {
            total: tasks.len(),
            remaining: tasks.iter().filter(|t| !t.completed).count(),
            completed_today: tasks
                .iter()
                .filter(|t| t.completed && is_same_day(t.date, now))
                .count(),
            overdue: tasks
                .iter()
                .filter(|t| !t.completed && t.date.is_some_and(|d| d < now_utc))
                .count(),
        }
    }
}

/// The global list split into its three sections, each in list order
#[derive(Debug, Default)]
pub struct Agenda<'a> {
    pub today: Vec<&'a Task>,
    pub upcoming: Vec<&'a Task>,
    pub completed: Vec<&'a Task>,
}

impl<'a> Agenda<'a> {
    pub fn partition<Tz: TimeZone>(tasks: &'a [Task], now: &DateTime<Tz>) -> Self {
        let mut agenda = Agenda::default();
        for task in tasks {
            if task.completed {
                agenda.completed.push(task);
            } else if is_same_day(task.date, now) {
                agenda.today.push(task);
            } else {
                agenda.upcoming.push(task);
            }
        }
        agenda
    }
}
