use crate::domain::task::{Task, TaskPriority, TaskStatus};
use chrono::{DateTime, TimeZone, Utc};
use std::cmp::Ordering;
use std::str::FromStr;

/// Start time assumed for tasks without one when picking the most urgent task
const LATEST_START_TIME: &str = "23:59";

/// Fields available for sorting tasks
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortField {
    Title,
    Date,
    Priority,
    Status,
}

/// Sort order direction
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortOrder {
    Ascending,
    Descending,
}

impl FromStr for SortField {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "title" => Ok(SortField::Title),
            "date" => Ok(SortField::Date),
            "priority" => Ok(SortField::Priority),
            "status" => Ok(SortField::Status),
            _ => Err(format!(
                "Invalid sort field '{}'. Valid fields: title, date, priority, status",
                s
            )),
        }
    }
}

impl FromStr for SortOrder {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "asc" => Ok(SortOrder::Ascending),
            "desc" => Ok(SortOrder::Descending),
            _ => Err(format!(
                "Invalid sort order '{}'. Valid orders: asc, desc",
                s
            )),
        }
    }
}

/// Sorts tasks in place by `field` in `order`.
///
/// Undated tasks stay at the end for [`SortField::Date`] in either direction;
/// a missing priority counts as [`TaskPriority::Low`].
pub fn sort_tasks(tasks: &mut [Task], field: SortField, order: SortOrder) {
    tasks.sort_by(|a, b| {
        let directed = |cmp: Ordering| match order {
            SortOrder::Ascending => cmp,
            SortOrder::Descending => cmp.reverse(),
        };

        match field {
            SortField::Title => directed(a.title.to_lowercase().cmp(&b.title.to_lowercase())),
            SortField::Date => match (a.date, b.date) {
                (Some(a_date), Some(b_date)) => directed(a_date.cmp(&b_date)),
                (a_date, b_date) => compare_option_dates(a_date, b_date),
            },
            SortField::Priority => directed(effective_priority(a).cmp(&effective_priority(b))),
            SortField::Status => directed(status_rank(a.status).cmp(&status_rank(b.status))),
        }
    });
}

/// Timeline order within a day: open tasks first, then by start time.
///
/// Tasks without a start time follow the timed ones of their group. The
/// sort is stable, so ties keep their list order.
pub fn timeline_order(tasks: &mut [Task]) {
    tasks.sort_by(|a, b| {
        a.completed
            .cmp(&b.completed)
            .then_with(|| match (&a.start_time, &b.start_time) {
                (Some(a_start), Some(b_start)) => a_start.cmp(b_start),
                (Some(_), None) => Ordering::Less,
                (None, Some(_)) => Ordering::Greater,
                (None, None) => Ordering::Equal,
            })
    });
}

/// Picks the open task due today (in `now`'s zone) with the highest
/// priority, earliest start time breaking ties
pub fn most_urgent_today<'a, Tz: TimeZone>(tasks: &'a [Task], now: &DateTime<Tz>) -> Option<&'a Task> {
    tasks
        .iter()
        .filter(|t| !t.completed && is_same_day(t.date, now))
        .min_by(|a, b| {
            effective_priority(b)
                .cmp(&effective_priority(a))
                .then_with(|| start_time_or_latest(a).cmp(start_time_or_latest(b)))
        })
}

pub(crate) fn is_same_day<Tz: TimeZone>(date: Option<DateTime<Utc>>, now: &DateTime<Tz>) -> bool {
    date.is_some_and(|d| d.with_timezone(&now.timezone()).date_naive() == now.date_naive())
}

fn effective_priority(task: &Task) -> TaskPriority {
    task.priority.unwrap_or(TaskPriority::Low)
}

fn start_time_or_latest(task: &Task) -> &str {
    task.start_time.as_deref().unwrap_or(LATEST_START_TIME)
}

/// Board order: todo, in progress, done
fn status_rank(status: TaskStatus) -> u8 {
    match status {
        TaskStatus::Todo => 0,
        TaskStatus::InProgress => 1,
        TaskStatus::Done => 2,
    }
}

/// Compare Option<DateTime> with None always sorting to end
fn compare_option_dates(a: Option<DateTime<Utc>>, b: Option<DateTime<Utc>>) -> Ordering {
    match (a, b) {
        (Some(a_date), Some(b_date)) => a_date.cmp(&b_date),
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        (None, None) => Ordering::Equal,
    }
}
