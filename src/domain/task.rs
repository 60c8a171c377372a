use chrono::{DateTime, NaiveTime, TimeZone, Utc};
use serde::{Deserialize, Deserializer, Serialize};
use std::{fmt, str::FromStr};
use uuid::Uuid;

use crate::error::OmniDoError;

/// Opaque unique identifier for a task, assigned at creation and never reused
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TaskId(String);

impl TaskId {
    /// Generates a fresh random identifier
    pub fn generate() -> Self {
        Self(Uuid::new_v4().simple().to_string())
    }

    /// Returns the string representation
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<&str> for TaskId {
    fn from(value: &str) -> Self {
        Self(value.to_string())
    }
}

impl From<String> for TaskId {
    fn from(value: String) -> Self {
        Self(value)
    }
}

impl fmt::Display for TaskId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Kanban column a task belongs to
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum TaskStatus {
    #[default]
    Todo,
    InProgress,
    Done,
}

impl TaskStatus {
    /// All statuses in board order
    pub const ALL: [TaskStatus; 3] = [Self::Todo, Self::InProgress, Self::Done];

    /// Wire form used in storage and as the column identifier
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Todo => "todo",
            Self::InProgress => "in-progress",
            Self::Done => "done",
        }
    }
}

impl fmt::Display for TaskStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Todo => write!(f, "To Do"),
            Self::InProgress => write!(f, "In Progress"),
            Self::Done => write!(f, "Done"),
        }
    }
}

impl FromStr for TaskStatus {
    type Err = OmniDoError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "todo" => Ok(Self::Todo),
            "in-progress" => Ok(Self::InProgress),
            "done" => Ok(Self::Done),
            other => Err(OmniDoError::InvalidStatus(other.to_string())),
        }
    }
}

/// Task priority, stored as 1 (Low), 2 (Medium) or 3 (High)
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "u8", into = "u8")]
pub enum TaskPriority {
    Low = 1,
    Medium = 2,
    High = 3,
}

impl TryFrom<u8> for TaskPriority {
    type Error = OmniDoError;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        match value {
            1 => Ok(Self::Low),
            2 => Ok(Self::Medium),
            3 => Ok(Self::High),
            other => Err(OmniDoError::InvalidPriority(other)),
        }
    }
}

impl From<TaskPriority> for u8 {
    fn from(value: TaskPriority) -> Self {
        value as u8
    }
}

/// A task in either the global list or a project board.
///
/// `status` and `completed` are stored separately and may be set
/// independently; operations that change `status` keep `completed` in step.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Task {
    pub id: TaskId,
    pub title: String,
    #[serde(default)]
    pub completed: bool,
    #[serde(
        default,
        deserialize_with = "lenient_date",
        skip_serializing_if = "Option::is_none"
    )]
    pub date: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub start_time: Option<String>,
    /// Planned length in minutes
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub duration: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub priority: Option<TaskPriority>,
    #[serde(default)]
    pub status: TaskStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub project_id: Option<String>,
    #[serde(default)]
    pub subtasks: Vec<Task>,
}

impl Task {
    /// Placeholder title given to tasks created from a board column
    pub const PLACEHOLDER_TITLE: &'static str = "New Task";

    /// Creates a new open task with a fresh ID
    pub fn new(title: impl Into<String>) -> Self {
        Self::with_id(TaskId::generate(), title)
    }

    /// Creates a new open task with the given ID
    pub fn with_id(id: impl Into<TaskId>, title: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            title: title.into(),
            completed: false,
            date: None,
            start_time: None,
            duration: None,
            priority: None,
            status: TaskStatus::Todo,
            project_id: None,
            subtasks: Vec::new(),
        }
    }

    /// Creates a placeholder task for a board column
    pub fn for_column(status: TaskStatus) -> Self {
        let mut task = Self::new(Self::PLACEHOLDER_TITLE);
        task.set_status(status);
        task
    }

    pub fn set_title(&mut self, title: impl Into<String>) {
        self.title = title.into();
    }

    /// Moves the task to a column, syncing `completed`
    pub fn set_status(&mut self, status: TaskStatus) {
        self.status = status;
        self.completed = status == TaskStatus::Done;
    }

    /// Flips `completed` without touching `status`
    pub fn toggle_completed(&mut self) {
        self.completed = !self.completed;
    }

    /// Sets the due date and derives `startTime` from its wall-clock time in `due`'s zone
    pub fn set_due<Tz: TimeZone>(&mut self, due: DateTime<Tz>)
    where
        Tz::Offset: fmt::Display,
    {
        self.start_time = Some(due.format("%H:%M").to_string());
        self.date = Some(due.with_timezone(&Utc));
    }

    /// Sets the display start time, which must be `HH:mm`
    pub fn set_start_time(&mut self, value: &str) -> Result<(), OmniDoError> {
        let trimmed = value.trim();
        if trimmed.len() != 5 || NaiveTime::parse_from_str(trimmed, "%H:%M").is_err() {
            return Err(OmniDoError::InvalidStartTime(value.to_string()));
        }
        self.start_time = Some(trimmed.to_string());
        Ok(())
    }

    pub fn clear_due(&mut self) {
        self.date = None;
        self.start_time = None;
    }

    /// Appends an empty `todo` subtask and returns its ID
    pub fn add_subtask(&mut self) -> TaskId {
        let subtask = Task::new(String::new());
        let id = subtask.id.clone();
        self.subtasks.push(subtask);
        id
    }

    /// Applies `update` to the subtask with `id`; returns false when absent
    pub fn update_subtask(&mut self, id: &TaskId, update: impl FnOnce(&mut Task)) -> bool {
        match self.subtasks.iter_mut().find(|s| &s.id == id) {
            Some(subtask) => {
                update(subtask);
                true
            }
            None => false,
        }
    }

    /// Removes the subtask with `id`; returns false when absent
    pub fn remove_subtask(&mut self, id: &TaskId) -> bool {
        let before = self.subtasks.len();
        self.subtasks.retain(|s| &s.id != id);
        self.subtasks.len() != before
    }

    /// Returns (done, total) over subtasks, counting by status
    pub fn subtask_progress(&self) -> (usize, usize) {
        let done = self
            .subtasks
            .iter()
            .filter(|s| s.status == TaskStatus::Done)
            .count();
        (done, self.subtasks.len())
    }
}

// Unparseable dates read as absent so one bad record cannot poison a whole list.
fn lenient_date<'de, D>(deserializer: D) -> Result<Option<DateTime<Utc>>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = Option::<serde_json::Value>::deserialize(deserializer)?;
    Ok(raw.and_then(|value| match value {
        serde_json::Value::String(s) => DateTime::parse_from_rfc3339(&s)
            .ok()
            .map(|dt| dt.with_timezone(&Utc)),
        serde_json::Value::Number(n) => n.as_i64().and_then(DateTime::from_timestamp_millis),
        _ => None,
    }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::FixedOffset;

    #[test]
    fn test_generated_ids_are_unique() {
        let a = TaskId::generate();
        let b = TaskId::generate();
        assert_ne!(a, b);
        assert!(!a.as_str().is_empty());
    }

    #[test]
    fn test_status_parsing() {
        assert_eq!(TaskStatus::from_str("todo").unwrap(), TaskStatus::Todo);
        assert_eq!(
            TaskStatus::from_str("in-progress").unwrap(),
            TaskStatus::InProgress
        );
        assert_eq!(TaskStatus::from_str("done").unwrap(), TaskStatus::Done);
        assert!(TaskStatus::from_str("review").is_err());
    }

    #[test]
    fn test_priority_conversion() {
        assert_eq!(TaskPriority::try_from(3).unwrap(), TaskPriority::High);
        assert!(TaskPriority::try_from(0).is_err());
        assert!(TaskPriority::try_from(4).is_err());
        assert!(TaskPriority::Low < TaskPriority::High);
    }

    #[test]
    fn test_for_column_syncs_completed() {
        let task = Task::for_column(TaskStatus::Done);
        assert_eq!(task.title, "New Task");
        assert!(task.completed);
        assert!(task.subtasks.is_empty());

        let task = Task::for_column(TaskStatus::InProgress);
        assert!(!task.completed);
    }

    #[test]
    fn test_toggle_completed_leaves_status() {
        let mut task = Task::with_id("1", "Write report");
        task.toggle_completed();
        assert!(task.completed);
        assert_eq!(task.status, TaskStatus::Todo);
    }

    #[test]
    fn test_set_due_derives_start_time() {
        let mut task = Task::with_id("1", "Standup");
        let offset = FixedOffset::east_opt(2 * 3600).unwrap();
        let due = offset.with_ymd_and_hms(2024, 3, 1, 9, 30, 0).unwrap();

        task.set_due(due);

        assert_eq!(task.start_time.as_deref(), Some("09:30"));
        assert_eq!(
            task.date,
            Some(Utc.with_ymd_and_hms(2024, 3, 1, 7, 30, 0).unwrap())
        );

        task.clear_due();
        assert!(task.date.is_none());
        assert!(task.start_time.is_none());
    }

    #[test]
    fn test_set_start_time_validates_format() {
        let mut task = Task::with_id("1", "Gym");
        assert!(task.set_start_time("07:05").is_ok());
        assert!(task.set_start_time("7:05").is_err());
        assert!(task.set_start_time("25:00").is_err());
        assert_eq!(task.start_time.as_deref(), Some("07:05"));
    }

    #[test]
    fn test_subtask_lifecycle() {
        let mut task = Task::with_id("1", "Launch");
        let first = task.add_subtask();
        let second = task.add_subtask();
        assert_eq!(task.subtask_progress(), (0, 2));

        assert!(task.update_subtask(&first, |s| {
            s.set_title("Draft post");
            s.set_status(TaskStatus::Done);
        }));
        assert_eq!(task.subtask_progress(), (1, 2));
        assert_eq!(task.subtasks[0].title, "Draft post");

        assert!(task.remove_subtask(&second));
        assert!(!task.remove_subtask(&second));
        assert!(!task.update_subtask(&TaskId::from("missing"), |_| {}));
        assert_eq!(task.subtask_progress(), (1, 1));
    }

    #[test]
    fn test_serialization_uses_stored_shape() {
        let mut task = Task::with_id("42", "Plan sprint");
        task.priority = Some(TaskPriority::Medium);
        task.set_status(TaskStatus::InProgress);
        task.start_time = Some("10:00".to_string());

        let json = serde_json::to_value(&task).unwrap();
        assert_eq!(json["id"], "42");
        assert_eq!(json["status"], "in-progress");
        assert_eq!(json["priority"], 2);
        assert_eq!(json["startTime"], "10:00");
        assert!(json.get("date").is_none());
    }

    #[test]
    fn test_deserialize_minimal_global_task() {
        let json = r#"{
            "id": "1700000000000",
            "title": "Design system architecture",
            "completed": false,
            "date": "2024-01-01T09:00:00.000Z",
            "startTime": "09:00",
            "duration": 60
        }"#;

        let task: Task = serde_json::from_str(json).unwrap();
        assert_eq!(task.id.as_str(), "1700000000000");
        assert_eq!(task.status, TaskStatus::Todo);
        assert_eq!(task.duration, Some(60));
        assert_eq!(
            task.date,
            Some(Utc.with_ymd_and_hms(2024, 1, 1, 9, 0, 0).unwrap())
        );
        assert!(task.subtasks.is_empty());
    }

    #[test]
    fn test_malformed_date_reads_as_absent() {
        let json = r#"{"id": "1", "title": "Broken", "completed": false, "date": "not a date"}"#;
        let task: Task = serde_json::from_str(json).unwrap();
        assert!(task.date.is_none());

        let json = r#"{"id": "2", "title": "Epoch", "completed": false, "date": 0}"#;
        let task: Task = serde_json::from_str(json).unwrap();
        assert_eq!(task.date, Some(Utc.timestamp_opt(0, 0).unwrap()));
    }
}
