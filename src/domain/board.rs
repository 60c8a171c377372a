use crate::domain::task::{TaskId, TaskStatus};
use serde::{Deserialize, Serialize};

/// A kanban board column; its identity is the status it collects
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Column {
    pub title: String,
    pub status: TaskStatus,
}

impl Column {
    pub fn new(title: impl Into<String>, status: TaskStatus) -> Self {
        Self {
            title: title.into(),
            status,
        }
    }

    /// Column identifier as used by drop targets
    pub fn id(&self) -> &'static str {
        self.status.as_str()
    }
}

/// Board layout: the fixed column order
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BoardConfig {
    pub columns: Vec<Column>,
}

impl Default for BoardConfig {
    fn default() -> Self {
        Self {
            columns: TaskStatus::ALL
                .iter()
                .map(|status| Column::new(status.to_string(), *status))
                .collect(),
        }
    }
}

impl BoardConfig {
    /// Gets the column for a status
    pub fn column_for_status(&self, status: TaskStatus) -> Option<&Column> {
        self.columns.iter().find(|col| col.status == status)
    }
}

/// What the pointer is over while dragging a card
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DropTarget {
    /// Empty space of a column
    Column(TaskStatus),
    /// Another card
    Task(TaskId),
}

impl From<TaskStatus> for DropTarget {
    fn from(status: TaskStatus) -> Self {
        Self::Column(status)
    }
}

impl From<TaskId> for DropTarget {
    fn from(id: TaskId) -> Self {
        Self::Task(id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_columns_in_order() {
        let config = BoardConfig::default();
        let ids: Vec<_> = config.columns.iter().map(Column::id).collect();
        assert_eq!(ids, vec!["todo", "in-progress", "done"]);
        assert_eq!(config.columns[0].title, "To Do");
    }

    #[test]
    fn test_column_lookup() {
        let config = BoardConfig::default();
        let column = config.column_for_status(TaskStatus::InProgress).unwrap();
        assert_eq!(column.title, "In Progress");
    }
}
