pub mod agenda;
pub mod board;
pub mod habit;
pub mod kanban;
pub mod relative_time;
pub mod reminder;
pub mod sorting;
pub mod task;

pub use agenda::{Agenda, TaskStats};
pub use board::{BoardConfig, Column, DropTarget};
pub use habit::{Habit, HabitStats};
pub use kanban::KanbanBoard;
pub use reminder::{
    check_reminders, NotificationRequest, ReminderCheck, ReminderState, ReminderThreshold,
};
pub use sorting::{most_urgent_today, sort_tasks, timeline_order, SortField, SortOrder};
pub use task::{Task, TaskId, TaskPriority, TaskStatus};
