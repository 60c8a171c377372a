//! # OmniDo Core
//!
//! Core logic for the OmniDo productivity app: due-date reminders, kanban
//! reordering, habit tracking and the task model, on top of a local key-value store.
//!
//! The [`domain`] engines are pure and synchronous. The [`service`] layer
//! wires them to a [`KeyValueStore`], a [`Clock`] and a
//! [`NotificationSink`], persisting after every change.

pub mod clock;
pub mod config;
pub mod domain;
pub mod error;
pub mod logging;
pub mod notify;
pub mod service;
pub mod storage;

// Re-export commonly used types
pub use clock::{Clock, ManualClock, SystemClock};
pub use config::Config;
pub use domain::{
    board::{BoardConfig, Column, DropTarget},
    habit::{Habit, HabitStats},
    kanban::KanbanBoard,
    reminder::{check_reminders, NotificationRequest, ReminderState, ReminderThreshold},
    task::{Task, TaskId, TaskPriority, TaskStatus},
};
pub use error::{OmniDoError, Result};
pub use notify::{LogNotifier, NotificationSink};
pub use service::{HabitTracker, ProjectBoard, ReminderPoller, ReminderService, TaskList};
pub use storage::{FileStore, KeyValueStore, MemoryStore};
