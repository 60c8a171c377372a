pub mod habits;
pub mod project;
pub mod reminders;
pub mod tasks;

pub use habits::HabitTracker;
pub use project::ProjectBoard;
pub use reminders::{ReminderPoller, ReminderService};
pub use tasks::TaskList;
