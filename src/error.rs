use thiserror::Error;

pub type Result<T> = std::result::Result<T, OmniDoError>;

#[derive(Debug, Error)]
pub enum OmniDoError {
    #[error("Task not found: {0}")]
    TaskNotFound(String),

    #[error("Invalid task status: {0}")]
    InvalidStatus(String),

    #[error("Invalid task priority: {0} (expected 1, 2 or 3)")]
    InvalidPriority(u8),

    #[error("Invalid start time '{0}' (expected HH:mm)")]
    InvalidStartTime(String),

    #[error("Habit not found: {0}")]
    HabitNotFound(String),

    #[error("Invalid habit goal: {0} (must be at least 1)")]
    InvalidGoal(u32),

    #[error("Storage error: {0}")]
    StorageError(String),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),

    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error("{0}")]
    Other(String),
}
