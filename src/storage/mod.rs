use crate::error::Result;
use async_trait::async_trait;
use log::warn;
use serde::{de::DeserializeOwned, Serialize};
use serde_json::Value;

pub mod file_storage;
pub mod memory_storage;

pub use file_storage::FileStore;
pub use memory_storage::MemoryStore;

/// Well-known keys
pub mod keys {
    /// The global task list
    pub const TASKS: &str = "omnido_tasks";
    /// Fired reminder tags per task ID
    pub const SENT_REMINDERS: &str = "sent_reminders";
    /// The habit list
    pub const HABITS: &str = "omnido_habits";

    const PROJECT_TASKS_PREFIX: &str = "omnido_project_tasks_";

    /// Task list of a project's board; `None` selects the default board
    pub fn project_tasks(project_id: Option<&str>) -> String {
        format!(
            "{}{}",
            PROJECT_TASKS_PREFIX,
            project_id.filter(|id| !id.is_empty()).unwrap_or("default")
        )
    }
}

/// Local key-value store holding JSON values. Last write wins.
#[async_trait]
pub trait KeyValueStore: Send + Sync {
    /// Returns the value under `key`, if any
    async fn get(&self, key: &str) -> Result<Option<Value>>;

    /// Stores `value` under `key`, replacing what was there
    async fn set(&self, key: &str, value: Value) -> Result<()>;

    /// Removes `key`; removing a missing key is not an error
    async fn delete(&self, key: &str) -> Result<()>;
}

/// Reads and decodes `key`. `Ok(None)` means the key is absent; a read
/// failure or a value of the wrong shape is an error.
pub async fn try_load<T, S>(store: &S, key: &str) -> Result<Option<T>>
where
    T: DeserializeOwned,
    S: KeyValueStore + ?Sized,
{
    match store.get(key).await? {
        Some(value) => Ok(Some(serde_json::from_value(value)?)),
        None => Ok(None),
    }
}

/// Reads and decodes `key`, falling back to `fallback` when the key is
/// missing, unreadable or holds a value of the wrong shape.
pub async fn load_or<T, S>(store: &S, key: &str, fallback: T) -> T
where
    T: DeserializeOwned,
    S: KeyValueStore + ?Sized,
{
    match try_load(store, key).await {
        Ok(Some(decoded)) => decoded,
        Ok(None) => fallback,
        Err(err) => {
            warn!(
                "event=store_read module=storage status=error key={} error={}",
                key, err
            );
            fallback
        }
    }
}

/// [`load_or`] with `T::default()` as the fallback
pub async fn load_or_default<T, S>(store: &S, key: &str) -> T
where
    T: DeserializeOwned + Default,
    S: KeyValueStore + ?Sized,
{
    load_or(store, key, T::default()).await
}

/// Encodes and stores `value` under `key`
pub async fn save<T, S>(store: &S, key: &str, value: &T) -> Result<()>
where
    T: Serialize + ?Sized,
    S: KeyValueStore + ?Sized,
{
    store.set(key, serde_json::to_value(value)?).await
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::Task;

    #[test]
    fn test_project_tasks_key() {
        assert_eq!(keys::project_tasks(Some("2")), "omnido_project_tasks_2");
        assert_eq!(keys::project_tasks(None), "omnido_project_tasks_default");
        assert_eq!(keys::project_tasks(Some("")), "omnido_project_tasks_default");
    }

    #[tokio::test]
    async fn test_load_falls_back_on_missing_and_malformed() {
        let store = MemoryStore::new();

        let tasks: Vec<Task> = load_or_default(&store, keys::TASKS).await;
        assert!(tasks.is_empty());

        store
            .set(keys::TASKS, serde_json::json!({"not": "a list"}))
            .await
            .unwrap();
        let tasks: Vec<Task> = load_or_default(&store, keys::TASKS).await;
        assert!(tasks.is_empty());

        let fallback = vec![Task::with_id("1", "Seed")];
        let tasks = load_or(&store, keys::TASKS, fallback).await;
        assert_eq!(tasks.len(), 1);
    }

    #[tokio::test]
    async fn test_try_load_separates_missing_from_malformed() {
        let store = MemoryStore::new();

        let missing: Option<Vec<Task>> = try_load(&store, keys::TASKS).await.unwrap();
        assert!(missing.is_none());

        store
            .set(keys::TASKS, serde_json::json!([{"id": "a", "status": null}]))
            .await
            .unwrap();
        let malformed: Result<Option<Vec<Task>>> = try_load(&store, keys::TASKS).await;
        assert!(matches!(
            malformed,
            Err(crate::error::OmniDoError::SerializationError(_))
        ));
    }

    #[tokio::test]
    async fn test_save_then_load() {
        let store = MemoryStore::new();
        let tasks = vec![Task::with_id("1", "Write tests")];

        save(&store, keys::TASKS, &tasks).await.unwrap();

        let loaded: Vec<Task> = load_or_default(&store, keys::TASKS).await;
        assert_eq!(loaded, tasks);
    }
}
