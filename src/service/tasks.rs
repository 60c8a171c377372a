use crate::{
    domain::{Agenda, Task, TaskId, TaskStats},
    error::{OmniDoError, Result},
    storage::{keys, save, try_load, KeyValueStore},
};
use chrono::{DateTime, TimeZone};
use log::warn;
use std::sync::Arc;

/// The global task list, newest first.
///
/// Like [`crate::service::ProjectBoard`], a list that fails to load opens
/// empty and rejects changes until [`TaskList::reload`] succeeds.
pub struct TaskList {
    store: Arc<dyn KeyValueStore>,
    tasks: Vec<Task>,
    loaded: bool,
}

impl TaskList {
    pub async fn open(store: Arc<dyn KeyValueStore>) -> Self {
        let mut list = Self {
            store,
            tasks: Vec::new(),
            loaded: false,
        };
        if let Err(err) = list.reload().await {
            warn!(
                "event=task_list_open module=tasks status=read_only key={} error={}",
                keys::TASKS,
                err
            );
        }
        list
    }

    pub async fn reload(&mut self) -> Result<()> {
        self.tasks = try_load(self.store.as_ref(), keys::TASKS)
            .await?
            .unwrap_or_default();
        self.loaded = true;
        Ok(())
    }

    pub fn is_loaded(&self) -> bool {
        self.loaded
    }

    pub fn tasks(&self) -> &[Task] {
        &self.tasks
    }

    pub fn stats<Tz: TimeZone>(&self, now: &DateTime<Tz>) -> TaskStats {
        TaskStats::compute(&self.tasks, now)
    }

    pub fn agenda<Tz: TimeZone>(&self, now: &DateTime<Tz>) -> Agenda<'_> {
        Agenda::partition(&self.tasks, now)
    }

    async fn persist(&self) -> Result<()> {
        save(self.store.as_ref(), keys::TASKS, &self.tasks).await
    }

    fn ensure_loaded(&self) -> Result<()> {
        if self.loaded {
            Ok(())
        } else {
            Err(OmniDoError::StorageError(format!(
                "{} was not loaded; refusing to overwrite it",
                keys::TASKS
            )))
        }
    }

    fn find_mut(&mut self, id: &TaskId) -> Result<&mut Task> {
        self.ensure_loaded()?;
        self.tasks
            .iter_mut()
            .find(|t| &t.id == id)
            .ok_or_else(|| OmniDoError::TaskNotFound(id.to_string()))
    }

    /// Inserts `task` at the top of the list
    pub async fn add(&mut self, task: Task) -> Result<()> {
        self.ensure_loaded()?;
        self.tasks.insert(0, task);
        self.persist().await
    }

    pub async fn toggle(&mut self, id: &TaskId) -> Result<bool> {
        let task = self.find_mut(id)?;
        task.toggle_completed();
        let completed = task.completed;
        self.persist().await?;
        Ok(completed)
    }

    pub async fn update(&mut self, updated: Task) -> Result<()> {
        let slot = self.find_mut(&updated.id)?;
        *slot = updated;
        self.persist().await
    }

    pub async fn delete(&mut self, id: &TaskId) -> Result<()> {
        self.ensure_loaded()?;
        let before = self.tasks.len();
        self.tasks.retain(|t| &t.id != id);
        if self.tasks.len() == before {
            return Err(OmniDoError::TaskNotFound(id.to_string()));
        }
        self.persist().await
    }
}
