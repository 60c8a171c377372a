use crate::{
    domain::{DropTarget, KanbanBoard, Task, TaskId, TaskStatus},
    error::{OmniDoError, Result},
    storage::{keys, save, try_load, KeyValueStore},
};
use log::{debug, warn};
use std::sync::Arc;

/// A project's kanban board bound to its stored task list.
///
/// Every mutating call takes `&mut self` and waits for its write to land
/// before returning, so mutations reach the store in order.
///
/// A stored list that cannot be read or decoded opens as an empty board in
/// read-only mode: mutations fail with [`OmniDoError::StorageError`] until
/// [`ProjectBoard::reload`] succeeds, so the stored data is never replaced.
pub struct ProjectBoard {
    store: Arc<dyn KeyValueStore>,
    key: String,
    board: KanbanBoard,
    loaded: bool,
}

impl ProjectBoard {
    /// Loads the board for `project_id`; `None` opens the default board
    pub async fn open(store: Arc<dyn KeyValueStore>, project_id: Option<&str>) -> Self {
        let mut project = Self {
            store,
            key: keys::project_tasks(project_id),
            board: KanbanBoard::new(Vec::new()),
            loaded: false,
        };
        if let Err(err) = project.reload().await {
            warn!(
                "event=board_open module=project status=read_only key={} error={}",
                project.key, err
            );
        }
        project
    }

    /// Re-reads the stored list, replacing the in-memory board
    pub async fn reload(&mut self) -> Result<()> {
        let tasks: Vec<Task> = try_load(self.store.as_ref(), &self.key)
            .await?
            .unwrap_or_default();
        debug!(
            "event=board_open module=project status=ok key={} tasks={}",
            self.key,
            tasks.len()
        );
        self.board = KanbanBoard::new(tasks);
        self.loaded = true;
        Ok(())
    }

    pub fn key(&self) -> &str {
        &self.key
    }

    pub fn board(&self) -> &KanbanBoard {
        &self.board
    }

    /// False when the stored list could not be read; the board is then
    /// empty and refuses changes
    pub fn is_loaded(&self) -> bool {
        self.loaded
    }

    fn ensure_loaded(&self) -> Result<()> {
        if self.loaded {
            Ok(())
        } else {
            Err(OmniDoError::StorageError(format!(
                "{} was not loaded; refusing to overwrite it",
                self.key
            )))
        }
    }

    async fn persist(&self) -> Result<()> {
        save(self.store.as_ref(), &self.key, self.board.tasks())
            .await
            .map_err(|err| {
                warn!(
                    "event=board_persist module=project status=error key={} error={}",
                    self.key, err
                );
                err
            })
    }

    async fn persist_if(&self, changed: bool) -> Result<bool> {
        if changed {
            self.persist().await?;
        }
        Ok(changed)
    }

    pub fn drag_start(&mut self, active: &TaskId) {
        self.board.drag_start(active);
    }

    pub async fn drag_over(&mut self, active: &TaskId, over: &DropTarget) -> Result<bool> {
        self.ensure_loaded()?;
        let changed = self.board.drag_over(active, over);
        self.persist_if(changed).await
    }

    pub async fn drag_end(&mut self, active: &TaskId, over: Option<&DropTarget>) -> Result<bool> {
        self.ensure_loaded()?;
        let changed = self.board.drag_end(active, over);
        self.persist_if(changed).await
    }

    pub async fn drag_cancel(&mut self) -> Result<bool> {
        self.ensure_loaded()?;
        let changed = self.board.drag_cancel();
        self.persist_if(changed).await
    }

    pub async fn add_task(&mut self, status: TaskStatus) -> Result<TaskId> {
        self.ensure_loaded()?;
        let id = self.board.add_task(status);
        self.persist().await?;
        Ok(id)
    }

    pub async fn update_task(&mut self, updated: Task) -> Result<bool> {
        self.ensure_loaded()?;
        let changed = self.board.update_task(updated);
        self.persist_if(changed).await
    }

    pub async fn delete_task(&mut self, id: &TaskId) -> Result<bool> {
        self.ensure_loaded()?;
        let changed = self.board.delete_task(id);
        self.persist_if(changed).await
    }
}
