//! Kanban reordering over a single flat task order.
//!
//! Columns are not stored: a column is the flat order filtered by status.
//! Moving a card between columns therefore changes its `status` and its
//! position in the shared order at the same time.

use crate::domain::{
    board::{BoardConfig, DropTarget},
    task::{Task, TaskId, TaskStatus},
};
use log::debug;

/// Pre-drag state kept so an aborted gesture can be undone
#[derive(Debug, Clone)]
struct DragSession {
    active: TaskId,
    snapshot: Vec<Task>,
}

/// Ordered task list backing one kanban board
#[derive(Debug, Clone, Default)]
pub struct KanbanBoard {
    config: BoardConfig,
    tasks: Vec<Task>,
    drag: Option<DragSession>,
}

impl KanbanBoard {
    pub fn new(tasks: Vec<Task>) -> Self {
        Self {
            config: BoardConfig::default(),
            tasks,
            drag: None,
        }
    }

    pub fn config(&self) -> &BoardConfig {
        &self.config
    }

    /// The flat order
    pub fn tasks(&self) -> &[Task] {
        &self.tasks
    }

    pub fn into_tasks(self) -> Vec<Task> {
        self.tasks
    }

    pub fn task(&self, id: &TaskId) -> Option<&Task> {
        self.tasks.iter().find(|t| &t.id == id)
    }

    /// IDs in flat order
    pub fn ids(&self) -> Vec<&str> {
        self.tasks.iter().map(|t| t.id.as_str()).collect()
    }

    /// Cards of one column, in display order
    pub fn column(&self, status: TaskStatus) -> impl Iterator<Item = &Task> {
        self.tasks.iter().filter(move |t| t.status == status)
    }

    fn index_of(&self, id: &TaskId) -> Option<usize> {
        self.tasks.iter().position(|t| &t.id == id)
    }

    /// Whether a drag gesture is in progress
    pub fn is_dragging(&self) -> bool {
        self.drag.is_some()
    }

    /// Starts a gesture, remembering the current order for [`Self::drag_cancel`]
    pub fn drag_start(&mut self, active: &TaskId) {
        self.drag = Some(DragSession {
            active: active.clone(),
            snapshot: self.tasks.clone(),
        });
    }

    /// Applies a hover step of an ongoing drag. Returns whether anything changed.
    ///
    /// Over a column: only the status changes, position is kept. Over a card in
    /// the same column: the active card is moved to the other card's index.
    /// Over a card in another column: the status changes first, then the active
    /// card takes the other card's slot, directly in front of it.
    pub fn drag_over(&mut self, active: &TaskId, over: &DropTarget) -> bool {
        let Some(active_index) = self.index_of(active) else {
            return false;
        };

        match over {
            DropTarget::Column(status) => {
                let task = &mut self.tasks[active_index];
                if task.status == *status {
                    return false;
                }
                debug!(
                    "event=drag_over module=kanban target=column task={} status={}",
                    active,
                    status.as_str()
                );
                task.set_status(*status);
                true
            }
            DropTarget::Task(over_id) => {
                if over_id == active {
                    return false;
                }
                let Some(over_index) = self.index_of(over_id) else {
                    return false;
                };

                let over_status = self.tasks[over_index].status;
                if self.tasks[active_index].status == over_status {
                    if active_index == over_index {
                        return false;
                    }
                    move_item(&mut self.tasks, active_index, over_index);
                } else {
                    self.tasks[active_index].set_status(over_status);
                    let task = self.tasks.remove(active_index);
                    let slot = self.index_of(over_id).unwrap_or(self.tasks.len());
                    self.tasks.insert(slot, task);
                }
                debug!(
                    "event=drag_over module=kanban target=task task={} over={}",
                    active, over_id
                );
                true
            }
        }
    }

    /// Commits a drop. Only a drop on another card reorders; a drop on a column
    /// or outside any target keeps whatever the last hover step produced.
    pub fn drag_end(&mut self, active: &TaskId, over: Option<&DropTarget>) -> bool {
        self.drag = None;

        let Some(DropTarget::Task(over_id)) = over else {
            return false;
        };
        if over_id == active {
            return false;
        }

        match (self.index_of(active), self.index_of(over_id)) {
            (Some(from), Some(to)) if from != to => {
                move_item(&mut self.tasks, from, to);
                debug!(
                    "event=drag_end module=kanban task={} over={} from={} to={}",
                    active, over_id, from, to
                );
                true
            }
            _ => false,
        }
    }

    /// Aborts the gesture (escape key) and restores the order from drag start
    pub fn drag_cancel(&mut self) -> bool {
        match self.drag.take() {
            Some(session) => {
                let changed = session.snapshot != self.tasks;
                debug!(
                    "event=drag_cancel module=kanban task={} restored={}",
                    session.active, changed
                );
                self.tasks = session.snapshot;
                changed
            }
            None => false,
        }
    }

    /// Appends a placeholder task to the end of the order
    pub fn add_task(&mut self, status: TaskStatus) -> TaskId {
        let task = Task::for_column(status);
        let id = task.id.clone();
        self.tasks.push(task);
        id
    }

    /// Replaces the task with the same ID in place
    pub fn update_task(&mut self, updated: Task) -> bool {
        match self.tasks.iter_mut().find(|t| t.id == updated.id) {
            Some(slot) => {
                *slot = updated;
                true
            }
            None => false,
        }
    }

    pub fn delete_task(&mut self, id: &TaskId) -> bool {
        let before = self.tasks.len();
        self.tasks.retain(|t| &t.id != id);
        self.tasks.len() != before
    }
}

/// Moves the element at `from` to `to`, shifting the ones in between by one
fn move_item<T>(items: &mut Vec<T>, from: usize, to: usize) {
    let item = items.remove(from);
    items.insert(to, item);
}
