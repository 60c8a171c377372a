use crate::{
    domain::{Habit, HabitStats},
    error::{OmniDoError, Result},
    storage::{keys, save, try_load, KeyValueStore},
};
use chrono::{DateTime, TimeZone};
use log::{debug, warn};
use std::sync::Arc;

/// The stored habit list.
///
/// Follows the same load rules as [`crate::service::TaskList`]: a list that
/// cannot be decoded opens empty and every change is refused until
/// [`HabitTracker::reload`] succeeds.
pub struct HabitTracker {
    store: Arc<dyn KeyValueStore>,
    habits: Vec<Habit>,
    loaded: bool,
}

impl HabitTracker {
    pub async fn open(store: Arc<dyn KeyValueStore>) -> Self {
        let mut tracker = Self {
            store,
            habits: Vec::new(),
            loaded: false,
        };
        if let Err(err) = tracker.reload().await {
            warn!(
                "event=habits_open module=habits status=read_only key={} error={}",
                keys::HABITS,
                err
            );
        }
        tracker
    }

    pub async fn reload(&mut self) -> Result<()> {
        self.habits = try_load(self.store.as_ref(), keys::HABITS)
            .await?
            .unwrap_or_default();
        self.loaded = true;
        Ok(())
    }

    pub fn is_loaded(&self) -> bool {
        self.loaded
    }

    pub fn habits(&self) -> &[Habit] {
        &self.habits
    }

    pub fn stats(&self) -> HabitStats {
        HabitStats::compute(&self.habits)
    }

    async fn persist(&self) -> Result<()> {
        save(self.store.as_ref(), keys::HABITS, &self.habits).await
    }

    fn ensure_loaded(&self) -> Result<()> {
        if self.loaded {
            Ok(())
        } else {
            Err(OmniDoError::StorageError(format!(
                "{} was not loaded; refusing to overwrite it",
                keys::HABITS
            )))
        }
    }

    fn find_mut(&mut self, id: &str) -> Result<&mut Habit> {
        self.ensure_loaded()?;
        self.habits
            .iter_mut()
            .find(|h| h.id == id)
            .ok_or_else(|| OmniDoError::HabitNotFound(id.to_string()))
    }

    /// Appends a new habit starting on `now`'s calendar day and returns its ID
    pub async fn add<Tz: TimeZone>(
        &mut self,
        title: &str,
        goal: u32,
        now: &DateTime<Tz>,
    ) -> Result<String> {
        self.ensure_loaded()?;
        let title = title.trim();
        if title.is_empty() {
            return Err(OmniDoError::Other("habit title cannot be empty".to_string()));
        }
        let habit = Habit::new(title, goal, now.date_naive())?;
        let id = habit.id.clone();
        self.habits.push(habit);
        self.persist().await?;
        Ok(id)
    }

    pub async fn edit(&mut self, id: &str, title: &str, goal: u32) -> Result<()> {
        self.find_mut(id)?.edit(title.trim(), goal)?;
        self.persist().await
    }

    /// Records a step for `now`'s calendar day in its own time zone
    pub async fn increment<Tz: TimeZone>(&mut self, id: &str, now: &DateTime<Tz>) -> Result<u32> {
        let progress = self.find_mut(id)?.increment(now.date_naive());
        self.persist().await?;
        debug!(
            "event=habit_increment module=habits status=ok id={} progress={}",
            id, progress
        );
        Ok(progress)
    }

    pub async fn delete(&mut self, id: &str) -> Result<()> {
        self.find_mut(id)?;
        self.habits.retain(|h| h.id != id);
        self.persist().await
    }
}
