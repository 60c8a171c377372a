use crate::{
    clock::Clock,
    config::validate_interval,
    domain::{
        reminder::{check_reminders, ReminderCheck, ReminderState},
        Task,
    },
    error::{OmniDoError, Result},
    notify::NotificationSink,
    storage::{keys, load_or_default, save, KeyValueStore},
};
use log::{debug, error, info, warn};
use std::{sync::Arc, time::Duration};
use tokio::{
    sync::{oneshot, Mutex},
    task::JoinHandle,
    time::MissedTickBehavior,
};

/// Runs reminder passes against the stored task list
pub struct ReminderService {
    store: Arc<dyn KeyValueStore>,
    clock: Arc<dyn Clock>,
    sink: Arc<dyn NotificationSink>,
    tasks_key: String,
    // One pass at a time. Holds the last state whose save failed, so a
    // reminder that was already shown is not shown again.
    unsaved: Mutex<Option<ReminderState>>,
}

impl ReminderService {
    pub fn new(
        store: Arc<dyn KeyValueStore>,
        clock: Arc<dyn Clock>,
        sink: Arc<dyn NotificationSink>,
    ) -> Self {
        Self {
            store,
            clock,
            sink,
            tasks_key: keys::TASKS.to_string(),
            unsaved: Mutex::new(None),
        }
    }

    /// Watches a different task list, e.g. a project board
    pub fn with_tasks_key(mut self, key: impl Into<String>) -> Self {
        self.tasks_key = key.into();
        self
    }

    async fn load_tasks(&self) -> Option<Vec<Task>> {
        match self.store.get(&self.tasks_key).await {
            Ok(Some(value)) => match serde_json::from_value(value) {
                Ok(tasks) => Some(tasks),
                Err(err) => {
                    warn!(
                        "event=reminder_poll module=reminders status=skip key={} error={}",
                        self.tasks_key, err
                    );
                    None
                }
            },
            Ok(None) => Some(Vec::new()),
            Err(err) => {
                warn!(
                    "event=reminder_poll module=reminders status=skip key={} error={}",
                    self.tasks_key, err
                );
                None
            }
        }
    }

    /// One pass: load tasks and state, notify, persist the state if it changed.
    ///
    /// An unreadable task list skips the pass rather than treating every
    /// tracked task as deleted. When persisting fails the state is kept in
    /// memory and used, and retried, on the next pass.
    pub async fn poll_once(&self) -> Result<ReminderCheck> {
        let mut unsaved = self.unsaved.lock().await;

        let Some(tasks) = self.load_tasks().await else {
            return Ok(ReminderCheck::default());
        };
        let pending = unsaved.take();
        let retrying = pending.is_some();
        let state: ReminderState = match pending {
            Some(state) => state,
            None => load_or_default(self.store.as_ref(), keys::SENT_REMINDERS).await,
        };

        let check = check_reminders(&tasks, &state, self.clock.now());

        for firing in &check.firings {
            info!(
                "event=reminder_fired module=reminders status=ok task={} threshold={}",
                firing.task_id, firing.threshold
            );
            self.sink.notify(&firing.title, &firing.body);
        }

        if check.changed || retrying {
            if let Err(err) = save(self.store.as_ref(), keys::SENT_REMINDERS, &check.state).await {
                error!(
                    "event=reminder_persist module=reminders status=error error={}",
                    err
                );
                *unsaved = Some(check.state.clone());
                return Err(err);
            }
        }

        debug!(
            "event=reminder_poll module=reminders status=ok tasks={} fired={} tracked={}",
            tasks.len(),
            check.firings.len(),
            check.state.len()
        );
        Ok(check)
    }
}

/// Background task polling a [`ReminderService`] on a fixed interval
pub struct ReminderPoller {
    shutdown: oneshot::Sender<()>,
    handle: JoinHandle<()>,
}

impl ReminderPoller {
    /// Starts polling, with the first pass right away.
    ///
    /// Ticks that arrive while a pass is running are dropped. Fails when
    /// `interval` could step over a reminder window.
    pub fn spawn(service: Arc<ReminderService>, interval: Duration) -> Result<Self> {
        validate_interval(interval)?;

        let (shutdown, mut shutdown_rx) = oneshot::channel();
        let handle = tokio::spawn(async move {
            let mut ticker = tokio::time::interval(interval);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);

            loop {
                tokio::select! {
                    biased;
                    _ = &mut shutdown_rx => break,
                    _ = ticker.tick() => {
                        if let Err(err) = service.poll_once().await {
                            warn!(
                                "event=reminder_poll module=reminders status=error error={}",
                                err
                            );
                        }
                    }
                }
            }
            debug!("event=reminder_poller_stop module=reminders status=ok");
        });

        info!(
            "event=reminder_poller_start module=reminders status=ok interval_secs={}",
            interval.as_secs()
        );
        Ok(Self { shutdown, handle })
    }

    /// Stops the timer, letting a pass that is already running finish
    pub async fn shutdown(self) -> Result<()> {
        let _ = self.shutdown.send(());
        self.handle
            .await
            .map_err(|err| OmniDoError::Other(format!("reminder poller failed: {}", err)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        clock::ManualClock,
        domain::reminder::ReminderThreshold,
        storage::MemoryStore,
    };
    use async_trait::async_trait;
    use chrono::{DateTime, Duration as ChronoDuration, TimeZone, Utc};
    use serde_json::Value;
    use std::sync::Mutex as StdMutex;

    #[derive(Default)]
    struct RecordingSink {
        sent: StdMutex<Vec<(String, String)>>,
    }

    impl RecordingSink {
        fn sent(&self) -> Vec<(String, String)> {
            self.sent.lock().unwrap().clone()
        }
    }

    impl NotificationSink for RecordingSink {
        fn notify(&self, title: &str, body: &str) {
            self.sent
                .lock()
                .unwrap()
                .push((title.to_string(), body.to_string()));
        }
    }

    /// Reads fine, fails every write
    struct ReadOnlyStore(MemoryStore);

    #[async_trait]
    impl KeyValueStore for ReadOnlyStore {
        async fn get(&self, key: &str) -> Result<Option<Value>> {
            self.0.get(key).await
        }

        async fn set(&self, _key: &str, _value: Value) -> Result<()> {
            Err(OmniDoError::StorageError("read-only".to_string()))
        }

        async fn delete(&self, _key: &str) -> Result<()> {
            Err(OmniDoError::StorageError("read-only".to_string()))
        }
    }

    /// Fails writes while `failing` is set
    struct FlakyStore {
        inner: Arc<MemoryStore>,
        failing: StdMutex<bool>,
    }

    #[async_trait]
    impl KeyValueStore for FlakyStore {
        async fn get(&self, key: &str) -> Result<Option<Value>> {
            self.inner.get(key).await
        }

        async fn set(&self, key: &str, value: Value) -> Result<()> {
            if *self.failing.lock().unwrap() {
                return Err(OmniDoError::StorageError("disk full".to_string()));
            }
            self.inner.set(key, value).await
        }

        async fn delete(&self, key: &str) -> Result<()> {
            self.inner.delete(key).await
        }
    }

    fn start() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 6, 1, 9, 0, 0).unwrap()
    }

    fn task_due(id: &str, title: &str, due: DateTime<Utc>) -> Task {
        let mut task = Task::with_id(id, title);
        task.date = Some(due);
        task
    }

    struct Fixture {
        store: Arc<MemoryStore>,
        clock: Arc<ManualClock>,
        sink: Arc<RecordingSink>,
        service: Arc<ReminderService>,
    }

    async fn fixture(tasks: Vec<Task>) -> Fixture {
        let store = Arc::new(MemoryStore::new());
        save(store.as_ref(), keys::TASKS, &tasks).await.unwrap();
        let clock = Arc::new(ManualClock::new(start()));
        let sink = Arc::new(RecordingSink::default());
        let service = Arc::new(ReminderService::new(
            store.clone(),
            clock.clone(),
            sink.clone(),
        ));
        Fixture {
            store,
            clock,
            sink,
            service,
        }
    }

    #[tokio::test]
    async fn test_poll_notifies_and_persists_state() {
        let f = fixture(vec![task_due(
            "t1",
            "Submit report",
            start() + ChronoDuration::hours(24),
        )])
        .await;

        let check = f.service.poll_once().await.unwrap();
        assert_eq!(check.firings.len(), 1);
        assert_eq!(
            f.sink.sent(),
            vec![(
                "Reminder: Task due in 1 day".to_string(),
                "Submit report".to_string()
            )]
        );

        let stored = f.store.get(keys::SENT_REMINDERS).await.unwrap().unwrap();
        assert_eq!(stored, serde_json::json!({ "t1": ["1d"] }));

        // Same instant again: nothing new
        f.service.poll_once().await.unwrap();
        assert_eq!(f.sink.sent().len(), 1);
    }

    #[tokio::test]
    async fn test_five_minute_polls_hit_both_windows_once() {
        let f = fixture(vec![task_due(
            "t1",
            "Flight",
            start() + ChronoDuration::hours(30),
        )])
        .await;

        // Walk up to the due date in five-minute steps
        for _ in 0..(30 * 12) {
            f.service.poll_once().await.unwrap();
            f.clock.advance(ChronoDuration::minutes(5));
        }

        let titles: Vec<_> = f.sink.sent().into_iter().map(|(title, _)| title).collect();
        assert_eq!(
            titles,
            vec![
                ReminderThreshold::OneDay.title().to_string(),
                ReminderThreshold::OneHour.title().to_string(),
            ]
        );
    }

    #[tokio::test]
    async fn test_completed_task_state_is_collected() {
        let mut task = task_due("t1", "Pay bill", start() + ChronoDuration::minutes(30));
        let f = fixture(vec![task.clone()]).await;
        f.service.poll_once().await.unwrap();

        task.completed = true;
        save(f.store.as_ref(), keys::TASKS, &vec![task]).await.unwrap();
        let check = f.service.poll_once().await.unwrap();

        assert!(check.state.is_empty());
        let stored = f.store.get(keys::SENT_REMINDERS).await.unwrap().unwrap();
        assert_eq!(stored, serde_json::json!({}));
    }

    #[tokio::test]
    async fn test_unreadable_task_list_skips_pass() {
        let f = fixture(Vec::new()).await;
        f.store
            .set(keys::SENT_REMINDERS, serde_json::json!({ "t1": ["1d"] }))
            .await
            .unwrap();
        f.store
            .set(keys::TASKS, serde_json::json!("garbage"))
            .await
            .unwrap();

        let check = f.service.poll_once().await.unwrap();

        assert!(!check.changed);
        let stored = f.store.get(keys::SENT_REMINDERS).await.unwrap().unwrap();
        assert_eq!(stored, serde_json::json!({ "t1": ["1d"] }));
    }

    #[tokio::test]
    async fn test_persist_failure_is_reported() {
        let inner = MemoryStore::new();
        let tasks = vec![task_due("t1", "Call", start() + ChronoDuration::minutes(10))];
        save(&inner, keys::TASKS, &tasks).await.unwrap();

        let sink = Arc::new(RecordingSink::default());
        let service = ReminderService::new(
            Arc::new(ReadOnlyStore(inner)),
            Arc::new(ManualClock::new(start())),
            sink.clone(),
        );

        assert!(matches!(
            service.poll_once().await,
            Err(OmniDoError::StorageError(_))
        ));
        assert_eq!(sink.sent().len(), 1);
    }

    #[tokio::test]
    async fn test_failed_persist_does_not_repeat_notification() {
        let inner = MemoryStore::new();
        let tasks = vec![task_due("t1", "Call", start() + ChronoDuration::minutes(10))];
        save(&inner, keys::TASKS, &tasks).await.unwrap();

        let clock = Arc::new(ManualClock::new(start()));
        let sink = Arc::new(RecordingSink::default());
        let service = ReminderService::new(
            Arc::new(ReadOnlyStore(inner)),
            clock.clone(),
            sink.clone(),
        );

        for _ in 0..3 {
            assert!(service.poll_once().await.is_err());
            clock.advance(ChronoDuration::minutes(1));
        }

        assert_eq!(sink.sent().len(), 1);
    }

    #[tokio::test]
    async fn test_unsaved_state_is_written_once_store_recovers() {
        let f = fixture(vec![task_due(
            "t1",
            "Call",
            start() + ChronoDuration::minutes(10),
        )])
        .await;
        let flaky = Arc::new(FlakyStore {
            inner: f.store.clone(),
            failing: StdMutex::new(true),
        });
        let service = ReminderService::new(flaky.clone(), f.clock.clone(), f.sink.clone());

        assert!(service.poll_once().await.is_err());
        assert!(f.store.get(keys::SENT_REMINDERS).await.unwrap().is_none());

        *flaky.failing.lock().unwrap() = false;
        let check = service.poll_once().await.unwrap();

        assert!(check.firings.is_empty());
        assert_eq!(f.sink.sent().len(), 1);
        let stored = f.store.get(keys::SENT_REMINDERS).await.unwrap().unwrap();
        assert_eq!(stored, serde_json::json!({ "t1": ["1h"] }));
    }

    #[tokio::test]
    async fn test_custom_tasks_key() {
        let store = Arc::new(MemoryStore::new());
        let key = keys::project_tasks(Some("7"));
        let tasks = vec![task_due("p1", "Demo", start() + ChronoDuration::hours(1))];
        save(store.as_ref(), &key, &tasks).await.unwrap();

        let sink = Arc::new(RecordingSink::default());
        let service = ReminderService::new(
            store,
            Arc::new(ManualClock::new(start())),
            sink.clone(),
        )
        .with_tasks_key(key);

        service.poll_once().await.unwrap();
        assert_eq!(sink.sent()[0].1, "Demo");
    }

    #[test]
    fn test_spawn_rejects_interval_of_an_hour() {
        let service = Arc::new(ReminderService::new(
            Arc::new(MemoryStore::new()),
            Arc::new(ManualClock::new(start())),
            Arc::new(RecordingSink::default()),
        ));
        assert!(matches!(
            ReminderPoller::spawn(service, Duration::from_secs(3600)),
            Err(OmniDoError::ConfigError(_))
        ));
    }

    #[tokio::test(start_paused = true)]
    async fn test_poller_runs_immediately_and_stops() {
        let f = fixture(vec![task_due(
            "t1",
            "Meeting",
            start() + ChronoDuration::minutes(45),
        )])
        .await;

        let poller = ReminderPoller::spawn(f.service.clone(), Duration::from_secs(300)).unwrap();
        tokio::time::sleep(Duration::from_secs(1)).await;
        assert_eq!(f.sink.sent().len(), 1);

        poller.shutdown().await.unwrap();

        f.store.delete(keys::SENT_REMINDERS).await.unwrap();
        tokio::time::sleep(Duration::from_secs(600)).await;
        assert_eq!(f.sink.sent().len(), 1);
    }
}
