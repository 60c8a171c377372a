use log::info;

/// Destination for reminder notifications. Delivery is best effort and
/// nothing is reported back.
pub trait NotificationSink: Send + Sync {
    fn notify(&self, title: &str, body: &str);
}

/// Writes notifications to the log, for headless runs
#[derive(Debug, Clone, Copy, Default)]
pub struct LogNotifier;

impl NotificationSink for LogNotifier {
    fn notify(&self, title: &str, body: &str) {
        info!(
            "event=notification module=notify status=ok title={:?} body={:?}",
            title, body
        );
    }
}

impl<F> NotificationSink for F
where
    F: Fn(&str, &str) + Send + Sync,
{
    fn notify(&self, title: &str, body: &str) {
        self(title, body)
    }
}
