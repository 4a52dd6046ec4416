//! Notification sinks.
//!
//! A sink is where a notification finally goes. Real delivery (email,
//! push, websocket) lives behind this trait; the service ships with a
//! tracing sink, a broadcast sink and a recording sink for tests.

use std::sync::atomic::{AtomicBool, Ordering};

use tokio::sync::broadcast;
use tracing::{debug, info};

use groupdesk_core::BoxFuture;

use crate::error::{NotifyError, NotifyResult};
use crate::event::Notification;

/// Destination for notifications.
pub trait NotificationSink: Send + Sync {
    fn deliver(&self, notification: Notification) -> BoxFuture<'_, NotifyResult<()>>;
}

/// Writes every notification to the log.
#[derive(Debug, Default, Clone, Copy)]
pub struct LogNotifier;

impl NotificationSink for LogNotifier {
    fn deliver(&self, notification: Notification) -> BoxFuture<'_, NotifyResult<()>> {
        Box::pin(async move {
            info!(
                recipient = %notification.recipient,
                kind = notification.kind(),
                "Notification"
            );
            Ok(())
        })
    }
}

/// Republishes notifications on a tokio broadcast channel.
///
/// Having no subscribers is not a failure.
#[derive(Debug, Clone)]
pub struct BroadcastNotifier {
    tx: broadcast::Sender<Notification>,
}

impl BroadcastNotifier {
    pub fn new(capacity: usize) -> Self {
        let (tx, _) = broadcast::channel(capacity.max(1));
        Self { tx }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<Notification> {
        self.tx.subscribe()
    }
}

impl NotificationSink for BroadcastNotifier {
    fn deliver(&self, notification: Notification) -> BoxFuture<'_, NotifyResult<()>> {
        Box::pin(async move {
            if self.tx.send(notification).is_err() {
                debug!("No notification subscribers");
            }
            Ok(())
        })
    }
}

/// Recording sink for testing.
#[derive(Debug, Default)]
pub struct RecordingNotifier {
    delivered: parking_lot::Mutex<Vec<Notification>>,
    fail: AtomicBool,
}

impl RecordingNotifier {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make every following delivery fail.
    pub fn set_failing(&self, fail: bool) {
        self.fail.store(fail, Ordering::SeqCst);
    }

    /// Get delivered notifications.
    pub fn delivered(&self) -> Vec<Notification> {
        self.delivered.lock().clone()
    }

    /// Delivered kinds in order.
    pub fn kinds(&self) -> Vec<&'static str> {
        self.delivered.lock().iter().map(|n| n.kind()).collect()
    }
}

impl NotificationSink for RecordingNotifier {
    fn deliver(&self, notification: Notification) -> BoxFuture<'_, NotifyResult<()>> {
        Box::pin(async move {
            if self.fail.load(Ordering::SeqCst) {
                return Err(NotifyError::Delivery("recording sink set to fail".to_string()));
            }
            self.delivered.lock().push(notification);
            Ok(())
        })
    }
}
