//! Notifier actor.
//!
//! Callers publish through a cloneable handle that never awaits delivery:
//! `publish` is a `try_send` onto a bounded queue. The actor task drains the
//! queue into the configured sink one notification at a time. Delivery
//! failures and queue overflow are logged and counted, never returned to the
//! code that published.

use std::sync::Arc;

use tokio::sync::{mpsc, oneshot};
use tokio::task::JoinHandle;
use tracing::{debug, warn};

use groupdesk_telemetry::Metrics;

use crate::error::{NotifyError, NotifyResult};
use crate::event::Notification;
use crate::sink::NotificationSink;

// ============================================================================
// NotifierMsg
// ============================================================================

/// Messages for the notifier actor.
#[derive(Debug)]
pub enum NotifierMsg {
    /// Deliver a notification.
    Publish(Notification),

    /// Reply once every earlier message has been processed.
    Flush(oneshot::Sender<()>),

    /// Graceful shutdown.
    Shutdown,
}

// ============================================================================
// NotifierTask
// ============================================================================

/// Notifier actor task.
pub struct NotifierTask {
    rx: mpsc::Receiver<NotifierMsg>,
    sink: Arc<dyn NotificationSink>,
}

impl NotifierTask {
    /// Run the actor loop until shutdown or until every handle is dropped.
    pub async fn run(mut self) {
        debug!("Notifier started");

        while let Some(msg) = self.rx.recv().await {
            match msg {
                NotifierMsg::Publish(notification) => self.deliver(notification).await,
                NotifierMsg::Flush(reply) => {
                    let _ = reply.send(());
                }
                NotifierMsg::Shutdown => {
                    debug!("Notifier shutting down");
                    break;
                }
            }
        }
    }

    async fn deliver(&self, notification: Notification) {
        let kind = notification.kind();
        let recipient = notification.recipient;
        match self.sink.deliver(notification).await {
            Ok(()) => Metrics::notification(kind, "delivered"),
            Err(e) => {
                warn!(kind, recipient = %recipient, error = %e, "Notification delivery failed");
                Metrics::notification(kind, "failed");
            }
        }
    }
}

// ============================================================================
// NotifierHandle
// ============================================================================

/// Cloneable handle for publishing notifications.
#[derive(Clone, Debug)]
pub struct NotifierHandle {
    tx: mpsc::Sender<NotifierMsg>,
}

impl NotifierHandle {
    /// Queue a notification without waiting. Overflow is dropped and logged.
    pub fn publish(&self, notification: Notification) {
        let kind = notification.kind();
        if let Err(e) = self.try_publish(notification) {
            warn!(kind, error = %e, "Notification dropped");
            Metrics::notification(kind, "dropped");
        }
    }

    /// Queue a notification, reporting why it could not be queued.
    pub fn try_publish(&self, notification: Notification) -> NotifyResult<()> {
        self.tx
            .try_send(NotifierMsg::Publish(notification))
            .map_err(|e| match e {
                mpsc::error::TrySendError::Full(_) => NotifyError::QueueFull,
                mpsc::error::TrySendError::Closed(_) => NotifyError::Closed,
            })
    }

    /// Wait until everything queued before this call has been delivered.
    pub async fn flush(&self) -> NotifyResult<()> {
        let (reply_tx, reply_rx) = oneshot::channel();
        self.tx
            .send(NotifierMsg::Flush(reply_tx))
            .await
            .map_err(|_| NotifyError::Closed)?;
        reply_rx.await.map_err(|_| NotifyError::Closed)
    }

    /// Request graceful shutdown.
    pub async fn shutdown(&self) {
        let _ = self.tx.send(NotifierMsg::Shutdown).await;
    }
}

/// Spawn the notifier actor.
pub fn spawn_notifier(
    sink: Arc<dyn NotificationSink>,
    capacity: usize,
) -> (NotifierHandle, JoinHandle<()>) {
    let (tx, rx) = mpsc::channel(capacity.max(1));
    let task = NotifierTask { rx, sink };
    let join = tokio::spawn(task.run());
    (NotifierHandle { tx }, join)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sink::RecordingNotifier;
    use groupdesk_core::{AdvisorId, UserId};

    #[tokio::test]
    async fn test_publish_then_flush_delivers_in_order() {
        let sink = Arc::new(RecordingNotifier::new());
        let (handle, _join) = spawn_notifier(sink.clone(), 16);

        let a = Notification::client_unlinked(UserId::new(), AdvisorId::new());
        let b = Notification::client_unlinked(UserId::new(), AdvisorId::new());
        handle.publish(a.clone());
        handle.publish(b.clone());
        handle.flush().await.unwrap();

        assert_eq!(sink.delivered(), vec![a, b]);
    }

    #[tokio::test]
    async fn test_failing_sink_does_not_stop_actor() {
        let sink = Arc::new(RecordingNotifier::new());
        let (handle, _join) = spawn_notifier(sink.clone(), 16);

        sink.set_failing(true);
        handle.publish(Notification::client_unlinked(UserId::new(), AdvisorId::new()));
        handle.flush().await.unwrap();
        assert!(sink.delivered().is_empty());

        sink.set_failing(false);
        handle.publish(Notification::client_unlinked(UserId::new(), AdvisorId::new()));
        handle.flush().await.unwrap();
        assert_eq!(sink.delivered().len(), 1);
    }

    #[tokio::test]
    async fn test_publish_after_shutdown_is_silent() {
        let sink = Arc::new(RecordingNotifier::new());
        let (handle, join) = spawn_notifier(sink.clone(), 4);
        handle.shutdown().await;
        join.await.unwrap();

        // Must not panic or block.
        handle.publish(Notification::client_unlinked(UserId::new(), AdvisorId::new()));
        assert!(matches!(
            handle.try_publish(Notification::client_unlinked(UserId::new(), AdvisorId::new())),
            Err(NotifyError::Closed)
        ));
        assert!(handle.flush().await.is_err());
    }
}
