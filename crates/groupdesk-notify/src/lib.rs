//! Best-effort notification delivery for GroupDesk.
//!
//! Registry operations publish events (advisor registered, client linked,
//! client unlinked) through a [`NotifierHandle`]. Publishing never blocks
//! and never fails the operation that triggered it.

pub mod error;
pub mod event;
pub mod sink;
pub mod worker;

pub use error::{NotifyError, NotifyResult};
pub use event::{Notification, NotificationEvent};
pub use sink::{BroadcastNotifier, LogNotifier, NotificationSink, RecordingNotifier};
pub use worker::{spawn_notifier, NotifierHandle, NotifierMsg};
