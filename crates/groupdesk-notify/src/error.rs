//! Notification error types.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum NotifyError {
    #[error("Delivery failed: {0}")]
    Delivery(String),

    #[error("Notifier queue full")]
    QueueFull,

    #[error("Notifier stopped")]
    Closed,
}

pub type NotifyResult<T> = Result<T, NotifyError>;
