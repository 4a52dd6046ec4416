//! Notification events.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use groupdesk_core::{Advisor, AdvisorCode, AdvisorId, UserId};

/// What happened.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum NotificationEvent {
    /// Sent to the user who just became an advisor.
    AdvisorRegistered {
        advisor_id: AdvisorId,
        advisor_code: AdvisorCode,
    },
    /// Sent to the client who linked.
    ClientLinked {
        advisor_id: AdvisorId,
        advisor_code: AdvisorCode,
    },
    /// Sent to the advisor who gained a client.
    AdvisorClientLinked {
        advisor_id: AdvisorId,
        client_id: UserId,
    },
    /// Sent to the client who was unlinked.
    ClientUnlinked { advisor_id: AdvisorId },
}

impl NotificationEvent {
    /// Stable label for logs and metrics.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::AdvisorRegistered { .. } => "advisor_registered",
            Self::ClientLinked { .. } => "client_linked",
            Self::AdvisorClientLinked { .. } => "advisor_client_linked",
            Self::ClientUnlinked { .. } => "client_unlinked",
        }
    }
}

/// An addressed, timestamped event.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Notification {
    pub recipient: UserId,
    pub event: NotificationEvent,
    pub created_at: DateTime<Utc>,
}

impl Notification {
    pub fn new(recipient: UserId, event: NotificationEvent) -> Self {
        Self {
            recipient,
            event,
            created_at: Utc::now(),
        }
    }

    pub fn advisor_registered(advisor: &Advisor) -> Self {
        Self::new(
            advisor.user_id,
            NotificationEvent::AdvisorRegistered {
                advisor_id: advisor.id,
                advisor_code: advisor.advisor_code.clone(),
            },
        )
    }

    pub fn client_linked(client_id: UserId, advisor: &Advisor) -> Self {
        Self::new(
            client_id,
            NotificationEvent::ClientLinked {
                advisor_id: advisor.id,
                advisor_code: advisor.advisor_code.clone(),
            },
        )
    }

    pub fn advisor_client_linked(advisor: &Advisor, client_id: UserId) -> Self {
        Self::new(
            advisor.user_id,
            NotificationEvent::AdvisorClientLinked {
                advisor_id: advisor.id,
                client_id,
            },
        )
    }

    pub fn client_unlinked(client_id: UserId, advisor_id: AdvisorId) -> Self {
        Self::new(client_id, NotificationEvent::ClientUnlinked { advisor_id })
    }

    pub fn kind(&self) -> &'static str {
        self.event.kind()
    }
}
