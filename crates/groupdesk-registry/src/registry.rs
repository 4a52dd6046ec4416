//! Advisor registry and client link table.
//!
//! # Invariants
//!
//! - A user has at most one advisor record, and advisor codes are unique.
//!   Both are enforced by the advisor store's atomic insert; a code
//!   collision is retried with a fresh code.
//! - A client has at most one active link. The link store's conditional
//!   insert is the authority; the pre-check here only produces a friendlier
//!   error on the common path.
//! - `total_clients` moves only through `AdvisorStore::adjust_client_count`,
//!   never through a read-modify-write in this module.

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tracing::{debug, error, info, warn};

use groupdesk_core::{
    Advisor, AdvisorCode, AdvisorId, AdvisorProfile, ClientLink, CommissionRate, UserId, UserRole,
};
use groupdesk_notify::{Notification, NotifierHandle};
use groupdesk_store::{AdvisorProfileUpdate, AdvisorStore, LinkStore, StoreError, UserDirectory};
use groupdesk_telemetry::Metrics;

use crate::codes::{CodeGenerator, RandomCodeGenerator};
use crate::config::AdvisorConfig;
use crate::error::{RegistryError, RegistryResult};

/// Returned to a client after a successful link.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LinkReceipt {
    pub link: ClientLink,
    pub advisor: AdvisorProfile,
}

/// Advisor registration, lookup and client linking.
pub struct AdvisorRegistry {
    config: AdvisorConfig,
    users: Arc<dyn UserDirectory>,
    advisors: Arc<dyn AdvisorStore>,
    links: Arc<dyn LinkStore>,
    notifier: NotifierHandle,
    codes: Arc<dyn CodeGenerator>,
}

impl AdvisorRegistry {
    pub fn new(
        config: AdvisorConfig,
        users: Arc<dyn UserDirectory>,
        advisors: Arc<dyn AdvisorStore>,
        links: Arc<dyn LinkStore>,
        notifier: NotifierHandle,
    ) -> Self {
        Self {
            config,
            users,
            advisors,
            links,
            notifier,
            codes: Arc::new(RandomCodeGenerator),
        }
    }

    /// Replace the code generator (tests use a scripted one).
    #[must_use]
    pub fn with_code_generator(mut self, codes: Arc<dyn CodeGenerator>) -> Self {
        self.codes = codes;
        self
    }

    pub fn config(&self) -> &AdvisorConfig {
        &self.config
    }

    // ------------------------------------------------------------------------
    // Advisor registry
    // ------------------------------------------------------------------------

    /// Register `user_id` as an advisor.
    ///
    /// An omitted rate becomes `AdvisorConfig::default_commission_bps`. On
    /// success the user's role is promoted and a registration notification
    /// is queued.
    pub async fn register_advisor(
        &self,
        user_id: UserId,
        commission_rate: Option<CommissionRate>,
        description: Option<String>,
    ) -> RegistryResult<Advisor> {
        let mut user = self
            .users
            .find_by_id(user_id)
            .await?
            .ok_or(RegistryError::UserNotFound)?;

        if self.advisors.find_by_user(user_id).await?.is_some() {
            return Err(RegistryError::AlreadyAdvisor);
        }

        let rate = self.check_rate(commission_rate.unwrap_or_else(|| self.config.default_rate()))?;
        let description = self.check_description(description)?;

        // Promote first; a failed insert restores the previous role.
        let previous_role = user.role;
        user.role = UserRole::Advisor;
        let mut user = self.users.update(user).await?;

        let advisor = match self.insert_with_fresh_code(user_id, rate, description).await {
            Ok(advisor) => advisor,
            // A concurrent registration for the same user won; its role stays.
            Err(e @ RegistryError::AlreadyAdvisor) => return Err(e),
            Err(e) => {
                user.role = previous_role;
                if let Err(rollback) = self.users.update(user).await {
                    warn!(user_id = %user_id, error = %rollback, "Failed to restore role after registration failure");
                }
                return Err(e);
            }
        };

        info!(
            advisor_id = %advisor.id,
            user_id = %user_id,
            advisor_code = %advisor.advisor_code,
            commission_bps = advisor.commission_rate.bps(),
            "Advisor registered"
        );
        Metrics::advisor_registered();
        self.notifier.publish(Notification::advisor_registered(&advisor));

        Ok(advisor)
    }

    async fn insert_with_fresh_code(
        &self,
        user_id: UserId,
        rate: CommissionRate,
        description: Option<String>,
    ) -> RegistryResult<Advisor> {
        let attempts = self.config.code_generation_attempts.max(1);
        for attempt in 1..=attempts {
            let code = self.codes.generate();
            let candidate = Advisor::new(user_id, code.clone(), rate, description.clone());
            match self.advisors.insert(candidate).await {
                Ok(advisor) => return Ok(advisor),
                Err(StoreError::Conflict(reason)) => {
                    // A concurrent registration for the same user also lands here.
                    if self.advisors.find_by_user(user_id).await?.is_some() {
                        return Err(RegistryError::AlreadyAdvisor);
                    }
                    debug!(attempt, advisor_code = %code, %reason, "Advisor code collision, retrying");
                }
                Err(e) => return Err(e.into()),
            }
        }
        error!(user_id = %user_id, attempts, "Advisor code generation exhausted");
        Err(RegistryError::CodeSpaceExhausted(attempts))
    }

    /// Public lookup by shareable code. Malformed codes are simply not found.
    pub async fn get_advisor_by_code(&self, code: &str) -> RegistryResult<AdvisorProfile> {
        let code = AdvisorCode::parse(code).map_err(|_| RegistryError::AdvisorNotFound)?;
        self.advisors
            .find_by_code(code)
            .await?
            .map(|a| a.profile())
            .ok_or(RegistryError::AdvisorNotFound)
    }

    pub async fn get_advisor(&self, advisor_id: AdvisorId) -> RegistryResult<Advisor> {
        self.advisors
            .find_by_id(advisor_id)
            .await?
            .ok_or(RegistryError::AdvisorNotFound)
    }

    pub async fn find_by_user(&self, user_id: UserId) -> RegistryResult<Option<Advisor>> {
        Ok(self.advisors.find_by_user(user_id).await?)
    }

    /// Change description and/or rate. Existing links keep their snapshot.
    ///
    /// An empty description clears it.
    pub async fn update_profile(
        &self,
        advisor_id: AdvisorId,
        description: Option<String>,
        commission_rate: Option<CommissionRate>,
    ) -> RegistryResult<Advisor> {
        let update = AdvisorProfileUpdate {
            description: match description {
                Some(d) if d.trim().is_empty() => Some(None),
                Some(d) => Some(self.check_description(Some(d))?),
                None => None,
            },
            commission_rate: commission_rate.map(|r| self.check_rate(r)).transpose()?,
        };

        if update.is_empty() {
            return self.get_advisor(advisor_id).await;
        }

        let advisor = self
            .advisors
            .update_profile(advisor_id, update)
            .await
            .map_err(not_found_as_advisor)?;
        info!(
            advisor_id = %advisor_id,
            commission_bps = advisor.commission_rate.bps(),
            "Advisor profile updated"
        );
        Ok(advisor)
    }

    /// Soft-delete: the record stays, new links are refused.
    pub async fn deactivate_advisor(&self, advisor_id: AdvisorId) -> RegistryResult<Advisor> {
        let advisor = self
            .advisors
            .set_active(advisor_id, false)
            .await
            .map_err(not_found_as_advisor)?;
        info!(advisor_id = %advisor_id, "Advisor deactivated");
        Ok(advisor)
    }

    // ------------------------------------------------------------------------
    // Client link table
    // ------------------------------------------------------------------------

    /// Link `client_id` to the advisor owning `advisor_code`.
    ///
    /// The advisor's current rate is snapshotted on the link.
    pub async fn link_client_to_advisor(
        &self,
        client_id: UserId,
        advisor_code: &str,
    ) -> RegistryResult<LinkReceipt> {
        let code = AdvisorCode::parse(advisor_code).map_err(|_| RegistryError::InvalidAdvisorCode)?;
        let advisor = self
            .advisors
            .find_by_code(code)
            .await?
            .filter(|a| a.is_active)
            .ok_or(RegistryError::InvalidAdvisorCode)?;

        if self.users.find_by_id(client_id).await?.is_none() {
            return Err(RegistryError::ClientNotFound);
        }
        if advisor.user_id == client_id {
            return Err(RegistryError::SelfLink);
        }
        if self.links.find_active_by_client(client_id).await?.is_some() {
            return Err(RegistryError::AlreadyLinked);
        }

        let link = self
            .links
            .create_active(ClientLink::new(advisor.id, client_id, advisor.commission_rate))
            .await
            .map_err(|e| match e {
                StoreError::Conflict(_) => RegistryError::AlreadyLinked,
                other => other.into(),
            })?;

        let total_clients = match self.advisors.adjust_client_count(advisor.id, 1).await {
            Ok(n) => n,
            Err(e) => {
                warn!(advisor_id = %advisor.id, error = %e, "Failed to increment client count");
                advisor.total_clients
            }
        };
        Metrics::link_opened();

        info!(
            advisor_id = %advisor.id,
            client_id = %client_id,
            commission_bps = link.commission_rate.bps(),
            total_clients,
            "Client linked"
        );

        self.notifier.publish(Notification::client_linked(client_id, &advisor));
        self.notifier
            .publish(Notification::advisor_client_linked(&advisor, client_id));

        let mut profile = advisor.profile();
        profile.total_clients = total_clients;
        Ok(LinkReceipt {
            link,
            advisor: profile,
        })
    }

    /// Close the active link between `client_id` and `advisor_id`.
    pub async fn unlink_client_from_advisor(
        &self,
        client_id: UserId,
        advisor_id: AdvisorId,
    ) -> RegistryResult<ClientLink> {
        let link = self
            .links
            .deactivate(client_id, advisor_id)
            .await
            .map_err(|e| match e {
                StoreError::NotFound(_) => RegistryError::NotLinked,
                other => other.into(),
            })?;

        match self.advisors.adjust_client_count(advisor_id, -1).await {
            Ok(total_clients) => {
                info!(advisor_id = %advisor_id, client_id = %client_id, total_clients, "Client unlinked");
            }
            Err(e) => {
                warn!(advisor_id = %advisor_id, error = %e, "Failed to decrement client count");
            }
        }
        Metrics::link_closed();

        self.notifier
            .publish(Notification::client_unlinked(client_id, advisor_id));

        Ok(link)
    }

    /// Active links in creation order; the fan-out order for group trades.
    pub async fn active_links(&self, advisor_id: AdvisorId) -> RegistryResult<Vec<ClientLink>> {
        Ok(self.links.list_by_advisor(advisor_id, true).await?)
    }

    /// Every link the advisor ever had, including closed ones.
    pub async fn links_for_advisor(&self, advisor_id: AdvisorId) -> RegistryResult<Vec<ClientLink>> {
        Ok(self.links.list_by_advisor(advisor_id, false).await?)
    }

    pub async fn active_link_for_client(
        &self,
        client_id: UserId,
    ) -> RegistryResult<Option<ClientLink>> {
        Ok(self.links.find_active_by_client(client_id).await?)
    }

    // ------------------------------------------------------------------------
    // Validation helpers
    // ------------------------------------------------------------------------

    fn check_rate(&self, rate: CommissionRate) -> RegistryResult<CommissionRate> {
        if !self.config.contains(rate) {
            return Err(RegistryError::CommissionOutOfRange {
                bps: rate.bps(),
                min_bps: self.config.min_commission_bps,
                max_bps: self.config.max_commission_bps,
            });
        }
        Ok(rate)
    }

    fn check_description(&self, description: Option<String>) -> RegistryResult<Option<String>> {
        match description {
            Some(d) if d.chars().count() > self.config.max_description_len => {
                Err(RegistryError::DescriptionTooLong {
                    max: self.config.max_description_len,
                })
            }
            other => Ok(other),
        }
    }
}

fn not_found_as_advisor(e: StoreError) -> RegistryError {
    match e {
        StoreError::NotFound(_) => RegistryError::AdvisorNotFound,
        other => other.into(),
    }
}
