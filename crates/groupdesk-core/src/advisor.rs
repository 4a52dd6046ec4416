//! Users, advisors and client links.

use std::fmt;

use alloy::primitives::Address;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::amount::{CommissionRate, UsdAmount};
use crate::ids::{AdvisorCode, AdvisorId, LinkId, UserId};

/// Platform role of a user.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum UserRole {
    Trader,
    Advisor,
    Admin,
}

impl fmt::Display for UserRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Trader => write!(f, "trader"),
            Self::Advisor => write!(f, "advisor"),
            Self::Admin => write!(f, "admin"),
        }
    }
}

/// A platform user, identified by wallet.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    pub id: UserId,
    #[serde(with = "address_str")]
    pub wallet_address: Address,
    pub email: Option<String>,
    pub role: UserRole,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl User {
    pub fn new(wallet_address: Address, role: UserRole) -> Self {
        let now = Utc::now();
        Self {
            id: UserId::new(),
            wallet_address,
            email: None,
            role,
            created_at: now,
            updated_at: now,
        }
    }

    pub fn is_advisor(&self) -> bool {
        self.role == UserRole::Advisor
    }
}

/// Advisor record. Never hard-deleted; `is_active` is the soft-delete flag.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Advisor {
    pub id: AdvisorId,
    pub user_id: UserId,
    pub advisor_code: AdvisorCode,
    pub commission_rate: CommissionRate,
    pub description: Option<String>,
    pub total_earnings: UsdAmount,
    pub total_volume: UsdAmount,
    pub total_clients: u32,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Advisor {
    pub fn new(
        user_id: UserId,
        advisor_code: AdvisorCode,
        commission_rate: CommissionRate,
        description: Option<String>,
    ) -> Self {
        let now = Utc::now();
        Self {
            id: AdvisorId::new(),
            user_id,
            advisor_code,
            commission_rate,
            description,
            total_earnings: UsdAmount::ZERO,
            total_volume: UsdAmount::ZERO,
            total_clients: 0,
            is_active: true,
            created_at: now,
            updated_at: now,
        }
    }

    /// Public-safe projection for unauthenticated lookups.
    pub fn profile(&self) -> AdvisorProfile {
        AdvisorProfile {
            advisor_code: self.advisor_code.clone(),
            description: self.description.clone(),
            commission_rate: self.commission_rate,
            total_clients: self.total_clients,
            is_active: self.is_active,
        }
    }
}

/// Fields of an advisor that anyone holding the code may see.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AdvisorProfile {
    pub advisor_code: AdvisorCode,
    pub description: Option<String>,
    pub commission_rate: CommissionRate,
    pub total_clients: u32,
    pub is_active: bool,
}

/// Client-to-advisor association. Rows are kept after unlinking.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClientLink {
    pub id: LinkId,
    pub advisor_id: AdvisorId,
    pub client_id: UserId,
    pub linked_at: DateTime<Utc>,
    pub unlinked_at: Option<DateTime<Utc>>,
    pub is_active: bool,
    /// Advisor's rate when the link was created.
    pub commission_rate: CommissionRate,
}

impl ClientLink {
    pub fn new(advisor_id: AdvisorId, client_id: UserId, commission_rate: CommissionRate) -> Self {
        Self {
            id: LinkId::new(),
            advisor_id,
            client_id,
            linked_at: Utc::now(),
            unlinked_at: None,
            is_active: true,
            commission_rate,
        }
    }
}

/// Wallet addresses travel as checksummed hex strings.
pub mod address_str {
    use std::str::FromStr;

    use alloy::primitives::Address;
    use serde::{de, Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(address: &Address, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(&address.to_checksum(None))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Address, D::Error> {
        let s = String::deserialize(deserializer)?;
        Address::from_str(&s).map_err(de::Error::custom)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_advisor_profile_hides_earnings() {
        let advisor = Advisor::new(
            UserId::new(),
            AdvisorCode::parse("ABCD1234").unwrap(),
            CommissionRate::from_bps(3000).unwrap(),
            Some("swing trader".to_string()),
        );
        let json = serde_json::to_value(advisor.profile()).unwrap();
        assert_eq!(json["advisor_code"], "ABCD1234");
        assert_eq!(json["commission_rate"], 30.0);
        assert!(json.get("total_earnings").is_none());
        assert!(json.get("user_id").is_none());
    }

    #[test]
    fn test_user_wallet_serde() {
        let wallet = Address::repeat_byte(0xab);
        let user = User::new(wallet, UserRole::Trader);
        let json = serde_json::to_string(&user).unwrap();
        let back: User = serde_json::from_str(&json).unwrap();
        assert_eq!(back.wallet_address, wallet);
        assert!(!back.is_advisor());
    }

    #[test]
    fn test_new_link_is_active() {
        let link = ClientLink::new(AdvisorId::new(), UserId::new(), CommissionRate::ZERO);
        assert!(link.is_active);
        assert!(link.unlinked_at.is_none());
    }
}
