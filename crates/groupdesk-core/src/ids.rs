//! Identifier newtypes.
//!
//! Entity ids are UUID-backed so that users, advisors, links, group trades
//! and commission entries can never be confused at a call site. Order ids
//! come from the order-placement backend and stay opaque strings.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::CoreError;

macro_rules! uuid_id {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(Uuid);

        impl $name {
            /// Generate a fresh random id.
            pub fn new() -> Self {
                Self(Uuid::new_v4())
            }

            pub fn from_uuid(id: Uuid) -> Self {
                Self(id)
            }

            pub fn as_uuid(&self) -> &Uuid {
                &self.0
            }
        }

        impl Default for $name {
            fn default() -> Self {
                Self::new()
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}", self.0)
            }
        }

        impl FromStr for $name {
            type Err = CoreError;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                Uuid::parse_str(s.trim())
                    .map(Self)
                    .map_err(|e| CoreError::InvalidId(format!("{s}: {e}")))
            }
        }
    };
}

uuid_id!(
    /// A platform user. Clients are plain users with a link to an advisor.
    UserId
);
uuid_id!(
    /// An advisor record (distinct from the owning user).
    AdvisorId
);
uuid_id!(
    /// A client-to-advisor link row.
    LinkId
);
uuid_id!(
    /// One fan-out invocation.
    GroupTradeId
);
uuid_id!(
    /// One commission ledger entry.
    CommissionId
);

/// Order id assigned by the order-placement backend.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct OrderId(String);

impl OrderId {
    /// Create a new order id.
    ///
    /// Format: `ord_{timestamp_ms}_{uuid_short}`
    pub fn new() -> Self {
        let ts = chrono::Utc::now().timestamp_millis();
        let uuid_short = &Uuid::new_v4().simple().to_string()[..8];
        Self(format!("ord_{ts}_{uuid_short}"))
    }

    pub fn from_string(s: String) -> Self {
        Self(s)
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Default for OrderId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for OrderId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<String> for OrderId {
    fn from(s: String) -> Self {
        Self::from_string(s)
    }
}

impl From<&str> for OrderId {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

/// Human-shareable advisor code: 8 characters from `[A-Z0-9]`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct AdvisorCode(String);

impl AdvisorCode {
    pub const LEN: usize = 8;
    pub const ALPHABET: &'static [u8] = b"ABCDEFGHIJKLMNOPQRSTUVWXYZ0123456789";

    /// Parse a user-supplied code. Lower-case input is normalised.
    pub fn parse(s: &str) -> crate::Result<Self> {
        let normalized = s.trim().to_ascii_uppercase();
        if normalized.len() != Self::LEN {
            return Err(CoreError::InvalidAdvisorCode(format!(
                "expected {} characters, got {}",
                Self::LEN,
                normalized.len()
            )));
        }
        if !normalized.bytes().all(|b| Self::ALPHABET.contains(&b)) {
            return Err(CoreError::InvalidAdvisorCode(format!(
                "{normalized} contains characters outside A-Z0-9"
            )));
        }
        Ok(Self(normalized))
    }

    /// Build a code from alphabet indices (used by code generators).
    pub fn from_indices(indices: [usize; Self::LEN]) -> Self {
        let s = indices
            .iter()
            .map(|i| Self::ALPHABET[i % Self::ALPHABET.len()] as char)
            .collect();
        Self(s)
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for AdvisorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl FromStr for AdvisorCode {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl TryFrom<String> for AdvisorCode {
    type Error = CoreError;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        Self::parse(&s)
    }
}

impl From<AdvisorCode> for String {
    fn from(code: AdvisorCode) -> Self {
        code.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ids_unique() {
        assert_ne!(UserId::new(), UserId::new());
        assert_ne!(OrderId::new(), OrderId::new());
    }

    #[test]
    fn test_id_parse() {
        let id = AdvisorId::new();
        let parsed: AdvisorId = id.to_string().parse().unwrap();
        assert_eq!(id, parsed);
        assert!("not-a-uuid".parse::<AdvisorId>().is_err());
    }

    #[test]
    fn test_advisor_code_normalises_case() {
        let code = AdvisorCode::parse("ab12cd34").unwrap();
        assert_eq!(code.as_str(), "AB12CD34");
    }

    #[test]
    fn test_advisor_code_rejects_bad_input() {
        assert!(AdvisorCode::parse("SHORT").is_err());
        assert!(AdvisorCode::parse("AB12CD3!").is_err());
        assert!(AdvisorCode::parse("AB12CD345").is_err());
    }

    #[test]
    fn test_advisor_code_from_indices() {
        let code = AdvisorCode::from_indices([0, 1, 2, 25, 26, 35, 36, 71]);
        assert_eq!(code.as_str(), "ABCZ09A9");
    }
}
