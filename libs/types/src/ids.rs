//! Unique identifier types for platform entities
//!
//! All IDs use UUID v7 so rows sort chronologically by key, which keeps
//! "most recent first" queries cheap on both the Postgres and in-memory stores.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

macro_rules! entity_id {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(Uuid);

        impl $name {
            /// Create a new id with the current timestamp
            pub fn new() -> Self {
                Self(Uuid::now_v7())
            }

            /// Create from existing UUID
            pub fn from_uuid(uuid: Uuid) -> Self {
                Self(uuid)
            }

            /// Get inner UUID
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
            type Err = uuid::Error;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                Uuid::parse_str(s).map(Self)
            }
        }

        impl From<Uuid> for $name {
            fn from(uuid: Uuid) -> Self {
                Self(uuid)
            }
        }
    };
}

entity_id!(
    /// Unique identifier for a client (end user of the exchange)
    ClientId
);

entity_id!(
    /// Unique identifier for an exchange (one conversion request)
    ExchangeId
);

entity_id!(
    /// Unique identifier for a KYC verification submission
    KycId
);

entity_id!(
    /// Unique identifier for an AML check record
    AmlCheckId
);

entity_id!(
    /// Unique identifier for a wallet ownership verification
    WalletVerificationId
);

entity_id!(ReferralCodeId);
entity_id!(LimitOrderId);
entity_id!(PriceAlertId);

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_client_id_creation() {
        let id1 = ClientId::new();
        let id2 = ClientId::new();
        assert_ne!(id1, id2, "ClientIds should be unique");
    }

    #[test]
    fn test_ids_sort_by_creation() {
        let first = ExchangeId::new();
        let second = ExchangeId::new();
        assert!(first < second);
    }

    #[test]
    fn test_id_serialization_is_bare_uuid() {
        let id = KycId::new();
        let json = serde_json::to_string(&id).unwrap();
        assert_eq!(json, format!("\"{}\"", id));

        let deserialized: KycId = serde_json::from_str(&json).unwrap();
        assert_eq!(id, deserialized);
    }

    #[test]
    fn test_id_from_str() {
        let id = ClientId::new();
        let parsed: ClientId = id.to_string().parse().unwrap();
        assert_eq!(id, parsed);
        assert!("not-a-uuid".parse::<ClientId>().is_err());
    }
}
