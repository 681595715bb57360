//! Types library for the exchange platform backend
//!
//! Core records shared by the persistence layer, the compliance gate and
//! the HTTP gateway.
//!
//! # Modules
//! - `ids`: Unique identifiers (ClientId, ExchangeId, KycId, ...)
//! - `client`: Client records, verification tiers, KYC/AML status
//! - `exchange`: Exchange requests, transaction logs, rates
//! - `compliance`: Limit tiers, AML checks, KYC verifications, gate decisions
//! - `trading`: Referral codes, limit orders, price alerts, analytics
//! - `errors`: Error taxonomy

/// Implements `as_str`, `Display` and `FromStr` for a fieldless enum whose
/// database and wire representation is a lowercase keyword.
macro_rules! text_enum {
    ($name:ident, $kind:literal { $($variant:ident => $text:literal),+ $(,)? }) => {
        impl $name {
            /// Canonical lowercase keyword, as stored in the database
            pub fn as_str(&self) -> &'static str {
                match self {
                    $(Self::$variant => $text,)+
                }
            }
        }

        impl std::fmt::Display for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                f.write_str(self.as_str())
            }
        }

        impl std::str::FromStr for $name {
            type Err = crate::errors::ParseEnumError;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                match s {
                    $($text => Ok(Self::$variant),)+
                    other => Err(crate::errors::ParseEnumError {
                        kind: $kind,
                        value: other.to_string(),
                    }),
                }
            }
        }
    };
}

// Public modules
pub mod ids;
pub mod client;
pub mod exchange;
pub mod compliance;
pub mod trading;
pub mod errors;

// Library version constant
pub const LIB_VERSION: &str = "1.0.0";

/// Prelude module for convenient imports
pub mod prelude {
    pub use crate::ids::*;
    pub use crate::client::*;
    pub use crate::exchange::*;
    pub use crate::compliance::*;
    pub use crate::trading::*;
    pub use crate::errors::*;
}
