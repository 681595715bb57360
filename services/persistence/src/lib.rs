//! Persistence layer for the exchange platform
//!
//! Defines the `Store` capability the gateway depends on and two
//! implementations of it:
//!
//! - `PgStore`: Postgres via a sqlx connection pool, schema in `migrations/`
//! - `MemoryStore`: DashMap tables, used for local runs without a database
//!   and as the test double for the compliance and HTTP layers

pub mod memory;
pub mod postgres;
pub mod store;

pub use memory::MemoryStore;
pub use postgres::PgStore;
pub use store::{ClientStore, ComplianceStore, ExchangeStore, Store, StoreResult, TradingStore};
pub use types::errors::StoreError;
