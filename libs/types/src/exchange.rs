//! Exchange requests and their audit trail
//!
//! An exchange is one client request to convert `from_amount` of
//! `from_currency` into `to_currency`. Settlement moves it through the
//! status lifecycle; every transition is mirrored in `TransactionLog`.

use crate::ids::{ClientId, ExchangeId};
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Exchange status
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ExchangeStatus {
    Pending,
    Processing,
    Completed,
    Failed,
    Cancelled,
}

text_enum!(ExchangeStatus, "exchange status" {
    Pending => "pending",
    Processing => "processing",
    Completed => "completed",
    Failed => "failed",
    Cancelled => "cancelled",
});

impl ExchangeStatus {
    /// Statuses whose amounts count against the rolling daily limit
    pub const DAILY_USAGE: [ExchangeStatus; 3] = [
        ExchangeStatus::Completed,
        ExchangeStatus::Processing,
        ExchangeStatus::Pending,
    ];

    pub fn counts_toward_daily_usage(&self) -> bool {
        Self::DAILY_USAGE.contains(self)
    }
}

/// Exchange record
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Exchange {
    pub id: ExchangeId,
    pub client_id: ClientId,
    pub from_currency: String,
    pub to_currency: String,
    pub from_amount: Decimal,
    pub to_amount: Decimal,
    pub exchange_rate: Decimal,
    pub from_wallet: String,
    pub to_wallet: String,
    pub status: ExchangeStatus,
    pub notes: String,
    pub transaction_hash: Option<String>,
    pub created_at: DateTime<Utc>,
    pub completed_at: Option<DateTime<Utc>>,
}

/// Fields for inserting a new exchange; the store assigns id and timestamps
#[derive(Debug, Clone, PartialEq)]
pub struct NewExchange {
    pub client_id: ClientId,
    pub from_currency: String,
    pub to_currency: String,
    pub from_amount: Decimal,
    pub to_amount: Decimal,
    pub exchange_rate: Decimal,
    pub from_wallet: String,
    pub to_wallet: String,
    pub notes: String,
}

impl NewExchange {
    /// Materialize the stored row in `pending` state
    pub fn into_exchange(self, id: ExchangeId, now: DateTime<Utc>) -> Exchange {
        Exchange {
            id,
            client_id: self.client_id,
            from_currency: self.from_currency,
            to_currency: self.to_currency,
            from_amount: self.from_amount,
            to_amount: self.to_amount,
            exchange_rate: self.exchange_rate,
            from_wallet: self.from_wallet,
            to_wallet: self.to_wallet,
            status: ExchangeStatus::Pending,
            notes: self.notes,
            transaction_hash: None,
            created_at: now,
            completed_at: None,
        }
    }
}

/// Exchange joined with the owning client's contact details
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExchangeView {
    #[serde(flatten)]
    pub exchange: Exchange,
    pub email: Option<String>,
    pub full_name: Option<String>,
    pub telegram_username: Option<String>,
    pub phone: Option<String>,
}

/// Filter for exchange listings; every field binds as a query parameter
#[derive(Debug, Clone, PartialEq)]
pub struct ExchangeFilter {
    pub client_id: Option<ClientId>,
    pub status: Option<ExchangeStatus>,
    pub limit: u32,
    pub offset: u32,
}

impl Default for ExchangeFilter {
    fn default() -> Self {
        Self {
            client_id: None,
            status: None,
            limit: 50,
            offset: 0,
        }
    }
}

/// One page of an exchange listing
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ExchangePage {
    pub exchanges: Vec<ExchangeView>,
    pub total: i64,
    pub limit: u32,
    pub offset: u32,
}

/// Status update for an existing exchange
#[derive(Debug, Clone, PartialEq)]
pub struct ExchangeStatusUpdate {
    pub status: ExchangeStatus,
    pub transaction_hash: Option<String>,
}

/// Append-only audit entry for an exchange
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TransactionLog {
    pub exchange_id: ExchangeId,
    pub action: String,
    pub status_to: Option<ExchangeStatus>,
    pub notes: String,
    pub performed_by: String,
    pub created_at: DateTime<Utc>,
}

impl TransactionLog {
    /// Entry written by the platform itself rather than an operator
    pub fn system(
        exchange_id: ExchangeId,
        action: impl Into<String>,
        status_to: Option<ExchangeStatus>,
        notes: impl Into<String>,
        now: DateTime<Utc>,
    ) -> Self {
        Self {
            exchange_id,
            action: action.into(),
            status_to,
            notes: notes.into(),
            performed_by: "system".to_string(),
            created_at: now,
        }
    }
}

/// Client-facing notification
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Notification {
    pub client_id: ClientId,
    pub kind: String,
    pub title: String,
    pub message: String,
    pub created_at: DateTime<Utc>,
}

/// Quoted conversion rate between two currencies from one source
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExchangeRate {
    pub from_currency: String,
    pub to_currency: String,
    pub rate: Decimal,
    pub source: String,
    pub updated_at: DateTime<Utc>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_daily_usage_statuses() {
        assert!(ExchangeStatus::Pending.counts_toward_daily_usage());
        assert!(ExchangeStatus::Processing.counts_toward_daily_usage());
        assert!(ExchangeStatus::Completed.counts_toward_daily_usage());
        assert!(!ExchangeStatus::Failed.counts_toward_daily_usage());
        assert!(!ExchangeStatus::Cancelled.counts_toward_daily_usage());
    }

    #[test]
    fn test_new_exchange_starts_pending() {
        let now = Utc::now();
        let exchange = NewExchange {
            client_id: ClientId::new(),
            from_currency: "BTC".to_string(),
            to_currency: "USDT".to_string(),
            from_amount: Decimal::from(1),
            to_amount: Decimal::from(50_000),
            exchange_rate: Decimal::from(50_000),
            from_wallet: String::new(),
            to_wallet: String::new(),
            notes: String::new(),
        }
        .into_exchange(ExchangeId::new(), now);

        assert_eq!(exchange.status, ExchangeStatus::Pending);
        assert_eq!(exchange.created_at, now);
        assert!(exchange.completed_at.is_none());
    }

    #[test]
    fn test_exchange_filter_defaults() {
        let filter = ExchangeFilter::default();
        assert_eq!(filter.limit, 50);
        assert_eq!(filter.offset, 0);
        assert!(filter.client_id.is_none());
    }
}
