//! Trading feature records: referrals, limit orders, price alerts

use crate::ids::{ClientId, ExchangeId, LimitOrderId, PriceAlertId, ReferralCodeId};
use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Referral code owned by a client
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReferralCode {
    pub id: ReferralCodeId,
    pub client_id: ClientId,
    pub code: String,
    pub discount_percent: Decimal,
    pub commission_percent: Decimal,
    pub is_active: bool,
    pub total_referrals: i64,
    pub total_earnings_usd: Decimal,
    pub created_at: DateTime<Utc>,
}

/// Active referral code joined with its owner, for code lookups
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReferralLookup {
    pub referral: ReferralCode,
    pub referrer_name: Option<String>,
    pub referrer_email: String,
}

/// One use of a referral code on an exchange
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReferralUsage {
    pub referral_code_id: ReferralCodeId,
    pub referred_client_id: ClientId,
    pub exchange_id: ExchangeId,
    pub commission_usd: Decimal,
    pub created_at: DateTime<Utc>,
}

/// Referral code with aggregated usage
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReferralStats {
    #[serde(flatten)]
    pub referral: ReferralCode,
    pub usage_count: i64,
    pub total_commission: Option<Decimal>,
}

/// Limit order status
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LimitOrderStatus {
    Active,
    Filled,
    Cancelled,
    Expired,
}

text_enum!(LimitOrderStatus, "limit order status" {
    Active => "active",
    Filled => "filled",
    Cancelled => "cancelled",
    Expired => "expired",
});

/// Order to exchange once the market reaches `target_rate`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LimitOrder {
    pub id: LimitOrderId,
    pub client_id: ClientId,
    pub from_currency: String,
    pub to_currency: String,
    pub from_amount: Decimal,
    pub target_rate: Decimal,
    pub expiry_date: Option<DateTime<Utc>>,
    pub status: LimitOrderStatus,
    pub created_at: DateTime<Utc>,
}

/// Price alert trigger direction
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AlertCondition {
    Above,
    Below,
}

text_enum!(AlertCondition, "alert condition" {
    Above => "above",
    Below => "below",
});

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PriceAlert {
    pub id: PriceAlertId,
    pub client_id: ClientId,
    pub currency: String,
    pub target_price: Decimal,
    pub condition: AlertCondition,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
}

/// Daily aggregate for one currency pair
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TradingAnalytics {
    pub currency_pair: String,
    pub date: NaiveDate,
    pub volume_usd: Decimal,
    pub exchange_count: i64,
    pub avg_rate: Option<Decimal>,
    pub min_rate: Option<Decimal>,
    pub max_rate: Option<Decimal>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_limit_order_status_keywords() {
        assert_eq!(LimitOrderStatus::Cancelled.as_str(), "cancelled");
        assert_eq!(
            "active".parse::<LimitOrderStatus>().unwrap(),
            LimitOrderStatus::Active
        );
    }
}
