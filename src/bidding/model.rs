use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// A user's single live bid on an auction. One row per (auction, user);
/// revisions overwrite the amount in place.
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct StandingBid {
    pub id: i64,
    pub auction_id: i64,
    pub user_id: i64,
    pub amount: Decimal,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Append-only audit trail of every amount a standing bid has held,
/// manual and automatic alike.
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct BidHistoryEntry {
    pub id: i64,
    pub standing_bid_id: i64,
    pub auction_id: i64,
    pub user_id: i64,
    pub amount: Decimal,
    pub automatic: bool,
    pub recorded_at: DateTime<Utc>,
}

/// A user's proxy-bidding instruction for one auction: keep raising my bid
/// by `increment_amount` up to `max_amount` whenever someone outbids me.
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct AutoBidRule {
    pub id: i64,
    pub auction_id: i64,
    pub user_id: i64,
    pub max_amount: Decimal,
    pub increment_amount: Decimal,
    pub created_at: DateTime<Utc>,
}
