use crate::status::Phase;
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// One item's timed bidding window.
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct Auction {
    pub id: i64,
    pub item_name: String,
    pub catalog_id: String,
    pub image_url: Option<String>,
    /// Informational valuation of the item itself, not a bidding bound.
    pub base_item_price: Decimal,
    /// The bidding floor: no accepted bid may be below this.
    pub base_bid_price: Decimal,
    pub start_time: DateTime<Utc>,
    pub end_time: DateTime<Utc>,
    /// Cached phase; re-derived from the window on every access that matters.
    pub status: Phase,
    pub created_by: i64,
    pub result_declared: bool,
    pub winner_id: Option<i64>,
    pub declared_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
}
