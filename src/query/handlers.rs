// region:    --- Imports
use super::queries;
use crate::auction::model::Auction;
use crate::bidding::model::{AutoBidRule, BidHistoryEntry, StandingBid};
use crate::database::DatabaseManager;
use crate::error::{Error, Result};
use chrono::{DateTime, Utc};
use serde::Serialize;
use tracing::info;

// endregion: --- Imports

// region:    --- Auction Queries

pub async fn get_auction(db: &DatabaseManager, auction_id: i64) -> Result<Auction> {
    db.transaction(|tx| {
        Box::pin(async move {
            sqlx::query_as::<_, Auction>(queries::GET_AUCTION)
                .bind(auction_id)
                .fetch_optional(&mut **tx)
                .await
                .map_err(Error::from)?
                .ok_or_else(|| Error::NotFound("Auction not found".to_string()))
        })
    })
    .await
}

pub async fn get_all_auctions(db: &DatabaseManager) -> Result<Vec<Auction>> {
    db.transaction(|tx| {
        Box::pin(async move {
            sqlx::query_as::<_, Auction>(queries::GET_ALL_AUCTIONS)
                .fetch_all(&mut **tx)
                .await
                .map_err(Error::from)
        })
    })
    .await
}

/// Auctions whose window contains `now`, earliest start first.
pub async fn get_active_auctions(db: &DatabaseManager, now: DateTime<Utc>) -> Result<Vec<Auction>> {
    db.transaction(|tx| {
        Box::pin(async move {
            sqlx::query_as::<_, Auction>(queries::GET_ACTIVE_AUCTIONS)
                .bind(now)
                .fetch_all(&mut **tx)
                .await
                .map_err(Error::from)
        })
    })
    .await
}

// endregion: --- Auction Queries

// region:    --- Bid Queries

pub async fn get_standing_bid(db: &DatabaseManager, bid_id: i64) -> Result<StandingBid> {
    db.transaction(|tx| {
        Box::pin(async move {
            sqlx::query_as::<_, StandingBid>(queries::GET_STANDING_BID)
                .bind(bid_id)
                .fetch_optional(&mut **tx)
                .await
                .map_err(Error::from)?
                .ok_or_else(|| Error::NotFound("Bid not found".to_string()))
        })
    })
    .await
}

pub async fn find_user_bid(
    db: &DatabaseManager,
    auction_id: i64,
    user_id: i64,
) -> Result<Option<StandingBid>> {
    db.transaction(|tx| {
        Box::pin(async move {
            sqlx::query_as::<_, StandingBid>(queries::GET_USER_STANDING_BID)
                .bind(auction_id)
                .bind(user_id)
                .fetch_optional(&mut **tx)
                .await
                .map_err(Error::from)
        })
    })
    .await
}

/// Full book for an auction: amount descending, earliest creation first on ties.
pub async fn get_auction_bids(db: &DatabaseManager, auction_id: i64) -> Result<Vec<StandingBid>> {
    db.transaction(|tx| {
        Box::pin(async move {
            sqlx::query_as::<_, StandingBid>(queries::GET_AUCTION_BIDS)
                .bind(auction_id)
                .fetch_all(&mut **tx)
                .await
                .map_err(Error::from)
        })
    })
    .await
}

pub async fn get_highest_bid(
    db: &DatabaseManager,
    auction_id: i64,
) -> Result<Option<StandingBid>> {
    db.transaction(|tx| {
        Box::pin(async move {
            sqlx::query_as::<_, StandingBid>(queries::GET_HIGHEST_BID)
                .bind(auction_id)
                .fetch_optional(&mut **tx)
                .await
                .map_err(Error::from)
        })
    })
    .await
}

pub async fn get_user_bids(db: &DatabaseManager, user_id: i64) -> Result<Vec<StandingBid>> {
    db.transaction(|tx| {
        Box::pin(async move {
            sqlx::query_as::<_, StandingBid>(queries::GET_USER_BIDS)
                .bind(user_id)
                .fetch_all(&mut **tx)
                .await
                .map_err(Error::from)
        })
    })
    .await
}

pub async fn get_bid_history(
    db: &DatabaseManager,
    standing_bid_id: i64,
) -> Result<Vec<BidHistoryEntry>> {
    db.transaction(|tx| {
        Box::pin(async move {
            sqlx::query_as::<_, BidHistoryEntry>(queries::GET_BID_HISTORY)
                .bind(standing_bid_id)
                .fetch_all(&mut **tx)
                .await
                .map_err(Error::from)
        })
    })
    .await
}

pub async fn get_auction_bid_history(
    db: &DatabaseManager,
    auction_id: i64,
) -> Result<Vec<BidHistoryEntry>> {
    db.transaction(|tx| {
        Box::pin(async move {
            sqlx::query_as::<_, BidHistoryEntry>(queries::GET_AUCTION_BID_HISTORY)
                .bind(auction_id)
                .fetch_all(&mut **tx)
                .await
                .map_err(Error::from)
        })
    })
    .await
}

// endregion: --- Bid Queries

// region:    --- Auto-Bid Queries

pub async fn find_auto_bid_rule(
    db: &DatabaseManager,
    auction_id: i64,
    user_id: i64,
) -> Result<Option<AutoBidRule>> {
    db.transaction(|tx| {
        Box::pin(async move {
            sqlx::query_as::<_, AutoBidRule>(queries::GET_AUTO_BID_RULE)
                .bind(auction_id)
                .bind(user_id)
                .fetch_optional(&mut **tx)
                .await
                .map_err(Error::from)
        })
    })
    .await
}

// endregion: --- Auto-Bid Queries

// region:    --- Enriched Views

/// An active auction as seen by one bidder.
#[derive(Debug, Serialize)]
pub struct ActiveAuctionView {
    #[serde(flatten)]
    pub auction: Auction,
    pub my_current_bid: Option<StandingBid>,
    pub highest_bid: Option<StandingBid>,
    pub my_auto_bid: Option<AutoBidRule>,
}

/// One of the caller's bids together with its auction and auto-bid rule.
#[derive(Debug, Serialize)]
pub struct MyBidView {
    #[serde(flatten)]
    pub bid: StandingBid,
    pub auction: Auction,
    pub auto_bid: Option<AutoBidRule>,
}

/// Currently active auctions enriched with the caller's own standing bid,
/// the current highest bid, and the caller's auto-bid rule.
pub async fn list_active_auctions(
    db: &DatabaseManager,
    user_id: i64,
) -> Result<Vec<ActiveAuctionView>> {
    info!("{:<12} --> active auctions for user {}", "Query", user_id);
    let auctions = get_active_auctions(db, Utc::now()).await?;
    let mut views = Vec::with_capacity(auctions.len());
    for mut auction in auctions {
        auction.status =
            crate::status::refresh_phase(db.pool(), auction.id, auction.start_time, auction.end_time)
                .await?;
        let my_current_bid = find_user_bid(db, auction.id, user_id).await?;
        let highest_bid = get_highest_bid(db, auction.id).await?;
        let my_auto_bid = find_auto_bid_rule(db, auction.id, user_id).await?;
        views.push(ActiveAuctionView {
            auction,
            my_current_bid,
            highest_bid,
            my_auto_bid,
        });
    }
    Ok(views)
}

/// All of the caller's standing bids, newest first.
pub async fn list_my_bids(db: &DatabaseManager, user_id: i64) -> Result<Vec<MyBidView>> {
    info!("{:<12} --> my bids for user {}", "Query", user_id);
    let bids = get_user_bids(db, user_id).await?;
    let mut views = Vec::with_capacity(bids.len());
    for bid in bids {
        let auction = get_auction(db, bid.auction_id).await?;
        let auto_bid = find_auto_bid_rule(db, bid.auction_id, user_id).await?;
        views.push(MyBidView {
            bid,
            auction,
            auto_bid,
        });
    }
    Ok(views)
}

// endregion: --- Enriched Views
