/// Winner Resolver.
/// A closed auction's result is declared at most once. The check-and-set is a
/// single conditional UPDATE on `result_declared`, so concurrent declarers
/// (opportunistic read-path calls and the admin endpoint alike) race on the
/// row and only one wins.
// region:    --- Imports
use crate::auction::model::Auction;
use crate::bidding::model::StandingBid;
use crate::database::DatabaseManager;
use crate::error::{Error, Result};
use crate::query::{handlers, queries};
use crate::status::{self, Phase};
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::Serialize;
use tracing::{info, warn};

// endregion: --- Imports

// region:    --- Models

/// Permanent record of one declared outcome.
#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct AuctionResult {
    pub id: i64,
    pub auction_id: i64,
    pub winner_id: i64,
    pub winning_amount: Decimal,
    pub declared_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Copy, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Outcome {
    Win,
    Lose,
}

/// One declared auction from a participant's point of view.
#[derive(Debug, Serialize)]
pub struct MyResult {
    pub auction_id: i64,
    pub item_name: String,
    pub image_url: Option<String>,
    pub end_time: DateTime<Utc>,
    pub declared_at: Option<DateTime<Utc>>,
    pub winner_id: Option<i64>,
    pub outcome: Outcome,
}

// endregion: --- Models

// region:    --- Winner Resolver

/// Opportunistic declaration, invoked incidentally from read paths: silently
/// no-ops unless the auction is closed, undeclared, and has at least one
/// standing bid. Returns the declared auction when this call won the race.
pub async fn declare_if_closed(db: &DatabaseManager, auction: &Auction) -> Result<Option<Auction>> {
    let phase =
        status::refresh_phase(db.pool(), auction.id, auction.start_time, auction.end_time).await?;
    let now = Utc::now();
    if phase != Phase::Closed || now <= auction.end_time || auction.result_declared {
        return Ok(None);
    }

    let Some(highest) = handlers::get_highest_bid(db, auction.id).await? else {
        // No bids means no winner; the auction simply stays undeclared.
        return Ok(None);
    };

    declare(db, auction.id, &highest).await
}

/// Administrator-triggered declaration with user-visible errors: rejects when
/// the window has not passed, when already declared, or when no bids exist.
pub async fn declare_result(
    db: &DatabaseManager,
    auction_id: i64,
) -> Result<(Auction, StandingBid)> {
    info!("{:<12} --> declare result: auction={}", "Command", auction_id);

    let auction = handlers::get_auction(db, auction_id).await?;
    status::refresh_phase(db.pool(), auction.id, auction.start_time, auction.end_time).await?;
    let now = Utc::now();
    if now <= auction.end_time {
        return Err(Error::StateConflict(
            "Cannot declare result before bid end time".to_string(),
        ));
    }
    if auction.result_declared {
        return Err(Error::StateConflict(
            "Result has already been declared for this auction".to_string(),
        ));
    }

    let highest = handlers::get_highest_bid(db, auction_id)
        .await?
        .ok_or_else(|| Error::StateConflict("No bids to declare a winner".to_string()))?;

    match declare(db, auction_id, &highest).await? {
        Some(declared) => Ok((declared, highest)),
        // A concurrent declarer got there between our read and the write.
        None => Err(Error::StateConflict(
            "Result has already been declared for this auction".to_string(),
        )),
    }
}

/// The atomic unit: conditional UPDATE guarded by `result_declared = false`
/// plus the result row insert, in one transaction.
async fn declare(
    db: &DatabaseManager,
    auction_id: i64,
    winning_bid: &StandingBid,
) -> Result<Option<Auction>> {
    let winner_id = winning_bid.user_id;
    let winning_amount = winning_bid.amount;
    let declared_at = Utc::now();

    let declared = db
        .transaction(|tx| {
            Box::pin(async move {
                let auction = sqlx::query_as::<_, Auction>(queries::DECLARE_AUCTION_RESULT)
                    .bind(auction_id)
                    .bind(winner_id)
                    .bind(declared_at)
                    .fetch_optional(&mut **tx)
                    .await?;

                if auction.is_some() {
                    sqlx::query(queries::INSERT_AUCTION_RESULT)
                        .bind(auction_id)
                        .bind(winner_id)
                        .bind(winning_amount)
                        .bind(declared_at)
                        .execute(&mut **tx)
                        .await?;
                }

                Ok::<_, Error>(auction)
            })
        })
        .await?;

    if let Some(a) = &declared {
        info!(
            "{:<12} --> auction {} declared: winner={}, amount={}",
            "Result", a.id, winner_id, winning_amount
        );
    }
    Ok(declared)
}

// endregion: --- Winner Resolver

// region:    --- Result Queries

/// All declared results, newest declaration first.
pub async fn list_all_results(db: &DatabaseManager) -> Result<Vec<AuctionResult>> {
    db.transaction(|tx| {
        Box::pin(async move {
            sqlx::query_as::<_, AuctionResult>(queries::GET_ALL_RESULTS)
                .fetch_all(&mut **tx)
                .await
                .map_err(Error::from)
        })
    })
    .await
}

/// Win/lose per declared auction the caller bid on. Closed but undeclared
/// auctions the caller touched are declared opportunistically first.
pub async fn my_results(db: &DatabaseManager, user_id: i64) -> Result<Vec<MyResult>> {
    info!("{:<12} --> my results for user {}", "Query", user_id);

    let my_bids = handlers::get_user_bids(db, user_id).await?;
    let auction_ids: Vec<i64> = {
        let mut ids: Vec<i64> = my_bids.iter().map(|b| b.auction_id).collect();
        ids.sort_unstable();
        ids.dedup();
        ids
    };
    if auction_ids.is_empty() {
        return Ok(Vec::new());
    }

    for auction_id in &auction_ids {
        match handlers::get_auction(db, *auction_id).await {
            Ok(auction) => {
                if let Err(e) = declare_if_closed(db, &auction).await {
                    warn!(
                        "{:<12} --> opportunistic declaration failed for auction {}: {:?}",
                        "Result", auction_id, e
                    );
                }
            }
            Err(e) => warn!(
                "{:<12} --> skipping auction {}: {:?}",
                "Result", auction_id, e
            ),
        }
    }

    let ids = auction_ids.clone();
    let declared = db
        .transaction(|tx| {
            Box::pin(async move {
                sqlx::query_as::<_, Auction>(queries::GET_DECLARED_AUCTIONS_IN)
                    .bind(&ids)
                    .fetch_all(&mut **tx)
                    .await
                    .map_err(Error::from)
            })
        })
        .await?;

    Ok(declared
        .into_iter()
        .map(|a| {
            let outcome = if a.winner_id == Some(user_id) {
                Outcome::Win
            } else {
                Outcome::Lose
            };
            MyResult {
                auction_id: a.id,
                item_name: a.item_name,
                image_url: a.image_url,
                end_time: a.end_time,
                declared_at: a.declared_at,
                winner_id: a.winner_id,
                outcome,
            }
        })
        .collect())
}

// endregion: --- Result Queries
