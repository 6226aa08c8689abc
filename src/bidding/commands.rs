/// Bid Ledger commands: place, revise, and the auto-bid rule surface.
/// Every mutation runs inside the owning auction's critical section
/// (a Postgres advisory transaction lock) so the one-bid-per-user invariant
/// holds under concurrent revisions and engine reactions.
// region:    --- Imports
use crate::bidding::auto_bid;
use crate::bidding::model::{AutoBidRule, StandingBid};
use crate::database::DatabaseManager;
use crate::error::{Error, Result};
use crate::notifier::{AutoBidAction, AutoBidUpdate, BidAction, BidUpdate, Notifier};
use crate::query::{handlers, queries};
use crate::status::{self, Phase};
use chrono::Utc;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use tracing::info;

// endregion: --- Imports

// region:    --- Commands

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct PlaceBidCommand {
    pub amount: Decimal,
}

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct ReviseBidCommand {
    pub amount: Decimal,
}

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct SetAutoBidCommand {
    pub max_amount: Decimal,
    pub increment_amount: Decimal,
}

// endregion: --- Commands

// region:    --- Bid Ledger

/// First bid by a user on an auction. A second call for the same pair fails;
/// this is a deliberate one-bid-then-revise model.
pub async fn place_bid(
    db: &DatabaseManager,
    notifier: &dyn Notifier,
    auction_id: i64,
    user_id: i64,
    cmd: PlaceBidCommand,
) -> Result<StandingBid> {
    info!(
        "{:<12} --> place bid: auction={}, user={}, amount={}",
        "Command", auction_id, user_id, cmd.amount
    );

    let auction = handlers::get_auction(db, auction_id).await?;
    let phase =
        status::refresh_phase(db.pool(), auction.id, auction.start_time, auction.end_time).await?;
    let now = Utc::now();
    if phase != Phase::Active || now < auction.start_time || now > auction.end_time {
        return Err(Error::StateConflict(
            "Bidding is not active for this auction".to_string(),
        ));
    }
    if cmd.amount < auction.base_bid_price {
        return Err(Error::Validation(
            "Bid amount must be greater than or equal to base bid price".to_string(),
        ));
    }

    let amount = cmd.amount;
    let bid = db
        .transaction(|tx| {
            Box::pin(async move {
                sqlx::query(queries::LOCK_AUCTION)
                    .bind(auction_id)
                    .execute(&mut **tx)
                    .await?;

                let existing = sqlx::query_as::<_, StandingBid>(queries::GET_USER_STANDING_BID)
                    .bind(auction_id)
                    .bind(user_id)
                    .fetch_optional(&mut **tx)
                    .await?;
                if existing.is_some() {
                    return Err(Error::StateConflict(
                        "You already have a bid on this auction. Use update instead.".to_string(),
                    ));
                }

                let bid = sqlx::query_as::<_, StandingBid>(queries::INSERT_STANDING_BID)
                    .bind(auction_id)
                    .bind(user_id)
                    .bind(amount)
                    .fetch_one(&mut **tx)
                    .await?;

                sqlx::query(queries::INSERT_BID_HISTORY)
                    .bind(bid.id)
                    .bind(auction_id)
                    .bind(user_id)
                    .bind(amount)
                    .bind(false)
                    .execute(&mut **tx)
                    .await?;

                Ok(bid)
            })
        })
        .await?;

    // Proxy resolution and the notification are best-effort side effects;
    // the manual bid above already committed.
    auto_bid::resolve_best_effort(db, notifier, auction_id).await;
    notifier
        .bid_update(
            auction_id,
            &BidUpdate {
                action: BidAction::Placed,
                bid: bid.clone(),
            },
        )
        .await;

    Ok(bid)
}

/// Overwrites the caller's standing bid amount while the window is open.
pub async fn revise_bid(
    db: &DatabaseManager,
    notifier: &dyn Notifier,
    bid_id: i64,
    user_id: i64,
    cmd: ReviseBidCommand,
) -> Result<StandingBid> {
    info!(
        "{:<12} --> revise bid: bid={}, user={}, amount={}",
        "Command", bid_id, user_id, cmd.amount
    );

    let bid = handlers::get_standing_bid(db, bid_id).await?;
    if bid.user_id != user_id {
        return Err(Error::Forbidden(
            "You can edit only your own bids".to_string(),
        ));
    }

    let auction = handlers::get_auction(db, bid.auction_id).await?;
    let phase =
        status::refresh_phase(db.pool(), auction.id, auction.start_time, auction.end_time).await?;
    let now = Utc::now();
    if now > auction.end_time || phase != Phase::Active {
        return Err(Error::StateConflict("Bid window has closed".to_string()));
    }
    if cmd.amount < auction.base_bid_price {
        return Err(Error::Validation(
            "Bid amount must be greater than or equal to base bid price".to_string(),
        ));
    }

    let auction_id = auction.id;
    let amount = cmd.amount;
    let updated = db
        .transaction(|tx| {
            Box::pin(async move {
                sqlx::query(queries::LOCK_AUCTION)
                    .bind(auction_id)
                    .execute(&mut **tx)
                    .await?;

                let updated = sqlx::query_as::<_, StandingBid>(queries::UPDATE_STANDING_BID)
                    .bind(bid_id)
                    .bind(amount)
                    .fetch_one(&mut **tx)
                    .await?;

                sqlx::query(queries::INSERT_BID_HISTORY)
                    .bind(updated.id)
                    .bind(auction_id)
                    .bind(user_id)
                    .bind(amount)
                    .bind(false)
                    .execute(&mut **tx)
                    .await?;

                Ok::<_, Error>(updated)
            })
        })
        .await?;

    auto_bid::resolve_best_effort(db, notifier, auction_id).await;
    notifier
        .bid_update(
            auction_id,
            &BidUpdate {
                action: BidAction::Updated,
                bid: updated.clone(),
            },
        )
        .await;

    Ok(updated)
}

// endregion: --- Bid Ledger

// region:    --- Auto-Bid Rules

/// Idempotent upsert of the caller's proxy-bidding rule, validated against
/// the auction's state at set time only. Immediately runs the engine so a
/// currently-outbid owner is caught up at once.
pub async fn set_auto_bid(
    db: &DatabaseManager,
    notifier: &dyn Notifier,
    auction_id: i64,
    user_id: i64,
    cmd: SetAutoBidCommand,
) -> Result<AutoBidRule> {
    info!(
        "{:<12} --> set auto-bid: auction={}, user={}, max={}, inc={}",
        "Command", auction_id, user_id, cmd.max_amount, cmd.increment_amount
    );

    if cmd.max_amount <= Decimal::ZERO || cmd.increment_amount <= Decimal::ZERO {
        return Err(Error::Validation(
            "max_amount and increment_amount must be positive".to_string(),
        ));
    }

    let auction = handlers::get_auction(db, auction_id).await?;
    let phase =
        status::refresh_phase(db.pool(), auction.id, auction.start_time, auction.end_time).await?;
    let now = Utc::now();
    if phase != Phase::Active || now < auction.start_time || now > auction.end_time {
        return Err(Error::StateConflict(
            "Bidding is not active for this auction".to_string(),
        ));
    }
    if cmd.max_amount < auction.base_bid_price {
        return Err(Error::Validation(
            "max_amount must be at least base bid price".to_string(),
        ));
    }

    let max_amount = cmd.max_amount;
    let increment_amount = cmd.increment_amount;
    let rule = db
        .transaction(|tx| {
            Box::pin(async move {
                sqlx::query_as::<_, AutoBidRule>(queries::UPSERT_AUTO_BID_RULE)
                    .bind(auction_id)
                    .bind(user_id)
                    .bind(max_amount)
                    .bind(increment_amount)
                    .fetch_one(&mut **tx)
                    .await
                    .map_err(Error::from)
            })
        })
        .await?;

    auto_bid::resolve_best_effort(db, notifier, auction_id).await;
    notifier
        .auto_bid_update(
            user_id,
            &AutoBidUpdate {
                auction_id,
                action: AutoBidAction::Set,
                auto_bid: Some(rule.clone()),
            },
        )
        .await;

    Ok(rule)
}

/// Removes the caller's rule. Any standing bid it already produced stays.
pub async fn delete_auto_bid(
    db: &DatabaseManager,
    notifier: &dyn Notifier,
    auction_id: i64,
    user_id: i64,
) -> Result<()> {
    info!(
        "{:<12} --> delete auto-bid: auction={}, user={}",
        "Command", auction_id, user_id
    );

    let deleted = db
        .transaction(|tx| {
            Box::pin(async move {
                sqlx::query(queries::DELETE_AUTO_BID_RULE)
                    .bind(auction_id)
                    .bind(user_id)
                    .fetch_optional(&mut **tx)
                    .await
                    .map_err(Error::from)
            })
        })
        .await?;

    if deleted.is_none() {
        return Err(Error::NotFound(
            "No auto-bid set for this auction".to_string(),
        ));
    }

    notifier
        .auto_bid_update(
            user_id,
            &AutoBidUpdate {
                auction_id,
                action: AutoBidAction::Removed,
                auto_bid: None,
            },
        )
        .await;

    Ok(())
}

// endregion: --- Auto-Bid Rules
