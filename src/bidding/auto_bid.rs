/// Auto-bid resolution engine.
///
/// After any manual bid change, proxy bidders are caught up one automatic
/// bid per round: the leader is recomputed, the first eligible rule fires at
/// `min(leader + increment, ceiling)`, and the loop repeats until a full
/// round fires nothing or the round cap is hit. One action per round keeps
/// every automatic bid priced against a fresh leader instead of stale state.
// region:    --- Imports
use crate::bidding::model::{AutoBidRule, StandingBid};
use crate::database::DatabaseManager;
use crate::error::{Error, Result};
use crate::notifier::{BidAction, BidUpdate, Notifier};
use crate::query::{handlers, queries};
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use tracing::{debug, info, warn};

// endregion: --- Imports

// region:    --- Engine Core

/// Hard bound on convergence rounds. Two rules with near-equal ceilings can
/// keep outbidding each other; hitting the cap just stops the run and leaves
/// the book in its last-computed state.
pub const MAX_AUTO_BID_ROUNDS: usize = 20;

/// Snapshot of one standing bid, enough to rank the book.
#[derive(Debug, Clone)]
pub struct BookEntry {
    pub user_id: i64,
    pub amount: Decimal,
    pub created_at: DateTime<Utc>,
}

/// Snapshot of one auto-bid rule.
#[derive(Debug, Clone)]
pub struct RuleSnapshot {
    pub user_id: i64,
    pub max_amount: Decimal,
    pub increment_amount: Decimal,
}

/// The single automatic bid a round decided to place, if any.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProposedAutoBid {
    pub user_id: i64,
    pub amount: Decimal,
}

/// Highest amount wins; amount ties go to the earliest-created bid.
fn leader_of(book: &[BookEntry]) -> Option<&BookEntry> {
    book.iter().max_by(|a, b| {
        a.amount
            .cmp(&b.amount)
            .then_with(|| b.created_at.cmp(&a.created_at))
    })
}

/// Decides one round: scans `rules` in their given (stable) order and returns
/// the first automatic bid that would change the book, or None when quiescent.
///
/// Pure over the snapshots, so convergence behavior is testable without a
/// database.
pub fn next_auto_bid(
    base_bid_price: Decimal,
    book: &[BookEntry],
    rules: &[RuleSnapshot],
) -> Option<ProposedAutoBid> {
    let leader = leader_of(book)?;

    for rule in rules {
        // The leader's own rule never fires against itself.
        if rule.user_id == leader.user_id {
            continue;
        }
        // Ceiling at or below the leader cannot help.
        if rule.max_amount <= leader.amount {
            continue;
        }
        let current = book
            .iter()
            .find(|b| b.user_id == rule.user_id)
            .map(|b| b.amount)
            .unwrap_or(Decimal::ZERO);
        // Already leading or tied; guards re-entrancy.
        if current >= leader.amount {
            continue;
        }
        let proposed = (leader.amount + rule.increment_amount).min(rule.max_amount);
        if proposed <= current {
            continue;
        }
        if proposed < base_bid_price {
            continue;
        }
        return Some(ProposedAutoBid {
            user_id: rule.user_id,
            amount: proposed,
        });
    }

    None
}

// endregion: --- Engine Core

// region:    --- Engine Driver

/// Runs the engine to quiescence for one auction. Callers treat failures as
/// best-effort: errors are logged at the call site and never surfaced to the
/// bidder who triggered the run.
pub async fn resolve(
    db: &DatabaseManager,
    notifier: &dyn Notifier,
    auction_id: i64,
) -> Result<()> {
    let auction = match handlers::get_auction(db, auction_id).await {
        Ok(a) => a,
        Err(Error::NotFound(_)) => return Ok(()),
        Err(e) => return Err(e),
    };
    let base_bid_price = auction.base_bid_price;

    for round in 0..MAX_AUTO_BID_ROUNDS {
        let Some((bid, action)) = run_round(db, auction_id, base_bid_price).await? else {
            debug!(
                "{:<12} --> auction {} quiescent after {} round(s)",
                "AutoBid", auction_id, round
            );
            return Ok(());
        };

        info!(
            "{:<12} --> auction {}: user {} auto-bid to {}",
            "AutoBid", auction_id, bid.user_id, bid.amount
        );

        notifier
            .bid_update(auction_id, &BidUpdate { action, bid })
            .await;
    }

    warn!(
        "{:<12} --> auction {} hit the round cap, book may still be contested",
        "AutoBid", auction_id
    );
    Ok(())
}

/// Runs one round inside the auction's critical section: the book is read,
/// the proposal decided, and the bid written under the same advisory lock, so
/// a proposal can never land priced against a book that a concurrent manual
/// bid has since moved. Returns the bid written, or None when quiescent.
async fn run_round(
    db: &DatabaseManager,
    auction_id: i64,
    base_bid_price: Decimal,
) -> Result<Option<(StandingBid, BidAction)>> {
    db.transaction(|tx| {
        Box::pin(async move {
            sqlx::query(queries::LOCK_AUCTION)
                .bind(auction_id)
                .execute(&mut **tx)
                .await?;

            let bids = sqlx::query_as::<_, StandingBid>(queries::GET_AUCTION_BIDS)
                .bind(auction_id)
                .fetch_all(&mut **tx)
                .await?;
            let rules = sqlx::query_as::<_, AutoBidRule>(queries::GET_AUCTION_AUTO_BID_RULES)
                .bind(auction_id)
                .fetch_all(&mut **tx)
                .await?;

            let book: Vec<BookEntry> = bids
                .iter()
                .map(|b| BookEntry {
                    user_id: b.user_id,
                    amount: b.amount,
                    created_at: b.created_at,
                })
                .collect();
            let rule_snapshots: Vec<RuleSnapshot> = rules
                .iter()
                .map(|r| RuleSnapshot {
                    user_id: r.user_id,
                    max_amount: r.max_amount,
                    increment_amount: r.increment_amount,
                })
                .collect();

            let Some(proposed) = next_auto_bid(base_bid_price, &book, &rule_snapshots) else {
                return Ok::<_, Error>(None);
            };

            let had_bid = book.iter().any(|b| b.user_id == proposed.user_id);
            let bid = sqlx::query_as::<_, StandingBid>(queries::UPSERT_STANDING_BID)
                .bind(auction_id)
                .bind(proposed.user_id)
                .bind(proposed.amount)
                .fetch_one(&mut **tx)
                .await?;

            sqlx::query(queries::INSERT_BID_HISTORY)
                .bind(bid.id)
                .bind(auction_id)
                .bind(proposed.user_id)
                .bind(proposed.amount)
                .bind(true)
                .execute(&mut **tx)
                .await?;

            let action = if had_bid {
                BidAction::AutoUpdated
            } else {
                BidAction::AutoPlaced
            };
            Ok(Some((bid, action)))
        })
    })
    .await
}

/// Helper for call sites: run the engine and only log on failure, so a
/// bidder's own request never fails because proxy resolution did.
pub async fn resolve_best_effort(db: &DatabaseManager, notifier: &dyn Notifier, auction_id: i64) {
    if let Err(e) = resolve(db, notifier, auction_id).await {
        warn!(
            "{:<12} --> resolution failed for auction {}: {:?}",
            "AutoBid", auction_id, e
        );
    }
}

// endregion: --- Engine Driver

// region:    --- Tests


// endregion: --- Tests
