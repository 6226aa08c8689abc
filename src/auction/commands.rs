/// Auction Lifecycle Manager.
/// Transitions are time-driven and recomputed on demand; only the final
/// result declaration is an explicit write. Editing and deletion are allowed
/// while the auction is still a draft, nowhere else.
// region:    --- Imports
use crate::auction::model::Auction;
use crate::database::DatabaseManager;
use crate::error::{Error, Result};
use crate::query::{handlers, queries};
use crate::result as winner;
use crate::status::{self, Phase};
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

// endregion: --- Imports

// region:    --- Commands

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct CreateAuctionCommand {
    pub item_name: String,
    pub catalog_id: String,
    pub image_url: Option<String>,
    pub base_item_price: Decimal,
    pub base_bid_price: Decimal,
    pub start_time: DateTime<Utc>,
    pub end_time: DateTime<Utc>,
}

/// Partial update; absent fields keep their current value.
#[derive(Debug, Serialize, Deserialize, Clone, Default)]
pub struct UpdateAuctionCommand {
    pub item_name: Option<String>,
    pub catalog_id: Option<String>,
    pub image_url: Option<String>,
    pub base_item_price: Option<Decimal>,
    pub base_bid_price: Option<Decimal>,
    pub start_time: Option<DateTime<Utc>>,
    pub end_time: Option<DateTime<Utc>>,
}

fn validate_window(start: DateTime<Utc>, end: DateTime<Utc>) -> Result<()> {
    if end <= start {
        return Err(Error::Validation(
            "End time must be after start time".to_string(),
        ));
    }
    Ok(())
}

fn validate_prices(base_item_price: Decimal, base_bid_price: Decimal) -> Result<()> {
    if base_item_price < Decimal::ZERO || base_bid_price < Decimal::ZERO {
        return Err(Error::Validation(
            "Prices must be non-negative".to_string(),
        ));
    }
    Ok(())
}

// endregion: --- Commands

// region:    --- Lifecycle Manager

pub async fn create_auction(
    db: &DatabaseManager,
    created_by: i64,
    cmd: CreateAuctionCommand,
) -> Result<Auction> {
    info!(
        "{:<12} --> create auction: {:?} by user {}",
        "Command", cmd.item_name, created_by
    );

    if cmd.item_name.trim().is_empty() || cmd.catalog_id.trim().is_empty() {
        return Err(Error::Validation("All fields are required".to_string()));
    }
    validate_prices(cmd.base_item_price, cmd.base_bid_price)?;
    validate_window(cmd.start_time, cmd.end_time)?;

    let initial_phase = status::phase(cmd.start_time, cmd.end_time, Utc::now());
    db.transaction(|tx| {
        Box::pin(async move {
            sqlx::query_as::<_, Auction>(queries::INSERT_AUCTION)
                .bind(&cmd.item_name)
                .bind(&cmd.catalog_id)
                .bind(&cmd.image_url)
                .bind(cmd.base_item_price)
                .bind(cmd.base_bid_price)
                .bind(cmd.start_time)
                .bind(cmd.end_time)
                .bind(initial_phase)
                .bind(created_by)
                .fetch_one(&mut **tx)
                .await
                .map_err(Error::from)
        })
    })
    .await
}

/// All auctions, phases refreshed. Closed, undeclared auctions get an
/// opportunistic winner declaration on the way out; a declaration failure
/// never fails the listing.
pub async fn list_auctions(db: &DatabaseManager) -> Result<Vec<Auction>> {
    info!("{:<12} --> list auctions", "Command");
    let mut auctions = get_all_refreshed(db).await?;
    for auction in auctions.iter_mut() {
        if auction.status == Phase::Closed && !auction.result_declared {
            match winner::declare_if_closed(db, auction).await {
                Ok(Some(declared)) => *auction = declared,
                Ok(None) => {}
                Err(e) => warn!(
                    "{:<12} --> opportunistic declaration failed for auction {}: {:?}",
                    "Command", auction.id, e
                ),
            }
        }
    }
    Ok(auctions)
}

async fn get_all_refreshed(db: &DatabaseManager) -> Result<Vec<Auction>> {
    let mut auctions = handlers::get_all_auctions(db).await?;
    for auction in auctions.iter_mut() {
        auction.status =
            status::refresh_phase(db.pool(), auction.id, auction.start_time, auction.end_time)
                .await?;
    }
    Ok(auctions)
}

pub async fn get_auction(db: &DatabaseManager, auction_id: i64) -> Result<Auction> {
    info!("{:<12} --> get auction: {}", "Command", auction_id);
    let mut auction = handlers::get_auction(db, auction_id).await?;
    auction.status =
        status::refresh_phase(db.pool(), auction.id, auction.start_time, auction.end_time).await?;
    Ok(auction)
}

pub async fn update_auction(
    db: &DatabaseManager,
    auction_id: i64,
    cmd: UpdateAuctionCommand,
) -> Result<Auction> {
    info!("{:<12} --> update auction: {}", "Command", auction_id);

    let auction = get_auction(db, auction_id).await?;
    if auction.status != Phase::Draft {
        return Err(Error::StateConflict(
            "Only draft auctions can be edited".to_string(),
        ));
    }

    let item_name = cmd.item_name.unwrap_or(auction.item_name);
    let catalog_id = cmd.catalog_id.unwrap_or(auction.catalog_id);
    let image_url = cmd.image_url.or(auction.image_url);
    let base_item_price = cmd.base_item_price.unwrap_or(auction.base_item_price);
    let base_bid_price = cmd.base_bid_price.unwrap_or(auction.base_bid_price);
    let start_time = cmd.start_time.unwrap_or(auction.start_time);
    let end_time = cmd.end_time.unwrap_or(auction.end_time);

    if item_name.trim().is_empty() || catalog_id.trim().is_empty() {
        return Err(Error::Validation("All fields are required".to_string()));
    }
    validate_prices(base_item_price, base_bid_price)?;
    validate_window(start_time, end_time)?;

    let new_phase = status::phase(start_time, end_time, Utc::now());
    db.transaction(|tx| {
        Box::pin(async move {
            sqlx::query_as::<_, Auction>(queries::UPDATE_AUCTION)
                .bind(auction_id)
                .bind(&item_name)
                .bind(&catalog_id)
                .bind(&image_url)
                .bind(base_item_price)
                .bind(base_bid_price)
                .bind(start_time)
                .bind(end_time)
                .bind(new_phase)
                .fetch_one(&mut **tx)
                .await
                .map_err(Error::from)
        })
    })
    .await
}

pub async fn delete_auction(db: &DatabaseManager, auction_id: i64) -> Result<()> {
    info!("{:<12} --> delete auction: {}", "Command", auction_id);

    let auction = get_auction(db, auction_id).await?;
    if auction.status != Phase::Draft {
        return Err(Error::StateConflict(
            "Only draft auctions can be deleted".to_string(),
        ));
    }

    db.transaction(|tx| {
        Box::pin(async move {
            sqlx::query(queries::DELETE_AUCTION)
                .bind(auction_id)
                .execute(&mut **tx)
                .await
                .map_err(Error::from)
        })
    })
    .await?;
    Ok(())
}

// endregion: --- Lifecycle Manager

// region:    --- Tests

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;
    use rust_decimal_macros::dec;

    #[test]
    fn test_window_must_be_strictly_positive() {
        let start = Utc::now();
        assert!(validate_window(start, start + Duration::hours(1)).is_ok());
        assert!(validate_window(start, start).is_err());
        assert!(validate_window(start, start - Duration::seconds(1)).is_err());
    }

    #[test]
    fn test_prices_must_be_non_negative() {
        assert!(validate_prices(dec!(0), dec!(0)).is_ok());
        assert!(validate_prices(dec!(1000), dec!(100)).is_ok());
        assert!(validate_prices(dec!(-1), dec!(100)).is_err());
        assert!(validate_prices(dec!(1000), dec!(-0.01)).is_err());
    }
}

// endregion: --- Tests
