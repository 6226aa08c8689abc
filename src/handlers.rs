// region:    --- Imports
use crate::auction::commands::{self as auction_commands, CreateAuctionCommand, UpdateAuctionCommand};
use crate::auth::AuthUser;
use crate::bidding::commands::{self as bid_commands, PlaceBidCommand, ReviseBidCommand, SetAutoBidCommand};
use crate::database::DatabaseManager;
use crate::error::{Error, Result};
use crate::notifier::Notifier;
use crate::query;
use crate::result as winner;
use crate::status;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::Json;
use serde_json::json;
use std::sync::Arc;
use tracing::info;

// endregion: --- Imports

pub type AppState = (Arc<DatabaseManager>, Arc<dyn Notifier>);

// region:    --- Admin: Auction Lifecycle

/// POST /admin/auctions
pub async fn handle_create_auction(
    State((db, _)): State<AppState>,
    user: AuthUser,
    Json(cmd): Json<CreateAuctionCommand>,
) -> Result<impl IntoResponse> {
    info!("{:<12} --> create auction request: {:?}", "Handler", cmd.item_name);
    user.require_admin()?;
    let auction = auction_commands::create_auction(&db, user.id, cmd).await?;
    Ok((StatusCode::CREATED, Json(json!({ "auction": auction }))))
}

/// GET /admin/auctions
pub async fn handle_list_auctions(
    State((db, _)): State<AppState>,
    user: AuthUser,
) -> Result<impl IntoResponse> {
    user.require_admin()?;
    let auctions = auction_commands::list_auctions(&db).await?;
    Ok(Json(json!({ "auctions": auctions })))
}

/// GET /admin/auctions/:id
pub async fn handle_get_auction(
    State((db, _)): State<AppState>,
    user: AuthUser,
    Path(id): Path<i64>,
) -> Result<impl IntoResponse> {
    user.require_admin()?;
    let auction = auction_commands::get_auction(&db, id).await?;
    Ok(Json(json!({ "auction": auction })))
}

/// PUT /admin/auctions/:id
pub async fn handle_update_auction(
    State((db, _)): State<AppState>,
    user: AuthUser,
    Path(id): Path<i64>,
    Json(cmd): Json<UpdateAuctionCommand>,
) -> Result<impl IntoResponse> {
    user.require_admin()?;
    let auction = auction_commands::update_auction(&db, id, cmd).await?;
    Ok(Json(json!({ "auction": auction })))
}

/// DELETE /admin/auctions/:id
pub async fn handle_delete_auction(
    State((db, _)): State<AppState>,
    user: AuthUser,
    Path(id): Path<i64>,
) -> Result<impl IntoResponse> {
    user.require_admin()?;
    auction_commands::delete_auction(&db, id).await?;
    Ok(StatusCode::NO_CONTENT)
}

// endregion: --- Admin: Auction Lifecycle

// region:    --- Admin: Bids & Results

/// GET /admin/auctions/:id/all-bids
pub async fn handle_get_all_bids(
    State((db, _)): State<AppState>,
    user: AuthUser,
    Path(id): Path<i64>,
) -> Result<impl IntoResponse> {
    user.require_admin()?;
    let mut auction = query::handlers::get_auction(&db, id).await?;
    auction.status =
        status::refresh_phase(db.pool(), auction.id, auction.start_time, auction.end_time).await?;
    let bids = query::handlers::get_auction_bids(&db, id).await?;
    let highest_bid = bids.first().cloned();
    Ok(Json(json!({
        "auction": auction,
        "bids": bids,
        "highest_bid": highest_bid,
    })))
}

/// GET /admin/auctions/:id/bid-history
pub async fn handle_get_auction_bid_history(
    State((db, _)): State<AppState>,
    user: AuthUser,
    Path(id): Path<i64>,
) -> Result<impl IntoResponse> {
    user.require_admin()?;
    // 404 for unknown auctions rather than an empty history.
    query::handlers::get_auction(&db, id).await?;
    let history = query::handlers::get_auction_bid_history(&db, id).await?;
    Ok(Json(json!({ "history": history })))
}

/// POST /admin/auctions/:id/declare-result
pub async fn handle_declare_result(
    State((db, _)): State<AppState>,
    user: AuthUser,
    Path(id): Path<i64>,
) -> Result<impl IntoResponse> {
    user.require_admin()?;
    let (auction, winning_bid) = winner::declare_result(&db, id).await?;
    Ok(Json(json!({
        "message": "Result declared successfully",
        "auction": auction,
        "winning_bid": winning_bid,
    })))
}

/// GET /admin/results
pub async fn handle_list_results(
    State((db, _)): State<AppState>,
    user: AuthUser,
) -> Result<impl IntoResponse> {
    user.require_admin()?;
    let results = winner::list_all_results(&db).await?;
    Ok(Json(json!({ "results": results })))
}

// endregion: --- Admin: Bids & Results

// region:    --- User: Bidding

/// GET /bids/active
pub async fn handle_list_active_auctions(
    State((db, _)): State<AppState>,
    user: AuthUser,
) -> Result<impl IntoResponse> {
    let auctions = query::handlers::list_active_auctions(&db, user.id).await?;
    Ok(Json(json!({ "auctions": auctions })))
}

/// GET /bids/my-bids
pub async fn handle_list_my_bids(
    State((db, _)): State<AppState>,
    user: AuthUser,
) -> Result<impl IntoResponse> {
    let bids = query::handlers::list_my_bids(&db, user.id).await?;
    Ok(Json(json!({ "bids": bids })))
}

/// POST /bids/:id (`:id` is the auction id)
pub async fn handle_place_bid(
    State((db, notifier)): State<AppState>,
    user: AuthUser,
    Path(auction_id): Path<i64>,
    Json(cmd): Json<PlaceBidCommand>,
) -> Result<impl IntoResponse> {
    let bid = bid_commands::place_bid(&db, notifier.as_ref(), auction_id, user.id, cmd).await?;
    Ok((StatusCode::CREATED, Json(json!({ "bid": bid }))))
}

/// PUT /bids/:id (`:id` is the standing bid id)
pub async fn handle_revise_bid(
    State((db, notifier)): State<AppState>,
    user: AuthUser,
    Path(bid_id): Path<i64>,
    Json(cmd): Json<ReviseBidCommand>,
) -> Result<impl IntoResponse> {
    let bid = bid_commands::revise_bid(&db, notifier.as_ref(), bid_id, user.id, cmd).await?;
    Ok(Json(json!({ "bid": bid })))
}

/// GET /bids/:id/history (`:id` is the standing bid id; owner only)
pub async fn handle_get_bid_history(
    State((db, _)): State<AppState>,
    user: AuthUser,
    Path(bid_id): Path<i64>,
) -> Result<impl IntoResponse> {
    let bid = query::handlers::get_standing_bid(&db, bid_id).await?;
    if bid.user_id != user.id {
        return Err(Error::Forbidden(
            "You can view only your own bid history".to_string(),
        ));
    }
    let history = query::handlers::get_bid_history(&db, bid_id).await?;
    Ok(Json(json!({ "history": history })))
}

// endregion: --- User: Bidding

// region:    --- User: Auto-Bid Rules

/// GET /bids/:id/auto-bid (`:id` is the auction id)
pub async fn handle_get_auto_bid(
    State((db, _)): State<AppState>,
    user: AuthUser,
    Path(auction_id): Path<i64>,
) -> Result<impl IntoResponse> {
    let auto_bid = query::handlers::find_auto_bid_rule(&db, auction_id, user.id).await?;
    Ok(Json(json!({ "auto_bid": auto_bid })))
}

/// POST /bids/:id/auto-bid (`:id` is the auction id)
pub async fn handle_set_auto_bid(
    State((db, notifier)): State<AppState>,
    user: AuthUser,
    Path(auction_id): Path<i64>,
    Json(cmd): Json<SetAutoBidCommand>,
) -> Result<impl IntoResponse> {
    let auto_bid =
        bid_commands::set_auto_bid(&db, notifier.as_ref(), auction_id, user.id, cmd).await?;
    Ok(Json(json!({ "auto_bid": auto_bid })))
}

/// DELETE /bids/:id/auto-bid (`:id` is the auction id)
pub async fn handle_delete_auto_bid(
    State((db, notifier)): State<AppState>,
    user: AuthUser,
    Path(auction_id): Path<i64>,
) -> Result<impl IntoResponse> {
    bid_commands::delete_auto_bid(&db, notifier.as_ref(), auction_id, user.id).await?;
    Ok(Json(json!({ "message": "Auto-bid removed" })))
}

// endregion: --- User: Auto-Bid Rules

// region:    --- User: Results

/// GET /results/my-results
pub async fn handle_my_results(
    State((db, _)): State<AppState>,
    user: AuthUser,
) -> Result<impl IntoResponse> {
    let results = winner::my_results(&db, user.id).await?;
    Ok(Json(json!({ "results": results })))
}

// endregion: --- User: Results
