// region:    --- Imports
use crate::database::DatabaseManager;
use crate::handlers::AppState;
use crate::notifier::{KafkaNotifier, Notifier, AUTO_BID_UPDATES_TOPIC, BID_UPDATES_TOPIC};
use axum::routing::{get, post};
use axum::Router;
use std::sync::Arc;
use tokio::net::TcpListener;
use tower_http::cors::{Any, CorsLayer};
use tracing::{error, info};
// endregion: --- Imports

// region:    --- Modules
mod auction;
mod auth;
mod bidding;
mod database;
mod error;
mod handlers;
mod notifier;
mod query;
mod result;
mod status;

// endregion: --- Modules

// region:    --- Main
#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .without_time()
        .with_target(false)
        .init();

    let db_manager = Arc::new(DatabaseManager::new().await);

    if let Err(e) = db_manager.initialize_database().await {
        error!("{:<12} --> database initialization failed: {:?}", "Main", e);
        return Err(e.into());
    }
    info!("{:<12} --> database initialized", "Main");

    let kafka_notifier = KafkaNotifier::new();
    kafka_notifier.create_topic(BID_UPDATES_TOPIC, 3, 1).await?;
    kafka_notifier
        .create_topic(AUTO_BID_UPDATES_TOPIC, 3, 1)
        .await?;
    info!("{:<12} --> notification topics ready", "Main");
    let notifier: Arc<dyn Notifier> = Arc::new(kafka_notifier);

    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    let state: AppState = (db_manager, notifier);
    let routes_all = Router::new()
        // Admin: auction lifecycle
        .route(
            "/admin/auctions",
            post(handlers::handle_create_auction).get(handlers::handle_list_auctions),
        )
        .route(
            "/admin/auctions/:id",
            get(handlers::handle_get_auction)
                .put(handlers::handle_update_auction)
                .delete(handlers::handle_delete_auction),
        )
        // Admin: bids and results
        .route(
            "/admin/auctions/:id/all-bids",
            get(handlers::handle_get_all_bids),
        )
        .route(
            "/admin/auctions/:id/bid-history",
            get(handlers::handle_get_auction_bid_history),
        )
        .route(
            "/admin/auctions/:id/declare-result",
            post(handlers::handle_declare_result),
        )
        .route("/admin/results", get(handlers::handle_list_results))
        // User: bidding
        .route("/bids/active", get(handlers::handle_list_active_auctions))
        .route("/bids/my-bids", get(handlers::handle_list_my_bids))
        .route(
            "/bids/:id/auto-bid",
            get(handlers::handle_get_auto_bid)
                .post(handlers::handle_set_auto_bid)
                .delete(handlers::handle_delete_auto_bid),
        )
        .route(
            "/bids/:id",
            post(handlers::handle_place_bid).put(handlers::handle_revise_bid),
        )
        .route("/bids/:id/history", get(handlers::handle_get_bid_history))
        // User: results
        .route("/results/my-results", get(handlers::handle_my_results))
        .layer(cors)
        .with_state(state);

    let bind_addr = std::env::var("BIND_ADDR").unwrap_or_else(|_| "0.0.0.0:3000".to_string());
    let listener = TcpListener::bind(&bind_addr).await?;
    info!(
        "{:<12} --> Web Server: Listening on {}",
        "Main",
        listener.local_addr()?
    );

    if let Err(err) = axum::serve(listener, routes_all.into_make_service()).await {
        error!("{:<12} --> Server error: {}", "Main", err);
    }
    Ok(())
}
// endregion: --- Main
