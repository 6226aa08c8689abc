//! End-to-end tests against a running server (`cargo run`) plus Postgres.
//! They are `#[ignore]`d so a bare `cargo test` stays hermetic; run them with
//! `cargo test -- --ignored` once DATABASE_URL points at a live database and
//! the server is listening on localhost:3000.

use chrono::{Duration, Utc};
use diamond_auction_service::auction::model::Auction;
use diamond_auction_service::database::DatabaseManager;
use diamond_auction_service::query;
use reqwest::Client;
use rust_decimal_macros::dec;
use serde_json::json;
use std::sync::Arc;

const BASE_URL: &str = "http://localhost:3000";

async fn setup() -> Arc<DatabaseManager> {
    Arc::new(DatabaseManager::new().await)
}

/// Inserts an auction directly, bypassing the admin API, so tests control the
/// time window precisely.
async fn create_test_auction(
    db: &DatabaseManager,
    item_name: String,
    start_offset: Duration,
    end_offset: Duration,
) -> Auction {
    let start = Utc::now() + start_offset;
    let end = Utc::now() + end_offset;
    let status = if start <= Utc::now() && Utc::now() <= end {
        "active"
    } else if Utc::now() < start {
        "draft"
    } else {
        "closed"
    };
    db.transaction(|tx| {
        Box::pin(async move {
            sqlx::query_as::<_, Auction>(
                "INSERT INTO auctions (item_name, catalog_id, base_item_price, base_bid_price, start_time, end_time, status, created_by)
                 VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
                 RETURNING id, item_name, catalog_id, image_url, base_item_price, base_bid_price, start_time, end_time, status, created_by, result_declared, winner_id, declared_at, created_at",
            )
            .bind(&item_name)
            .bind("CAT-0001")
            .bind(dec!(5000))
            .bind(dec!(100))
            .bind(start)
            .bind(end)
            .bind(status)
            .bind(1i64)
            .fetch_one(&mut **tx)
            .await
        })
    })
    .await
    .unwrap()
}

fn as_user(client: &Client, method: reqwest::Method, path: &str, user_id: i64) -> reqwest::RequestBuilder {
    client
        .request(method, format!("{}{}", BASE_URL, path))
        .header("x-user-id", user_id.to_string())
}

fn as_admin(client: &Client, method: reqwest::Method, path: &str) -> reqwest::RequestBuilder {
    as_user(client, method, path, 1).header("x-user-role", "admin")
}

#[tokio::test]
#[ignore = "requires a running server and Postgres"]
async fn test_place_then_revise_bid() {
    let db = setup().await;
    let client = Client::new();
    let auction = create_test_auction(
        &db,
        "place/revise flow".to_string(),
        Duration::hours(-1),
        Duration::hours(2),
    )
    .await;

    // First bid is accepted.
    let response = as_user(&client, reqwest::Method::POST, &format!("/bids/{}", auction.id), 10)
        .json(&json!({ "amount": "150.00" }))
        .send()
        .await
        .expect("Failed to send request");
    assert_eq!(response.status(), reqwest::StatusCode::CREATED);
    let body: serde_json::Value = response.json().await.unwrap();
    let bid_id = body["bid"]["id"].as_i64().unwrap();

    // A second bid by the same user is a state conflict; revision is the path.
    let response = as_user(&client, reqwest::Method::POST, &format!("/bids/{}", auction.id), 10)
        .json(&json!({ "amount": "160.00" }))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), reqwest::StatusCode::BAD_REQUEST);

    // Revision overwrites in place.
    let response = as_user(&client, reqwest::Method::PUT, &format!("/bids/{}", bid_id), 10)
        .json(&json!({ "amount": "180.00" }))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), reqwest::StatusCode::OK);

    let bid = query::handlers::get_standing_bid(&db, bid_id).await.unwrap();
    assert_eq!(bid.amount, dec!(180));

    // History is chronological and its last entry matches the live amount.
    let history = query::handlers::get_bid_history(&db, bid_id).await.unwrap();
    assert_eq!(history.len(), 2);
    assert!(history.windows(2).all(|w| w[0].recorded_at <= w[1].recorded_at));
    assert_eq!(history.last().unwrap().amount, bid.amount);
}

#[tokio::test]
#[ignore = "requires a running server and Postgres"]
async fn test_bid_below_floor_is_rejected() {
    let db = setup().await;
    let client = Client::new();
    let auction = create_test_auction(
        &db,
        "floor check".to_string(),
        Duration::hours(-1),
        Duration::hours(2),
    )
    .await;

    let response = as_user(&client, reqwest::Method::POST, &format!("/bids/{}", auction.id), 10)
        .json(&json!({ "amount": "99.99" }))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), reqwest::StatusCode::BAD_REQUEST);

    // The floor also binds revisions, even for the current leader.
    let response = as_user(&client, reqwest::Method::POST, &format!("/bids/{}", auction.id), 10)
        .json(&json!({ "amount": "150.00" }))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), reqwest::StatusCode::CREATED);
    let body: serde_json::Value = response.json().await.unwrap();
    let bid_id = body["bid"]["id"].as_i64().unwrap();

    let response = as_user(&client, reqwest::Method::PUT, &format!("/bids/{}", bid_id), 10)
        .json(&json!({ "amount": "99.99" }))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), reqwest::StatusCode::BAD_REQUEST);

    let bid = query::handlers::get_standing_bid(&db, bid_id).await.unwrap();
    assert_eq!(bid.amount, dec!(150));
}

#[tokio::test]
#[ignore = "requires a running server and Postgres"]
async fn test_auto_bid_outbids_manual_leader() {
    let db = setup().await;
    let client = Client::new();
    let auction = create_test_auction(
        &db,
        "auto-bid convergence".to_string(),
        Duration::hours(-1),
        Duration::hours(2),
    )
    .await;

    // User 20 arms a proxy rule before anyone bids.
    let response = as_user(
        &client,
        reqwest::Method::POST,
        &format!("/bids/{}/auto-bid", auction.id),
        20,
    )
    .json(&json!({ "max_amount": "200.00", "increment_amount": "20.00" }))
    .send()
    .await
    .unwrap();
    assert_eq!(response.status(), reqwest::StatusCode::OK);

    // User 10 bids the floor; the engine lifts user 20 to 120.
    let response = as_user(&client, reqwest::Method::POST, &format!("/bids/{}", auction.id), 10)
        .json(&json!({ "amount": "100.00" }))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), reqwest::StatusCode::CREATED);

    let highest = query::handlers::get_highest_bid(&db, auction.id)
        .await
        .unwrap()
        .expect("book must not be empty");
    assert_eq!(highest.user_id, 20);
    assert_eq!(highest.amount, dec!(120));

    // The automatic entry is tagged in the audit trail.
    let history = query::handlers::get_auction_bid_history(&db, auction.id)
        .await
        .unwrap();
    assert!(history.iter().any(|h| h.automatic && h.user_id == 20));
}

#[tokio::test]
#[ignore = "requires a running server and Postgres"]
async fn test_declare_result_once() {
    let db = setup().await;
    let client = Client::new();
    let auction = create_test_auction(
        &db,
        "declaration flow".to_string(),
        Duration::hours(-2),
        Duration::seconds(-1),
    )
    .await;

    // Seed a bid directly; the window is already closed for the API.
    let auction_id = auction.id;
    db.transaction(|tx| {
        Box::pin(async move {
            let bid_id: i64 = sqlx::query_scalar(
                "INSERT INTO standing_bids (auction_id, user_id, amount) VALUES ($1, $2, $3) RETURNING id",
            )
            .bind(auction_id)
            .bind(10i64)
            .bind(dec!(250))
            .fetch_one(&mut **tx)
            .await?;
            sqlx::query(
                "INSERT INTO bid_history (standing_bid_id, auction_id, user_id, amount, automatic) VALUES ($1, $2, $3, $4, false)",
            )
            .bind(bid_id)
            .bind(auction_id)
            .bind(10i64)
            .bind(dec!(250))
            .execute(&mut **tx)
            .await?;
            Ok::<_, sqlx::Error>(())
        })
    })
    .await
    .unwrap();

    let path = format!("/admin/auctions/{}/declare-result", auction.id);
    let response = as_admin(&client, reqwest::Method::POST, &path)
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), reqwest::StatusCode::OK);
    let body: serde_json::Value = response.json().await.unwrap();
    assert_eq!(body["auction"]["winner_id"].as_i64(), Some(10));

    // Declaring again is a state conflict, and only one result row exists.
    let response = as_admin(&client, reqwest::Method::POST, &path)
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), reqwest::StatusCode::BAD_REQUEST);

    let count: i64 = db
        .transaction(|tx| {
            Box::pin(async move {
                sqlx::query_scalar("SELECT COUNT(*) FROM auction_results WHERE auction_id = $1")
                    .bind(auction_id)
                    .fetch_one(&mut **tx)
                    .await
            })
        })
        .await
        .unwrap();
    assert_eq!(count, 1);
}

#[tokio::test]
#[ignore = "requires a running server and Postgres"]
async fn test_declare_result_before_end_is_rejected() {
    let db = setup().await;
    let client = Client::new();
    let auction = create_test_auction(
        &db,
        "too-early declaration".to_string(),
        Duration::hours(-1),
        Duration::hours(2),
    )
    .await;

    let path = format!("/admin/auctions/{}/declare-result", auction.id);
    let response = as_admin(&client, reqwest::Method::POST, &path)
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), reqwest::StatusCode::BAD_REQUEST);
}

#[tokio::test]
#[ignore = "requires a running server and Postgres"]
async fn test_draft_auction_editing_rules() {
    let db = setup().await;
    let client = Client::new();

    // Draft: window entirely in the future.
    let draft = create_test_auction(
        &db,
        "draft editing".to_string(),
        Duration::hours(1),
        Duration::hours(3),
    )
    .await;

    let response = as_admin(
        &client,
        reqwest::Method::PUT,
        &format!("/admin/auctions/{}", draft.id),
    )
    .json(&json!({ "item_name": "renamed while draft" }))
    .send()
    .await
    .unwrap();
    assert_eq!(response.status(), reqwest::StatusCode::OK);

    // Active auctions are frozen.
    let active = create_test_auction(
        &db,
        "active freeze".to_string(),
        Duration::hours(-1),
        Duration::hours(2),
    )
    .await;
    let response = as_admin(
        &client,
        reqwest::Method::PUT,
        &format!("/admin/auctions/{}", active.id),
    )
    .json(&json!({ "item_name": "should not apply" }))
    .send()
    .await
    .unwrap();
    assert_eq!(response.status(), reqwest::StatusCode::BAD_REQUEST);

    let response = as_admin(
        &client,
        reqwest::Method::DELETE,
        &format!("/admin/auctions/{}", active.id),
    )
    .send()
    .await
    .unwrap();
    assert_eq!(response.status(), reqwest::StatusCode::BAD_REQUEST);

    // Bidding on a draft is a state conflict.
    let response = as_user(&client, reqwest::Method::POST, &format!("/bids/{}", draft.id), 10)
        .json(&json!({ "amount": "150.00" }))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), reqwest::StatusCode::BAD_REQUEST);
}

#[tokio::test]
#[ignore = "requires a running server and Postgres"]
async fn test_unauthenticated_and_forbidden() {
    let client = Client::new();

    // No identity headers at all.
    let response = client
        .get(format!("{}/bids/active", BASE_URL))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), reqwest::StatusCode::UNAUTHORIZED);

    // Authenticated but not an admin.
    let response = as_user(&client, reqwest::Method::GET, "/admin/auctions", 10)
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), reqwest::StatusCode::FORBIDDEN);
}
