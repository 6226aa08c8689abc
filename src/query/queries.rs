/// Auction by id
pub const GET_AUCTION: &str = "SELECT id, item_name, catalog_id, image_url, base_item_price, base_bid_price, start_time, end_time, status, created_by, result_declared, winner_id, declared_at, created_at FROM auctions WHERE id = $1";

/// All auctions, newest first
pub const GET_ALL_AUCTIONS: &str = "SELECT id, item_name, catalog_id, image_url, base_item_price, base_bid_price, start_time, end_time, status, created_by, result_declared, winner_id, declared_at, created_at FROM auctions ORDER BY created_at DESC";

/// Auctions whose window contains the given instant
pub const GET_ACTIVE_AUCTIONS: &str = "SELECT id, item_name, catalog_id, image_url, base_item_price, base_bid_price, start_time, end_time, status, created_by, result_declared, winner_id, declared_at, created_at FROM auctions WHERE start_time <= $1 AND end_time >= $1 ORDER BY start_time ASC";

/// Insert a new auction
pub const INSERT_AUCTION: &str = "INSERT INTO auctions (item_name, catalog_id, image_url, base_item_price, base_bid_price, start_time, end_time, status, created_by) VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9) RETURNING id, item_name, catalog_id, image_url, base_item_price, base_bid_price, start_time, end_time, status, created_by, result_declared, winner_id, declared_at, created_at";

/// Update a draft auction
pub const UPDATE_AUCTION: &str = "UPDATE auctions SET item_name = $2, catalog_id = $3, image_url = $4, base_item_price = $5, base_bid_price = $6, start_time = $7, end_time = $8, status = $9 WHERE id = $1 RETURNING id, item_name, catalog_id, image_url, base_item_price, base_bid_price, start_time, end_time, status, created_by, result_declared, winner_id, declared_at, created_at";

/// Delete a draft auction
pub const DELETE_AUCTION: &str = "DELETE FROM auctions WHERE id = $1";

/// Atomic winner declaration. The `result_declared = false` predicate is the
/// idempotency guard; concurrent declarers race on it and only one wins.
pub const DECLARE_AUCTION_RESULT: &str = "UPDATE auctions SET winner_id = $2, result_declared = true, declared_at = $3 WHERE id = $1 AND result_declared = false RETURNING id, item_name, catalog_id, image_url, base_item_price, base_bid_price, start_time, end_time, status, created_by, result_declared, winner_id, declared_at, created_at";

/// Standing bid by id
pub const GET_STANDING_BID: &str = "SELECT id, auction_id, user_id, amount, created_at, updated_at FROM standing_bids WHERE id = $1";

/// A user's standing bid on an auction, if any
pub const GET_USER_STANDING_BID: &str = "SELECT id, auction_id, user_id, amount, created_at, updated_at FROM standing_bids WHERE auction_id = $1 AND user_id = $2";

/// All standing bids for an auction: highest first, ties broken by earliest
/// creation (first-mover advantage)
pub const GET_AUCTION_BIDS: &str = "SELECT id, auction_id, user_id, amount, created_at, updated_at FROM standing_bids WHERE auction_id = $1 ORDER BY amount DESC, created_at ASC, id ASC";

/// Highest standing bid for an auction
pub const GET_HIGHEST_BID: &str = "SELECT id, auction_id, user_id, amount, created_at, updated_at FROM standing_bids WHERE auction_id = $1 ORDER BY amount DESC, created_at ASC, id ASC LIMIT 1";

/// All standing bids a user holds, newest first
pub const GET_USER_BIDS: &str = "SELECT id, auction_id, user_id, amount, created_at, updated_at FROM standing_bids WHERE user_id = $1 ORDER BY created_at DESC";

/// Insert a standing bid (first bid by this user on this auction)
pub const INSERT_STANDING_BID: &str = "INSERT INTO standing_bids (auction_id, user_id, amount) VALUES ($1, $2, $3) RETURNING id, auction_id, user_id, amount, created_at, updated_at";

/// Overwrite a standing bid's amount in place
pub const UPDATE_STANDING_BID: &str = "UPDATE standing_bids SET amount = $2, updated_at = now() WHERE id = $1 RETURNING id, auction_id, user_id, amount, created_at, updated_at";

/// Upsert used by the auto-bid engine, keyed on (auction, user)
pub const UPSERT_STANDING_BID: &str = "INSERT INTO standing_bids (auction_id, user_id, amount) VALUES ($1, $2, $3) ON CONFLICT (auction_id, user_id) DO UPDATE SET amount = EXCLUDED.amount, updated_at = now() RETURNING id, auction_id, user_id, amount, created_at, updated_at";

/// Append one history entry for a standing bid mutation
pub const INSERT_BID_HISTORY: &str = "INSERT INTO bid_history (standing_bid_id, auction_id, user_id, amount, automatic) VALUES ($1, $2, $3, $4, $5)";

/// Chronological history of one standing bid
pub const GET_BID_HISTORY: &str = "SELECT id, standing_bid_id, auction_id, user_id, amount, automatic, recorded_at FROM bid_history WHERE standing_bid_id = $1 ORDER BY recorded_at ASC, id ASC";

/// Chronological history of every bid on an auction
pub const GET_AUCTION_BID_HISTORY: &str = "SELECT id, standing_bid_id, auction_id, user_id, amount, automatic, recorded_at FROM bid_history WHERE auction_id = $1 ORDER BY recorded_at ASC, id ASC";

/// A user's auto-bid rule for an auction, if any
pub const GET_AUTO_BID_RULE: &str = "SELECT id, auction_id, user_id, max_amount, increment_amount, created_at FROM auto_bid_rules WHERE auction_id = $1 AND user_id = $2";

/// All auto-bid rules for an auction, in creation order (the engine's stable
/// scan order)
pub const GET_AUCTION_AUTO_BID_RULES: &str = "SELECT id, auction_id, user_id, max_amount, increment_amount, created_at FROM auto_bid_rules WHERE auction_id = $1 ORDER BY created_at ASC, id ASC";

/// Idempotent upsert of a user's auto-bid rule
pub const UPSERT_AUTO_BID_RULE: &str = "INSERT INTO auto_bid_rules (auction_id, user_id, max_amount, increment_amount) VALUES ($1, $2, $3, $4) ON CONFLICT (auction_id, user_id) DO UPDATE SET max_amount = EXCLUDED.max_amount, increment_amount = EXCLUDED.increment_amount RETURNING id, auction_id, user_id, max_amount, increment_amount, created_at";

/// Remove a user's auto-bid rule
pub const DELETE_AUTO_BID_RULE: &str = "DELETE FROM auto_bid_rules WHERE auction_id = $1 AND user_id = $2 RETURNING id";

/// Record the declared outcome; the unique key on auction_id makes redundant
/// declarations a no-op
pub const INSERT_AUCTION_RESULT: &str = "INSERT INTO auction_results (auction_id, winner_id, winning_amount, declared_at) VALUES ($1, $2, $3, $4) ON CONFLICT (auction_id) DO NOTHING";

/// All declared results, newest declaration first
pub const GET_ALL_RESULTS: &str = "SELECT id, auction_id, winner_id, winning_amount, declared_at FROM auction_results ORDER BY declared_at DESC";

/// Declared auctions among a set of ids, latest-ending first
pub const GET_DECLARED_AUCTIONS_IN: &str = "SELECT id, item_name, catalog_id, image_url, base_item_price, base_bid_price, start_time, end_time, status, created_by, result_declared, winner_id, declared_at, created_at FROM auctions WHERE id = ANY($1) AND result_declared = true ORDER BY end_time DESC";

/// Per-auction critical section for the bid mutation path; released at
/// transaction end
pub const LOCK_AUCTION: &str = "SELECT pg_advisory_xact_lock($1)";
