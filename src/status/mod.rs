/// Lifecycle phase resolution.
/// The stored `status` column is only a cache; every decision re-derives the
/// phase from the time window and persists the cache when it changed.
// region:    --- Imports
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::PgPool;
use tracing::debug;

// endregion: --- Imports

// region:    --- Phase

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "VARCHAR", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum Phase {
    Draft,
    Active,
    Closed,
}

impl Phase {
    pub fn as_str(&self) -> &'static str {
        match self {
            Phase::Draft => "draft",
            Phase::Active => "active",
            Phase::Closed => "closed",
        }
    }
}

/// Pure phase resolution. Both window boundaries count as active.
pub fn phase(start: DateTime<Utc>, end: DateTime<Utc>, now: DateTime<Utc>) -> Phase {
    if now < start {
        Phase::Draft
    } else if now <= end {
        Phase::Active
    } else {
        Phase::Closed
    }
}

/// Recomputes the phase for an auction and writes the cached column back,
/// touching the row only when the value actually changed.
pub async fn refresh_phase(
    pool: &PgPool,
    auction_id: i64,
    start: DateTime<Utc>,
    end: DateTime<Utc>,
) -> Result<Phase, sqlx::Error> {
    let current = phase(start, end, Utc::now());
    let updated = sqlx::query("UPDATE auctions SET status = $2 WHERE id = $1 AND status <> $2")
        .bind(auction_id)
        .bind(current)
        .execute(pool)
        .await?;
    if updated.rows_affected() > 0 {
        debug!(
            "{:<12} --> auction {} phase cached as {}",
            "Status", auction_id, current.as_str()
        );
    }
    Ok(current)
}

// endregion: --- Phase

// region:    --- Tests


// endregion: --- Tests
