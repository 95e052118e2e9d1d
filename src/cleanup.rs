//! Background worker that expires stale pending bookings and frees their
//! slots.

use std::time::Duration;

use chrono::Utc;
use redis::Client as RedisClient;
use sqlx::PgPool;
use tokio::time::sleep;

use crate::config::settings;
use crate::db::booking_repo::{self, ExpiredBooking};
use crate::error::AppResult;
use crate::events::{self, BookingEvent};

/// Spawn the infinite cleanup loop as a Tokio task.
pub fn start(db: PgPool, redis: RedisClient) {
    tokio::spawn(async move {
        let period = Duration::from_secs(settings().cleanup_interval_secs);
        loop {
            if let Err(e) = expire_now(&db, &redis).await {
                log::error!("cleanup tick failed: {e:?}");
            }
            sleep(period).await;
        }
    });
}

/// One pass: expire in Postgres, then drop cached availability and announce
/// each expiry.
pub async fn expire_now(db: &PgPool, redis: &RedisClient) -> AppResult<Vec<ExpiredBooking>> {
    let cfg = settings();
    let hold = chrono::Duration::minutes(cfg.pending_hold_minutes);
    let today = cfg.local_now().date();

    let expired = booking_repo::cleanup_expired_bookings(db, hold, today).await?;
    for b in &expired {
        events::invalidate_availability(redis, b.ground_id, b.booking_date).await;
        events::publish(
            redis,
            &BookingEvent::Expired {
                booking_id: b.id,
                ground_id: b.ground_id,
                date: b.booking_date,
                ts: Utc::now(),
            },
        )
        .await;
    }
    Ok(expired)
}
