//! Booking events and availability snapshots kept in Redis.
//
//  Redis keys / channels
//  ---------------------
//  bookings:events                    – PUB/SUB channel, one JSON `BookingEvent` per change
//  availability_gen:<ground>:<date>   – generation counter, bumped on every booking change
//  availability:<ground>:<date>:v<n>  – booked hours for generation n, short TTL

use chrono::{DateTime, NaiveDate, Utc};
use redis::{AsyncCommands, Client as RedisClient};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::booking::types::BookingStatus;

pub const EVENTS_CHANNEL: &str = "bookings:events";

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
#[serde(tag = "type")]
pub enum BookingEvent {
    Created {
        booking_id: Uuid,
        ground_id: Uuid,
        date: NaiveDate,
        hours: Vec<u8>,
        ts: DateTime<Utc>,
    },
    StatusChanged {
        booking_id: Uuid,
        from: BookingStatus,
        to: BookingStatus,
        ts: DateTime<Utc>,
    },
    Completed {
        booking_id: Uuid,
        amount_received: i64,
        ts: DateTime<Utc>,
    },
    Expired {
        booking_id: Uuid,
        ground_id: Uuid,
        date: NaiveDate,
        ts: DateTime<Utc>,
    },
}

/// Generation counters outlive any snapshot TTL.
const GENERATION_TTL_SECS: i64 = 2 * 24 * 3_600;

pub fn availability_generation_key(ground_id: Uuid, date: NaiveDate) -> String {
    format!("availability_gen:{ground_id}:{date}")
}

pub fn availability_key(ground_id: Uuid, date: NaiveDate, generation: u64) -> String {
    format!("availability:{ground_id}:{date}:v{generation}")
}

/// Best-effort publish; a missing Redis never fails the request.
pub async fn publish(redis: &RedisClient, evt: &BookingEvent) {
    let body = match serde_json::to_string(evt) {
        Ok(b) => b,
        Err(e) => {
            log::error!("could not encode booking event: {e}");
            return;
        }
    };
    match redis.get_multiplexed_async_connection().await {
        Ok(mut conn) => {
            if let Err(e) = conn.publish::<_, _, ()>(EVENTS_CHANNEL, body).await {
                log::warn!("publish to {EVENTS_CHANNEL} failed: {e}");
            }
        }
        Err(e) => log::warn!("redis unavailable, event dropped: {e}"),
    }
}

/// Current snapshot generation, `None` when Redis is unreachable.
pub async fn availability_generation(
    redis: &RedisClient,
    ground_id: Uuid,
    date: NaiveDate,
) -> Option<u64> {
    let mut conn = redis.get_multiplexed_async_connection().await.ok()?;
    conn.get::<_, Option<u64>>(availability_generation_key(ground_id, date))
        .await
        .ok()
        .map(|g| g.unwrap_or(0))
}

pub async fn cached_availability(
    redis: &RedisClient,
    ground_id: Uuid,
    date: NaiveDate,
    generation: u64,
) -> Option<String> {
    let mut conn = redis.get_multiplexed_async_connection().await.ok()?;
    conn.get::<_, Option<String>>(availability_key(ground_id, date, generation))
        .await
        .ok()
        .flatten()
}

pub async fn cache_availability(
    redis: &RedisClient,
    ground_id: Uuid,
    date: NaiveDate,
    generation: u64,
    body: &str,
    ttl_secs: u64,
) {
    if ttl_secs == 0 {
        return;
    }
    if let Ok(mut conn) = redis.get_multiplexed_async_connection().await {
        let _: () = conn
            .set_ex(availability_key(ground_id, date, generation), body, ttl_secs)
            .await
            .unwrap_or(());
    }
}

/// Moves readers to a fresh generation; snapshots of older generations are
/// never read again and expire on their own.
pub async fn invalidate_availability(redis: &RedisClient, ground_id: Uuid, date: NaiveDate) {
    let key = availability_generation_key(ground_id, date);
    match redis.get_multiplexed_async_connection().await {
        Ok(mut conn) => {
            if let Err(e) = conn.incr::<_, _, u64>(&key, 1u64).await {
                log::warn!("could not invalidate availability {key}: {e}");
                return;
            }
            let _: () = conn.expire(&key, GENERATION_TTL_SECS).await.unwrap_or(());
        }
        Err(e) => log::warn!("redis unavailable, availability {key} not invalidated: {e}"),
    }
}
