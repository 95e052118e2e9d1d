//! In-memory catalogue of active grounds.
//!
//! Grounds change rarely (an admin adds one or edits its rates), while every
//! availability check and booking page reads them. The map is warmed at
//! start-up and patched by the admin endpoints that mutate grounds.

use dashmap::DashMap;
use once_cell::sync::Lazy;
use sqlx::PgPool;
use uuid::Uuid;

use crate::db::{ground_repo, models::Ground};

/// Global map id → Ground (active grounds only).
pub static GROUNDS: Lazy<DashMap<Uuid, Ground>> = Lazy::new(DashMap::new);

/// Reload every active ground into [`GROUNDS`].
pub async fn warm_grounds(db: &PgPool) -> anyhow::Result<usize> {
    let rows = ground_repo::list_active(db).await?;
    GROUNDS.clear();
    let n = rows.len();
    for g in rows {
        GROUNDS.insert(g.id, g);
    }
    Ok(n)
}

pub fn get_ground(id: Uuid) -> Option<Ground> {
    GROUNDS.get(&id).map(|e| e.value().clone())
}

/// Sorted by name, like the database listing.
pub fn all_grounds() -> Vec<Ground> {
    let mut out: Vec<Ground> = GROUNDS.iter().map(|e| e.value().clone()).collect();
    out.sort_by(|a, b| a.name.cmp(&b.name));
    out
}

/// Insert or drop a ground after an admin edit.
pub fn store(ground: Ground) {
    if ground.is_active {
        GROUNDS.insert(ground.id, ground);
    } else {
        GROUNDS.remove(&ground.id);
    }
}

/// Cached lookup with a database fallback for grounds added elsewhere.
pub async fn ground_or_fetch(db: &PgPool, id: Uuid) -> anyhow::Result<Option<Ground>> {
    if let Some(g) = get_ground(id) {
        return Ok(Some(g));
    }
    let fetched = ground_repo::get(db, id).await?.filter(|g| g.is_active);
    if let Some(g) = &fetched {
        GROUNDS.insert(g.id, g.clone());
    }
    Ok(fetched)
}

/// Warm every in-memory cache we have (called once at startup).
pub async fn warm_all(db: &PgPool) {
    match warm_grounds(db).await {
        Ok(n) => log::info!("cached {n} ground(s)"),
        Err(e) => log::warn!("cache warm-up failed: {e:?}"),
    }
}
