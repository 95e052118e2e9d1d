use anyhow::{Context, Result};
use sqlx::PgPool;
use uuid::Uuid;

use crate::db::models::Ground;

const GROUND_COLUMNS: &str = "id, name, location, day_rate, night_rate, is_active, created_at";

pub async fn list_active(db: &PgPool) -> Result<Vec<Ground>> {
    sqlx::query_as::<_, Ground>(&format!(
        "SELECT {GROUND_COLUMNS} FROM grounds WHERE is_active ORDER BY name"
    ))
    .fetch_all(db)
    .await
    .context("listing grounds")
}

pub async fn get(db: &PgPool, id: Uuid) -> Result<Option<Ground>> {
    sqlx::query_as::<_, Ground>(&format!("SELECT {GROUND_COLUMNS} FROM grounds WHERE id = $1"))
        .bind(id)
        .fetch_optional(db)
        .await
        .context("fetching ground")
}

/// Returns `None` when the name is already taken.
pub async fn create(
    db: &PgPool,
    name: &str,
    location: Option<&str>,
    day_rate: i64,
    night_rate: i64,
) -> Result<Option<Ground>> {
    let res = sqlx::query_as::<_, Ground>(&format!(
        r#"INSERT INTO grounds (name, location, day_rate, night_rate)
           VALUES ($1, $2, $3, $4)
           RETURNING {GROUND_COLUMNS}"#
    ))
    .bind(name)
    .bind(location)
    .bind(day_rate)
    .bind(night_rate)
    .fetch_one(db)
    .await;

    match res {
        Ok(g) => Ok(Some(g)),
        Err(sqlx::Error::Database(db_err)) if db_err.code().as_deref() == Some("23505") => Ok(None),
        Err(e) => Err(e).context("creating ground"),
    }
}

/// New rates apply to bookings made afterwards; existing slots keep the
/// rate they were booked at.
pub async fn update_rates(
    db: &PgPool,
    id: Uuid,
    day_rate: i64,
    night_rate: i64,
    is_active: Option<bool>,
) -> Result<Option<Ground>> {
    sqlx::query_as::<_, Ground>(&format!(
        r#"UPDATE grounds
              SET day_rate   = $2,
                  night_rate = $3,
                  is_active  = COALESCE($4, is_active)
            WHERE id = $1
        RETURNING {GROUND_COLUMNS}"#
    ))
    .bind(id)
    .bind(day_rate)
    .bind(night_rate)
    .bind(is_active)
    .fetch_optional(db)
    .await
    .context("updating ground rates")
}
