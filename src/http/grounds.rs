//! Ground catalogue and the per-day availability calendar.

use actix_web::{get, post, web, HttpResponse};
use chrono::NaiveDate;
use redis::Client as RedisClient;
use serde::{Deserialize, Serialize};
use sqlx::PgPool;
use uuid::Uuid;

use crate::booking::pricing::{day_schedule, SlotView, MAX_AMOUNT};
use crate::cache;
use crate::config::settings;
use crate::db::{booking_repo, ground_repo};
use crate::error::{AppError, AppResult};
use crate::events;
use crate::http::auth::AdminAuth;

#[derive(Deserialize)]
pub struct AvailabilityQuery {
    pub date: NaiveDate,
}

#[derive(Serialize)]
pub struct Availability {
    pub ground_id: Uuid,
    pub date: NaiveDate,
    pub slots: Vec<SlotView>,
}

#[derive(Deserialize)]
pub struct CreateGroundReq {
    pub name: String,
    #[serde(default)]
    pub location: Option<String>,
    pub day_rate: i64,
    pub night_rate: i64,
}

#[derive(Deserialize)]
pub struct RatesReq {
    pub day_rate: i64,
    pub night_rate: i64,
    #[serde(default)]
    pub is_active: Option<bool>,
}

/// GET /api/grounds
#[get("/grounds")]
pub async fn list(db: web::Data<PgPool>) -> AppResult<HttpResponse> {
    // Use in-memory cache if warmed; otherwise fall back to DB
    let grounds = if !cache::GROUNDS.is_empty() {
        cache::all_grounds()
    } else {
        ground_repo::list_active(&db).await?
    };
    Ok(HttpResponse::Ok().json(grounds))
}

/// GET /api/grounds/{id}
#[get("/grounds/{id}")]
pub async fn detail(path: web::Path<Uuid>, db: web::Data<PgPool>) -> AppResult<HttpResponse> {
    let ground = cache::ground_or_fetch(&db, path.into_inner())
        .await?
        .ok_or_else(|| AppError::not_found("ground"))?;
    Ok(HttpResponse::Ok().json(ground))
}

/// GET /api/grounds/{id}/availability?date=YYYY-MM-DD
#[get("/grounds/{id}/availability")]
pub async fn availability(
    path: web::Path<Uuid>,
    query: web::Query<AvailabilityQuery>,
    db: web::Data<PgPool>,
    redis: web::Data<RedisClient>,
) -> AppResult<HttpResponse> {
    let ground_id = path.into_inner();
    let date = query.date;
    let cfg = settings();

    let ground = cache::ground_or_fetch(&db, ground_id)
        .await?
        .ok_or_else(|| AppError::not_found("ground"))?;

    // 1) booked hours: Redis snapshot first, then Postgres. The generation
    //    is read before Postgres so a snapshot that races a booking lands
    //    under a key nobody reads any more.
    let generation = events::availability_generation(&redis, ground_id, date).await;
    let cached = match generation {
        Some(ver) => events::cached_availability(&redis, ground_id, date, ver)
            .await
            .and_then(|body| serde_json::from_str::<Vec<u8>>(&body).ok()),
        None => None,
    };
    let booked = match cached {
        Some(hours) => hours,
        None => {
            let hours = booking_repo::booked_hours(&db, ground_id, date).await?;
            if let (Some(ver), Ok(body)) = (generation, serde_json::to_string(&hours)) {
                events::cache_availability(
                    &redis,
                    ground_id,
                    date,
                    ver,
                    &body,
                    cfg.availability_cache_secs,
                )
                .await;
            }
            hours
        }
    };

    // 2) merge with rates and the ground-local clock
    let slots = day_schedule(
        ground.rates(),
        &booked,
        date,
        cfg.local_now(),
        cfg.night_start_hour,
        cfg.night_end_hour,
    );

    Ok(HttpResponse::Ok().json(Availability {
        ground_id,
        date,
        slots,
    }))
}

fn check_rates(day_rate: i64, night_rate: i64) -> AppResult<()> {
    if day_rate < 0 || night_rate < 0 {
        return Err(AppError::BadRequest("rates must not be negative".into()));
    }
    if day_rate > MAX_AMOUNT || night_rate > MAX_AMOUNT {
        return Err(AppError::BadRequest(format!(
            "rates must not exceed {MAX_AMOUNT}"
        )));
    }
    Ok(())
}

/// POST /api/admin/grounds
#[post("/admin/grounds")]
pub async fn create(
    _admin: AdminAuth,
    info: web::Json<CreateGroundReq>,
    db: web::Data<PgPool>,
) -> AppResult<HttpResponse> {
    let name = info.name.trim();
    if name.is_empty() {
        return Err(AppError::BadRequest("name is required".into()));
    }
    check_rates(info.day_rate, info.night_rate)?;

    let ground = ground_repo::create(
        &db,
        name,
        info.location.as_deref().map(str::trim).filter(|l| !l.is_empty()),
        info.day_rate,
        info.night_rate,
    )
    .await?
    .ok_or_else(|| AppError::Conflict("ground name already taken".into()))?;

    cache::store(ground.clone());
    log::info!("ground {} ({}) created", ground.id, ground.name);
    Ok(HttpResponse::Created().json(ground))
}

/// POST /api/admin/grounds/{id}/rates
#[post("/admin/grounds/{id}/rates")]
pub async fn update_rates(
    _admin: AdminAuth,
    path: web::Path<Uuid>,
    info: web::Json<RatesReq>,
    db: web::Data<PgPool>,
) -> AppResult<HttpResponse> {
    check_rates(info.day_rate, info.night_rate)?;
    let ground = ground_repo::update_rates(
        &db,
        path.into_inner(),
        info.day_rate,
        info.night_rate,
        info.is_active,
    )
    .await?
    .ok_or_else(|| AppError::not_found("ground"))?;

    cache::store(ground.clone());
    Ok(HttpResponse::Ok().json(ground))
}

pub fn init_routes(cfg: &mut web::ServiceConfig) {
    cfg.service(list)
        .service(availability)
        .service(detail)
        .service(create)
        .service(update_rates);
}
