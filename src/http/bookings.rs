//! Customer booking endpoints: create, list own, detail, proof, withdraw.

use actix_web::{get, post, web, HttpResponse};
use chrono::Utc;
use redis::Client as RedisClient;
use serde::{Deserialize, Serialize};
use sqlx::PgPool;
use uuid::Uuid;

use crate::booking::{
    payment::PaymentBreakdown,
    pricing::{Quote, SlotLine},
    types::{BookingStatus, ExtraCharge},
    validation::NewBooking,
};
use crate::config::settings;
use crate::db::{booking_repo, models::Booking};
use crate::error::{AppError, AppResult};
use crate::events::{self, BookingEvent};
use crate::http::auth::JwtAuth;

//////////////////////////////////////////////////
// DTOs
//////////////////////////////////////////////////

#[derive(Serialize)]
pub struct CreatedBooking {
    pub booking: Booking,
    pub quote: Quote,
}

#[derive(Serialize)]
pub struct BookingDetail {
    pub booking: Booking,
    pub slots: Vec<SlotLine>,
    pub extra_charges: Vec<ExtraCharge>,
    pub payment: PaymentBreakdown,
}

#[derive(Deserialize)]
pub struct ProofReq {
    pub payment_proof_url: String,
}

/// Slots, extras and the payment breakdown for one booking.
pub async fn load_detail(db: &PgPool, booking: Booking) -> AppResult<BookingDetail> {
    let slots = booking_repo::slots_of(db, &[booking.id])
        .await?
        .iter()
        .map(|s| s.line())
        .collect();
    let extra_charges = booking_repo::extras_of(db, booking.id)
        .await?
        .into_iter()
        .map(ExtraCharge::from)
        .collect();
    let payment = PaymentBreakdown::compute(booking.amounts()?);
    Ok(BookingDetail {
        booking,
        slots,
        extra_charges,
        payment,
    })
}

/// Drop cached availability and announce a status change.
pub async fn after_status_change(
    redis: &RedisClient,
    booking: &Booking,
    from: BookingStatus,
    to: BookingStatus,
) {
    events::invalidate_availability(redis, booking.ground_id, booking.booking_date).await;
    events::publish(
        redis,
        &BookingEvent::StatusChanged {
            booking_id: booking.id,
            from,
            to,
            ts: Utc::now(),
        },
    )
    .await;
}

//////////////////////////////////////////////////
// Handlers
//////////////////////////////////////////////////

/// POST /api/bookings
#[post("/bookings")]
pub async fn create(
    auth: JwtAuth,
    info: web::Json<NewBooking>,
    db: web::Data<PgPool>,
    redis: web::Data<RedisClient>,
) -> AppResult<HttpResponse> {
    let cfg = settings();
    let (booking, quote) =
        booking_repo::create_booking_with_slots(&db, auth.user_id, &info, cfg, cfg.local_now())
            .await?;

    events::invalidate_availability(&redis, booking.ground_id, booking.booking_date).await;
    events::publish(
        &redis,
        &BookingEvent::Created {
            booking_id: booking.id,
            ground_id: booking.ground_id,
            date: booking.booking_date,
            hours: quote.lines.iter().map(|l| l.hour).collect(),
            ts: Utc::now(),
        },
    )
    .await;

    Ok(HttpResponse::Created().json(CreatedBooking { booking, quote }))
}

/// GET /api/bookings/mine
#[get("/bookings/mine")]
pub async fn mine(auth: JwtAuth, db: web::Data<PgPool>) -> AppResult<HttpResponse> {
    let rows = booking_repo::list_for_user(&db, auth.user_id).await?;
    Ok(HttpResponse::Ok().json(rows))
}

/// GET /api/bookings/{id}
#[get("/bookings/{id}")]
pub async fn detail(
    auth: JwtAuth,
    path: web::Path<Uuid>,
    db: web::Data<PgPool>,
) -> AppResult<HttpResponse> {
    let booking = booking_repo::get_booking(&db, path.into_inner())
        .await?
        .filter(|b| b.user_id == auth.user_id || auth.is_admin())
        .ok_or_else(|| AppError::not_found("booking"))?;

    Ok(HttpResponse::Ok().json(load_detail(&db, booking).await?))
}

/// POST /api/bookings/{id}/proof
#[post("/bookings/{id}/proof")]
pub async fn attach_proof(
    auth: JwtAuth,
    path: web::Path<Uuid>,
    info: web::Json<ProofReq>,
    db: web::Data<PgPool>,
) -> AppResult<HttpResponse> {
    let booking = booking_repo::attach_payment_proof(
        &db,
        path.into_inner(),
        auth.user_id,
        &info.payment_proof_url,
    )
    .await?;
    Ok(HttpResponse::Ok().json(booking))
}

/// POST /api/bookings/{id}/cancel
#[post("/bookings/{id}/cancel")]
pub async fn cancel(
    auth: JwtAuth,
    path: web::Path<Uuid>,
    db: web::Data<PgPool>,
    redis: web::Data<RedisClient>,
) -> AppResult<HttpResponse> {
    let booking = booking_repo::cancel_own_pending(&db, path.into_inner(), auth.user_id).await?;
    after_status_change(&redis, &booking, BookingStatus::Pending, BookingStatus::Cancelled).await;
    Ok(HttpResponse::Ok().json(booking))
}

pub fn init_routes(cfg: &mut web::ServiceConfig) {
    // `mine` before `{id}` so the literal path wins.
    cfg.service(create)
        .service(mine)
        .service(detail)
        .service(attach_proof)
        .service(cancel);
}
