//! Admin dashboard: booking approval, payment completion, invoices,
//! exports, expiry and stats.

use std::collections::HashMap;

use actix_web::{get, post, web, HttpResponse};
use chrono::{NaiveDate, Utc};
use redis::Client as RedisClient;
use serde::Deserialize;
use sqlx::PgPool;
use uuid::Uuid;

use crate::booking::{
    invoice::{bookings_csv, ExportRow, Invoice, InvoiceInput},
    payment::{CompletionRequest, PaymentBreakdown},
    types::{BookingStatus, ExtraCharge},
};
use crate::cleanup;
use crate::config::settings;
use crate::db::{booking_repo, booking_repo::BookingFilter, ground_repo, report_repo};
use crate::error::{AppError, AppResult};
use crate::events::{self, BookingEvent};
use crate::http::auth::AdminAuth;
use crate::http::bookings::{after_status_change, load_detail};

const EXPORT_LIMIT: i64 = 10_000;

//////////////////////////////////////////////////
// Requests
//////////////////////////////////////////////////

#[derive(Deserialize, Default)]
pub struct ListQuery {
    pub status: Option<String>,
    pub from: Option<NaiveDate>,
    pub to: Option<NaiveDate>,
    pub ground_id: Option<Uuid>,
    pub q: Option<String>,
    pub limit: Option<i64>,
    pub offset: Option<i64>,
}

impl ListQuery {
    pub fn into_filter(self, max_limit: i64) -> AppResult<BookingFilter> {
        let status = self
            .status
            .as_deref()
            .filter(|s| !s.is_empty())
            .map(str::parse::<BookingStatus>)
            .transpose()
            .map_err(AppError::BadRequest)?;
        if let (Some(from), Some(to)) = (self.from, self.to) {
            if from > to {
                return Err(AppError::BadRequest("`from` is after `to`".into()));
            }
        }
        Ok(BookingFilter {
            status,
            from: self.from,
            to: self.to,
            ground_id: self.ground_id,
            search: self.q,
            limit: self.limit.unwrap_or(50).clamp(1, max_limit),
            offset: self.offset.unwrap_or(0).max(0),
        })
    }
}

#[derive(Deserialize)]
pub struct CancelReq {
    #[serde(default)]
    pub reason: Option<String>,
}

#[derive(Deserialize)]
pub struct InvoiceQuery {
    #[serde(default)]
    pub format: Option<String>,
}

#[derive(Deserialize)]
pub struct StatsQuery {
    pub from: Option<NaiveDate>,
    pub to: Option<NaiveDate>,
}

//////////////////////////////////////////////////
// Handlers
//////////////////////////////////////////////////

/// GET /api/admin/bookings
#[get("/admin/bookings")]
pub async fn list(
    _admin: AdminAuth,
    query: web::Query<ListQuery>,
    db: web::Data<PgPool>,
) -> AppResult<HttpResponse> {
    let filter = query.into_inner().into_filter(200)?;
    let rows = booking_repo::list_bookings(&db, &filter).await?;
    Ok(HttpResponse::Ok().json(rows))
}

/// GET /api/admin/bookings/export.csv
#[get("/admin/bookings/export.csv")]
pub async fn export_csv(
    _admin: AdminAuth,
    query: web::Query<ListQuery>,
    db: web::Data<PgPool>,
) -> AppResult<HttpResponse> {
    let mut filter = query.into_inner().into_filter(EXPORT_LIMIT)?;
    filter.limit = EXPORT_LIMIT;
    filter.offset = 0;

    let bookings = booking_repo::list_bookings(&db, &filter).await?;
    let ids: Vec<Uuid> = bookings.iter().map(|b| b.id).collect();

    let mut slot_labels: HashMap<Uuid, Vec<String>> = HashMap::new();
    for slot in booking_repo::slots_of(&db, &ids).await? {
        slot_labels
            .entry(slot.booking_id)
            .or_default()
            .push(slot.line().label);
    }

    let mut rows = Vec::with_capacity(bookings.len());
    for b in &bookings {
        let breakdown = PaymentBreakdown::compute(b.amounts()?);
        rows.push(ExportRow {
            booking_id: b.id,
            date: b.booking_date,
            slots: slot_labels.remove(&b.id).unwrap_or_default().join(" "),
            customer: b.customer_name.clone(),
            phone: b.customer_phone.clone(),
            status: b.status()?,
            total: b.total_amount,
            advance: b.advance_amount,
            remaining: b.remaining_amount,
            extras: b.extras_total,
            discount: b.discount_amount,
            balance: breakdown.balance_due,
        });
    }

    let body = bookings_csv(&rows)?;
    Ok(HttpResponse::Ok()
        .content_type("text/csv; charset=utf-8")
        .insert_header((
            "Content-Disposition",
            format!("attachment; filename=\"bookings-{}.csv\"", Utc::now().format("%Y%m%d")),
        ))
        .body(body))
}

/// GET /api/admin/bookings/{id}
#[get("/admin/bookings/{id}")]
pub async fn detail(
    _admin: AdminAuth,
    path: web::Path<Uuid>,
    db: web::Data<PgPool>,
) -> AppResult<HttpResponse> {
    let booking = booking_repo::get_booking(&db, path.into_inner())
        .await?
        .ok_or_else(|| AppError::not_found("booking"))?;
    Ok(HttpResponse::Ok().json(load_detail(&db, booking).await?))
}

/// POST /api/admin/bookings/{id}/approve
#[post("/admin/bookings/{id}/approve")]
pub async fn approve(
    admin: AdminAuth,
    path: web::Path<Uuid>,
    db: web::Data<PgPool>,
    redis: web::Data<RedisClient>,
) -> AppResult<HttpResponse> {
    let (booking, from) = booking_repo::transition_status(
        &db,
        path.into_inner(),
        BookingStatus::Approved,
        admin.0.user_id,
        None,
    )
    .await?;
    after_status_change(&redis, &booking, from, BookingStatus::Approved).await;
    Ok(HttpResponse::Ok().json(booking))
}

/// POST /api/admin/bookings/{id}/cancel
#[post("/admin/bookings/{id}/cancel")]
pub async fn cancel(
    admin: AdminAuth,
    path: web::Path<Uuid>,
    info: web::Json<CancelReq>,
    db: web::Data<PgPool>,
    redis: web::Data<RedisClient>,
) -> AppResult<HttpResponse> {
    let reason = info
        .reason
        .as_deref()
        .map(str::trim)
        .filter(|r| !r.is_empty())
        .unwrap_or("cancelled by admin");
    let (booking, from) = booking_repo::transition_status(
        &db,
        path.into_inner(),
        BookingStatus::Cancelled,
        admin.0.user_id,
        Some(reason),
    )
    .await?;
    after_status_change(&redis, &booking, from, BookingStatus::Cancelled).await;
    Ok(HttpResponse::Ok().json(booking))
}

/// POST /api/admin/bookings/{id}/complete
#[post("/admin/bookings/{id}/complete")]
pub async fn complete(
    admin: AdminAuth,
    path: web::Path<Uuid>,
    info: web::Json<CompletionRequest>,
    db: web::Data<PgPool>,
    redis: web::Data<RedisClient>,
) -> AppResult<HttpResponse> {
    let (booking, settlement) = booking_repo::verify_remaining_payment_with_extra_charges(
        &db,
        path.into_inner(),
        &info,
        admin.0.user_id,
    )
    .await?;

    events::publish(
        &redis,
        &BookingEvent::Completed {
            booking_id: booking.id,
            amount_received: settlement.amount_received,
            ts: Utc::now(),
        },
    )
    .await;

    let booking_detail = load_detail(&db, booking).await?;
    Ok(HttpResponse::Ok().json(serde_json::json!({
        "settlement": settlement,
        "booking": booking_detail,
    })))
}

/// GET /api/admin/bookings/{id}/invoice[?format=text]
#[get("/admin/bookings/{id}/invoice")]
pub async fn invoice(
    _admin: AdminAuth,
    path: web::Path<Uuid>,
    query: web::Query<InvoiceQuery>,
    db: web::Data<PgPool>,
) -> AppResult<HttpResponse> {
    let booking = booking_repo::get_booking(&db, path.into_inner())
        .await?
        .ok_or_else(|| AppError::not_found("booking"))?;
    let ground = ground_repo::get(&db, booking.ground_id)
        .await?
        .ok_or_else(|| AppError::not_found("ground"))?;

    let slots = booking_repo::slots_of(&db, &[booking.id])
        .await?
        .iter()
        .map(|s| s.line())
        .collect();
    let extras = booking_repo::extras_of(&db, booking.id)
        .await?
        .into_iter()
        .map(ExtraCharge::from)
        .collect();
    let payments = booking_repo::payments_of(&db, booking.id)
        .await?
        .iter()
        .map(|p| p.entry())
        .collect::<anyhow::Result<Vec<_>>>()?;

    let inv = Invoice::build(
        InvoiceInput {
            booking_id: booking.id,
            created_at: booking.created_at,
            booking_date: booking.booking_date,
            customer_name: &booking.customer_name,
            customer_phone: &booking.customer_phone,
            customer_email: booking.customer_email.as_deref(),
            ground_name: &ground.name,
            amounts: booking.amounts()?,
            slots,
            extras,
            payments,
            currency: &settings().currency,
        },
        Utc::now(),
    )?;

    match query.format.as_deref() {
        Some("text") => Ok(HttpResponse::Ok()
            .content_type("text/plain; charset=utf-8")
            .body(inv.render_text())),
        None | Some("json") => Ok(HttpResponse::Ok().json(inv)),
        Some(other) => Err(AppError::BadRequest(format!("unknown invoice format '{other}'"))),
    }
}

/// POST /api/admin/cleanup
#[post("/admin/cleanup")]
pub async fn run_cleanup(
    _admin: AdminAuth,
    db: web::Data<PgPool>,
    redis: web::Data<RedisClient>,
) -> AppResult<HttpResponse> {
    let expired = cleanup::expire_now(&db, &redis).await?;
    Ok(HttpResponse::Ok().json(serde_json::json!({
        "expired": expired.len(),
        "bookings": expired,
    })))
}

/// GET /api/admin/stats
#[get("/admin/stats")]
pub async fn stats(
    _admin: AdminAuth,
    query: web::Query<StatsQuery>,
    db: web::Data<PgPool>,
) -> AppResult<HttpResponse> {
    let dashboard = report_repo::dashboard(&db, query.from, query.to).await?;
    Ok(HttpResponse::Ok().json(dashboard))
}

pub fn init_routes(cfg: &mut web::ServiceConfig) {
    // `export.csv` before `{id}` so the literal path wins.
    cfg.service(list)
        .service(export_csv)
        .service(detail)
        .service(approve)
        .service(cancel)
        .service(complete)
        .service(invoice)
        .service(run_cleanup)
        .service(stats);
}
