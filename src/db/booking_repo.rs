//! Booking persistence. Every multi-step operation here runs in a single
//! transaction with the affected booking (or ground) row locked, so slot
//! exclusivity and the single remaining payment hold under concurrent
//! requests.

use chrono::{DateTime, Duration, NaiveDate, NaiveDateTime, Utc};
use serde::Serialize;
use sqlx::{PgPool, Postgres, QueryBuilder, Transaction};
use uuid::Uuid;

use crate::booking::{
    payment::{reconcile_completion, CompletionRequest, Settlement},
    pricing::{self, slot_label, Quote},
    types::{BookingStatus, PaymentKind},
    validation::{validate_advance, validate_new_booking, validate_proof_url, NewBooking},
    BookingError,
};
use crate::config::Settings;
use crate::db::models::{Booking, BookingSlot, ExtraChargeRow, Ground, PaymentRow, BOOKING_COLUMNS};
use crate::error::{AppError, AppResult};

fn is_unique_violation(e: &sqlx::Error) -> bool {
    matches!(e, sqlx::Error::Database(db_err) if db_err.code().as_deref() == Some("23505"))
}

fn taken_message(hours: &[i16]) -> String {
    let labels: Vec<String> = hours.iter().map(|&h| slot_label(h as u8)).collect();
    format!("slots already booked: {}", labels.join(", "))
}

async fn lock_booking(tx: &mut Transaction<'_, Postgres>, id: Uuid) -> AppResult<Booking> {
    sqlx::query_as::<_, Booking>(&format!(
        "SELECT {BOOKING_COLUMNS} FROM bookings WHERE id = $1 FOR UPDATE"
    ))
    .bind(id)
    .fetch_optional(&mut **tx)
    .await?
    .ok_or_else(|| AppError::not_found("booking"))
}

//////////////////////////////////////////////////
// create_booking_with_slots
//////////////////////////////////////////////////

/// Validate, price and persist a booking together with its slots and the
/// advance payment.
pub async fn create_booking_with_slots(
    db: &PgPool,
    user_id: Uuid,
    req: &NewBooking,
    cfg: &Settings,
    now_local: NaiveDateTime,
) -> AppResult<(Booking, Quote)> {
    let hours = validate_new_booking(req, now_local, cfg.max_slots_per_booking)?;

    let mut tx = db.begin().await?;

    // 1) Lock the ground: serialises concurrent bookings per ground.
    let ground = sqlx::query_as::<_, Ground>(
        "SELECT id, name, location, day_rate, night_rate, is_active, created_at
           FROM grounds
          WHERE id = $1 AND is_active
          FOR UPDATE",
    )
    .bind(req.ground_id)
    .fetch_optional(&mut *tx)
    .await?
    .ok_or_else(|| AppError::not_found("ground"))?;

    // 2) Price
    let quote = pricing::quote(ground.rates(), &hours, cfg.night_start_hour, cfg.night_end_hour)?;
    validate_advance(req.advance_amount, quote.total, cfg.min_advance_percent)?;

    // 3) Availability
    let wanted: Vec<i16> = hours.iter().map(|&h| h as i16).collect();
    let taken: Vec<i16> = sqlx::query_scalar(
        "SELECT slot_hour
           FROM booking_slots
          WHERE ground_id = $1
            AND slot_date = $2
            AND NOT released
            AND slot_hour = ANY($3)
          ORDER BY slot_hour",
    )
    .bind(ground.id)
    .bind(req.booking_date)
    .bind(&wanted)
    .fetch_all(&mut *tx)
    .await?;

    if !taken.is_empty() {
        tx.rollback().await.ok();
        return Err(AppError::Conflict(taken_message(&taken)));
    }

    // 4) Booking row
    let booking = sqlx::query_as::<_, Booking>(&format!(
        r#"INSERT INTO bookings (ground_id, user_id, booking_date, customer_name,
                                 customer_phone, customer_email, total_amount,
                                 advance_amount, advance_method, payment_proof_url, notes)
           VALUES ($1,$2,$3,$4,$5,$6,$7,$8,$9,$10,$11)
           RETURNING {BOOKING_COLUMNS}"#
    ))
    .bind(ground.id)
    .bind(user_id)
    .bind(req.booking_date)
    .bind(req.customer_name.trim())
    .bind(req.customer_phone.trim())
    .bind(req.customer_email.as_deref().map(str::trim).filter(|e| !e.is_empty()))
    .bind(quote.total)
    .bind(req.advance_amount)
    .bind(req.advance_method.as_str())
    .bind(req.payment_proof_url.as_deref().map(str::trim))
    .bind(req.notes.as_deref())
    .fetch_one(&mut *tx)
    .await?;

    // 5) Slots; the partial unique index catches anything that raced past step 3.
    for line in &quote.lines {
        let res = sqlx::query(
            r#"INSERT INTO booking_slots (booking_id, ground_id, slot_date, slot_hour, kind, rate)
               VALUES ($1,$2,$3,$4,$5,$6)"#,
        )
        .bind(booking.id)
        .bind(ground.id)
        .bind(req.booking_date)
        .bind(line.hour as i16)
        .bind(line.kind.as_str())
        .bind(line.rate)
        .execute(&mut *tx)
        .await;

        if let Err(e) = res {
            tx.rollback().await.ok();
            return Err(if is_unique_violation(&e) {
                AppError::Conflict(taken_message(&[line.hour as i16]))
            } else {
                e.into()
            });
        }
    }

    // 6) Advance payment
    if req.advance_amount > 0 {
        sqlx::query(
            r#"INSERT INTO payments (booking_id, kind, amount, method, recorded_by)
               VALUES ($1, $2, $3, $4, $5)"#,
        )
        .bind(booking.id)
        .bind(PaymentKind::Advance.as_str())
        .bind(req.advance_amount)
        .bind(req.advance_method.as_str())
        .bind(user_id)
        .execute(&mut *tx)
        .await?;
    }

    tx.commit().await?;
    log::info!(
        "booking {} created: ground {} on {} hours {:?} total {}",
        booking.id,
        ground.id,
        req.booking_date,
        hours,
        quote.total
    );
    Ok((booking, quote))
}

//////////////////////////////////////////////////
// Reads
//////////////////////////////////////////////////

/// Hours of `date` that are held by a live booking.
pub async fn booked_hours(db: &PgPool, ground_id: Uuid, date: NaiveDate) -> AppResult<Vec<u8>> {
    let rows: Vec<i16> = sqlx::query_scalar(
        "SELECT slot_hour FROM booking_slots
          WHERE ground_id = $1 AND slot_date = $2 AND NOT released
          ORDER BY slot_hour",
    )
    .bind(ground_id)
    .bind(date)
    .fetch_all(db)
    .await?;
    Ok(rows.into_iter().map(|h| h as u8).collect())
}

pub async fn get_booking(db: &PgPool, id: Uuid) -> AppResult<Option<Booking>> {
    Ok(sqlx::query_as::<_, Booking>(&format!(
        "SELECT {BOOKING_COLUMNS} FROM bookings WHERE id = $1"
    ))
    .bind(id)
    .fetch_optional(db)
    .await?)
}

/// `%q%` for `ILIKE`, with `\`, `%` and `_` in `q` matched literally.
pub fn like_pattern(q: &str) -> String {
    let escaped = q
        .replace('\\', "\\\\")
        .replace('%', "\\%")
        .replace('_', "\\_");
    format!("%{escaped}%")
}

#[derive(Debug, Default, Clone)]
pub struct BookingFilter {
    pub status: Option<BookingStatus>,
    pub from: Option<NaiveDate>,
    pub to: Option<NaiveDate>,
    pub ground_id: Option<Uuid>,
    /// Case-insensitive match on customer name or phone.
    pub search: Option<String>,
    pub limit: i64,
    pub offset: i64,
}

pub async fn list_bookings(db: &PgPool, filter: &BookingFilter) -> AppResult<Vec<Booking>> {
    let mut qb: QueryBuilder<Postgres> =
        QueryBuilder::new(format!("SELECT {BOOKING_COLUMNS} FROM bookings WHERE TRUE"));

    if let Some(status) = filter.status {
        qb.push(" AND status = ").push_bind(status.as_str());
    }
    if let Some(from) = filter.from {
        qb.push(" AND booking_date >= ").push_bind(from);
    }
    if let Some(to) = filter.to {
        qb.push(" AND booking_date <= ").push_bind(to);
    }
    if let Some(ground) = filter.ground_id {
        qb.push(" AND ground_id = ").push_bind(ground);
    }
    if let Some(q) = filter.search.as_deref().map(str::trim).filter(|q| !q.is_empty()) {
        let pattern = like_pattern(q);
        qb.push(" AND (customer_name ILIKE ")
            .push_bind(pattern.clone())
            .push(" OR customer_phone ILIKE ")
            .push_bind(pattern)
            .push(")");
    }
    qb.push(" ORDER BY booking_date DESC, created_at DESC LIMIT ")
        .push_bind(filter.limit)
        .push(" OFFSET ")
        .push_bind(filter.offset);

    Ok(qb.build_query_as::<Booking>().fetch_all(db).await?)
}

pub async fn list_for_user(db: &PgPool, user_id: Uuid) -> AppResult<Vec<Booking>> {
    Ok(sqlx::query_as::<_, Booking>(&format!(
        "SELECT {BOOKING_COLUMNS} FROM bookings
          WHERE user_id = $1
          ORDER BY booking_date DESC, created_at DESC
          LIMIT 200"
    ))
    .bind(user_id)
    .fetch_all(db)
    .await?)
}

/// Slots of the given bookings, ordered by booking then hour.
pub async fn slots_of(db: &PgPool, booking_ids: &[Uuid]) -> AppResult<Vec<BookingSlot>> {
    Ok(sqlx::query_as::<_, BookingSlot>(
        "SELECT booking_id, slot_hour, kind, rate
           FROM booking_slots
          WHERE booking_id = ANY($1)
          ORDER BY booking_id, slot_hour",
    )
    .bind(booking_ids)
    .fetch_all(db)
    .await?)
}

pub async fn extras_of(db: &PgPool, booking_id: Uuid) -> AppResult<Vec<ExtraChargeRow>> {
    Ok(sqlx::query_as::<_, ExtraChargeRow>(
        "SELECT label, amount FROM booking_extra_charges WHERE booking_id = $1 ORDER BY id",
    )
    .bind(booking_id)
    .fetch_all(db)
    .await?)
}

pub async fn payments_of(db: &PgPool, booking_id: Uuid) -> AppResult<Vec<PaymentRow>> {
    Ok(sqlx::query_as::<_, PaymentRow>(
        "SELECT kind, amount, method, created_at FROM payments WHERE booking_id = $1 ORDER BY id",
    )
    .bind(booking_id)
    .fetch_all(db)
    .await?)
}

//////////////////////////////////////////////////
// Status transitions
//////////////////////////////////////////////////

/// Move a booking along the status machine and return it together with the
/// status it held under the row lock. Completion goes through
/// [`verify_remaining_payment_with_extra_charges`] instead.
pub async fn transition_status(
    db: &PgPool,
    id: Uuid,
    next: BookingStatus,
    actor: Uuid,
    reason: Option<&str>,
) -> AppResult<(Booking, BookingStatus)> {
    if next == BookingStatus::Completed {
        return Err(AppError::BadRequest(
            "bookings are completed by recording the remaining payment".into(),
        ));
    }

    let mut tx = db.begin().await?;
    let current = lock_booking(&mut tx, id).await?;
    let from = current.status()?;
    let updated = apply_transition(&mut tx, &current, next, actor, reason).await?;
    tx.commit().await?;

    log::info!("booking {id} {from} -> {next} by {actor}");
    Ok((updated, from))
}

/// Customers may withdraw their own booking while it is still pending.
pub async fn cancel_own_pending(db: &PgPool, id: Uuid, user_id: Uuid) -> AppResult<Booking> {
    let mut tx = db.begin().await?;
    let current = lock_booking(&mut tx, id).await?;
    if current.user_id != user_id {
        return Err(AppError::not_found("booking"));
    }
    let status = current.status()?;
    if status != BookingStatus::Pending {
        return Err(AppError::Conflict(format!(
            "booking is {status}; contact the ground to cancel it"
        )));
    }
    let updated = apply_transition(
        &mut tx,
        &current,
        BookingStatus::Cancelled,
        user_id,
        Some("cancelled by customer"),
    )
    .await?;
    tx.commit().await?;

    log::info!("booking {id} cancelled by its customer");
    Ok(updated)
}

async fn apply_transition(
    tx: &mut Transaction<'_, Postgres>,
    current: &Booking,
    next: BookingStatus,
    actor: Uuid,
    reason: Option<&str>,
) -> AppResult<Booking> {
    let from = current.status()?;
    if !from.can_transition_to(next) {
        return Err(BookingError::InvalidTransition { from, to: next }.into());
    }

    let updated = sqlx::query_as::<_, Booking>(&format!(
        r#"UPDATE bookings
              SET status        = $2,
                  approved_by   = CASE WHEN $2 = 'approved' THEN $3 ELSE approved_by END,
                  cancel_reason = CASE WHEN $2 = 'cancelled' THEN $4 ELSE cancel_reason END,
                  updated_at    = NOW()
            WHERE id = $1
        RETURNING {BOOKING_COLUMNS}"#
    ))
    .bind(current.id)
    .bind(next.as_str())
    .bind(actor)
    .bind(reason)
    .fetch_one(&mut **tx)
    .await?;

    if !next.holds_slots() {
        sqlx::query("UPDATE booking_slots SET released = TRUE WHERE booking_id = $1")
            .bind(current.id)
            .execute(&mut **tx)
            .await?;
    }
    Ok(updated)
}

/// Attach a payment-proof link to the caller's own pending booking.
pub async fn attach_payment_proof(
    db: &PgPool,
    id: Uuid,
    user_id: Uuid,
    proof_url: &str,
) -> AppResult<Booking> {
    validate_proof_url(proof_url)?;
    sqlx::query_as::<_, Booking>(&format!(
        r#"UPDATE bookings
              SET payment_proof_url = $3, updated_at = NOW()
            WHERE id = $1 AND user_id = $2 AND status = 'pending'
        RETURNING {BOOKING_COLUMNS}"#
    ))
    .bind(id)
    .bind(user_id)
    .bind(proof_url.trim())
    .fetch_optional(db)
    .await?
    .ok_or_else(|| AppError::not_found("pending booking"))
}

//////////////////////////////////////////////////
// verify_remaining_payment_with_extra_charges
//////////////////////////////////////////////////

/// Record the balance collected at the ground together with any extras and
/// discount, and complete the booking.
pub async fn verify_remaining_payment_with_extra_charges(
    db: &PgPool,
    id: Uuid,
    req: &CompletionRequest,
    actor: Uuid,
) -> AppResult<(Booking, Settlement)> {
    let mut tx = db.begin().await?;
    let current = lock_booking(&mut tx, id).await?;

    let settlement = reconcile_completion(
        current.status()?,
        current.total_amount,
        current.advance_amount,
        req,
    )?;

    for charge in &settlement.extra_charges {
        sqlx::query("INSERT INTO booking_extra_charges (booking_id, label, amount) VALUES ($1,$2,$3)")
            .bind(id)
            .bind(&charge.label)
            .bind(charge.amount)
            .execute(&mut *tx)
            .await?;
    }

    if settlement.amount_received > 0 {
        let res = sqlx::query(
            r#"INSERT INTO payments (booking_id, kind, amount, method, recorded_by)
               VALUES ($1, $2, $3, $4, $5)"#,
        )
        .bind(id)
        .bind(PaymentKind::Remaining.as_str())
        .bind(settlement.amount_received)
        .bind(req.method.as_str())
        .bind(actor)
        .execute(&mut *tx)
        .await;

        if let Err(e) = res {
            tx.rollback().await.ok();
            return Err(if is_unique_violation(&e) {
                BookingError::AlreadyCompleted.into()
            } else {
                e.into()
            });
        }
    }

    let updated = sqlx::query_as::<_, Booking>(&format!(
        r#"UPDATE bookings
              SET status           = 'completed',
                  remaining_amount = $2,
                  remaining_method = $3,
                  extras_total     = $4,
                  discount_amount  = $5,
                  notes            = COALESCE($6, notes),
                  completed_at     = NOW(),
                  updated_at       = NOW()
            WHERE id = $1 AND status = 'approved'
        RETURNING {BOOKING_COLUMNS}"#
    ))
    .bind(id)
    .bind(settlement.amount_received)
    .bind(req.method.as_str())
    .bind(settlement.extras_total)
    .bind(settlement.discount)
    .bind(req.notes.as_deref())
    .fetch_optional(&mut *tx)
    .await?;

    let Some(updated) = updated else {
        tx.rollback().await.ok();
        return Err(AppError::Conflict("booking changed while recording payment".into()));
    };

    tx.commit().await?;
    log::info!(
        "booking {id} completed by {actor}: received {} (extras {}, discount {})",
        settlement.amount_received,
        settlement.extras_total,
        settlement.discount
    );
    Ok((updated, settlement))
}

//////////////////////////////////////////////////
// cleanup_expired_bookings
//////////////////////////////////////////////////

#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct ExpiredBooking {
    pub id: Uuid,
    pub ground_id: Uuid,
    pub booking_date: NaiveDate,
}

/// Cancel pending bookings that were never backed by a payment proof within
/// the hold window, and any pending booking whose date has passed.
pub async fn cleanup_expired_bookings(
    db: &PgPool,
    hold: Duration,
    today: NaiveDate,
) -> AppResult<Vec<ExpiredBooking>> {
    let cutoff: DateTime<Utc> = Utc::now() - hold;
    let mut tx = db.begin().await?;

    let expired = sqlx::query_as::<_, ExpiredBooking>(
        r#"UPDATE bookings
              SET status = 'cancelled', cancel_reason = 'expired', updated_at = NOW()
            WHERE status = 'pending'
              AND ((payment_proof_url IS NULL AND created_at < $1) OR booking_date < $2)
        RETURNING id, ground_id, booking_date"#,
    )
    .bind(cutoff)
    .bind(today)
    .fetch_all(&mut *tx)
    .await?;

    if !expired.is_empty() {
        let ids: Vec<Uuid> = expired.iter().map(|b| b.id).collect();
        sqlx::query("UPDATE booking_slots SET released = TRUE WHERE booking_id = ANY($1)")
            .bind(&ids)
            .execute(&mut *tx)
            .await?;
    }

    tx.commit().await?;
    if !expired.is_empty() {
        log::info!("expired {} pending booking(s)", expired.len());
    }
    Ok(expired)
}
