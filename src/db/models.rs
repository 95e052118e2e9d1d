use chrono::{DateTime, NaiveDate, Utc};
use serde::Serialize;
use sqlx::FromRow;
use uuid::Uuid;

use crate::booking::{
    invoice::PaymentEntry,
    payment::BookingAmounts,
    pricing::SlotLine,
    types::{BookingStatus, ExtraCharge, PaymentKind, PaymentMethod, Rates, Role, SlotKind},
};

#[derive(Debug, Clone, Serialize, FromRow)]
pub struct User {
    pub id: Uuid,
    pub email: String,
    pub role: String,
    pub full_name: Option<String>,
    pub phone: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl User {
    /// Unknown role strings are treated as the least-privileged role.
    pub fn role(&self) -> Role {
        self.role.parse().unwrap_or(Role::Customer)
    }
}

#[derive(Debug, Clone, Serialize, FromRow)]
pub struct Ground {
    pub id: Uuid,
    pub name: String,
    pub location: Option<String>,
    pub day_rate: i64,
    pub night_rate: i64,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
}

impl Ground {
    pub fn rates(&self) -> Rates {
        Rates {
            day: self.day_rate,
            night: self.night_rate,
        }
    }
}

#[derive(Debug, Clone, Serialize, FromRow)]
pub struct Booking {
    pub id: Uuid,
    pub ground_id: Uuid,
    pub user_id: Uuid,
    pub booking_date: NaiveDate,
    pub customer_name: String,
    pub customer_phone: String,
    pub customer_email: Option<String>,
    pub status: String,
    pub total_amount: i64,
    pub advance_amount: i64,
    pub advance_method: String,
    pub payment_proof_url: Option<String>,
    pub remaining_amount: i64,
    pub remaining_method: Option<String>,
    pub extras_total: i64,
    pub discount_amount: i64,
    pub notes: Option<String>,
    pub cancel_reason: Option<String>,
    pub approved_by: Option<Uuid>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub completed_at: Option<DateTime<Utc>>,
}

/// Column list matching [`Booking`], for `SELECT`/`RETURNING`.
pub const BOOKING_COLUMNS: &str = "id, ground_id, user_id, booking_date, customer_name, \
     customer_phone, customer_email, status, total_amount, advance_amount, advance_method, \
     payment_proof_url, remaining_amount, remaining_method, extras_total, discount_amount, \
     notes, cancel_reason, approved_by, created_at, updated_at, completed_at";

impl Booking {
    pub fn status(&self) -> anyhow::Result<BookingStatus> {
        self.status
            .parse::<BookingStatus>()
            .map_err(|e: String| anyhow::anyhow!("booking {}: {e}", self.id))
    }

    pub fn amounts(&self) -> anyhow::Result<BookingAmounts> {
        Ok(BookingAmounts {
            status: self.status()?,
            total: self.total_amount,
            advance: self.advance_amount,
            remaining_paid: self.remaining_amount,
            extras_total: self.extras_total,
            discount: self.discount_amount,
        })
    }
}

#[derive(Debug, Clone, FromRow)]
pub struct BookingSlot {
    pub booking_id: Uuid,
    pub slot_hour: i16,
    pub kind: String,
    pub rate: i64,
}

impl BookingSlot {
    pub fn line(&self) -> SlotLine {
        let kind = self.kind.parse().unwrap_or(SlotKind::Day);
        SlotLine::new(self.slot_hour as u8, kind, self.rate)
    }
}

#[derive(Debug, Clone, FromRow)]
pub struct ExtraChargeRow {
    pub label: String,
    pub amount: i64,
}

impl From<ExtraChargeRow> for ExtraCharge {
    fn from(r: ExtraChargeRow) -> Self {
        ExtraCharge {
            label: r.label,
            amount: r.amount,
        }
    }
}

#[derive(Debug, Clone, FromRow)]
pub struct PaymentRow {
    pub kind: String,
    pub amount: i64,
    pub method: String,
    pub created_at: DateTime<Utc>,
}

impl PaymentRow {
    pub fn entry(&self) -> anyhow::Result<PaymentEntry> {
        let kind = match self.kind.as_str() {
            "advance" => PaymentKind::Advance,
            "remaining" => PaymentKind::Remaining,
            other => anyhow::bail!("unknown payment kind '{other}'"),
        };
        let method: PaymentMethod = self.method.parse().map_err(anyhow::Error::msg)?;
        Ok(PaymentEntry {
            kind,
            amount: self.amount,
            method,
            paid_at: self.created_at,
        })
    }
}
