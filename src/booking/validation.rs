use chrono::{NaiveDate, NaiveDateTime, Timelike};
use serde::Deserialize;
use uuid::Uuid;

use super::pricing::minimum_advance;
use super::types::PaymentMethod;
use super::BookingError;

/// Customer booking form.
#[derive(Debug, Deserialize, Clone)]
pub struct NewBooking {
    pub ground_id: Uuid,
    pub booking_date: NaiveDate,
    pub slot_hours: Vec<i64>,
    pub customer_name: String,
    pub customer_phone: String,
    #[serde(default)]
    pub customer_email: Option<String>,
    pub advance_amount: i64,
    pub advance_method: PaymentMethod,
    #[serde(default)]
    pub payment_proof_url: Option<String>,
    #[serde(default)]
    pub notes: Option<String>,
}

/// Checks the form against the ground-local clock and returns the
/// requested hours sorted ascending.
pub fn validate_new_booking(
    req: &NewBooking,
    now_local: NaiveDateTime,
    max_slots: usize,
) -> Result<Vec<u8>, BookingError> {
    if req.slot_hours.is_empty() {
        return Err(BookingError::NoSlots);
    }
    if req.slot_hours.len() > max_slots {
        return Err(BookingError::TooManySlots { max: max_slots });
    }

    let mut hours = Vec::with_capacity(req.slot_hours.len());
    for &h in &req.slot_hours {
        if !(0..24).contains(&h) {
            return Err(BookingError::SlotOutOfRange(h));
        }
        let h = h as u8;
        if hours.contains(&h) {
            return Err(BookingError::DuplicateSlot(h));
        }
        hours.push(h);
    }
    hours.sort_unstable();

    let today = now_local.date();
    if req.booking_date < today {
        return Err(BookingError::PastDate);
    }
    if req.booking_date == today {
        let current = now_local.hour() as u8;
        if let Some(&started) = hours.iter().find(|&&h| h <= current) {
            return Err(BookingError::SlotStarted(started));
        }
    }

    validate_contact(&req.customer_name, &req.customer_phone, req.customer_email.as_deref())?;

    if let Some(proof) = req.payment_proof_url.as_deref() {
        validate_proof_url(proof)?;
    }

    Ok(hours)
}

pub fn validate_contact(name: &str, phone: &str, email: Option<&str>) -> Result<(), BookingError> {
    let name = name.trim();
    if name.is_empty() || name.chars().count() > 100 {
        return Err(BookingError::InvalidContact("name must be 1-100 characters"));
    }

    let phone = phone.trim();
    let body = phone.strip_prefix('+').unwrap_or(phone);
    if !body.chars().all(|c| c.is_ascii_digit() || c == ' ' || c == '-') {
        return Err(BookingError::InvalidContact("phone may only contain digits"));
    }
    let digits = body.chars().filter(char::is_ascii_digit).count();
    if !(7..=15).contains(&digits) {
        return Err(BookingError::InvalidContact("phone must have 7-15 digits"));
    }

    if let Some(email) = email.map(str::trim).filter(|e| !e.is_empty()) {
        let mut parts = email.split('@');
        let ok = matches!(
            (parts.next(), parts.next(), parts.next()),
            (Some(local), Some(domain), None) if !local.is_empty() && !domain.is_empty()
        );
        if !ok {
            return Err(BookingError::InvalidContact("email is malformed"));
        }
    }
    Ok(())
}

pub fn validate_proof_url(raw: &str) -> Result<(), BookingError> {
    match url::Url::parse(raw.trim()) {
        Ok(u) if matches!(u.scheme(), "http" | "https") => Ok(()),
        _ => Err(BookingError::InvalidProofUrl),
    }
}

pub fn validate_advance(advance: i64, total: i64, min_percent: u8) -> Result<(), BookingError> {
    let min = minimum_advance(total, min_percent);
    if advance < min {
        return Err(BookingError::AdvanceTooLow { min });
    }
    if advance > total {
        return Err(BookingError::AdvanceExceedsTotal { advance, total });
    }
    Ok(())
}
