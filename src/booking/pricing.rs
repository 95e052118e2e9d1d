//! Day/night slot classification and booking quotes.

use chrono::{NaiveDate, NaiveDateTime, Timelike};
use serde::Serialize;

use super::types::{Rates, SlotKind};
use super::BookingError;

/// Upper bound for a single rate or charge, in whole currency units.
pub const MAX_AMOUNT: i64 = 100_000_000;

/// Night window `[start, end)`; wraps midnight when `start > end`,
/// empty when equal.
pub fn slot_kind(hour: u8, night_start: u8, night_end: u8) -> SlotKind {
    let night = if night_start > night_end {
        hour >= night_start || hour < night_end
    } else {
        hour >= night_start && hour < night_end
    };
    if night {
        SlotKind::Night
    } else {
        SlotKind::Day
    }
}

/// `"18:00-19:00"`
pub fn slot_label(hour: u8) -> String {
    format!("{:02}:00-{:02}:00", hour, hour + 1)
}

#[derive(Debug, Serialize, Clone, PartialEq, Eq)]
pub struct SlotLine {
    pub hour: u8,
    pub label: String,
    pub kind: SlotKind,
    pub rate: i64,
}

impl SlotLine {
    pub fn new(hour: u8, kind: SlotKind, rate: i64) -> Self {
        SlotLine {
            hour,
            label: slot_label(hour),
            kind,
            rate,
        }
    }
}

#[derive(Debug, Serialize, Clone, PartialEq, Eq)]
pub struct Quote {
    pub lines: Vec<SlotLine>,
    pub day_slots: usize,
    pub night_slots: usize,
    pub total: i64,
}

/// Price every requested hour at the ground's rate for its band.
pub fn quote(
    rates: Rates,
    hours: &[u8],
    night_start: u8,
    night_end: u8,
) -> Result<Quote, BookingError> {
    let mut sorted = hours.to_vec();
    sorted.sort_unstable();

    let lines: Vec<SlotLine> = sorted
        .into_iter()
        .map(|h| {
            let kind = slot_kind(h, night_start, night_end);
            let rate = match kind {
                SlotKind::Day => rates.day,
                SlotKind::Night => rates.night,
            };
            SlotLine::new(h, kind, rate)
        })
        .collect();

    let total = lines
        .iter()
        .try_fold(0i64, |acc, l| acc.checked_add(l.rate))
        .ok_or(BookingError::AmountOverflow)?;

    let night_slots = lines.iter().filter(|l| l.kind == SlotKind::Night).count();
    Ok(Quote {
        day_slots: lines.len() - night_slots,
        night_slots,
        total,
        lines,
    })
}

/// One hour of a ground's day as shown on the booking calendar.
#[derive(Debug, Serialize, Clone, PartialEq, Eq)]
pub struct SlotView {
    pub hour: u8,
    pub label: String,
    pub kind: SlotKind,
    pub rate: i64,
    pub booked: bool,
    pub available: bool,
}

/// All 24 hours of `date`. An hour is unavailable when it is booked or,
/// for today, has already started; past dates are entirely unavailable.
pub fn day_schedule(
    rates: Rates,
    booked: &[u8],
    date: NaiveDate,
    now_local: NaiveDateTime,
    night_start: u8,
    night_end: u8,
) -> Vec<SlotView> {
    let today = now_local.date();
    let current_hour = now_local.hour() as u8;

    (0u8..24)
        .map(|hour| {
            let kind = slot_kind(hour, night_start, night_end);
            let rate = match kind {
                SlotKind::Day => rates.day,
                SlotKind::Night => rates.night,
            };
            let is_booked = booked.contains(&hour);
            let started = date < today || (date == today && hour <= current_hour);
            SlotView {
                hour,
                label: slot_label(hour),
                kind,
                rate,
                booked: is_booked,
                available: !is_booked && !started,
            }
        })
        .collect()
}

/// ceil(total * percent / 100)
pub fn minimum_advance(total: i64, percent: u8) -> i64 {
    if total <= 0 {
        return 0;
    }
    let scaled = total as i128 * percent.min(100) as i128;
    ((scaled + 99) / 100) as i64
}
