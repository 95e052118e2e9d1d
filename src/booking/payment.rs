//! Remaining-payment settlement and the admin payment breakdown.
//!
//! A booking is paid in two parts: the advance taken with the booking form
//! and the remaining balance collected at the ground. Extra charges and a
//! discount are only applied when that balance is settled, so
//! `reconcile_completion` is the single place the final figure is computed.

use serde::{Deserialize, Serialize};

use super::pricing::MAX_AMOUNT;
use super::types::{BookingStatus, ExtraCharge, PaymentMethod};
use super::BookingError;

pub const MAX_EXTRA_CHARGES: usize = 20;
pub const MAX_EXTRA_LABEL: usize = 60;

#[derive(Debug, Deserialize, Clone)]
pub struct CompletionRequest {
    pub amount_received: i64,
    pub method: PaymentMethod,
    #[serde(default)]
    pub extra_charges: Vec<ExtraCharge>,
    #[serde(default)]
    pub discount: i64,
    #[serde(default)]
    pub notes: Option<String>,
}

#[derive(Debug, Serialize, Clone, PartialEq, Eq)]
pub struct Settlement {
    /// Extras with trimmed labels, in request order.
    pub extra_charges: Vec<ExtraCharge>,
    pub extras_total: i64,
    pub discount: i64,
    /// Slot total plus extras.
    pub gross: i64,
    pub amount_due: i64,
    pub amount_received: i64,
}

/// Validates a remaining-payment request against the booking's current
/// state and amounts.
pub fn reconcile_completion(
    status: BookingStatus,
    total: i64,
    advance: i64,
    req: &CompletionRequest,
) -> Result<Settlement, BookingError> {
    match status {
        BookingStatus::Approved => {}
        BookingStatus::Completed => return Err(BookingError::AlreadyCompleted),
        other => return Err(BookingError::NotApproved(other)),
    }

    if req.extra_charges.len() > MAX_EXTRA_CHARGES {
        return Err(BookingError::InvalidExtraCharge(format!(
            "at most {MAX_EXTRA_CHARGES} extra charges"
        )));
    }
    let mut extras = Vec::with_capacity(req.extra_charges.len());
    for charge in &req.extra_charges {
        let label = charge.label.trim();
        if label.is_empty() || label.chars().count() > MAX_EXTRA_LABEL {
            return Err(BookingError::InvalidExtraCharge(format!(
                "label must be 1-{MAX_EXTRA_LABEL} characters"
            )));
        }
        if charge.amount <= 0 {
            return Err(BookingError::InvalidExtraCharge(format!(
                "'{label}' must have a positive amount"
            )));
        }
        if charge.amount > MAX_AMOUNT {
            return Err(BookingError::AmountTooLarge { max: MAX_AMOUNT });
        }
        extras.push(ExtraCharge {
            label: label.to_string(),
            amount: charge.amount,
        });
    }
    let extras_total = extras
        .iter()
        .try_fold(0i64, |acc, c| acc.checked_add(c.amount))
        .ok_or(BookingError::AmountOverflow)?;

    if req.discount < 0 {
        return Err(BookingError::NegativeDiscount);
    }
    let gross = total
        .checked_add(extras_total)
        .ok_or(BookingError::AmountOverflow)?;
    let outstanding = gross
        .checked_sub(advance)
        .ok_or(BookingError::AmountOverflow)?;
    if req.discount > outstanding {
        return Err(BookingError::DiscountTooLarge {
            discount: req.discount,
            outstanding,
        });
    }

    let amount_due = outstanding - req.discount;
    if req.amount_received != amount_due {
        return Err(BookingError::AmountMismatch {
            expected: amount_due,
            received: req.amount_received,
        });
    }

    Ok(Settlement {
        extra_charges: extras,
        extras_total,
        discount: req.discount,
        gross,
        amount_due,
        amount_received: req.amount_received,
    })
}

/// Money columns of one booking.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BookingAmounts {
    pub status: BookingStatus,
    pub total: i64,
    pub advance: i64,
    pub remaining_paid: i64,
    pub extras_total: i64,
    pub discount: i64,
}

#[derive(Debug, Serialize, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum PaymentBadge {
    Settled,
    AdvancePaid,
    Unpaid,
    Cancelled,
}

impl PaymentBadge {
    pub fn color(self) -> &'static str {
        match self {
            PaymentBadge::Settled => "green",
            PaymentBadge::AdvancePaid => "amber",
            PaymentBadge::Unpaid => "red",
            PaymentBadge::Cancelled => "gray",
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            PaymentBadge::Settled => "Fully paid",
            PaymentBadge::AdvancePaid => "Advance paid",
            PaymentBadge::Unpaid => "Unpaid",
            PaymentBadge::Cancelled => "Cancelled",
        }
    }
}

#[derive(Debug, Serialize, Clone, PartialEq, Eq)]
pub struct BreakdownLine {
    pub label: &'static str,
    pub amount: i64,
    /// Rendered emphasised (non-zero extras / discount).
    pub highlight: bool,
}

#[derive(Debug, Serialize, Clone, PartialEq, Eq)]
pub struct PaymentBreakdown {
    pub lines: Vec<BreakdownLine>,
    pub net_payable: i64,
    pub paid: i64,
    pub balance_due: i64,
    pub badge: PaymentBadge,
    pub badge_color: &'static str,
    pub badge_label: &'static str,
}

impl PaymentBreakdown {
    pub fn compute(a: BookingAmounts) -> Self {
        let net_payable = a.total.saturating_add(a.extras_total).saturating_sub(a.discount);
        let paid = a.advance.saturating_add(a.remaining_paid);
        let balance_due = net_payable.saturating_sub(paid).max(0);

        let badge = if a.status == BookingStatus::Cancelled {
            PaymentBadge::Cancelled
        } else if a.status == BookingStatus::Completed && balance_due == 0 {
            PaymentBadge::Settled
        } else if paid > 0 {
            PaymentBadge::AdvancePaid
        } else {
            PaymentBadge::Unpaid
        };

        let lines = vec![
            BreakdownLine {
                label: "Slot charges",
                amount: a.total,
                highlight: false,
            },
            BreakdownLine {
                label: "Extra charges",
                amount: a.extras_total,
                highlight: a.extras_total != 0,
            },
            BreakdownLine {
                label: "Discount",
                amount: -a.discount,
                highlight: a.discount != 0,
            },
            BreakdownLine {
                label: "Advance paid",
                amount: a.advance,
                highlight: false,
            },
            BreakdownLine {
                label: "Remaining paid",
                amount: a.remaining_paid,
                highlight: false,
            },
        ];

        PaymentBreakdown {
            lines,
            net_payable,
            paid,
            balance_due,
            badge,
            badge_color: badge.color(),
            badge_label: badge.label(),
        }
    }
}
