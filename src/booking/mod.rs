//! Booking workflow: pure rules that the repositories and handlers apply.

pub mod invoice;
pub mod payment;
pub mod pricing;
pub mod types;
pub mod validation;

use thiserror::Error;
use types::BookingStatus;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum BookingError {
    #[error("at least one slot is required")]
    NoSlots,
    #[error("at most {max} slots may be booked at once")]
    TooManySlots { max: usize },
    #[error("slot hour {0} is outside 0-23")]
    SlotOutOfRange(i64),
    #[error("slot hour {0} was requested twice")]
    DuplicateSlot(u8),
    #[error("booking date is in the past")]
    PastDate,
    #[error("slot {0}:00 has already started")]
    SlotStarted(u8),
    #[error("invalid customer details: {0}")]
    InvalidContact(&'static str),
    #[error("payment proof must be an http(s) URL")]
    InvalidProofUrl,
    #[error("advance must be at least {min}")]
    AdvanceTooLow { min: i64 },
    #[error("advance {advance} exceeds booking total {total}")]
    AdvanceExceedsTotal { advance: i64, total: i64 },
    #[error("cannot move booking from {from} to {to}")]
    InvalidTransition {
        from: BookingStatus,
        to: BookingStatus,
    },
    #[error("remaining payment already recorded for this booking")]
    AlreadyCompleted,
    #[error("booking is {0}; only approved bookings can be settled")]
    NotApproved(BookingStatus),
    #[error("invalid extra charge: {0}")]
    InvalidExtraCharge(String),
    #[error("discount cannot be negative")]
    NegativeDiscount,
    #[error("discount {discount} exceeds the outstanding {outstanding}")]
    DiscountTooLarge { discount: i64, outstanding: i64 },
    #[error("amount received {received} does not match amount due {expected}")]
    AmountMismatch { expected: i64, received: i64 },
    #[error("cancelled bookings have no invoice")]
    NoInvoiceForCancelled,
    #[error("amount exceeds the maximum of {max}")]
    AmountTooLarge { max: i64 },
    #[error("amounts are too large to total")]
    AmountOverflow,
}
