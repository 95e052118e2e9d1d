use chrono::{NaiveDate, NaiveDateTime};
use ground_booking_server::booking::{
    types::PaymentMethod,
    validation::{validate_advance, validate_contact, validate_new_booking, NewBooking},
    BookingError,
};
use uuid::Uuid;

fn now() -> NaiveDateTime {
    NaiveDateTime::parse_from_str("2026-10-16 14:20", "%Y-%m-%d %H:%M").unwrap()
}

fn form(date: NaiveDate, hours: Vec<i64>) -> NewBooking {
    NewBooking {
        ground_id: Uuid::new_v4(),
        booking_date: date,
        slot_hours: hours,
        customer_name: "Ravi Kumar".into(),
        customer_phone: "+91 98765-43210".into(),
        customer_email: Some("ravi@example.com".into()),
        advance_amount: 500,
        advance_method: PaymentMethod::Upi,
        payment_proof_url: None,
        notes: None,
    }
}

fn tomorrow() -> NaiveDate {
    NaiveDate::from_ymd_opt(2026, 10, 17).unwrap()
}

#[test]
fn accepts_a_valid_form_and_sorts_hours() {
    let hours = validate_new_booking(&form(tomorrow(), vec![20, 18, 19]), now(), 12).unwrap();
    assert_eq!(hours, vec![18, 19, 20]);
}

#[test]
fn slot_list_shape_is_checked_first() {
    assert_eq!(
        validate_new_booking(&form(tomorrow(), vec![]), now(), 12),
        Err(BookingError::NoSlots)
    );
    assert_eq!(
        validate_new_booking(&form(tomorrow(), (0..13).collect()), now(), 12),
        Err(BookingError::TooManySlots { max: 12 })
    );
    assert_eq!(
        validate_new_booking(&form(tomorrow(), vec![10, 24]), now(), 12),
        Err(BookingError::SlotOutOfRange(24))
    );
    assert_eq!(
        validate_new_booking(&form(tomorrow(), vec![-1]), now(), 12),
        Err(BookingError::SlotOutOfRange(-1))
    );
    assert_eq!(
        validate_new_booking(&form(tomorrow(), vec![9, 10, 9]), now(), 12),
        Err(BookingError::DuplicateSlot(9))
    );
}

#[test]
fn past_dates_and_started_hours_are_rejected() {
    let today = now().date();
    let yesterday = NaiveDate::from_ymd_opt(2026, 10, 15).unwrap();

    assert_eq!(
        validate_new_booking(&form(yesterday, vec![20]), now(), 12),
        Err(BookingError::PastDate)
    );
    // 14:20 local: the 14:00 slot is already running
    assert_eq!(
        validate_new_booking(&form(today, vec![16, 14]), now(), 12),
        Err(BookingError::SlotStarted(14))
    );
    assert_eq!(
        validate_new_booking(&form(today, vec![15, 16]), now(), 12),
        Ok(vec![15, 16])
    );
}

#[test]
fn proof_url_must_be_http() {
    let mut f = form(tomorrow(), vec![10]);
    f.payment_proof_url = Some("ftp://files.example.com/receipt.png".into());
    assert_eq!(
        validate_new_booking(&f, now(), 12),
        Err(BookingError::InvalidProofUrl)
    );

    f.payment_proof_url = Some("https://cdn.example.com/receipt.png".into());
    assert!(validate_new_booking(&f, now(), 12).is_ok());
}

#[test]
fn contact_rules() {
    assert!(validate_contact("Asha", "9876543", None).is_ok());
    assert!(validate_contact("Asha", "9876543", Some("")).is_ok());
    assert!(validate_contact("   ", "9876543210", None).is_err());
    assert!(validate_contact(&"x".repeat(101), "9876543210", None).is_err());
    assert!(validate_contact("Asha", "98765", None).is_err());
    assert!(validate_contact("Asha", "98765abc43", None).is_err());
    assert!(validate_contact("Asha", "9876543210", Some("asha.example.com")).is_err());
    assert!(validate_contact("Asha", "9876543210", Some("a@b@c")).is_err());
}

#[test]
fn advance_bounds() {
    assert_eq!(
        validate_advance(1000, 5000, 25),
        Err(BookingError::AdvanceTooLow { min: 1250 })
    );
    assert_eq!(validate_advance(1250, 5000, 25), Ok(()));
    assert_eq!(validate_advance(5000, 5000, 25), Ok(()));
    assert_eq!(
        validate_advance(5001, 5000, 25),
        Err(BookingError::AdvanceExceedsTotal {
            advance: 5001,
            total: 5000
        })
    );
    assert_eq!(validate_advance(0, 5000, 0), Ok(()));
}

#[test]
fn negative_advance_is_rejected_even_without_a_minimum() {
    assert_eq!(
        validate_advance(-1, 5000, 0),
        Err(BookingError::AdvanceTooLow { min: 0 })
    );
    assert_eq!(
        validate_advance(-1, 0, 25),
        Err(BookingError::AdvanceTooLow { min: 0 })
    );
}

#[test]
fn advance_check_holds_for_large_totals() {
    let total = i64::MAX / 10;
    assert_eq!(
        validate_advance(1, total, 25),
        Err(BookingError::AdvanceTooLow {
            min: 230_584_300_921_369_395
        })
    );
    assert_eq!(validate_advance(total, total, 25), Ok(()));
}
