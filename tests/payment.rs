use ground_booking_server::booking::{
    payment::{reconcile_completion, BookingAmounts, CompletionRequest, PaymentBadge, PaymentBreakdown},
    pricing::MAX_AMOUNT,
    types::{BookingStatus, ExtraCharge, PaymentMethod},
    BookingError,
};

fn request(received: i64, extras: Vec<(&str, i64)>, discount: i64) -> CompletionRequest {
    CompletionRequest {
        amount_received: received,
        method: PaymentMethod::Cash,
        extra_charges: extras
            .into_iter()
            .map(|(label, amount)| ExtraCharge {
                label: label.to_string(),
                amount,
            })
            .collect(),
        discount,
        notes: None,
    }
}

#[test]
fn balance_with_extras_and_discount() {
    // 4000 slots, 1000 advance, +300 balls +200 lights, -500 discount
    let req = request(3000, vec![(" Balls ", 300), ("Floodlights", 200)], 500);
    let s = reconcile_completion(BookingStatus::Approved, 4000, 1000, &req).unwrap();

    assert_eq!(s.extras_total, 500);
    assert_eq!(s.gross, 4500);
    assert_eq!(s.amount_due, 3000);
    assert_eq!(s.extra_charges[0].label, "Balls");
}

#[test]
fn amount_must_match_exactly() {
    let req = request(2999, vec![], 0);
    assert_eq!(
        reconcile_completion(BookingStatus::Approved, 4000, 1000, &req),
        Err(BookingError::AmountMismatch {
            expected: 3000,
            received: 2999
        })
    );
}

#[test]
fn fully_prepaid_booking_settles_with_zero() {
    let req = request(0, vec![], 0);
    let s = reconcile_completion(BookingStatus::Approved, 2000, 2000, &req).unwrap();
    assert_eq!(s.amount_due, 0);
}

#[test]
fn only_approved_bookings_can_be_completed() {
    let req = request(3000, vec![], 0);
    assert_eq!(
        reconcile_completion(BookingStatus::Completed, 4000, 1000, &req),
        Err(BookingError::AlreadyCompleted)
    );
    assert_eq!(
        reconcile_completion(BookingStatus::Pending, 4000, 1000, &req),
        Err(BookingError::NotApproved(BookingStatus::Pending))
    );
    assert_eq!(
        reconcile_completion(BookingStatus::Cancelled, 4000, 1000, &req),
        Err(BookingError::NotApproved(BookingStatus::Cancelled))
    );
}

#[test]
fn bad_extras_and_discounts() {
    let long_label = "x".repeat(61);
    let bad = [
        request(3000, vec![("", 100)], 0),
        request(3000, vec![("Water", 0)], 0),
        request(3000, vec![("Water", -50)], 0),
        request(3000, vec![(long_label.as_str(), 10)], 0),
    ];
    for req in &bad {
        assert!(matches!(
            reconcile_completion(BookingStatus::Approved, 4000, 1000, req),
            Err(BookingError::InvalidExtraCharge(_))
        ));
    }

    let many: Vec<(&str, i64)> = (0..21).map(|_| ("Ball", 10)).collect();
    assert!(matches!(
        reconcile_completion(BookingStatus::Approved, 4000, 1000, &request(3210, many, 0)),
        Err(BookingError::InvalidExtraCharge(_))
    ));

    assert_eq!(
        reconcile_completion(BookingStatus::Approved, 4000, 1000, &request(3000, vec![], -1)),
        Err(BookingError::NegativeDiscount)
    );
    assert_eq!(
        reconcile_completion(BookingStatus::Approved, 4000, 1000, &request(0, vec![], 3001)),
        Err(BookingError::DiscountTooLarge {
            discount: 3001,
            outstanding: 3000
        })
    );
}

#[test]
fn oversized_extra_charges_are_rejected() {
    let req = request(0, vec![("Stands", i64::MAX), ("Balls", 1)], 0);
    assert_eq!(
        reconcile_completion(BookingStatus::Approved, 4000, 1000, &req),
        Err(BookingError::AmountTooLarge { max: MAX_AMOUNT })
    );

    let at_cap = request(MAX_AMOUNT + 3000, vec![("Stands", MAX_AMOUNT)], 0);
    let s = reconcile_completion(BookingStatus::Approved, 4000, 1000, &at_cap).unwrap();
    assert_eq!(s.amount_due, MAX_AMOUNT + 3000);
}

#[test]
fn totals_past_the_integer_range_are_rejected() {
    let req = request(0, vec![("Balls", 10)], 0);
    assert_eq!(
        reconcile_completion(BookingStatus::Approved, i64::MAX, 0, &req),
        Err(BookingError::AmountOverflow)
    );
}

#[test]
fn breakdown_saturates_instead_of_wrapping() {
    let b = PaymentBreakdown::compute(BookingAmounts {
        status: BookingStatus::Approved,
        total: i64::MAX,
        advance: 0,
        remaining_paid: 0,
        extras_total: 500,
        discount: 0,
    });
    assert_eq!(b.net_payable, i64::MAX);
    assert_eq!(b.balance_due, i64::MAX);
}

fn amounts(status: BookingStatus, advance: i64, remaining: i64) -> BookingAmounts {
    BookingAmounts {
        status,
        total: 4000,
        advance,
        remaining_paid: remaining,
        extras_total: 0,
        discount: 0,
    }
}

#[test]
fn badges_by_state() {
    let b = PaymentBreakdown::compute(amounts(BookingStatus::Pending, 0, 0));
    assert_eq!(b.badge, PaymentBadge::Unpaid);
    assert_eq!(b.badge_color, "red");
    assert_eq!(b.balance_due, 4000);

    let b = PaymentBreakdown::compute(amounts(BookingStatus::Approved, 1000, 0));
    assert_eq!(b.badge, PaymentBadge::AdvancePaid);
    assert_eq!(b.balance_due, 3000);

    let b = PaymentBreakdown::compute(amounts(BookingStatus::Completed, 1000, 3000));
    assert_eq!(b.badge, PaymentBadge::Settled);
    assert_eq!(b.badge_label, "Fully paid");
    assert_eq!(b.balance_due, 0);

    let b = PaymentBreakdown::compute(amounts(BookingStatus::Cancelled, 1000, 0));
    assert_eq!(b.badge, PaymentBadge::Cancelled);
    assert_eq!(b.badge_color, "gray");
}

#[test]
fn breakdown_highlights_adjustments() {
    let b = PaymentBreakdown::compute(BookingAmounts {
        status: BookingStatus::Completed,
        total: 4000,
        advance: 1000,
        remaining_paid: 3000,
        extras_total: 500,
        discount: 500,
    });
    assert_eq!(b.net_payable, 4000);
    assert_eq!(b.paid, 4000);

    let extras = b.lines.iter().find(|l| l.label == "Extra charges").unwrap();
    assert!(extras.highlight);
    let discount = b.lines.iter().find(|l| l.label == "Discount").unwrap();
    assert_eq!(discount.amount, -500);
    assert!(discount.highlight);

    let plain = PaymentBreakdown::compute(amounts(BookingStatus::Approved, 1000, 0));
    assert!(plain.lines.iter().all(|l| !l.highlight));
}
