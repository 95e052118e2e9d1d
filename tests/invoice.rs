use chrono::{DateTime, NaiveDate, TimeZone, Utc};
use ground_booking_server::booking::{
    invoice::{bookings_csv, group_thousands, invoice_number, ExportRow, Invoice, InvoiceInput, PaymentEntry},
    payment::BookingAmounts,
    pricing::SlotLine,
    types::{BookingStatus, ExtraCharge, PaymentKind, PaymentMethod, SlotKind},
    BookingError,
};
use uuid::Uuid;

fn booking_id() -> Uuid {
    Uuid::parse_str("6f1c2a9e-1b2c-4d5e-8f90-123456789abc").unwrap()
}

fn created() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2026, 10, 16, 8, 0, 0).unwrap()
}

fn input(status: BookingStatus, remaining: i64) -> InvoiceInput<'static> {
    let mut payments = vec![PaymentEntry {
        kind: PaymentKind::Advance,
        amount: 1000,
        method: PaymentMethod::Upi,
        paid_at: created(),
    }];
    if remaining > 0 {
        payments.push(PaymentEntry {
            kind: PaymentKind::Remaining,
            amount: remaining,
            method: PaymentMethod::Cash,
            paid_at: created(),
        });
    }
    InvoiceInput {
        booking_id: booking_id(),
        created_at: created(),
        booking_date: NaiveDate::from_ymd_opt(2026, 10, 17).unwrap(),
        customer_name: "Ravi Kumar",
        customer_phone: "9876543210",
        customer_email: None,
        ground_name: "Riverside Oval",
        amounts: BookingAmounts {
            status,
            total: 2500,
            advance: 1000,
            remaining_paid: remaining,
            extras_total: 300,
            discount: 100,
        },
        slots: vec![
            SlotLine::new(17, SlotKind::Day, 1000),
            SlotLine::new(18, SlotKind::Night, 1500),
        ],
        extras: vec![ExtraCharge {
            label: "Match balls".into(),
            amount: 300,
        }],
        payments,
        currency: "INR",
    }
}

#[test]
fn invoice_numbers_are_date_and_id_based() {
    assert_eq!(invoice_number(booking_id(), created()), "INV-20261016-6F1C2A9E");
}

#[test]
fn thousands_grouping() {
    assert_eq!(group_thousands(0), "0");
    assert_eq!(group_thousands(999), "999");
    assert_eq!(group_thousands(1000), "1,000");
    assert_eq!(group_thousands(1234567), "1,234,567");
    assert_eq!(group_thousands(-12500), "-12,500");
}

#[test]
fn settled_invoice_totals() {
    let inv = Invoice::build(input(BookingStatus::Completed, 1700), Utc::now()).unwrap();
    assert_eq!(inv.net_payable, 2700);
    assert_eq!(inv.paid, 2700);
    assert_eq!(inv.balance_due, 0);
    assert!(inv.fully_paid);

    let text = inv.render_text();
    assert!(text.starts_with("INVOICE INV-20261016-6F1C2A9E\n"));
    assert!(text.contains("Ground:   Riverside Oval"));
    assert!(text.contains("18:00-19:00 (night)"));
    assert!(text.contains("+ Match balls"));
    assert!(text.contains("INR -100"));
    assert!(text.contains("Paid remaining (cash)"));
    assert!(text.contains("INR 2,700"));
    assert!(text.contains("*** PAID ***"));
    assert!(!text.contains("Email:"));
    for line in text.lines().filter(|l| l.starts_with("Total payable")) {
        assert_eq!(line.chars().count(), 48);
    }
}

#[test]
fn open_invoice_shows_balance() {
    let inv = Invoice::build(input(BookingStatus::Approved, 0), Utc::now()).unwrap();
    assert_eq!(inv.balance_due, 1700);
    assert!(!inv.fully_paid);
    assert!(!inv.render_text().contains("PAID ***"));
}

#[test]
fn cancelled_bookings_have_no_invoice() {
    assert!(matches!(
        Invoice::build(input(BookingStatus::Cancelled, 0), Utc::now()),
        Err(BookingError::NoInvoiceForCancelled)
    ));
}

const HEADER: &str =
    "Booking ID,Date,Slots,Customer,Phone,Status,Total,Advance,Remaining,Extras,Discount,Balance";

#[test]
fn empty_export_still_has_header() {
    let csv = bookings_csv(&[]).unwrap();
    assert_eq!(csv.trim_end(), HEADER);
}

#[test]
fn export_rows_are_quoted_where_needed() {
    let row = ExportRow {
        booking_id: booking_id(),
        date: NaiveDate::from_ymd_opt(2026, 10, 17).unwrap(),
        slots: "17:00-18:00 18:00-19:00".into(),
        customer: "Kumar, Ravi".into(),
        phone: "9876543210".into(),
        status: BookingStatus::Approved,
        total: 2500,
        advance: 1000,
        remaining: 0,
        extras: 0,
        discount: 0,
        balance: 1500,
    };
    let csv = bookings_csv(&[row]).unwrap();
    let mut lines = csv.lines();
    assert_eq!(lines.next(), Some(HEADER));
    assert_eq!(
        lines.next(),
        Some(
            "6f1c2a9e-1b2c-4d5e-8f90-123456789abc,2026-10-17,17:00-18:00 18:00-19:00,\
             \"Kumar, Ravi\",9876543210,approved,2500,1000,0,0,0,1500"
        )
    );
    assert_eq!(lines.next(), None);
}
