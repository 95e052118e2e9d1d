use chrono::{NaiveDate, TimeZone, Utc};
use ground_booking_server::{
    booking::types::BookingStatus,
    events::{availability_generation_key, availability_key, BookingEvent},
};
use uuid::Uuid;

#[test]
fn events_are_tagged_json() {
    let id = Uuid::new_v4();
    let evt = BookingEvent::StatusChanged {
        booking_id: id,
        from: BookingStatus::Pending,
        to: BookingStatus::Approved,
        ts: Utc.with_ymd_and_hms(2026, 10, 16, 9, 0, 0).unwrap(),
    };
    let v = serde_json::to_value(&evt).unwrap();
    assert_eq!(v["type"], "StatusChanged");
    assert_eq!(v["from"], "pending");
    assert_eq!(v["to"], "approved");
    assert_eq!(v["booking_id"], id.to_string());

    let back: BookingEvent = serde_json::from_value(v).unwrap();
    assert_eq!(back, evt);
}

#[test]
fn availability_keys_are_per_ground_day_and_generation() {
    let g = Uuid::parse_str("00000000-0000-0000-0000-000000000001").unwrap();
    let d = NaiveDate::from_ymd_opt(2026, 10, 17).unwrap();
    assert_eq!(
        availability_key(g, d, 0),
        "availability:00000000-0000-0000-0000-000000000001:2026-10-17:v0"
    );
    assert_eq!(
        availability_generation_key(g, d),
        "availability_gen:00000000-0000-0000-0000-000000000001:2026-10-17"
    );
}

#[test]
fn a_bumped_generation_never_reads_an_older_snapshot() {
    let g = Uuid::new_v4();
    let d = NaiveDate::from_ymd_opt(2026, 10, 17).unwrap();
    // a snapshot written after invalidation under the old generation
    let stale = availability_key(g, d, 3);
    assert_ne!(availability_key(g, d, 4), stale);
    assert_ne!(availability_generation_key(g, d), stale);
}
