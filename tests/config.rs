use ground_booking_server::config::Settings;
use std::collections::HashMap;

fn from(pairs: &[(&str, &str)]) -> Settings {
    let map: HashMap<String, String> = pairs
        .iter()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect();
    Settings::from_lookup(|k| map.get(k).cloned())
}

#[test]
fn defaults() {
    let s = Settings::default();
    assert_eq!(s.night_start_hour, 18);
    assert_eq!(s.night_end_hour, 6);
    assert_eq!(s.min_advance_percent, 25);
    assert_eq!(s.pending_hold_minutes, 30);
    assert_eq!(s.utc_offset_minutes, 330);
    assert_eq!(s.currency, "INR");
    assert_eq!(s.max_slots_per_booking, 12);
    assert!(s.admin_emails.is_empty());
}

#[test]
fn overrides_are_parsed() {
    let s = from(&[
        ("NIGHT_START_HOUR", "19"),
        ("MIN_ADVANCE_PERCENT", " 50 "),
        ("CURRENCY", "usd"),
        ("PUBLIC_BASE_URL", "https://book.example.com/"),
        ("ADMIN_EMAILS", "Owner@Example.com, ,desk@example.com"),
        ("AVAILABILITY_CACHE_SECS", "0"),
    ]);
    assert_eq!(s.night_start_hour, 19);
    assert_eq!(s.min_advance_percent, 50);
    assert_eq!(s.currency, "USD");
    assert_eq!(s.public_base_url, "https://book.example.com");
    assert_eq!(s.admin_emails, vec!["owner@example.com", "desk@example.com"]);
    assert_eq!(s.availability_cache_secs, 0);
    assert!(s.is_admin_email(" OWNER@example.com"));
    assert!(!s.is_admin_email("someone@example.com"));
}

#[test]
fn out_of_range_values_fall_back() {
    let s = from(&[
        ("NIGHT_END_HOUR", "24"),
        ("MIN_ADVANCE_PERCENT", "120"),
        ("UTC_OFFSET_MINUTES", "900"),
        ("MAX_SLOTS_PER_BOOKING", "0"),
        ("PENDING_HOLD_MINUTES", "soon"),
    ]);
    assert_eq!(s.night_end_hour, 6);
    assert_eq!(s.min_advance_percent, 25);
    assert_eq!(s.utc_offset_minutes, 330);
    assert_eq!(s.max_slots_per_booking, 12);
    assert_eq!(s.pending_hold_minutes, 30);
}
