use chrono::NaiveDate;
use ground_booking_server::db::report_repo::{DashboardStats, StatusAggregate};

fn agg(status: &str, bookings: i64, total: i64, advance: i64, remaining: i64) -> StatusAggregate {
    StatusAggregate {
        status: status.into(),
        bookings,
        total,
        advance,
        remaining,
        extras: 0,
        discount: 0,
    }
}

#[test]
fn folds_status_groups_into_dashboard_figures() {
    let from = NaiveDate::from_ymd_opt(2026, 10, 1);
    let rows = vec![
        agg("pending", 2, 6000, 1500, 0),
        agg("approved", 3, 9000, 3000, 0),
        StatusAggregate {
            extras: 400,
            discount: 200,
            ..agg("completed", 4, 12000, 3000, 9200)
        },
        agg("cancelled", 1, 3000, 750, 0),
    ];
    let s = DashboardStats::from_aggregates(from, None, &rows);

    assert_eq!(s.from, from);
    assert_eq!(s.total_bookings, 10);
    assert_eq!(s.counts.pending, 2);
    assert_eq!(s.counts.approved, 3);
    assert_eq!(s.counts.completed, 4);
    assert_eq!(s.counts.cancelled, 1);
    // cancelled advance is excluded from collections
    assert_eq!(s.advance_collected, 7500);
    assert_eq!(s.remaining_collected, 9200);
    assert_eq!(s.revenue_collected, 16700);
    assert_eq!(s.extras_total, 400);
    assert_eq!(s.discounts_given, 200);
    assert_eq!(s.outstanding, (6000 - 1500) + (9000 - 3000));
}

#[test]
fn unknown_statuses_are_skipped() {
    let s = DashboardStats::from_aggregates(None, None, &[agg("archived", 5, 100, 10, 0)]);
    assert_eq!(s, DashboardStats::default());
}
