use anyhow::{Context, Result};
use chrono::NaiveDate;
use serde::Serialize;
use sqlx::PgPool;

use crate::booking::types::BookingStatus;

#[derive(Debug, Default, Clone, Serialize, PartialEq, Eq)]
pub struct StatusCounts {
    pub pending: i64,
    pub approved: i64,
    pub cancelled: i64,
    pub completed: i64,
}

#[derive(Debug, Default, Clone, Serialize, PartialEq, Eq)]
pub struct DashboardStats {
    pub from: Option<NaiveDate>,
    pub to: Option<NaiveDate>,
    pub counts: StatusCounts,
    pub total_bookings: i64,
    pub advance_collected: i64,
    pub remaining_collected: i64,
    pub extras_total: i64,
    pub discounts_given: i64,
    /// Advance + remaining over non-cancelled bookings.
    pub revenue_collected: i64,
    /// Still to be collected on pending and approved bookings.
    pub outstanding: i64,
}

/// Per-status aggregates as returned by the `GROUP BY` query.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct StatusAggregate {
    pub status: String,
    pub bookings: i64,
    pub total: i64,
    pub advance: i64,
    pub remaining: i64,
    pub extras: i64,
    pub discount: i64,
}

impl DashboardStats {
    /// Fold per-status aggregates into dashboard figures. Cancelled rows
    /// only contribute to the counts.
    pub fn from_aggregates(
        from: Option<NaiveDate>,
        to: Option<NaiveDate>,
        rows: &[StatusAggregate],
    ) -> Self {
        let mut stats = DashboardStats {
            from,
            to,
            ..Default::default()
        };

        for row in rows {
            let Ok(status) = row.status.parse::<BookingStatus>() else {
                log::warn!("ignoring unknown booking status '{}' in stats", row.status);
                continue;
            };
            stats.total_bookings += row.bookings;
            match status {
                BookingStatus::Pending => stats.counts.pending += row.bookings,
                BookingStatus::Approved => stats.counts.approved += row.bookings,
                BookingStatus::Cancelled => stats.counts.cancelled += row.bookings,
                BookingStatus::Completed => stats.counts.completed += row.bookings,
            }
            if status == BookingStatus::Cancelled {
                continue;
            }

            stats.advance_collected += row.advance;
            stats.remaining_collected += row.remaining;
            stats.extras_total += row.extras;
            stats.discounts_given += row.discount;
            if !status.is_terminal() {
                stats.outstanding += row.total - row.advance;
            }
        }
        stats.revenue_collected = stats.advance_collected + stats.remaining_collected;
        stats
    }
}

pub async fn dashboard(
    db: &PgPool,
    from: Option<NaiveDate>,
    to: Option<NaiveDate>,
) -> Result<DashboardStats> {
    let rows = sqlx::query_as::<_, StatusAggregate>(
        r#"
        SELECT status,
               COUNT(*)::BIGINT                           AS bookings,
               COALESCE(SUM(total_amount), 0)::BIGINT     AS total,
               COALESCE(SUM(advance_amount), 0)::BIGINT   AS advance,
               COALESCE(SUM(remaining_amount), 0)::BIGINT AS remaining,
               COALESCE(SUM(extras_total), 0)::BIGINT     AS extras,
               COALESCE(SUM(discount_amount), 0)::BIGINT  AS discount
          FROM bookings
         WHERE ($1::DATE IS NULL OR booking_date >= $1)
           AND ($2::DATE IS NULL OR booking_date <= $2)
         GROUP BY status
        "#,
    )
    .bind(from)
    .bind(to)
    .fetch_all(db)
    .await
    .context("aggregating booking stats")?;

    Ok(DashboardStats::from_aggregates(from, to, &rows))
}
