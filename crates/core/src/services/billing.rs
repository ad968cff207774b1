//! Billing period arithmetic.
//!
//! Periods are anchored at the adoption's `started_at`: period `k` starts at
//! `started_at + k * period`. Monthly periods are computed from the anchor
//! each time (never chained), so a start on the 31st lands on the last day
//! of shorter months and returns to the 31st afterwards.

use chrono::{DateTime, Datelike, Duration, Months, Utc};
use emr_common::BillingPeriod;
use emr_db::entities::donation;
use serde::Serialize;

/// Result of one `advance_billing_cycle` call.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "outcome", content = "donation", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum BillingOutcome {
    /// A donation was created for the current period.
    Created(donation::Model),
    /// The current period already has a donation.
    NotDue,
    /// A concurrent call created the donation first.
    AlreadyBilled,
    /// The adoption is no longer active.
    Inactive,
}

/// Start of period `k` for an adoption anchored at `anchor`.
#[must_use]
pub fn period_start(anchor: DateTime<Utc>, period: BillingPeriod, k: u32) -> Option<DateTime<Utc>> {
    match period {
        BillingPeriod::Weekly => anchor.checked_add_signed(Duration::weeks(i64::from(k))),
        BillingPeriod::Monthly => anchor.checked_add_months(Months::new(k)),
    }
}

/// Start of the latest period that has begun at `now`.
///
/// Returns `anchor` when `now` precedes it.
#[must_use]
pub fn current_period_start(
    anchor: DateTime<Utc>,
    period: BillingPeriod,
    now: DateTime<Utc>,
) -> DateTime<Utc> {
    if now <= anchor {
        return anchor;
    }

    let estimate = match period {
        BillingPeriod::Weekly => (now - anchor).num_weeks(),
        BillingPeriod::Monthly => {
            let months = |d: DateTime<Utc>| i64::from(d.year()) * 12 + i64::from(d.month0());
            months(now) - months(anchor)
        }
    };

    // The calendar estimate can overshoot by one when `now` falls earlier in
    // its month than the anchor does.
    let mut k = u32::try_from(estimate.max(0)).unwrap_or(u32::MAX);
    loop {
        match period_start(anchor, period, k) {
            Some(start) if start <= now => return start,
            _ if k == 0 => return anchor,
            _ => k -= 1,
        }
    }
}
