//! Billing math for parking sessions.
//!
//! Cost is hourly price times billable duration, where duration is
//! clamped to a one-hour floor: the minimum charge is deliberate billing
//! policy, not rounding. All timestamps are UTC.

use chrono::{DateTime, Utc};

use super::{Reservation, UsageLogEntry, AUTO_RELEASE_REMARKS};

/// Minimum billable duration in hours. A session of exactly one hour
/// bills exactly 1.0h; shorter sessions are billed as one hour.
pub const MIN_BILLABLE_HOURS: f64 = 1.0;

/// Billable duration in hours between entry and exit, floored at
/// [`MIN_BILLABLE_HOURS`].
pub fn billable_hours(entered_at: DateTime<Utc>, exited_at: DateTime<Utc>) -> f64 {
    let elapsed = (exited_at - entered_at).num_seconds().max(0) as f64 / 3600.0;
    elapsed.max(MIN_BILLABLE_HOURS)
}

/// Compute (billable hours, cost) for a session at the given hourly
/// price. Cost is rounded to cents.
pub fn session_cost(
    entered_at: DateTime<Utc>,
    exited_at: DateTime<Utc>,
    hourly_price: f64,
) -> (f64, f64) {
    let hours = billable_hours(entered_at, exited_at);
    let cost = (hours * hourly_price * 100.0).round() / 100.0;
    (hours, cost)
}

/// Close a reservation and produce its usage-log entry.
///
/// Pure accounting step of the release path: the caller persists the
/// returned pair together with the spot reset as one atomic unit.
pub fn close_reservation(
    mut reservation: Reservation,
    lot_id: i64,
    vehicle_id: &str,
    entered_at: DateTime<Utc>,
    exited_at: DateTime<Utc>,
    hourly_price: f64,
) -> (Reservation, UsageLogEntry) {
    let (duration_hours, cost) = session_cost(entered_at, exited_at, hourly_price);
    reservation.close(exited_at, cost);

    let entry = UsageLogEntry {
        id: 0,
        user_id: reservation.user_id.clone(),
        spot_id: reservation.spot_id,
        lot_id,
        vehicle_id: vehicle_id.to_string(),
        entered_at,
        exited_at,
        duration_hours,
        cost,
        remarks: AUTO_RELEASE_REMARKS.to_string(),
    };

    (reservation, entry)
}

// ── Tests ──────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn at(h: u32, m: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 6, 1, h, m, 0).unwrap()
    }

    #[test]
    fn short_session_is_floored_to_one_hour() {
        // entry 10:00, exit 10:30, $10/h -> 1.0h, $10.00
        let (hours, cost) = session_cost(at(10, 0), at(10, 30), 10.0);
        assert_eq!(hours, 1.0);
        assert_eq!(cost, 10.0);
    }

    #[test]
    fn long_session_bills_elapsed_time() {
        // entry 10:00, exit 13:15, $4/h -> 3.25h, $13.00
        let (hours, cost) = session_cost(at(10, 0), at(13, 15), 4.0);
        assert_eq!(hours, 3.25);
        assert_eq!(cost, 13.0);
    }

    #[test]
    fn exactly_one_hour_is_not_inflated() {
        let (hours, cost) = session_cost(at(10, 0), at(11, 0), 8.0);
        assert_eq!(hours, 1.0);
        assert_eq!(cost, 8.0);
    }

    #[test]
    fn exit_before_entry_clamps_to_floor() {
        let hours = billable_hours(at(12, 0), at(11, 0));
        assert_eq!(hours, MIN_BILLABLE_HOURS);
    }

    #[test]
    fn cost_is_rounded_to_cents() {
        // 1h20m at $2.50/h -> 1.333..h * 2.5 = 3.3333 -> 3.33
        let (_, cost) = session_cost(at(10, 0), at(11, 20), 2.5);
        assert_eq!(cost, 3.33);
    }

    #[test]
    fn close_reservation_produces_matching_log_entry() {
        let reservation = Reservation {
            id: 42,
            spot_id: 7,
            user_id: "u1".into(),
            started_at: at(10, 0),
            ended_at: None,
            cost: None,
        };

        let (closed, entry) =
            close_reservation(reservation, 3, "KA-01-1234", at(10, 0), at(13, 15), 4.0);

        assert_eq!(closed.ended_at, Some(at(13, 15)));
        assert_eq!(closed.cost, Some(13.0));

        assert_eq!(entry.user_id, "u1");
        assert_eq!(entry.spot_id, 7);
        assert_eq!(entry.lot_id, 3);
        assert_eq!(entry.vehicle_id, "KA-01-1234");
        assert_eq!(entry.duration_hours, 3.25);
        assert_eq!(entry.cost, 13.0);
        assert_eq!(entry.remarks, AUTO_RELEASE_REMARKS);
    }
}
