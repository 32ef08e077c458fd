// Billing window arithmetic tests
// The reminder pass treats billing days as a fixed 28-day wheel so every
// configured day (1-28) exists in every month.

use chrono::{TimeZone, Utc};
use gymkit_backend_core::services::billing_cycle::{
    current_month_start, days_until_billing, reminder_due,
};

#[test]
fn billing_day_later_this_month() {
    assert_eq!(days_until_billing(15, 10), 5);
    assert_eq!(days_until_billing(28, 1), 27);
}

#[test]
fn billing_day_today_is_zero() {
    for day in 1..=28 {
        assert_eq!(days_until_billing(day, day), 0);
    }
}

#[test]
fn billing_day_already_passed_wraps_forward() {
    // Day 5 seen on the 10th comes around again in 23 days
    assert_eq!(days_until_billing(5, 10), 23);
    assert_eq!(days_until_billing(1, 28), 1);
}

#[test]
fn wrapped_distance_stays_under_28() {
    for billing_day in 1..=28 {
        for today in 1..=31 {
            let days = days_until_billing(billing_day, today);
            assert!(
                (0..28).contains(&days),
                "billing_day={} today={} gave {}",
                billing_day,
                today,
                days
            );
        }
    }
}

#[test]
fn reminder_window_includes_both_ends() {
    assert!(reminder_due(0, 3));
    assert!(reminder_due(3, 3));
    assert!(!reminder_due(4, 3));

    // Zero lead means remind on the day itself only
    assert!(reminder_due(0, 0));
    assert!(!reminder_due(1, 0));
}

#[test]
fn month_start_truncates_to_first_midnight() {
    let now = Utc.with_ymd_and_hms(2026, 8, 23, 17, 45, 9).unwrap();
    let start = current_month_start(now);
    assert_eq!(start, Utc.with_ymd_and_hms(2026, 8, 1, 0, 0, 0).unwrap());

    // Already the first: only the time component drops
    let first = Utc.with_ymd_and_hms(2026, 2, 1, 23, 59, 59).unwrap();
    assert_eq!(
        current_month_start(first),
        Utc.with_ymd_and_hms(2026, 2, 1, 0, 0, 0).unwrap()
    );
}
