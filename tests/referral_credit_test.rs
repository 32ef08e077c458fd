// Referral grace-window arithmetic tests

use chrono::{Duration, Months, Utc};
use gymkit_backend_core::services::referral_credit::extend_free_until;

#[test]
fn first_credit_starts_from_now() {
    let now = Utc::now();
    let extended = extend_free_until(None, now);
    assert_eq!(extended, now.checked_add_months(Months::new(1)).unwrap());
}

#[test]
fn expired_window_restarts_from_now() {
    let now = Utc::now();
    let stale = Some(now - Duration::days(90));
    let extended = extend_free_until(stale, now);
    assert_eq!(extended, now.checked_add_months(Months::new(1)).unwrap());
}

#[test]
fn live_window_extends_from_its_end() {
    // Credits stack: an unexpired window grows by a month, it is not
    // replaced
    let now = Utc::now();
    let current_end = now + Duration::days(20);
    let extended = extend_free_until(Some(current_end), now);
    assert_eq!(
        extended,
        current_end.checked_add_months(Months::new(1)).unwrap()
    );
    assert!(extended > current_end);
}

#[test]
fn three_referrals_compound_to_roughly_three_months() {
    let now = Utc::now();
    let mut window = None;
    for _ in 0..3 {
        window = Some(extend_free_until(window, now));
    }

    let window = window.unwrap();
    let days = (window - now).num_days();
    // Calendar months vary in length; three of them land in this band
    assert!((88..=93).contains(&days), "got {} days", days);
}

#[test]
fn extension_never_shrinks_the_window() {
    let now = Utc::now();
    for offset_days in [-400, -30, -1, 0, 1, 30, 400] {
        let current = now + Duration::days(offset_days);
        let extended = extend_free_until(Some(current), now);
        assert!(extended > now);
        assert!(extended >= current);
    }
}
