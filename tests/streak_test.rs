// Attendance streak simulation over the pure advance function

use chrono::NaiveDate;
use gymkit_backend_core::services::streak::{advance, StreakState};

fn day(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

fn fresh() -> StreakState {
    StreakState {
        current: 0,
        longest: 0,
        last_check_date: None,
    }
}

#[test]
fn two_week_gym_habit() {
    // Mon-Fri for two weeks with weekends off
    let mut state = fresh();
    let schedule = [
        day(2026, 8, 3),
        day(2026, 8, 4),
        day(2026, 8, 5),
        day(2026, 8, 6),
        day(2026, 8, 7),
        // weekend gap
        day(2026, 8, 10),
        day(2026, 8, 11),
        day(2026, 8, 12),
        day(2026, 8, 13),
        day(2026, 8, 14),
    ];

    for d in schedule {
        state = advance(state, d);
    }

    // Each weekday run is 5 long; the weekend resets current
    assert_eq!(state.current, 5);
    assert_eq!(state.longest, 5);
}

#[test]
fn multiple_same_day_check_ins_count_once() {
    let mut state = fresh();
    state = advance(state, day(2026, 8, 3));
    state = advance(state, day(2026, 8, 3));
    state = advance(state, day(2026, 8, 3));

    assert_eq!(state.current, 1);
    assert_eq!(state.longest, 1);

    state = advance(state, day(2026, 8, 4));
    assert_eq!(state.current, 2);
}

#[test]
fn longest_survives_a_long_break() {
    let mut state = fresh();
    for d in 1..=10 {
        state = advance(state, day(2026, 8, d));
    }
    assert_eq!(state.longest, 10);

    // A month off, then one visit
    state = advance(state, day(2026, 9, 15));
    assert_eq!(state.current, 1);
    assert_eq!(state.longest, 10);
}

#[test]
fn streak_spans_year_boundary() {
    let mut state = fresh();
    state = advance(state, day(2025, 12, 30));
    state = advance(state, day(2025, 12, 31));
    state = advance(state, day(2026, 1, 1));
    state = advance(state, day(2026, 1, 2));

    assert_eq!(state.current, 4);
    assert_eq!(state.longest, 4);
}

#[test]
fn legacy_longest_is_preserved_on_first_tracked_check_in() {
    // Members migrated with a historical longest but no tracked last date
    let state = StreakState {
        current: 0,
        longest: 21,
        last_check_date: None,
    };
    let next = advance(state, day(2026, 8, 23));
    assert_eq!(next.current, 1);
    assert_eq!(next.longest, 21);
}
