// Attendance streak calculator
// Streaks count consecutive calendar days with at least one check-in.
// The check-in insert and the member streak update are one transaction so
// the streak state always reflects the most recent check-in day.

use chrono::{DateTime, NaiveDate, Utc};
use diesel::prelude::*;
use diesel_async::scoped_futures::ScopedFutureExt;
use diesel_async::{AsyncConnection, AsyncPgConnection, RunQueryDsl};
use thiserror::Error;
use tracing::{info, instrument};
use uuid::Uuid;

use crate::models::check_in::{CheckIn, CheckInError, NewCheckIn};
use crate::models::member::{Member, MemberError};

#[derive(Error, Debug)]
pub enum StreakError {
    #[error("Database error: {0}")]
    Database(#[from] diesel::result::Error),

    #[error("Member not found")]
    MemberNotFound,
}

impl From<MemberError> for StreakError {
    fn from(e: MemberError) -> Self {
        match e {
            MemberError::NotFound => StreakError::MemberNotFound,
            MemberError::Database(e) => StreakError::Database(e),
        }
    }
}

impl From<CheckInError> for StreakError {
    fn from(e: CheckInError) -> Self {
        match e {
            CheckInError::Database(e) => StreakError::Database(e),
        }
    }
}

/// Streak fields carried by a member row
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StreakState {
    pub current: i32,
    pub longest: i32,
    pub last_check_date: Option<NaiveDate>,
}

/// Advance a streak for a check-in on `today`
///
/// Same-day repeats leave the streak unchanged; a consecutive day
/// increments it; any gap (or clock skew backwards) resets the current
/// streak to 1 without touching the longest.
pub fn advance(state: StreakState, today: NaiveDate) -> StreakState {
    let (current, longest) = match state.last_check_date {
        None => {
            // First-ever check-in
            (1, state.longest.max(1))
        }
        Some(last) => {
            let days_diff = (today - last).num_days();
            match days_diff {
                0 => (state.current, state.longest),
                1 => {
                    let current = state.current + 1;
                    (current, state.longest.max(current))
                }
                _ => (1, state.longest),
            }
        }
    };

    StreakState {
        current,
        longest,
        last_check_date: Some(today),
    }
}

/// Result of recording a check-in
#[derive(Debug)]
pub struct CheckInOutcome {
    pub check_in: CheckIn,
    pub current_streak: i32,
    pub longest_streak: i32,
}

/// Record a member check-in and update streak state atomically
#[instrument(skip(conn))]
pub async fn record_check_in(
    conn: &mut AsyncPgConnection,
    tenant: Uuid,
    member: Uuid,
    checked_in_at: DateTime<Utc>,
) -> Result<CheckInOutcome, StreakError> {
    let today = checked_in_at.date_naive();

    let outcome = conn
        .transaction::<_, StreakError, _>(|conn| {
            async move {
                let existing = Member::find_for_tenant(conn, tenant, member).await?;

                let next = advance(
                    StreakState {
                        current: existing.current_streak,
                        longest: existing.longest_streak,
                        last_check_date: existing.last_streak_check_date,
                    },
                    today,
                );

                let check_in = CheckIn::create(
                    conn,
                    NewCheckIn {
                        tenant_id: tenant,
                        member_id: member,
                        checked_in_at,
                    },
                )
                .await?;

                use crate::schema::members;
                diesel::update(members::table.filter(members::id.eq(member)))
                    .set((
                        members::current_streak.eq(next.current),
                        members::longest_streak.eq(next.longest),
                        members::last_streak_check_date.eq(next.last_check_date),
                        members::last_check_in_at.eq(Some(checked_in_at)),
                        members::updated_at.eq(Utc::now()),
                    ))
                    .execute(conn)
                    .await?;

                Ok(CheckInOutcome {
                    check_in,
                    current_streak: next.current,
                    longest_streak: next.longest,
                })
            }
            .scope_boxed()
        })
        .await?;

    info!(
        member_id = %member,
        current_streak = outcome.current_streak,
        "Check-in recorded"
    );
    Ok(outcome)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn test_first_check_in_starts_streak() {
        let next = advance(
            StreakState {
                current: 0,
                longest: 0,
                last_check_date: None,
            },
            date(2026, 5, 10),
        );
        assert_eq!(next.current, 1);
        assert_eq!(next.longest, 1);
        assert_eq!(next.last_check_date, Some(date(2026, 5, 10)));
    }

    #[test]
    fn test_same_day_repeat_is_noop() {
        let state = StreakState {
            current: 4,
            longest: 9,
            last_check_date: Some(date(2026, 5, 10)),
        };
        let next = advance(state, date(2026, 5, 10));
        assert_eq!(next.current, 4);
        assert_eq!(next.longest, 9);
    }

    #[test]
    fn test_consecutive_day_increments() {
        let state = StreakState {
            current: 4,
            longest: 4,
            last_check_date: Some(date(2026, 5, 10)),
        };
        let next = advance(state, date(2026, 5, 11));
        assert_eq!(next.current, 5);
        assert_eq!(next.longest, 5);
    }

    #[test]
    fn test_gap_resets_current_but_not_longest() {
        let state = StreakState {
            current: 7,
            longest: 12,
            last_check_date: Some(date(2026, 5, 10)),
        };
        let next = advance(state, date(2026, 5, 13));
        assert_eq!(next.current, 1);
        assert_eq!(next.longest, 12);
    }

    #[test]
    fn test_backwards_clock_resets_like_gap() {
        let state = StreakState {
            current: 3,
            longest: 3,
            last_check_date: Some(date(2026, 5, 10)),
        };
        let next = advance(state, date(2026, 5, 8));
        assert_eq!(next.current, 1);
        assert_eq!(next.longest, 3);
    }

    #[test]
    fn test_streak_never_exceeds_longest() {
        let mut state = StreakState {
            current: 0,
            longest: 0,
            last_check_date: None,
        };
        let mut day = date(2026, 1, 1);
        for _ in 0..30 {
            state = advance(state, day);
            assert!(state.current <= state.longest);
            assert!(state.current >= 0);
            day = day.succ_opt().unwrap();
        }
        assert_eq!(state.current, 30);
        assert_eq!(state.longest, 30);
    }

    #[test]
    fn test_increment_across_month_boundary() {
        let state = StreakState {
            current: 2,
            longest: 2,
            last_check_date: Some(date(2026, 1, 31)),
        };
        let next = advance(state, date(2026, 2, 1));
        assert_eq!(next.current, 3);
    }
}
