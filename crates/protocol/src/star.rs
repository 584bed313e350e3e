//! Star events and timeline helpers.
//!
//! A [`StarEvent`] records the moment a user starred a repository. The
//! stargazer endpoint returns them in pages; once all pages are collected the
//! timeline is ordered with [`sort_timeline`] and can be summarized with
//! [`monthly_cumulative`].

use chrono::{DateTime, Datelike, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

/// One instance of a user starring a repository.
///
/// Decoded from the `application/vnd.github.v3.star+json` representation of
/// the stargazers endpoint; the `user` object is ignored.
///
/// # Examples
///
/// ```
/// use starchart_protocol::StarEvent;
///
/// let json = r#"[{"starred_at": "2021-05-01T10:00:00Z", "user": {"login": "octocat"}}]"#;
/// let events: Vec<StarEvent> = serde_json::from_str(json).unwrap();
/// assert_eq!(events.len(), 1);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct StarEvent {
    /// When the star was given.
    pub starred_at: DateTime<Utc>,
}

impl StarEvent {
    /// Creates a star event at the given instant.
    #[must_use]
    pub const fn new(starred_at: DateTime<Utc>) -> Self {
        Self { starred_at }
    }
}

/// Sorts a timeline ascending by star time.
///
/// The sort is stable, so events sharing a timestamp keep their relative
/// order.
pub fn sort_timeline(events: &mut [StarEvent]) {
    events.sort_by_key(|event| event.starred_at);
}

/// Returns `true` if the timeline is ascending by star time.
#[must_use]
pub fn is_sorted_timeline(events: &[StarEvent]) -> bool {
    events
        .windows(2)
        .all(|pair| pair[0].starred_at <= pair[1].starred_at)
}

/// Cumulative star count at the end of a calendar month.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct MonthlyStars {
    /// First day of the month.
    pub month: NaiveDate,
    /// Stars received up to and including this month.
    pub total: u64,
}

/// Summarizes a sorted timeline into cumulative per-month totals.
///
/// Only months that received at least one star are listed. The input must
/// already be sorted (see [`sort_timeline`]).
#[must_use]
pub fn monthly_cumulative(events: &[StarEvent]) -> Vec<MonthlyStars> {
    let mut months: Vec<MonthlyStars> = Vec::new();
    let mut total = 0u64;

    for event in events {
        total += 1;
        let date = event.starred_at.date_naive();
        let Some(month) = NaiveDate::from_ymd_opt(date.year(), date.month(), 1) else {
            continue;
        };

        match months.last_mut() {
            Some(last) if last.month == month => last.total = total,
            _ => months.push(MonthlyStars { month, total }),
        }
    }

    months
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn at(y: i32, m: u32, d: u32) -> StarEvent {
        StarEvent::new(Utc.with_ymd_and_hms(y, m, d, 12, 0, 0).unwrap())
    }

    #[test]
    fn sort_orders_ascending() {
        let mut events = vec![at(2024, 3, 1), at(2023, 1, 1), at(2024, 1, 15)];
        sort_timeline(&mut events);
        assert_eq!(events, vec![at(2023, 1, 1), at(2024, 1, 15), at(2024, 3, 1)]);
        assert!(is_sorted_timeline(&events));
    }

    #[test]
    fn empty_timeline_is_sorted() {
        assert!(is_sorted_timeline(&[]));
        assert!(monthly_cumulative(&[]).is_empty());
    }

    #[test]
    fn monthly_cumulative_groups_by_month() {
        let events = vec![
            at(2024, 1, 1),
            at(2024, 1, 20),
            at(2024, 2, 5),
            at(2024, 4, 30),
        ];
        let months = monthly_cumulative(&events);
        assert_eq!(months.len(), 3);
        assert_eq!(months[0].month, NaiveDate::from_ymd_opt(2024, 1, 1).unwrap());
        assert_eq!(months[0].total, 2);
        assert_eq!(months[1].total, 3);
        assert_eq!(months[2].month, NaiveDate::from_ymd_opt(2024, 4, 1).unwrap());
        assert_eq!(months[2].total, 4);
    }
}

#[cfg(test)]
mod proptest_tests {
    use super::*;
    use chrono::TimeZone;
    use proptest::prelude::*;

    fn any_event() -> impl Strategy<Value = StarEvent> {
        // 2008-01-01 .. 2030-01-01
        (1_199_145_600i64..1_893_456_000i64)
            .prop_map(|secs| StarEvent::new(Utc.timestamp_opt(secs, 0).unwrap()))
    }

    proptest! {
        /// Sorting keeps every event and yields an ascending timeline.
        #[test]
        fn sort_is_ascending_permutation(mut events in prop::collection::vec(any_event(), 0..200)) {
            let mut expected = events.clone();
            expected.sort();
            sort_timeline(&mut events);
            prop_assert!(is_sorted_timeline(&events));
            prop_assert_eq!(events, expected);
        }

        /// The last cumulative total equals the number of events.
        #[test]
        fn monthly_totals_end_at_event_count(mut events in prop::collection::vec(any_event(), 1..200)) {
            sort_timeline(&mut events);
            let months = monthly_cumulative(&events);
            prop_assert_eq!(months.last().map(|m| m.total), Some(events.len() as u64));
            prop_assert!(months.windows(2).all(|w| w[0].month < w[1].month && w[0].total < w[1].total));
        }
    }
}
