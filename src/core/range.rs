//! Inclusive calendar date ranges and gap analysis.
//!
//! Gap computation is a pure function over the store's known-date set so it
//! can be exercised without touching disk or network.

use anyhow::{Result, ensure};
use chrono::{Days, NaiveDate};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fmt::Display;

/// An inclusive range of calendar days, `start <= end`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DateRange {
    start: NaiveDate,
    end: NaiveDate,
}

impl DateRange {
    pub fn new(start: NaiveDate, end: NaiveDate) -> Result<Self> {
        ensure!(
            start <= end,
            "Invalid date range: {} is after {}",
            start,
            end
        );
        Ok(Self { start, end })
    }

    /// Range covering a single day.
    pub fn single(day: NaiveDate) -> Self {
        Self {
            start: day,
            end: day,
        }
    }

    pub fn start(&self) -> NaiveDate {
        self.start
    }

    pub fn end(&self) -> NaiveDate {
        self.end
    }

    /// Number of days covered, at least 1.
    pub fn num_days(&self) -> i64 {
        (self.end - self.start).num_days() + 1
    }

    pub fn contains(&self, day: NaiveDate) -> bool {
        self.start <= day && day <= self.end
    }

    pub fn iter_days(&self) -> impl Iterator<Item = NaiveDate> + use<> {
        self.start.iter_days().take(self.num_days() as usize)
    }

    pub fn intersect(&self, other: &DateRange) -> Option<DateRange> {
        let start = self.start.max(other.start);
        let end = self.end.min(other.end);
        (start <= end).then_some(DateRange { start, end })
    }

    /// The parts of `self` not covered by `other`: zero, one, or two
    /// remainders, in ascending order.
    pub fn subtract(&self, other: &DateRange) -> Vec<DateRange> {
        let Some(overlap) = self.intersect(other) else {
            return vec![*self];
        };

        let mut remainders = Vec::new();
        if self.start < overlap.start {
            remainders.push(DateRange {
                start: self.start,
                end: overlap.start.pred_opt().unwrap(),
            });
        }
        if overlap.end < self.end {
            remainders.push(DateRange {
                start: overlap.end.succ_opt().unwrap(),
                end: self.end,
            });
        }
        remainders
    }

    /// Merges two ranges that overlap or touch (end + 1 day == start).
    pub fn union_if_adjacent(&self, other: &DateRange) -> Option<DateRange> {
        let (a, b) = if self.start <= other.start {
            (self, other)
        } else {
            (other, self)
        };
        if b.start > a.end.checked_add_days(Days::new(1))? {
            return None;
        }
        Some(DateRange {
            start: a.start,
            end: a.end.max(b.end),
        })
    }

    /// Clamps the range to end no later than `last`. None if the whole
    /// range lies after it.
    pub fn clamp_end(&self, last: NaiveDate) -> Option<DateRange> {
        if self.start > last {
            return None;
        }
        Some(DateRange {
            start: self.start,
            end: self.end.min(last),
        })
    }
}

impl Display for DateRange {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}..{}", self.start, self.end)
    }
}

/// Computes the maximal runs of days in `requested` that are not in
/// `known`. The output is pairwise disjoint and sorted ascending, and its
/// union with `known` covers the requested range exactly.
///
/// Days after `today` are dropped outright: no price exists for them yet,
/// so they are neither gaps nor fetchable.
pub fn find_gaps(
    requested: DateRange,
    known: &BTreeSet<NaiveDate>,
    today: NaiveDate,
) -> Vec<DateRange> {
    let Some(effective) = requested.clamp_end(today) else {
        return Vec::new();
    };

    let mut gaps: Vec<DateRange> = Vec::new();
    let mut open: Option<(NaiveDate, NaiveDate)> = None;

    for day in effective.iter_days() {
        if known.contains(&day) {
            if let Some((start, end)) = open.take() {
                gaps.push(DateRange { start, end });
            }
        } else {
            open = match open {
                Some((start, _)) => Some((start, day)),
                None => Some((day, day)),
            };
        }
    }
    if let Some((start, end)) = open {
        gaps.push(DateRange { start, end });
    }

    gaps
}

#[cfg(test)]
mod tests {
    use super::*;

    fn d(s: &str) -> NaiveDate {
        s.parse().unwrap()
    }

    fn r(start: &str, end: &str) -> DateRange {
        DateRange::new(d(start), d(end)).unwrap()
    }

    #[test]
    fn test_rejects_inverted_range() {
        assert!(DateRange::new(d("2024-02-01"), d("2024-01-01")).is_err());
    }

    #[test]
    fn test_num_days_and_iteration() {
        let range = r("2024-01-01", "2024-01-03");
        assert_eq!(range.num_days(), 3);
        let days: Vec<_> = range.iter_days().collect();
        assert_eq!(days, vec![d("2024-01-01"), d("2024-01-02"), d("2024-01-03")]);

        let single = DateRange::single(d("2024-06-15"));
        assert_eq!(single.num_days(), 1);
    }

    #[test]
    fn test_intersect() {
        let a = r("2024-01-01", "2024-01-10");
        let b = r("2024-01-08", "2024-01-20");
        assert_eq!(a.intersect(&b), Some(r("2024-01-08", "2024-01-10")));
        assert_eq!(b.intersect(&a), Some(r("2024-01-08", "2024-01-10")));

        let c = r("2024-02-01", "2024-02-05");
        assert_eq!(a.intersect(&c), None);
    }

    #[test]
    fn test_subtract() {
        let a = r("2024-01-01", "2024-01-10");

        // Middle cut leaves both ends
        assert_eq!(
            a.subtract(&r("2024-01-04", "2024-01-06")),
            vec![r("2024-01-01", "2024-01-03"), r("2024-01-07", "2024-01-10")]
        );
        // Full cover leaves nothing
        assert!(a.subtract(&r("2023-12-01", "2024-02-01")).is_empty());
        // Disjoint leaves the original
        assert_eq!(a.subtract(&r("2024-03-01", "2024-03-05")), vec![a]);
        // Prefix cut
        assert_eq!(
            a.subtract(&r("2023-12-25", "2024-01-05")),
            vec![r("2024-01-06", "2024-01-10")]
        );
    }

    #[test]
    fn test_union_if_adjacent() {
        let a = r("2024-01-01", "2024-01-05");
        assert_eq!(
            a.union_if_adjacent(&r("2024-01-06", "2024-01-10")),
            Some(r("2024-01-01", "2024-01-10"))
        );
        assert_eq!(
            a.union_if_adjacent(&r("2024-01-03", "2024-01-08")),
            Some(r("2024-01-01", "2024-01-08"))
        );
        // One-day hole in between
        assert_eq!(a.union_if_adjacent(&r("2024-01-07", "2024-01-10")), None);
    }

    #[test]
    fn test_find_gaps_empty_store() {
        let gaps = find_gaps(r("2024-01-01", "2024-01-05"), &BTreeSet::new(), d("2024-06-01"));
        assert_eq!(gaps, vec![r("2024-01-01", "2024-01-05")]);
    }

    #[test]
    fn test_find_gaps_interior_runs() {
        let known: BTreeSet<_> = [d("2024-01-02"), d("2024-01-05"), d("2024-01-06")]
            .into_iter()
            .collect();
        let gaps = find_gaps(r("2024-01-01", "2024-01-08"), &known, d("2024-06-01"));
        assert_eq!(
            gaps,
            vec![
                r("2024-01-01", "2024-01-01"),
                r("2024-01-03", "2024-01-04"),
                r("2024-01-07", "2024-01-08"),
            ]
        );
    }

    #[test]
    fn test_find_gaps_fully_covered_is_empty() {
        let range = r("2024-01-01", "2024-01-04");
        let known: BTreeSet<_> = range.iter_days().collect();
        assert!(find_gaps(range, &known, d("2024-06-01")).is_empty());
    }

    #[test]
    fn test_find_gaps_closes_after_feeding_back() {
        let range = r("2024-03-01", "2024-03-20");
        let known: BTreeSet<_> = [d("2024-03-05"), d("2024-03-06"), d("2024-03-15")]
            .into_iter()
            .collect();
        let today = d("2024-06-01");

        let gaps = find_gaps(range, &known, today);

        // Disjoint, sorted, and together with `known` covering the range
        let mut covered = known.clone();
        for (i, gap) in gaps.iter().enumerate() {
            if i > 0 {
                assert!(gaps[i - 1].end() < gap.start());
            }
            covered.extend(gap.iter_days());
        }
        for day in range.iter_days() {
            assert!(covered.contains(&day));
        }

        // Feeding the gap days back yields no further gaps
        assert!(find_gaps(range, &covered, today).is_empty());
    }

    #[test]
    fn test_find_gaps_drops_future_days() {
        let today = d("2024-01-03");

        // Range straddling today: only days up to today can be gaps
        let gaps = find_gaps(r("2024-01-01", "2024-01-10"), &BTreeSet::new(), today);
        assert_eq!(gaps, vec![r("2024-01-01", "2024-01-03")]);

        // Range entirely in the future: nothing to fetch
        assert!(find_gaps(r("2024-02-01", "2024-02-10"), &BTreeSet::new(), today).is_empty());
    }
}
