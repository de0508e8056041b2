// 🩸 Period History - logged periods as immutable values
//
// A PeriodRange is one logged bleed (start..=end). A PeriodHistory is the
// sorted list of them plus the start-to-start gaps everything else is built on.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use tracing::debug;

/// Date format used by every text surface (forms, CSV, JSON)
pub const DATE_FORMAT: &str = "%Y-%m-%d";

// ============================================================================
// PERIOD RANGE
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct PeriodRange {
    start: NaiveDate,
    end: NaiveDate,
}

impl PeriodRange {
    /// Create a range; swapped dates are put back in order
    pub fn new(start: NaiveDate, end: NaiveDate) -> Self {
        if end < start {
            PeriodRange { start: end, end: start }
        } else {
            PeriodRange { start, end }
        }
    }

    pub fn start(&self) -> NaiveDate {
        self.start
    }

    pub fn end(&self) -> NaiveDate {
        self.end
    }

    /// Inclusive length in days (a one-day period has length 1)
    pub fn length_days(&self) -> i64 {
        (self.end - self.start).num_days() + 1
    }
}

// ============================================================================
// PERIOD HISTORY
// ============================================================================

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct PeriodHistory {
    ranges: Vec<PeriodRange>,
    cycle_lengths: Vec<i64>,
}

impl PeriodHistory {
    /// Build a history from ranges in any order
    pub fn new<I>(ranges: I) -> Self
    where
        I: IntoIterator<Item = PeriodRange>,
    {
        let mut ranges: Vec<PeriodRange> = ranges.into_iter().collect();
        ranges.sort_by_key(|r| (r.start, r.end));

        let cycle_lengths = ranges
            .windows(2)
            .map(|w| (w[1].start - w[0].start).num_days())
            .collect();

        PeriodHistory {
            ranges,
            cycle_lengths,
        }
    }

    /// Build a history from form rows, dropping any row missing a date
    pub fn from_optional_pairs<I>(pairs: I) -> Self
    where
        I: IntoIterator<Item = (Option<NaiveDate>, Option<NaiveDate>)>,
    {
        let mut dropped = 0usize;
        let ranges: Vec<PeriodRange> = pairs
            .into_iter()
            .filter_map(|pair| match pair {
                (Some(start), Some(end)) => Some(PeriodRange::new(start, end)),
                _ => {
                    dropped += 1;
                    None
                }
            })
            .collect();

        if dropped > 0 {
            debug!(dropped, kept = ranges.len(), "discarded incomplete period rows");
        }

        PeriodHistory::new(ranges)
    }

    pub fn ranges(&self) -> &[PeriodRange] {
        &self.ranges
    }

    pub fn len(&self) -> usize {
        self.ranges.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ranges.is_empty()
    }

    /// Start dates in ascending order
    pub fn start_dates(&self) -> impl Iterator<Item = NaiveDate> + '_ {
        self.ranges.iter().map(|r| r.start)
    }

    /// Days between consecutive start dates (len - 1 entries)
    pub fn cycle_lengths(&self) -> &[i64] {
        &self.cycle_lengths
    }

    pub fn last_start(&self) -> Option<NaiveDate> {
        self.ranges.last().map(|r| r.start)
    }

    /// Gap between the two most recent starts
    pub fn last_cycle_length(&self) -> Option<i64> {
        self.cycle_lengths.last().copied()
    }
}

impl FromIterator<PeriodRange> for PeriodHistory {
    fn from_iter<T: IntoIterator<Item = PeriodRange>>(iter: T) -> Self {
        PeriodHistory::new(iter)
    }
}

// ============================================================================
// TESTS
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn date(s: &str) -> NaiveDate {
        NaiveDate::parse_from_str(s, DATE_FORMAT).unwrap()
    }

    fn range(start: &str, end: &str) -> PeriodRange {
        PeriodRange::new(date(start), date(end))
    }

    #[test]
    fn test_range_normalizes_swapped_dates() {
        let r = range("2024-01-05", "2024-01-01");

        assert_eq!(r.start(), date("2024-01-01"));
        assert_eq!(r.end(), date("2024-01-05"));
        assert_eq!(r.length_days(), 5);
    }

    #[test]
    fn test_single_day_period() {
        assert_eq!(range("2024-01-01", "2024-01-01").length_days(), 1);
    }

    #[test]
    fn test_history_sorted_by_start() {
        let history = PeriodHistory::new(vec![
            range("2024-02-25", "2024-03-01"),
            range("2024-01-01", "2024-01-05"),
            range("2024-01-29", "2024-02-02"),
        ]);

        let starts: Vec<NaiveDate> = history.start_dates().collect();
        assert_eq!(
            starts,
            vec![date("2024-01-01"), date("2024-01-29"), date("2024-02-25")]
        );
        assert_eq!(history.cycle_lengths(), &[28, 27]);
        assert_eq!(history.last_start(), Some(date("2024-02-25")));
        assert_eq!(history.last_cycle_length(), Some(27));
    }

    #[test]
    fn test_incomplete_pairs_are_discarded() {
        let history = PeriodHistory::from_optional_pairs(vec![
            (Some(date("2024-01-01")), Some(date("2024-01-05"))),
            (Some(date("2024-01-29")), None),
            (None, Some(date("2024-02-02"))),
            (None, None),
            (Some(date("2024-02-25")), Some(date("2024-03-01"))),
        ]);

        assert_eq!(history.len(), 2);
        assert_eq!(history.cycle_lengths(), &[55]);
    }

    #[test]
    fn test_empty_history() {
        let history = PeriodHistory::default();

        assert!(history.is_empty());
        assert_eq!(history.last_start(), None);
        assert_eq!(history.last_cycle_length(), None);
        assert!(history.cycle_lengths().is_empty());
    }

    #[test]
    fn test_collect_into_history() {
        let history: PeriodHistory = vec![range("2024-01-29", "2024-02-02"), range("2024-01-01", "2024-01-05")]
            .into_iter()
            .collect();

        assert_eq!(history.cycle_lengths(), &[28]);
    }
}
