//! Date range for filtering events.

use std::ops::RangeInclusive;

use chrono::{DateTime, Datelike, Duration, NaiveDate, NaiveTime};
use chrono_tz::Tz;

use crate::error::{PerfcalError, PerfcalResult};
use crate::event::{EventKey, localize};

const MIN_YEAR: i32 = 2010;
const MAX_YEAR: i32 = 2099;

/// A calendar month.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct YearMonth {
    pub year: i32,
    pub month: u32,
}

impl YearMonth {
    pub fn new(year: i32, month: u32) -> PerfcalResult<Self> {
        if !(1..=12).contains(&month) {
            return Err(PerfcalError::InvalidRange(format!(
                "month {} is not between 1 and 12",
                month
            )));
        }
        if !(MIN_YEAR..=MAX_YEAR).contains(&year) {
            return Err(PerfcalError::InvalidRange(format!(
                "year {} is not between {} and {}",
                year, MIN_YEAR, MAX_YEAR
            )));
        }
        Ok(YearMonth { year, month })
    }

    fn first_day(&self) -> NaiveDate {
        NaiveDate::from_ymd_opt(self.year, self.month, 1).unwrap_or(NaiveDate::MIN)
    }

    fn last_day(&self) -> NaiveDate {
        let next = if self.month == 12 {
            NaiveDate::from_ymd_opt(self.year + 1, 1, 1)
        } else {
            NaiveDate::from_ymd_opt(self.year, self.month + 1, 1)
        };
        next.map(|d| d - Duration::days(1)).unwrap_or(NaiveDate::MAX)
    }
}

/// Inclusive range of whole months, in the organization timezone.
#[derive(Debug, Clone)]
pub struct DateRange {
    /// Local midnight of the first day
    pub from: DateTime<Tz>,
    /// 23:59:59 on the last day
    pub to: DateTime<Tz>,
    first: YearMonth,
    last: YearMonth,
}

impl DateRange {
    pub fn new(first: YearMonth, last: YearMonth, tz: Tz) -> PerfcalResult<Self> {
        if first > last {
            return Err(PerfcalError::InvalidRange(format!(
                "{}-{:02} is after {}-{:02}",
                first.year, first.month, last.year, last.month
            )));
        }

        let from = localize(&tz, first.first_day().and_time(NaiveTime::MIN));
        let to = NaiveTime::from_hms_opt(23, 59, 59)
            .and_then(|end_of_day| localize(&tz, last.last_day().and_time(end_of_day)));

        match (from, to) {
            (Some(from), Some(to)) => Ok(DateRange {
                from,
                to,
                first,
                last,
            }),
            _ => Err(PerfcalError::InvalidRange(
                "range boundary does not exist in the configured timezone".into(),
            )),
        }
    }

    /// Parse a month range relative to `today`.
    ///
    /// - `None`: this month through December
    /// - `5`: May of this year
    /// - `3-6`: March through June of this year
    /// - `2024`: all of 2024
    /// - `2024:3` or `2024:3-6`: months of 2024
    /// - `2024:11-2025:2`: November 2024 through February 2025
    pub fn from_months(months: Option<&str>, today: NaiveDate, tz: Tz) -> PerfcalResult<Self> {
        let Some(months) = months else {
            return Self::new(
                YearMonth::new(today.year(), today.month())?,
                YearMonth::new(today.year(), 12)?,
                tz,
            );
        };

        let parts: Vec<&str> = months.split('-').map(str::trim).collect();
        if parts.len() > 2 || parts.iter().any(|p| p.is_empty()) {
            return Err(PerfcalError::InvalidRange(format!(
                "'{}' is not a month range",
                months
            )));
        }

        let start = parts[0];
        let end = parts.get(1).copied().unwrap_or(start);

        let first = match parse_month_part(start)? {
            MonthPart::Month(month) => YearMonth::new(today.year(), month)?,
            MonthPart::Year(year) => YearMonth::new(year, 1)?,
            MonthPart::YearMonth(year, month) => YearMonth::new(year, month)?,
        };

        let last = match parse_month_part(end)? {
            MonthPart::Month(month) => YearMonth::new(first.year, month)?,
            MonthPart::Year(year) => YearMonth::new(year, 12)?,
            MonthPart::YearMonth(year, month) => YearMonth::new(year, month)?,
        };

        Self::new(first, last, tz)
    }

    pub fn contains(&self, key: &EventKey) -> bool {
        key.intersects(&self.from, &self.to)
    }

    /// Every calendar year the range touches.
    pub fn years(&self) -> RangeInclusive<i32> {
        self.first.year..=self.last.year
    }

    /// Default output file name without extension.
    pub fn output_stem(&self) -> String {
        let (first, last) = (self.first, self.last);
        if first.year == last.year && first.month == 1 && last.month == 12 {
            format!("events{}", first.year)
        } else if first == last {
            format!("events{}{:02}", first.year, first.month)
        } else if first.year == last.year {
            format!("events{}{:02}{:02}", first.year, first.month, last.month)
        } else {
            format!(
                "events{}{:02}{}{:02}",
                first.year, first.month, last.year, last.month
            )
        }
    }
}

enum MonthPart {
    Month(u32),
    Year(i32),
    YearMonth(i32, u32),
}

fn parse_month_part(part: &str) -> PerfcalResult<MonthPart> {
    let invalid = || PerfcalError::InvalidRange(format!("'{}' is not a month or year", part));

    match part.split_once(':') {
        Some((year, month)) => {
            let year: i32 = year.trim().parse().map_err(|_| invalid())?;
            let month: u32 = month.trim().parse().map_err(|_| invalid())?;
            Ok(MonthPart::YearMonth(year, month))
        }
        None => {
            let n: i32 = part.parse().map_err(|_| invalid())?;
            if (1..=12).contains(&n) {
                Ok(MonthPart::Month(n as u32))
            } else if (MIN_YEAR..=MAX_YEAR).contains(&n) {
                Ok(MonthPart::Year(n))
            } else {
                Err(invalid())
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Timelike};
    use chrono_tz::America::Los_Angeles;

    fn today() -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 4, 15).unwrap()
    }

    #[test]
    fn test_default_is_rest_of_year() {
        let range = DateRange::from_months(None, today(), Los_Angeles).unwrap();
        assert_eq!(range.from, Los_Angeles.with_ymd_and_hms(2024, 4, 1, 0, 0, 0).unwrap());
        assert_eq!(range.to, Los_Angeles.with_ymd_and_hms(2024, 12, 31, 23, 59, 59).unwrap());
        assert_eq!(range.output_stem(), "events20240412");
    }

    #[test]
    fn test_single_month() {
        let range = DateRange::from_months(Some("2"), today(), Los_Angeles).unwrap();
        assert_eq!(range.from.date_naive(), NaiveDate::from_ymd_opt(2024, 2, 1).unwrap());
        assert_eq!(range.to.date_naive(), NaiveDate::from_ymd_opt(2024, 2, 29).unwrap());
        assert_eq!(range.to.hour(), 23);
        assert_eq!(range.output_stem(), "events202402");
    }

    #[test]
    fn test_whole_year() {
        let range = DateRange::from_months(Some("2025"), today(), Los_Angeles).unwrap();
        assert_eq!(range.from.date_naive(), NaiveDate::from_ymd_opt(2025, 1, 1).unwrap());
        assert_eq!(range.to.date_naive(), NaiveDate::from_ymd_opt(2025, 12, 31).unwrap());
        assert_eq!(range.output_stem(), "events2025");
        assert_eq!(range.years(), 2025..=2025);
    }

    #[test]
    fn test_range_across_years() {
        let range = DateRange::from_months(Some("2024:11-2025:2"), today(), Los_Angeles).unwrap();
        assert_eq!(range.years(), 2024..=2025);
        assert_eq!(range.output_stem(), "events202411202502");
    }

    #[test]
    fn test_months_of_given_year() {
        let range = DateRange::from_months(Some("2023:3-6"), today(), Los_Angeles).unwrap();
        assert_eq!(range.from.date_naive(), NaiveDate::from_ymd_opt(2023, 3, 1).unwrap());
        assert_eq!(range.to.date_naive(), NaiveDate::from_ymd_opt(2023, 6, 30).unwrap());
    }

    #[test]
    fn test_invalid_ranges_are_rejected() {
        for months in ["13", "6-3", "2024:0", "1999", "x", "1-2-3", "2024:5-"] {
            assert!(
                matches!(
                    DateRange::from_months(Some(months), today(), Los_Angeles),
                    Err(PerfcalError::InvalidRange(_))
                ),
                "'{}' should be rejected",
                months
            );
        }
    }
}
