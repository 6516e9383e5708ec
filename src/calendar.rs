use std::ops::RangeInclusive;

use chrono::{Datelike, NaiveDate};

/// The bookable date range: a contiguous span of months within one year.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MonthSpan {
    pub year: i32,
    pub first_month: u32,
    pub last_month: u32,
}

impl MonthSpan {
    pub fn new(year: i32, first_month: u32, last_month: u32) -> Result<Self, String> {
        if !(1..=12).contains(&first_month) || !(1..=12).contains(&last_month) {
            return Err(format!(
                "months must be within 1-12, got {}-{}",
                first_month, last_month
            ));
        }
        if first_month > last_month {
            return Err(format!(
                "month span {}-{} is not contiguous",
                first_month, last_month
            ));
        }
        Ok(Self {
            year,
            first_month,
            last_month,
        })
    }

    pub fn single_month(year: i32, month: u32) -> Result<Self, String> {
        Self::new(year, month, month)
    }

    pub fn contains(&self, date: NaiveDate) -> bool {
        date.year() == self.year
            && date.month() >= self.first_month
            && date.month() <= self.last_month
    }

    pub fn months(&self) -> RangeInclusive<u32> {
        self.first_month..=self.last_month
    }

    /// All days in the span, in calendar order.
    pub fn days(&self) -> Vec<NaiveDate> {
        let mut days = Vec::new();
        // from_ymd_opt only fails for out-of-range months, ruled out above
        let mut day = NaiveDate::from_ymd_opt(self.year, self.first_month, 1);
        while let Some(d) = day {
            if !self.contains(d) {
                break;
            }
            days.push(d);
            day = d.succ_opt();
        }
        days
    }
}

/// One month as rows of weeks, Monday first. Cells outside the month are
/// `None`, so a five-desk grid renders exactly like a wall calendar.
pub fn month_grid(year: i32, month: u32) -> Vec<[Option<NaiveDate>; 7]> {
    let Some(first) = NaiveDate::from_ymd_opt(year, month, 1) else {
        return Vec::new();
    };
    let mut weeks = Vec::new();
    let mut week: [Option<NaiveDate>; 7] = [None; 7];
    let mut day = first;
    while day.month() == month {
        let slot = day.weekday().num_days_from_monday() as usize;
        week[slot] = Some(day);
        if slot == 6 {
            weeks.push(week);
            week = [None; 7];
        }
        match day.succ_opt() {
            Some(next) => day = next,
            None => break,
        }
    }
    if week.iter().any(|d| d.is_some()) {
        weeks.push(week);
    }
    weeks
}

pub const WEEKDAY_ABBR: [&str; 7] = ["Mon", "Tue", "Wed", "Thu", "Fri", "Sat", "Sun"];
