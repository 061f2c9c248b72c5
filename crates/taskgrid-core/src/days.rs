use chrono::{DateTime, Datelike, Days, Duration, Offset, Utc, Weekday};
use tracing::{trace, warn};

use crate::datetime::{Calendar, DateInput, Moment};
use crate::locale::LocaleTable;

/// One rendered calendar day.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DayCell {
    pub date: DateTime<Utc>,
    pub day_of_month: u32,
    /// 1-based month index and its localized name.
    pub month: (u32, String),
    pub year: i32,
    /// Weekday with its localized full and short names.
    pub day_of_week: (Weekday, String, String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Extremum {
    Earliest,
    Latest,
}

impl Extremum {
    fn prefers(self, candidate: DateTime<Utc>, current: DateTime<Utc>) -> bool {
        match self {
            Extremum::Earliest => candidate < current,
            Extremum::Latest => candidate > current,
        }
    }
}

impl Calendar {
    /// Inclusive number of calendar days from `start` to `end`, counted on
    /// local wall-clock time. Zero when `end` precedes `start` or either
    /// side is invalid.
    pub fn count_number_of_days(&self, start: impl DateInput, end: impl DateInput) -> u64 {
        let start = self.local(start.resolve(self));
        let end = self.local(end.resolve(self));
        let (Some(start), Some(end)) = (start, end) else {
            return 0;
        };
        if end < start {
            return 0;
        }

        let whole_days = (end.naive_local() - start.naive_local()).num_days();
        u64::try_from(whole_days.saturating_add(1)).unwrap_or(0)
    }

    pub fn add_day(&self, start: impl DateInput) -> Moment {
        self.add_days(start, 1)
    }

    /// Shifts by whole calendar days, keeping the local time of day.
    pub fn add_days(&self, start: impl DateInput, days: i64) -> Moment {
        let start = start.resolve(self);
        if days == 0 {
            return start;
        }
        let Some(local) = self.local(start) else {
            return Moment::Invalid;
        };

        let naive = local.naive_local();
        let shifted = if days >= 0 {
            naive.checked_add_days(Days::new(days.unsigned_abs()))
        } else {
            naive.checked_sub_days(Days::new(days.unsigned_abs()))
        };
        let Some(shifted) = shifted else {
            warn!(days, start = %local, "day shift out of range");
            return Moment::Invalid;
        };

        // a fold keeps the side of the offset we started on
        match self.resolve_local(shifted, Some(local.offset().fix()), "add_days") {
            Some(dt) => Moment::At(dt),
            // landed in a DST gap: fall back to exact 24h steps
            None => Duration::try_days(days)
                .and_then(|step| local.with_timezone(&Utc).checked_add_signed(step))
                .map_or(Moment::Invalid, Moment::At),
        }
    }

    /// Exactly `count` consecutive days from `start`, named from `locale`.
    /// An invalid start yields no days.
    pub fn generate_days(
        &self,
        locale: &LocaleTable,
        start: impl DateInput,
        count: usize,
    ) -> Vec<DayCell> {
        let start = start.resolve(self);
        if !start.is_valid() {
            warn!(count, "cannot generate days from an invalid start");
            return vec![];
        }

        let days: Vec<DayCell> = (0..count)
            .filter_map(|offset| i64::try_from(offset).ok())
            .filter_map(|offset| self.day_cell(locale, self.add_days(start, offset)))
            .collect();
        trace!(requested = count, generated = days.len(), locale = %locale.locale_code, "generated day grid");
        days
    }

    pub fn day_cell(&self, locale: &LocaleTable, moment: Moment) -> Option<DayCell> {
        let local = self.local(moment)?;
        let month = local.month();
        let weekday = local.weekday();

        Some(DayCell {
            date: local.with_timezone(&Utc),
            day_of_month: local.day(),
            month: (month, locale.month_name(month).unwrap_or_default().to_string()),
            year: local.year(),
            day_of_week: (
                weekday,
                locale.day_name(weekday).to_string(),
                locale.short_day_name(weekday).to_string(),
            ),
        })
    }
}

/// Earliest or latest valid date; ties keep the first one seen.
pub fn find_date<I>(extremum: Extremum, dates: I) -> Option<Moment>
where
    I: IntoIterator<Item = Moment>,
{
    dates
        .into_iter()
        .filter_map(|moment| moment.instant())
        .fold(None, |best, candidate| match best {
            Some(current) if !extremum.prefers(candidate, current) => Some(current),
            _ => Some(candidate),
        })
        .map(Moment::At)
}

pub fn find_earliest_date<I>(dates: I) -> Option<Moment>
where
    I: IntoIterator<Item = Moment>,
{
    find_date(Extremum::Earliest, dates)
}

pub fn find_latest_date<I>(dates: I) -> Option<Moment>
where
    I: IntoIterator<Item = Moment>,
{
    find_date(Extremum::Latest, dates)
}
