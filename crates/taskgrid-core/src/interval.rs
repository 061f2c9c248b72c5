use chrono::{NaiveDateTime, NaiveTime, Timelike};

use crate::datetime::{Calendar, DateInput, Moment};
use crate::format::pad;

impl Calendar {
    /// `date`'s local day and seconds with `hour`'s hour, minute and
    /// millisecond. `None` when either side is missing.
    pub fn combine_date_and_hour(&self, date: Option<Moment>, hour: Option<Moment>) -> Option<Moment> {
        let (date, hour) = (date?, hour?);
        let (Some(date), Some(hour)) = (self.local(date), self.local(hour)) else {
            return Some(Moment::Invalid);
        };

        let millis = hour.nanosecond() / 1_000_000 % 1_000;
        let Some(time) = NaiveTime::from_hms_milli_opt(hour.hour(), hour.minute(), date.second(), millis)
        else {
            return Some(Moment::Invalid);
        };

        Some(self.moment_from_local(NaiveDateTime::new(date.date_naive(), time), "combine_date_and_hour"))
    }

    /// Builds `YYYY-MM-DD` from components and reads it as local midnight.
    /// Month is 1-based.
    pub fn create_date(&self, day: u32, month: u32, year: i32) -> Moment {
        let text = format!(
            "{}-{}-{}",
            pad(4, i64::from(year)),
            pad(2, i64::from(month)),
            pad(2, i64::from(day))
        );
        self.parse(&text)
    }

    /// True when either endpoint of `a` lies strictly inside `b`.
    ///
    /// This does not detect `a` fully containing `b`; use
    /// [`Calendar::do_date_ranges_intersect`] for a symmetric test.
    pub fn do_date_ranges_overlap<A, B>(&self, a: [A; 2], b: [B; 2]) -> bool
    where
        A: DateInput,
        B: DateInput,
    {
        let a = a.map(|d| d.resolve(self));
        let [b_start, b_end] = b.map(|d| d.resolve(self));
        a.iter().any(|d| b_start < *d && b_end > *d)
    }

    /// Open-interval intersection of `a` and `b`.
    pub fn do_date_ranges_intersect<A, B>(&self, a: [A; 2], b: [B; 2]) -> bool
    where
        A: DateInput,
        B: DateInput,
    {
        let [a_start, a_end] = a.map(|d| d.resolve(self));
        let [b_start, b_end] = b.map(|d| d.resolve(self));
        a_start < b_end && b_start < a_end
    }
}

/// Strict "after" test; absent or invalid dates are never after anything.
pub fn is_date_after(a: Option<Moment>, b: Option<Moment>) -> bool {
    match (a, b) {
        (Some(a), Some(b)) => a > b,
        _ => false,
    }
}

#[cfg(test)]
mod tests {
    use chrono::{TimeZone, Utc};

    use super::is_date_after;
    use crate::datetime::{Calendar, Moment};

    #[test]
    fn combines_day_and_time_of_day() {
        let cal = Calendar::utc();
        let date = cal.to_date("2019-07-08T23:59:30Z");
        let hour = cal.to_date("1991-01-06T06:48:00.250Z");
        let expected = Utc
            .with_ymd_and_hms(2019, 7, 8, 6, 48, 30)
            .single()
            .expect("valid")
            + chrono::Duration::milliseconds(250);

        assert_eq!(cal.combine_date_and_hour(Some(date), Some(hour)), Some(Moment::At(expected)));
    }

    #[test]
    fn combining_needs_both_halves() {
        let cal = Calendar::utc();
        let date = cal.to_date("2019-07-08");
        assert_eq!(cal.combine_date_and_hour(None, Some(date)), None);
        assert_eq!(cal.combine_date_and_hour(Some(date), None), None);
        let combined = cal.combine_date_and_hour(Some(date), Some(Moment::Invalid));
        assert!(matches!(combined, Some(Moment::Invalid)));
    }

    #[test]
    fn after_test_short_circuits_on_missing_dates() {
        let cal = Calendar::utc();
        let early = cal.to_date("2019-07-08T06:00:00Z");
        let late = cal.to_date("2019-07-08T07:00:00Z");

        assert!(is_date_after(Some(late), Some(early)));
        assert!(!is_date_after(Some(early), Some(late)));
        assert!(!is_date_after(Some(early), Some(early)));
        assert!(!is_date_after(None, Some(early)));
        assert!(!is_date_after(Some(late), None));
        assert!(!is_date_after(Some(late), Some(Moment::Invalid)));
    }

    #[test]
    fn creates_dates_from_components() {
        let cal = Calendar::utc();
        assert_eq!(cal.create_date(6, 1, 1991), cal.to_date("1991-01-06"));
        assert_eq!(cal.create_date(29, 2, 2020), cal.to_date("2020-02-29"));
        assert!(!cal.create_date(30, 2, 2019).is_valid());
        assert!(!cal.create_date(1, 13, 2019).is_valid());

        let warsaw = Calendar::new(chrono_tz::Europe::Warsaw);
        assert_eq!(
            warsaw.create_date(6, 1, 1991),
            Moment::At(Utc.with_ymd_and_hms(1991, 1, 5, 23, 0, 0).single().expect("valid"))
        );
    }

    #[test]
    fn overlap_checks_endpoints_of_the_first_range() {
        let cal = Calendar::utc();
        let day = ["2019-07-08T08:00:00Z", "2019-07-08T16:00:00Z"];

        assert!(cal.do_date_ranges_overlap(["2019-07-08T07:00:00Z", "2019-07-08T09:00:00Z"], day));
        assert!(cal.do_date_ranges_overlap(["2019-07-08T15:00:00Z", "2019-07-08T17:00:00Z"], day));
        assert!(!cal.do_date_ranges_overlap(["2019-07-08T16:00:00Z", "2019-07-08T17:00:00Z"], day));
        assert!(!cal.do_date_ranges_overlap(["abc", "abc"], day));
    }

    #[test]
    fn overlap_misses_containment_but_intersection_does_not() {
        let cal = Calendar::utc();
        let outer = ["2019-07-08T07:00:00Z", "2019-07-08T17:00:00Z"];
        let inner = ["2019-07-08T08:00:00Z", "2019-07-08T16:00:00Z"];

        assert!(!cal.do_date_ranges_overlap(outer, inner));
        assert!(cal.do_date_ranges_overlap(inner, outer));
        assert!(cal.do_date_ranges_intersect(outer, inner));
        assert!(cal.do_date_ranges_intersect(inner, outer));
        assert!(!cal.do_date_ranges_intersect(
            ["2019-07-08T07:00:00Z", "2019-07-08T08:00:00Z"],
            inner
        ));
    }
}
