use tracing::debug;

use crate::datetime::{Calendar, DateInput, Moment};
use crate::task::{FlattenedLog, Task};

impl Calendar {
    /// Flattens tasks into their logs, task order then log order.
    pub fn reverse_task_data(&self, tasks: &[Task]) -> Vec<FlattenedLog> {
        tasks
            .iter()
            .flat_map(|task| {
                task.logs.iter().map(move |log| FlattenedLog {
                    id: log.id,
                    start: self.to_date(&log.start),
                    end: self.to_date(&log.end),
                    status: log.status,
                    task: task.to_ref(),
                })
            })
            .collect()
    }

    /// Every start and end of every log, blanks dropped.
    pub fn get_all_dates_from_tasks(&self, tasks: &[Task]) -> Vec<Moment> {
        tasks
            .iter()
            .flat_map(|task| task.logs.iter())
            .flat_map(|log| [&log.start, &log.end])
            .filter(|date| !date.is_blank())
            .map(|date| self.to_date(date))
            .collect()
    }

    /// Flattened logs that start on the same calendar day as `day`.
    pub fn get_reversed_logs_for_date(
        &self,
        tasks: &[Task],
        day: impl DateInput,
    ) -> Vec<FlattenedLog> {
        let day = day.resolve(self);
        let logs: Vec<FlattenedLog> = self
            .reverse_task_data(tasks)
            .into_iter()
            .filter(|log| self.is_the_same_day(log.start, day))
            .collect();
        debug!(%day, matched = logs.len(), "filtered logs for day");
        logs
    }
}

/// `a - b` in whole minutes, truncated toward zero.
pub fn count_time_difference(a: Moment, b: Moment) -> Option<i64> {
    let (a, b) = (a.instant()?, b.instant()?);
    Some((a - b).num_minutes())
}

/// Total logged minutes, skipping warning logs. Invalid or reversed
/// ranges add nothing.
pub fn count_log_time(logs: &[FlattenedLog]) -> i64 {
    logs.iter()
        .filter(|log| log.status.counts_toward_total())
        .filter_map(|log| count_time_difference(log.end, log.start))
        .map(|minutes| minutes.max(0))
        .sum()
}

#[cfg(test)]
mod tests {
    use chrono::{TimeZone, Utc};

    use super::{count_log_time, count_time_difference};
    use crate::datetime::{Calendar, Moment, to_date};
    use crate::task::{FlattenedLog, Log, LogStatus, Task, TaskRef};

    fn at(raw: &str) -> chrono::DateTime<Utc> {
        to_date(raw).instant().expect("valid fixture date")
    }

    fn tasks() -> Vec<Task> {
        vec![
            Task::new(
                1,
                "Task 1",
                vec![
                    Log::new(1, at("2019-07-02T12:28:10Z"), at("2019-07-02T14:28:12Z"), LogStatus::Accepted),
                    Log::new(2, at("2019-07-04T16:59:00Z"), at("2019-07-04T18:03:08Z"), LogStatus::Pending),
                ],
            ),
            Task::new(
                2,
                "Task 2",
                vec![Log::new(
                    3,
                    at("2019-07-08T06:48:00Z"),
                    at("2019-07-08T09:37:22Z"),
                    LogStatus::Accepted,
                )],
            ),
        ]
    }

    fn flattened(id: u64, start: &str, end: &str, status: LogStatus, task: (u64, &str)) -> FlattenedLog {
        FlattenedLog {
            id,
            start: to_date(start),
            end: to_date(end),
            status,
            task: TaskRef {
                id: task.0,
                name: task.1.to_string(),
            },
        }
    }

    fn reversed_logs() -> Vec<FlattenedLog> {
        vec![
            flattened(1, "2019-07-02T12:28:10Z", "2019-07-02T14:28:12Z", LogStatus::Accepted, (1, "Task 1")),
            flattened(2, "2019-07-04T16:59:00Z", "2019-07-04T18:03:08Z", LogStatus::Pending, (1, "Task 1")),
            flattened(3, "2019-07-08T06:48:00Z", "2019-07-08T09:37:22Z", LogStatus::Accepted, (2, "Task 2")),
        ]
    }

    #[test]
    fn reverses_tasks_into_flat_logs() {
        let cal = Calendar::utc();
        assert_eq!(cal.reverse_task_data(&tasks()), reversed_logs());
        assert!(cal.reverse_task_data(&[]).is_empty());
    }

    #[test]
    fn text_dates_are_normalized_when_flattening() {
        let cal = Calendar::utc();
        let task = Task::new(
            5,
            "Text",
            vec![Log::new(9, "2019-07-08T06:48:00Z", "abc", LogStatus::Active)],
        );
        let flat = cal.reverse_task_data(&[task]);
        assert_eq!(flat[0].start, to_date("2019-07-08T06:48:00Z"));
        assert!(!flat[0].end.is_valid());
    }

    #[test]
    fn collects_all_dates_in_order() {
        let cal = Calendar::utc();
        let all = cal.get_all_dates_from_tasks(&tasks());
        assert_eq!(all.len(), 6);
        assert_eq!(all[0], to_date("2019-07-02T12:28:10Z"));
        assert_eq!(all[1], to_date("2019-07-02T14:28:12Z"));
        assert_eq!(all[5], to_date("2019-07-08T09:37:22Z"));
    }

    #[test]
    fn blank_dates_are_dropped() {
        let cal = Calendar::utc();
        let task = Task::new(1, "Blank", vec![Log::new(1, "", "2019-07-08T06:48:00Z", LogStatus::Pending)]);
        assert_eq!(cal.get_all_dates_from_tasks(&[task]), vec![to_date("2019-07-08T06:48:00Z")]);
    }

    #[test]
    fn filters_logs_by_day() {
        let cal = Calendar::utc();
        let expected = reversed_logs();
        let tasks = tasks();

        assert_eq!(
            cal.get_reversed_logs_for_date(&tasks, "2019-07-02T12:28:10Z"),
            vec![expected[0].clone()]
        );
        assert_eq!(
            cal.get_reversed_logs_for_date(&tasks, at("2019-07-04T16:59:00Z")),
            vec![expected[1].clone()]
        );
        assert_eq!(
            cal.get_reversed_logs_for_date(&tasks, "2019-07-08T06:48:00Z"),
            vec![expected[2].clone()]
        );
        assert!(cal.get_reversed_logs_for_date(&tasks, "1991-07-08T06:48:00Z").is_empty());
        assert!(cal.get_reversed_logs_for_date(&tasks, "abc").is_empty());
    }

    #[test]
    fn time_difference_is_signed_whole_minutes() {
        let a = to_date("2019-07-08T09:37:22Z");
        let b = to_date("2019-07-08T06:48:00Z");
        assert_eq!(count_time_difference(a, b), Some(169));
        assert_eq!(count_time_difference(b, a), Some(-169));
        assert_eq!(count_time_difference(a, Moment::Invalid), None);
    }

    #[test]
    fn log_time_skips_warnings() {
        let mut logs = reversed_logs();
        // 120 + 64 + 169
        assert_eq!(count_log_time(&logs), 353);

        logs[2].status = LogStatus::Warning;
        assert_eq!(count_log_time(&logs), 184);
        assert_eq!(count_log_time(&[]), 0);
    }

    #[test]
    fn malformed_ranges_add_nothing() {
        let start = Utc.with_ymd_and_hms(2019, 7, 8, 10, 0, 0).single().expect("valid");
        let end = Utc.with_ymd_and_hms(2019, 7, 8, 9, 0, 0).single().expect("valid");
        let logs = vec![
            FlattenedLog {
                id: 1,
                start: Moment::At(start),
                end: Moment::At(end),
                status: LogStatus::Accepted,
                task: TaskRef { id: 1, name: "x".to_string() },
            },
            FlattenedLog {
                id: 2,
                start: Moment::Invalid,
                end: Moment::At(end),
                status: LogStatus::Accepted,
                task: TaskRef { id: 1, name: "x".to_string() },
            },
        ];
        assert_eq!(count_log_time(&logs), 0);
    }
}
