use std::fs;
use std::path::Path;

use anyhow::Context;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::datetime::{Calendar, FlexDate};
use crate::task::{FlattenedLog, Log, LogStatus, Task};

/// In-memory copy of the task resource.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TaskBook {
    tasks: Vec<Task>,
}

/// A log as entered in the scheduler form. The task is named, not
/// referenced by id; a missing `id` means a new log.
#[derive(Debug, Clone, PartialEq)]
pub struct LogDraft {
    pub id: Option<u64>,
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
    pub status: LogStatus,
    pub task: String,
}

impl LogDraft {
    fn into_log(self, id: u64) -> Log {
        Log {
            id,
            start: FlexDate::Instant(self.start),
            end: FlexDate::Instant(self.end),
            status: self.status,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SaveOutcome {
    Updated(u64),
    Created(u64),
}

impl TaskBook {
    pub fn new(tasks: Vec<Task>) -> Self {
        Self { tasks }
    }

    #[tracing::instrument(skip_all)]
    pub fn from_json(raw: &str) -> anyhow::Result<Self> {
        let tasks: Vec<Task> = serde_json::from_str(raw).context("failed to parse task list")?;
        debug!(tasks = tasks.len(), "parsed task list");
        Ok(Self { tasks })
    }

    #[tracing::instrument(skip(path), fields(path = %path.display()))]
    pub fn load(path: &Path) -> anyhow::Result<Self> {
        let raw = fs::read_to_string(path).with_context(|| format!("failed to read {}", path.display()))?;
        let book = Self::from_json(&raw).with_context(|| format!("invalid task file {}", path.display()))?;
        info!(tasks = book.tasks.len(), "loaded tasks");
        Ok(book)
    }

    pub fn tasks(&self) -> &[Task] {
        &self.tasks
    }

    pub fn logs(&self, calendar: &Calendar) -> Vec<FlattenedLog> {
        calendar.reverse_task_data(&self.tasks)
    }

    /// One past the highest log id in any task.
    pub fn next_log_id(&self) -> u64 {
        self.tasks
            .iter()
            .flat_map(|task| task.logs.iter())
            .map(|log| log.id)
            .max()
            .unwrap_or(0)
            + 1
    }

    fn next_task_id(&self) -> u64 {
        self.tasks.iter().map(|task| task.id).max().unwrap_or(0) + 1
    }

    /// Saves a draft under its named task. A draft id held by another
    /// task moves that log, so ids stay unique across the book.
    #[tracing::instrument(skip(self, draft), fields(task = %draft.task, id = ?draft.id))]
    pub fn save(&mut self, draft: LogDraft) -> SaveOutcome {
        let fresh_id = self.next_log_id();

        if let Some(id) = draft.id
            && let Some(owner) = self
                .tasks
                .iter_mut()
                .find(|task| task.name != draft.task && task.logs.iter().any(|log| log.id == id))
        {
            debug!(log = id, from = owner.id, "moving log to another task");
            owner.logs.retain(|log| log.id != id);
        }

        if let Some(task) = self.tasks.iter_mut().find(|task| task.name == draft.task) {
            let existing = draft
                .id
                .and_then(|id| task.logs.iter().position(|log| log.id == id));
            let id = draft.id.unwrap_or(fresh_id);
            let log = draft.into_log(id);
            match existing {
                Some(idx) => {
                    debug!(log = log.id, "replacing log");
                    task.logs[idx] = log;
                }
                None => {
                    debug!(log = log.id, "appending log");
                    task.logs.push(log);
                }
            }
            return SaveOutcome::Updated(task.id);
        }

        let task_id = self.next_task_id();
        let log_id = draft.id.unwrap_or(fresh_id);
        let name = draft.task.clone();
        debug!(task = task_id, log = log_id, "creating task");
        self.tasks.push(Task::new(task_id, name, vec![draft.into_log(log_id)]));
        SaveOutcome::Created(task_id)
    }

    /// Removes a log from whichever task holds it and returns that task's id.
    #[tracing::instrument(skip(self))]
    pub fn remove_log(&mut self, id: u64) -> Option<u64> {
        let task = self
            .tasks
            .iter_mut()
            .find(|task| task.logs.iter().any(|log| log.id == id))?;
        task.logs.retain(|log| log.id != id);
        debug!(task = task.id, "removed log");
        Some(task.id)
    }
}

#[cfg(test)]
mod tests {
    use chrono::{TimeZone, Utc};

    use super::{LogDraft, SaveOutcome, TaskBook};
    use crate::datetime::{Calendar, FlexDate};
    use crate::logs::count_log_time;
    use crate::task::LogStatus;

    const TASKS: &str = r#"[
        {"id": 1, "name": "Task 1", "logs": [
            {"id": 1, "start": "2019-07-02T12:28:10Z", "end": "2019-07-02T14:28:12Z", "status": "accepted"},
            {"id": 4, "start": "2019-07-04T16:59:00Z", "end": "2019-07-04T18:03:08Z", "status": "pending"}
        ]},
        {"id": 2, "name": "Task 2", "logs": [
            {"id": 3, "start": "2019-07-08T06:48:00Z", "end": "2019-07-08T09:37:22Z", "status": "accepted"}
        ]}
    ]"#;

    fn draft(id: Option<u64>, task: &str) -> LogDraft {
        LogDraft {
            id,
            start: Utc.with_ymd_and_hms(2019, 7, 9, 8, 0, 0).single().expect("valid"),
            end: Utc.with_ymd_and_hms(2019, 7, 9, 9, 30, 0).single().expect("valid"),
            status: LogStatus::Active,
            task: task.to_string(),
        }
    }

    #[test]
    fn next_log_id_is_one_past_the_maximum() {
        let book = TaskBook::from_json(TASKS).expect("parse");
        assert_eq!(book.next_log_id(), 5);
        assert_eq!(TaskBook::default().next_log_id(), 1);
    }

    #[test]
    fn new_logs_join_the_named_task() {
        let mut book = TaskBook::from_json(TASKS).expect("parse");
        assert_eq!(book.save(draft(None, "Task 2")), SaveOutcome::Updated(2));

        let task = &book.tasks()[1];
        assert_eq!(task.logs.len(), 2);
        assert_eq!(task.logs[1].id, 5);
        assert_eq!(task.logs[1].status, LogStatus::Active);
    }

    #[test]
    fn drafts_with_an_id_replace_the_log() {
        let mut book = TaskBook::from_json(TASKS).expect("parse");
        assert_eq!(book.save(draft(Some(4), "Task 1")), SaveOutcome::Updated(1));

        let task = &book.tasks()[0];
        assert_eq!(task.logs.len(), 2);
        assert_eq!(task.logs[1].id, 4);
        assert_eq!(task.logs[1].start, FlexDate::Instant(draft(None, "").start));
    }

    #[test]
    fn unknown_task_names_create_a_task() {
        let mut book = TaskBook::from_json(TASKS).expect("parse");
        assert_eq!(book.save(draft(None, "Task 3")), SaveOutcome::Created(3));

        let created = &book.tasks()[2];
        assert_eq!(created.name, "Task 3");
        assert_eq!(created.logs.len(), 1);
        assert_eq!(created.logs[0].id, 5);
    }

    #[test]
    fn drafts_naming_another_task_move_the_log() {
        let mut book = TaskBook::from_json(TASKS).expect("parse");
        assert_eq!(book.save(draft(Some(3), "Task 1")), SaveOutcome::Updated(1));

        assert!(book.tasks()[1].logs.is_empty());
        let ids: Vec<u64> = book.tasks()[0].logs.iter().map(|log| log.id).collect();
        assert_eq!(ids, vec![1, 4, 3]);

        assert_eq!(book.save(draft(Some(1), "Task 3")), SaveOutcome::Created(3));
        assert_eq!(book.tasks()[0].logs.len(), 2);
        assert_eq!(book.tasks()[2].logs[0].id, 1);
        assert_eq!(book.logs(&Calendar::utc()).len(), 3);
    }

    #[test]
    fn missing_end_dates_are_dropped_and_add_no_time() {
        let book = TaskBook::from_json(
            r#"[{"id": 1, "name": "Task 1", "logs": [
                {"id": 1, "start": "2019-07-02T12:00:00Z", "end": null, "status": "active"}
            ]}]"#,
        )
        .expect("parse");
        let cal = Calendar::utc();

        assert_eq!(cal.get_all_dates_from_tasks(book.tasks()).len(), 1);
        let logs = book.logs(&cal);
        assert!(!logs[0].end.is_valid());
        assert_eq!(count_log_time(&logs), 0);
    }

    #[test]
    fn removing_a_log_reports_its_task() {
        let mut book = TaskBook::from_json(TASKS).expect("parse");
        assert_eq!(book.remove_log(3), Some(2));
        assert!(book.tasks()[1].logs.is_empty());
        assert_eq!(book.remove_log(3), None);
        assert_eq!(book.logs(&Calendar::utc()).len(), 2);
    }

    #[test]
    fn malformed_json_is_an_error() {
        let err = TaskBook::from_json("{").expect_err("not a list");
        assert!(err.to_string().contains("failed to parse task list"));
    }

    #[test]
    fn load_reads_task_files() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("tasks.json");
        std::fs::write(&path, TASKS).expect("write tasks");

        let book = TaskBook::load(&path).expect("load");
        assert_eq!(book.tasks().len(), 2);
        assert!(TaskBook::load(&dir.path().join("missing.json")).is_err());
    }
}
