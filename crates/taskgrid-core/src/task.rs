use std::fmt;

use serde::{Deserialize, Serialize};

use crate::datetime::{FlexDate, Moment};

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum LogStatus {
    Accepted,
    Pending,
    Warning,
    Active,
}

impl LogStatus {
    pub const ALL: [LogStatus; 4] = [
        LogStatus::Accepted,
        LogStatus::Warning,
        LogStatus::Active,
        LogStatus::Pending,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            LogStatus::Accepted => "accepted",
            LogStatus::Pending => "pending",
            LogStatus::Warning => "warning",
            LogStatus::Active => "active",
        }
    }

    pub fn icon(self) -> &'static str {
        match self {
            LogStatus::Accepted | LogStatus::Active => "check-circle",
            LogStatus::Pending => "clock",
            LogStatus::Warning => "alert",
        }
    }

    /// Warning logs mark void time and never count toward totals.
    pub fn counts_toward_total(self) -> bool {
        self != LogStatus::Warning
    }
}

impl fmt::Display for LogStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Log {
    pub id: u64,
    #[serde(default)]
    pub start: FlexDate,
    #[serde(default)]
    pub end: FlexDate,
    pub status: LogStatus,
}

impl Log {
    pub fn new(
        id: u64,
        start: impl Into<FlexDate>,
        end: impl Into<FlexDate>,
        status: LogStatus,
    ) -> Self {
        Self {
            id,
            start: start.into(),
            end: end.into(),
            status,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Task {
    pub id: u64,
    pub name: String,

    #[serde(default)]
    pub logs: Vec<Log>,
}

impl Task {
    pub fn new(id: u64, name: impl Into<String>, logs: Vec<Log>) -> Self {
        Self {
            id,
            name: name.into(),
            logs,
        }
    }

    pub fn to_ref(&self) -> TaskRef {
        TaskRef {
            id: self.id,
            name: self.name.clone(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TaskRef {
    pub id: u64,
    pub name: String,
}

/// A log detached from its task, carrying only a reference back to it.
#[derive(Debug, Clone, PartialEq)]
pub struct FlattenedLog {
    pub id: u64,
    pub start: Moment,
    pub end: Moment,
    pub status: LogStatus,
    pub task: TaskRef,
}
