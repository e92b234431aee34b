//! Core types for the task board.

use crate::error::{TaskError, TaskResult};
use chrono::{DateTime, NaiveDate, Utc};
use rusqlite::types::{FromSql, FromSqlError, FromSqlResult, ToSql, ToSqlOutput, ValueRef};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// Format used for due dates on the wire and in storage.
pub const DUE_DATE_FORMAT: &str = "%Y-%m-%d";

/// Older clients and databases wrote these status strings.
const LEGACY_STATUS_ALIASES: &[(&str, TaskStatus)] = &[
    ("To Do", TaskStatus::ToDo),
    ("In Progress", TaskStatus::InProgress),
];

/// Error returned when a status string matches no column.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[error("invalid status '{0}': must be ToDo, Ongoing or Done")]
pub struct ParseStatusError(pub String);

/// Status column a task lives in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum TaskStatus {
    ToDo,
    InProgress,
    Done,
}

impl TaskStatus {
    /// Columns in board order.
    pub const ALL: [TaskStatus; 3] = [TaskStatus::ToDo, TaskStatus::InProgress, TaskStatus::Done];

    /// Serialized name used in storage and on the wire.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::ToDo => "ToDo",
            Self::InProgress => "Ongoing",
            Self::Done => "Done",
        }
    }

    /// Decode a stored or wire value, accepting legacy aliases.
    pub fn decode(s: &str) -> Option<Self> {
        match s {
            "ToDo" => Some(Self::ToDo),
            "Ongoing" => Some(Self::InProgress),
            "Done" => Some(Self::Done),
            other => LEGACY_STATUS_ALIASES
                .iter()
                .find(|(alias, _)| *alias == other)
                .map(|(_, status)| *status),
        }
    }

    /// Column heading for human-readable output.
    pub fn label(self) -> &'static str {
        match self {
            Self::ToDo => "To Do",
            Self::InProgress => "In Progress",
            Self::Done => "Done",
        }
    }

    /// Parse user input into a status, reporting a validation error on failure.
    pub fn from_input(s: &str) -> TaskResult<Self> {
        s.parse::<Self>()
            .map_err(|e| TaskError::validation("status", e.to_string()))
    }
}

impl fmt::Display for TaskStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Lenient parse for command-line input: exact wire names, legacy aliases,
/// and case/separator-insensitive spellings such as `to_do` or `in-progress`.
impl FromStr for TaskStatus {
    type Err = ParseStatusError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        if let Some(status) = Self::decode(trimmed) {
            return Ok(status);
        }
        let folded: String = trimmed
            .chars()
            .filter(|c| !matches!(c, ' ' | '_' | '-'))
            .collect::<String>()
            .to_lowercase();
        match folded.as_str() {
            "todo" => Ok(Self::ToDo),
            "ongoing" | "inprogress" => Ok(Self::InProgress),
            "done" => Ok(Self::Done),
            _ => Err(ParseStatusError(s.to_string())),
        }
    }
}

impl Serialize for TaskStatus {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

impl<'de> Deserialize<'de> for TaskStatus {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        Self::decode(&raw).ok_or_else(|| serde::de::Error::custom(ParseStatusError(raw)))
    }
}

impl ToSql for TaskStatus {
    fn to_sql(&self) -> rusqlite::Result<ToSqlOutput<'_>> {
        Ok(ToSqlOutput::from(self.as_str()))
    }
}

impl FromSql for TaskStatus {
    fn column_result(value: ValueRef<'_>) -> FromSqlResult<Self> {
        let raw = value.as_str()?;
        Self::decode(raw).ok_or_else(|| FromSqlError::Other(Box::new(ParseStatusError(raw.to_string()))))
    }
}

/// A task on the board.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Task {
    pub id: i64,
    pub title: String,
    pub description: Option<String>,
    /// Normalized tags, in first-seen order.
    pub tags: Vec<String>,
    pub due_date: Option<NaiveDate>,
    pub status: TaskStatus,
    pub created_at: DateTime<Utc>,
    /// 1-based position within the status column.
    pub order_index: i64,
    /// Set iff status is Done.
    pub done_at: Option<DateTime<Utc>>,
    /// Set while the task is soft-deleted.
    pub deleted_at: Option<DateTime<Utc>>,
    pub urgent: bool,
}

/// Input for creating a task.
#[derive(Debug, Clone, Deserialize)]
pub struct NewTask {
    pub title: String,
    #[serde(default)]
    pub description: Option<String>,
    /// Free-text, comma separated.
    #[serde(default)]
    pub tags: Option<String>,
    #[serde(default)]
    pub due_date: Option<NaiveDate>,
    pub status: TaskStatus,
    #[serde(default)]
    pub urgent: bool,
}

impl NewTask {
    pub fn new(title: impl Into<String>, status: TaskStatus) -> Self {
        Self {
            title: title.into(),
            description: None,
            tags: None,
            due_date: None,
            status,
            urgent: false,
        }
    }

    pub fn with_tags(mut self, tags: impl Into<String>) -> Self {
        self.tags = Some(tags.into());
        self
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    pub fn with_due_date(mut self, due: NaiveDate) -> Self {
        self.due_date = Some(due);
        self
    }

    pub fn urgent(mut self, urgent: bool) -> Self {
        self.urgent = urgent;
        self
    }
}

/// Partial update. Absent fields are left untouched; for the optional
/// fields an explicit `null` clears the stored value.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct TaskPatch {
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default, deserialize_with = "double_option")]
    pub description: Option<Option<String>>,
    #[serde(default, deserialize_with = "double_option")]
    pub tags: Option<Option<String>>,
    #[serde(default, deserialize_with = "double_option")]
    pub due_date: Option<Option<NaiveDate>>,
    #[serde(default)]
    pub status: Option<TaskStatus>,
    #[serde(default)]
    pub urgent: Option<bool>,
}

impl TaskPatch {
    pub fn is_empty(&self) -> bool {
        self.title.is_none()
            && self.description.is_none()
            && self.tags.is_none()
            && self.due_date.is_none()
            && self.status.is_none()
            && self.urgent.is_none()
    }
}

/// Distinguish a missing field (`None`) from an explicit null (`Some(None)`).
fn double_option<'de, D, T>(deserializer: D) -> Result<Option<Option<T>>, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de>,
{
    Option::<T>::deserialize(deserializer).map(Some)
}

/// Parse a `YYYY-MM-DD` due date.
pub fn parse_due_date(s: &str) -> TaskResult<NaiveDate> {
    NaiveDate::parse_from_str(s.trim(), DUE_DATE_FORMAT).map_err(|_| {
        TaskError::validation("due_date", format!("invalid due date '{}': expected YYYY-MM-DD", s))
    })
}

/// What a delete call did to the task.
#[derive(Debug, Clone, PartialEq)]
pub enum DeleteOutcome {
    /// First delete: the task was soft-deleted and is now archived.
    Archived(Task),
    /// Second delete: the row was removed permanently.
    Removed(Task),
}

impl DeleteOutcome {
    pub fn task(&self) -> &Task {
        match self {
            Self::Archived(task) | Self::Removed(task) => task,
        }
    }

    pub fn into_task(self) -> Task {
        match self {
            Self::Archived(task) | Self::Removed(task) => task,
        }
    }

    pub fn is_removed(&self) -> bool {
        matches!(self, Self::Removed(_))
    }
}
