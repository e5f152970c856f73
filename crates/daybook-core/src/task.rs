use std::fmt;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::datetime::date_key_serde;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(transparent)]
pub struct TaskId(Uuid);

impl TaskId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for TaskId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for TaskId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

/// One entry of the task list.
///
/// The serialized form keeps the field names of the stored `todoTasks`
/// blob, so snapshots written without an `id` still load; they get a
/// fresh id.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct Task {
    #[serde(default)]
    pub id: TaskId,

    pub text: String,

    #[serde(default)]
    pub completed: bool,

    #[serde(default, with = "date_key_serde::option")]
    pub due_date: Option<NaiveDate>,
}

impl Task {
    pub fn new_pending(text: String, due_date: Option<NaiveDate>) -> Self {
        Self {
            id: TaskId::new(),
            text,
            completed: false,
            due_date,
        }
    }

    pub fn is_due_on(&self, date: NaiveDate) -> bool {
        self.due_date == Some(date)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn legacy_blob_without_id_gets_one() {
        let raw = r#"{"text":"Read","completed":false,"dueDate":"2023-10-20"}"#;
        let task: Task = serde_json::from_str(raw).expect("parse legacy task");
        assert_eq!(task.text, "Read");
        assert_eq!(task.due_date, NaiveDate::from_ymd_opt(2023, 10, 20));

        let raw = r#"{"text":"Call","completed":true,"dueDate":null}"#;
        let other: Task = serde_json::from_str(raw).expect("parse legacy task");
        assert!(other.completed);
        assert_eq!(other.due_date, None);
        assert_ne!(task.id, other.id);
    }

    #[test]
    fn serializes_due_date_as_plain_key() {
        let task = Task::new_pending(
            "Report".to_string(),
            NaiveDate::from_ymd_opt(2023, 10, 15),
        );
        let value = serde_json::to_value(&task).expect("serialize task");
        assert_eq!(value["dueDate"], "2023-10-15");
        assert_eq!(value["completed"], false);
    }
}
