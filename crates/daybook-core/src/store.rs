use chrono::NaiveDate;
use tracing::{debug, info};

use crate::datetime::tasks_for_date;
use crate::error::{DaybookError, DaybookResult};
use crate::task::{Task, TaskId};

/// Ordered task list. Insertion order is display order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TaskStore {
    tasks: Vec<Task>,
}

impl TaskStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_tasks(tasks: Vec<Task>) -> Self {
        Self { tasks }
    }

    /// Demonstration data used when nothing has been stored yet.
    pub fn seeded(today: NaiveDate) -> Self {
        let fixed = |y, m, d| NaiveDate::from_ymd_opt(y, m, d);
        let mut report = Task::new_pending("Finish work report".to_string(), fixed(2023, 10, 15));
        report.completed = true;

        Self::from_tasks(vec![
            Task::new_pending("Buy groceries".to_string(), None),
            report,
            Task::new_pending("Exercise for 30 minutes".to_string(), Some(today)),
            Task::new_pending("Call a friend".to_string(), None),
            Task::new_pending("Read a book chapter".to_string(), fixed(2023, 10, 20)),
        ])
    }

    pub fn tasks(&self) -> &[Task] {
        &self.tasks
    }

    pub fn len(&self) -> usize {
        self.tasks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tasks.is_empty()
    }

    pub fn get(&self, id: TaskId) -> Option<&Task> {
        self.tasks.iter().find(|t| t.id == id)
    }

    /// 0-based store position of `id`.
    pub fn position(&self, id: TaskId) -> Option<usize> {
        self.tasks.iter().position(|t| t.id == id)
    }

    pub fn id_at(&self, index: usize) -> DaybookResult<TaskId> {
        self.tasks
            .get(index)
            .map(|t| t.id)
            .ok_or(DaybookError::IndexOutOfRange {
                index,
                len: self.tasks.len(),
            })
    }

    #[tracing::instrument(skip(self, text))]
    pub fn add_task(&mut self, text: &str, due_date: Option<NaiveDate>) -> DaybookResult<TaskId> {
        let trimmed = text.trim();
        if trimmed.is_empty() {
            return Err(DaybookError::Validation(
                "task text cannot be empty".to_string(),
            ));
        }

        let task = Task::new_pending(trimmed.to_string(), due_date);
        let id = task.id;
        self.tasks.push(task);
        debug!(%id, count = self.tasks.len(), "task appended");
        Ok(id)
    }

    /// Flips `completed` and returns the new value.
    #[tracing::instrument(skip(self))]
    pub fn toggle_complete(&mut self, id: TaskId) -> DaybookResult<bool> {
        let task = self
            .tasks
            .iter_mut()
            .find(|t| t.id == id)
            .ok_or(DaybookError::TaskNotFound(id))?;
        task.completed = !task.completed;
        debug!(completed = task.completed, "toggled task");
        Ok(task.completed)
    }

    #[tracing::instrument(skip(self))]
    pub fn delete_task(&mut self, id: TaskId) -> DaybookResult<Task> {
        let idx = self.position(id).ok_or(DaybookError::TaskNotFound(id))?;
        let removed = self.tasks.remove(idx);
        info!(position = idx, remaining = self.tasks.len(), "deleted task");
        Ok(removed)
    }

    pub fn tasks_for_date(&self, date: NaiveDate) -> Vec<&Task> {
        tasks_for_date(&self.tasks, date)
    }
}
