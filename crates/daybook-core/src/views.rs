use chrono::NaiveDate;

use crate::datetime::{
  format_date,
  is_overdue
};
use crate::store::TaskStore;
use crate::task::{
  Task,
  TaskId
};

/// A task as the render layer sees
/// it. `position` is the 1-based store
/// position, which is what front ends
/// display and accept back.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TaskRow {
  pub id:        TaskId,
  pub position:  usize,
  pub text:      String,
  pub completed: bool,
  pub due_label: String,
  pub overdue:   bool
}

impl TaskRow {
  pub fn from_task(
    task: &Task,
    position: usize,
    today: NaiveDate
  ) -> Self {
    Self {
      id: task.id,
      position,
      text: task.text.clone(),
      completed: task.completed,
      due_label: format_date(
        task.due_date
      ),
      overdue: is_overdue(task, today)
    }
  }
}

#[derive(
  Debug, Clone, Default, PartialEq, Eq,
)]
pub struct ListView {
  pub dated:   Vec<TaskRow>,
  pub undated: Vec<TaskRow>
}

impl ListView {
  #[tracing::instrument(skip(
    store, today
  ))]
  pub fn derive(
    store: &TaskStore,
    today: NaiveDate
  ) -> Self {
    let mut view = Self::default();
    for (idx, task) in
      store.tasks().iter().enumerate()
    {
      let row = TaskRow::from_task(
        task,
        idx + 1,
        today
      );
      if task.due_date.is_some() {
        view.dated.push(row);
      } else {
        view.undated.push(row);
      }
    }
    tracing::trace!(
      dated = view.dated.len(),
      undated = view.undated.len(),
      "derived list view"
    );
    view
  }

  /// The undated section is hidden
  /// entirely when it has no rows.
  pub fn show_undated(&self) -> bool {
    !self.undated.is_empty()
  }
}

/// Rows for an arbitrary subset of the
/// store, with positions resolved
/// against the full store.
pub fn rows_for<'a, I>(
  store: &TaskStore,
  tasks: I,
  today: NaiveDate
) -> Vec<TaskRow>
where
  I: IntoIterator<Item = &'a Task>
{
  tasks
    .into_iter()
    .filter_map(|task| {
      store.position(task.id).map(
        |idx| {
          TaskRow::from_task(
            task,
            idx + 1,
            today
          )
        }
      )
    })
    .collect()
}
