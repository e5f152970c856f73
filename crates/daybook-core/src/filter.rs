use chrono::NaiveDate;
use serde::{
  Deserialize,
  Serialize
};
use tracing::debug;

use crate::datetime::format_date;
use crate::store::TaskStore;
use crate::views::{
  TaskRow,
  rows_for
};

pub const ALL_TASKS_TITLE: &str =
  "All Tasks";

/// Calendar selection. A date is only
/// ever selected while it has pending
/// tasks.
#[derive(
  Debug,
  Clone,
  Copy,
  Default,
  PartialEq,
  Eq,
  Serialize,
  Deserialize,
)]
pub struct FilterState {
  selected: Option<NaiveDate>
}

impl FilterState {
  pub fn selected(
    &self
  ) -> Option<NaiveDate> {
    self.selected
  }

  pub fn is_filtered(&self) -> bool {
    self.selected.is_some()
  }

  /// Selects `date` when it has at
  /// least one pending task; returns
  /// whether the selection changed.
  #[tracing::instrument(skip(
    self, store
  ))]
  pub fn select(
    &mut self,
    store: &TaskStore,
    date: NaiveDate
  ) -> bool {
    if store
      .tasks_for_date(date)
      .is_empty()
    {
      debug!(
        "day has no pending tasks; \
         ignoring selection"
      );
      return false;
    }
    self.selected = Some(date);
    true
  }

  pub fn clear(&mut self) {
    self.selected = None;
  }
}

#[derive(
  Debug, Clone, PartialEq, Eq,
)]
pub struct FilteredPanel {
  pub title:         String,
  pub tasks:         Vec<TaskRow>,
  pub show_all_link: bool
}

impl FilteredPanel {
  /// Re-runs the date query on every
  /// call, so positions stay valid
  /// after deletes.
  pub fn derive(
    store: &TaskStore,
    filter: &FilterState,
    today: NaiveDate
  ) -> Self {
    match filter.selected() {
      | Some(date) => Self {
        title:         format!(
          "Tasks for {}",
          format_date(Some(date))
        ),
        tasks:         rows_for(
          store,
          store.tasks_for_date(date),
          today
        ),
        show_all_link: true
      },
      | None => Self {
        title:         ALL_TASKS_TITLE
          .to_string(),
        tasks:         rows_for(
          store,
          store.tasks(),
          today
        ),
        show_all_link: false
      }
    }
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::datetime::parse_date_key;

  fn date(raw: &str) -> NaiveDate {
    parse_date_key(raw)
      .expect("valid date")
  }

  fn sample_store() -> TaskStore {
    let mut store = TaskStore::new();
    let day = date("2023-10-20");
    store
      .add_task("Read", Some(day))
      .expect("add");
    let write = store
      .add_task("Write", Some(day))
      .expect("add");
    store
      .toggle_complete(write)
      .expect("toggle");
    store
      .add_task("Loose end", None)
      .expect("add");
    store
  }

  #[test]
  fn unfiltered_panel_lists_everything() {
    let store = sample_store();
    let panel = FilteredPanel::derive(
      &store,
      &FilterState::default(),
      date("2023-10-01")
    );
    assert_eq!(panel.title, "All Tasks");
    assert_eq!(panel.tasks.len(), 3);
    assert!(panel.tasks[1].completed);
    assert!(!panel.show_all_link);
  }

  #[test]
  fn filtered_panel_shows_only_pending_tasks_for_day(
  ) {
    let store = sample_store();
    let mut filter =
      FilterState::default();
    assert!(filter.select(
      &store,
      date("2023-10-20")
    ));

    let panel = FilteredPanel::derive(
      &store,
      &filter,
      date("2023-10-01")
    );
    assert_eq!(
      panel.title,
      "Tasks for Oct 20, 2023"
    );
    assert_eq!(panel.tasks.len(), 1);
    assert_eq!(panel.tasks[0].text, "Read");
    assert_eq!(panel.tasks[0].position, 1);
    assert!(panel.show_all_link);

    filter.clear();
    assert!(!filter.is_filtered());
  }

  #[test]
  fn selecting_an_empty_day_is_a_no_op() {
    let store = sample_store();
    let mut filter =
      FilterState::default();
    assert!(!filter.select(
      &store,
      date("2023-10-21")
    ));
    assert!(!filter.is_filtered());

    assert!(filter.select(
      &store,
      date("2023-10-20")
    ));
    assert!(!filter.select(
      &store,
      date("2023-10-22")
    ));
    assert_eq!(
      filter.selected(),
      Some(date("2023-10-20"))
    );
  }
}
