use chrono::NaiveDate;
use serde::{
  Deserialize,
  Serialize
};
use tracing::{
  debug,
  info,
  warn
};

use crate::calendar::{
  CalendarGrid,
  MonthCursor
};
use crate::error::{
  DaybookError,
  DaybookResult
};
use crate::filter::{
  FilterState,
  FilteredPanel
};
use crate::persistence::TaskGateway;
use crate::store::TaskStore;
use crate::task::TaskId;
use crate::views::ListView;

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
#[serde(rename_all = "lowercase")]
pub enum ViewMode {
  #[default]
  List,
  Calendar
}

/// Views a command invalidated. The
/// render layer re-derives exactly
/// these.
#[derive(
  Debug,
  Clone,
  Copy,
  Default,
  PartialEq,
  Eq,
)]
pub struct Refresh {
  pub list:     bool,
  pub calendar: bool,
  pub panel:    bool
}

impl Refresh {
  pub const ALL: Self = Self {
    list:     true,
    calendar: true,
    panel:    true
  };
  pub const NONE: Self = Self {
    list:     false,
    calendar: false,
    panel:    false
  };

  pub fn is_empty(&self) -> bool {
    *self == Self::NONE
  }
}

/// Owns every piece of mutable state:
/// tasks, calendar cursor, selection
/// and the active view. Derivations
/// are pure functions of that state
/// and `today`.
#[derive(Debug)]
pub struct Planner<G: TaskGateway> {
  store:   TaskStore,
  filter:  FilterState,
  cursor:  MonthCursor,
  view:    ViewMode,
  gateway: G
}

impl<G: TaskGateway> Planner<G> {
  pub fn new(
    store: TaskStore,
    gateway: G,
    cursor: MonthCursor
  ) -> Self {
    Self {
      store,
      filter: FilterState::default(),
      cursor,
      view: ViewMode::default(),
      gateway
    }
  }

  pub fn store(&self) -> &TaskStore {
    &self.store
  }

  pub fn filter(&self) -> &FilterState {
    &self.filter
  }

  pub fn cursor(&self) -> MonthCursor {
    self.cursor
  }

  pub fn view(&self) -> ViewMode {
    self.view
  }

  pub fn gateway(&self) -> &G {
    &self.gateway
  }

  /// Restores view mode, cursor and
  /// selection saved by an earlier
  /// session. A selection whose day no
  /// longer has pending tasks, or one
  /// made outside the calendar view, is
  /// dropped.
  #[tracing::instrument(skip(self))]
  pub fn restore(
    &mut self,
    view: ViewMode,
    cursor: MonthCursor,
    selected: Option<NaiveDate>
  ) {
    self.view = view;
    self.cursor = cursor;
    self.filter.clear();
    if let Some(date) = selected
      && view == ViewMode::Calendar
      && !self
        .filter
        .select(&self.store, date)
    {
      warn!(%date, "dropping stale calendar selection");
    }
  }

  #[tracing::instrument(skip(
    self, text
  ))]
  pub fn add_task(
    &mut self,
    text: &str,
    due_date: Option<NaiveDate>
  ) -> DaybookResult<(TaskId, Refresh)>
  {
    let id = self.mutate(|store| {
      store.add_task(text, due_date)
    })?;
    info!(%id, "task added");
    Ok((id, Refresh::ALL))
  }

  #[tracing::instrument(skip(self))]
  pub fn toggle_complete(
    &mut self,
    id: TaskId
  ) -> DaybookResult<(bool, Refresh)> {
    let completed =
      self.mutate(|store| {
        store.toggle_complete(id)
      })?;
    info!(completed, "task toggled");
    Ok((completed, Refresh::ALL))
  }

  #[tracing::instrument(skip(self))]
  pub fn delete_task(
    &mut self,
    id: TaskId
  ) -> DaybookResult<Refresh> {
    self.mutate(|store| {
      store.delete_task(id)
    })?;
    info!("task deleted");
    Ok(Refresh::ALL)
  }

  /// Resolves a 1-based display
  /// position to a task id.
  pub fn id_at_position(
    &self,
    position: usize
  ) -> DaybookResult<TaskId> {
    match position.checked_sub(1) {
      | Some(index) => {
        self.store.id_at(index)
      }
      | None => {
        Err(DaybookError::IndexOutOfRange {
          index: 0,
          len:   self.store.len()
        })
      }
    }
  }

  /// Narrows the panel to `date`. A day
  /// without pending tasks changes
  /// nothing.
  #[tracing::instrument(skip(self))]
  pub fn select_day(
    &mut self,
    date: NaiveDate
  ) -> Refresh {
    if self
      .filter
      .select(&self.store, date)
    {
      Refresh {
        panel: true,
        ..Refresh::NONE
      }
    } else {
      Refresh::NONE
    }
  }

  #[tracing::instrument(skip(self))]
  pub fn show_all(&mut self) -> Refresh {
    self.filter.clear();
    Refresh {
      panel: true,
      ..Refresh::NONE
    }
  }

  #[tracing::instrument(skip(self))]
  pub fn switch_to_list(
    &mut self
  ) -> Refresh {
    self.view = ViewMode::List;
    self.filter.clear();
    Refresh {
      list: true,
      ..Refresh::NONE
    }
  }

  #[tracing::instrument(skip(self))]
  pub fn switch_to_calendar(
    &mut self
  ) -> Refresh {
    self.view = ViewMode::Calendar;
    Refresh {
      calendar: true,
      panel: true,
      ..Refresh::NONE
    }
  }

  /// Moves the cursor straight to
  /// `cursor`; the selection is kept.
  #[tracing::instrument(skip(self))]
  pub fn jump_to(
    &mut self,
    cursor: MonthCursor
  ) -> Refresh {
    self.cursor = cursor;
    Refresh {
      calendar: true,
      panel: true,
      ..Refresh::NONE
    }
  }

  #[tracing::instrument(skip(self))]
  pub fn prev_month(&mut self) -> Refresh {
    self.cursor = self.cursor.prev();
    debug!(cursor = ?self.cursor, "moved to previous month");
    Refresh {
      calendar: true,
      panel: true,
      ..Refresh::NONE
    }
  }

  #[tracing::instrument(skip(self))]
  pub fn next_month(&mut self) -> Refresh {
    self.cursor = self.cursor.next();
    debug!(cursor = ?self.cursor, "moved to next month");
    Refresh {
      calendar: true,
      panel: true,
      ..Refresh::NONE
    }
  }

  pub fn list_view(
    &self,
    today: NaiveDate
  ) -> ListView {
    ListView::derive(&self.store, today)
  }

  pub fn calendar_grid(
    &self,
    today: NaiveDate
  ) -> CalendarGrid {
    CalendarGrid::derive(
      &self.store,
      self.cursor,
      today
    )
  }

  pub fn filtered_panel(
    &self,
    today: NaiveDate
  ) -> FilteredPanel {
    FilteredPanel::derive(
      &self.store,
      &self.filter,
      today
    )
  }

  pub fn month_label(&self) -> String {
    self.cursor.label()
  }

  // Applies `op` to a scratch copy and
  // only commits it once the snapshot
  // has been saved.
  fn mutate<T, F>(
    &mut self,
    op: F
  ) -> DaybookResult<T>
  where
    F: FnOnce(&mut TaskStore) -> DaybookResult<T>
  {
    let mut next = self.store.clone();
    let out = op(&mut next)?;
    self.gateway.save(next.tasks())?;
    self.store = next;
    Ok(out)
  }
}
