use chrono::{
  Datelike,
  NaiveDate
};
use serde::{
  Deserialize,
  Serialize
};

use crate::datetime::{
  days_in_month,
  first_weekday,
  format_month_label,
  is_overdue,
  shift_month
};
use crate::store::TaskStore;

/// Six fixed rows of seven days.
pub const GRID_CELLS: usize = 42;

/// The year and month shown by the
/// calendar view.
#[derive(
  Debug,
  Clone,
  Copy,
  PartialEq,
  Eq,
  Serialize,
  Deserialize,
)]
#[serde(try_from = "RawCursor")]
pub struct MonthCursor {
  pub year:  i32,
  pub month: u32
}

#[derive(Deserialize)]
struct RawCursor {
  year:  i32,
  month: u32
}

impl TryFrom<RawCursor> for MonthCursor {
  type Error = String;

  fn try_from(
    raw: RawCursor
  ) -> Result<Self, Self::Error> {
    if !(1..=12).contains(&raw.month) {
      return Err(format!(
        "month out of range: {}",
        raw.month
      ));
    }
    Ok(Self {
      year:  raw.year,
      month: raw.month
    })
  }
}

impl MonthCursor {
  #[must_use]
  pub fn new(
    year: i32,
    month: u32
  ) -> Self {
    Self {
      year,
      month: month.clamp(1, 12)
    }
  }

  #[must_use]
  pub fn containing(
    date: NaiveDate
  ) -> Self {
    Self::new(date.year(), date.month())
  }

  #[must_use]
  pub fn prev(self) -> Self {
    self.shifted(-1)
  }

  #[must_use]
  pub fn next(self) -> Self {
    self.shifted(1)
  }

  fn shifted(self, months: i32) -> Self {
    let (year, month) = shift_month(
      self.year, self.month, months
    );
    Self { year, month }
  }

  /// `"October 2023"`.
  pub fn label(&self) -> String {
    format_month_label(
      self.year, self.month
    )
  }
}

#[derive(
  Debug, Clone, PartialEq, Eq,
)]
pub struct DayCell {
  pub date:    NaiveDate,
  pub day:     u32,
  pub count:   usize,
  pub overdue: bool,
  pub today:   bool
}

impl DayCell {
  pub fn has_tasks(&self) -> bool {
    self.count > 0
  }
}

#[derive(
  Debug, Clone, PartialEq, Eq,
)]
pub enum CalendarCell {
  /// Blank padding before the 1st or
  /// after the last day.
  Padding,
  Day(DayCell)
}

#[derive(
  Debug, Clone, PartialEq, Eq,
)]
pub struct CalendarGrid {
  pub cursor: MonthCursor,
  pub label:  String,
  pub cells:  Vec<CalendarCell>
}

impl CalendarGrid {
  #[tracing::instrument(skip(
    store, today
  ))]
  pub fn derive(
    store: &TaskStore,
    cursor: MonthCursor,
    today: NaiveDate
  ) -> Self {
    let lead = first_weekday(
      cursor.year,
      cursor.month
    ) as usize;
    let days = days_in_month(
      cursor.year,
      cursor.month
    );

    let mut cells =
      Vec::with_capacity(GRID_CELLS);
    cells.extend(
      std::iter::repeat_n(
        CalendarCell::Padding,
        lead
      )
    );

    for day in 1..=days {
      let Some(date) =
        NaiveDate::from_ymd_opt(
          cursor.year,
          cursor.month,
          day
        )
      else {
        continue;
      };
      let day_tasks =
        store.tasks_for_date(date);
      // The first pending task stands
      // for the whole day.
      let overdue = day_tasks
        .first()
        .is_some_and(|task| {
          is_overdue(task, today)
        });
      cells.push(CalendarCell::Day(
        DayCell {
          date,
          day,
          count: day_tasks.len(),
          overdue,
          today: date == today
        }
      ));
    }

    while cells.len() < GRID_CELLS {
      cells.push(CalendarCell::Padding);
    }

    tracing::trace!(
      lead,
      days,
      "derived calendar grid"
    );
    Self {
      cursor,
      label: cursor.label(),
      cells
    }
  }

  pub fn day_cells(
    &self
  ) -> impl Iterator<Item = &DayCell> {
    self.cells.iter().filter_map(
      |cell| match cell {
        | CalendarCell::Day(day) => {
          Some(day)
        }
        | CalendarCell::Padding => None
      }
    )
  }

  pub fn day(
    &self,
    date: NaiveDate
  ) -> Option<&DayCell> {
    self
      .day_cells()
      .find(|cell| cell.date == date)
  }

  pub fn leading_padding(&self) -> usize {
    self
      .cells
      .iter()
      .take_while(|cell| {
        matches!(
          cell,
          CalendarCell::Padding
        )
      })
      .count()
  }
}
