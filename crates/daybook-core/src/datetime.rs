use chrono::{
  Datelike,
  Local,
  NaiveDate
};
use regex::Regex;

use crate::error::{
  DaybookError,
  DaybookResult
};
use crate::task::Task;

pub const DATE_KEY_FORMAT: &str =
  "%Y-%m-%d";
const DISPLAY_DATE_FORMAT: &str =
  "%b %-d, %Y";
const MONTH_LABEL_FORMAT: &str =
  "%B %Y";

/// The current local calendar date.
#[must_use]
pub fn today() -> NaiveDate {
  Local::now().date_naive()
}

#[must_use]
pub fn date_key(
  date: NaiveDate
) -> String {
  date
    .format(DATE_KEY_FORMAT)
    .to_string()
}

/// Parses a zero-padded `YYYY-MM-DD`
/// key. Unpadded or partial dates are
/// rejected even when chrono would
/// accept them.
pub fn parse_date_key(
  raw: &str
) -> DaybookResult<NaiveDate> {
  let key_re = Regex::new(
    r"^(?P<year>\d{4})-(?P<month>\d{2})-(?P<day>\d{2})$",
  )
  .map_err(|e| {
    DaybookError::InvalidDate(format!(
      "internal regex compile \
       failure: {e}"
    ))
  })?;

  let trimmed = raw.trim();
  let caps = key_re
    .captures(trimmed)
    .ok_or_else(|| {
      DaybookError::InvalidDate(
        format!(
          "expected YYYY-MM-DD, got \
           {trimmed:?}"
        )
      )
    })?;

  let year = caps["year"]
    .parse::<i32>()
    .map_err(|e| {
      DaybookError::InvalidDate(
        e.to_string()
      )
    })?;
  let month = caps["month"]
    .parse::<u32>()
    .map_err(|e| {
      DaybookError::InvalidDate(
        e.to_string()
      )
    })?;
  let day = caps["day"]
    .parse::<u32>()
    .map_err(|e| {
      DaybookError::InvalidDate(
        e.to_string()
      )
    })?;

  NaiveDate::from_ymd_opt(
    year, month, day
  )
  .ok_or_else(|| {
    DaybookError::InvalidDate(format!(
      "{trimmed} is not a calendar \
       date"
    ))
  })
}

/// `"Oct 20, 2023"`; an absent date
/// formats as the empty string.
#[must_use]
pub fn format_date(
  date: Option<NaiveDate>
) -> String {
  date
    .map(|d| {
      d.format(DISPLAY_DATE_FORMAT)
        .to_string()
    })
    .unwrap_or_default()
}

#[must_use]
pub fn format_month_label(
  year: i32,
  month: u32
) -> String {
  first_day_of_month(year, month)
    .map(|d| {
      d.format(MONTH_LABEL_FORMAT)
        .to_string()
    })
    .unwrap_or_default()
}

/// A task is overdue when it is
/// pending and its due date lies
/// strictly before `today`.
#[must_use]
pub fn is_overdue(
  task: &Task,
  today: NaiveDate
) -> bool {
  if task.completed {
    return false;
  }
  task
    .due_date
    .map(|due| due < today)
    .unwrap_or(false)
}

/// Incomplete tasks due on `date`, in
/// store order.
pub fn tasks_for_date<'a, I>(
  tasks: I,
  date: NaiveDate
) -> Vec<&'a Task>
where
  I: IntoIterator<Item = &'a Task>
{
  tasks
    .into_iter()
    .filter(|task| {
      !task.completed
        && task.is_due_on(date)
    })
    .collect()
}

pub fn first_day_of_month(
  year: i32,
  month: u32
) -> Option<NaiveDate> {
  NaiveDate::from_ymd_opt(
    year, month, 1
  )
}

#[must_use]
pub fn days_in_month(
  year: i32,
  month: u32
) -> u32 {
  let (next_year, next_month) =
    if month >= 12 {
      (year.saturating_add(1), 1_u32)
    } else {
      (year, month + 1)
    };
  first_day_of_month(
    next_year, next_month
  )
  .and_then(|d| d.pred_opt())
  .map(|d| d.day())
  .unwrap_or(0)
}

/// Weekday of the first of the month,
/// counted from Sunday = 0.
#[must_use]
pub fn first_weekday(
  year: i32,
  month: u32
) -> u32 {
  first_day_of_month(year, month)
    .map(|d| {
      d.weekday().num_days_from_sunday()
    })
    .unwrap_or(0)
}

/// Moves `(year, month)` by `months`,
/// rolling the year over in both
/// directions.
#[must_use]
pub fn shift_month(
  year: i32,
  month: u32,
  months: i32
) -> (i32, u32) {
  let zero_based = year as i64 * 12
    + (month as i64 - 1)
    + months as i64;
  let new_year =
    zero_based.div_euclid(12) as i32;
  let new_month =
    zero_based.rem_euclid(12) as u32 + 1;
  (new_year, new_month)
}

/// Parses `YYYY-MM`.
pub fn parse_month_key(
  raw: &str
) -> DaybookResult<(i32, u32)> {
  let trimmed = raw.trim();
  let date = parse_date_key(&format!(
    "{trimmed}-01"
  ))
  .map_err(|_| {
    DaybookError::InvalidDate(format!(
      "expected YYYY-MM, got \
       {trimmed:?}"
    ))
  })?;
  Ok((date.year(), date.month()))
}

pub mod date_key_serde {
  pub mod option {
    use chrono::NaiveDate;
    use serde::{
      Deserialize,
      Deserializer,
      Serializer
    };

    pub fn serialize<S>(
      date: &Option<NaiveDate>,
      serializer: S
    ) -> Result<S::Ok, S::Error>
    where
      S: Serializer
    {
      match date {
        | Some(value) => serializer
          .serialize_str(
            &super::super::date_key(
              *value
            )
          ),
        | None => {
          serializer.serialize_none()
        }
      }
    }

    // An empty string is what a blank
    // date input produced; treat it as
    // no due date.
    pub fn deserialize<'de, D>(
      deserializer: D
    ) -> Result<Option<NaiveDate>, D::Error>
    where
      D: Deserializer<'de>
    {
      let raw =
        Option::<String>::deserialize(
          deserializer
        )?;
      match raw {
        | Some(s) if !s.trim().is_empty() => {
          super::super::parse_date_key(&s)
            .map(Some)
            .map_err(
              serde::de::Error::custom
            )
        }
        | _ => Ok(None)
      }
    }
  }
}

#[cfg(test)]
mod tests {
  use chrono::NaiveDate;

  use super::*;

  fn ymd(
    y: i32,
    m: u32,
    d: u32
  ) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d)
      .expect("valid date")
  }

  #[test]
  fn formats_display_dates() {
    assert_eq!(
      format_date(Some(ymd(
        2023, 10, 20
      ))),
      "Oct 20, 2023"
    );
    assert_eq!(
      format_date(Some(ymd(2024, 3, 5))),
      "Mar 5, 2024"
    );
    assert_eq!(format_date(None), "");
    assert_eq!(
      format_month_label(2023, 10),
      "October 2023"
    );
  }

  #[test]
  fn date_keys_must_be_zero_padded() {
    assert_eq!(
      parse_date_key("2023-10-20")
        .expect("valid key"),
      ymd(2023, 10, 20)
    );
    assert!(
      parse_date_key("2023-1-5").is_err()
    );
    assert!(
      parse_date_key("2023-02-30")
        .is_err()
    );
    assert!(
      parse_date_key("2023-10-20T00:00")
        .is_err()
    );
    assert_eq!(
      date_key(ymd(2024, 1, 3)),
      "2024-01-03"
    );
  }

  #[test]
  fn overdue_only_for_pending_past_dates(
  ) {
    let today = ymd(2024, 1, 10);

    let report = Task::new_pending(
      "Report".to_string(),
      Some(ymd(2023, 10, 15))
    );
    assert!(is_overdue(&report, today));

    let mut done = report.clone();
    done.completed = true;
    assert!(!is_overdue(&done, today));

    let undated = Task::new_pending(
      "Someday".to_string(),
      None
    );
    assert!(!is_overdue(&undated, today));

    let due_today = Task::new_pending(
      "Now".to_string(),
      Some(today)
    );
    assert!(!is_overdue(
      &due_today, today
    ));
  }

  #[test]
  fn tasks_for_date_skips_completed() {
    let date = ymd(2023, 10, 20);
    let read = Task::new_pending(
      "Read".to_string(),
      Some(date)
    );
    let mut write = Task::new_pending(
      "Write".to_string(),
      Some(date)
    );
    write.completed = true;
    let other = Task::new_pending(
      "Other".to_string(),
      Some(ymd(2023, 10, 21))
    );
    let tasks = vec![read, write, other];

    let found =
      tasks_for_date(&tasks, date);
    assert_eq!(found.len(), 1);
    assert_eq!(found[0].text, "Read");
    assert!(!found[0].completed);
  }

  #[test]
  fn month_arithmetic_rolls_years() {
    assert_eq!(
      shift_month(2023, 12, 1),
      (2024, 1)
    );
    assert_eq!(
      shift_month(2024, 1, -1),
      (2023, 12)
    );
    assert_eq!(
      shift_month(2023, 10, -22),
      (2021, 12)
    );
    assert_eq!(days_in_month(2024, 2), 29);
    assert_eq!(days_in_month(2023, 2), 28);
    assert_eq!(
      days_in_month(2023, 12),
      31
    );
    assert_eq!(first_weekday(2023, 10), 0);
    assert_eq!(first_weekday(2024, 2), 4);
    assert_eq!(
      parse_month_key("2023-10")
        .expect("valid month"),
      (2023, 10)
    );
    assert!(
      parse_month_key("2023-13").is_err()
    );
  }
}
