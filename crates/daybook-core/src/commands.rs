use anyhow::Context;
use chrono::NaiveDate;
use tracing::{
  info,
  instrument
};

use crate::calendar::MonthCursor;
use crate::cli::Command;
use crate::datetime::{
  format_date,
  parse_date_key,
  parse_month_key
};
use crate::persistence::TaskGateway;
use crate::planner::{
  Planner,
  Refresh,
  ViewMode
};
use crate::render::Renderer;

#[instrument(skip(
  planner, renderer, command, today
))]
pub fn dispatch<G: TaskGateway>(
  planner: &mut Planner<G>,
  renderer: &Renderer,
  command: Option<Command>,
  today: NaiveDate
) -> anyhow::Result<()> {
  let Some(command) = command else {
    info!(view = ?planner.view(), "no command; repainting active view");
    return repaint(
      planner,
      renderer,
      Refresh::ALL,
      today
    );
  };

  let refresh = match command {
    | Command::Add {
      due,
      text
    } => {
      let due = due
        .as_deref()
        .map(parse_date_key)
        .transpose()
        .context("invalid --due date")?;
      let (id, refresh) = planner
        .add_task(&text.join(" "), due)?;
      if let Some(pos) = planner
        .store()
        .position(id)
      {
        println!(
          "Created task {}.",
          pos + 1
        );
      }
      refresh
    }
    | Command::Done {
      position
    } => {
      let id = planner
        .id_at_position(position)?;
      let (completed, refresh) =
        planner.toggle_complete(id)?;
      let verb = if completed {
        "Completed"
      } else {
        "Reopened"
      };
      println!("{verb} task {position}.");
      refresh
    }
    | Command::Delete {
      position
    } => {
      let id = planner
        .id_at_position(position)?;
      let refresh =
        planner.delete_task(id)?;
      println!(
        "Deleted task {position}."
      );
      refresh
    }
    | Command::List => {
      planner.switch_to_list()
    }
    | Command::Calendar {
      month
    } => {
      let mut refresh =
        planner.switch_to_calendar();
      if let Some(raw) = month {
        let (year, month) =
          parse_month_key(&raw)
            .context("invalid --month")?;
        refresh = planner.jump_to(
          MonthCursor::new(year, month)
        );
      }
      refresh
    }
    | Command::Prev => {
      planner.switch_to_calendar();
      planner.prev_month()
    }
    | Command::Next => {
      planner.switch_to_calendar();
      planner.next_month()
    }
    | Command::Select {
      date
    } => {
      let date = parse_date_key(&date)
        .context("invalid date")?;
      planner.switch_to_calendar();
      let refresh =
        planner.select_day(date);
      if refresh.is_empty() {
        println!(
          "No pending tasks on {}.",
          format_date(Some(date))
        );
      }
      refresh
    }
    | Command::All => {
      planner.switch_to_calendar();
      planner.show_all()
    }
  };

  repaint(
    planner, renderer, refresh, today
  )
}

/// Prints whatever `refresh` marks as
/// stale, limited to the active view.
pub fn repaint<G: TaskGateway>(
  planner: &Planner<G>,
  renderer: &Renderer,
  refresh: Refresh,
  today: NaiveDate
) -> anyhow::Result<()> {
  match planner.view() {
    | ViewMode::List if refresh.list => {
      renderer.print_list_view(
        &planner.list_view(today)
      )
    }
    | ViewMode::Calendar
      if refresh.calendar
        || refresh.panel =>
    {
      renderer.print_calendar(
        &planner.calendar_grid(today),
        &planner.filtered_panel(today)
      )
    }
    | _ => Ok(())
  }
}
