use std::io::{self, IsTerminal, Write};

use unicode_width::UnicodeWidthStr;

use crate::calendar::{CalendarCell, CalendarGrid};
use crate::config::Config;
use crate::filter::FilteredPanel;
use crate::views::{ListView, TaskRow};

const WEEKDAY_LABELS: [&str; 7] = ["Sun", "Mon", "Tue", "Wed", "Thu", "Fri", "Sat"];
const CELL_WIDTH: usize = 7;

#[derive(Debug, Clone)]
pub struct Renderer {
    color: bool,
}

impl Renderer {
    pub fn new(cfg: &Config) -> Self {
        Self {
            color: cfg.display.color && io::stdout().is_terminal(),
        }
    }

    pub fn plain() -> Self {
        Self { color: false }
    }

    #[tracing::instrument(skip(self, view))]
    pub fn print_list_view(&self, view: &ListView) -> anyhow::Result<()> {
        self.write_list_view(io::stdout().lock(), view)
    }

    #[tracing::instrument(skip(self, grid, panel))]
    pub fn print_calendar(&self, grid: &CalendarGrid, panel: &FilteredPanel) -> anyhow::Result<()> {
        let mut out = io::stdout().lock();
        self.write_calendar(&mut out, grid)?;
        writeln!(out)?;
        self.write_panel(&mut out, panel)
    }

    pub fn write_list_view<W: Write>(&self, mut out: W, view: &ListView) -> anyhow::Result<()> {
        if view.dated.is_empty() && view.undated.is_empty() {
            writeln!(out, "No tasks.")?;
            return Ok(());
        }

        if !view.dated.is_empty() {
            self.write_rows(&mut out, &view.dated, true)?;
        }

        if view.show_undated() {
            if !view.dated.is_empty() {
                writeln!(out)?;
            }
            writeln!(out, "No due date")?;
            self.write_rows(&mut out, &view.undated, false)?;
        }
        Ok(())
    }

    pub fn write_calendar<W: Write>(&self, mut out: W, grid: &CalendarGrid) -> anyhow::Result<()> {
        let row_width = CELL_WIDTH * WEEKDAY_LABELS.len();
        let label_width = UnicodeWidthStr::width(grid.label.as_str());
        let pad = row_width.saturating_sub(label_width) / 2;
        writeln!(out, "{}{}", " ".repeat(pad), grid.label)?;

        for label in WEEKDAY_LABELS {
            write!(out, "{label:<width$}", width = CELL_WIDTH)?;
        }
        writeln!(out)?;

        for week in grid.cells.chunks(WEEKDAY_LABELS.len()) {
            for cell in week {
                let (text, code) = match cell {
                    CalendarCell::Padding => (String::new(), None),
                    CalendarCell::Day(day) => {
                        let mut text = if day.today {
                            format!("[{}]", day.day)
                        } else {
                            day.day.to_string()
                        };
                        if day.has_tasks() {
                            text.push_str(&format!("*{}", day.count));
                        }
                        if day.overdue {
                            text.push('!');
                        }
                        let code = if day.overdue {
                            Some("31")
                        } else if day.has_tasks() {
                            Some("36")
                        } else {
                            None
                        };
                        (text, code)
                    }
                };
                let padding = CELL_WIDTH.saturating_sub(visible_width(&text));
                let painted = match code {
                    Some(code) => self.paint(&text, code),
                    None => text,
                };
                write!(out, "{}{}", painted, " ".repeat(padding))?;
            }
            writeln!(out)?;
        }
        Ok(())
    }

    pub fn write_panel<W: Write>(&self, mut out: W, panel: &FilteredPanel) -> anyhow::Result<()> {
        writeln!(out, "{}", panel.title)?;
        if panel.tasks.is_empty() {
            writeln!(out, "No tasks.")?;
        } else {
            self.write_rows(&mut out, &panel.tasks, true)?;
        }
        if panel.show_all_link {
            writeln!(out, "(run `daybook all` to show all tasks)")?;
        }
        Ok(())
    }

    fn write_rows<W: Write>(&self, out: W, rows: &[TaskRow], with_due: bool) -> anyhow::Result<()> {
        let mut headers = vec!["#".to_string(), "Done".to_string()];
        if with_due {
            headers.push("Due".to_string());
        }
        headers.push("Task".to_string());

        let table = rows
            .iter()
            .map(|row| {
                let mut cells = vec![
                    self.paint(&row.position.to_string(), "33"),
                    if row.completed { "[x]" } else { "[ ]" }.to_string(),
                ];
                if with_due {
                    let due = if row.overdue {
                        self.paint(&row.due_label, "31")
                    } else {
                        row.due_label.clone()
                    };
                    cells.push(due);
                }
                let text = if row.completed {
                    self.paint(&row.text, "2")
                } else {
                    row.text.clone()
                };
                cells.push(text);
                cells
            })
            .collect();

        write_table(out, headers, table)
    }

    fn paint(&self, text: &str, code: &str) -> String {
        if !self.color || text.is_empty() {
            return text.to_string();
        }
        format!("\x1b[{code}m{text}\x1b[0m")
    }
}

fn write_table<W: Write>(
    mut writer: W,
    headers: Vec<String>,
    rows: Vec<Vec<String>>,
) -> anyhow::Result<()> {
    let widths: Vec<usize> = (0..headers.len())
        .map(|col| {
            rows.iter()
                .filter_map(|row| row.get(col))
                .map(|cell| visible_width(cell))
                .chain(std::iter::once(visible_width(&headers[col])))
                .max()
                .unwrap_or(0)
        })
        .collect();

    let rule: Vec<String> = widths.iter().map(|w| "-".repeat(*w)).collect();
    for line in std::iter::once(&headers).chain(std::iter::once(&rule)).chain(rows.iter()) {
        for (cell, width) in line.iter().zip(&widths) {
            let padding = width.saturating_sub(visible_width(cell));
            write!(writer, "{}{} ", cell, " ".repeat(padding))?;
        }
        writeln!(writer)?;
    }

    Ok(())
}

// Width on screen, ignoring SGR colour sequences.
fn visible_width(s: &str) -> usize {
    let mut plain = String::with_capacity(s.len());
    let mut rest = s;
    while let Some(start) = rest.find('\x1b') {
        plain.push_str(&rest[..start]);
        rest = match rest[start..].find('m') {
            Some(end) => &rest[start + end + 1..],
            None => "",
        };
    }
    plain.push_str(rest);
    UnicodeWidthStr::width(plain.as_str())
}

#[cfg(test)]
mod tests {
    use chrono::NaiveDate;

    use super::*;
    use crate::calendar::MonthCursor;
    use crate::filter::FilterState;
    use crate::store::TaskStore;

    fn today() -> NaiveDate {
        NaiveDate::from_ymd_opt(2023, 10, 25).expect("valid date")
    }

    fn sample_store() -> TaskStore {
        let mut store = TaskStore::new();
        store
            .add_task("Read", NaiveDate::from_ymd_opt(2023, 10, 20))
            .expect("add");
        store.add_task("Groceries", None).expect("add");
        store
    }

    fn render<F>(f: F) -> String
    where
        F: FnOnce(&mut Vec<u8>) -> anyhow::Result<()>,
    {
        let mut buf = Vec::new();
        f(&mut buf).expect("render");
        String::from_utf8(buf).expect("utf8 output")
    }

    #[test]
    fn list_view_prints_both_sections() {
        let view = ListView::derive(&sample_store(), today());
        let out = render(|buf| Renderer::plain().write_list_view(buf, &view));
        assert!(out.contains("Oct 20, 2023"));
        assert!(out.contains("No due date"));
        assert!(out.contains("Groceries"));
    }

    #[test]
    fn undated_heading_is_hidden_when_empty() {
        let mut store = TaskStore::new();
        store.add_task("Read", Some(today())).expect("add");
        let view = ListView::derive(&store, today());
        let out = render(|buf| Renderer::plain().write_list_view(buf, &view));
        assert!(!out.contains("No due date"));
    }

    #[test]
    fn calendar_prints_six_weeks_with_markers() {
        let store = sample_store();
        let grid = crate::calendar::CalendarGrid::derive(&store, MonthCursor::new(2023, 10), today());
        let out = render(|buf| Renderer::plain().write_calendar(buf, &grid));
        let lines: Vec<&str> = out.lines().collect();
        assert_eq!(lines.len(), 8);
        assert!(lines[0].contains("October 2023"));
        assert!(out.contains("20*1!"));
        assert!(out.contains("[25]"));
    }

    #[test]
    fn panel_prints_title_and_hint_when_filtered() {
        let store = sample_store();
        let mut filter = FilterState::default();
        assert!(filter.select(&store, NaiveDate::from_ymd_opt(2023, 10, 20).expect("valid date")));
        let panel = FilteredPanel::derive(&store, &filter, today());
        let out = render(|buf| Renderer::plain().write_panel(buf, &panel));
        assert!(out.starts_with("Tasks for Oct 20, 2023"));
        assert!(out.contains("daybook all"));
        assert!(!out.contains("Groceries"));
    }

    #[test]
    fn visible_width_ignores_colour_codes() {
        assert_eq!(visible_width("\x1b[31mOct 20, 2023\x1b[0m"), 12);
        assert_eq!(visible_width("plain"), 5);
    }
}
