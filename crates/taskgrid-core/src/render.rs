use std::io::{self, IsTerminal, Write};

use unicode_width::UnicodeWidthStr;

use crate::config::Config;
use crate::datetime::{Calendar, Moment};
use crate::days::DayCell;
use crate::format::format_minutes;
use crate::locale::LocaleTable;
use crate::logs::count_time_difference;
use crate::task::{FlattenedLog, LogStatus};

/// One grid line: a day and the time logged on it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GridRow {
    pub cell: DayCell,
    pub logs: usize,
    pub minutes: i64,
}

#[derive(Debug, Clone)]
pub struct Renderer {
    color: bool,
}

impl Renderer {
    pub fn new(cfg: &Config) -> anyhow::Result<Self> {
        let color = cfg.get_bool("color")?.unwrap_or(true);
        Ok(Self { color })
    }

    #[tracing::instrument(skip_all, fields(rows = rows.len()))]
    pub fn write_grid<W: Write>(&self, out: W, rows: &[GridRow]) -> anyhow::Result<()> {
        let headers = ["Date", "Day", "Month", "Logs", "Time"].map(String::from).to_vec();

        let body = rows
            .iter()
            .map(|row| {
                let cell = &row.cell;
                let weekday = if cell.day_of_week.0.num_days_from_monday() >= 5 {
                    self.paint(&cell.day_of_week.2, "33")
                } else {
                    cell.day_of_week.2.clone()
                };
                let time = if row.minutes > 0 {
                    self.paint(&format_minutes(row.minutes), "32")
                } else {
                    format_minutes(row.minutes)
                };
                vec![
                    format!("{:04}-{:02}-{:02}", cell.year, cell.month.0, cell.day_of_month),
                    weekday,
                    cell.month.1.clone(),
                    row.logs.to_string(),
                    time,
                ]
            })
            .collect();

        write_table(out, headers, body)
    }

    #[tracing::instrument(skip_all, fields(logs = logs.len()))]
    pub fn write_day<W: Write>(
        &self,
        mut out: W,
        calendar: &Calendar,
        locale: &LocaleTable,
        logs: &[FlattenedLog],
        total_minutes: i64,
    ) -> anyhow::Result<()> {
        let headers = ["ID", "Task", "Status", "Start", "End", "Time"].map(String::from).to_vec();

        let body = logs
            .iter()
            .map(|log| {
                let label = locale.status_label(log.status);
                let status = if log.status == LogStatus::Warning {
                    self.paint(label, "31")
                } else {
                    label.to_string()
                };
                let duration = count_time_difference(log.end, log.start)
                    .map(format_minutes)
                    .unwrap_or_else(|| "--:--".to_string());
                vec![
                    self.paint(&log.id.to_string(), "33"),
                    log.task.name.clone(),
                    status,
                    clock(calendar, log.start),
                    clock(calendar, log.end),
                    duration,
                ]
            })
            .collect();

        write_table(&mut out, headers, body)?;
        writeln!(out, "total {}", format_minutes(total_minutes))?;
        Ok(())
    }

    pub fn write_statuses<W: Write>(&self, out: W, locale: &LocaleTable) -> anyhow::Result<()> {
        let headers = ["Status", "Icon", "Label"].map(String::from).to_vec();
        let body = locale
            .status_options()
            .into_iter()
            .map(|(status, label)| vec![status.to_string(), status.icon().to_string(), label.to_string()])
            .collect();
        write_table(out, headers, body)
    }

    fn paint(&self, text: &str, code: &str) -> String {
        if !self.color || !io::stdout().is_terminal() {
            return text.to_string();
        }
        format!("\x1b[{code}m{text}\x1b[0m")
    }
}

fn clock(calendar: &Calendar, moment: Moment) -> String {
    calendar
        .local(moment)
        .map(|dt| dt.format("%H:%M").to_string())
        .unwrap_or_else(|| "--:--".to_string())
}

fn write_table<W: Write>(mut writer: W, headers: Vec<String>, rows: Vec<Vec<String>>) -> anyhow::Result<()> {
    let column_count = headers.len();
    let mut widths = vec![0usize; column_count];

    for (idx, header) in headers.iter().enumerate() {
        widths[idx] = widths[idx].max(UnicodeWidthStr::width(header.as_str()));
    }

    for row in &rows {
        for (idx, cell) in row.iter().enumerate().take(column_count) {
            widths[idx] = widths[idx].max(UnicodeWidthStr::width(strip_ansi(cell).as_str()));
        }
    }

    for idx in 0..column_count {
        write!(writer, "{:width$} ", headers[idx], width = widths[idx])?;
    }
    writeln!(writer)?;

    for width in &widths {
        write!(writer, "{:-<width$} ", "", width = *width)?;
    }
    writeln!(writer)?;

    for row in rows {
        for (idx, cell) in row.iter().enumerate().take(column_count) {
            let visible_width = UnicodeWidthStr::width(strip_ansi(cell).as_str());
            let padding = widths[idx].saturating_sub(visible_width);
            write!(writer, "{}{} ", cell, " ".repeat(padding))?;
        }
        writeln!(writer)?;
    }

    Ok(())
}

fn strip_ansi(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    let mut escaped = false;

    for ch in s.chars() {
        if escaped {
            if ch == 'm' {
                escaped = false;
            }
            continue;
        }

        if ch == '\x1b' {
            escaped = true;
            continue;
        }

        out.push(ch);
    }

    out
}
