use std::io;
use std::path::PathBuf;

use anyhow::{Context, anyhow};
use chrono::Utc;
use tracing::{debug, info, instrument};

use crate::book::TaskBook;
use crate::cli::Invocation;
use crate::datetime::{Calendar, Moment};
use crate::days::{find_earliest_date, find_latest_date};
use crate::format::format_minutes;
use crate::locale::LocaleTable;
use crate::logs::count_log_time;
use crate::render::{GridRow, Renderer};
use crate::task::Task;

/// Everything a command needs, resolved once per run.
#[derive(Debug, Clone)]
pub struct Session {
    pub calendar: Calendar,
    pub locale: LocaleTable,
    pub data_file: PathBuf,
}

impl Session {
    fn book(&self) -> anyhow::Result<TaskBook> {
        TaskBook::load(&self.data_file)
    }
}

pub fn known_command_names() -> Vec<&'static str> {
    vec!["grid", "day", "span", "statuses", "help", "version"]
}

pub fn expand_command_abbrev<'a>(token: &'a str, known: &[&'a str]) -> Option<&'a str> {
    if known.contains(&token) {
        return Some(token);
    }

    let mut matches = known.iter().copied().filter(|name| name.starts_with(token));
    let first = matches.next()?;
    if matches.next().is_some() {
        None
    } else {
        Some(first)
    }
}

#[instrument(skip(session, renderer, inv), fields(command = %inv.command))]
pub fn dispatch(session: &Session, renderer: &Renderer, inv: Invocation) -> anyhow::Result<()> {
    debug!(args = ?inv.command_args, "dispatching command");

    match inv.command.as_str() {
        "grid" => cmd_grid(session, renderer, &inv.command_args),
        "day" => cmd_day(session, renderer, &inv.command_args),
        "span" => cmd_span(session),
        "statuses" => renderer.write_statuses(io::stdout().lock(), &session.locale),
        "help" => cmd_help(),
        "version" => {
            println!("{}", env!("CARGO_PKG_VERSION"));
            Ok(())
        }
        other => Err(anyhow!("unknown command: {other}")),
    }
}

/// Reads a date argument: `today`, any calendar timestamp, or `DD.MM.YYYY`.
pub fn parse_date_arg(calendar: &Calendar, raw: &str) -> anyhow::Result<Moment> {
    if raw.trim().eq_ignore_ascii_case("today") {
        let today = calendar
            .local_date(Utc::now())
            .ok_or_else(|| anyhow!("failed to resolve today"))?;
        let moment = calendar.local_midnight(today, "today");
        if moment.is_valid() {
            return Ok(moment);
        }
        return Err(anyhow!("today's midnight does not exist in {}", calendar.timezone()));
    }

    let moment = calendar.to_date(raw);
    if moment.is_valid() {
        return Ok(moment);
    }

    let dotted = calendar.parse_date(raw);
    if dotted.is_valid() {
        return Ok(dotted);
    }

    Err(anyhow!("unrecognized date: {raw}"))
        .context("supported formats: today, RFC3339, YYYY-MM-DD, YYYY-MM-DDTHH:MM, YYYY-MM-DD HH:MM, DD.MM.YYYY")
}

/// One row per day from `from` through `to`, with the non-warning time
/// logged on each. Both bounds are taken as whole local days.
pub fn build_grid(
    calendar: &Calendar,
    locale: &LocaleTable,
    tasks: &[Task],
    from: Moment,
    to: Moment,
) -> Vec<GridRow> {
    let (Some(first), Some(last)) = (calendar.local_date(from), calendar.local_date(to)) else {
        return Vec::new();
    };
    let from = calendar.local_midnight(first, "grid start");
    let to = calendar.local_midnight(last, "grid end");

    let count = calendar.count_number_of_days(from, to);
    let count = usize::try_from(count).unwrap_or(usize::MAX);

    calendar
        .generate_days(locale, from, count)
        .into_iter()
        .map(|cell| {
            let logs = calendar.get_reversed_logs_for_date(tasks, cell.date);
            GridRow {
                logs: logs.len(),
                minutes: count_log_time(&logs),
                cell,
            }
        })
        .collect()
}

fn cmd_grid(session: &Session, renderer: &Renderer, args: &[String]) -> anyhow::Result<()> {
    let book = session.book()?;
    let calendar = &session.calendar;
    let dates = calendar.get_all_dates_from_tasks(book.tasks());

    let from = match args.first() {
        Some(raw) => parse_date_arg(calendar, raw)?,
        None => match find_earliest_date(dates.iter().copied()) {
            Some(found) => found,
            None => {
                info!("no logged dates; nothing to render");
                return Ok(());
            }
        },
    };
    let to = match args.get(1) {
        Some(raw) => parse_date_arg(calendar, raw)?,
        None => find_latest_date(dates.iter().copied()).unwrap_or(from),
    };

    let rows = build_grid(calendar, &session.locale, book.tasks(), from, to);
    debug!(%from, %to, rows = rows.len(), "built grid");
    renderer.write_grid(io::stdout().lock(), &rows)
}

fn cmd_day(session: &Session, renderer: &Renderer, args: &[String]) -> anyhow::Result<()> {
    let raw = args.first().ok_or_else(|| anyhow!("day requires a date argument"))?;
    let calendar = &session.calendar;
    let day = parse_date_arg(calendar, raw)?;

    let book = session.book()?;
    let logs = calendar.get_reversed_logs_for_date(book.tasks(), day);
    let total = count_log_time(&logs);
    renderer.write_day(io::stdout().lock(), calendar, &session.locale, &logs, total)
}

fn cmd_span(session: &Session) -> anyhow::Result<()> {
    let book = session.book()?;
    let calendar = &session.calendar;
    let dates = calendar.get_all_dates_from_tasks(book.tasks());

    let (Some(earliest), Some(latest)) = (
        find_earliest_date(dates.iter().copied()),
        find_latest_date(dates.iter().copied()),
    ) else {
        println!("no logged dates");
        return Ok(());
    };

    let total = count_log_time(&book.logs(calendar));
    println!("earliest {earliest}");
    println!("latest   {latest}");
    println!("days     {}", calendar.count_number_of_days(earliest, latest));
    println!("total    {}", format_minutes(total));
    Ok(())
}

fn cmd_help() -> anyhow::Result<()> {
    println!("taskgrid [options] <command> [args]");
    println!();
    println!("  grid [FROM] [TO]  day-by-day logged time (defaults to the logged span)");
    println!("  day DATE          logs that start on DATE");
    println!("  span              earliest and latest logged dates with the total");
    println!("  statuses          log statuses with icons and labels");
    println!("  version           print the version");
    Ok(())
}
