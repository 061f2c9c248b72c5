use std::fmt;
use std::fs;
use std::path::{
  Path,
  PathBuf
};
use std::sync::OnceLock;

use chrono::{
  DateTime,
  FixedOffset,
  LocalResult,
  NaiveDate,
  NaiveDateTime,
  Offset,
  SecondsFormat,
  TimeZone,
  Timelike,
  Utc
};
use chrono_tz::Tz;
use regex::Regex;
use serde::{
  Deserialize,
  Serialize
};

const TIMEZONE_CONFIG_FILE: &str =
  "taskgrid-time.toml";
const TIMEZONE_ENV_VAR: &str =
  "TASKGRID_TIMEZONE";
const TIMEZONE_CONFIG_ENV_VAR: &str =
  "TASKGRID_TIME_CONFIG";

const NAIVE_DATETIME_FORMATS: [&str;
  4] = [
  "%Y-%m-%dT%H:%M:%S%.f",
  "%Y-%m-%dT%H:%M",
  "%Y-%m-%d %H:%M:%S%.f",
  "%Y-%m-%d %H:%M"
];

/// A normalized date value.
///
/// `Invalid` stands in for input that
/// could not be read as a date. It is
/// never equal to, before or after
/// anything, itself included.
#[derive(Debug, Clone, Copy)]
pub enum Moment {
  At(DateTime<Utc>),
  Invalid
}

impl Moment {
  #[must_use]
  pub fn is_valid(&self) -> bool {
    matches!(self, Moment::At(_))
  }

  #[must_use]
  pub fn instant(
    &self
  ) -> Option<DateTime<Utc>> {
    match self {
      | Moment::At(dt) => Some(*dt),
      | Moment::Invalid => None
    }
  }
}

impl PartialEq for Moment {
  fn eq(&self, other: &Self) -> bool {
    match (self, other) {
      | (Moment::At(a), Moment::At(b)) => {
        a == b
      }
      | _ => false
    }
  }
}

impl PartialOrd for Moment {
  fn partial_cmp(
    &self,
    other: &Self
  ) -> Option<std::cmp::Ordering> {
    match (self, other) {
      | (Moment::At(a), Moment::At(b)) => {
        a.partial_cmp(b)
      }
      | _ => None
    }
  }
}

impl From<DateTime<Utc>> for Moment {
  fn from(dt: DateTime<Utc>) -> Self {
    Moment::At(dt)
  }
}

impl fmt::Display for Moment {
  fn fmt(
    &self,
    f: &mut fmt::Formatter<'_>
  ) -> fmt::Result {
    match self {
      | Moment::At(dt) => {
        f.write_str(&dt.to_rfc3339_opts(
          SecondsFormat::Millis,
          true
        ))
      }
      | Moment::Invalid => {
        f.write_str("Invalid Date")
      }
    }
  }
}

/// A date as supplied by callers: an
/// instant, raw text that still has to
/// be parsed, or nothing (`null` or an
/// absent field).
#[derive(
  Debug,
  Clone,
  Default,
  PartialEq,
  Serialize,
  Deserialize,
)]
#[serde(untagged)]
pub enum FlexDate {
  Instant(DateTime<Utc>),
  Text(String),
  #[default]
  Missing
}

impl FlexDate {
  #[must_use]
  pub fn is_blank(&self) -> bool {
    match self {
      | FlexDate::Instant(_) => false,
      | FlexDate::Text(raw) => {
        raw.trim().is_empty()
      }
      | FlexDate::Missing => true
    }
  }
}

impl From<DateTime<Utc>> for FlexDate {
  fn from(dt: DateTime<Utc>) -> Self {
    FlexDate::Instant(dt)
  }
}

impl From<&str> for FlexDate {
  fn from(raw: &str) -> Self {
    FlexDate::Text(raw.to_string())
  }
}

impl From<String> for FlexDate {
  fn from(raw: String) -> Self {
    FlexDate::Text(raw)
  }
}

/// Anything that can be normalized into
/// a [`Moment`] against a calendar.
pub trait DateInput {
  fn resolve(
    self,
    calendar: &Calendar
  ) -> Moment;
}

impl DateInput for Moment {
  fn resolve(
    self,
    _calendar: &Calendar
  ) -> Moment {
    self
  }
}

impl DateInput for DateTime<Utc> {
  fn resolve(
    self,
    _calendar: &Calendar
  ) -> Moment {
    Moment::At(self)
  }
}

impl DateInput for &str {
  fn resolve(
    self,
    calendar: &Calendar
  ) -> Moment {
    calendar.parse(self)
  }
}

impl DateInput for &String {
  fn resolve(
    self,
    calendar: &Calendar
  ) -> Moment {
    calendar.parse(self)
  }
}

impl DateInput for String {
  fn resolve(
    self,
    calendar: &Calendar
  ) -> Moment {
    calendar.parse(&self)
  }
}

impl DateInput for &FlexDate {
  fn resolve(
    self,
    calendar: &Calendar
  ) -> Moment {
    match self {
      | FlexDate::Instant(dt) => {
        Moment::At(*dt)
      }
      | FlexDate::Text(raw) => {
        calendar.parse(raw)
      }
      | FlexDate::Missing => {
        Moment::Invalid
      }
    }
  }
}

impl DateInput for FlexDate {
  fn resolve(
    self,
    calendar: &Calendar
  ) -> Moment {
    (&self).resolve(calendar)
  }
}

/// The timezone in which calendar-day
/// questions are answered.
#[derive(
  Debug, Clone, Copy, PartialEq, Eq,
)]
pub struct Calendar {
  tz: Tz
}

impl Default for Calendar {
  fn default() -> Self {
    Self::utc()
  }
}

impl Calendar {
  #[must_use]
  pub const fn new(tz: Tz) -> Self {
    Self { tz }
  }

  #[must_use]
  pub const fn utc() -> Self {
    Self::new(chrono_tz::UTC)
  }

  #[must_use]
  pub fn timezone(&self) -> Tz {
    self.tz
  }

  pub fn to_date(
    &self,
    input: impl DateInput
  ) -> Moment {
    input.resolve(self)
  }

  /// Reads a calendar timestamp. Text
  /// without an offset is local to this
  /// calendar. Never fails; unreadable
  /// text becomes [`Moment::Invalid`].
  pub fn parse(
    &self,
    raw: &str
  ) -> Moment {
    let token = raw.trim();
    if token.is_empty() {
      return Moment::Invalid;
    }

    if let Ok(dt) =
      DateTime::parse_from_rfc3339(token)
    {
      return Moment::At(
        dt.with_timezone(&Utc)
      );
    }

    for fmt in NAIVE_DATETIME_FORMATS {
      if let Ok(ndt) =
        NaiveDateTime::parse_from_str(
          token, fmt
        )
      {
        return self
          .moment_from_local(ndt, fmt);
      }
    }

    if let Some(caps) = date_only_re()
      .and_then(|re| re.captures(token))
    {
      let date = caps["year"]
        .parse::<i32>()
        .ok()
        .zip(
          caps["month"]
            .parse::<u32>()
            .ok()
        )
        .zip(
          caps["day"].parse::<u32>().ok()
        )
        .and_then(
          |((year, month), day)| {
            NaiveDate::from_ymd_opt(
              year, month, day
            )
          }
        );
      return match date {
        | Some(date) => {
          self.local_midnight(
            date, "date"
          )
        }
        | None => {
          tracing::warn!(
            input = token,
            "date components out of range"
          );
          Moment::Invalid
        }
      };
    }

    tracing::warn!(
      input = token,
      "unrecognized date text; using \
       invalid marker"
    );
    Moment::Invalid
  }

  /// Reads `DD.MM.YYYY` (day and month
  /// may be a single digit) as local
  /// midnight.
  pub fn parse_date(
    &self,
    raw: &str
  ) -> Moment {
    let Some(caps) = dotted_date_re()
      .and_then(|re| {
        re.captures(raw.trim())
      })
    else {
      tracing::warn!(
        input = raw,
        "expected DD.MM.YYYY"
      );
      return Moment::Invalid;
    };

    let date = caps["year"]
      .parse::<i32>()
      .ok()
      .zip(
        caps["month"].parse::<u32>().ok()
      )
      .zip(
        caps["day"].parse::<u32>().ok()
      )
      .and_then(|((year, month), day)| {
        NaiveDate::from_ymd_opt(
          year, month, day
        )
      });

    match date {
      | Some(date) => {
        self.local_midnight(
          date,
          "dotted-date"
        )
      }
      | None => Moment::Invalid
    }
  }

  #[must_use]
  pub fn local(
    &self,
    moment: Moment
  ) -> Option<DateTime<Tz>> {
    moment.instant().map(|dt| {
      dt.with_timezone(&self.tz)
    })
  }

  pub fn local_date(
    &self,
    input: impl DateInput
  ) -> Option<NaiveDate> {
    self
      .local(input.resolve(self))
      .map(|dt| dt.date_naive())
  }

  pub fn is_the_same_day(
    &self,
    a: impl DateInput,
    b: impl DateInput
  ) -> bool {
    match (
      self.local_date(a),
      self.local_date(b)
    ) {
      | (Some(a), Some(b)) => a == b,
      | _ => false
    }
  }

  pub fn get_hour(
    &self,
    input: impl DateInput
  ) -> Option<u32> {
    self
      .local(input.resolve(self))
      .map(|dt| dt.hour())
  }

  pub fn get_minute(
    &self,
    input: impl DateInput
  ) -> Option<u32> {
    self
      .local(input.resolve(self))
      .map(|dt| dt.minute())
  }

  /// Minute floored to a multiple of
  /// ten.
  pub fn get_rounded_minute(
    &self,
    input: impl DateInput
  ) -> Option<u32> {
    self
      .get_minute(input)
      .map(|minute| minute / 10 * 10)
  }

  pub(crate) fn local_midnight(
    &self,
    date: NaiveDate,
    context: &str
  ) -> Moment {
    match date.and_hms_opt(0, 0, 0) {
      | Some(midnight) => {
        self.moment_from_local(midnight, context)
      }
      | None => Moment::Invalid
    }
  }

  pub(crate) fn moment_from_local(
    &self,
    local_naive: NaiveDateTime,
    context: &str
  ) -> Moment {
    match self.resolve_local(
      local_naive,
      None,
      context
    ) {
      | Some(dt) => Moment::At(dt),
      | None => {
        tracing::warn!(
          context,
          local = %local_naive,
          timezone = %self.tz,
          "local datetime does not exist \
           in calendar timezone"
        );
        Moment::Invalid
      }
    }
  }

  /// Inside a DST fold the instant with
  /// offset `prefer` wins, else the
  /// earliest.
  pub(crate) fn resolve_local(
    &self,
    local_naive: NaiveDateTime,
    prefer: Option<FixedOffset>,
    context: &str
  ) -> Option<DateTime<Utc>> {
    match self
      .tz
      .from_local_datetime(&local_naive)
    {
      | LocalResult::Single(local_dt) => {
        Some(local_dt.with_timezone(&Utc))
      }
      | LocalResult::Ambiguous(
        first,
        second
      ) => {
        tracing::debug!(
          context,
          first = %first,
          second = %second,
          "ambiguous local datetime"
        );
        let (earliest, latest) =
          if first <= second {
            (first, second)
          } else {
            (second, first)
          };
        let chosen = match prefer {
          | Some(offset)
            if latest.offset().fix()
              == offset =>
          {
            latest
          }
          | _ => earliest
        };
        Some(chosen.with_timezone(&Utc))
      }
      | LocalResult::None => None
    }
  }
}

/// Normalizes against a UTC calendar.
pub fn to_date(
  input: impl DateInput
) -> Moment {
  Calendar::utc().to_date(input)
}

fn date_only_re() -> Option<&'static Regex>
{
  static DATE_ONLY: OnceLock<
    Option<Regex>
  > = OnceLock::new();
  DATE_ONLY
    .get_or_init(|| {
      Regex::new(
        r"^(?P<year>\d{4})-(?P<month>\d{1,2})-(?P<day>\d{1,2})$"
      )
      .ok()
    })
    .as_ref()
}

fn dotted_date_re()
-> Option<&'static Regex> {
  static DOTTED: OnceLock<
    Option<Regex>
  > = OnceLock::new();
  DOTTED
    .get_or_init(|| {
      Regex::new(
        r"^(?P<day>\d{1,2})\.(?P<month>\d{1,2})\.(?P<year>\d{4})$"
      )
      .ok()
    })
    .as_ref()
}

#[derive(Debug, Deserialize)]
struct TimezoneConfig {
  timezone: Option<String>,
  time:     Option<TimezoneSection>
}

#[derive(Debug, Deserialize)]
struct TimezoneSection {
  timezone: Option<String>
}

/// Picks the calendar timezone:
/// explicit flag, then
/// `TASKGRID_TIMEZONE`, then the rc
/// value, then `taskgrid-time.toml`,
/// then UTC.
#[tracing::instrument]
pub fn resolve_timezone(
  explicit: Option<&str>,
  configured: Option<&str>
) -> Tz {
  let from_env =
    std::env::var(TIMEZONE_ENV_VAR).ok();
  let config_file =
    timezone_config_path();
  pick_timezone(
    explicit,
    from_env.as_deref(),
    configured,
    config_file.as_deref()
  )
}

/// First readable source wins; ids
/// that fail to parse fall through.
pub(crate) fn pick_timezone(
  explicit: Option<&str>,
  from_env: Option<&str>,
  configured: Option<&str>,
  config_file: Option<&Path>
) -> Tz {
  if let Some(raw) = explicit
    && let Some(tz) =
      parse_timezone(raw, "--timezone")
  {
    return tz;
  }

  if let Some(raw) = from_env
    && let Some(tz) =
      parse_timezone(raw, TIMEZONE_ENV_VAR)
  {
    return tz;
  }

  if let Some(raw) = configured
    && let Some(tz) =
      parse_timezone(raw, "rc:timezone")
  {
    return tz;
  }

  if let Some(path) = config_file
    && let Some(tz) =
      load_timezone_from_file(path)
  {
    return tz;
  }

  tracing::debug!(
    "no timezone configured; using UTC"
  );
  chrono_tz::UTC
}

fn timezone_config_path()
-> Option<PathBuf> {
  if let Ok(raw) = std::env::var(
    TIMEZONE_CONFIG_ENV_VAR
  ) {
    let trimmed = raw.trim();
    if !trimmed.is_empty() {
      return Some(PathBuf::from(
        trimmed
      ));
    }
  }

  std::env::current_dir().ok().map(
    |dir| {
      dir.join(TIMEZONE_CONFIG_FILE)
    }
  )
}

pub(crate) fn load_timezone_from_file(
  path: &Path
) -> Option<Tz> {
  if !path.exists() {
    tracing::debug!(
      file = %path.display(),
      "timezone config file not found"
    );
    return None;
  }

  let raw = match fs::read_to_string(
    path
  ) {
    | Ok(raw) => raw,
    | Err(err) => {
      tracing::error!(
        file = %path.display(),
        error = %err,
        "failed reading timezone config file"
      );
      return None;
    }
  };

  let parsed = match toml::from_str::<
    TimezoneConfig
  >(&raw)
  {
    | Ok(parsed) => parsed,
    | Err(err) => {
      tracing::error!(
        file = %path.display(),
        error = %err,
        "failed parsing timezone config file"
      );
      return None;
    }
  };

  let timezone =
    parsed.timezone.or_else(|| {
      parsed.time.and_then(|section| {
        section.timezone
      })
    });
  let Some(timezone) = timezone else {
    tracing::warn!(
      file = %path.display(),
      "timezone config had no timezone field"
    );
    return None;
  };

  parse_timezone(
    timezone.as_str(),
    &format!("file:{}", path.display())
  )
}

pub(crate) fn parse_timezone(
  raw: &str,
  source: &str
) -> Option<Tz> {
  let trimmed = raw.trim();
  if trimmed.is_empty() {
    tracing::warn!(
      source,
      "timezone source was empty"
    );
    return None;
  }

  match trimmed.parse::<Tz>() {
    | Ok(tz) => {
      tracing::info!(
        source,
        timezone = %trimmed,
        "configured calendar timezone"
      );
      Some(tz)
    }
    | Err(err) => {
      tracing::error!(
        source,
        timezone = %trimmed,
        error = %err,
        "failed to parse timezone id"
      );
      None
    }
  }
}
