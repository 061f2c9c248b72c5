use std::fs;
use std::path::Path;

use anyhow::{
  Context,
  anyhow
};
use chrono::Weekday;
use serde::{
  Deserialize,
  Serialize
};

use crate::task::LogStatus;

pub const BUILTIN_POLISH: &str = "pl";

#[derive(
  Debug,
  Clone,
  PartialEq,
  Eq,
  Serialize,
  Deserialize,
)]
pub struct StatusLabels {
  pub accepted: String,
  pub pending:  String,
  pub warning:  String,
  pub active:   String
}

impl Default for StatusLabels {
  fn default() -> Self {
    Self {
      accepted: "Accepted".to_string(),
      pending:  "Pending".to_string(),
      warning:  "Warning".to_string(),
      active:   "Active".to_string()
    }
  }
}

/// Localized month and weekday names.
///
/// `days` and `short_days` are ordered
/// Monday first and are looked up by
/// [`Weekday`], never by a raw number.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LocaleTable {
  pub locale_code: String,
  pub months:      [String; 12],
  pub days:        [String; 7],
  pub short_days:  [String; 7],
  pub statuses:    StatusLabels
}

#[derive(Debug, Deserialize)]
struct RawLocaleTable {
  locale_code: String,
  months:      Vec<String>,
  days:        Vec<String>,
  short_days:  Vec<String>,
  #[serde(default)]
  statuses:    StatusLabels
}

impl LocaleTable {
  #[must_use]
  pub fn polish() -> Self {
    Self {
      locale_code: BUILTIN_POLISH
        .to_string(),
      months:      [
        "styczeń",
        "luty",
        "marzec",
        "kwiecień",
        "maj",
        "czerwiec",
        "lipiec",
        "sierpień",
        "wrzesień",
        "październik",
        "listopad",
        "grudzień"
      ]
      .map(String::from),
      days:        [
        "poniedziałek",
        "wtorek",
        "środa",
        "czwartek",
        "piątek",
        "sobota",
        "niedziela"
      ]
      .map(String::from),
      short_days:  [
        "pn", "wt", "śr", "cz", "pt",
        "sb", "nd"
      ]
      .map(String::from),
      statuses:    StatusLabels {
        accepted: "Zaakceptowane"
          .to_string(),
        pending:  "Oczekujące".to_string(),
        warning:  "Ostrzeżenie"
          .to_string(),
        active:   "Aktywne".to_string()
      }
    }
  }

  pub fn from_toml_str(
    raw: &str
  ) -> anyhow::Result<Self> {
    let parsed: RawLocaleTable =
      toml::from_str(raw).context(
        "failed to parse locale table"
      )?;

    let months = exact::<12>(
      parsed.months,
      "months"
    )?;
    let days =
      exact::<7>(parsed.days, "days")?;
    let short_days = exact::<7>(
      parsed.short_days,
      "short_days"
    )?;

    Ok(Self {
      locale_code: parsed.locale_code,
      months,
      days,
      short_days,
      statuses: parsed.statuses
    })
  }

  #[tracing::instrument]
  pub fn load(
    path: &Path
  ) -> anyhow::Result<Self> {
    let raw = fs::read_to_string(path)
      .with_context(|| {
        format!(
          "failed to read {}",
          path.display()
        )
      })?;
    let table = Self::from_toml_str(
      &raw
    )
    .with_context(|| {
      format!(
        "invalid locale file {}",
        path.display()
      )
    })?;
    tracing::info!(
      file = %path.display(),
      locale = %table.locale_code,
      "loaded locale table"
    );
    Ok(table)
  }

  /// `pl` selects the built-in table;
  /// anything else is a TOML file path.
  pub fn resolve(
    name_or_path: &str
  ) -> anyhow::Result<Self> {
    let trimmed = name_or_path.trim();
    if trimmed.eq_ignore_ascii_case(
      BUILTIN_POLISH
    ) {
      return Ok(Self::polish());
    }
    if trimmed.is_empty() {
      return Err(anyhow!(
        "locale name cannot be empty"
      ));
    }
    Self::load(Path::new(trimmed))
  }

  /// 1-based month index.
  #[must_use]
  pub fn month_name(
    &self,
    month: u32
  ) -> Option<&str> {
    let idx =
      usize::try_from(month).ok()?;
    self
      .months
      .get(idx.checked_sub(1)?)
      .map(String::as_str)
  }

  #[must_use]
  pub fn day_name(
    &self,
    weekday: Weekday
  ) -> &str {
    &self.days
      [weekday.num_days_from_monday()
        as usize]
  }

  #[must_use]
  pub fn short_day_name(
    &self,
    weekday: Weekday
  ) -> &str {
    &self.short_days
      [weekday.num_days_from_monday()
        as usize]
  }

  #[must_use]
  pub fn status_label(
    &self,
    status: LogStatus
  ) -> &str {
    match status {
      | LogStatus::Accepted => {
        &self.statuses.accepted
      }
      | LogStatus::Pending => {
        &self.statuses.pending
      }
      | LogStatus::Warning => {
        &self.statuses.warning
      }
      | LogStatus::Active => {
        &self.statuses.active
      }
    }
  }

  #[must_use]
  pub fn status_options(
    &self
  ) -> Vec<(LogStatus, &str)> {
    LogStatus::ALL
      .iter()
      .map(|status| {
        (*status, self.status_label(*status))
      })
      .collect()
  }
}

fn exact<const N: usize>(
  values: Vec<String>,
  field: &str
) -> anyhow::Result<[String; N]> {
  let found = values.len();
  values.try_into().map_err(|_| {
    anyhow!(
      "locale field `{field}` needs \
       {N} entries, found {found}"
    )
  })
}
