pub mod book;
pub mod cli;
pub mod commands;
pub mod config;
pub mod datetime;
pub mod days;
pub mod format;
pub mod interval;
pub mod locale;
pub mod logs;
pub mod render;
pub mod task;

use std::ffi::OsString;

use anyhow::Context;
use clap::Parser;
use tracing::{
  debug,
  info
};

#[tracing::instrument(skip_all)]
pub fn run(
  raw_args: Vec<OsString>
) -> anyhow::Result<()> {
  let pre =
    cli::preprocess_args(&raw_args)?;
  let cli = cli::GlobalCli::parse_from(
    pre.cleaned_args
  );

  cli::init_tracing(
    cli.verbose,
    cli.quiet
  )?;

  info!(
    verbose = cli.verbose,
    quiet = cli.quiet,
    "starting taskgrid CLI"
  );
  debug!(?pre.rc_overrides, "preprocessed rc overrides");

  let mut cfg = config::Config::load(
    cli.rc_file.as_deref()
  )?;
  cfg.apply_overrides(
    pre.rc_overrides.into_iter().chain(
      cli
        .rc_overrides
        .into_iter()
        .map(|kv| (kv.key, kv.value))
    )
  );

  let configured_tz =
    cfg.get("timezone");
  let calendar =
    datetime::Calendar::new(
      datetime::resolve_timezone(
        cli.timezone.as_deref(),
        configured_tz.as_deref()
      )
    );

  let locale_name = cli
    .locale
    .clone()
    .or_else(|| cfg.get("locale"))
    .unwrap_or_else(|| {
      locale::BUILTIN_POLISH.to_string()
    });
  let locale =
    locale::LocaleTable::resolve(
      &locale_name
    )
    .with_context(|| {
      format!(
        "failed to load locale \
         {locale_name}"
      )
    })?;

  let data_file =
    config::resolve_data_file(
      &cfg,
      cli.data.as_deref()
    )
    .context(
      "failed to resolve task data \
       file"
    )?;

  let renderer =
    render::Renderer::new(&cfg)?;
  let inv = cli::Invocation::parse(
    &cfg, cli.rest
  )?;

  let session = commands::Session {
    calendar,
    locale,
    data_file
  };
  commands::dispatch(
    &session, &renderer, inv
  )?;

  info!("done");
  Ok(())
}
