pub mod calendar_date;
pub mod cells;
pub mod cli;
pub mod config;
pub mod datetime;
pub mod grid;
pub mod labels;
pub mod render;
pub mod request;
pub mod window;

use std::ffi::OsString;
use std::io::{
  self,
  Write
};

use anyhow::Context;
use chrono::Utc;
use clap::Parser;
use tracing::{
  debug,
  info
};

pub use calendar_date::CalendarDate;
pub use grid::{
  Mode,
  Month,
  build_months
};
pub use labels::Locale;
pub use window::DateWindow;

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
    "starting colourdar"
  );
  debug!(?pre.rc_overrides, "preprocessed rc overrides");

  let mut cfg = config::Config::load(
    cli.colourdarrc.as_deref()
  )?;
  cfg.apply_overrides(
    pre.rc_overrides.into_iter().chain(
      cli
        .rc_overrides
        .into_iter()
        .map(|kv| (kv.key, kv.value))
    )
  );

  let mut out = io::stdout().lock();

  if cli.show_config {
    let mut entries: Vec<_> =
      cfg.iter().collect();
    entries.sort();
    for (key, value) in entries {
      writeln!(out, "{key} = {value}")?;
    }
    return Ok(());
  }

  let tz =
    datetime::resolve_timezone(&cfg);
  let now_today =
    datetime::today_in(tz, Utc::now());
  let today = match cli.today.as_deref()
  {
    | Some(expr) => {
      datetime::parse_date_expr(
        expr, now_today, tz
      )
      .context(
        "failed to parse --today"
      )?
    }
    | None => now_today
  };

  let target = cli
    .target
    .as_deref()
    .map(|expr| {
      datetime::parse_date_expr(
        expr, today, tz
      )
      .with_context(|| {
        format!(
          "failed to parse target \
           date: {expr}"
        )
      })
    })
    .transpose()?;

  let mode = match cli.mode {
    | Some(mode) => mode,
    | None => cfg
      .get_parsed::<Mode>(
        "default.mode"
      )?
      .unwrap_or_default()
  };
  let locale = match cli.locale {
    | Some(locale) => locale,
    | None => cfg
      .get_parsed::<Locale>("locale")?
      .unwrap_or_default()
  };
  let format = match cli.format {
    | Some(format) => format,
    | None => cfg
      .get_parsed::<cli::OutputFormat>(
        "format"
      )?
      .unwrap_or(
        cli::OutputFormat::Text
      )
  };
  let max_span_days = cfg
    .get_parsed::<u32>(
      "span.max_days"
    )?
    .unwrap_or(3660);

  let request =
    request::CalendarRequest::resolve(
      today,
      target,
      mode,
      max_span_days
    )?;
  let view = request.view(locale);
  info!(
    today = %request.today,
    target = %request.target,
    mode = %mode,
    months = view.months.len(),
    "built calendar"
  );

  let renderer =
    render::Renderer::new(&cfg)?;
  match format {
    | cli::OutputFormat::Text => {
      renderer.render_text(
        &view,
        request.today,
        request.requested_target,
        &mut out
      )?
    }
    | cli::OutputFormat::Json => {
      renderer
        .render_json(&view, &mut out)?
    }
  }

  info!("done");
  Ok(())
}
