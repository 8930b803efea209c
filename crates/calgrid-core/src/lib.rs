pub mod cli;
pub mod commands;
pub mod config;
pub mod datetime;
pub mod day;
pub mod event;
pub mod grid;
pub mod layout;
pub mod overflow;
pub mod render;
pub mod segment;
pub mod span;
pub mod view;

use std::ffi::OsString;

use anyhow::Context;
use chrono::Utc;
use clap::Parser;
use tracing::{
  debug,
  info,
  warn
};

pub use crate::day::{
  events_for_day,
  single_day_subset
};
pub use crate::event::Event;
pub use crate::grid::{
  MonthGrid,
  build_grid
};
pub use crate::layout::{
  DayCell,
  MonthLayout,
  layout_month
};
pub use crate::overflow::{
  DEFAULT_VISIBLE_LIMIT,
  summarize_overflow
};
pub use crate::segment::{
  Segment,
  plan_segments
};
pub use crate::span::span_dates;

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
    "starting calgrid"
  );
  debug!(?pre.rc_overrides, "preprocessed rc overrides");

  let mut cfg =
    config::CalendarConfig::load(
      cli.config.as_deref()
    )?;
  cfg
    .apply_overrides(
      pre.rc_overrides.into_iter().chain(
        cli
          .rc_overrides
          .into_iter()
          .map(|kv| (kv.key, kv.value))
      )
    )
    .context(
      "failed to apply config \
       overrides"
    )?;

  let tz = cfg.timezone();
  let now_date =
    datetime::to_local_date(
      Utc::now(),
      tz
    );
  let today = match cli.today.as_deref()
  {
    | Some(expr) => {
      datetime::parse_date_expr(
        expr, now_date
      )
      .context(
        "failed to parse --today"
      )?
    }
    | None => now_date
  };
  let focus =
    datetime::parse_date_expr(
      &cli.date, today
    )
    .context("failed to parse --date")?;

  let events = match cli.events.as_deref()
  {
    | Some(path) => {
      event::load_events(path)
        .with_context(|| {
          format!(
            "failed to load events from \
             {}",
            path.display()
          )
        })?
    }
    | None => {
      warn!(
        "no --events file given; \
         rendering an empty calendar"
      );
      vec![]
    }
  };

  let renderer =
    render::Renderer::new(&cfg, tz);
  let inv = commands::Invocation {
    command: cli
      .command
      .unwrap_or(cli::Command::Month),
    focus,
    today,
    tz,
    events: &events
  };

  commands::dispatch(
    &cfg, &renderer, inv
  )?;

  info!("done");
  Ok(())
}
