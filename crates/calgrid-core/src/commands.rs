use std::io::{
  self,
  Write
};

use chrono::NaiveDate;
use chrono_tz::Tz;
use tracing::{
  info,
  warn
};

use crate::cli::Command;
use crate::config::CalendarConfig;
use crate::event::Event;
use crate::layout::{
  layout_month,
  open_disclosure
};
use crate::overflow::{
  Disclosure,
  DisclosureState
};
use crate::render::Renderer;
use crate::view::{
  day_agenda,
  week_columns
};

/// Everything a command needs, resolved
/// once by `run`.
#[derive(Debug)]
pub struct Invocation<'a> {
  pub command: Command,
  pub focus:   NaiveDate,
  pub today:   NaiveDate,
  pub tz:      Tz,
  pub events:  &'a [Event]
}

#[tracing::instrument(skip_all, fields(command = ?inv.command, focus = %inv.focus))]
pub fn dispatch(
  cfg: &CalendarConfig,
  renderer: &Renderer,
  inv: Invocation<'_>
) -> anyhow::Result<()> {
  info!(
    view = inv.command.view().as_key(),
    events = inv.events.len(),
    "dispatching command"
  );

  match inv.command {
    | Command::Month => {
      let layout = layout_month(
        inv.focus,
        inv.events,
        inv.today,
        cfg.policies.visible_limit,
        inv.tz
      );
      renderer.print_month(&layout, inv.focus)
    }
    | Command::Week => {
      let columns = week_columns(
        inv.events, inv.focus, inv.today,
        inv.tz
      );
      renderer.print_week(&columns, inv.focus)
    }
    | Command::Day => {
      let agenda = day_agenda(
        inv.events,
        inv.focus,
        &cfg.day_view,
        inv.tz
      );
      renderer.print_day(&agenda)
    }
    | Command::Disclose => {
      cmd_disclose(cfg, renderer, &inv)
    }
  }
}

fn cmd_disclose(
  cfg: &CalendarConfig,
  renderer: &Renderer,
  inv: &Invocation<'_>
) -> anyhow::Result<()> {
  let layout = layout_month(
    inv.focus,
    inv.events,
    inv.today,
    cfg.policies.visible_limit,
    inv.tz
  );
  let Some(cell) = layout.cell(inv.focus)
  else {
    warn!(focus = %inv.focus, "focus date missing from its own month grid");
    return Ok(());
  };

  let mut sink =
    |disclosure: &Disclosure| {
      renderer
        .print_disclosure(disclosure)
    };
  let state = open_disclosure(
    DisclosureState::Closed,
    cell,
    inv.tz,
    &mut sink
  )?;

  if state.open_date().is_none() {
    let mut out = io::stdout().lock();
    writeln!(
      out,
      "No hidden events on {} ({} \
       shown).",
      inv.focus.format("%Y-%m-%d"),
      cell.visible.len()
    )?;
  }

  Ok(())
}
