use chrono::NaiveDate;
use chrono_tz::Tz;

use crate::day::{
  events_for_day,
  single_day_subset
};
use crate::event::Event;
use crate::grid::{
  GRID_COLUMNS,
  MonthGrid
};
use crate::overflow::{
  DisclosureSink,
  DisclosureState,
  disclose,
  summarize_overflow
};
use crate::segment::{
  Segment,
  plan_segments
};

/// One cell of the month grid. Borrows
/// from the caller's event slice.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DayCell<'a> {
  pub date:              NaiveDate,
  pub is_current_month:  bool,
  pub is_today:          bool,
  /// Every event touching the day,
  /// multi-day ones included.
  pub all_events:        Vec<&'a Event>,
  pub single_day_events: Vec<&'a Event>,
  pub visible:           Vec<&'a Event>,
  pub overflow_count:    usize
}

impl DayCell<'_> {
  pub fn can_disclose(&self) -> bool {
    self.overflow_count > 0
  }
}

#[derive(Debug, Clone)]
pub struct MonthLayout<'a> {
  pub grid:     MonthGrid,
  pub segments: Vec<Segment>,
  pub cells:    Vec<DayCell<'a>>
}

impl<'a> MonthLayout<'a> {
  pub fn cell(
    &self,
    date: NaiveDate
  ) -> Option<&DayCell<'a>> {
    self
      .grid
      .index_of(date)
      .and_then(|idx| self.cells.get(idx))
  }

  pub fn row_cells(
    &self,
    row: usize
  ) -> &[DayCell<'a>] {
    let start = row * GRID_COLUMNS;
    let end = (start + GRID_COLUMNS)
      .min(self.cells.len());
    self
      .cells
      .get(start..end)
      .unwrap_or(&[])
  }

  pub fn row_segments(
    &self,
    row: usize
  ) -> impl Iterator<Item = &Segment> {
    self
      .segments
      .iter()
      .filter(move |seg| seg.row == row)
  }
}

/// Runs a full layout pass. Nothing is
/// cached between calls.
#[tracing::instrument(skip(events, tz), fields(event_count = events.len()))]
pub fn layout_month<'a>(
  reference: NaiveDate,
  events: &'a [Event],
  today: NaiveDate,
  visible_limit: usize,
  tz: Tz
) -> MonthLayout<'a> {
  let grid =
    MonthGrid::for_month(reference);
  let segments =
    plan_segments(events, &grid, tz);

  let cells = grid
    .dates()
    .iter()
    .map(|date| {
      let all_events =
        events_for_day(events, *date, tz);
      let single_day_events =
        single_day_subset(
          &all_events,
          tz
        );
      let summary = summarize_overflow(
        &single_day_events,
        visible_limit
      );
      DayCell {
        date: *date,
        is_current_month: grid
          .is_current_month(*date),
        is_today: *date == today,
        all_events,
        single_day_events,
        visible: summary.visible,
        overflow_count: summary
          .hidden_count
      }
    })
    .collect::<Vec<_>>();

  tracing::debug!(
    segments = segments.len(),
    overflowing_days = cells
      .iter()
      .filter(|cell| cell.can_disclose())
      .count(),
    "month layout computed"
  );

  MonthLayout {
    grid,
    segments,
    cells
  }
}

/// Feeds the day's full event list to
/// `sink` and returns the opened state.
/// Cells without overflow expose no
/// affordance, so `state` comes back
/// untouched.
pub fn open_disclosure<S>(
  state: DisclosureState,
  cell: &DayCell<'_>,
  tz: Tz,
  sink: &mut S
) -> anyhow::Result<DisclosureState>
where
  S: DisclosureSink + ?Sized
{
  if !cell.can_disclose() {
    tracing::debug!(
      date = %cell.date,
      "no hidden events; disclosure \
       not offered"
    );
    return Ok(state);
  }

  let disclosure = disclose(
    cell.date,
    &cell.all_events,
    tz
  );
  sink.on_disclose(&disclosure)?;
  Ok(state.open(cell.date))
}
