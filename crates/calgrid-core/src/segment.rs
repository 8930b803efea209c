use chrono::NaiveDate;
use chrono_tz::Tz;
use serde::Serialize;

use crate::datetime::to_local_date;
use crate::event::Event;
use crate::grid::{
  GRID_COLUMNS,
  GridPosition,
  MonthGrid
};
use crate::span::span_dates;

/// One row-bounded horizontal bar of a
/// multi-day event. Identity is
/// `(event_id, row)`.
#[derive(
  Debug, Clone, PartialEq, Eq, Serialize,
)]
pub struct Segment {
  pub event_id:     String,
  pub row:          usize,
  pub start_column: usize,
  pub end_column:   usize,
  pub span_dates:   Vec<NaiveDate>
}

impl Segment {
  pub fn key(&self) -> (&str, usize) {
    (self.event_id.as_str(), self.row)
  }

  pub fn width(&self) -> usize {
    self.end_column - self.start_column
      + 1
  }

  /// True when the event continues
  /// from the previous row.
  pub fn continues_left(
    &self,
    grid: &MonthGrid
  ) -> bool {
    self.span_dates.first().is_some_and(
      |first| {
        grid
          .position_of(*first)
          .is_some_and(|pos| {
            pos.row < self.row
          })
      }
    )
  }

  /// True when the event continues on
  /// the next row.
  pub fn continues_right(
    &self,
    grid: &MonthGrid
  ) -> bool {
    self.span_dates.last().is_some_and(
      |last| {
        grid
          .position_of(*last)
          .is_some_and(|pos| {
            pos.row > self.row
          })
      }
    )
  }
}

/// Places every multi-day event on the
/// grid as one segment per row it
/// touches. Single-day events and
/// events whose first or last date is
/// not displayed contribute nothing.
#[tracing::instrument(skip_all, fields(event_count = events.len(), year = grid.year(), month = grid.month()))]
pub fn plan_segments(
  events: &[Event],
  grid: &MonthGrid,
  tz: Tz
) -> Vec<Segment> {
  let segments = events.iter().fold(
    Vec::new(),
    |mut acc, event| {
      acc.extend(segments_for_event(
        event, grid, tz
      ));
      acc
    }
  );
  tracing::debug!(
    segments = segments.len(),
    "planned multi-day segments"
  );
  segments
}

fn segments_for_event(
  event: &Event,
  grid: &MonthGrid,
  tz: Tz
) -> Vec<Segment> {
  let first =
    to_local_date(event.start, tz);
  let last = to_local_date(event.end, tz);
  if last <= first {
    return vec![];
  }

  let (Some(start), Some(end)) = (
    grid.position_of(first),
    grid.position_of(last)
  ) else {
    tracing::trace!(
      event_id = %event.id,
      first = %first,
      last = %last,
      "multi-day event not fully on \
       grid; omitted"
    );
    return vec![];
  };

  // Both ends are on the grid, so the
  // span is at most 42 dates.
  let span = span_dates(event, tz);
  row_ranges(start, end)
    .into_iter()
    .map(
      |(row, start_column, end_column)| {
        Segment {
          event_id: event.id.clone(),
          row,
          start_column,
          end_column,
          span_dates: span.clone()
        }
      }
    )
    .collect()
}

/// `(row, start_column, end_column)`
/// for each row between two grid
/// positions, inclusive.
fn row_ranges(
  start: GridPosition,
  end: GridPosition
) -> Vec<(usize, usize, usize)> {
  let last_column = GRID_COLUMNS - 1;
  if start.row == end.row {
    return vec![(
      start.row,
      start.column,
      end.column
    )];
  }

  (start.row..=end.row)
    .map(|row| {
      if row == start.row {
        (row, start.column, last_column)
      } else if row == end.row {
        (row, 0, end.column)
      } else {
        (row, 0, last_column)
      }
    })
    .collect()
}

#[cfg(test)]
mod tests {
  use std::collections::HashSet;

  use chrono::{
    NaiveDate,
    TimeZone,
    Utc
  };

  use super::*;

  fn at(
    m: u32,
    d: u32,
    h: u32
  ) -> chrono::DateTime<Utc> {
    Utc
      .with_ymd_and_hms(2025, m, d, h, 0, 0)
      .single()
      .expect("valid instant")
  }

  fn june_grid() -> MonthGrid {
    MonthGrid::for_month(
      NaiveDate::from_ymd_opt(2025, 6, 1)
        .expect("valid date")
    )
  }

  #[test]
  fn single_day_events_produce_no_segments(
  ) {
    let events = vec![Event::new(
      "a",
      "clinic",
      at(6, 15, 8),
      at(6, 15, 9)
    )];
    assert!(
      plan_segments(
        &events,
        &june_grid(),
        chrono_tz::UTC
      )
      .is_empty()
    );
  }

  #[test]
  fn event_within_one_row_gets_one_segment(
  ) {
    // Tue 10th through Thu 12th.
    let events = vec![Event::new(
      "a",
      "audit",
      at(6, 10, 9),
      at(6, 12, 17)
    )];
    let segments = plan_segments(
      &events,
      &june_grid(),
      chrono_tz::UTC
    );
    assert_eq!(segments.len(), 1);
    assert_eq!(segments[0].row, 2);
    assert_eq!(segments[0].start_column, 1);
    assert_eq!(segments[0].end_column, 3);
    assert_eq!(segments[0].width(), 3);
  }

  #[test]
  fn saturday_to_tuesday_splits_into_two_rows(
  ) {
    let events = vec![Event::new(
      "a",
      "retreat",
      at(6, 14, 9),
      at(6, 17, 17)
    )];
    let grid = june_grid();
    let segments = plan_segments(
      &events,
      &grid,
      chrono_tz::UTC
    );
    assert_eq!(segments.len(), 2);
    assert_eq!(
      (
        segments[0].row,
        segments[0].start_column,
        segments[0].end_column
      ),
      (2, 5, 6)
    );
    assert_eq!(
      (
        segments[1].row,
        segments[1].start_column,
        segments[1].end_column
      ),
      (3, 0, 1)
    );
    assert_eq!(
      segments[0].span_dates,
      segments[1].span_dates
    );
    assert!(segments[0].continues_right(&grid));
    assert!(!segments[0].continues_left(&grid));
    assert!(segments[1].continues_left(&grid));
    assert!(!segments[1].continues_right(&grid));
  }

  #[test]
  fn long_event_fills_interior_rows() {
    let events = vec![Event::new(
      "a",
      "conference",
      at(6, 4, 9),
      at(6, 25, 17)
    )];
    let segments = plan_segments(
      &events,
      &june_grid(),
      chrono_tz::UTC
    );
    let ranges = segments
      .iter()
      .map(|s| {
        (s.row, s.start_column, s.end_column)
      })
      .collect::<Vec<_>>();
    assert_eq!(ranges, vec![
      (1, 2, 6),
      (2, 0, 6),
      (3, 0, 6),
      (4, 0, 2)
    ]);
    let keys = segments
      .iter()
      .map(Segment::key)
      .collect::<HashSet<_>>();
    assert_eq!(keys.len(), segments.len());
  }

  #[test]
  fn event_leaving_the_grid_is_omitted() {
    let events = vec![
      Event::new(
        "spill",
        "spill",
        at(7, 5, 9),
        at(7, 9, 17)
      ),
      Event::new(
        "before",
        "before",
        at(5, 1, 9),
        at(5, 3, 17)
      ),
    ];
    assert!(
      plan_segments(
        &events,
        &june_grid(),
        chrono_tz::UTC
      )
      .is_empty()
    );
  }

  #[test]
  fn years_long_and_inverted_events_get_no_segments(
  ) {
    let decade_start = Utc
      .with_ymd_and_hms(2020, 1, 1, 0, 0, 0)
      .single()
      .expect("valid instant");
    let decade_end = Utc
      .with_ymd_and_hms(2030, 1, 1, 0, 0, 0)
      .single()
      .expect("valid instant");
    let events = vec![
      Event::new(
        "decade",
        "lease",
        decade_start,
        decade_end
      ),
      Event::new(
        "inverted",
        "typo",
        at(6, 20, 9),
        at(6, 17, 9)
      ),
    ];
    assert!(
      plan_segments(
        &events,
        &june_grid(),
        chrono_tz::UTC
      )
      .is_empty()
    );
  }

  #[test]
  fn segments_carry_the_full_span() {
    let event = Event::new(
      "a",
      "retreat",
      at(6, 14, 9),
      at(6, 17, 17)
    );
    let segments = plan_segments(
      std::slice::from_ref(&event),
      &june_grid(),
      chrono_tz::UTC
    );
    for segment in &segments {
      assert_eq!(
        segment.span_dates,
        span_dates(&event, chrono_tz::UTC)
      );
    }
    assert_eq!(segments.len(), 2);
  }

  #[test]
  fn planning_is_idempotent() {
    let events = vec![
      Event::new(
        "a",
        "a",
        at(6, 28, 10),
        at(6, 30, 14)
      ),
      Event::new(
        "b",
        "b",
        at(6, 2, 10),
        at(6, 3, 14)
      ),
    ];
    let grid = june_grid();
    assert_eq!(
      plan_segments(
        &events,
        &grid,
        chrono_tz::UTC
      ),
      plan_segments(
        &events,
        &grid,
        chrono_tz::UTC
      )
    );
  }
}
