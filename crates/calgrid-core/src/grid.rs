use std::collections::HashMap;

use chrono::{
  Datelike,
  NaiveDate,
  Weekday
};

use crate::datetime::{
  add_days,
  first_day_of_month,
  start_of_week
};

pub const GRID_ROWS: usize = 6;
pub const GRID_COLUMNS: usize = 7;
pub const GRID_DAYS: usize =
  GRID_ROWS * GRID_COLUMNS;

/// The 42 dates of a month view, Monday
/// first. Index 0 is the Monday on or
/// before the first of the month.
#[must_use]
pub fn build_grid(
  reference: NaiveDate
) -> [NaiveDate; GRID_DAYS] {
  let first = first_day_of_month(
    reference.year(),
    reference.month()
  );
  let grid_start =
    start_of_week(first, Weekday::Mon);
  std::array::from_fn(|offset| {
    add_days(grid_start, offset as i64)
  })
}

#[derive(
  Debug, Clone, Copy, PartialEq, Eq,
)]
pub struct GridPosition {
  pub row:    usize,
  pub column: usize
}

impl GridPosition {
  #[must_use]
  pub fn from_index(
    index: usize
  ) -> Self {
    Self {
      row:    index / GRID_COLUMNS,
      column: index % GRID_COLUMNS
    }
  }
}

#[derive(Debug, Clone)]
pub struct MonthGrid {
  year:  i32,
  month: u32,
  dates: [NaiveDate; GRID_DAYS],
  index: HashMap<NaiveDate, usize>
}

impl MonthGrid {
  #[must_use]
  pub fn for_month(
    reference: NaiveDate
  ) -> Self {
    let dates = build_grid(reference);
    let index = dates
      .iter()
      .enumerate()
      .map(|(idx, date)| (*date, idx))
      .collect();
    tracing::trace!(
      reference = %reference,
      grid_start = %dates[0],
      grid_end = %dates[GRID_DAYS - 1],
      "built month grid"
    );
    Self {
      year: reference.year(),
      month: reference.month(),
      dates,
      index
    }
  }

  pub fn year(&self) -> i32 {
    self.year
  }

  pub fn month(&self) -> u32 {
    self.month
  }

  pub fn dates(
    &self
  ) -> &[NaiveDate; GRID_DAYS] {
    &self.dates
  }

  /// Exact-date lookup; `None` means
  /// the date is not displayed.
  pub fn index_of(
    &self,
    date: NaiveDate
  ) -> Option<usize> {
    self.index.get(&date).copied()
  }

  pub fn position_of(
    &self,
    date: NaiveDate
  ) -> Option<GridPosition> {
    self
      .index_of(date)
      .map(GridPosition::from_index)
  }

  pub fn is_current_month(
    &self,
    date: NaiveDate
  ) -> bool {
    date.year() == self.year
      && date.month() == self.month
  }

  pub fn rows(
    &self
  ) -> impl Iterator<Item = &[NaiveDate]>
  {
    self.dates.chunks(GRID_COLUMNS)
  }
}

impl PartialEq for MonthGrid {
  fn eq(
    &self,
    other: &Self
  ) -> bool {
    self.dates == other.dates
  }
}

impl Eq for MonthGrid {}

#[cfg(test)]
mod tests {
  use chrono::{
    Datelike,
    NaiveDate,
    Weekday
  };

  use super::*;
  use crate::datetime::{
    add_days,
    days_in_month
  };

  fn date(
    y: i32,
    m: u32,
    d: u32
  ) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d)
      .expect("valid date")
  }

  #[test]
  fn grid_is_42_consecutive_days_from_monday(
  ) {
    for month in 1..=12 {
      let grid =
        build_grid(date(2025, month, 10));
      assert_eq!(grid.len(), 42);
      assert_eq!(
        grid[0].weekday(),
        Weekday::Mon
      );
      for pair in grid.windows(2) {
        assert_eq!(
          add_days(pair[0], 1),
          pair[1]
        );
      }
    }
  }

  #[test]
  fn grid_covers_whole_month() {
    for month in 1..=12 {
      let grid =
        MonthGrid::for_month(date(
          2026, month, 1
        ));
      for day in
        1..=days_in_month(2026, month)
      {
        assert!(
          grid
            .index_of(date(
              2026, month, day
            ))
            .is_some()
        );
      }
    }
  }

  #[test]
  fn sunday_first_of_month_starts_six_days_back(
  ) {
    // 2025-06-01 is a Sunday.
    let grid = build_grid(date(2025, 6, 1));
    assert_eq!(grid[0], date(2025, 5, 26));
    assert_eq!(grid[6], date(2025, 6, 1));
  }

  #[test]
  fn monday_first_of_month_starts_on_itself(
  ) {
    // 2025-09-01 is a Monday.
    let grid =
      build_grid(date(2025, 9, 20));
    assert_eq!(grid[0], date(2025, 9, 1));
  }

  #[test]
  fn same_month_gives_same_grid() {
    let reference =
      MonthGrid::for_month(date(
        2024, 2, 1
      ));
    for day in 1..=29 {
      assert_eq!(
        MonthGrid::for_month(date(
          2024, 2, day
        )),
        reference
      );
    }
  }

  #[test]
  fn positions_map_to_rows_and_columns(
  ) {
    let grid =
      MonthGrid::for_month(date(
        2025, 6, 15
      ));
    assert_eq!(
      grid.position_of(date(2025, 6, 28)),
      Some(GridPosition {
        row:    4,
        column: 5
      })
    );
    assert_eq!(
      grid.position_of(date(2025, 6, 30)),
      Some(GridPosition {
        row:    5,
        column: 0
      })
    );
    assert_eq!(
      grid.position_of(date(2025, 8, 1)),
      None
    );
    assert_eq!(grid.rows().count(), 6);
  }
}
