use chrono::NaiveDate;
use chrono_tz::Tz;
use serde::Serialize;

use crate::event::Event;

pub const DEFAULT_VISIBLE_LIMIT: usize = 3;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OverflowSummary<T> {
  pub visible:      Vec<T>,
  pub hidden_count: usize
}

impl<T> OverflowSummary<T> {
  pub fn has_overflow(&self) -> bool {
    self.hidden_count > 0
  }
}

/// Keeps the first `visible_limit`
/// items in order and counts the rest.
pub fn summarize_overflow<T: Clone>(
  items: &[T],
  visible_limit: usize
) -> OverflowSummary<T> {
  let capped =
    items.len().min(visible_limit);
  OverflowSummary {
    visible:      items[..capped]
      .to_vec(),
    hidden_count: items
      .len()
      .saturating_sub(visible_limit)
  }
}

/// One line of the day detail view.
#[derive(
  Debug, Clone, PartialEq, Eq, Serialize,
)]
pub struct DisclosureEntry {
  pub id:         String,
  pub title:      String,
  pub time_range: String,
  pub facility:   Option<String>
}

/// Everything the detail view for one
/// day needs. Built from the full day
/// list, multi-day events included,
/// not from the single-day list that
/// the cell shows.
#[derive(
  Debug, Clone, PartialEq, Eq, Serialize,
)]
pub struct Disclosure {
  pub date:    NaiveDate,
  pub entries: Vec<DisclosureEntry>
}

pub fn disclose(
  date: NaiveDate,
  full_day_events: &[&Event],
  tz: Tz
) -> Disclosure {
  Disclosure {
    date,
    entries: full_day_events
      .iter()
      .map(|event| DisclosureEntry {
        id:         event.id.clone(),
        title:      event.title.clone(),
        time_range: event
          .time_range_label(tz),
        facility:   event
          .facility
          .clone()
      })
      .collect()
  }
}

/// Open/closed state of the detail
/// view. Owned by the caller and
/// threaded through explicitly.
#[derive(
  Debug, Clone, Copy, Default, PartialEq, Eq,
)]
pub enum DisclosureState {
  #[default]
  Closed,
  Open(NaiveDate)
}

impl DisclosureState {
  #[must_use]
  pub fn open(
    self,
    date: NaiveDate
  ) -> Self {
    Self::Open(date)
  }

  #[must_use]
  pub fn close(self) -> Self {
    Self::Closed
  }

  pub fn open_date(
    self
  ) -> Option<NaiveDate> {
    match self {
      | Self::Open(date) => Some(date),
      | Self::Closed => None
    }
  }

  pub fn is_open_for(
    self,
    date: NaiveDate
  ) -> bool {
    self.open_date() == Some(date)
  }
}

/// Seam into the presentation layer
/// that shows a day's full event list.
pub trait DisclosureSink {
  fn on_disclose(
    &mut self,
    disclosure: &Disclosure
  ) -> anyhow::Result<()>;
}

impl<F> DisclosureSink for F
where
  F: FnMut(&Disclosure) -> anyhow::Result<()>
{
  fn on_disclose(
    &mut self,
    disclosure: &Disclosure
  ) -> anyhow::Result<()> {
    self(disclosure)
  }
}
