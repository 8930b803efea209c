use chrono::NaiveDate;
use chrono_tz::Tz;

use crate::datetime::{
  add_days,
  to_local_date
};
use crate::event::Event;

/// Every local calendar date from the
/// event's start date through its end
/// date, inclusive. Never empty: an
/// event that ends before it starts
/// yields its start date alone.
#[must_use]
pub fn span_dates(
  event: &Event,
  tz: Tz
) -> Vec<NaiveDate> {
  let first =
    to_local_date(event.start, tz);
  let last = to_local_date(event.end, tz);

  let mut dates = vec![first];
  let mut cursor = first;
  while cursor < last {
    cursor = add_days(cursor, 1);
    dates.push(cursor);
  }
  dates
}

/// Length of the span without
/// allocating it.
#[must_use]
pub fn span_len(
  event: &Event,
  tz: Tz
) -> usize {
  let first =
    to_local_date(event.start, tz);
  let last = to_local_date(event.end, tz);
  let days =
    (last - first).num_days().max(0);
  usize::try_from(days)
    .map_or(1, |days| days + 1)
}

#[must_use]
pub fn is_single_day(
  event: &Event,
  tz: Tz
) -> bool {
  span_len(event, tz) == 1
}

#[must_use]
pub fn is_multi_day(
  event: &Event,
  tz: Tz
) -> bool {
  span_len(event, tz) > 1
}
