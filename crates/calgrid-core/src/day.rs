use chrono::NaiveDate;
use chrono_tz::Tz;

use crate::datetime::day_bounds;
use crate::event::Event;
use crate::span::is_single_day;

/// Events whose instant range touches
/// `date`. Both ends are inclusive, so
/// an event ending exactly at local
/// midnight still belongs to the day
/// that midnight opens. Input order is
/// kept.
pub fn events_for_day<'a>(
  events: &'a [Event],
  date: NaiveDate,
  tz: Tz
) -> Vec<&'a Event> {
  let (day_start, day_end) =
    day_bounds(date, tz);
  events
    .iter()
    .filter(|event| {
      event.start <= day_end
        && event.end >= day_start
    })
    .collect()
}

/// Keeps the events whose span is one
/// calendar date; multi-day events are
/// drawn as segments instead.
pub fn single_day_subset<'a>(
  day_events: &[&'a Event],
  tz: Tz
) -> Vec<&'a Event> {
  day_events
    .iter()
    .copied()
    .filter(|event| {
      is_single_day(event, tz)
    })
    .collect()
}
