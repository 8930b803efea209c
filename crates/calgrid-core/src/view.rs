use chrono::{
  Datelike,
  NaiveDate,
  NaiveTime,
  TimeZone,
  Weekday
};
use chrono_tz::Tz;

use crate::config::DayViewConfig;
use crate::datetime::{
  add_days,
  first_day_of_month,
  last_day_of_month,
  shift_months,
  start_of_week
};
use crate::day::events_for_day;
use crate::event::Event;
use crate::span::is_multi_day;

#[derive(
  Debug, Clone, Copy, Default, PartialEq, Eq,
)]
pub enum ViewMode {
  #[default]
  Month,
  Week,
  Day
}

impl ViewMode {
  pub fn all() -> [Self; 3] {
    [Self::Month, Self::Week, Self::Day]
  }

  pub fn as_key(self) -> &'static str {
    match self {
      | Self::Month => "month",
      | Self::Week => "week",
      | Self::Day => "day"
    }
  }

  pub fn from_key(
    key: &str
  ) -> Option<Self> {
    match key
      .trim()
      .to_ascii_lowercase()
      .as_str()
    {
      | "month" | "m" => {
        Some(Self::Month)
      }
      | "week" | "w" => Some(Self::Week),
      | "day" | "d" => Some(Self::Day),
      | _ => None
    }
  }
}

/// Inclusive date range shown by
/// `view` around `focus`.
pub fn date_window(
  view: ViewMode,
  focus: NaiveDate
) -> (NaiveDate, NaiveDate) {
  match view {
    | ViewMode::Month => {
      (
        first_day_of_month(
          focus.year(),
          focus.month()
        ),
        last_day_of_month(
          focus.year(),
          focus.month()
        )
      )
    }
    | ViewMode::Week => {
      let start = start_of_week(
        focus,
        Weekday::Mon
      );
      (start, add_days(start, 6))
    }
    | ViewMode::Day => (focus, focus)
  }
}

pub fn shift_focus(
  focus: NaiveDate,
  view: ViewMode,
  step: i32
) -> NaiveDate {
  match view {
    | ViewMode::Month => {
      shift_months(focus, step)
    }
    | ViewMode::Week => {
      add_days(focus, i64::from(step) * 7)
    }
    | ViewMode::Day => {
      add_days(focus, i64::from(step))
    }
  }
}

pub fn title_for_view(
  view: ViewMode,
  focus: NaiveDate
) -> String {
  match view {
    | ViewMode::Month => {
      format!(
        "Month View {}",
        focus.format("%B %Y")
      )
    }
    | ViewMode::Week => {
      let (start, end) =
        date_window(view, focus);
      format!(
        "Week View {} - {}",
        start.format("%Y-%m-%d"),
        end.format("%Y-%m-%d")
      )
    }
    | ViewMode::Day => {
      format!(
        "Day View {}",
        focus.format("%A, %Y-%m-%d")
      )
    }
  }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WeekColumn<'a> {
  pub date:     NaiveDate,
  pub is_today: bool,
  pub events:   Vec<&'a Event>
}

/// Monday-through-Sunday columns of
/// the week containing `focus`.
pub fn week_columns<'a>(
  events: &'a [Event],
  focus: NaiveDate,
  today: NaiveDate,
  tz: Tz
) -> Vec<WeekColumn<'a>> {
  let (start, _) =
    date_window(ViewMode::Week, focus);
  (0..7)
    .map(|offset| {
      let date = add_days(start, offset);
      WeekColumn {
        date,
        is_today: date == today,
        events: events_for_day(
          events, date, tz
        )
      }
    })
    .collect()
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DayAgenda<'a> {
  pub date:          NaiveDate,
  /// Multi-day events running through
  /// the day.
  pub all_day:       Vec<&'a Event>,
  /// Single-day events touching the
  /// configured hour window.
  pub timed:         Vec<&'a Event>,
  pub outside_hours: usize
}

pub fn day_agenda<'a>(
  events: &'a [Event],
  date: NaiveDate,
  hours: &DayViewConfig,
  tz: Tz
) -> DayAgenda<'a> {
  let day_events =
    events_for_day(events, date, tz);
  let (window_start, window_end) =
    hour_window(date, hours, tz);

  let mut agenda = DayAgenda {
    date,
    all_day: vec![],
    timed: vec![],
    outside_hours: 0
  };
  for event in day_events {
    if is_multi_day(event, tz) {
      agenda.all_day.push(event);
    } else if event.start <= window_end
      && event.end >= window_start
    {
      agenda.timed.push(event);
    } else {
      agenda.outside_hours += 1;
    }
  }
  agenda
    .timed
    .sort_by_key(|event| event.start);

  tracing::trace!(
    date = %date,
    all_day = agenda.all_day.len(),
    timed = agenda.timed.len(),
    outside_hours = agenda.outside_hours,
    "day agenda built"
  );
  agenda
}

fn hour_window(
  date: NaiveDate,
  hours: &DayViewConfig,
  tz: Tz
) -> (
  chrono::DateTime<chrono::Utc>,
  chrono::DateTime<chrono::Utc>
) {
  let (day_start, day_end) =
    crate::datetime::day_bounds(date, tz);
  let start = NaiveTime::from_hms_opt(
    hours.hour_start,
    0,
    0
  )
  .and_then(|t| {
    tz.from_local_datetime(
      &date.and_time(t)
    )
    .earliest()
  })
  .map_or(day_start, |dt| {
    dt.with_timezone(&chrono::Utc)
  });
  let end = NaiveTime::from_hms_milli_opt(
    hours.hour_end,
    59,
    59,
    999
  )
  .and_then(|t| {
    tz.from_local_datetime(
      &date.and_time(t)
    )
    .latest()
  })
  .map_or(day_end, |dt| {
    dt.with_timezone(&chrono::Utc)
  });
  (start, end)
}

#[cfg(test)]
mod tests {
  use chrono::{
    DateTime,
    TimeZone,
    Utc
  };

  use super::*;

  fn date(
    m: u32,
    d: u32
  ) -> NaiveDate {
    NaiveDate::from_ymd_opt(2025, m, d)
      .expect("valid date")
  }

  fn at(
    d: u32,
    h: u32
  ) -> DateTime<Utc> {
    Utc
      .with_ymd_and_hms(2025, 6, d, h, 0, 0)
      .single()
      .expect("valid instant")
  }

  #[test]
  fn view_keys_round_trip() {
    for view in ViewMode::all() {
      assert_eq!(
        ViewMode::from_key(view.as_key()),
        Some(view)
      );
    }
    assert_eq!(ViewMode::from_key("year"), None);
  }

  #[test]
  fn week_window_runs_monday_to_sunday() {
    assert_eq!(
      date_window(ViewMode::Week, date(6, 18)),
      (date(6, 16), date(6, 22))
    );
    assert_eq!(
      date_window(ViewMode::Month, date(2, 9)),
      (date(2, 1), date(2, 28))
    );
  }

  #[test]
  fn shifting_focus_moves_by_view_unit() {
    assert_eq!(
      shift_focus(date(1, 31), ViewMode::Month, 1),
      date(2, 28)
    );
    assert_eq!(
      shift_focus(date(6, 18), ViewMode::Week, -1),
      date(6, 11)
    );
    assert_eq!(
      shift_focus(date(6, 30), ViewMode::Day, 1),
      date(7, 1)
    );
  }

  #[test]
  fn titles_describe_the_period() {
    assert_eq!(
      title_for_view(ViewMode::Month, date(6, 18)),
      "Month View June 2025"
    );
    assert_eq!(
      title_for_view(ViewMode::Week, date(6, 18)),
      "Week View 2025-06-16 - 2025-06-22"
    );
  }

  #[test]
  fn week_columns_list_overlapping_events() {
    let events = vec![
      Event::new("a", "a", at(17, 9), at(17, 10)),
      Event::new("b", "b", at(21, 9), at(23, 10)),
    ];
    let columns = week_columns(
      &events,
      date(6, 18),
      date(6, 17),
      chrono_tz::UTC
    );
    assert_eq!(columns.len(), 7);
    assert_eq!(columns[1].events.len(), 1);
    assert!(columns[1].is_today);
    assert_eq!(columns[5].events.len(), 1);
    assert_eq!(columns[6].events.len(), 1);
  }

  #[test]
  fn day_agenda_splits_by_span_and_hours() {
    let events = vec![
      Event::new("late", "late", at(15, 14), at(15, 15)),
      Event::new("early", "early", at(15, 5), at(15, 6)),
      Event::new("morning", "morning", at(15, 9), at(15, 10)),
      Event::new("multi", "multi", at(14, 9), at(16, 9)),
    ];
    let hours = DayViewConfig {
      hour_start: 8,
      hour_end:   18
    };
    let agenda = day_agenda(
      &events,
      date(6, 15),
      &hours,
      chrono_tz::UTC
    );
    assert_eq!(agenda.all_day.len(), 1);
    let timed = agenda
      .timed
      .iter()
      .map(|e| e.id.as_str())
      .collect::<Vec<_>>();
    assert_eq!(timed, vec!["morning", "late"]);
    assert_eq!(agenda.outside_hours, 1);
  }
}
