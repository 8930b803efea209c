use anyhow::{
  Context,
  anyhow
};
use chrono::{
  DateTime,
  Datelike,
  LocalResult,
  NaiveDate,
  NaiveDateTime,
  NaiveTime,
  Offset,
  TimeDelta,
  TimeZone,
  Utc,
  Weekday
};
use chrono_tz::Tz;
use regex::Regex;

pub const TIMEZONE_ENV_VAR: &str =
  "CALGRID_TIMEZONE";

/// Resolves the timezone used for
/// calendar-day boundaries. The env
/// var wins over the configured value;
/// anything unparseable falls back to
/// UTC.
pub fn resolve_timezone(
  configured: Option<&str>
) -> Tz {
  let from_env =
    std::env::var(TIMEZONE_ENV_VAR).ok();
  resolve_timezone_from(
    from_env.as_deref(),
    configured
  )
}

/// Same ordering as
/// [`resolve_timezone`] with the env
/// value passed in.
pub fn resolve_timezone_from(
  from_env: Option<&str>,
  configured: Option<&str>
) -> Tz {
  if let Some(raw) = from_env
    && let Some(tz) = parse_timezone(
      raw,
      TIMEZONE_ENV_VAR
    )
  {
    return tz;
  }

  if let Some(raw) = configured
    && let Some(tz) =
      parse_timezone(raw, "config")
  {
    return tz;
  }

  tracing::debug!(
    "no timezone configured; using \
     UTC"
  );
  chrono_tz::UTC
}

pub fn parse_timezone(
  raw: &str,
  source: &str
) -> Option<Tz> {
  let trimmed = raw.trim();
  if trimmed.is_empty() {
    tracing::warn!(
      source,
      "timezone source was empty"
    );
    return None;
  }

  match trimmed.parse::<Tz>() {
    | Ok(tz) => {
      tracing::info!(
        source,
        timezone = %trimmed,
        "configured calendar timezone"
      );
      Some(tz)
    }
    | Err(err) => {
      tracing::error!(
        source,
        timezone = %trimmed,
        error = %err,
        "failed to parse timezone id"
      );
      None
    }
  }
}

#[must_use]
pub fn to_local_date(
  instant: DateTime<Utc>,
  tz: Tz
) -> NaiveDate {
  instant.with_timezone(&tz).date_naive()
}

/// First and last instant of `date`
/// in `tz`, i.e. 00:00:00.000 and
/// 23:59:59.999 local time.
#[must_use]
pub fn day_bounds(
  date: NaiveDate,
  tz: Tz
) -> (DateTime<Utc>, DateTime<Utc>) {
  let start =
    date.and_time(NaiveTime::MIN);
  let end = date.and_time(
    NaiveTime::from_hms_milli_opt(
      23, 59, 59, 999
    )
    .unwrap_or(NaiveTime::MIN)
  );
  (
    local_to_utc(start, tz, true),
    local_to_utc(end, tz, false)
  )
}

fn local_to_utc(
  local_naive: NaiveDateTime,
  tz: Tz,
  earliest: bool
) -> DateTime<Utc> {
  match tz
    .from_local_datetime(&local_naive)
  {
    | LocalResult::Single(local_dt) => {
      local_dt.with_timezone(&Utc)
    }
    | LocalResult::Ambiguous(
      first,
      second
    ) => {
      let (lo, hi) = if first <= second
      {
        (first, second)
      } else {
        (second, first)
      };
      if earliest {
        lo.with_timezone(&Utc)
      } else {
        hi.with_timezone(&Utc)
      }
    }
    | LocalResult::None => {
      // Local time falls in a DST gap;
      // shift by the offset in force at
      // that wall-clock reading.
      let shift = TimeDelta::seconds(
        i64::from(
          tz.offset_from_utc_datetime(
            &local_naive
          )
          .fix()
          .local_minus_utc()
        )
      );
      tracing::trace!(
        local = %local_naive,
        timezone = %tz,
        "local time does not exist; \
         shifting by utc offset"
      );
      Utc.from_utc_datetime(
        &(local_naive - shift)
      )
    }
  }
}

#[must_use]
pub fn first_day_of_month(
  year: i32,
  month: u32
) -> NaiveDate {
  NaiveDate::from_ymd_opt(
    year, month, 1
  )
  .unwrap_or(NaiveDate::MIN)
}

#[must_use]
pub fn last_day_of_month(
  year: i32,
  month: u32
) -> NaiveDate {
  let (next_year, next_month) =
    if month >= 12 {
      (year.saturating_add(1), 1_u32)
    } else {
      (year, month + 1)
    };
  add_days(
    first_day_of_month(
      next_year, next_month
    ),
    -1
  )
}

#[must_use]
pub fn days_in_month(
  year: i32,
  month: u32
) -> u32 {
  last_day_of_month(year, month).day()
}

/// `None` when the result leaves
/// chrono's representable range.
#[must_use]
pub fn checked_add_days(
  date: NaiveDate,
  days: i64
) -> Option<NaiveDate> {
  TimeDelta::try_days(days).and_then(
    |delta| date.checked_add_signed(delta)
  )
}

#[must_use]
pub fn add_days(
  date: NaiveDate,
  days: i64
) -> NaiveDate {
  checked_add_days(date, days)
    .unwrap_or(date)
}

/// Moves `date` by whole months,
/// clamping the day to the target
/// month's length.
#[must_use]
pub fn checked_shift_months(
  date: NaiveDate,
  months: i32
) -> Option<NaiveDate> {
  let total = i64::from(date.year()) * 12
    + i64::from(date.month0())
    + i64::from(months);
  let year =
    i32::try_from(total.div_euclid(12))
      .ok()?;
  let month =
    u32::try_from(total.rem_euclid(12))
      .ok()?
      + 1;
  let first =
    NaiveDate::from_ymd_opt(year, month, 1)?;
  let day = date
    .day()
    .min(days_in_month(year, month));
  first.with_day(day)
}

#[must_use]
pub fn shift_months(
  date: NaiveDate,
  months: i32
) -> NaiveDate {
  checked_shift_months(date, months)
    .unwrap_or(date)
}

#[must_use]
pub fn start_of_week(
  day: NaiveDate,
  week_start: Weekday
) -> NaiveDate {
  let day_idx = day
    .weekday()
    .num_days_from_monday()
    as i64;
  let start_idx = week_start
    .num_days_from_monday()
    as i64;
  let diff =
    (7 + day_idx - start_idx) % 7;
  add_days(day, -diff)
}

#[tracing::instrument(skip(today), fields(input = input))]
pub fn parse_date_expr(
  input: &str,
  today: NaiveDate
) -> anyhow::Result<NaiveDate> {
  let token = input.trim();
  let lower =
    token.to_ascii_lowercase();

  match lower.as_str() {
    | "today" => return Ok(today),
    | "tomorrow" => {
      return Ok(add_days(today, 1));
    }
    | "yesterday" => {
      return Ok(add_days(today, -1));
    }
    | _ => {}
  }

  let rel_re = Regex::new(
    r"^(?P<sign>[+-])(?P<num>\d+)(?P<unit>[dwm])$"
  )
  .map_err(|e| {
    anyhow!(
      "internal regex compile \
       failure: {e}"
    )
  })?;

  if let Some(caps) =
    rel_re.captures(&lower)
  {
    let sign = caps
      .name("sign")
      .map(|m| m.as_str())
      .ok_or_else(|| {
        anyhow!("missing relative sign")
      })?;
    let num: i64 = caps
      .name("num")
      .map(|m| m.as_str())
      .ok_or_else(|| {
        anyhow!(
          "missing relative amount"
        )
      })?
      .parse()
      .context(
        "invalid relative number"
      )?;
    let num =
      if sign == "-" { -num } else { num };
    let unit = caps
      .name("unit")
      .map(|m| m.as_str())
      .ok_or_else(|| {
        anyhow!("missing relative unit")
      })?;

    let shifted = match unit {
      | "d" => checked_add_days(today, num),
      | "w" => num
        .checked_mul(7)
        .and_then(|days| {
          checked_add_days(today, days)
        }),
      | "m" => i32::try_from(num)
        .ok()
        .and_then(|months| {
          checked_shift_months(
            today, months
          )
        }),
      | _ => {
        return Err(anyhow!(
          "unknown relative unit: \
           {unit}"
        ));
      }
    };
    return shifted.ok_or_else(|| {
      anyhow!(
        "relative offset out of range: \
         {token}"
      )
    });
  }

  if let Ok(date) =
    NaiveDate::parse_from_str(
      token, "%Y-%m-%d"
    )
  {
    return Ok(date);
  }

  if let Some((year, month)) =
    token.split_once('-')
    && year.len() == 4
    && let (Ok(year), Ok(month)) = (
      year.parse::<i32>(),
      month.parse::<u32>()
    )
  {
    return NaiveDate::from_ymd_opt(
      year, month, 1
    )
    .ok_or_else(|| {
      anyhow!(
        "invalid year/month: {token}"
      )
    });
  }

  Err(anyhow!(
    "unrecognized date expression: \
     {input}"
  ))
  .with_context(|| {
    "supported formats: \
     today/tomorrow/yesterday, \
     +Nd/-Nd, +Nw/-Nw, +Nm/-Nm, \
     YYYY-MM-DD, YYYY-MM"
  })
}
