use std::fs;
use std::path::{
  Path,
  PathBuf
};

use anyhow::{
  Context,
  anyhow
};
use chrono::{
  DateTime,
  Datelike,
  Month,
  Months,
  NaiveDate,
  Utc,
  Weekday
};
use chrono_tz::Tz;
use regex::Regex;
use serde::Deserialize;
use tracing::{
  debug,
  trace,
  warn
};

use crate::calendar_date::CalendarDate;
use crate::config::Config;
use crate::labels::Locale;

const TIMEZONE_FILE: &str =
  "colourdar-time.toml";
const TIMEZONE_ENV_VAR: &str =
  "COLOURDAR_TIMEZONE";
const TIMEZONE_FILE_ENV_VAR: &str =
  "COLOURDAR_TIME_CONFIG";
const DEFAULT_TIMEZONE: Tz =
  chrono_tz::Europe::Paris;

/// `colourdar-time.toml`: either a
/// top-level `timezone` or one under
/// `[time]`.
#[derive(Debug, Deserialize)]
struct TimezoneFile {
  timezone: Option<String>,
  time:     Option<TimeSection>
}

#[derive(Debug, Deserialize)]
struct TimeSection {
  timezone: Option<String>
}

/// Zone in which "today" is computed.
///
/// Checked in order: `COLOURDAR_TIMEZONE`, the `timezone` config key, a
/// `colourdar-time.toml` file, then Europe/Paris.
pub fn resolve_timezone(
  cfg: &Config
) -> Tz {
  let from_env = std::env::var(
    TIMEZONE_ENV_VAR
  )
  .ok()
  .and_then(|raw| {
    parse_timezone(
      &raw,
      TIMEZONE_ENV_VAR
    )
  });

  from_env
    .or_else(|| {
      cfg.get("timezone").and_then(
        |raw| {
          parse_timezone(
            &raw,
            "colourdarrc"
          )
        }
      )
    })
    .or_else(|| {
      timezone_file_path().and_then(
        |path| timezone_from_file(&path)
      )
    })
    .unwrap_or(DEFAULT_TIMEZONE)
}

#[must_use]
pub fn today_in(
  tz: Tz,
  now: DateTime<Utc>
) -> NaiveDate {
  now.with_timezone(&tz).date_naive()
}

fn timezone_file_path()
-> Option<PathBuf> {
  match std::env::var(
    TIMEZONE_FILE_ENV_VAR
  ) {
    | Ok(raw) if !raw.trim().is_empty() => {
      Some(PathBuf::from(raw.trim()))
    }
    | _ => std::env::current_dir()
      .ok()
      .map(|dir| dir.join(TIMEZONE_FILE))
  }
}

fn timezone_from_file(
  path: &Path
) -> Option<Tz> {
  let text = fs::read_to_string(path)
    .inspect_err(|err| {
      trace!(
        file = %path.display(),
        error = %err,
        "no timezone file"
      )
    })
    .ok()?;

  let file: TimezoneFile =
    toml::from_str(&text)
      .inspect_err(|err| {
        warn!(
          file = %path.display(),
          error = %err,
          "ignoring malformed timezone file"
        )
      })
      .ok()?;

  file
    .timezone
    .or(file
      .time
      .and_then(|time| time.timezone))
    .and_then(|raw| {
      parse_timezone(&raw, TIMEZONE_FILE)
    })
}

/// Unknown zone ids are logged and
/// skipped so the next layer applies.
fn parse_timezone(
  raw: &str,
  source: &str
) -> Option<Tz> {
  raw
    .trim()
    .parse::<Tz>()
    .inspect(|tz| {
      debug!(source, timezone = %tz, "using timezone")
    })
    .inspect_err(|err| {
      warn!(
        source,
        value = raw,
        error = %err,
        "ignoring unknown timezone"
      )
    })
    .ok()
}

/// Parses a user date expression relative to `today`.
#[tracing::instrument(skip(today, tz), fields(input = input))]
pub fn parse_date_expr(
  input: &str,
  today: NaiveDate,
  tz: Tz
) -> anyhow::Result<NaiveDate> {
  let token = input.trim();
  let lower =
    token.to_ascii_lowercase();

  match lower.as_str() {
    | "today" | "now" => {
      return Ok(today);
    }
    | "tomorrow" => {
      return Ok(today.plus_days(1));
    }
    | "yesterday" => {
      return Ok(today.plus_days(-1));
    }
    | _ => {}
  }

  if token.len() == 4
    && token
      .chars()
      .all(|c| c.is_ascii_digit())
  {
    let year: i32 =
      token.parse().context(
        "invalid 4-digit year"
      )?;
    return NaiveDate::from_ymd_opt(
      year, 1, 1
    )
    .ok_or_else(|| {
      anyhow!(
        "invalid year value: {year}"
      )
    });
  }

  if let Ok(weekday) =
    lower.parse::<Weekday>()
  {
    return Ok(next_weekday(
      today, weekday
    ));
  }

  if let Some(target_month) =
    parse_month_name(&lower)
  {
    let mut year = today.year();
    if target_month <= today.month() {
      year = year.saturating_add(1);
    }

    return NaiveDate::from_ymd_opt(
      year,
      target_month,
      1
    )
    .ok_or_else(|| {
      anyhow!(
        "invalid month/year \
         candidate"
      )
    });
  }

  let relative = Regex::new(
    r"^(?P<sign>[+-])(?P<num>\d+)(?P<unit>[dwmy])$"
  )
  .map_err(|e| {
    anyhow!("bad relative pattern: {e}")
  })?;

  if let Some(caps) =
    relative.captures(&lower)
  {
    let amount: u32 = caps["num"]
      .parse()
      .with_context(|| {
        format!(
          "relative amount too large: \
           {input}"
        )
      })?;

    return shift_date(
      today,
      &caps["sign"] == "-",
      amount,
      &caps["unit"]
    )
    .ok_or_else(|| {
      anyhow!(
        "relative date out of range: \
         {input}"
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

  if let Ok(dt) =
    DateTime::parse_from_rfc3339(token)
  {
    return Ok(
      dt.with_timezone(&tz).date_naive()
    );
  }

  Err(anyhow!(
    "unrecognized date expression: \
     {input}"
  ))
  .with_context(|| {
    "supported formats: \
     today/tomorrow/yesterday, \
     4-digit year, weekday names (e.g. \
     monday), month names (e.g. \
     march), +Nd/+Nw/+Nm/+Ny, \
     YYYY-MM-DD, RFC3339"
  })
}

fn shift_date(
  today: NaiveDate,
  backwards: bool,
  num: u32,
  unit: &str
) -> Option<NaiveDate> {
  let months = match unit {
    | "d" | "w" => {
      let days = i64::from(num)
        * if unit == "w" { 7 } else { 1 };
      let days =
        if backwards { -days } else { days };
      return today.checked_add_signed(
        chrono::TimeDelta::try_days(days)?
      );
    }
    | "m" => Months::new(num),
    | "y" => {
      Months::new(num.checked_mul(12)?)
    }
    | _ => return None
  };

  if backwards {
    today.checked_sub_months(months)
  } else {
    today.checked_add_months(months)
  }
}

/// The next `weekday` strictly after
/// `from`.
fn next_weekday(
  from: NaiveDate,
  weekday: Weekday
) -> NaiveDate {
  let ahead = (i64::from(
    weekday.num_days_from_monday()
  ) - i64::from(
    from
      .weekday()
      .num_days_from_monday()
  ))
  .rem_euclid(7);

  from.plus_days(if ahead == 0 {
    7
  } else {
    ahead
  })
}

/// English names and abbreviations
/// through chrono, plus the French
/// labels the calendar itself shows.
fn parse_month_name(
  token: &str
) -> Option<u32> {
  token
    .parse::<Month>()
    .ok()
    .map(|month| month.number_from_month())
    .or_else(|| {
      (1..=12).find(|&number| {
        Locale::Fr.month_name(number)
          == token
      })
    })
}

#[cfg(test)]
mod tests {
  use chrono::{
    NaiveDate,
    TimeZone,
    Utc
  };

  use std::fs;

  use tempfile::tempdir;

  use super::{
    parse_date_expr,
    timezone_from_file,
    today_in
  };

  fn ymd(
    y: i32,
    m: u32,
    d: u32
  ) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d)
      .expect("valid date")
  }

  fn parse(input: &str) -> NaiveDate {
    parse_date_expr(
      input,
      ymd(2026, 2, 17),
      chrono_tz::Europe::Paris
    )
    .expect("parse date expression")
  }

  #[test]
  fn today_follows_the_zone() {
    let now = Utc
      .with_ymd_and_hms(
        2026, 2, 17, 23, 30, 0
      )
      .single()
      .expect("valid now");
    assert_eq!(
      today_in(
        chrono_tz::Europe::Paris,
        now
      ),
      ymd(2026, 2, 18)
    );
    assert_eq!(
      today_in(chrono_tz::UTC, now),
      ymd(2026, 2, 17)
    );
  }

  #[test]
  fn parses_keywords() {
    assert_eq!(
      parse("today"),
      ymd(2026, 2, 17)
    );
    assert_eq!(
      parse("Tomorrow"),
      ymd(2026, 2, 18)
    );
  }

  #[test]
  fn parses_four_digit_year() {
    assert_eq!(
      parse("2028"),
      ymd(2028, 1, 1)
    );
  }

  #[test]
  fn parses_weekday_name() {
    assert_eq!(
      parse("wednesday"),
      ymd(2026, 2, 18)
    );
    assert_eq!(
      parse("tue"),
      ymd(2026, 2, 24)
    );
  }

  #[test]
  fn parses_month_name() {
    assert_eq!(
      parse("march"),
      ymd(2026, 3, 1)
    );
    assert_eq!(
      parse("feb"),
      ymd(2027, 2, 1)
    );
  }

  #[test]
  fn parses_french_month_name() {
    assert_eq!(
      parse("mars"),
      ymd(2026, 3, 1)
    );
    assert_eq!(
      parse("Août"),
      ymd(2026, 8, 1)
    );
  }

  #[test]
  fn reads_timezone_file_layers() {
    let dir =
      tempdir().expect("tempdir");
    let sectioned =
      dir.path().join("sectioned.toml");
    fs::write(
      &sectioned,
      "[time]\ntimezone = \"Asia/Tokyo\"\n"
    )
    .expect("write toml");
    assert_eq!(
      timezone_from_file(&sectioned),
      Some(chrono_tz::Asia::Tokyo)
    );

    let unknown =
      dir.path().join("unknown.toml");
    fs::write(
      &unknown,
      "timezone = \"Mars/Olympus\"\n"
    )
    .expect("write toml");
    assert_eq!(
      timezone_from_file(&unknown),
      None
    );
    assert_eq!(
      timezone_from_file(
        &dir.path().join("absent.toml")
      ),
      None
    );
  }

  #[test]
  fn parses_relative_offsets() {
    assert_eq!(
      parse("+10d"),
      ymd(2026, 2, 27)
    );
    assert_eq!(
      parse("+2w"),
      ymd(2026, 3, 3)
    );
    assert_eq!(
      parse("+1m"),
      ymd(2026, 3, 17)
    );
    assert_eq!(
      parse("-1y"),
      ymd(2025, 2, 17)
    );
  }

  #[test]
  fn parses_iso_and_rfc3339() {
    assert_eq!(
      parse("2024-03-15"),
      ymd(2024, 3, 15)
    );
    assert_eq!(
      parse("2024-03-15T23:30:00Z"),
      ymd(2024, 3, 16)
    );
  }

  #[test]
  fn rejects_garbage_with_hint() {
    let err = parse_date_expr(
      "someday",
      ymd(2026, 2, 17),
      chrono_tz::UTC
    )
    .expect_err("should fail");
    assert!(
      format!("{err:#}")
        .contains("supported formats")
    );
  }
}
