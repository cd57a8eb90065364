//! Wall-clock access and the weekly quota window.
//!
//! The quota week runs from Sunday 00:00 local time to the following Sunday
//! 00:00. It is recomputed from a fresh clock reading on every call; nothing
//! here caches a boundary.

use std::sync::Mutex;

use chrono::{
  DateTime, Datelike, Days, LocalResult, NaiveTime, TimeDelta, TimeZone, Utc,
};

/// Source of the current time.
pub trait Clock: Send + Sync {
  fn now(&self) -> DateTime<Utc>;
}

/// Reads the system clock.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
  fn now(&self) -> DateTime<Utc> { Utc::now() }
}

/// A clock that only moves when told to. Used to exercise week rollover.
#[derive(Debug)]
pub struct ManualClock {
  now: Mutex<DateTime<Utc>>,
}

impl ManualClock {
  pub fn new(start: DateTime<Utc>) -> Self { Self { now: Mutex::new(start) } }

  pub fn set(&self, to: DateTime<Utc>) {
    *self.now.lock().unwrap_or_else(|p| p.into_inner()) = to;
  }

  pub fn advance(&self, by: TimeDelta) {
    let mut now = self.now.lock().unwrap_or_else(|p| p.into_inner());
    *now += by;
  }
}

impl Clock for ManualClock {
  fn now(&self) -> DateTime<Utc> {
    *self.now.lock().unwrap_or_else(|p| p.into_inner())
  }
}

// ─── Week window ─────────────────────────────────────────────────────────────

/// The most recent Sunday 00:00 in `now`'s time zone, at or before `now`.
pub fn week_start<Tz: TimeZone>(now: &DateTime<Tz>) -> DateTime<Tz> {
  let tz = now.timezone();
  let back = u64::from(now.weekday().num_days_from_sunday());
  let sunday = now
    .date_naive()
    .checked_sub_days(Days::new(back))
    .unwrap_or(now.date_naive());
  let midnight = sunday.and_time(NaiveTime::MIN);

  match tz.from_local_datetime(&midnight) {
    LocalResult::Single(t) => t,
    LocalResult::Ambiguous(earliest, _) => earliest,
    // Midnight skipped by a DST jump; the first valid instant is an hour on.
    LocalResult::None => tz
      .from_local_datetime(&(midnight + TimeDelta::hours(1)))
      .earliest()
      .unwrap_or_else(|| tz.from_utc_datetime(&midnight)),
  }
}

/// A half-open `[start, end)` quota week expressed in UTC.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WeekWindow {
  pub start: DateTime<Utc>,
  pub end:   DateTime<Utc>,
}

impl WeekWindow {
  /// The window containing `now`, with week boundaries taken in `tz`.
  pub fn containing<Tz: TimeZone>(now: DateTime<Utc>, tz: &Tz) -> Self {
    let local = now.with_timezone(tz);
    let start = week_start(&local);
    // Noon on the next Sunday is always a valid local time, even on DST days.
    let next = start
      .date_naive()
      .checked_add_days(Days::new(7))
      .and_then(|d| d.and_hms_opt(12, 0, 0))
      .and_then(|noon| tz.from_local_datetime(&noon).earliest())
      .map(|t| week_start(&t).with_timezone(&Utc));
    let start = start.with_timezone(&Utc);
    Self {
      start,
      end: next.unwrap_or(start + TimeDelta::days(7)),
    }
  }

  pub fn contains(&self, at: DateTime<Utc>) -> bool {
    self.start <= at && at < self.end
  }
}
