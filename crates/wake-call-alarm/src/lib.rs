#![warn(missing_docs)]
//! # wake-call-alarm
//!
//! ## Purpose
//! Implements the single-shot wake-up alarm: 12-hour clock math, next-target
//! computation, and countdown projection.
//!
//! ## Responsibilities
//! - Convert dialog input (12-hour time plus meridiem) into the next matching
//!   wall-clock instant.
//! - Hold at most one scheduled alarm; scheduling replaces any prior one.
//! - Report pending/fired state from an externally driven clock tick.
//!
//! ## Data flow
//! The alarm dialog feeds [`AlarmScheduler::schedule`]. The runtime timer
//! tick calls [`AlarmScheduler::poll`]; a `Fired` result carries the stored
//! reminder text exactly once and clears the schedule.
//!
//! ## Ownership and lifetimes
//! The scheduler owns its target instant and reminder string; firing hands the
//! reminder to the caller by value.
//!
//! ## Error model
//! Out-of-range dialog input is rejected as [`AlarmError`] before any state
//! changes.
//!
//! ## Security and privacy notes
//! Reminder text is user content; this crate never logs it.

use thiserror::Error;
use time::{Duration, OffsetDateTime, Time};

/// AM/PM half-day selector from the alarm dialog.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Meridiem {
    /// Ante meridiem.
    Am,
    /// Post meridiem.
    Pm,
}

impl Meridiem {
    /// Parses dialog input; anything other than `pm` (case-insensitive) is AM.
    pub fn parse(raw: &str) -> Self {
        if raw.trim().eq_ignore_ascii_case("pm") {
            Self::Pm
        } else {
            Self::Am
        }
    }
}

/// Converts a 12-hour clock reading to a 24-hour hour value.
///
/// # Semantics
/// Hour 12 maps to 0 (AM) or 12 (PM); other hours gain 12 in the PM half.
///
/// # Errors
/// Returns [`AlarmError::InvalidHour`] when `hour12` is outside `1..=12`.
pub fn to_24_hour(hour12: u8, meridiem: Meridiem) -> Result<u8, AlarmError> {
    if hour12 == 0 || hour12 > 12 {
        return Err(AlarmError::InvalidHour(hour12));
    }

    Ok(match (hour12, meridiem) {
        (12, Meridiem::Am) => 0,
        (12, Meridiem::Pm) => 12,
        (hour, Meridiem::Am) => hour,
        (hour, Meridiem::Pm) => hour + 12,
    })
}

/// Computes the next wall-clock instant matching the given 12-hour time.
///
/// # Semantics
/// Seconds and subseconds are zeroed. When the instant is not strictly in the
/// future relative to `now`, the target rolls forward one day.
///
/// # Errors
/// Returns [`AlarmError::InvalidHour`] / [`AlarmError::InvalidMinute`] for
/// out-of-range dialog input.
pub fn next_target(
    now: OffsetDateTime,
    hour12: u8,
    minute: u8,
    meridiem: Meridiem,
) -> Result<OffsetDateTime, AlarmError> {
    let hour24 = to_24_hour(hour12, meridiem)?;
    let wall_time =
        Time::from_hms(hour24, minute, 0).map_err(|_| AlarmError::InvalidMinute(minute))?;

    let mut target = now.replace_time(wall_time);
    if target <= now {
        target += Duration::days(1);
    }

    Ok(target)
}

/// Formats a remaining duration as `HH:MM:SS`, clamping negatives to zero.
pub fn format_countdown(remaining: Duration) -> String {
    let total_seconds = remaining.whole_seconds().max(0);
    let hours = total_seconds / 3600;
    let minutes = (total_seconds % 3600) / 60;
    let seconds = total_seconds % 60;
    format!("{hours:02}:{minutes:02}:{seconds:02}")
}

/// Formats a target instant as a 12-hour display string, e.g. `7:30 PM`.
pub fn format_target(target: OffsetDateTime) -> String {
    let hour = target.hour();
    let hour12 = ((hour + 11) % 12) + 1;
    let meridiem = if hour >= 12 { "PM" } else { "AM" };
    format!("{hour12}:{:02} {meridiem}", target.minute())
}

/// Suggested dialog prefill: the next minute of the current hour.
pub fn dialog_prefill(now: OffsetDateTime) -> (u8, u8, Meridiem) {
    let hour = now.hour();
    let hour12 = ((hour + 11) % 12) + 1;
    let minute = (now.minute() + 1) % 60;
    let meridiem = if hour >= 12 { Meridiem::Pm } else { Meridiem::Am };
    (hour12, minute, meridiem)
}

/// Result of one scheduler poll.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AlarmPoll {
    /// No alarm is scheduled.
    Idle,
    /// Alarm is pending with the given remaining time.
    Pending {
        /// Time left until the target instant.
        remaining: Duration,
    },
    /// Target instant was reached; schedule is consumed.
    Fired {
        /// Reminder text stored at scheduling time.
        reminder: String,
    },
}

/// Single-slot wall-clock alarm scheduler.
#[derive(Debug, Clone, Default)]
pub struct AlarmScheduler {
    target: Option<OffsetDateTime>,
    reminder: String,
}

impl AlarmScheduler {
    /// Creates an empty scheduler.
    pub fn new() -> Self {
        Self::default()
    }

    /// Schedules the alarm, replacing any previously scheduled one.
    ///
    /// # Errors
    /// Returns [`AlarmError`] for invalid dialog input; a prior schedule is
    /// preserved in that case.
    pub fn schedule(
        &mut self,
        now: OffsetDateTime,
        hour12: u8,
        minute: u8,
        meridiem: Meridiem,
        reminder: impl Into<String>,
    ) -> Result<OffsetDateTime, AlarmError> {
        let target = next_target(now, hour12, minute, meridiem)?;
        self.target = Some(target);
        self.reminder = reminder.into();
        Ok(target)
    }

    /// Cancels the schedule and clears the reminder.
    pub fn clear(&mut self) {
        self.target = None;
        self.reminder.clear();
    }

    /// Returns `true` while an alarm is scheduled.
    pub fn is_scheduled(&self) -> bool {
        self.target.is_some()
    }

    /// Returns the scheduled target instant, if any.
    pub fn target(&self) -> Option<OffsetDateTime> {
        self.target
    }

    /// Returns the stored reminder text.
    pub fn reminder(&self) -> &str {
        &self.reminder
    }

    /// Returns time left until the target, if scheduled.
    pub fn remaining(&self, now: OffsetDateTime) -> Option<Duration> {
        self.target.map(|target| target - now)
    }

    /// Advances the scheduler against the current wall clock.
    ///
    /// # Semantics
    /// Firing is one-shot: the first poll at or past the target returns
    /// `Fired` with the reminder and clears the slot; later polls are `Idle`.
    pub fn poll(&mut self, now: OffsetDateTime) -> AlarmPoll {
        let Some(target) = self.target else {
            return AlarmPoll::Idle;
        };

        if now < target {
            return AlarmPoll::Pending {
                remaining: target - now,
            };
        }

        self.target = None;
        AlarmPoll::Fired {
            reminder: std::mem::take(&mut self.reminder),
        }
    }
}

/// Alarm layer error type.
#[derive(Debug, Error)]
pub enum AlarmError {
    /// Hour must be within `1..=12`.
    #[error("invalid 12-hour value: {0}")]
    InvalidHour(u8),
    /// Minute must be within `0..=59`.
    #[error("invalid minute value: {0}")]
    InvalidMinute(u8),
}

#[cfg(test)]
mod tests {
    //! Unit tests for clock conversion and scheduler transitions.

    use time::{Date, Month, PrimitiveDateTime};

    use super::*;

    fn at(hour: u8, minute: u8, second: u8) -> OffsetDateTime {
        let date = Date::from_calendar_date(2026, Month::March, 10).expect("valid date");
        let time = Time::from_hms(hour, minute, second).expect("valid time");
        PrimitiveDateTime::new(date, time).assume_utc()
    }

    #[test]
    fn noon_and_midnight_convert_correctly() {
        assert_eq!(to_24_hour(12, Meridiem::Am).expect("valid"), 0);
        assert_eq!(to_24_hour(12, Meridiem::Pm).expect("valid"), 12);
        assert_eq!(to_24_hour(7, Meridiem::Pm).expect("valid"), 19);
        assert!(to_24_hour(0, Meridiem::Am).is_err());
        assert!(to_24_hour(13, Meridiem::Pm).is_err());
    }

    #[test]
    fn past_time_rolls_to_next_day() {
        let now = at(8, 0, 0);
        let target = next_target(now, 7, 30, Meridiem::Am).expect("target should compute");
        assert_eq!(target.day(), 11);
        assert_eq!((target.hour(), target.minute(), target.second()), (7, 30, 0));
    }

    #[test]
    fn future_time_stays_on_same_day() {
        let now = at(8, 0, 0);
        let target = next_target(now, 9, 15, Meridiem::Pm).expect("target should compute");
        assert_eq!(target.day(), 10);
        assert_eq!(target.hour(), 21);
    }

    #[test]
    fn exact_current_minute_counts_as_passed() {
        let now = at(7, 30, 0);
        let target = next_target(now, 7, 30, Meridiem::Am).expect("target should compute");
        assert_eq!(target.day(), 11);
    }

    #[test]
    fn scheduling_replaces_prior_alarm() {
        let mut scheduler = AlarmScheduler::new();
        scheduler
            .schedule(at(8, 0, 0), 9, 0, Meridiem::Am, "first")
            .expect("schedule should work");
        scheduler
            .schedule(at(8, 0, 0), 10, 0, Meridiem::Am, "second")
            .expect("schedule should work");

        assert_eq!(scheduler.reminder(), "second");
        assert_eq!(scheduler.target().map(|target| target.hour()), Some(10));
    }

    #[test]
    fn poll_fires_once_and_clears_slot() {
        let mut scheduler = AlarmScheduler::new();
        scheduler
            .schedule(at(8, 0, 0), 8, 1, Meridiem::Am, "note")
            .expect("schedule should work");

        assert!(matches!(
            scheduler.poll(at(8, 0, 30)),
            AlarmPoll::Pending { .. }
        ));
        assert_eq!(
            scheduler.poll(at(8, 1, 0)),
            AlarmPoll::Fired {
                reminder: "note".to_string()
            }
        );
        assert_eq!(scheduler.poll(at(8, 2, 0)), AlarmPoll::Idle);
        assert!(!scheduler.is_scheduled());
    }

    #[test]
    fn countdown_formats_and_clamps() {
        assert_eq!(format_countdown(Duration::seconds(60)), "00:01:00");
        assert_eq!(
            format_countdown(Duration::hours(23) + Duration::minutes(59)),
            "23:59:00"
        );
        assert_eq!(format_countdown(Duration::seconds(-5)), "00:00:00");
    }

    #[test]
    fn target_display_uses_12_hour_clock() {
        assert_eq!(format_target(at(19, 30, 0)), "7:30 PM");
        assert_eq!(format_target(at(0, 5, 0)), "12:05 AM");
    }
}
