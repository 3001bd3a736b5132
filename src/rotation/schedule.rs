//! Weekly firing time for the rotation job, evaluated in local time.
//!
//! The wall-clock target is resolved in the time zone before measuring the
//! wait, so clock changes between now and the firing are accounted for. A
//! target skipped by a forward change fires at the first wall time after the
//! gap; a repeated hour fires on its first occurrence.

use anyhow::{anyhow, Result};
use chrono::{DateTime, Datelike, Local, NaiveDateTime, NaiveTime, TimeZone, Weekday};
use std::time::Duration;

use crate::common::config::ScheduleConfig;

/// "Every `weekday` at `time`".
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WeeklySchedule {
    weekday: Weekday,
    time: NaiveTime,
}

impl WeeklySchedule {
    pub fn new(weekday: Weekday, hour: u32, minute: u32) -> Result<Self> {
        let time = NaiveTime::from_hms_opt(hour, minute, 0)
            .ok_or_else(|| anyhow!("invalid schedule time {:02}:{:02}", hour, minute))?;
        Ok(Self { weekday, time })
    }

    pub fn from_config(config: &ScheduleConfig) -> Result<Self> {
        Self::new(config.weekday()?, config.hour, config.minute)
    }

    /// First firing strictly after `now`.
    pub fn next_after(&self, now: NaiveDateTime) -> NaiveDateTime {
        let today = now.date().weekday().num_days_from_monday() as i64;
        let target = self.weekday.num_days_from_monday() as i64;
        let days_ahead = (target - today).rem_euclid(7);

        let candidate = (now.date() + chrono::Duration::days(days_ahead)).and_time(self.time);
        if candidate > now {
            candidate
        } else {
            candidate + chrono::Duration::days(7)
        }
    }

    /// First firing strictly after `now`, as an instant in `now`'s zone.
    pub fn next_instant<Tz: TimeZone>(&self, now: &DateTime<Tz>) -> DateTime<Tz> {
        let zone = now.timezone();
        let mut target = self.next_after(now.naive_local());
        loop {
            match zone.from_local_datetime(&target).earliest() {
                Some(at) if at > *now => return at,
                // First occurrence of a repeated hour already passed
                Some(_) => target = self.next_after(target),
                None => target += chrono::Duration::minutes(1),
            }
        }
    }

    /// How long to sleep from `now` until the next firing.
    pub fn until_next(&self, now: DateTime<Local>) -> Duration {
        self.wait_from(&now)
    }

    fn wait_from<Tz: TimeZone>(&self, now: &DateTime<Tz>) -> Duration {
        self.next_instant(now)
            .signed_duration_since(now)
            .to_std()
            .unwrap_or(Duration::ZERO)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use chrono_tz::Europe::Berlin;

    const HOUR: u64 = 3600;

    fn at(y: i32, m: u32, d: u32, h: u32, min: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(y, m, d)
            .unwrap()
            .and_hms_opt(h, min, 0)
            .unwrap()
    }

    #[test]
    fn test_next_sunday_midnight() {
        let schedule = WeeklySchedule::new(Weekday::Sun, 0, 0).unwrap();

        // 2024-05-15 is a Wednesday
        assert_eq!(
            schedule.next_after(at(2024, 5, 15, 13, 30)),
            at(2024, 5, 19, 0, 0)
        );
        // Saturday late evening
        assert_eq!(
            schedule.next_after(at(2024, 5, 18, 23, 59)),
            at(2024, 5, 19, 0, 0)
        );
    }

    #[test]
    fn test_exact_firing_time_moves_to_next_week() {
        let schedule = WeeklySchedule::new(Weekday::Sun, 0, 0).unwrap();
        assert_eq!(
            schedule.next_after(at(2024, 5, 19, 0, 0)),
            at(2024, 5, 26, 0, 0)
        );
    }

    #[test]
    fn test_same_day_later_time() {
        let schedule = WeeklySchedule::new(Weekday::Wed, 18, 15).unwrap();
        assert_eq!(
            schedule.next_after(at(2024, 5, 15, 9, 0)),
            at(2024, 5, 15, 18, 15)
        );
        assert_eq!(
            schedule.next_after(at(2024, 5, 15, 19, 0)),
            at(2024, 5, 22, 18, 15)
        );
    }

    #[test]
    fn test_invalid_time_is_rejected() {
        assert!(WeeklySchedule::new(Weekday::Mon, 24, 0).is_err());
        assert!(WeeklySchedule::new(Weekday::Mon, 0, 60).is_err());
    }

    #[test]
    fn test_until_next_is_within_a_week() {
        let schedule = WeeklySchedule::new(Weekday::Fri, 12, 0).unwrap();
        let wait = schedule.until_next(Local::now());
        assert!(wait > Duration::ZERO);
        assert!(wait <= Duration::from_secs(7 * 24 * 3600));
    }

    #[test]
    fn test_wait_spans_spring_forward() {
        let schedule = WeeklySchedule::new(Weekday::Sun, 12, 0).unwrap();
        // Clocks jump from 02:00 to 03:00 on 2024-03-31
        let now = Berlin.with_ymd_and_hms(2024, 3, 30, 12, 0, 0).unwrap();

        assert_eq!(schedule.wait_from(&now), Duration::from_secs(23 * HOUR));
    }

    #[test]
    fn test_wait_spans_fall_back() {
        let schedule = WeeklySchedule::new(Weekday::Sun, 12, 0).unwrap();
        // Clocks fall back from 03:00 to 02:00 on 2024-10-27
        let now = Berlin.with_ymd_and_hms(2024, 10, 26, 12, 0, 0).unwrap();

        assert_eq!(schedule.wait_from(&now), Duration::from_secs(25 * HOUR));
    }

    #[test]
    fn test_skipped_wall_time_fires_after_the_gap() {
        let schedule = WeeklySchedule::new(Weekday::Sun, 2, 30).unwrap();
        let now = Berlin.with_ymd_and_hms(2024, 3, 30, 12, 0, 0).unwrap();

        let fired = schedule.next_instant(&now);
        assert_eq!(fired, Berlin.with_ymd_and_hms(2024, 3, 31, 3, 0, 0).unwrap());
        assert_eq!(schedule.wait_from(&now), Duration::from_secs(14 * HOUR));
    }

    #[test]
    fn test_repeated_hour_fires_once() {
        let schedule = WeeklySchedule::new(Weekday::Sun, 2, 30).unwrap();
        let first = Berlin.with_ymd_and_hms(2024, 10, 26, 12, 0, 0).unwrap();

        let fired = schedule.next_instant(&first);
        assert_eq!(fired.naive_utc(), at(2024, 10, 27, 0, 30));

        // 02:15 on the second pass; the 02:30 firing already happened
        let replay = Berlin
            .from_local_datetime(&at(2024, 10, 27, 2, 15))
            .latest()
            .unwrap();
        assert_eq!(
            schedule.next_instant(&replay).naive_local(),
            at(2024, 11, 3, 2, 30)
        );
    }
}
