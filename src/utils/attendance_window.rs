use chrono::{DateTime, FixedOffset, NaiveDate, NaiveTime, Timelike, Utc};
use serde::Serialize;
use utoipa::ToSchema;

use crate::model::attendance::AttendanceLog;
use crate::utils::hours::interval_hours;

/// Daily time-in window, evaluated in the attendance time zone.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AttendanceWindow {
    pub opens: NaiveTime,
    pub closes: NaiveTime,
    pub offset: FixedOffset,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum Unavailable {
    Inactive,
    AlreadyTimedIn,
    BeforeWindow,
    AfterWindow,
    NotTimedIn,
    AlreadyTimedOut,
}

impl Unavailable {
    pub fn message(self) -> &'static str {
        match self {
            Unavailable::Inactive => "Member is inactive",
            Unavailable::AlreadyTimedIn => "Already timed in today",
            Unavailable::BeforeWindow => "Time in is not open yet",
            Unavailable::AfterWindow => "Time in has closed for today",
            Unavailable::NotTimedIn => "No active time in found for today",
            Unavailable::AlreadyTimedOut => "Already timed out today",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, ToSchema)]
pub struct Availability {
    pub can_time_in: bool,
    pub can_time_out: bool,
    pub time_in_blocked_by: Option<Unavailable>,
    pub time_out_blocked_by: Option<Unavailable>,
}

impl AttendanceWindow {
    pub fn new(opens: NaiveTime, closes: NaiveTime, offset: FixedOffset) -> Self {
        Self { opens, closes, offset }
    }

    /// Calendar day a time-in at `now` is filed under.
    pub fn local_date(&self, now: DateTime<Utc>) -> NaiveDate {
        now.with_timezone(&self.offset).date_naive()
    }

    /// Local wall-clock time truncated to the second, so `closes` is inclusive
    /// for its whole second.
    fn local_time(&self, now: DateTime<Utc>) -> NaiveTime {
        let time = now.with_timezone(&self.offset).time();
        time.with_nanosecond(0).unwrap_or(time)
    }

    pub fn check_time_in(
        &self,
        now: DateTime<Utc>,
        today: Option<&AttendanceLog>,
        is_active: bool,
    ) -> Result<(), Unavailable> {
        if !is_active {
            return Err(Unavailable::Inactive);
        }
        if today.is_some() {
            return Err(Unavailable::AlreadyTimedIn);
        }
        let time = self.local_time(now);
        if time < self.opens {
            return Err(Unavailable::BeforeWindow);
        }
        if time > self.closes {
            return Err(Unavailable::AfterWindow);
        }
        Ok(())
    }

    /// Time-out is never window-gated. `log` is the log a time-out would close:
    /// today's, or the previous day's while it is still open.
    pub fn check_time_out(&self, log: Option<&AttendanceLog>) -> Result<(), Unavailable> {
        match log {
            None => Err(Unavailable::NotTimedIn),
            Some(log) if !log.is_open() => Err(Unavailable::AlreadyTimedOut),
            Some(_) => Ok(()),
        }
    }

    pub fn availability(
        &self,
        now: DateTime<Utc>,
        today: Option<&AttendanceLog>,
        time_out_log: Option<&AttendanceLog>,
        is_active: bool,
    ) -> Availability {
        let time_in = self.check_time_in(now, today, is_active);
        let time_out = self.check_time_out(time_out_log);
        Availability {
            can_time_in: time_in.is_ok(),
            can_time_out: time_out.is_ok(),
            time_in_blocked_by: time_in.err(),
            time_out_blocked_by: time_out.err(),
        }
    }
}

/// Hours worked today: the closed interval, or time elapsed while still clocked in.
pub fn today_hours(now: DateTime<Utc>, today: Option<&AttendanceLog>) -> f64 {
    match today {
        None => 0.0,
        Some(log) => interval_hours(log.time_in, log.time_out.unwrap_or(now)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::attendance::AttendanceStatus;
    use chrono::TimeZone;

    fn hm(h: u32, m: u32) -> NaiveTime {
        NaiveTime::from_hms_opt(h, m, 0).unwrap()
    }

    fn utc(day: u32, h: u32, m: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 3, day, h, m, 0).unwrap()
    }

    fn open_log(time_in: DateTime<Utc>) -> AttendanceLog {
        AttendanceLog {
            id: 1,
            member_id: 3,
            date: time_in.date_naive(),
            time_in,
            time_out: None,
            time_in_photo_url: "in.jpg".into(),
            time_out_photo_url: None,
            status: AttendanceStatus::Pending,
            approved_by: None,
            approved_at: None,
        }
    }

    fn whole_day() -> AttendanceWindow {
        AttendanceWindow::new(
            NaiveTime::MIN,
            NaiveTime::from_hms_opt(23, 59, 59).unwrap(),
            FixedOffset::east_opt(0).unwrap(),
        )
    }

    fn morning_window(offset_hours: i32) -> AttendanceWindow {
        AttendanceWindow::new(hm(7, 0), hm(10, 0), FixedOffset::east_opt(offset_hours * 3600).unwrap())
    }

    #[test]
    fn whole_day_window_allows_any_time_of_day() {
        let window = whole_day();
        assert!(window.check_time_in(utc(2, 0, 0), None, true).is_ok());
        assert!(window.check_time_in(utc(2, 23, 59), None, true).is_ok());
    }

    #[test]
    fn closing_second_is_inclusive() {
        let last_second = Utc.with_ymd_and_hms(2026, 3, 2, 23, 59, 59).unwrap()
            + chrono::Duration::milliseconds(500);
        assert!(whole_day().check_time_in(last_second, None, true).is_ok());

        let window = morning_window(0);
        let closing = utc(2, 10, 0) + chrono::Duration::milliseconds(999);
        assert!(window.check_time_in(closing, None, true).is_ok());
        assert_eq!(
            window.check_time_in(utc(2, 10, 0) + chrono::Duration::seconds(1), None, true),
            Err(Unavailable::AfterWindow)
        );
    }

    #[test]
    fn time_in_is_gated_by_window() {
        let window = morning_window(0);
        assert_eq!(
            window.check_time_in(utc(2, 6, 59), None, true),
            Err(Unavailable::BeforeWindow)
        );
        assert!(window.check_time_in(utc(2, 7, 0), None, true).is_ok());
        assert!(window.check_time_in(utc(2, 10, 0), None, true).is_ok());
        assert_eq!(
            window.check_time_in(utc(2, 10, 1), None, true),
            Err(Unavailable::AfterWindow)
        );
    }

    #[test]
    fn window_uses_local_time() {
        // 23:30 UTC is 07:30 the next day at UTC+8
        let window = morning_window(8);
        let now = utc(1, 23, 30);
        assert!(window.check_time_in(now, None, true).is_ok());
        assert_eq!(window.local_date(now), NaiveDate::from_ymd_opt(2026, 3, 2).unwrap());
    }

    #[test]
    fn one_time_in_per_day() {
        let window = whole_day();
        let log = open_log(utc(2, 8, 0));
        assert_eq!(
            window.check_time_in(utc(2, 9, 0), Some(&log), true),
            Err(Unavailable::AlreadyTimedIn)
        );
    }

    #[test]
    fn inactive_members_cannot_time_in() {
        let window = whole_day();
        assert_eq!(
            window.check_time_in(utc(2, 9, 0), None, false),
            Err(Unavailable::Inactive)
        );
    }

    #[test]
    fn time_out_needs_an_open_log() {
        let window = morning_window(0);
        let mut log = open_log(utc(2, 8, 0));

        assert_eq!(window.check_time_out(None), Err(Unavailable::NotTimedIn));
        assert!(window.check_time_out(Some(&log)).is_ok());

        log.time_out = Some(utc(2, 17, 0));
        assert_eq!(window.check_time_out(Some(&log)), Err(Unavailable::AlreadyTimedOut));
    }

    #[test]
    fn availability_after_time_in() {
        let window = morning_window(0);
        let log = open_log(utc(2, 8, 0));

        // time-out stays available after the time-in window has closed
        let availability = window.availability(utc(2, 18, 0), Some(&log), Some(&log), true);
        assert!(!availability.can_time_in);
        assert!(availability.can_time_out);
        assert_eq!(availability.time_in_blocked_by, Some(Unavailable::AlreadyTimedIn));
        assert_eq!(availability.time_out_blocked_by, None);
    }

    #[test]
    fn availability_before_time_in() {
        let window = whole_day();
        let availability = window.availability(utc(2, 8, 0), None, None, true);
        assert!(availability.can_time_in);
        assert!(!availability.can_time_out);
        assert_eq!(availability.time_out_blocked_by, Some(Unavailable::NotTimedIn));
    }

    #[test]
    fn overnight_log_can_still_be_closed() {
        let window = morning_window(0);
        let overnight = open_log(utc(1, 22, 0));

        let availability = window.availability(utc(2, 6, 0), None, Some(&overnight), true);
        assert_eq!(availability.time_in_blocked_by, Some(Unavailable::BeforeWindow));
        assert!(availability.can_time_out);
    }

    #[test]
    fn today_hours_counts_elapsed_while_clocked_in() {
        let mut log = open_log(utc(2, 8, 0));
        assert_eq!(today_hours(utc(2, 10, 30), Some(&log)), 2.5);

        log.time_out = Some(utc(2, 12, 0));
        assert_eq!(today_hours(utc(2, 18, 0), Some(&log)), 4.0);

        assert_eq!(today_hours(utc(2, 18, 0), None), 0.0);
    }
}
