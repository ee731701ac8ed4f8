//! Calendar and wall-clock math.
//!
//! The epoch used here counts seconds since 1970-01-01 00:00:00 *local wall
//! time*. It is never exchanged with anything outside the firmware; it exists
//! only so tick deltas and the save throttle have a monotonic-ish scalar to
//! work with. Day rollover is defined on the local calendar date.

/// Broken-down local time. `weekday` is 1..=7 with Sunday = 1, matching the
/// RTC's on-wire convention.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct LocalTime {
    pub year: u16,
    pub month: u8,
    pub day: u8,
    pub weekday: u8,
    pub hour: u8,
    pub minute: u8,
    pub second: u8,
}

impl LocalTime {
    /// Builds a `LocalTime` with the weekday derived from the date.
    pub fn new(year: u16, month: u8, day: u8, hour: u8, minute: u8, second: u8) -> Self {
        let weekday = weekday_from_days(days_from_civil(year as i64, month, day));
        Self {
            year,
            month,
            day,
            weekday,
            hour,
            minute,
            second,
        }
    }
}

/// One clock sample: broken-down fields plus the local-wall epoch they map to.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct ClockReading {
    pub time: LocalTime,
    pub epoch: i64,
}

impl ClockReading {
    pub fn from_local(time: LocalTime) -> Self {
        Self {
            time,
            epoch: epoch_from_local(&time),
        }
    }
}

/// Calendar day key in `YYYYMMDD` form.
pub fn yyyymmdd(t: &LocalTime) -> u32 {
    t.year as u32 * 10_000 + t.month as u32 * 100 + t.day as u32
}

/// Days since 1970-01-01 for a civil date (proleptic Gregorian).
pub fn days_from_civil(year: i64, month: u8, day: u8) -> i64 {
    let y = if month <= 2 { year - 1 } else { year };
    let era = y.div_euclid(400);
    let yoe = y - era * 400;
    let mp = if month > 2 { month - 3 } else { month + 9 } as i64;
    let doy = (153 * mp + 2) / 5 + day as i64 - 1;
    let doe = yoe * 365 + yoe / 4 - yoe / 100 + doy;
    era * 146_097 + doe - 719_468
}

/// Civil date for a day count since 1970-01-01.
pub fn civil_from_days(days: i64) -> (i64, u8, u8) {
    let z = days + 719_468;
    let era = z.div_euclid(146_097);
    let doe = z - era * 146_097;
    let yoe = (doe - doe / 1_460 + doe / 36_524 - doe / 146_096) / 365;
    let doy = doe - (365 * yoe + yoe / 4 - yoe / 100);
    let mp = (5 * doy + 2) / 153;
    let day = (doy - (153 * mp + 2) / 5 + 1) as u8;
    let month = if mp < 10 { mp + 3 } else { mp - 9 } as u8;
    let year = yoe + era * 400 + if month <= 2 { 1 } else { 0 };
    (year, month, day)
}

/// Weekday (1..=7, Sunday = 1) for a day count since 1970-01-01.
pub fn weekday_from_days(days: i64) -> u8 {
    // 1970-01-01 was a Thursday.
    ((days + 4).rem_euclid(7) + 1) as u8
}

/// Local-wall epoch seconds for a broken-down time.
pub fn epoch_from_local(t: &LocalTime) -> i64 {
    days_from_civil(t.year as i64, t.month, t.day) * 86_400
        + t.hour as i64 * 3_600
        + t.minute as i64 * 60
        + t.second as i64
}

/// Broken-down time for a local-wall epoch.
pub fn local_from_epoch(epoch: i64) -> LocalTime {
    let days = epoch.div_euclid(86_400);
    let secs = epoch.rem_euclid(86_400);
    let (year, month, day) = civil_from_days(days);
    LocalTime {
        year: year as u16,
        month,
        day,
        weekday: weekday_from_days(days),
        hour: (secs / 3_600) as u8,
        minute: (secs / 60 % 60) as u8,
        second: (secs % 60) as u8,
    }
}

/// Reading projected forward from the last good sample. Backs the console
/// stamp while the clock source is unreadable; never feeds the countdown.
pub fn project_reading(last_epoch: i64, elapsed_secs: u64) -> ClockReading {
    let epoch = last_epoch + elapsed_secs as i64;
    ClockReading {
        time: local_from_epoch(epoch),
        epoch,
    }
}

/// 12-hour rendition of an hour for the console stamp.
pub fn hour12(hour: u8) -> (u8, &'static str) {
    let half = if hour < 12 { "AM" } else { "PM" };
    let h = hour % 12;
    (if h == 0 { 12 } else { h }, half)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn days_from_civil_matches_reference_dates() {
        assert_eq!(days_from_civil(1970, 1, 1), 0);
        assert_eq!(days_from_civil(2000, 1, 1), 10_957);
        assert_eq!(days_from_civil(2000, 3, 1), 11_017);
        assert_eq!(days_from_civil(2024, 2, 29), 19_782);
        assert_eq!(days_from_civil(2025, 3, 10), 20_157);
        assert_eq!(days_from_civil(2099, 12, 31), 47_481);
    }

    #[test]
    fn civil_from_days_inverts_days_from_civil() {
        for days in [0, 10_957, 19_782, 20_157, 20_158, 20_453, 47_481] {
            let (y, m, d) = civil_from_days(days);
            assert_eq!(days_from_civil(y, m, d), days);
        }
        assert_eq!(civil_from_days(20_157), (2025, 3, 10));
        assert_eq!(civil_from_days(19_782), (2024, 2, 29));
    }

    #[test]
    fn weekday_uses_sunday_as_one() {
        // 1970-01-01 Thursday, 2025-03-10 Monday, 2000-01-01 Saturday.
        assert_eq!(weekday_from_days(0), 5);
        assert_eq!(weekday_from_days(20_157), 2);
        assert_eq!(weekday_from_days(10_957), 7);
    }

    #[test]
    fn epoch_round_trips_through_broken_down_time() {
        let t = LocalTime::new(2025, 3, 10, 8, 0, 5);
        assert_eq!(epoch_from_local(&t), 1_741_593_605);
        assert_eq!(local_from_epoch(1_741_593_605), t);

        // Midnight boundary.
        let end = LocalTime::new(2025, 3, 10, 23, 59, 59);
        let next = local_from_epoch(epoch_from_local(&end) + 1);
        assert_eq!((next.year, next.month, next.day), (2025, 3, 11));
        assert_eq!((next.hour, next.minute, next.second), (0, 0, 0));
        assert_eq!(next.weekday, 3);
    }

    #[test]
    fn yyyymmdd_formats_the_calendar_day() {
        assert_eq!(yyyymmdd(&LocalTime::new(2025, 3, 10, 8, 0, 5)), 20_250_310);
        assert_eq!(yyyymmdd(&LocalTime::new(2000, 1, 1, 0, 0, 0)), 20_000_101);
    }

    #[test]
    fn projected_reading_advances_from_the_last_good_sample() {
        let last = epoch_from_local(&LocalTime::new(2025, 3, 10, 23, 59, 30));
        let est = project_reading(last, 45);
        assert_eq!(est.epoch, last + 45);
        assert_eq!((est.time.month, est.time.day), (3, 11));
        assert_eq!((est.time.hour, est.time.minute, est.time.second), (0, 0, 15));

        let held = project_reading(last, 0);
        assert_eq!(held.time, LocalTime::new(2025, 3, 10, 23, 59, 30));
    }

    #[test]
    fn hour12_handles_noon_and_midnight() {
        assert_eq!(hour12(0), (12, "AM"));
        assert_eq!(hour12(1), (1, "AM"));
        assert_eq!(hour12(11), (11, "AM"));
        assert_eq!(hour12(12), (12, "PM"));
        assert_eq!(hour12(13), (1, "PM"));
        assert_eq!(hour12(23), (11, "PM"));
    }
}
