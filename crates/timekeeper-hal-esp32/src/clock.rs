//! Wall clock backed by the external RTC.
//!
//! The DS3231 holds local wall time (it is set that way once, by whoever
//! provisions the device), so no timezone offset is applied at runtime. A
//! soft reference pairing the last good RTC sample with a monotonic instant
//! seeds the system's notion of time at boot and serves as a fallback
//! estimate while the bus is unreadable.

use ds3231::{DateTime, Ds3231};
use embassy_time::Instant;
use embedded_hal::i2c::I2c;
use timekeeper_core::clock::{ClockReading, LocalTime, epoch_from_local, project_reading};

#[derive(Debug, Clone, Copy, Eq, PartialEq)]
pub enum ClockError<E> {
    /// RTC transaction failed or returned implausible registers.
    Rtc(ds3231::Error<E>),
    /// No successful RTC read yet, so no estimate exists either.
    NeverRead,
}

#[derive(Clone, Copy, Debug)]
struct SoftReference {
    epoch: i64,
    at: Instant,
}

/// RTC-first clock source with a monotonic soft reference.
pub struct WallClock<I2C> {
    rtc: Ds3231<I2C>,
    last_good: Option<SoftReference>,
}

impl<I2C> WallClock<I2C>
where
    I2C: I2c,
{
    pub fn new(rtc: Ds3231<I2C>) -> Self {
        Self {
            rtc,
            last_good: None,
        }
    }

    /// First read at boot; establishes the soft reference ("seeds the
    /// system clock from the RTC").
    pub fn seed(&mut self) -> Result<ClockReading, ClockError<I2C::Error>> {
        self.now_local()
    }

    /// Reads the RTC and returns a broken-down local time plus its epoch.
    ///
    /// Errors surface to the caller; the tick loop's policy for them is
    /// "show 00:00, advance nothing, retry next second".
    pub fn now_local(&mut self) -> Result<ClockReading, ClockError<I2C::Error>> {
        let dt = self.rtc.datetime().map_err(ClockError::Rtc)?;
        let reading = ClockReading::from_local(local_from_datetime(&dt));
        self.last_good = Some(SoftReference {
            epoch: reading.epoch,
            at: Instant::now(),
        });
        Ok(reading)
    }

    /// Best-effort estimate from the soft reference while the RTC is
    /// unreadable. Used for log stamps only, never for the countdown.
    pub fn estimate(&self) -> Result<ClockReading, ClockError<I2C::Error>> {
        let soft = self.last_good.ok_or(ClockError::NeverRead)?;
        Ok(project_reading(soft.epoch, soft.at.elapsed().as_secs()))
    }

    /// Writes local wall time into the RTC (provisioning path).
    pub fn set_from(&mut self, time: &LocalTime) -> Result<(), ClockError<I2C::Error>> {
        self.rtc
            .set_datetime(&datetime_from_local(time))
            .map_err(ClockError::Rtc)?;
        self.last_good = Some(SoftReference {
            epoch: epoch_from_local(time),
            at: Instant::now(),
        });
        Ok(())
    }

    /// Reads the RTC's temperature sensor.
    pub fn temperature(&mut self) -> Result<ds3231::Temperature, ClockError<I2C::Error>> {
        self.rtc.temperature().map_err(ClockError::Rtc)
    }
}

fn local_from_datetime(dt: &DateTime) -> LocalTime {
    LocalTime {
        year: dt.year,
        month: dt.month,
        day: dt.day,
        weekday: dt.weekday,
        hour: dt.hour,
        minute: dt.minute,
        second: dt.second,
    }
}

fn datetime_from_local(t: &LocalTime) -> DateTime {
    DateTime {
        year: t.year,
        month: t.month,
        day: t.day,
        weekday: t.weekday,
        hour: t.hour,
        minute: t.minute,
        second: t.second,
    }
}
