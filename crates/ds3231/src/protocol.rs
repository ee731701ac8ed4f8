//! Register-level codec for the DS3231.
//!
//! All calendar registers are BCD. The hours register carries the 12 h/24 h
//! mode in bit 6 and, in 12 h mode, AM/PM in bit 5; reads normalize to 24 h
//! and writes always use 24 h mode. The month register's century bit (bit 7)
//! is ignored: years map to 2000..=2099.

/// First calendar register (seconds); six more follow consecutively.
pub const REG_SECONDS: u8 = 0x00;
/// Temperature MSB (signed integer degrees Celsius).
pub const REG_TEMP_MSB: u8 = 0x11;

/// Number of consecutive calendar registers.
pub const TIME_REGS: usize = 7;

const HOUR_12H_MODE: u8 = 0x40;
const HOUR_PM: u8 = 0x20;

/// Decoded calendar registers, 24 h normalized. `weekday` is 1..=7 with
/// Sunday = 1, as stored on the wire.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct DateTime {
    pub year: u16,
    pub month: u8,
    pub day: u8,
    pub weekday: u8,
    pub hour: u8,
    pub minute: u8,
    pub second: u8,
}

#[inline]
pub const fn bcd_to_bin(v: u8) -> u8 {
    (v & 0x0F) + 10 * ((v >> 4) & 0x0F)
}

#[inline]
pub const fn bin_to_bcd(v: u8) -> u8 {
    ((v / 10) << 4) | (v % 10)
}

/// Normalizes a raw hours register to 0..=23.
pub const fn decode_hours(raw: u8) -> u8 {
    if raw & HOUR_12H_MODE != 0 {
        let mut hour = bcd_to_bin(raw & 0x1F);
        if hour == 12 {
            hour = 0;
        }
        if raw & HOUR_PM != 0 {
            hour += 12;
        }
        hour
    } else {
        bcd_to_bin(raw & 0x3F)
    }
}

/// Decodes the seven calendar registers.
pub fn decode_datetime(regs: &[u8; TIME_REGS]) -> DateTime {
    DateTime {
        second: bcd_to_bin(regs[0] & 0x7F),
        minute: bcd_to_bin(regs[1] & 0x7F),
        hour: decode_hours(regs[2]),
        weekday: regs[3] & 0x07,
        day: bcd_to_bin(regs[4] & 0x3F),
        month: bcd_to_bin(regs[5] & 0x1F),
        year: 2_000 + bcd_to_bin(regs[6]) as u16,
    }
}

/// Encodes the seven calendar registers, 24 h mode, year clamped to the
/// chip's 2000..=2099 window.
pub fn encode_datetime(dt: &DateTime) -> [u8; TIME_REGS] {
    let year = dt.year.clamp(2_000, 2_099) - 2_000;
    [
        bin_to_bcd(dt.second) & 0x7F,
        bin_to_bcd(dt.minute) & 0x7F,
        bin_to_bcd(dt.hour) & 0x3F,
        dt.weekday & 0x07,
        bin_to_bcd(dt.day) & 0x3F,
        bin_to_bcd(dt.month) & 0x1F,
        bin_to_bcd(year as u8),
    ]
}

/// Plausibility check for a decoded value; a failing check usually means a
/// glitched bus transfer rather than a bad clock.
pub fn datetime_in_range(dt: &DateTime) -> bool {
    (1..=12).contains(&dt.month)
        && (1..=31).contains(&dt.day)
        && (1..=7).contains(&dt.weekday)
        && dt.hour <= 23
        && dt.minute <= 59
        && dt.second <= 59
}

/// On-chip temperature: integer degrees plus 0.25 °C steps.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct Temperature {
    pub whole: i8,
    /// 0..=3 quarter-degree steps.
    pub quarters: u8,
}

impl Temperature {
    /// Hundredths of a degree Celsius, for formatting without floats.
    pub const fn centi_celsius(self) -> i32 {
        self.whole as i32 * 100 + self.quarters as i32 * 25
    }
}

/// Decodes the two temperature registers (MSB integer, top two bits of the
/// LSB are the fraction).
pub const fn decode_temperature(msb: u8, lsb: u8) -> Temperature {
    Temperature {
        whole: msb as i8,
        quarters: lsb >> 6,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bcd_round_trips_for_all_two_digit_values() {
        for v in 0..100u8 {
            assert_eq!(bcd_to_bin(bin_to_bcd(v)), v);
        }
        assert_eq!(bin_to_bcd(59), 0x59);
        assert_eq!(bcd_to_bin(0x23), 23);
    }

    #[test]
    fn twelve_hour_mode_normalizes_to_twenty_four() {
        // 12:xx AM is hour 0; 12:xx PM is hour 12.
        assert_eq!(decode_hours(HOUR_12H_MODE | 0x12), 0);
        assert_eq!(decode_hours(HOUR_12H_MODE | HOUR_PM | 0x12), 12);
        assert_eq!(decode_hours(HOUR_12H_MODE | 0x01), 1);
        assert_eq!(decode_hours(HOUR_12H_MODE | HOUR_PM | 0x11), 23);
    }

    #[test]
    fn twenty_four_hour_mode_reads_verbatim() {
        for hour in 0..24u8 {
            assert_eq!(decode_hours(bin_to_bcd(hour)), hour);
        }
    }

    #[test]
    fn every_hour_survives_an_encode_decode_cycle() {
        for hour in 0..24u8 {
            let dt = DateTime {
                year: 2_025,
                month: 3,
                day: 10,
                weekday: 2,
                hour,
                minute: 59,
                second: 1,
            };
            assert_eq!(decode_datetime(&encode_datetime(&dt)), dt);
        }
    }

    #[test]
    fn century_bit_in_the_month_register_is_ignored() {
        let mut regs = encode_datetime(&DateTime {
            year: 2_025,
            month: 12,
            day: 31,
            weekday: 4,
            hour: 23,
            minute: 59,
            second: 59,
        });
        regs[5] |= 0x80;
        assert_eq!(decode_datetime(&regs).month, 12);
    }

    #[test]
    fn year_is_clamped_to_the_chip_window() {
        let dt = DateTime {
            year: 1_999,
            month: 1,
            day: 1,
            weekday: 6,
            hour: 0,
            minute: 0,
            second: 0,
        };
        assert_eq!(decode_datetime(&encode_datetime(&dt)).year, 2_000);
    }

    #[test]
    fn out_of_range_fields_fail_the_plausibility_check() {
        let good = DateTime {
            year: 2_025,
            month: 3,
            day: 10,
            weekday: 2,
            hour: 8,
            minute: 0,
            second: 5,
        };
        assert!(datetime_in_range(&good));
        assert!(!datetime_in_range(&DateTime { month: 0, ..good }));
        assert!(!datetime_in_range(&DateTime { day: 32, ..good }));
        assert!(!datetime_in_range(&DateTime { weekday: 0, ..good }));
        assert!(!datetime_in_range(&DateTime { second: 61, ..good }));
    }

    #[test]
    fn temperature_uses_quarter_degree_steps() {
        assert_eq!(decode_temperature(25, 0b1100_0000).centi_celsius(), 2_575);
        assert_eq!(decode_temperature(0, 0b0100_0000).centi_celsius(), 25);
        let below_zero = decode_temperature(0xF8, 0);
        assert_eq!(below_zero.whole, -8);
        assert_eq!(below_zero.centi_celsius(), -800);
    }
}
