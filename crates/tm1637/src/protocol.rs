//! Command and segment encoding for the TM1637 controller.

/// Number of digit grids on the 4-digit clock module.
pub const DIGITS: usize = 4;

/// Data command: write with auto-incrementing address.
pub const CMD_DATA_AUTO: u8 = 0x40;
/// Address command for grid 0; grids follow consecutively.
pub const CMD_ADDR_BASE: u8 = 0xC0;
/// Display control: on, OR-ed with brightness 0..=7.
pub const CMD_DISPLAY_ON: u8 = 0x88;
/// Display control: off.
pub const CMD_DISPLAY_OFF: u8 = 0x80;

/// The colon on clock modules is the decimal-point segment of grid 1.
pub const COLON_BIT: u8 = 0x80;

/// Segment patterns for 0..=9 (gfedcba order).
const DIGIT_SEGMENTS: [u8; 10] = [
    0x3F, 0x06, 0x5B, 0x4F, 0x66, 0x6D, 0x7D, 0x07, 0x7F, 0x6F,
];

/// Segment pattern for a decimal digit; `None` above 9.
#[inline]
pub fn encode_digit(digit: u8) -> Option<u8> {
    DIGIT_SEGMENTS.get(digit as usize).copied()
}

/// Display-control byte for brightness 0..=7.
#[inline]
pub const fn display_on(brightness: u8) -> u8 {
    CMD_DISPLAY_ON | (brightness & 0x07)
}

/// Builds the four grid bytes for `HH:MM`. `hours` is clamped to 99,
/// `minutes` to 59; the colon rides on grid 1.
pub fn build_hhmm_frame(hours: u8, minutes: u8, colon: bool) -> [u8; DIGITS] {
    let hours = hours.min(99);
    let minutes = minutes.min(59);

    let mut frame = [
        DIGIT_SEGMENTS[(hours / 10) as usize],
        DIGIT_SEGMENTS[(hours % 10) as usize],
        DIGIT_SEGMENTS[(minutes / 10) as usize],
        DIGIT_SEGMENTS[(minutes % 10) as usize],
    ];
    if colon {
        frame[1] |= COLON_BIT;
    }
    frame
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn digit_patterns_match_the_segment_table() {
        assert_eq!(encode_digit(0), Some(0x3F));
        assert_eq!(encode_digit(8), Some(0x7F));
        assert_eq!(encode_digit(9), Some(0x6F));
        assert_eq!(encode_digit(10), None);
    }

    #[test]
    fn hhmm_frame_places_digits_and_colon() {
        let frame = build_hhmm_frame(9, 15, true);
        assert_eq!(frame[0], encode_digit(0).unwrap());
        assert_eq!(frame[1], encode_digit(9).unwrap() | COLON_BIT);
        assert_eq!(frame[2], encode_digit(1).unwrap());
        assert_eq!(frame[3], encode_digit(5).unwrap());

        let no_colon = build_hhmm_frame(9, 15, false);
        assert_eq!(no_colon[1], encode_digit(9).unwrap());
    }

    #[test]
    fn out_of_range_values_are_clamped() {
        let frame = build_hhmm_frame(200, 77, false);
        assert_eq!(frame[0], encode_digit(9).unwrap());
        assert_eq!(frame[1], encode_digit(9).unwrap());
        assert_eq!(frame[2], encode_digit(5).unwrap());
        assert_eq!(frame[3], encode_digit(9).unwrap());
    }

    #[test]
    fn display_control_masks_brightness() {
        assert_eq!(display_on(0), 0x88);
        assert_eq!(display_on(7), 0x8F);
        assert_eq!(display_on(0xFF), 0x8F);
    }
}
