//! Display-frame derivation for the 4-digit HH:MM panel.

/// One display update: clamped hours, minutes, colon level.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct DisplayFrame {
    pub hours: u8,
    pub minutes: u8,
    pub colon: bool,
}

impl DisplayFrame {
    /// `00:00` with the colon off; shown while the clock is unreadable.
    pub const fn fault() -> Self {
        Self {
            hours: 0,
            minutes: 0,
            colon: false,
        }
    }
}

/// Coarse controller phase, for the console status column.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum Phase {
    /// No check-in yet today.
    Wait,
    /// Countdown running.
    Run,
    /// Today's target reached.
    Done,
}

impl Phase {
    /// Fixed-width label, space-padded so columns line up.
    pub const fn label(self) -> &'static str {
        match self {
            Self::Wait => "WAIT",
            Self::Run => "RUN ",
            Self::Done => "DONE",
        }
    }
}

/// Renders the remaining seconds as HH:MM with a 1 Hz colon blink.
pub fn remaining_frame(remaining: i32, second: u8) -> DisplayFrame {
    let remaining = remaining.max(0);
    DisplayFrame {
        hours: (remaining / 3_600).min(99) as u8,
        minutes: (remaining % 3_600 / 60) as u8,
        colon: second % 2 == 0,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn remaining_is_split_into_hours_and_minutes() {
        let frame = remaining_frame(33_300, 0);
        assert_eq!((frame.hours, frame.minutes), (9, 15));
        assert!(frame.colon);

        let frame = remaining_frame(59, 1);
        assert_eq!((frame.hours, frame.minutes), (0, 0));
        assert!(!frame.colon);
    }

    #[test]
    fn hours_clamp_at_ninety_nine() {
        let frame = remaining_frame(500 * 3_600, 0);
        assert_eq!(frame.hours, 99);
    }
}
