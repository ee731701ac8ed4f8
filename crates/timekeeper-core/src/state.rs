//! Persisted check-in state and its on-media record codec.

/// Link-layer station address.
pub type Mac = [u8; 6];

/// State that must survive reboot, committed atomically as one record.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct PersistedState {
    /// Calendar day (`YYYYMMDD`) the `remaining` value belongs to.
    pub day: u32,
    /// Seconds left in today's target.
    pub remaining: i32,
    /// Countdown armed: the bound phone has checked in today.
    pub started: bool,
    /// A bound phone address is known.
    pub have_mac: bool,
    /// The bound phone's address; all-zero when `have_mac` is false.
    pub mac: Mac,
}

impl PersistedState {
    /// First-boot defaults. `day = 0` forces a rollover on the first tick.
    pub const fn fresh(daily_target_secs: i32) -> Self {
        Self {
            day: 0,
            remaining: daily_target_secs,
            started: false,
            have_mac: false,
            mac: [0; 6],
        }
    }

    /// Re-establishes the record invariants after a load.
    ///
    /// A record written by an older build or a half-trusted medium may hold
    /// field combinations the state machine never produces; normalizing here
    /// keeps every downstream path free of range checks.
    pub fn sanitize(&mut self, daily_target_secs: i32) {
        if !self.have_mac {
            self.mac = [0; 6];
            self.started = false;
        }
        if !self.started {
            self.remaining = daily_target_secs;
        }
        self.remaining = self.remaining.clamp(0, daily_target_secs);
    }
}

/// Abstract persistence backend. `save` is the atomic commit.
pub trait StateStore {
    type Error;

    fn load(&mut self) -> Result<Option<PersistedState>, Self::Error>;
    fn save(&mut self, state: &PersistedState) -> Result<(), Self::Error>;
}

/// Fixed record length on media.
pub const STATE_RECORD_LEN: usize = 28;

const STATE_MAGIC: u32 = 0x3153_4B54; // "TKS1"
const STATE_VERSION: u8 = 1;
const FLAG_STARTED: u8 = 0x01;
const FLAG_HAVE_MAC: u8 = 0x02;

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum StateRecordError {
    /// Magic and version matched but the checksum did not.
    Corrupted,
}

/// Serializes a state record.
///
/// Layout (little-endian): magic, version, flags, 2 pad bytes, `day`,
/// `remaining`, `mac`, 2 pad bytes, FNV-1a checksum over everything before it.
pub fn encode_record(state: &PersistedState) -> [u8; STATE_RECORD_LEN] {
    let mut buf = [0u8; STATE_RECORD_LEN];
    buf[0..4].copy_from_slice(&STATE_MAGIC.to_le_bytes());
    buf[4] = STATE_VERSION;
    buf[5] = (if state.started { FLAG_STARTED } else { 0 })
        | (if state.have_mac { FLAG_HAVE_MAC } else { 0 });
    buf[8..12].copy_from_slice(&state.day.to_le_bytes());
    buf[12..16].copy_from_slice(&state.remaining.to_le_bytes());
    buf[16..22].copy_from_slice(&state.mac);
    let checksum = checksum32(&buf[..24]);
    buf[24..28].copy_from_slice(&checksum.to_le_bytes());
    buf
}

/// Deserializes a state record.
///
/// Blank media (all `0xFF`) and foreign magic/version read as `Ok(None)`:
/// the caller starts from defaults. A record that claims to be ours but
/// fails its checksum is reported as corrupted so the caller can log it.
pub fn decode_record(buf: &[u8; STATE_RECORD_LEN]) -> Result<Option<PersistedState>, StateRecordError> {
    if buf.iter().all(|b| *b == 0xFF) {
        return Ok(None);
    }

    let magic = u32::from_le_bytes([buf[0], buf[1], buf[2], buf[3]]);
    if magic != STATE_MAGIC || buf[4] != STATE_VERSION {
        return Ok(None);
    }

    let expected = u32::from_le_bytes([buf[24], buf[25], buf[26], buf[27]]);
    if checksum32(&buf[..24]) != expected {
        return Err(StateRecordError::Corrupted);
    }

    let mut mac = [0u8; 6];
    mac.copy_from_slice(&buf[16..22]);

    Ok(Some(PersistedState {
        day: u32::from_le_bytes([buf[8], buf[9], buf[10], buf[11]]),
        remaining: i32::from_le_bytes([buf[12], buf[13], buf[14], buf[15]]),
        started: (buf[5] & FLAG_STARTED) != 0,
        have_mac: (buf[5] & FLAG_HAVE_MAC) != 0,
        mac,
    }))
}

fn checksum32(bytes: &[u8]) -> u32 {
    let mut hash = 0x811C_9DC5u32;
    for b in bytes {
        hash ^= *b as u32;
        hash = hash.wrapping_mul(16_777_619);
    }
    hash
}

#[cfg(test)]
mod tests {
    use super::*;

    const TARGET: i32 = 33_300;

    #[test]
    fn record_round_trips() {
        let state = PersistedState {
            day: 20_250_310,
            remaining: 12_340,
            started: true,
            have_mac: true,
            mac: [0xAA, 0xBB, 0xCC, 0xDD, 0xEE, 0x01],
        };
        let buf = encode_record(&state);
        assert_eq!(decode_record(&buf), Ok(Some(state)));
    }

    #[test]
    fn blank_media_reads_as_no_prior_state() {
        assert_eq!(decode_record(&[0xFF; STATE_RECORD_LEN]), Ok(None));
    }

    #[test]
    fn foreign_magic_reads_as_no_prior_state() {
        let mut buf = encode_record(&PersistedState::fresh(TARGET));
        buf[0] ^= 0x40;
        assert_eq!(decode_record(&buf), Ok(None));
    }

    #[test]
    fn checksum_mismatch_is_reported_as_corrupted() {
        let mut buf = encode_record(&PersistedState::fresh(TARGET));
        buf[12] ^= 0x01;
        assert_eq!(decode_record(&buf), Err(StateRecordError::Corrupted));
    }

    #[test]
    fn sanitize_restores_invariants() {
        let mut no_mac = PersistedState {
            day: 20_250_310,
            remaining: 5,
            started: true,
            have_mac: false,
            mac: [1; 6],
        };
        no_mac.sanitize(TARGET);
        assert_eq!(no_mac.mac, [0; 6]);
        assert!(!no_mac.started);
        assert_eq!(no_mac.remaining, TARGET);

        let mut out_of_range = PersistedState {
            day: 20_250_310,
            remaining: TARGET + 999,
            started: true,
            have_mac: true,
            mac: [1; 6],
        };
        out_of_range.sanitize(TARGET);
        assert_eq!(out_of_range.remaining, TARGET);

        let mut negative = PersistedState {
            remaining: -3,
            ..out_of_range
        };
        negative.sanitize(TARGET);
        assert_eq!(negative.remaining, 0);
    }
}
