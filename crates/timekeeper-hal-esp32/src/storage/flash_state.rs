//! Flash-backed persistence for the check-in record.
//!
//! The record lives in the last 4 KiB sector of the NVS data partition
//! (fallback: an undefined data partition). A commit is erase + program of
//! one checksummed record; a torn commit fails the record checksum and
//! reads back as "no prior state" instead of as a field-skewed mixture.

use embedded_storage::{ReadStorage, Storage};
use esp_bootloader_esp_idf::partitions::{
    DataPartitionSubType, PARTITION_TABLE_MAX_LEN, PartitionType, read_partition_table,
};
use esp_rom_sys::rom::spiflash::{
    ESP_ROM_SPIFLASH_RESULT_OK, esp_rom_spiflash_erase_sector, esp_rom_spiflash_read,
    esp_rom_spiflash_unlock, esp_rom_spiflash_write,
};
use log::warn;
use timekeeper_core::state::{
    PersistedState, STATE_RECORD_LEN, StateRecordError, StateStore, decode_record, encode_record,
};

const FLASH_SECTOR_SIZE: u32 = 4_096;
const DEFAULT_FLASH_CAPACITY_BYTES: usize = 4 * 1024 * 1024;

#[derive(Debug, Clone, Copy, Eq, PartialEq)]
pub enum FlashStateError {
    PartitionTable,
    StatePartitionMissing,
    PartitionTooSmall,
    FlashOpFailed(i32),
    Corrupted,
}

impl From<StateRecordError> for FlashStateError {
    fn from(_: StateRecordError) -> Self {
        Self::Corrupted
    }
}

/// Word-granular access to SPI flash through the ROM routines. The record
/// sector is 4-byte aligned, so no unaligned handling is needed.
#[derive(Debug)]
struct RawFlash;

impl RawFlash {
    fn new() -> Result<Self, FlashStateError> {
        let rc = unsafe { esp_rom_spiflash_unlock() };
        if rc != ESP_ROM_SPIFLASH_RESULT_OK {
            return Err(FlashStateError::FlashOpFailed(rc));
        }
        Ok(Self)
    }

    fn erase_sector(&mut self, sector_addr: u32) -> Result<(), FlashStateError> {
        debug_assert!(sector_addr.is_multiple_of(FLASH_SECTOR_SIZE));

        let rc = unsafe { esp_rom_spiflash_erase_sector(sector_addr / FLASH_SECTOR_SIZE) };
        if rc != ESP_ROM_SPIFLASH_RESULT_OK {
            return Err(FlashStateError::FlashOpFailed(rc));
        }
        Ok(())
    }

    fn read_words(&mut self, addr: u32, out: &mut [u8]) -> Result<(), FlashStateError> {
        debug_assert!(addr.is_multiple_of(4) && out.len().is_multiple_of(4));

        for (i, chunk) in out.chunks_exact_mut(4).enumerate() {
            let mut word = 0u32;
            let rc = unsafe {
                esp_rom_spiflash_read(addr + i as u32 * 4, &mut word as *mut u32 as *const u32, 4)
            };
            if rc != ESP_ROM_SPIFLASH_RESULT_OK {
                return Err(FlashStateError::FlashOpFailed(rc));
            }
            chunk.copy_from_slice(&word.to_le_bytes());
        }
        Ok(())
    }

    fn write_words(&mut self, addr: u32, data: &[u8]) -> Result<(), FlashStateError> {
        debug_assert!(addr.is_multiple_of(4) && data.len().is_multiple_of(4));

        for (i, chunk) in data.chunks_exact(4).enumerate() {
            let word = u32::from_le_bytes([chunk[0], chunk[1], chunk[2], chunk[3]]);
            let rc = unsafe { esp_rom_spiflash_write(addr + i as u32 * 4, &word as *const u32, 4) };
            if rc != ESP_ROM_SPIFLASH_RESULT_OK {
                return Err(FlashStateError::FlashOpFailed(rc));
            }
        }
        Ok(())
    }
}

// The partition-table reader wants an `embedded-storage` backend.
impl ReadStorage for RawFlash {
    type Error = FlashStateError;

    fn read(&mut self, offset: u32, bytes: &mut [u8]) -> Result<(), Self::Error> {
        let mut word_buf = [0u8; 4];
        let start = offset & !0b11;
        let end = (offset as usize + bytes.len()).next_multiple_of(4) as u32;

        for word_addr in (start..end).step_by(4) {
            self.read_words(word_addr, &mut word_buf)?;
            for (i, b) in word_buf.iter().enumerate() {
                let Some(dst) = (word_addr as usize + i).checked_sub(offset as usize) else {
                    continue;
                };
                if let Some(slot) = bytes.get_mut(dst) {
                    *slot = *b;
                }
            }
        }
        Ok(())
    }

    fn capacity(&self) -> usize {
        DEFAULT_FLASH_CAPACITY_BYTES
    }
}

impl Storage for RawFlash {
    fn write(&mut self, _offset: u32, _bytes: &[u8]) -> Result<(), Self::Error> {
        // The table reader never writes; commits go through the sector path.
        Err(FlashStateError::FlashOpFailed(-1))
    }
}

/// `StateStore` backed by one flash sector.
#[derive(Debug)]
pub struct FlashStateStore {
    flash: RawFlash,
    record_sector_addr: u32,
}

impl FlashStateStore {
    pub fn new() -> Result<Self, FlashStateError> {
        let mut flash = RawFlash::new()?;

        let mut table_buf = [0u8; PARTITION_TABLE_MAX_LEN];
        let table = read_partition_table(&mut flash, &mut table_buf)
            .map_err(|_| FlashStateError::PartitionTable)?;

        let mut nvs: Option<(u32, u32)> = None;
        let mut fallback: Option<(u32, u32)> = None;

        for entry in table.iter() {
            if entry.is_read_only() || entry.len() < FLASH_SECTOR_SIZE {
                continue;
            }

            match entry.partition_type() {
                PartitionType::Data(DataPartitionSubType::Nvs) => {
                    nvs = Some((entry.offset(), entry.len()));
                    break;
                }
                PartitionType::Data(DataPartitionSubType::Undefined) => {
                    if fallback.is_none() {
                        fallback = Some((entry.offset(), entry.len()));
                    }
                }
                _ => {}
            }
        }

        let (offset, len) = nvs
            .or(fallback)
            .ok_or(FlashStateError::StatePartitionMissing)?;
        if len < FLASH_SECTOR_SIZE {
            return Err(FlashStateError::PartitionTooSmall);
        }

        Ok(Self {
            flash,
            record_sector_addr: offset + len - FLASH_SECTOR_SIZE,
        })
    }
}

impl StateStore for FlashStateStore {
    type Error = FlashStateError;

    fn load(&mut self) -> Result<Option<PersistedState>, Self::Error> {
        let mut buf = [0u8; STATE_RECORD_LEN];
        self.flash.read_words(self.record_sector_addr, &mut buf)?;

        match decode_record(&buf) {
            Ok(state) => Ok(state),
            Err(StateRecordError::Corrupted) => {
                // Most likely a commit torn by power loss; start over.
                warn!("state record failed its checksum; treating as absent");
                Ok(None)
            }
        }
    }

    fn save(&mut self, state: &PersistedState) -> Result<(), Self::Error> {
        let buf = encode_record(state);
        self.flash.erase_sector(self.record_sector_addr)?;
        self.flash.write_words(self.record_sector_addr, &buf)
    }
}
