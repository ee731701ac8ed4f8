#![cfg_attr(not(test), no_std)]

//! DS3231 battery-backed RTC driver over blocking `embedded-hal` I²C.

pub mod protocol;

pub use protocol::{DateTime, Temperature};

use embedded_hal::i2c::I2c;

/// Fixed 7-bit bus address of the DS3231.
pub const DEFAULT_ADDRESS: u8 = 0x68;

/// Driver errors.
#[derive(Debug, Clone, Copy, Eq, PartialEq)]
pub enum Error<E> {
    /// Bus transaction failed.
    Bus(E),
    /// Registers read back outside calendar ranges.
    InvalidData,
}

/// DS3231 driver.
#[derive(Debug)]
pub struct Ds3231<I2C> {
    i2c: I2C,
    address: u8,
}

impl<I2C> Ds3231<I2C>
where
    I2C: I2c,
{
    /// Creates a driver at the chip's fixed address.
    pub fn new(i2c: I2C) -> Self {
        Self {
            i2c,
            address: DEFAULT_ADDRESS,
        }
    }

    /// Releases the owned bus.
    pub fn release(self) -> I2C {
        self.i2c
    }

    /// Reads the calendar registers, normalized to 24 h.
    pub fn datetime(&mut self) -> Result<DateTime, Error<I2C::Error>> {
        let mut regs = [0u8; protocol::TIME_REGS];
        self.i2c
            .write_read(self.address, &[protocol::REG_SECONDS], &mut regs)
            .map_err(Error::Bus)?;

        let dt = protocol::decode_datetime(&regs);
        if !protocol::datetime_in_range(&dt) {
            return Err(Error::InvalidData);
        }
        Ok(dt)
    }

    /// Writes the calendar registers in 24 h mode.
    pub fn set_datetime(&mut self, dt: &DateTime) -> Result<(), Error<I2C::Error>> {
        let regs = protocol::encode_datetime(dt);
        let mut frame = [0u8; protocol::TIME_REGS + 1];
        frame[0] = protocol::REG_SECONDS;
        frame[1..].copy_from_slice(&regs);
        self.i2c.write(self.address, &frame).map_err(Error::Bus)
    }

    /// Reads the on-chip temperature sensor.
    pub fn temperature(&mut self) -> Result<Temperature, Error<I2C::Error>> {
        let mut regs = [0u8; 2];
        self.i2c
            .write_read(self.address, &[protocol::REG_TEMP_MSB], &mut regs)
            .map_err(Error::Bus)?;
        Ok(protocol::decode_temperature(regs[0], regs[1]))
    }
}
