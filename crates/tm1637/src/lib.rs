#![cfg_attr(not(test), no_std)]

//! TM1637 4-digit 7-segment display driver.
//!
//! The controller speaks a two-wire shift protocol that only resembles I²C:
//! no addressing, LSB-first bytes, and an ACK slot the chip pulls low while
//! the host releases DIO. Both lines are bit-banged; DIO must therefore be a
//! pin that can read back its own line level.

pub mod protocol;

use embedded_hal::{
    delay::DelayNs,
    digital::{InputPin, OutputPin},
};

/// Half-period of the bit clock. The TM1637 tops out well below 500 kHz,
/// so anything above ~1 µs is safe.
const BIT_DELAY_US: u32 = 4;

/// Driver errors.
#[derive(Debug, Clone, Copy, Eq, PartialEq)]
pub enum Error<ClkErr, DioErr> {
    /// CLK pin operation failed.
    Clk(ClkErr),
    /// DIO pin operation failed.
    Dio(DioErr),
    /// The controller did not acknowledge a byte.
    Nack,
}

pub type DriverResult<ClkErr, DioErr> = Result<(), Error<ClkErr, DioErr>>;

/// TM1637 driver.
#[derive(Debug)]
pub struct Tm1637<CLK, DIO> {
    clk: CLK,
    dio: DIO,
    brightness: u8,
}

impl<CLK, DIO> Tm1637<CLK, DIO>
where
    CLK: OutputPin,
    DIO: OutputPin + InputPin,
{
    pub fn new(clk: CLK, dio: DIO) -> Self {
        Self {
            clk,
            dio,
            brightness: 7,
        }
    }

    /// Releases the owned pins.
    pub fn release(self) -> (CLK, DIO) {
        (self.clk, self.dio)
    }

    /// Sets brightness (0..=7) and turns the display on.
    pub fn init<D: DelayNs>(
        &mut self,
        brightness: u8,
        delay: &mut D,
    ) -> DriverResult<CLK::Error, DIO::Error> {
        self.brightness = brightness & 0x07;
        self.command(protocol::display_on(self.brightness), delay)
    }

    /// Blanks all grids and turns the display off.
    pub fn clear<D: DelayNs>(&mut self, delay: &mut D) -> DriverResult<CLK::Error, DIO::Error> {
        self.write_grids(&[0; protocol::DIGITS], delay)?;
        self.command(protocol::CMD_DISPLAY_OFF, delay)
    }

    /// Shows `HH:MM` with the colon driven per call.
    pub fn show_hhmm<D: DelayNs>(
        &mut self,
        hours: u8,
        minutes: u8,
        colon: bool,
        delay: &mut D,
    ) -> DriverResult<CLK::Error, DIO::Error> {
        let frame = protocol::build_hhmm_frame(hours, minutes, colon);
        self.write_grids(&frame, delay)?;
        self.command(protocol::display_on(self.brightness), delay)
    }

    fn write_grids<D: DelayNs>(
        &mut self,
        grids: &[u8; protocol::DIGITS],
        delay: &mut D,
    ) -> DriverResult<CLK::Error, DIO::Error> {
        self.command(protocol::CMD_DATA_AUTO, delay)?;

        self.start(delay)?;
        let mut result = self.write_byte(protocol::CMD_ADDR_BASE, delay);
        for grid in grids {
            if result.is_err() {
                break;
            }
            result = self.write_byte(*grid, delay);
        }
        // Always close the frame so a NACK cannot wedge the bus.
        self.stop(delay)?;
        result
    }

    fn command<D: DelayNs>(
        &mut self,
        byte: u8,
        delay: &mut D,
    ) -> DriverResult<CLK::Error, DIO::Error> {
        self.start(delay)?;
        let result = self.write_byte(byte, delay);
        self.stop(delay)?;
        result
    }

    /// Start condition: DIO falls while CLK is high.
    fn start<D: DelayNs>(&mut self, delay: &mut D) -> DriverResult<CLK::Error, DIO::Error> {
        self.clk.set_high().map_err(Error::Clk)?;
        self.dio.set_high().map_err(Error::Dio)?;
        delay.delay_us(BIT_DELAY_US);
        self.dio.set_low().map_err(Error::Dio)?;
        delay.delay_us(BIT_DELAY_US);
        Ok(())
    }

    /// Stop condition: DIO rises while CLK is high.
    fn stop<D: DelayNs>(&mut self, delay: &mut D) -> DriverResult<CLK::Error, DIO::Error> {
        self.clk.set_low().map_err(Error::Clk)?;
        self.dio.set_low().map_err(Error::Dio)?;
        delay.delay_us(BIT_DELAY_US);
        self.clk.set_high().map_err(Error::Clk)?;
        delay.delay_us(BIT_DELAY_US);
        self.dio.set_high().map_err(Error::Dio)?;
        delay.delay_us(BIT_DELAY_US);
        Ok(())
    }

    /// Shifts one byte LSB first, then samples the ACK slot.
    fn write_byte<D: DelayNs>(
        &mut self,
        byte: u8,
        delay: &mut D,
    ) -> DriverResult<CLK::Error, DIO::Error> {
        for bit in 0..8 {
            self.clk.set_low().map_err(Error::Clk)?;
            if byte & (1 << bit) != 0 {
                self.dio.set_high().map_err(Error::Dio)?;
            } else {
                self.dio.set_low().map_err(Error::Dio)?;
            }
            delay.delay_us(BIT_DELAY_US);
            self.clk.set_high().map_err(Error::Clk)?;
            delay.delay_us(BIT_DELAY_US);
        }

        // ACK slot: release DIO and let the chip pull it low.
        self.clk.set_low().map_err(Error::Clk)?;
        self.dio.set_high().map_err(Error::Dio)?;
        delay.delay_us(BIT_DELAY_US);
        self.clk.set_high().map_err(Error::Clk)?;
        delay.delay_us(BIT_DELAY_US);
        let acked = self.dio.is_low().map_err(Error::Dio)?;
        self.clk.set_low().map_err(Error::Clk)?;

        if acked { Ok(()) } else { Err(Error::Nack) }
    }
}
